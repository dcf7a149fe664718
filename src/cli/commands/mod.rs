//! CLI command implementations

pub mod cache;
pub mod config;
pub mod fetch;
pub mod register;
pub mod status;

pub use cache::execute as cache;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use register::execute as register;
pub use status::execute as status;

use console::Emoji;

pub(crate) static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
pub(crate) static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
pub(crate) static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");
