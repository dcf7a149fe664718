//! Host side of the cache manager lifecycle
//!
//! Installs and promotes managers, tracks which clients they control and
//! persists the active registration between runs.

pub mod record;
pub mod registration;

pub use record::RegistrationRecord;
pub use registration::{ClientId, RegisterOutcome, Registration};
