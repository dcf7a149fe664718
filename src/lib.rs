//! precache - Offline-first precaching proxy
//!
//! A cache manager owns one versioned cache. On install it stores a fixed
//! manifest of resources, on activate it deletes every other cache
//! generation, and on fetch it answers from the cache before falling back
//! to the network.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod network;
pub mod storage;
pub mod worker;

pub use error::{PrecacheError, PrecacheResult};
