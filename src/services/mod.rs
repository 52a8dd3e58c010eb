//! # Services Module
//!
//! Client-side state for the token_vesting program: the query cache, the
//! data-access layer over the program binding, and mutation notifications.

pub mod data_access;
pub mod notifications;
pub mod query_cache;

pub use data_access::TokenVestingProgramAccess;
pub use notifications::{Notification, Notifier, Toaster};
pub use query_cache::QueryCache;
