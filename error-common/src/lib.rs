//! Common error handling utilities for Insult Engine
//!
//! This crate provides the error vocabulary shared by every service crate in
//! the workspace. It separates two kinds of failure:
//!
//! - **Capability failures** ([`Failure`]): the outcome of a single service
//!   call. They are plain data, serialisable so they survive a hop across a
//!   message transport, and are always returned to the caller as the `Err`
//!   side of a [`CapabilityResult`]. They never abort the process.
//! - **Service errors** ([`ServiceError`]): construction and bootstrap
//!   errors (bad configuration, unusable network settings). These propagate
//!   up to the binary and stop the process from becoming ready.
//!
//! # Example
//!
//! ```rust
//! use error_common::{CapabilityResult, Failure};
//!
//! fn lookup(found: bool) -> CapabilityResult<String> {
//!     if found {
//!         Ok("idiot".to_string())
//!     } else {
//!         Err(Failure::new("unavailable"))
//!     }
//! }
//!
//! assert_eq!(lookup(false), Err(Failure::new("unavailable")));
//! ```

pub mod codes;
pub mod failure;
pub mod types;

pub use codes::*;
pub use failure::*;
pub use types::*;
