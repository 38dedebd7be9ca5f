//! Layered configuration resolution engine for Insult Engine
//!
//! A process builds its configuration once at startup by merging several
//! sources with a fixed precedence:
//!
//! - **Bundled defaults**: a JSON file shipped with the service (required)
//! - **Local overrides**: a file mounted into the container (optional)
//! - **Cluster overrides**: a Kubernetes ConfigMap, consulted only when the
//!   process runs inside a cluster (optional, activation-gated)
//!
//! Objects are deep merged, later sources winning; scalars and arrays are
//! replaced. The result is an immutable [`ResolvedConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ConfigResolver, StandardSources};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Endpoint {
//!     host: String,
//!     port: u16,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigResolver::standard(&StandardSources::default())
//!         .resolve()
//!         .await?;
//!
//!     let noun: Endpoint = config.section("noun")?;
//!     println!("noun backend at {}:{}", noun.host, noun.port);
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod error;
pub mod merge;
pub mod providers;
pub mod resolved;
pub mod resolver;

pub use activation::Activation;
pub use error::*;
pub use merge::{merge_all, merge_objects, merge_values};
pub use providers::*;
pub use resolved::ResolvedConfig;
pub use resolver::*;
