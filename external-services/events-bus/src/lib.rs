//! Address-routed request/reply messaging for Insult Engine
//!
//! Service proxies talk to their implementations through a [`Transport`]:
//! a handler is registered at an address, and callers send a [`Message`]
//! to that address and wait for exactly one [`Reply`].
//!
//! - [`EventBus`]: in-process transport backed by tokio channels
//! - `NatsTransport` (feature `nats`): NATS request/reply, one subject per address
//!
//! # Example
//!
//! ```rust
//! use events_bus::{handler_fn, EventBus, Message, Reply, Transport};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new();
//!
//!     bus.register("greeter", handler_fn(|message: Message| async move {
//!         Reply::ok(message.id, json!({ "hello": message.payload }))
//!     }))
//!     .await?;
//!
//!     let reply = bus
//!         .request("greeter", Message::new("greeter", "greet", json!("world")), Duration::from_secs(1))
//!         .await?;
//!     assert_eq!(reply.into_result()?, json!({ "hello": "world" }));
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod error;
pub mod message;
#[cfg(feature = "nats")]
pub mod nats;
pub mod transport;

pub use bus::*;
pub use error::*;
pub use message::*;
#[cfg(feature = "nats")]
pub use nats::*;
pub use transport::*;
