use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;
use crate::message::{Message, Reply};

pub type HandlerFuture = BoxFuture<'static, Reply>;

/// Request handler installed at an address. Produces exactly one reply
/// per message.
pub type Handler = Arc<dyn Fn(Message) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    Arc::new(move |message| Box::pin(f(message)))
}

/// Handle returned by [`Transport::register`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
    pub id: Uuid,
    pub address: String,
}

/// Address-routed request/reply channel
#[async_trait]
pub trait Transport: Send + Sync {
    /// Install `handler` at `address`. Several handlers may share an
    /// address; requests are spread across them.
    async fn register(&self, address: &str, handler: Handler) -> Result<Registration>;

    async fn unregister(&self, registration: &Registration) -> Result<()>;

    /// Send one request and wait at most `timeout` for its reply
    async fn request(&self, address: &str, message: Message, timeout: Duration) -> Result<Reply>;
}
