use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EventBusError, Result};
use crate::message::{Message, Reply};
use crate::transport::{Handler, Registration, Transport};

/// Request/reply over NATS; the address is used as the subject.
///
/// Handlers on the same address join a queue group named after the
/// address, so NATS spreads requests across them.
pub struct NatsTransport {
    client: async_nats::Client,
    subscriptions: DashMap<Uuid, JoinHandle<()>>,
}

impl NatsTransport {
    pub async fn connect(nats_url: &str) -> Result<Self> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| EventBusError::Transport(format!("NATS connection failed: {}", e)))?;

        Ok(Self::from_client(client))
    }

    pub fn from_client(client: async_nats::Client) -> Self {
        Self {
            client,
            subscriptions: DashMap::new(),
        }
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn register(&self, address: &str, handler: Handler) -> Result<Registration> {
        let mut subscriber = self
            .client
            .queue_subscribe(address.to_string(), address.to_string())
            .await
            .map_err(|e| EventBusError::Transport(format!("subscribe to {} failed: {}", address, e)))?;

        let client = self.client.clone();
        let subject = address.to_string();
        let handle = tokio::spawn(async move {
            while let Some(request) = subscriber.next().await {
                let Some(reply_subject) = request.reply.clone() else {
                    debug!(address = %subject, "Dropping message without reply subject");
                    continue;
                };
                let client = client.clone();
                let handler = handler.clone();
                let subject = subject.clone();
                tokio::spawn(async move {
                    let reply = match serde_json::from_slice::<Message>(&request.payload) {
                        Ok(message) => handler(message).await,
                        Err(e) => Reply::err(Uuid::nil(), format!("invalid message: {}", e)),
                    };
                    let bytes = match serde_json::to_vec(&reply) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(address = %subject, error = %e, "Failed to encode reply");
                            return;
                        }
                    };
                    if let Err(e) = client.publish(reply_subject, bytes.into()).await {
                        warn!(address = %subject, error = %e, "Failed to publish reply");
                    }
                });
            }
        });

        let id = Uuid::new_v4();
        self.subscriptions.insert(id, handle);
        Ok(Registration {
            id,
            address: address.to_string(),
        })
    }

    async fn unregister(&self, registration: &Registration) -> Result<()> {
        if let Some((_, handle)) = self.subscriptions.remove(&registration.id) {
            handle.abort();
        }
        Ok(())
    }

    async fn request(&self, address: &str, message: Message, timeout: Duration) -> Result<Reply> {
        let payload = serde_json::to_vec(&message).map_err(|e| EventBusError::Serialization(e.to_string()))?;

        let response = match tokio::time::timeout(timeout, self.client.request(address.to_string(), payload.into())).await {
            Err(_) => {
                return Err(EventBusError::Timeout {
                    address: address.to_string(),
                    timeout_ms: timeout.as_millis(),
                })
            }
            Ok(Err(e)) => {
                return Err(match e.kind() {
                    async_nats::RequestErrorKind::NoResponders => EventBusError::NoHandler(address.to_string()),
                    async_nats::RequestErrorKind::TimedOut => EventBusError::Timeout {
                        address: address.to_string(),
                        timeout_ms: timeout.as_millis(),
                    },
                    _ => EventBusError::Transport(e.to_string()),
                })
            }
            Ok(Ok(response)) => response,
        };

        serde_json::from_slice(&response.payload).map_err(|e| EventBusError::Serialization(e.to_string()))
    }
}

impl Drop for NatsTransport {
    fn drop(&mut self) {
        for entry in self.subscriptions.iter() {
            entry.value().abort();
        }
    }
}
