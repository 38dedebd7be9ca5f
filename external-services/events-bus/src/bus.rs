use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EventBusError, Result};
use crate::message::{Message, Reply};
use crate::transport::{Handler, Registration, Transport};

const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Encoded request plus the slot its single reply goes into
struct Envelope {
    bytes: Vec<u8>,
    reply_to: oneshot::Sender<Vec<u8>>,
}

struct Consumer {
    id: Uuid,
    sender: mpsc::Sender<Envelope>,
    task: JoinHandle<()>,
}

/// In-process event bus.
///
/// Messages are JSON encoded on the way in and decoded by the consumer
/// task, so a handler sees exactly what it would see behind a network
/// transport.
pub struct EventBus {
    consumers: DashMap<String, Vec<Consumer>>,
    cursor: AtomicUsize,
    queue_capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Bus whose per-consumer queues hold at most `queue_capacity` pending requests
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            consumers: DashMap::new(),
            cursor: AtomicUsize::new(0),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn has_handlers(&self, address: &str) -> bool {
        self.consumers
            .get(address)
            .map(|consumers| !consumers.is_empty())
            .unwrap_or(false)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.consumers.iter().map(|entry| entry.key().clone()).collect()
    }

    fn pick_sender(&self, address: &str) -> Option<mpsc::Sender<Envelope>> {
        let consumers = self.consumers.get(address)?;
        if consumers.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % consumers.len();
        consumers.get(index).map(|consumer| consumer.sender.clone())
    }

    async fn dispatch(&self, address: &str, message: Message) -> Result<Reply> {
        let bytes = serde_json::to_vec(&message).map_err(|e| EventBusError::Serialization(e.to_string()))?;

        // Clone the sender so no map guard is held across an await
        let sender = self
            .pick_sender(address)
            .ok_or_else(|| EventBusError::NoHandler(address.to_string()))?;

        let (reply_to, reply_rx) = oneshot::channel();
        sender
            .send(Envelope { bytes, reply_to })
            .await
            .map_err(|_| EventBusError::HandlerGone(address.to_string()))?;

        let reply_bytes = reply_rx
            .await
            .map_err(|_| EventBusError::HandlerGone(address.to_string()))?;

        serde_json::from_slice(&reply_bytes).map_err(|e| EventBusError::Serialization(e.to_string()))
    }
}

async fn consume(address: String, handler: Handler, mut receiver: mpsc::Receiver<Envelope>) {
    while let Some(envelope) = receiver.recv().await {
        let handler = handler.clone();
        let address = address.clone();
        tokio::spawn(async move {
            let reply = match serde_json::from_slice::<Message>(&envelope.bytes) {
                Ok(message) => handler(message).await,
                Err(e) => Reply::err(Uuid::nil(), format!("invalid message: {}", e)),
            };

            match serde_json::to_vec(&reply) {
                Ok(bytes) => {
                    // Requester may already have timed out
                    if envelope.reply_to.send(bytes).is_err() {
                        debug!(address = %address, "Reply discarded, requester gone");
                    }
                }
                Err(e) => warn!(address = %address, error = %e, "Failed to encode reply"),
            }
        });
    }
}

#[async_trait]
impl Transport for EventBus {
    async fn register(&self, address: &str, handler: Handler) -> Result<Registration> {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let task = tokio::spawn(consume(address.to_string(), handler, receiver));
        let id = Uuid::new_v4();

        self.consumers
            .entry(address.to_string())
            .or_default()
            .push(Consumer { id, sender, task });

        debug!(address = %address, registration = %id, "Handler registered");
        Ok(Registration {
            id,
            address: address.to_string(),
        })
    }

    async fn unregister(&self, registration: &Registration) -> Result<()> {
        if let Some(mut consumers) = self.consumers.get_mut(&registration.address) {
            consumers.retain(|consumer| {
                if consumer.id == registration.id {
                    consumer.task.abort();
                    false
                } else {
                    true
                }
            });
        }
        self.consumers
            .remove_if(&registration.address, |_, consumers| consumers.is_empty());

        debug!(address = %registration.address, registration = %registration.id, "Handler unregistered");
        Ok(())
    }

    async fn request(&self, address: &str, message: Message, timeout: Duration) -> Result<Reply> {
        match tokio::time::timeout(timeout, self.dispatch(address, message)).await {
            Ok(result) => result,
            Err(_) => Err(EventBusError::Timeout {
                address: address.to_string(),
                timeout_ms: timeout.as_millis(),
            }),
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        for entry in self.consumers.iter() {
            for consumer in entry.value() {
                consumer.task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::handler_fn;
    use serde_json::json;

    fn echo(tag: &'static str) -> Handler {
        handler_fn(move |message: Message| async move {
            Reply::ok(message.id, json!({ "tag": tag, "action": message.action }))
        })
    }

    #[tokio::test]
    async fn test_request_reply() {
        let bus = EventBus::new();
        bus.register("noun.service", echo("a")).await.unwrap();

        let message = Message::new("noun.service", "get", json!(null));
        let id = message.id;
        let reply = bus
            .request("noun.service", message, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply.correlation_id, id);
        assert_eq!(reply.into_result().unwrap(), json!({"tag": "a", "action": "get"}));
    }

    #[tokio::test]
    async fn test_no_handler() {
        let bus = EventBus::new();
        let err = bus
            .request("nowhere", Message::new("nowhere", "get", json!(null)), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, EventBusError::NoHandler("nowhere".to_string()));
    }

    #[tokio::test]
    async fn test_round_robin_between_consumers() {
        let bus = EventBus::new();
        bus.register("noun.service", echo("a")).await.unwrap();
        bus.register("noun.service", echo("b")).await.unwrap();

        let mut tags = Vec::new();
        for _ in 0..4 {
            let reply = bus
                .request("noun.service", Message::new("noun.service", "get", json!(null)), Duration::from_secs(1))
                .await
                .unwrap();
            tags.push(reply.into_result().unwrap()["tag"].as_str().unwrap().to_string());
        }
        assert_eq!(tags.iter().filter(|t| *t == "a").count(), 2);
        assert_eq!(tags.iter().filter(|t| *t == "b").count(), 2);
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let bus = EventBus::new();
        let handler = handler_fn(|message: Message| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Reply::ok(message.id, json!(null))
        });
        bus.register("slow", handler).await.unwrap();

        let err = bus
            .request("slow", Message::new("slow", "get", json!(null)), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, EventBusError::Timeout { timeout_ms: 50, .. }));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_handler_gone() {
        let bus = EventBus::new();
        let handler = handler_fn(|message: Message| async move {
            if message.action == "explode" {
                panic!("handler bug");
            }
            Reply::ok(message.id, json!(null))
        });
        bus.register("broken", handler).await.unwrap();

        let err = bus
            .request("broken", Message::new("broken", "explode", json!(null)), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, EventBusError::HandlerGone("broken".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_removes_address() {
        let bus = EventBus::new();
        let registration = bus.register("noun.service", echo("a")).await.unwrap();
        assert!(bus.has_handlers("noun.service"));
        assert_eq!(bus.addresses(), vec!["noun.service".to_string()]);

        bus.unregister(&registration).await.unwrap();
        assert!(!bus.has_handlers("noun.service"));
        assert!(bus.addresses().is_empty());
    }
}
