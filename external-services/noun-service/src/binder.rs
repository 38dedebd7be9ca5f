//! Exposes a [`NounService`] implementation on a transport address so
//! that proxies elsewhere can reach it.

use error_common::Failure;
use events_bus::{handler_fn, Message, Registration, Reply, Result, Transport};
use std::sync::Arc;
use tracing::{debug, info};

use crate::model::NounRecord;
use crate::service::NounService;

/// Action names carried in [`Message::action`]
pub mod actions {
    pub const GET: &str = "get";
    pub const SAVE: &str = "save";
    pub const HEALTH_CHECK: &str = "healthCheck";
}

pub struct ServiceBinder;

impl ServiceBinder {
    /// Bind `service` at `address`. Every request gets exactly one reply.
    pub async fn register(
        transport: &dyn Transport,
        address: &str,
        service: Arc<dyn NounService>,
    ) -> Result<Registration> {
        let handler = handler_fn(move |message: Message| {
            let service = service.clone();
            async move { dispatch(service.as_ref(), message).await }
        });

        let registration = transport.register(address, handler).await?;
        info!(address, registration_id = %registration.id, "Noun service bound");
        Ok(registration)
    }
}

/// Run one request against `service` and encode the outcome
pub async fn dispatch(service: &dyn NounService, message: Message) -> Reply {
    debug!(action = %message.action, request_id = %message.id, "Handling request");

    match message.action.as_str() {
        actions::GET => Reply::from_result(&message, service.get().await),
        actions::SAVE => match serde_json::from_value::<NounRecord>(message.payload.clone()) {
            Ok(record) => Reply::from_result(&message, service.save(record).await),
            Err(e) => Reply::err(message.id, format!("invalid payload: {}", e)),
        },
        actions::HEALTH_CHECK => Reply::from_result(&message, service.health_check().await),
        other => Reply::from_result::<()>(&message, Err(Failure::new(format!("unknown action: {}", other)))),
    }
}
