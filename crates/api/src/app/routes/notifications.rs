//! Live permission-change notifications over Server-Sent Events.
//!
//! A connection is registered for the authenticated principal when the stream
//! opens. A forwarding task drains it into the response and deregisters it as
//! soon as the client goes away.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;

use erpguard_auth::Principal;
use erpguard_events::Notification;
use erpguard_infra::ServiceError;

use crate::app::errors::service_error_to_response;
use crate::app::services::AppServices;

/// GET /notifications/stream
pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    let notifier = services.engine.notifier().clone();
    let mut connection = match notifier.connect(Some(principal.user_id)) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "live connection not registered");
            return service_error_to_response(ServiceError::Internal(e.to_string()));
        }
    };

    let (tx, rx) = unbounded_channel::<Result<SseEvent, Infallible>>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                message = connection.recv() => match message {
                    Some(message) => {
                        if tx.send(Ok(to_sse(&message))).is_err() {
                            break; // Client gone
                        }
                    }
                    None => break,
                },
            }
        }
        notifier.disconnect(&connection.handle());
    });

    Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

fn to_sse(message: &Notification) -> SseEvent {
    let data = serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string());
    SseEvent::default().event(message.kind()).data(data)
}
