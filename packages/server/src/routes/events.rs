//! Live event stream for admin dashboards.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures_util::stream::Stream;
use school_core::SchoolEvent;
use tokio::sync::mpsc;

use actors::{BroadcastHub, SubscriberId};

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /events`
///
/// Server-Sent Events stream of committed registrations. EventSource
/// cannot set headers itself, so dashboard clients connect through a
/// fetch-based polyfill that carries the bearer token.
pub async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Sse<KeepAliveStream<EventStream>>, ApiError> {
    let token = auth::bearer_token(&headers).ok_or(ApiError::MissingToken)?;
    auth::verify_token(&state.config.jwt_secret, token)?;

    let hub = state.intake.hub().clone();
    let (id, receiver) = hub.subscribe();
    tracing::debug!("Event stream opened for subscriber {id}");

    Ok(Sse::new(EventStream { hub, id, receiver }).keep_alive(KeepAlive::default()))
}

/// Stream adapter bridging a hub subscription into SSE events.
///
/// Dropping the stream (client disconnect) deregisters the subscriber.
pub struct EventStream {
    hub: Arc<BroadcastHub>,
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<SchoolEvent>,
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                let sse_event = Event::default()
                    .json_data(&event)
                    .unwrap_or_else(|_| Event::default().data("{}"));
                Poll::Ready(Some(Ok(sse_event)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures_util::StreamExt;
    use school_core::{Registration, RegistrationRecord, RegistrationStatus};

    fn committed(id: i64) -> SchoolEvent {
        let now = Utc::now();
        SchoolEvent::Registration {
            registration: RegistrationRecord {
                id,
                registration: Registration {
                    first_name: "Test".to_string(),
                    last_name: "Student".to_string(),
                    date_of_birth: "2010-01-01".to_string(),
                    gender: "other".to_string(),
                    email: format!("student{id}@example.com"),
                    phone: "000".to_string(),
                    address: "here".to_string(),
                    program: "primary".to_string(),
                    grade: "1".to_string(),
                    parent_name: None,
                    parent_phone: None,
                    previous_school: None,
                    medical_info: None,
                    newsletter: false,
                },
                status: RegistrationStatus::Pending,
                created_at: now,
                updated_at: now,
            },
        }
    }

    fn assert_into_response<T: axum::response::IntoResponse>() {}

    #[test]
    fn keep_alive_wrapped_stream_is_a_response() {
        assert_into_response::<Sse<KeepAliveStream<EventStream>>>();
    }

    #[tokio::test]
    async fn stream_forwards_hub_events() {
        let hub = Arc::new(BroadcastHub::new());
        let (id, receiver) = hub.subscribe();
        let mut stream = EventStream {
            hub: hub.clone(),
            id,
            receiver,
        };

        hub.publish(&committed(7));
        let event = stream.next().await;
        assert!(event.is_some());
    }

    #[tokio::test]
    async fn dropping_the_stream_unsubscribes() {
        let hub = Arc::new(BroadcastHub::new());
        let (id, receiver) = hub.subscribe();
        let stream = EventStream {
            hub: hub.clone(),
            id,
            receiver,
        };

        assert_eq!(hub.subscriber_count(), 1);
        drop(stream);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
