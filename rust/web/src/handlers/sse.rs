use crate::errors::IntoErrorResponse;
use crate::events::{EventBus, EventSubscription, RoomEvent};
use crate::registry::RoomRegistry;
use crate::room::RoomCode;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use warp::http;
use warp::reply::{self, Response};
use warp::sse;
use warp::Reply;

/// `GET /api/rooms/{code}/events`: the room's current snapshot followed by
/// every event it broadcasts.
pub async fn stream_events(
    code: RoomCode,
    registry: Arc<RoomRegistry>,
    event_bus: Arc<EventBus>,
) -> Response {
    let handle = match registry.get(&code) {
        Ok(handle) => handle,
        Err(err) => return err.into_http_response(),
    };

    let subscription = event_bus.subscribe(code.clone());
    let current = RoomEvent::Snapshot {
        room: code,
        state: handle.snapshot(),
    };
    let stream = tokio_stream::once(Ok::<_, Infallible>(render_event(current)))
        .chain(subscription_stream(subscription));
    let keep_alive = sse::keep_alive()
        .interval(Duration::from_secs(15))
        .text(":keep-alive\n");

    let reply = sse::reply(keep_alive.stream(stream));
    reply::with_header(reply, http::header::CACHE_CONTROL, "no-cache").into_response()
}

fn subscription_stream(
    subscription: EventSubscription,
) -> impl tokio_stream::Stream<Item = Result<sse::Event, Infallible>> {
    let mut subscription = subscription;
    let (_, placeholder_rx) = mpsc::channel(1);
    let receiver = std::mem::replace(&mut subscription.receiver, placeholder_rx);
    // the subscription rides along so it unsubscribes when the client leaves
    let subscription = Arc::new(subscription);

    ReceiverStream::new(receiver).map(move |event| {
        let _keep_alive = Arc::clone(&subscription);
        Ok(render_event(event))
    })
}

pub fn render_event(event: RoomEvent) -> sse::Event {
    let name = match &event {
        RoomEvent::Snapshot { .. } => "snapshot",
        RoomEvent::RoundSettled { .. } => "round_settled",
        RoomEvent::Closed { .. } => "closed",
    };
    match serde_json::to_string(&event) {
        Ok(json) => sse::Event::default().event(name).data(json),
        Err(err) => {
            let fallback = serde_json::json!({
                "type": "error",
                "message": format!("failed to serialize room event: {err}")
            })
            .to_string();
            sse::Event::default().event("error").data(fallback)
        }
    }
}
