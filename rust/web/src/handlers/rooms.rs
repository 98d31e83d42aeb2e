use crate::errors::IntoErrorResponse;
use crate::ledger::Ledger;
use crate::registry::{RoomInfo, RoomRegistry};
use crate::room::RoomCode;
use blackjack_engine::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub seats: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: RoomCode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomInfo>,
}

#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub player_id: PlayerId,
    pub connect: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresenceResponse {
    pub player_id: PlayerId,
    pub balance: Option<i64>,
}

/// A player command. `command` is forwarded as-is: either a JSON string
/// holding the command or the command object itself.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub player_id: PlayerId,
    pub command: serde_json::Value,
}

impl CommandRequest {
    fn into_payload(self) -> (PlayerId, String) {
        let payload = match self.command {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        (self.player_id, payload)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Accepted {
    pub accepted: bool,
}

/// `GET /api/rooms`
pub async fn list_rooms(registry: Arc<RoomRegistry>) -> Response {
    match registry.rooms() {
        Ok(rooms) => json_response(StatusCode::OK, RoomListResponse { rooms }),
        Err(err) => err.into_http_response(),
    }
}

/// `POST /api/rooms` with `{"seats": n}`; answers 201 with the new code.
pub async fn create_room(registry: Arc<RoomRegistry>, request: CreateRoomRequest) -> Response {
    match registry.create_room(request.seats) {
        Ok(code) => {
            tracing::info!(room = %code, seats = request.seats, "room created");
            json_response(StatusCode::CREATED, CreateRoomResponse { code })
        }
        Err(err) => err.into_http_response(),
    }
}

/// `GET /api/rooms/{code}`
pub async fn get_room(registry: Arc<RoomRegistry>, code: RoomCode) -> Response {
    match registry.info(&code) {
        Ok(info) => json_response(StatusCode::OK, info),
        Err(err) => err.into_http_response(),
    }
}

/// `POST /api/rooms/{code}/presence`
///
/// On connect the player's ledger account is opened with the configured
/// starting balance (if it does not exist yet) and the ledger balance seeds
/// the table's cached copy.
pub async fn presence(
    registry: Arc<RoomRegistry>,
    ledger: Arc<Ledger>,
    starting_balance: u64,
    code: RoomCode,
    request: PresenceRequest,
) -> Response {
    let handle = match registry.get(&code) {
        Ok(handle) => handle,
        Err(err) => return err.into_http_response(),
    };

    let (sent, balance) = if request.connect {
        let available = ledger.open_account(&request.player_id, starting_balance);
        (
            handle.connect(request.player_id.clone(), available).await,
            ledger.balance(&request.player_id),
        )
    } else {
        (
            handle.disconnect(request.player_id.clone()).await,
            ledger.balance(&request.player_id),
        )
    };

    match sent {
        Ok(()) => json_response(
            StatusCode::ACCEPTED,
            PresenceResponse {
                player_id: request.player_id,
                balance,
            },
        ),
        Err(err) => err.into_http_response(),
    }
}

/// `POST /api/rooms/{code}/commands`
///
/// Always 202 for an open room: whether the command had any effect is only
/// visible on the event stream.
pub async fn submit_command(
    registry: Arc<RoomRegistry>,
    code: RoomCode,
    request: CommandRequest,
) -> Response {
    let handle = match registry.get(&code) {
        Ok(handle) => handle,
        Err(err) => return err.into_http_response(),
    };
    let (player_id, payload) = request.into_payload();
    match handle.command(player_id, payload).await {
        Ok(()) => json_response(StatusCode::ACCEPTED, Accepted { accepted: true }),
        Err(err) => err.into_http_response(),
    }
}

fn json_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_text_is_forwarded_verbatim() {
        let request = CommandRequest {
            player_id: "alice".into(),
            command: json!(r#"{"action":"hit"}"#),
        };
        let (player, payload) = request.into_payload();
        assert_eq!(player, "alice");
        assert_eq!(payload, r#"{"action":"hit"}"#);
    }

    #[test]
    fn command_objects_are_serialized() {
        let request = CommandRequest {
            player_id: "bob".into(),
            command: json!({"action": "bet", "seat": 1, "bet": 20}),
        };
        let (_, payload) = request.into_payload();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["action"], "bet");
        assert_eq!(value["bet"], 20);
    }
}
