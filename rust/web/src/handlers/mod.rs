pub mod health;
pub mod rooms;
pub mod sse;

pub use health::health;
pub use rooms::{
    create_room, get_room, list_rooms, presence, submit_command, CommandRequest,
    CreateRoomRequest, CreateRoomResponse, PresenceRequest, PresenceResponse, RoomListResponse,
};
pub use sse::stream_events;
