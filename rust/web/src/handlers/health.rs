use serde::Serialize;
use warp::reply::Json;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    rooms: usize,
}

pub fn health(rooms: usize) -> Json {
    warp::reply::json(&HealthBody { status: "ok", rooms })
}
