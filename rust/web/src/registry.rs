use crate::room::{Room, RoomCode, RoomContext, RoomHandle};
use blackjack_engine::errors::ConfigError as TableConfigError;
use blackjack_engine::table::{Table, TableConfig, MAX_SEATS, MIN_SEATS};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Characters used in generated room codes; look-alikes (i, l, o, 0, 1) are
/// left out.
pub const CODE_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
pub const CODE_LENGTH: usize = 4;

/// Public summary of a room, taken from its latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub seats: usize,
    pub taken_seats: usize,
    pub opened_at: String,
}

/// Table settings shared by every room the registry opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefaults {
    pub min_bet: u64,
    pub decks: usize,
    pub seed: Option<u64>,
}

impl Default for TableDefaults {
    fn default() -> Self {
        let table = TableConfig::default();
        Self {
            min_bet: table.min_bet,
            decks: table.decks,
            seed: table.seed,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Room not found: {0}")]
    NotFound(RoomCode),
    #[error("Room code already in use: {0}")]
    CodeTaken(RoomCode),
    #[error("Rooms must have between {min} and {max} seats, got {seats}")]
    InvalidSeats { seats: usize, min: usize, max: usize },
    #[error("Invalid table configuration: {0}")]
    Table(#[from] TableConfigError),
    #[error("Room storage poisoned")]
    StoragePoisoned,
}

impl crate::errors::IntoErrorResponse for RegistryError {
    fn status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::CodeTaken(_) => StatusCode::CONFLICT,
            RegistryError::InvalidSeats { .. } => StatusCode::BAD_REQUEST,
            RegistryError::Table(_) | RegistryError::StoragePoisoned => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "room_not_found",
            RegistryError::CodeTaken(_) => "room_code_taken",
            RegistryError::InvalidSeats { .. } => "invalid_seats",
            RegistryError::Table(_) => "invalid_table_config",
            RegistryError::StoragePoisoned => "storage_poisoned",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        use crate::errors::ErrorSeverity;
        match self {
            RegistryError::StoragePoisoned => ErrorSeverity::Critical,
            RegistryError::Table(_) => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            RegistryError::InvalidSeats { seats, min, max } => Some(serde_json::json!({
                "seats": seats,
                "min": min,
                "max": max,
            })),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct RoomEntry {
    handle: RoomHandle,
    task: JoinHandle<()>,
    opened_at: String,
}

/// Owns every open room. Created once by the process and shared with the
/// request handlers.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomCode, RoomEntry>>,
    ctx: RoomContext,
    defaults: TableDefaults,
}

impl RoomRegistry {
    pub fn new(ctx: RoomContext, defaults: TableDefaults) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            ctx,
            defaults,
        }
    }

    /// Opens a room under a fresh random code.
    pub fn create_room(&self, seats: usize) -> Result<RoomCode, RegistryError> {
        let table = self.build_table(seats)?;
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| RegistryError::StoragePoisoned)?;

        let mut rng = rand::rng();
        let code = loop {
            let candidate = random_code(&mut rng);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        rooms.insert(code.clone(), self.start(code.clone(), table));
        Ok(code)
    }

    /// Opens a room under a chosen code, e.g. the rooms configured at startup.
    pub fn open_room(&self, code: &str, seats: usize) -> Result<RoomHandle, RegistryError> {
        let table = self.build_table(seats)?;
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        if rooms.contains_key(code) {
            return Err(RegistryError::CodeTaken(code.to_string()));
        }
        let entry = self.start(code.to_string(), table);
        let handle = entry.handle.clone();
        rooms.insert(code.to_string(), entry);
        Ok(handle)
    }

    pub fn get(&self, code: &str) -> Result<RoomHandle, RegistryError> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        rooms
            .get(code)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))
    }

    pub fn info(&self, code: &str) -> Result<RoomInfo, RegistryError> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        rooms
            .get(code)
            .map(|entry| summarize(code, entry))
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))
    }

    /// All open rooms, ordered by code.
    pub fn rooms(&self) -> Result<Vec<RoomInfo>, RegistryError> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        let mut list: Vec<RoomInfo> = rooms
            .iter()
            .map(|(code, entry)| summarize(code, entry))
            .collect();
        list.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.rooms.read().map(|rooms| rooms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every room and waits for the actors to finish. Handles held
    /// elsewhere keep their room alive until they are dropped.
    pub async fn shutdown(&self) {
        let entries: Vec<(RoomCode, RoomEntry)> = match self.rooms.write() {
            Ok(mut rooms) => rooms.drain().collect(),
            Err(poisoned) => poisoned.into_inner().drain().collect(),
        };
        for (code, entry) in entries {
            let RoomEntry { handle, task, .. } = entry;
            drop(handle);
            if let Err(err) = task.await {
                tracing::warn!(room = %code, error = %err, "room task ended abnormally");
            }
        }
    }

    fn build_table(&self, seats: usize) -> Result<Table, RegistryError> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
            return Err(RegistryError::InvalidSeats {
                seats,
                min: MIN_SEATS,
                max: MAX_SEATS,
            });
        }
        let config = TableConfig {
            seats,
            min_bet: self.defaults.min_bet,
            decks: self.defaults.decks,
            seed: self.defaults.seed,
        };
        Ok(Table::new(config)?)
    }

    fn start(&self, code: RoomCode, table: Table) -> RoomEntry {
        let (handle, task) = Room::spawn(code, table, self.ctx.clone());
        RoomEntry {
            handle,
            task,
            opened_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

fn summarize(code: &str, entry: &RoomEntry) -> RoomInfo {
    RoomInfo {
        code: code.to_string(),
        seats: entry.handle.seats(),
        taken_seats: entry.handle.snapshot().seats_taken(),
        opened_at: entry.opened_at.clone(),
    }
}

fn random_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
