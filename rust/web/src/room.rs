//! The room actor: the single owner of one [`Table`].
//!
//! Commands and presence changes from any number of senders share one FIFO
//! inbox, so the table sees them in arrival order. The only other input is the
//! inactivity deadline. Every accepted event is followed by the money deltas
//! going out to the ledger, settled rounds going to the round log and the
//! event bus, and a fresh snapshot. Rejected or unparseable commands change
//! nothing and are not broadcast.

use crate::events::{EventBus, RoomEvent};
use crate::ledger::{LedgerEntry, LedgerSink};
use blackjack_engine::command::Command;
use blackjack_engine::player::PlayerId;
use blackjack_engine::record::RoundLogger;
use blackjack_engine::table::{Table, TableStatus};
use blackjack_engine::view::{project, TableView};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

pub type RoomCode = String;

const INBOX_BUFFER: usize = 256;

/// A raw command as received from a player's connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCommand {
    pub player_id: PlayerId,
    pub payload: String,
}

/// A player's connection coming or going. `balance` seeds the table's cached
/// balance on connect and is ignored on disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub player_id: PlayerId,
    pub balance: u64,
    pub connect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomInput {
    Command(RoomCommand),
    Presence(PresenceEvent),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room {0} is closed")]
    Closed(RoomCode),
}

/// Shared collaborators every room is wired to.
#[derive(Debug, Clone)]
pub struct RoomContext {
    pub events: Arc<EventBus>,
    pub ledger: LedgerSink,
    pub round_log: Option<Arc<Mutex<RoundLogger>>>,
    pub turn_timeout: Duration,
}

/// Cheap, cloneable way in to a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    seats: usize,
    inbox: mpsc::Sender<RoomInput>,
    snapshot: watch::Receiver<TableView>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn seats(&self) -> usize {
        self.seats
    }

    pub async fn command(
        &self,
        player_id: impl Into<PlayerId>,
        payload: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.send(RoomInput::Command(RoomCommand {
            player_id: player_id.into(),
            payload: payload.into(),
        }))
        .await
    }

    pub async fn connect(
        &self,
        player_id: impl Into<PlayerId>,
        balance: u64,
    ) -> Result<(), RoomError> {
        self.send(RoomInput::Presence(PresenceEvent {
            player_id: player_id.into(),
            balance,
            connect: true,
        }))
        .await
    }

    pub async fn disconnect(&self, player_id: impl Into<PlayerId>) -> Result<(), RoomError> {
        self.send(RoomInput::Presence(PresenceEvent {
            player_id: player_id.into(),
            balance: 0,
            connect: false,
        }))
        .await
    }

    pub async fn send(&self, input: RoomInput) -> Result<(), RoomError> {
        self.inbox
            .send(input)
            .await
            .map_err(|_| RoomError::Closed(self.code.clone()))
    }

    /// Latest broadcast view of the table.
    pub fn snapshot(&self) -> TableView {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TableView> {
        self.snapshot.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }
}

pub struct Room {
    code: RoomCode,
    table: Table,
    inbox: mpsc::Receiver<RoomInput>,
    snapshot: watch::Sender<TableView>,
    ctx: RoomContext,
    deadline: Option<Instant>,
    pending: Option<PendingDecision>,
}

impl Room {
    /// Spawns the actor for `table` and returns its handle. The room runs
    /// until every handle clone has been dropped.
    pub fn spawn(code: RoomCode, table: Table, ctx: RoomContext) -> (RoomHandle, JoinHandle<()>) {
        let (tx, inbox) = mpsc::channel(INBOX_BUFFER);
        let (snapshot, snapshot_rx) = watch::channel(project(&table));
        let handle = RoomHandle {
            code: code.clone(),
            seats: table.config().seats,
            inbox: tx,
            snapshot: snapshot_rx,
        };
        let room = Room {
            code,
            table,
            inbox,
            snapshot,
            ctx,
            deadline: None,
            pending: None,
        };
        let task = tokio::spawn(room.run());
        (handle, task)
    }

    async fn run(mut self) {
        tracing::info!(
            room = %self.code,
            seats = self.table.config().seats,
            min_bet = self.table.min_bet(),
            "room opened"
        );

        loop {
            let deadline = self.deadline;
            tokio::select! {
                input = self.inbox.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timeout();
                }
            }
        }

        self.ctx
            .events
            .broadcast(&self.code, RoomEvent::Closed { room: self.code.clone() });
        self.ctx.events.drop_room(&self.code);
        tracing::info!(room = %self.code, "room closed");
    }

    fn handle(&mut self, input: RoomInput) {
        let accepted = match input {
            RoomInput::Command(command) => self.on_command(command),
            RoomInput::Presence(presence) => self.on_presence(presence),
        };
        if accepted {
            self.after_event();
        }
    }

    fn on_command(&mut self, command: RoomCommand) -> bool {
        let Some(parsed) = Command::parse(&command.payload) else {
            tracing::debug!(
                room = %self.code,
                player_id = %command.player_id,
                "dropping unparseable command"
            );
            return false;
        };

        match self.table.apply(&command.player_id, &parsed) {
            Ok(()) => {
                tracing::debug!(
                    room = %self.code,
                    player_id = %command.player_id,
                    action = ?parsed.action,
                    status = ?self.table.status(),
                    "command applied"
                );
                true
            }
            Err(err) => {
                tracing::debug!(
                    room = %self.code,
                    player_id = %command.player_id,
                    action = ?parsed.action,
                    error = %err,
                    "command rejected"
                );
                false
            }
        }
    }

    fn on_presence(&mut self, presence: PresenceEvent) -> bool {
        if presence.connect {
            if !self.table.connect(&presence.player_id, presence.balance) {
                tracing::debug!(
                    room = %self.code,
                    player_id = %presence.player_id,
                    "already connected"
                );
                return false;
            }
            tracing::info!(room = %self.code, player_id = %presence.player_id, "player connected");
            return true;
        }
        match self.table.disconnect(&presence.player_id) {
            Ok(()) => {
                tracing::info!(room = %self.code, player_id = %presence.player_id, "player disconnected");
                true
            }
            Err(err) => {
                tracing::debug!(
                    room = %self.code,
                    player_id = %presence.player_id,
                    error = %err,
                    "disconnect ignored"
                );
                false
            }
        }
    }

    fn on_timeout(&mut self) {
        self.deadline = None;
        let status = self.table.status();
        match self.table.expire_turn() {
            Ok(()) => {
                tracing::debug!(room = %self.code, status = ?status, "turn timed out");
                self.after_event();
            }
            Err(err) => {
                tracing::debug!(room = %self.code, error = %err, "timeout had nothing to do");
            }
        }
    }

    fn after_event(&mut self) {
        for delta in self.table.take_deltas() {
            let entry = LedgerEntry {
                room: self.code.clone(),
                delta,
            };
            if self.ctx.ledger.send(entry).is_err() {
                tracing::warn!(room = %self.code, "ledger sink closed; delta not delivered");
            }
        }

        for round in self.table.take_settled_rounds() {
            tracing::info!(
                room = %self.code,
                round = round.round_id,
                dealer_score = round.dealer_score,
                hands = round.hands.len(),
                paid = round.total_payout(),
                "round settled"
            );
            if let Some(log) = &self.ctx.round_log {
                let mut log = log.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Err(err) = log.write(&round) {
                    tracing::warn!(room = %self.code, error = %err, "failed to write round log");
                }
            }
            self.ctx.events.broadcast(
                &self.code,
                RoomEvent::RoundSettled {
                    room: self.code.clone(),
                    round,
                },
            );
        }

        self.rearm();

        let view = project(&self.table);
        self.snapshot.send_replace(view.clone());
        self.ctx.events.broadcast(
            &self.code,
            RoomEvent::Snapshot {
                room: self.code.clone(),
                state: view,
            },
        );
    }

    /// Keeps the inactivity window running while a decision is pending:
    /// during play, or during betting once someone has put money down. The
    /// window only restarts when the pending decision itself moves on.
    fn rearm(&mut self) {
        let Some(pending) = PendingDecision::of(&self.table) else {
            self.deadline = None;
            self.pending = None;
            return;
        };
        if self.deadline.is_none() || self.pending.as_ref() != Some(&pending) {
            self.deadline = Some(Instant::now() + self.ctx.turn_timeout);
            self.pending = Some(pending);
        }
    }
}

/// What the inactivity timer is waiting on: the active hand's next move, or
/// the remaining bets.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDecision {
    status: TableStatus,
    round: u64,
    active: Option<usize>,
    hands: usize,
    active_cards: usize,
    staked: Vec<usize>,
}

impl PendingDecision {
    fn of(table: &Table) -> Option<Self> {
        let pending = match table.status() {
            TableStatus::PlayerTurn => true,
            TableStatus::Betting => table.any_bet_placed(),
            TableStatus::DealerTurn => false,
        };
        if !pending {
            return None;
        }
        let active = table.active_hand();
        Some(Self {
            status: table.status(),
            round: table.round(),
            active,
            hands: table.hands().len(),
            active_cards: active.map_or(0, |i| table.hands()[i].len()),
            staked: table
                .hands()
                .iter()
                .enumerate()
                .filter(|(_, h)| h.stake() > 0)
                .map(|(i, _)| i)
                .collect(),
        })
    }
}
