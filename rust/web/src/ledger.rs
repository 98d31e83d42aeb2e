//! In-memory stand-in for the external balance ledger.
//!
//! Tables only ever *request* balance changes. Each request carries the
//! table's sequence number, and the ledger remembers the last one it applied
//! per room, so a delta delivered twice is applied once.
//!
//! Balances are signed. Each table debits against the balance it cached when
//! the player connected, so a player staking at several tables can commit
//! more than the account holds. Such a debit is applied in full and the
//! account goes negative with a warning rather than being clamped.

use crate::room::RoomCode;
use blackjack_engine::player::PlayerId;
use blackjack_engine::table::MoneyDelta;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One money delta on its way from a room to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub room: RoomCode,
    pub delta: MoneyDelta,
}

/// Write side of the ledger handed to every room.
pub type LedgerSink = mpsc::UnboundedSender<LedgerEntry>;

#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<PlayerId, i64>,
    applied: HashMap<RoomCode, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account with `initial` unless one already exists, and
    /// returns what the player may stake: the current balance, or zero when
    /// the account is overdrawn.
    pub fn open_account(&self, player: &str, initial: u64) -> u64 {
        let mut state = self.lock();
        let balance = *state
            .balances
            .entry(player.to_string())
            .or_insert_with(|| {
                tracing::info!(player_id = %player, balance = initial, "ledger account opened");
                i64::try_from(initial).unwrap_or(i64::MAX)
            });
        u64::try_from(balance).unwrap_or(0)
    }

    /// Current balance; negative once the account is overdrawn.
    pub fn balance(&self, player: &str) -> Option<i64> {
        self.lock().balances.get(player).copied()
    }

    /// Applies `entry` unless its sequence number was already seen for that
    /// room. Returns whether the balance changed.
    pub fn apply(&self, entry: &LedgerEntry) -> bool {
        let mut state = self.lock();
        let last = state.applied.get(&entry.room).copied().unwrap_or(0);
        if entry.delta.seq <= last {
            tracing::debug!(
                room = %entry.room,
                seq = entry.delta.seq,
                last_applied = last,
                "ignoring redelivered delta"
            );
            return false;
        }
        state.applied.insert(entry.room.clone(), entry.delta.seq);

        let balance = state
            .balances
            .entry(entry.delta.player.clone())
            .or_default();
        let before = *balance;
        *balance = before.saturating_add(entry.delta.delta);
        if *balance < 0 {
            tracing::warn!(
                room = %entry.room,
                player_id = %entry.delta.player,
                seq = entry.delta.seq,
                delta = entry.delta.delta,
                balance = *balance,
                overdraft = balance.unsigned_abs().min(entry.delta.delta.unsigned_abs()),
                "ledger overdrawn"
            );
        }
        tracing::debug!(
            room = %entry.room,
            player_id = %entry.delta.player,
            delta = entry.delta.delta,
            reason = ?entry.delta.reason,
            balance = *balance,
            "ledger delta applied"
        );
        true
    }

    /// Starts the task draining room deltas into this ledger. The task ends
    /// once every sink clone has been dropped.
    pub fn spawn(self: &Arc<Self>) -> (LedgerSink, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<LedgerEntry>();
        let ledger = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                ledger.apply(&entry);
            }
            tracing::info!("ledger sink closed");
        });
        (tx, task)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use blackjack_engine::table::DeltaReason;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn entry(room: &str, seq: u64, player: &str, delta: i64) -> LedgerEntry {
        LedgerEntry {
            room: room.into(),
            delta: MoneyDelta {
                seq,
                player: player.into(),
                delta,
                balance: 0,
                reason: if delta < 0 {
                    DeltaReason::Bet
                } else {
                    DeltaReason::Win
                },
            },
        }
    }

    #[test]
    fn first_open_sets_balance() {
        let ledger = Ledger::new();
        assert_eq!(ledger.open_account("alice", 500), 500);
        assert_eq!(ledger.open_account("alice", 1_000), 500);
        assert_eq!(ledger.balance("alice"), Some(500));
        assert_eq!(ledger.balance("bob"), None);
    }

    #[test]
    fn redelivered_delta_is_applied_once() {
        let ledger = Ledger::new();
        ledger.open_account("alice", 100);

        assert!(ledger.apply(&entry("roomy", 1, "alice", -10)));
        assert!(!ledger.apply(&entry("roomy", 1, "alice", -10)));
        assert!(ledger.apply(&entry("roomy", 2, "alice", 25)));
        assert_eq!(ledger.balance("alice"), Some(115));
    }

    #[test]
    fn sequences_are_tracked_per_room() {
        let ledger = Ledger::new();
        ledger.open_account("alice", 100);
        assert!(ledger.apply(&entry("roomy", 1, "alice", -10)));
        assert!(ledger.apply(&entry("another", 1, "alice", -20)));
        assert_eq!(ledger.balance("alice"), Some(70));
    }

    #[test]
    fn debit_beyond_balance_overdraws_instead_of_clamping() {
        let logs = TestLogSubscriber::new();
        let subscriber = Registry::default().with(logs.clone().into_layer::<Registry>());
        let ledger = Ledger::new();
        ledger.open_account("alice", 100);

        // the same 100 staked at two tables
        tracing::subscriber::with_default(subscriber, || {
            assert!(ledger.apply(&entry("roomy", 1, "alice", -100)));
            assert!(ledger.apply(&entry("another", 1, "alice", -100)));
        });
        assert_eq!(ledger.balance("alice"), Some(-100));
        assert_eq!(ledger.open_account("alice", 100), 0);

        let warnings: Vec<_> = logs
            .find("ledger overdrawn")
            .into_iter()
            .filter(|e| e.fields.iter().any(|(k, v)| k == "room" && v == "another"))
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, tracing::Level::WARN);
        assert!(warnings[0]
            .fields
            .iter()
            .any(|(k, v)| k == "overdraft" && v == "100"));

        assert!(ledger.apply(&entry("roomy", 2, "alice", 200)));
        assert_eq!(ledger.balance("alice"), Some(100));
    }

    #[tokio::test]
    async fn spawned_ledger_drains_sink() {
        let ledger = Arc::new(Ledger::new());
        ledger.open_account("bob", 50);
        let (sink, task) = ledger.spawn();

        sink.send(entry("roomy", 1, "bob", -10)).unwrap();
        sink.send(entry("roomy", 2, "bob", 20)).unwrap();
        drop(sink);
        task.await.unwrap();

        assert_eq!(ledger.balance("bob"), Some(60));
    }
}
