use crate::errors::GameError;
use serde::{Deserialize, Serialize};

/// Opaque player identity, as handed over by the authentication layer.
pub type PlayerId = String;

/// A player known to a table.
///
/// `balance` is the table's cached copy. The ledger owns the real figure;
/// every change made here is also reported as a [`crate::table::MoneyDelta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    balance: u64,
    connected: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, balance: u64) -> Self {
        Self {
            id: id.into(),
            balance,
            connected: true,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    pub fn debit(&mut self, amount: u64) -> Result<(), GameError> {
        if !self.can_afford(amount) {
            return Err(GameError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }
}
