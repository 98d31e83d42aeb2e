//! What the outside world is allowed to see of a table.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::player::PlayerId;
use crate::table::{Table, TableStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandView {
    pub seat: usize,
    pub owner: Option<PlayerId>,
    pub cards: Vec<Card>,
    pub stake: u64,
    pub split: bool,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub balance: u64,
    pub connected: bool,
}

/// Snapshot broadcast after every accepted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub status: TableStatus,
    pub round: u64,
    pub min_bet: u64,
    /// Dealer cards; only the up card while players are acting.
    pub dealer: Vec<Card>,
    /// `None` while the hole card is hidden.
    pub dealer_score: Option<u32>,
    pub hands: Vec<HandView>,
    /// Index into `hands` of the hand to act, or -1.
    pub active_hand: i64,
    pub players: Vec<PlayerView>,
}

impl TableView {
    pub fn seats_taken(&self) -> usize {
        let mut seats: Vec<usize> = self
            .hands
            .iter()
            .filter(|h| h.owner.is_some())
            .map(|h| h.seat)
            .collect();
        seats.dedup();
        seats.len()
    }
}

/// Projects `table` into its public view, hiding the dealer's hole card
/// during [`TableStatus::PlayerTurn`].
pub fn project(table: &Table) -> TableView {
    let hole_hidden = table.status() == TableStatus::PlayerTurn;
    let dealer_cards = table.dealer().cards();
    let dealer = if hole_hidden {
        dealer_cards.iter().take(1).copied().collect()
    } else {
        dealer_cards.to_vec()
    };
    let dealer_score = if hole_hidden {
        None
    } else {
        Some(table.dealer().best_score())
    };

    let hands = table
        .hands()
        .iter()
        .map(|h| HandView {
            seat: h.seat().unwrap_or_default(),
            owner: h.owner().cloned(),
            cards: h.cards().to_vec(),
            stake: h.stake(),
            split: h.is_split(),
            score: h.best_score(),
        })
        .collect();

    let players = table
        .players()
        .map(|p| PlayerView {
            id: p.id().clone(),
            balance: p.balance(),
            connected: p.is_connected(),
        })
        .collect();

    TableView {
        status: table.status(),
        round: table.round(),
        min_bet: table.min_bet(),
        dealer,
        dealer_score,
        hands,
        active_hand: table.active_hand().map_or(-1, |i| i as i64),
        players,
    }
}
