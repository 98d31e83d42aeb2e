use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::player::PlayerId;

pub const BLACKJACK: u32 = 21;

/// Cards held by the dealer or by one seat, together with the stake riding
/// on them.
///
/// Cards are kept in deal order. The only operation that removes cards is
/// [`Hand::split_off`], which leaves the first card behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
    stake: u64,
    owner: Option<PlayerId>,
    seat: Option<usize>,
    split: bool,
}

impl Hand {
    /// The hand belonging to `seat`, empty and unstaked.
    pub fn for_seat(seat: usize, owner: Option<PlayerId>) -> Self {
        Self {
            seat: Some(seat),
            owner,
            ..Self::default()
        }
    }

    pub fn dealer() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    pub fn set_stake(&mut self, stake: u64) {
        self.stake = stake;
    }

    pub fn owner(&self) -> Option<&PlayerId> {
        self.owner.as_ref()
    }

    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.as_deref() == Some(player)
    }

    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        self.owner = owner;
    }

    pub fn seat(&self) -> Option<usize> {
        self.seat
    }

    pub fn is_split(&self) -> bool {
        self.split
    }

    /// An unseated, unstaked slot.
    pub fn is_vacant(&self) -> bool {
        self.owner.is_none() && self.stake == 0
    }

    /// Every total of this hand that does not exceed 21, lowest first.
    ///
    /// Aces count 1 in the base total. When an ace is present one of them
    /// may be promoted to 11; promoting a second would always bust, so at
    /// most one alternate total exists.
    pub fn scores(&self) -> Vec<u32> {
        let base: u32 = self.cards.iter().map(Card::value).sum();
        if base > BLACKJACK {
            return Vec::new();
        }
        let mut totals = vec![base];
        if self.cards.iter().any(Card::is_ace) && base + 10 <= BLACKJACK {
            totals.push(base + 10);
        }
        totals
    }

    /// Highest total not over 21, or 0 once the hand has bust.
    pub fn best_score(&self) -> u32 {
        self.scores().into_iter().max().unwrap_or(0)
    }

    pub fn has_bust(&self) -> bool {
        self.scores().is_empty()
    }

    pub fn has_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.best_score() == BLACKJACK
    }

    /// Two cards of equal value. Ranks may differ: King and Queen qualify.
    pub fn has_splittable_pair(&self) -> bool {
        matches!(self.cards.as_slice(), [a, b] if a.value() == b.value())
    }

    /// Moves the second card into a new split hand with the same owner, seat
    /// and stake. `self` keeps its first card.
    pub fn split_off(&mut self) -> Hand {
        let moved = self.cards.split_off(1);
        Hand {
            cards: moved,
            stake: self.stake,
            owner: self.owner.clone(),
            seat: self.seat,
            split: true,
        }
    }
}
