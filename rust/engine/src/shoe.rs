use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::hand::Hand;

/// The card supply for a table: one or more 52-card decks dealt from a
/// cursor. Running out is never visible to callers; [`Shoe::deal`]
/// regenerates and reshuffles on the spot.
#[derive(Debug)]
pub struct Shoe {
    cards: Vec<Card>,
    position: usize,
    decks: usize,
    rng: ChaCha20Rng,
}

impl Shoe {
    /// A shuffled shoe of `decks` decks whose order is fixed by `seed`.
    pub fn new_with_seed(decks: usize, seed: u64) -> Self {
        let mut shoe = Self {
            cards: Vec::new(),
            position: 0,
            decks: decks.max(1),
            rng: ChaCha20Rng::seed_from_u64(seed),
        };
        shoe.shuffle();
        shoe
    }

    pub fn new(decks: usize) -> Self {
        Self::new_with_seed(decks, rand::random())
    }

    /// A shoe that deals `cards` in the given order before falling back to
    /// shuffled decks. Used to script deals.
    pub fn stacked(decks: usize, seed: u64, cards: Vec<Card>) -> Self {
        Self {
            cards,
            position: 0,
            decks: decks.max(1),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Regenerates the full shoe and permutes it uniformly.
    pub fn shuffle(&mut self) {
        self.cards = (0..self.decks).flat_map(|_| full_deck()).collect();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal(&mut self) -> Card {
        if self.position >= self.cards.len() {
            self.shuffle();
        }
        let c = self.cards[self.position];
        self.position += 1;
        c
    }

    pub fn deal_to(&mut self, hand: &mut Hand) {
        let card = self.deal();
        hand.push(card);
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn decks(&self) -> usize {
        self.decks
    }
}
