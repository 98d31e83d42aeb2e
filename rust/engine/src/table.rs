use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::command::{Action, Command};
use crate::errors::{ConfigError, GameError};
use crate::hand::{Hand, BLACKJACK};
use crate::player::{Player, PlayerId};
use crate::record::{HandResult, RoundRecord};
use crate::rules::{self, Outcome};
use crate::shoe::Shoe;

pub const MIN_SEATS: usize = 2;
pub const MAX_SEATS: usize = 8;
pub const MAX_DECKS: usize = 8;

/// Phase of the betting/playing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Betting,
    PlayerTurn,
    DealerTurn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub seats: usize,
    pub min_bet: u64,
    pub decks: usize,
    /// Fixes the shuffle order; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            seats: 6,
            min_bet: 10,
            decks: 1,
            seed: None,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&self.seats) {
            return Err(ConfigError::InvalidSeats {
                seats: self.seats,
                min: MIN_SEATS,
                max: MAX_SEATS,
            });
        }
        if self.min_bet == 0 {
            return Err(ConfigError::ZeroMinimumBet);
        }
        if !(1..=MAX_DECKS).contains(&self.decks) {
            return Err(ConfigError::InvalidDecks {
                decks: self.decks,
                max: MAX_DECKS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaReason {
    Bet,
    Double,
    Split,
    Blackjack,
    Win,
    Push,
}

/// A balance change the table asks the ledger to apply.
///
/// `seq` is strictly increasing per table, so a ledger that remembers the
/// last sequence it applied can accept redelivered deltas safely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyDelta {
    pub seq: u64,
    pub player: PlayerId,
    pub delta: i64,
    /// The table's cached balance after this delta.
    pub balance: u64,
    pub reason: DeltaReason,
}

/// One blackjack table: the shoe, the dealer, the seats and the players
/// sitting at them.
///
/// During betting `hands` holds exactly one hand per seat, in seat order.
/// Splits insert new hands right after their parent, so during play the
/// turn order is `hands` order and may be longer than the seat count.
/// Every mutating operation either applies completely or returns an error
/// and leaves the table untouched.
#[derive(Debug)]
pub struct Table {
    config: TableConfig,
    shoe: Shoe,
    dealer: Hand,
    seats: Vec<Option<PlayerId>>,
    hands: Vec<Hand>,
    players: BTreeMap<PlayerId, Player>,
    status: TableStatus,
    active: Option<usize>,
    round: u64,
    next_seq: u64,
    deltas: Vec<MoneyDelta>,
    results: Vec<HandResult>,
    settled: Vec<RoundRecord>,
}

impl Table {
    pub fn new(config: TableConfig) -> Result<Self, ConfigError> {
        let shoe = match config.seed {
            Some(seed) => Shoe::new_with_seed(config.decks, seed),
            None => Shoe::new(config.decks),
        };
        Self::with_shoe(config, shoe)
    }

    pub fn with_shoe(config: TableConfig, shoe: Shoe) -> Result<Self, ConfigError> {
        config.validate()?;
        let seats = vec![None; config.seats];
        let mut table = Self {
            config,
            shoe,
            dealer: Hand::dealer(),
            seats,
            hands: Vec::new(),
            players: BTreeMap::new(),
            status: TableStatus::Betting,
            active: None,
            round: 1,
            next_seq: 1,
            deltas: Vec::new(),
            results: Vec::new(),
            settled: Vec::new(),
        };
        table.reset_hands();
        Ok(table)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn min_bet(&self) -> u64 {
        self.config.min_bet
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn active_hand(&self) -> Option<usize> {
        self.active
    }

    pub fn seats(&self) -> &[Option<PlayerId>] {
        &self.seats
    }

    pub fn seats_taken(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Number of the round currently being bet or played.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn any_bet_placed(&self) -> bool {
        self.hands.iter().any(|h| h.stake() > 0)
    }

    /// Hands the queued money deltas to the caller, oldest first.
    pub fn take_deltas(&mut self) -> Vec<MoneyDelta> {
        std::mem::take(&mut self.deltas)
    }

    /// Hands over records of rounds settled since the last call.
    pub fn take_settled_rounds(&mut self) -> Vec<RoundRecord> {
        std::mem::take(&mut self.settled)
    }

    /// Registers a (re)connecting player. A player the table already knows
    /// keeps its cached balance; `balance` only seeds newcomers. Returns
    /// `false` when the player was already connected and nothing changed.
    pub fn connect(&mut self, id: &str, balance: u64) -> bool {
        match self.players.get_mut(id) {
            Some(player) if player.is_connected() => false,
            Some(player) => {
                player.set_connected(true);
                true
            }
            None => {
                self.players
                    .insert(id.to_string(), Player::new(id, balance));
                true
            }
        }
    }

    /// Marks a player as gone. Unstaked seats are released straight away
    /// while betting; during play the player's hands are skipped. The record
    /// itself is dropped at the next round reset.
    pub fn disconnect(&mut self, id: &str) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        player.set_connected(false);

        match self.status {
            TableStatus::Betting => {
                for seat in 0..self.seats.len() {
                    if self.hands[seat].is_owned_by(id) && self.hands[seat].stake() == 0 {
                        self.vacate(seat);
                    }
                }
                if !self.hands.iter().any(|h| h.is_owned_by(id)) {
                    self.players.remove(id);
                }
                self.start_if_ready();
            }
            TableStatus::PlayerTurn => {
                if self.active.is_some_and(|i| self.hands[i].is_owned_by(id)) {
                    self.advance_hand();
                }
            }
            TableStatus::DealerTurn => {}
        }
        Ok(())
    }

    /// Applies a player command for the current phase. Commands that make no
    /// sense in the current phase fail with [`GameError::WrongPhase`].
    pub fn apply(&mut self, player: &str, command: &Command) -> Result<(), GameError> {
        match (self.status, command.action) {
            (TableStatus::Betting, Action::Join) => self.join(player, seat_of(command)?),
            (TableStatus::Betting, Action::Leave) => {
                self.leave(player, seat_of(command)?)?;
                self.start_if_ready();
                Ok(())
            }
            (TableStatus::Betting, Action::Bet) => {
                self.enter_bet(player, command.bet, seat_of(command)?)?;
                self.start_if_ready();
                Ok(())
            }
            (TableStatus::PlayerTurn, Action::Hit) => self.hit(player),
            (TableStatus::PlayerTurn, Action::Stand | Action::End) => self.stand(player),
            (TableStatus::PlayerTurn, Action::Double) => self.double(player),
            (TableStatus::PlayerTurn, Action::Split) => self.split(player),
            (status, _) => Err(GameError::WrongPhase(status)),
        }
    }

    pub fn join(&mut self, id: &str, seat: usize) -> Result<(), GameError> {
        self.require_status(TableStatus::Betting)?;
        self.check_seat(seat)?;
        if self.seats[seat].is_some() {
            return Err(GameError::SeatTaken(seat));
        }
        let player = self
            .players
            .get(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        if !player.is_connected() {
            return Err(GameError::Disconnected(id.to_string()));
        }
        if !player.can_afford(self.config.min_bet) {
            return Err(GameError::InsufficientBalance {
                needed: self.config.min_bet,
                available: player.balance(),
            });
        }

        self.seats[seat] = Some(id.to_string());
        self.hands[seat].set_owner(Some(id.to_string()));
        Ok(())
    }

    pub fn leave(&mut self, id: &str, seat: usize) -> Result<(), GameError> {
        self.require_status(TableStatus::Betting)?;
        self.check_seat(seat)?;
        if !self.hands[seat].is_owned_by(id) {
            return Err(GameError::NotSeatOwner(seat));
        }
        if self.hands[seat].stake() > 0 {
            return Err(GameError::StakePlaced(seat));
        }
        self.vacate(seat);
        Ok(())
    }

    pub fn enter_bet(&mut self, id: &str, amount: u64, seat: usize) -> Result<(), GameError> {
        self.require_status(TableStatus::Betting)?;
        self.check_seat(seat)?;
        let player = self
            .players
            .get(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        if !self.hands[seat].is_owned_by(id) {
            return Err(GameError::NotSeatOwner(seat));
        }
        if self.hands[seat].stake() > 0 {
            return Err(GameError::StakePlaced(seat));
        }
        let amount = rules::validate_bet(amount, self.config.min_bet, player.balance())?;

        self.charge(id, amount, DeltaReason::Bet)?;
        self.hands[seat].set_stake(amount);
        Ok(())
    }

    /// True once at least one seat is staked and no occupied seat is still
    /// waiting to bet.
    pub fn all_bets_in(&self) -> bool {
        self.any_bet_placed()
            && self
                .hands
                .iter()
                .all(|h| h.owner().is_none() || h.stake() > 0)
    }

    /// Deals the opening cards and hands the turn to the first seat that
    /// needs a decision.
    pub fn start_player_turn(&mut self) -> Result<(), GameError> {
        self.require_status(TableStatus::Betting)?;
        if !self.all_bets_in() {
            return Err(GameError::BetsIncomplete);
        }
        self.deal_all();
        self.status = TableStatus::PlayerTurn;
        self.active = None;

        if self.dealer.has_blackjack() {
            self.dealer_turn();
        } else {
            self.advance_hand();
        }
        Ok(())
    }

    fn deal_all(&mut self) {
        for _ in 0..2 {
            for hand in self.hands.iter_mut().filter(|h| h.stake() > 0) {
                self.shoe.deal_to(hand);
            }
            self.shoe.deal_to(&mut self.dealer);
        }
    }

    pub fn hit(&mut self, id: &str) -> Result<(), GameError> {
        let i = self.turn_of(id)?;
        self.shoe.deal_to(&mut self.hands[i]);
        self.after_action(i);
        Ok(())
    }

    pub fn stand(&mut self, id: &str) -> Result<(), GameError> {
        self.turn_of(id)?;
        self.advance_hand();
        Ok(())
    }

    pub fn can_double(&self, i: usize) -> bool {
        let hand = &self.hands[i];
        hand.owner()
            .and_then(|owner| self.players.get(owner))
            .is_some_and(|p| rules::can_match_stake(p.balance(), hand))
    }

    pub fn can_split(&self, i: usize) -> bool {
        let hand = &self.hands[i];
        hand.owner()
            .and_then(|owner| self.players.get(owner))
            .is_some_and(|p| rules::can_split(p.balance(), hand))
    }

    /// Doubles the stake for exactly one more card, then ends the hand's
    /// turn.
    pub fn double(&mut self, id: &str) -> Result<(), GameError> {
        let i = self.turn_of(id)?;
        let stake = self.hands[i].stake();
        self.charge(id, stake, DeltaReason::Double)?;
        self.hands[i].set_stake(stake * 2);
        self.shoe.deal_to(&mut self.hands[i]);

        if self.hands[i].has_bust() {
            self.resolve_bust(i);
        }
        self.advance_hand();
        Ok(())
    }

    /// Splits a pair into two hands of the same stake. The active hand is
    /// dealt its second card at once; the split-off hand gets its second card
    /// when its turn comes.
    pub fn split(&mut self, id: &str) -> Result<(), GameError> {
        let i = self.turn_of(id)?;
        if !self.can_split(i) {
            return Err(GameError::CannotSplit);
        }
        let stake = self.hands[i].stake();
        self.charge(id, stake, DeltaReason::Split)?;

        let split = self.hands[i].split_off();
        self.hands.insert(i + 1, split);
        self.shoe.deal_to(&mut self.hands[i]);
        self.after_action(i);
        Ok(())
    }

    /// The null action fired by the inactivity timer. During play the active
    /// hand stands; during betting every seat that has not bet is released
    /// and the round starts if any bet remains.
    pub fn expire_turn(&mut self) -> Result<(), GameError> {
        match self.status {
            TableStatus::PlayerTurn => {
                self.advance_hand();
                Ok(())
            }
            TableStatus::Betting => {
                if !self.any_bet_placed() {
                    return Err(GameError::BetsIncomplete);
                }
                for seat in 0..self.seats.len() {
                    if self.hands[seat].owner().is_some() && self.hands[seat].stake() == 0 {
                        self.vacate(seat);
                    }
                }
                self.start_player_turn()
            }
            TableStatus::DealerTurn => Err(GameError::WrongPhase(self.status)),
        }
    }

    /// Moves the turn to the next hand that needs a decision, or to the
    /// dealer once none is left.
    ///
    /// Empty and unstaked slots are passed over. A hand that arrives bust or
    /// with blackjack is resolved on the spot, and hands of disconnected
    /// players stand as dealt. Each pass strictly increases the index, so
    /// this always ends.
    pub fn advance_hand(&mut self) {
        loop {
            let mut next = self.active.map_or(0, |i| i + 1);
            while next < self.hands.len()
                && (self.hands[next].owner().is_none() || self.hands[next].stake() == 0)
            {
                next += 1;
            }
            if next >= self.hands.len() {
                self.dealer_turn();
                return;
            }
            self.active = Some(next);

            while self.hands[next].len() < 2 {
                self.shoe.deal_to(&mut self.hands[next]);
            }

            if self.hands[next].has_bust() {
                self.resolve_bust(next);
                continue;
            }
            if self.hands[next].has_blackjack() {
                self.resolve_blackjack(next);
                continue;
            }
            let connected = self.hands[next]
                .owner()
                .and_then(|owner| self.players.get(owner))
                .is_some_and(Player::is_connected);
            if !connected {
                continue;
            }
            return;
        }
    }

    /// Plays the dealer out, settles every hand still staked and starts the
    /// next betting round.
    pub fn dealer_turn(&mut self) {
        self.status = TableStatus::DealerTurn;
        self.active = None;

        while rules::dealer_should_draw(&self.dealer) {
            self.shoe.deal_to(&mut self.dealer);
        }

        let dealer_score = self.dealer.best_score();
        for i in 0..self.hands.len() {
            let stake = self.hands[i].stake();
            if stake == 0 {
                continue;
            }
            let (outcome, payout) = rules::settle(self.hands[i].best_score(), dealer_score, stake);
            let reason = match outcome {
                Outcome::Push => DeltaReason::Push,
                _ => DeltaReason::Win,
            };
            if payout > 0 {
                let owner = self.owner_of(i);
                self.credit(&owner, payout, reason);
            }
            self.record_result(i, outcome, payout);
            self.hands[i].set_stake(0);
        }

        self.settled.push(RoundRecord {
            round_id: self.round,
            dealer: self.dealer.cards().to_vec(),
            dealer_score,
            hands: std::mem::take(&mut self.results),
            ts: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        });
        self.reset_round();
    }

    /// Clears the table for the next round and drops disconnected players.
    fn reset_round(&mut self) {
        let gone: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| !p.is_connected())
            .map(|p| p.id().clone())
            .collect();
        for id in &gone {
            self.players.remove(id);
        }
        for seat in self.seats.iter_mut() {
            if seat.as_ref().is_some_and(|id| gone.contains(id)) {
                *seat = None;
            }
        }

        self.reset_hands();
        self.round += 1;
        self.status = TableStatus::Betting;
    }

    /// One empty hand per seat, owned by whoever sits there.
    pub fn reset_hands(&mut self) {
        self.dealer = Hand::dealer();
        self.hands = self
            .seats
            .iter()
            .enumerate()
            .map(|(seat, owner)| Hand::for_seat(seat, owner.clone()))
            .collect();
        self.active = None;
    }

    fn after_action(&mut self, i: usize) {
        let hand = &self.hands[i];
        if hand.has_bust() {
            self.resolve_bust(i);
            self.advance_hand();
        } else if hand.has_blackjack() {
            self.resolve_blackjack(i);
            self.advance_hand();
        } else if hand.best_score() == BLACKJACK {
            self.advance_hand();
        }
    }

    /// The stake was taken when it was placed; busting just forfeits it.
    fn resolve_bust(&mut self, i: usize) {
        self.record_result(i, Outcome::Bust, 0);
        self.hands[i].set_stake(0);
    }

    fn resolve_blackjack(&mut self, i: usize) {
        let payout = rules::blackjack_payout(self.hands[i].stake());
        let owner = self.owner_of(i);
        self.credit(&owner, payout, DeltaReason::Blackjack);
        self.record_result(i, Outcome::Blackjack, payout);
        self.hands[i].set_stake(0);
    }

    fn record_result(&mut self, i: usize, outcome: Outcome, payout: u64) {
        let hand = &self.hands[i];
        self.results.push(HandResult {
            seat: hand.seat().unwrap_or_default(),
            owner: hand.owner().cloned().unwrap_or_default(),
            cards: hand.cards().to_vec(),
            stake: hand.stake(),
            split: hand.is_split(),
            outcome,
            payout,
        });
    }

    fn turn_of(&self, id: &str) -> Result<usize, GameError> {
        self.require_status(TableStatus::PlayerTurn)?;
        let Some(i) = self.active else {
            unreachable!("player turn without an active hand");
        };
        if !self.hands[i].is_owned_by(id) {
            return Err(GameError::NotPlayersTurn(id.to_string()));
        }
        Ok(i)
    }

    fn owner_of(&self, i: usize) -> PlayerId {
        match self.hands[i].owner() {
            Some(owner) => owner.clone(),
            None => unreachable!("staked hand {i} has no owner"),
        }
    }

    fn charge(&mut self, id: &str, amount: u64, reason: DeltaReason) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        player.debit(amount)?;
        let balance = player.balance();
        self.push_delta(id, -signed(amount), balance, reason);
        Ok(())
    }

    fn credit(&mut self, id: &str, amount: u64, reason: DeltaReason) {
        let Some(player) = self.players.get_mut(id) else {
            unreachable!("payout to unknown player {id}");
        };
        player.credit(amount);
        let balance = player.balance();
        self.push_delta(id, signed(amount), balance, reason);
    }

    fn push_delta(&mut self, id: &str, delta: i64, balance: u64, reason: DeltaReason) {
        self.deltas.push(MoneyDelta {
            seq: self.next_seq,
            player: id.to_string(),
            delta,
            balance,
            reason,
        });
        self.next_seq += 1;
    }

    fn vacate(&mut self, seat: usize) {
        self.seats[seat] = None;
        self.hands[seat].set_owner(None);
    }

    fn start_if_ready(&mut self) {
        if self.status == TableStatus::Betting && self.all_bets_in() {
            // all_bets_in was just checked, so this cannot be refused
            let _ = self.start_player_turn();
        }
    }

    fn require_status(&self, status: TableStatus) -> Result<(), GameError> {
        if self.status != status {
            return Err(GameError::WrongPhase(self.status));
        }
        Ok(())
    }

    fn check_seat(&self, seat: usize) -> Result<(), GameError> {
        if seat >= self.seats.len() {
            return Err(GameError::SeatOutOfRange {
                seat,
                seats: self.seats.len(),
            });
        }
        Ok(())
    }
}

fn seat_of(command: &Command) -> Result<usize, GameError> {
    command.seat.ok_or(GameError::MissingSeat)
}

/// Stakes are capped at [`rules::MAX_STAKE`], so every charge and payout
/// converts.
fn signed(amount: u64) -> i64 {
    match i64::try_from(amount) {
        Ok(amount) => amount,
        Err(_) => unreachable!("money amount {amount} exceeds the stake cap"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(Suit::Heart, rank)
    }

    fn table_with(cards: &[Rank]) -> Table {
        let shoe = Shoe::stacked(1, 9, cards.iter().map(|&r| card(r)).collect());
        Table::with_shoe(TableConfig::default(), shoe).expect("valid config")
    }

    #[test]
    fn config_rejects_bad_seat_counts() {
        let config = TableConfig {
            seats: 1,
            ..TableConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSeats { seats: 1, .. })
        ));
        assert!(TableConfig::default().validate().is_ok());
    }

    #[test]
    fn join_requires_known_player_with_minimum_balance() {
        let mut table = table_with(&[]);
        assert_eq!(
            table.join("ghost", 0),
            Err(GameError::UnknownPlayer("ghost".into()))
        );
        table.connect("poor", 5);
        assert!(matches!(
            table.join("poor", 0),
            Err(GameError::InsufficientBalance { .. })
        ));
        table.connect("rich", 500);
        table.join("rich", 0).expect("join");
        assert_eq!(table.join("rich", 0), Err(GameError::SeatTaken(0)));
        assert!(matches!(
            table.join("rich", 6),
            Err(GameError::SeatOutOfRange { seat: 6, seats: 6 })
        ));
        assert_eq!(table.seats_taken(), 1);
    }

    #[test]
    fn repeated_connect_is_not_a_change() {
        let mut table = table_with(&[]);
        assert!(table.connect("a", 100));
        assert!(!table.connect("a", 500));
        assert_eq!(table.player("a").map(|p| p.balance()), Some(100));
        table.disconnect("a").unwrap();
        assert!(table.connect("a", 500));
    }

    #[test]
    fn seat_commands_need_a_seat() {
        let mut table = table_with(&[]);
        table.connect("a", 100);
        let join = Command {
            seat: None,
            ..Command::join(0)
        };
        assert_eq!(table.apply("a", &join), Err(GameError::MissingSeat));
        assert_eq!(table.seats_taken(), 0);
    }

    #[test]
    fn oversized_bets_are_refused() {
        let mut table = table_with(&[]);
        table.connect("whale", u64::MAX);
        table.join("whale", 0).unwrap();
        assert!(matches!(
            table.enter_bet("whale", u64::MAX, 0),
            Err(GameError::StakeTooLarge { .. })
        ));
        assert!(!table.any_bet_placed());
        assert!(table.take_deltas().is_empty());

        table.enter_bet("whale", rules::MAX_STAKE, 0).unwrap();
        let deltas = table.take_deltas();
        assert_eq!(deltas[0].delta, -(rules::MAX_STAKE as i64));
    }

    #[test]
    fn leave_only_frees_own_unstaked_seat() {
        let mut table = table_with(&[]);
        table.connect("a", 100);
        table.connect("b", 100);
        table.join("a", 0).unwrap();
        table.join("b", 1).unwrap();
        assert_eq!(table.leave("b", 0), Err(GameError::NotSeatOwner(0)));
        table.enter_bet("a", 10, 0).unwrap();
        assert_eq!(table.leave("a", 0), Err(GameError::StakePlaced(0)));
        table.leave("b", 1).expect("leave");
        assert_eq!(table.seats()[1], None);
    }

    #[test]
    fn bet_debits_balance_and_emits_delta() {
        let mut table = table_with(&[]);
        table.connect("a", 100);
        table.connect("b", 100);
        table.join("a", 0).unwrap();
        table.join("b", 1).unwrap();
        table.enter_bet("a", 30, 0).expect("bet");

        assert_eq!(table.player("a").unwrap().balance(), 70);
        assert_eq!(table.hands()[0].stake(), 30);
        assert!(!table.all_bets_in());
        let deltas = table.take_deltas();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].delta, -30);
        assert_eq!(deltas[0].balance, 70);
        assert_eq!(deltas[0].reason, DeltaReason::Bet);

        assert_eq!(table.enter_bet("a", 10, 0), Err(GameError::StakePlaced(0)));
        assert_eq!(table.enter_bet("a", 10, 1), Err(GameError::NotSeatOwner(1)));
        assert!(matches!(
            table.enter_bet("b", 5, 1),
            Err(GameError::BetBelowMinimum { .. })
        ));
        assert!(matches!(
            table.enter_bet("b", 101, 1),
            Err(GameError::InsufficientBalance { .. })
        ));
        assert!(table.take_deltas().is_empty());
    }

    #[test]
    fn player_commands_are_rejected_while_betting() {
        let mut table = table_with(&[]);
        table.connect("a", 100);
        assert_eq!(
            table.apply("a", &Command::new(Action::Hit)),
            Err(GameError::WrongPhase(TableStatus::Betting))
        );
    }

    #[test]
    fn acting_out_of_turn_is_rejected() {
        use Rank::*;
        // a: 10 7, b: 9 8, dealer: 6 10
        let mut table = table_with(&[Ten, Nine, Six, Seven, Eight, Ten]);
        table.connect("a", 100);
        table.connect("b", 100);
        table.join("a", 0).unwrap();
        table.join("b", 1).unwrap();
        table.apply("a", &Command::bet(0, 10)).unwrap();
        table.apply("b", &Command::bet(1, 10)).unwrap();
        assert_eq!(table.status(), TableStatus::PlayerTurn);
        assert_eq!(table.active_hand(), Some(0));
        assert_eq!(
            table.apply("b", &Command::new(Action::Hit)),
            Err(GameError::NotPlayersTurn("b".into()))
        );
    }

    #[test]
    fn double_without_funds_leaves_hand_untouched() {
        use Rank::*;
        let mut table = table_with(&[Five, Six, Six, Ten]);
        table.connect("a", 10);
        table.connect("b", 100);
        table.join("a", 0).unwrap();
        table.apply("a", &Command::bet(0, 10)).unwrap();
        assert_eq!(table.status(), TableStatus::PlayerTurn);
        assert!(!table.can_double(0));
        assert!(matches!(
            table.double("a"),
            Err(GameError::InsufficientBalance { .. })
        ));
        assert_eq!(table.hands()[0].len(), 2);
        assert_eq!(table.hands()[0].stake(), 10);
    }
}
