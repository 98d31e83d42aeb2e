use serde::{Deserialize, Serialize};

use crate::errors::GameError;
use crate::hand::Hand;

/// The dealer stops drawing at this total, soft or hard.
pub const DEALER_STANDS_ON: u32 = 17;

/// Largest single stake a table accepts. Payouts on capped stakes always
/// fit a signed 64-bit delta.
pub const MAX_STAKE: u64 = 1 << 53;

/// How a staked hand finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Blackjack,
    Win,
    Push,
    Lose,
    Bust,
}

/// Validates an opening bet against the table minimum and the player's
/// cached balance.
///
/// # Errors
///
/// - [`GameError::BetBelowMinimum`] when `amount < minimum`
/// - [`GameError::StakeTooLarge`] when `amount > MAX_STAKE`
/// - [`GameError::InsufficientBalance`] when `amount > balance`
///
/// # Examples
///
/// ```
/// use blackjack_engine::rules::validate_bet;
/// use blackjack_engine::errors::GameError;
///
/// assert_eq!(validate_bet(25, 10, 100), Ok(25));
/// assert!(matches!(
///     validate_bet(5, 10, 100),
///     Err(GameError::BetBelowMinimum { .. })
/// ));
/// assert!(matches!(
///     validate_bet(150, 10, 100),
///     Err(GameError::InsufficientBalance { .. })
/// ));
/// ```
pub fn validate_bet(amount: u64, minimum: u64, balance: u64) -> Result<u64, GameError> {
    if amount < minimum {
        return Err(GameError::BetBelowMinimum { amount, minimum });
    }
    if amount > MAX_STAKE {
        return Err(GameError::StakeTooLarge {
            amount,
            max: MAX_STAKE,
        });
    }
    if amount > balance {
        return Err(GameError::InsufficientBalance {
            needed: amount,
            available: balance,
        });
    }
    Ok(amount)
}

/// Doubling and splitting both put the original stake up a second time.
pub fn can_match_stake(balance: u64, hand: &Hand) -> bool {
    balance >= hand.stake()
}

pub fn can_split(balance: u64, hand: &Hand) -> bool {
    can_match_stake(balance, hand) && hand.has_splittable_pair()
}

/// Total returned for a natural: the stake plus 3:2, rounded down.
///
/// ```
/// use blackjack_engine::rules::blackjack_payout;
///
/// assert_eq!(blackjack_payout(10), 25);
/// assert_eq!(blackjack_payout(15), 37);
/// ```
pub fn blackjack_payout(stake: u64) -> u64 {
    stake * 5 / 2
}

pub fn dealer_should_draw(dealer: &Hand) -> bool {
    !dealer.has_bust() && dealer.best_score() < DEALER_STANDS_ON
}

/// Compares a still-staked hand with the dealer. A bust dealer scores 0, so
/// any live hand beats it. Returns the outcome and the amount paid back.
pub fn settle(hand_score: u32, dealer_score: u32, stake: u64) -> (Outcome, u64) {
    use std::cmp::Ordering;

    match hand_score.cmp(&dealer_score) {
        Ordering::Greater => (Outcome::Win, stake * 2),
        Ordering::Equal => (Outcome::Push, stake),
        Ordering::Less => (Outcome::Lose, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Rank, Suit};

    fn hand(ranks: &[Rank], stake: u64) -> Hand {
        let mut h = Hand::for_seat(0, Some("p".into()));
        for &r in ranks {
            h.push(Card::new(Suit::Club, r));
        }
        h.set_stake(stake);
        h
    }

    #[test]
    fn split_needs_equal_value_and_funds() {
        let kq = hand(&[Rank::King, Rank::Queen], 10);
        assert!(can_split(10, &kq));
        assert!(!can_split(9, &kq));
        let k9 = hand(&[Rank::King, Rank::Nine], 10);
        assert!(!can_split(100, &k9));
    }

    #[test]
    fn dealer_stands_on_soft_seventeen() {
        assert!(!dealer_should_draw(&hand(&[Rank::Ace, Rank::Six], 0)));
        assert!(dealer_should_draw(&hand(&[Rank::Ten, Rank::Six], 0)));
        assert!(!dealer_should_draw(&hand(&[Rank::Ten, Rank::Six, Rank::King], 0)));
    }

    #[test]
    fn settle_pays_double_on_win_and_stake_on_push() {
        assert_eq!(settle(20, 18, 10), (Outcome::Win, 20));
        assert_eq!(settle(20, 20, 10), (Outcome::Push, 10));
        assert_eq!(settle(18, 20, 10), (Outcome::Lose, 0));
        assert_eq!(settle(12, 0, 10), (Outcome::Win, 20));
    }
}
