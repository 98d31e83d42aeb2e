use blackjack_engine::cards::{all_ranks, Card, Rank, Suit};
use blackjack_engine::hand::Hand;
use blackjack_engine::rules::can_split;

fn hand(ranks: &[Rank]) -> Hand {
    let mut h = Hand::for_seat(0, Some("p".into()));
    for (i, &r) in ranks.iter().enumerate() {
        let suit = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club][i % 4];
        h.push(Card::new(suit, r));
    }
    h
}

#[test]
fn ace_with_small_total_offers_the_soft_alternative() {
    for rank in all_ranks() {
        if rank == Rank::Ace {
            continue;
        }
        let h = hand(&[Rank::Ace, rank]);
        let hard = 1 + rank.value();
        assert!(hard <= 11);
        assert_eq!(h.scores(), vec![hard, hard + 10], "A + {rank:?}");
        assert_eq!(h.best_score(), hard + 10);
    }
}

#[test]
fn two_aces_never_get_two_bonuses() {
    let h = hand(&[Rank::Ace, Rank::Ace, Rank::Nine]);
    assert_eq!(h.best_score(), 21);
    assert_eq!(h.scores(), vec![11, 21]);

    let aa = hand(&[Rank::Ace, Rank::Ace]);
    assert_eq!(aa.best_score(), 12);
}

#[test]
fn blackjack_needs_exactly_two_cards() {
    assert!(hand(&[Rank::Ace, Rank::King]).has_blackjack());
    assert!(hand(&[Rank::Ten, Rank::Ace]).has_blackjack());

    let three = hand(&[Rank::Seven, Rank::Seven, Rank::Seven]);
    assert_eq!(three.best_score(), 21);
    assert!(!three.has_blackjack());

    let soft_three = hand(&[Rank::Ace, Rank::Five, Rank::Five]);
    assert_eq!(soft_three.best_score(), 21);
    assert!(!soft_three.has_blackjack());
}

#[test]
fn bust_when_every_total_exceeds_21() {
    let h = hand(&[Rank::King, Rank::Six, Rank::Ace, Rank::Five]);
    assert!(h.has_bust());
    assert_eq!(h.best_score(), 0);
    assert!(!hand(&[Rank::King, Rank::Ace, Rank::Queen]).has_bust());
}

#[test]
fn split_compares_value_not_rank() {
    let mut kq = hand(&[Rank::King, Rank::Queen]);
    kq.set_stake(10);
    assert!(can_split(10, &kq));

    let mut k9 = hand(&[Rank::King, Rank::Nine]);
    k9.set_stake(10);
    assert!(!can_split(10, &k9));

    let mut three = hand(&[Rank::Five, Rank::Five, Rank::Five]);
    three.set_stake(10);
    assert!(!can_split(10, &three));
}
