use blackjack_engine::cards::{Card, Rank, Suit};
use blackjack_engine::command::{Action, Command};
use blackjack_engine::errors::GameError;
use blackjack_engine::rules::Outcome;
use blackjack_engine::shoe::Shoe;
use blackjack_engine::table::{DeltaReason, Table, TableConfig, TableStatus};

use Rank::*;

/// A table whose shoe deals `ranks` in order. Opening deal order is one card
/// per staked seat, then the dealer, twice over.
fn table_with(ranks: &[Rank]) -> Table {
    let cards = ranks.iter().map(|&r| Card::new(Suit::Diamond, r)).collect();
    Table::with_shoe(TableConfig::default(), Shoe::stacked(1, 21, cards)).expect("table")
}

fn seat(table: &mut Table, player: &str, seat: usize) {
    table.connect(player, 100);
    table.apply(player, &Command::join(seat)).expect("join");
}

fn act(table: &mut Table, player: &str, action: Action) {
    table
        .apply(player, &Command::new(action))
        .unwrap_or_else(|e| panic!("{player} {action:?} rejected: {e}"));
}

#[test]
fn natural_and_bust_round_resets_to_betting() {
    let mut table = table_with(&[Ace, Ten, Ten, King, Six, Five, Nine, Three]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);

    table.apply("a", &Command::bet(0, 10)).unwrap();
    assert_eq!(table.status(), TableStatus::Betting);
    table.apply("b", &Command::bet(1, 20)).unwrap();

    // a's natural was paid on the deal and skipped; b is up
    assert_eq!(table.status(), TableStatus::PlayerTurn);
    assert_eq!(table.active_hand(), Some(1));
    assert_eq!(table.hands()[0].stake(), 0);
    assert_eq!(table.player("a").unwrap().balance(), 115);

    act(&mut table, "b", Action::Hit);

    assert_eq!(table.status(), TableStatus::Betting);
    assert_eq!(table.active_hand(), None);
    assert!(table.hands().iter().all(|h| h.stake() == 0 && h.is_empty()));
    assert!(table.dealer().is_empty());
    assert_eq!(table.player("b").unwrap().balance(), 80);

    let deltas = table.take_deltas();
    let summary: Vec<(&str, i64, DeltaReason)> = deltas
        .iter()
        .map(|d| (d.player.as_str(), d.delta, d.reason))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a", -10, DeltaReason::Bet),
            ("b", -20, DeltaReason::Bet),
            ("a", 25, DeltaReason::Blackjack),
        ]
    );
    assert!(deltas.windows(2).all(|w| w[0].seq < w[1].seq));

    let rounds = table.take_settled_rounds();
    assert_eq!(rounds.len(), 1);
    let round = &rounds[0];
    assert_eq!(round.round_id, 1);
    assert_eq!(round.dealer_score, 18);
    assert_eq!(round.dealer.len(), 3);
    assert_eq!(round.hands.len(), 2);
    assert_eq!(round.hands[0].outcome, Outcome::Blackjack);
    assert_eq!(round.hands[0].payout, 25);
    assert_eq!(round.hands[1].outcome, Outcome::Bust);
    assert_eq!(round.hands[1].stake, 20);
    assert_eq!(table.round(), 2);
}

#[test]
fn settlement_against_dealer_twenty() {
    let mut table = table_with(&[
        Ten, Ten, Ten, Ace, Ten, // first pass: a b c d dealer
        Eight, Queen, Six, Jack, Queen, // second pass
        King, // c's hit
    ]);
    for (i, p) in ["a", "b", "c", "d"].into_iter().enumerate() {
        seat(&mut table, p, i);
    }
    for (i, p) in ["a", "b", "c", "d"].into_iter().enumerate() {
        table.apply(p, &Command::bet(i, 10)).unwrap();
    }

    assert_eq!(table.active_hand(), Some(0));
    act(&mut table, "a", Action::Stand);
    act(&mut table, "b", Action::End);
    act(&mut table, "c", Action::Hit);

    assert_eq!(table.status(), TableStatus::Betting);
    assert_eq!(table.player("a").unwrap().balance(), 90);
    assert_eq!(table.player("b").unwrap().balance(), 100);
    assert_eq!(table.player("c").unwrap().balance(), 90);
    assert_eq!(table.player("d").unwrap().balance(), 115);

    let round = table.take_settled_rounds().remove(0);
    assert_eq!(round.dealer_score, 20);
    let outcomes: Vec<(usize, Outcome, u64)> = round
        .hands
        .iter()
        .map(|h| (h.seat, h.outcome, h.payout))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (2, Outcome::Bust, 0),
            (3, Outcome::Blackjack, 25),
            (0, Outcome::Lose, 0),
            (1, Outcome::Push, 10),
        ]
    );
}

#[test]
fn dealer_plays_at_once_when_every_hand_is_a_natural() {
    let mut table = table_with(&[Ace, Ace, Five, King, Queen, Six, Ten]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 3);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    table.apply("b", &Command::bet(3, 20)).unwrap();

    assert_eq!(table.status(), TableStatus::Betting);
    let round = table.take_settled_rounds().remove(0);
    assert_eq!(round.dealer_score, 21);
    assert_eq!(round.dealer.len(), 3);
    assert!(round.hands.iter().all(|h| h.outcome == Outcome::Blackjack));
    assert_eq!(table.player("a").unwrap().balance(), 115);
    assert_eq!(table.player("b").unwrap().balance(), 130);
}

#[test]
fn dealer_natural_skips_player_decisions() {
    let mut table = table_with(&[Ten, Ace, Ace, Nine, Queen, King]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    table.apply("b", &Command::bet(1, 10)).unwrap();

    assert_eq!(table.status(), TableStatus::Betting);
    let round = table.take_settled_rounds().remove(0);
    assert_eq!(round.dealer.len(), 2);
    assert_eq!(round.hands[0].outcome, Outcome::Lose);
    assert_eq!(round.hands[1].outcome, Outcome::Push);
    assert_eq!(table.player("a").unwrap().balance(), 90);
    assert_eq!(table.player("b").unwrap().balance(), 100);
}

#[test]
fn split_inserts_a_hand_after_its_parent() {
    let mut table = table_with(&[Eight, Ten, Eight, Seven, Three, Ten, Nine]);
    seat(&mut table, "a", 0);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    assert_eq!(table.active_hand(), Some(0));
    assert!(table.can_split(0));

    act(&mut table, "a", Action::Split);
    assert_eq!(table.hands().len(), 7);
    assert_eq!(table.hands()[0].len(), 2);
    assert!(!table.hands()[0].is_split());
    assert_eq!(table.hands()[1].len(), 1);
    assert!(table.hands()[1].is_split());
    assert_eq!(table.hands()[1].stake(), 10);
    assert_eq!(table.player("a").unwrap().balance(), 80);
    assert_eq!(table.active_hand(), Some(0));

    // 8 3 10 is 21: the turn passes to the split hand, which is filled up
    act(&mut table, "a", Action::Hit);
    assert_eq!(table.active_hand(), Some(1));
    assert_eq!(table.hands()[1].best_score(), 17);

    act(&mut table, "a", Action::Stand);
    assert_eq!(table.status(), TableStatus::Betting);
    assert_eq!(table.hands().len(), 6);
    // win 20 on the 21, push 10 on the 17 against the dealer's 17
    assert_eq!(table.player("a").unwrap().balance(), 110);

    let reasons: Vec<DeltaReason> = table.take_deltas().iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![
            DeltaReason::Bet,
            DeltaReason::Split,
            DeltaReason::Win,
            DeltaReason::Push
        ]
    );
}

#[test]
fn split_of_unequal_values_is_refused() {
    let mut table = table_with(&[King, Ten, Nine, Seven]);
    seat(&mut table, "a", 0);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    assert_eq!(
        table.apply("a", &Command::new(Action::Split)),
        Err(GameError::CannotSplit)
    );
    assert_eq!(table.hands().len(), 6);
    assert_eq!(table.player("a").unwrap().balance(), 90);
}

#[test]
fn double_takes_one_card_and_ends_the_hand() {
    let mut table = table_with(&[Five, Ten, Six, Seven, Ten]);
    seat(&mut table, "a", 0);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    assert!(table.can_double(0));

    act(&mut table, "a", Action::Double);
    assert_eq!(table.status(), TableStatus::Betting);
    // doubled stake of 20 wins 40
    assert_eq!(table.player("a").unwrap().balance(), 120);
    let round = table.take_settled_rounds().remove(0);
    assert_eq!(round.hands[0].stake, 20);
    assert_eq!(round.hands[0].cards.len(), 3);
    assert_eq!(round.hands[0].outcome, Outcome::Win);
}

#[test]
fn disconnected_player_is_skipped_and_removed_at_reset() {
    let mut table = table_with(&[Ten, Ten, Ten, Seven, Eight, Nine]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    table.apply("b", &Command::bet(1, 10)).unwrap();
    assert_eq!(table.active_hand(), Some(0));

    table.disconnect("a").expect("known player");
    assert_eq!(table.active_hand(), Some(1));
    assert_eq!(
        table.apply("a", &Command::new(Action::Hit)),
        Err(GameError::NotPlayersTurn("a".into()))
    );

    act(&mut table, "b", Action::Stand);
    assert_eq!(table.status(), TableStatus::Betting);
    assert!(table.player("a").is_none());
    assert_eq!(table.seats()[0], None);
    assert_eq!(table.seats()[1].as_deref(), Some("b"));
    assert_eq!(table.hands()[1].owner().map(String::as_str), Some("b"));
}

#[test]
fn disconnect_while_betting_frees_seat_and_may_start_round() {
    let mut table = table_with(&[Ten, Nine, Seven, Eight]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    assert_eq!(table.status(), TableStatus::Betting);

    table.disconnect("b").unwrap();
    assert!(table.player("b").is_none());
    assert_eq!(table.seats()[1], None);
    assert_eq!(table.status(), TableStatus::PlayerTurn);
    assert_eq!(table.active_hand(), Some(0));
}

#[test]
fn reconnect_keeps_cached_balance() {
    let mut table = table_with(&[]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    table.apply("a", &Command::bet(0, 40)).unwrap();
    table.disconnect("a").unwrap();
    assert!(!table.player("a").unwrap().is_connected());

    table.connect("a", 1_000);
    let a = table.player("a").unwrap();
    assert!(a.is_connected());
    assert_eq!(a.balance(), 60);
}

#[test]
fn betting_timeout_releases_idle_seats_and_deals() {
    let mut table = table_with(&[Ten, Nine, Seven, Eight]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    assert_eq!(table.expire_turn(), Err(GameError::BetsIncomplete));

    table.apply("a", &Command::bet(0, 10)).unwrap();
    table.expire_turn().expect("a bet is in");
    assert_eq!(table.seats()[1], None);
    assert!(table.player("b").is_some());
    assert_eq!(table.status(), TableStatus::PlayerTurn);
    assert_eq!(table.active_hand(), Some(0));
}

#[test]
fn player_turn_timeout_stands_the_active_hand() {
    let mut table = table_with(&[Ten, Ten, Ten, Seven, Eight, Nine]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    table.apply("b", &Command::bet(1, 10)).unwrap();

    table.expire_turn().unwrap();
    assert_eq!(table.active_hand(), Some(1));
    assert_eq!(table.hands()[0].len(), 2);
    table.expire_turn().unwrap();
    assert_eq!(table.status(), TableStatus::Betting);
}

#[test]
fn leaving_an_unbet_seat_can_complete_the_bets() {
    let mut table = table_with(&[Ten, Nine, Seven, Eight]);
    seat(&mut table, "a", 0);
    seat(&mut table, "b", 1);
    table.apply("a", &Command::bet(0, 10)).unwrap();
    table.apply("b", &Command::leave(1)).unwrap();
    assert_eq!(table.status(), TableStatus::PlayerTurn);
}

#[test]
fn shoe_carries_over_between_rounds() {
    let mut table = Table::new(TableConfig {
        seed: Some(3),
        decks: 2,
        ..TableConfig::default()
    })
    .unwrap();
    seat(&mut table, "a", 0);
    let before = table.shoe().remaining();
    table.apply("a", &Command::bet(0, 10)).unwrap();
    while table.status() == TableStatus::PlayerTurn {
        act(&mut table, "a", Action::Stand);
    }
    assert_eq!(table.status(), TableStatus::Betting);
    assert!(table.shoe().remaining() < before);
    assert_eq!(table.shoe().len(), 104);
}
