//! # blackjack-engine: Multi-seat Blackjack Table Core
//!
//! A synchronous blackjack table state machine. One [`table::Table`] owns a
//! shoe, the dealer's hand and a fixed row of seats, and walks the cycle
//! betting → player turns → dealer turn → settlement → betting. Everything
//! that leaves the table (balance changes, settled rounds, the public view)
//! is produced as plain data for the caller to forward.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and blackjack values
//! - [`shoe`] - Multi-deck shoe with seeded ChaCha20 shuffles and reshuffle on exhaustion
//! - [`hand`] - Hands, soft/hard scoring, blackjack and split detection
//! - [`player`] - Player records with cached balances
//! - [`rules`] - Bet validation, payouts and dealer drawing rule
//! - [`command`] - Inbound command wire format
//! - [`table`] - The table state machine and money deltas
//! - [`view`] - Public projection of a table (dealer hole card hidden)
//! - [`record`] - Settled round records and JSONL round logging
//! - [`errors`] - Error types for rejected actions and configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use blackjack_engine::command::{Action, Command};
//! use blackjack_engine::table::{Table, TableConfig, TableStatus};
//!
//! let mut table = Table::new(TableConfig {
//!     seed: Some(42),
//!     ..TableConfig::default()
//! })
//! .expect("valid config");
//!
//! table.connect("alice", 500);
//! table.apply("alice", &Command::join(0)).expect("seat is free");
//! table.apply("alice", &Command::bet(0, 25)).expect("bet accepted");
//!
//! // The only seated player has bet, so cards are already out.
//! assert_ne!(table.status(), TableStatus::DealerTurn);
//! if table.status() == TableStatus::PlayerTurn {
//!     table.apply("alice", &Command::new(Action::Stand)).expect("her turn");
//! }
//! assert_eq!(table.status(), TableStatus::Betting);
//! ```
//!
//! ## Deterministic Play
//!
//! ```rust
//! use blackjack_engine::shoe::Shoe;
//!
//! let mut a = Shoe::new_with_seed(2, 7);
//! let mut b = Shoe::new_with_seed(2, 7);
//! assert_eq!(a.deal(), b.deal());
//! ```

pub mod cards;
pub mod command;
pub mod errors;
pub mod hand;
pub mod player;
pub mod record;
pub mod rules;
pub mod shoe;
pub mod table;
pub mod view;
