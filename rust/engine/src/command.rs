use serde::{Deserialize, Serialize};

/// What a player asked for. Which actions mean anything depends on the
/// table status; see [`crate::table::Table::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Join,
    Leave,
    Bet,
    Hit,
    Stand,
    Double,
    Split,
    End,
}

impl Action {
    /// Join, leave and bet name the seat they act on.
    pub fn needs_seat(self) -> bool {
        matches!(self, Action::Join | Action::Leave | Action::Bet)
    }
}

/// One inbound player command, e.g. `{"action":"bet","bet":25,"seat":2}`.
///
/// `bet` is read only by [`Action::Bet`]. `seat` is required by join, leave
/// and bet and ignored otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub action: Action,
    #[serde(default)]
    pub bet: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<usize>,
}

impl Command {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            bet: 0,
            seat: None,
        }
    }

    pub fn join(seat: usize) -> Self {
        Self {
            seat: Some(seat),
            ..Self::new(Action::Join)
        }
    }

    pub fn leave(seat: usize) -> Self {
        Self {
            seat: Some(seat),
            ..Self::new(Action::Leave)
        }
    }

    pub fn bet(seat: usize, amount: u64) -> Self {
        Self {
            action: Action::Bet,
            bet: amount,
            seat: Some(seat),
        }
    }

    /// Parses a wire payload. Anything that is not a well-formed command
    /// yields `None`; callers drop it without a reply.
    pub fn parse(payload: &str) -> Option<Self> {
        let command: Self = serde_json::from_str(payload).ok()?;
        if command.action.needs_seat() && command.seat.is_none() {
            return None;
        }
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bet_with_seat() {
        let cmd = Command::parse(r#"{"action":"bet","bet":25,"seat":2}"#).expect("valid");
        assert_eq!(cmd, Command::bet(2, 25));
    }

    #[test]
    fn optional_fields_default_to_zero() {
        let cmd = Command::parse(r#"{"action":"hit"}"#).expect("valid");
        assert_eq!(cmd, Command::new(Action::Hit));
    }

    #[test]
    fn unknown_action_and_garbage_are_rejected() {
        assert!(Command::parse(r#"{"action":"surrender"}"#).is_none());
        assert!(Command::parse("h").is_none());
        assert!(Command::parse(r#"{"action":"bet","bet":-5}"#).is_none());
    }

    #[test]
    fn seat_actions_without_a_seat_are_rejected() {
        assert!(Command::parse(r#"{"action":"join"}"#).is_none());
        assert!(Command::parse(r#"{"action":"leave"}"#).is_none());
        assert!(Command::parse(r#"{"action":"bet","bet":20}"#).is_none());
        assert_eq!(
            Command::parse(r#"{"action":"join","seat":0}"#),
            Some(Command::join(0))
        );
    }
}
