use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::player::PlayerId;
use crate::rules::Outcome;

/// How one staked hand ended, captured at the moment it was resolved.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub seat: usize,
    pub owner: PlayerId,
    pub cards: Vec<Card>,
    /// Stake riding on the hand when it was resolved, including doubles.
    pub stake: u64,
    pub split: bool,
    pub outcome: Outcome,
    /// Amount credited back to the owner; 0 for a loss.
    pub payout: u64,
}

/// Audit record of one settled round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Rounds are numbered per table starting at 1.
    pub round_id: u64,
    pub dealer: Vec<Card>,
    /// Dealer's best total; 0 when the dealer bust.
    pub dealer_score: u32,
    /// Results in the order hands were resolved.
    pub hands: Vec<HandResult>,
    /// RFC3339 settlement time.
    #[serde(default)]
    pub ts: Option<String>,
}

impl RoundRecord {
    pub fn total_payout(&self) -> u64 {
        self.hands.iter().map(|h| h.payout).sum()
    }

    pub fn total_staked(&self) -> u64 {
        self.hands.iter().map(|h| h.stake).sum()
    }
}

/// Appends settled rounds to a JSONL file, one record per line.
pub struct RoundLogger {
    writer: Option<BufWriter<std::fs::File>>,
}

impl RoundLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
        })
    }

    /// A logger that accepts records and writes nothing.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn write(&mut self, record: &RoundRecord) -> std::io::Result<()> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RoundLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundLogger")
            .field("enabled", &self.writer.is_some())
            .finish()
    }
}
