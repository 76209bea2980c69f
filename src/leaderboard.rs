//! Global high score leaderboard
//!
//! The store itself lives behind [`LeaderboardGateway`]. The game keeps a
//! local [`Standings`] snapshot (top 10) refreshed from the gateway at
//! startup and after every successful submission.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::LEADERBOARD_SIZE;
use crate::tasks::LocalBoxFuture;

/// Shown instead of identifiers that are not email-like
pub const ANONYMOUS: &str = "Anonymous";

/// Replaces the hidden middle of an identifier's local part
pub const MASK_CHAR: char = '*';

/// Leaderboard failures. None of these ever reach the simulation.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard service unavailable")]
    Unavailable,

    #[error("leaderboard storage error: {0}")]
    Storage(String),

    #[error("leaderboard data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Masked identifier (see [`mask_identifier`])
    #[serde(alias = "email")]
    pub identifier: String,
    pub score: u64,
}

impl LeaderboardEntry {
    pub fn new(identifier: impl Into<String>, score: u64) -> Self {
        Self {
            identifier: identifier.into(),
            score,
        }
    }
}

/// Mask an email-like identifier before it is published.
///
/// - no `@`: [`ANONYMOUS`]
/// - local part of 2 characters or fewer: unchanged
/// - otherwise: first and last character of the local part kept, the rest
///   replaced by [`MASK_CHAR`]; the domain is kept verbatim
///
/// The split happens at the first `@`.
pub fn mask_identifier(raw: &str) -> String {
    let Some((local, domain)) = raw.split_once('@') else {
        return ANONYMOUS.to_string();
    };

    let len = local.chars().count();
    let mut chars = local.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if len > 2 => {
            let hidden: String = std::iter::repeat_n(MASK_CHAR, len - 2).collect();
            format!("{first}{hidden}{last}@{domain}")
        }
        _ => format!("{local}@{domain}"),
    }
}

/// Local leaderboard snapshot, sorted descending by score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub entries: Vec<LeaderboardEntry>,
    #[serde(skip, default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    LEADERBOARD_SIZE
}

impl Default for Standings {
    fn default() -> Self {
        Self::new()
    }
}

impl Standings {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::with_limit(LEADERBOARD_SIZE)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Add an entry in score order, keeping at most `limit` entries.
    /// Every score is accepted; ties go after existing entries.
    pub fn record(&mut self, entry: LeaderboardEntry) {
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(self.limit);
    }

    /// Replace the snapshot with freshly fetched entries
    pub fn replace(&mut self, mut entries: Vec<LeaderboardEntry>) {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(self.limit);
        self.entries = entries;
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// The persistence service behind the leaderboard.
///
/// Both calls are asynchronous and independent of the tick loop; callers
/// spawn them and never block on the result.
pub trait LeaderboardGateway {
    /// Append a (masked) entry
    fn submit(&self, entry: LeaderboardEntry)
    -> LocalBoxFuture<'static, Result<(), LeaderboardError>>;

    /// Top `n` entries, descending by score
    fn fetch_top(
        &self,
        n: usize,
    ) -> LocalBoxFuture<'static, Result<Vec<LeaderboardEntry>, LeaderboardError>>;
}

/// In-process leaderboard store
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderboard {
    entries: Rc<RefCell<Vec<LeaderboardEntry>>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(entries)),
        }
    }

    /// Every stored entry in submission order
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.entries.borrow().clone()
    }
}

impl LeaderboardGateway for MemoryLeaderboard {
    fn submit(
        &self,
        entry: LeaderboardEntry,
    ) -> LocalBoxFuture<'static, Result<(), LeaderboardError>> {
        let entries = Rc::clone(&self.entries);
        Box::pin(async move {
            entries.borrow_mut().push(entry);
            Ok(())
        })
    }

    fn fetch_top(
        &self,
        n: usize,
    ) -> LocalBoxFuture<'static, Result<Vec<LeaderboardEntry>, LeaderboardError>> {
        let entries = Rc::clone(&self.entries);
        Box::pin(async move {
            let mut top = entries.borrow().clone();
            top.sort_by(|a, b| b.score.cmp(&a.score));
            top.truncate(n);
            Ok(top)
        })
    }
}

/// Browser-local leaderboard persisted to LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageLeaderboard;

#[cfg(target_arch = "wasm32")]
impl LocalStorageLeaderboard {
    const STORAGE_KEY: &'static str = "monkey_bed_scores";
    /// Stored history is capped; only the top of it is ever shown
    const MAX_STORED: usize = 100;

    fn storage() -> Result<web_sys::Storage, LeaderboardError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| LeaderboardError::Storage("LocalStorage unavailable".into()))
    }

    fn load() -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let storage = Self::storage()?;
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => Ok(serde_json::from_str(&json)?),
            Ok(None) => Ok(Vec::new()),
            Err(_) => Err(LeaderboardError::Storage("read failed".into())),
        }
    }

    fn store(entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        let json = serde_json::to_string(entries)?;
        Self::storage()?
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| LeaderboardError::Storage("write failed".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl LeaderboardGateway for LocalStorageLeaderboard {
    fn submit(
        &self,
        entry: LeaderboardEntry,
    ) -> LocalBoxFuture<'static, Result<(), LeaderboardError>> {
        Box::pin(async move {
            let mut standings = Standings::with_limit(Self::MAX_STORED);
            standings.replace(Self::load()?);
            standings.record(entry);
            Self::store(&standings.entries)?;
            log::info!("High scores saved ({} entries)", standings.entries.len());
            Ok(())
        })
    }

    fn fetch_top(
        &self,
        n: usize,
    ) -> LocalBoxFuture<'static, Result<Vec<LeaderboardEntry>, LeaderboardError>> {
        Box::pin(async move {
            let mut standings = Standings::with_limit(n);
            standings.replace(Self::load()?);
            Ok(standings.entries)
        })
    }
}
