//! Review-queue selection
//!
//! A session is filled in three phases, stopping as soon as it is full:
//!
//! 1. overdue words (`0 < next_review_date <= now`), most overdue first
//! 2. fresh words (never scheduled), by id
//! 3. upcoming words (`next_review_date > now`), soonest first
//!
//! Mastered words (progress 100%) never enter a session.

use std::ops::Bound;

use deutschmemo_algo::{WordRecord, UNSCHEDULED};
use futures_util::TryStreamExt;

use crate::store::{ScanDirection, StoreResult, WordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Overdue,
    Fresh,
    Upcoming,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Overdue, Phase::Fresh, Phase::Upcoming];

    /// Next-review-date range this phase scans at `now`.
    pub fn bounds(self, now: i64) -> (Bound<i64>, Bound<i64>) {
        match self {
            Phase::Overdue => (Bound::Excluded(UNSCHEDULED), Bound::Included(now)),
            Phase::Fresh => (Bound::Included(UNSCHEDULED), Bound::Included(UNSCHEDULED)),
            Phase::Upcoming => (
                Bound::Excluded(now.max(UNSCHEDULED)),
                Bound::Unbounded,
            ),
        }
    }
}

/// Builds a session of at most `limit` words using the current time.
pub async fn select_session(store: &WordStore, limit: usize) -> StoreResult<Vec<WordRecord>> {
    select_session_at(store, limit, chrono::Utc::now().timestamp_millis()).await
}

/// Builds a session of at most `limit` words as of `now` (epoch ms).
///
/// A store error in any phase aborts the whole selection.
pub async fn select_session_at(
    store: &WordStore,
    limit: usize,
    now: i64,
) -> StoreResult<Vec<WordRecord>> {
    let mut session = Vec::new();
    if limit == 0 {
        return Ok(session);
    }

    for phase in Phase::ALL {
        if session.len() >= limit {
            break;
        }

        let before = session.len();
        let mut words = store
            .scan_by_next_review_date(phase.bounds(now), ScanDirection::Ascending)
            .await?;

        while session.len() < limit {
            match words.try_next().await? {
                Some(word) if word.is_mastered() => continue,
                Some(word) => session.push(word),
                None => break,
            }
        }

        tracing::debug!(
            phase = ?phase,
            added = session.len() - before,
            total = session.len(),
            limit,
            "session phase done"
        );
    }

    Ok(session)
}
