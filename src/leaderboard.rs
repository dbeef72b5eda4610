//! Leaderboard ranking engine.
//!
//! Rankings are recomputed from the progress table on every call; there is
//! no caching. Ties on the period metric are broken by user id ascending
//! so ranks stay deterministic across database backends.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// World leaderboard size.
pub const WORLD_TOP_LIMIT: i64 = 10;

/// Maximum entries in a user-relative window: the user, up to 5 above and
/// up to 5 below.
pub const WINDOW_SIZE: usize = 11;

const HALF_WINDOW: usize = 5;

/// Username shown when the user row behind a progress record is gone.
const FALLBACK_USERNAME: &str = "Alumno";

/// Ranking window selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    Month,
    #[default]
    All,
}

impl Period {
    /// Parse a `period` query value. Anything but `week`/`month` means
    /// all-time.
    pub fn parse(period: Option<&str>) -> Self {
        match period {
            Some("week") => Period::Week,
            Some("month") => Period::Month,
            _ => Period::All,
        }
    }

    /// Progress column holding the XP metric for this period.
    fn metric_column(self) -> &'static str {
        match self {
            Period::Week => "weekly_xp",
            Period::Month => "monthly_xp",
            Period::All => "xp",
        }
    }
}

/// One leaderboard row. Rank is implied by position on the world board.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub user_id: i64,
    pub username: String,
    pub xp: i64,
    pub level: i64,
}

/// Leaderboard row with an explicit 1-indexed rank, for relative windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub user_id: i64,
    pub username: String,
    pub xp: i64,
    pub level: i64,
    pub rank: i64,
}

#[derive(Clone)]
pub struct Leaderboard {
    pool: SqlitePool,
}

impl Leaderboard {
    /// Create a new [`Leaderboard`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Top entries worldwide for a period, best first.
    pub async fn world_top(&self, period: Period) -> Result<Vec<Entry>> {
        let mut entries = self.all_ranked(period).await?;
        entries.truncate(WORLD_TOP_LIMIT as usize);
        Ok(entries)
    }

    /// Window of up to [`WINDOW_SIZE`] entries centered on a user, with
    /// explicit ranks. `None` when the user has no progress record.
    pub async fn relative_to(
        &self,
        user_id: i64,
        period: Period,
    ) -> Result<Option<Vec<RankedEntry>>> {
        let entries = self.all_ranked(period).await?;
        Ok(relative_window(&entries, user_id))
    }

    /// Full population sorted by the period metric, descending.
    async fn all_ranked(&self, period: Period) -> Result<Vec<Entry>> {
        let metric = period.metric_column();
        let query = format!(
            r#"SELECT p.user_id, COALESCE(u.username, '{FALLBACK_USERNAME}') AS username,
                p.{metric} AS xp, p.level
                FROM progress p
                LEFT JOIN users u ON u.id = p.user_id
                ORDER BY p.{metric} DESC, p.user_id ASC"#,
        );

        let entries = sqlx::query_as::<_, Entry>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

/// Slice a window of up to [`WINDOW_SIZE`] entries around `user_id` in an
/// already-sorted population, annotating each entry with its global rank.
fn relative_window(
    entries: &[Entry],
    user_id: i64,
) -> Option<Vec<RankedEntry>> {
    let index = entries.iter().position(|e| e.user_id == user_id)?;

    let start = index.saturating_sub(HALF_WINDOW);
    let len = WINDOW_SIZE.min(entries.len() - start);

    Some(
        entries[start..start + len]
            .iter()
            .enumerate()
            .map(|(offset, entry)| RankedEntry {
                user_id: entry.user_id,
                username: entry.username.clone(),
                xp: entry.xp,
                level: entry.level,
                rank: (start + offset) as i64 + 1,
            })
            .collect(),
    )
}
