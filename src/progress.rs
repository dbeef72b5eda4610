//! Per-user XP counters and lesson score snapshots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// XP thresholds are flat: one level per 1000 XP.
pub const XP_PER_LEVEL: i64 = 1000;

const DEFAULT_TXANPONAK: i64 = 100;
const DEFAULT_LESSON_TITLE: &str = "Saludos";

/// Level derived from total XP, recomputed on every XP addition.
pub const fn level_for_xp(xp: i64) -> i64 {
    xp / XP_PER_LEVEL + 1
}

/// Progress as saved on database. One row per user, created lazily.
///
/// `weekly_xp` and `monthly_xp` accumulate forever; there is no calendar
/// reset job.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: i64,
    pub user_id: i64,
    pub xp: i64,
    #[serde(rename = "weeklyXP")]
    pub weekly_xp: i64,
    #[serde(rename = "monthlyXP")]
    pub monthly_xp: i64,
    pub streak: i64,
    pub level: i64,
    pub txanponak: i64,
    pub last_lesson_date: DateTime<Utc>,
    pub last_lesson_title: String,
}

/// Per-user, per-lesson score snapshot shown on the home screen.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub date: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ProgressRepository {
    pool: SqlitePool,
}

impl ProgressRepository {
    /// Create a new [`ProgressRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find progress by owning user.
    pub async fn find_by_user(&self, user_id: i64) -> Result<Option<Progress>> {
        let progress = sqlx::query_as::<_, Progress>(
            r#"SELECT id, user_id, xp, weekly_xp, monthly_xp, streak, level,
                txanponak, last_lesson_date, last_lesson_title
                FROM progress WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Create the default progress row for a user and return it.
    pub async fn insert_default(&self, user_id: i64) -> Result<Progress> {
        let progress = Progress {
            user_id,
            xp: 0,
            weekly_xp: 0,
            monthly_xp: 0,
            streak: 0,
            level: 1,
            txanponak: DEFAULT_TXANPONAK,
            last_lesson_date: Utc::now() - Duration::days(1),
            last_lesson_title: DEFAULT_LESSON_TITLE.to_owned(),
            ..Default::default()
        };

        self.insert(&progress).await
    }

    /// Insert a progress row, returning it with its generated id.
    pub async fn insert(&self, progress: &Progress) -> Result<Progress> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO progress (user_id, xp, weekly_xp, monthly_xp,
                streak, level, txanponak, last_lesson_date, last_lesson_title)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id"#,
        )
        .bind(progress.user_id)
        .bind(progress.xp)
        .bind(progress.weekly_xp)
        .bind(progress.monthly_xp)
        .bind(progress.streak)
        .bind(progress.level)
        .bind(progress.txanponak)
        .bind(progress.last_lesson_date)
        .bind(&progress.last_lesson_title)
        .fetch_one(&self.pool)
        .await?;

        Ok(Progress {
            id,
            ..progress.clone()
        })
    }

    /// Update the XP counters of an existing row.
    pub async fn update(&self, progress: &Progress) -> Result<()> {
        sqlx::query(
            r#"UPDATE progress
                SET xp = $1, weekly_xp = $2, monthly_xp = $3, streak = $4,
                    level = $5, txanponak = $6, last_lesson_date = $7,
                    last_lesson_title = $8
                WHERE user_id = $9"#,
        )
        .bind(progress.xp)
        .bind(progress.weekly_xp)
        .bind(progress.monthly_xp)
        .bind(progress.streak)
        .bind(progress.level)
        .bind(progress.txanponak)
        .bind(progress.last_lesson_date)
        .bind(&progress.last_lesson_title)
        .bind(progress.user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lesson score history for the home screen.
    pub async fn scores_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<LessonProgress>> {
        let scores = sqlx::query_as::<_, LessonProgress>(
            r#"SELECT id, user_id, lesson_id, correct_answers,
                total_questions, date
                FROM lesson_progress WHERE user_id = $1 ORDER BY date DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(999), 1);
        assert_eq!(level_for_xp(1000), 2);
        assert_eq!(level_for_xp(1999), 2);
        assert_eq!(level_for_xp(2000), 3);
    }
}
