//! Lessons and their exercises.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Topics seeded on first lesson fetch.
pub const SEED_TOPICS: [(&str, &str); 4] = [
    ("Saludos", "Saludos"),
    ("La Comida", "Comida"),
    ("En el Bar", "Bar"),
    ("Viajes", "Viajes"),
];

/// Lesson as saved on database. Immutable after creation.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub topic: String,
    /// 1 = A1, 2 = A2, etc.
    pub level: i64,
    #[sqlx(skip)]
    pub exercises: Vec<Exercise>,
}

/// Exercise owned by exactly one lesson.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: i64,
    pub lesson_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub question: String,
    pub correct_answer: String,
    /// JSON-encoded option list, decoded client-side.
    pub options_json: String,
}

#[derive(Clone)]
pub struct LessonRepository {
    pool: SqlitePool,
}

impl LessonRepository {
    /// Create a new [`LessonRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of lesson rows.
    pub async fn count(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lessons")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Insert a lesson, returning its generated id.
    pub async fn insert(
        &self,
        title: &str,
        topic: &str,
        level: i64,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO lessons (title, topic, level) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(title)
        .bind(topic)
        .bind(level)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Attach generated exercises to a lesson.
    pub async fn insert_exercises(
        &self,
        lesson_id: i64,
        exercises: &[Exercise],
    ) -> Result<()> {
        for exercise in exercises {
            sqlx::query(
                r#"INSERT INTO exercises (lesson_id, type, question,
                    correct_answer, options_json)
                    VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(lesson_id)
            .bind(&exercise.kind)
            .bind(&exercise.question)
            .bind(&exercise.correct_answer)
            .bind(&exercise.options_json)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// All lessons with exercises eagerly loaded.
    pub async fn all_with_exercises(&self) -> Result<Vec<Lesson>> {
        let mut lessons = sqlx::query_as::<_, Lesson>(
            "SELECT id, title, topic, level FROM lessons ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        for lesson in lessons.iter_mut() {
            lesson.exercises = self.exercises_for(lesson.id).await?;
        }

        Ok(lessons)
    }

    /// One lesson with exercises eagerly loaded.
    pub async fn find_with_exercises(
        &self,
        lesson_id: i64,
    ) -> Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(
            "SELECT id, title, topic, level FROM lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        match lesson {
            Some(mut lesson) => {
                lesson.exercises = self.exercises_for(lesson.id).await?;
                Ok(Some(lesson))
            },
            None => Ok(None),
        }
    }

    async fn exercises_for(&self, lesson_id: i64) -> Result<Vec<Exercise>> {
        let exercises = sqlx::query_as::<_, Exercise>(
            r#"SELECT id, lesson_id, type, question, correct_answer,
                options_json
                FROM exercises WHERE lesson_id = $1 ORDER BY id"#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(exercises)
    }
}
