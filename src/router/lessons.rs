//! Lessons HTTP API, including first-run content seeding and the mock
//! AI generation endpoint.

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;

use crate::error::Result;
use crate::generator::generate_exercises;
use crate::lesson::{Lesson, LessonRepository, SEED_TOPICS};
use crate::progress::{Progress, ProgressRepository, level_for_xp};
use crate::user::{DEFAULT_LANGUAGE, User, UserRepository};
use crate::{AppState, ServerError};

/// Exercises generated per lesson, both at seeding and on demand.
const EXERCISES_PER_LESSON: usize = 3;

/// Exercises returned by the on-demand generation endpoint.
const GENERATED_EXERCISES: usize = 5;

/// Demo users are seeded while the install has fewer real accounts than
/// this, so the leaderboard never looks empty.
const MIN_POPULATION: i64 = 5;

const DEMO_NAMES: [&str; 20] = [
    "Aitor", "Ane", "Iker", "Maite", "Jon", "Amaia", "Gorka", "Nerea",
    "Koldo", "Itziar", "Mikel", "Eider", "Unai", "Nagore", "Xabier", "Olatz",
    "Andoni", "Belen", "Josu", "Arantza",
];

#[derive(Debug, Deserialize)]
pub struct TopicParams {
    pub topic: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /lessons` goes to `all`.
        .route("/", get(all))
        // `GET /lessons/:ID` goes to `find`.
        .route("/{lesson_id}", get(find))
        // `POST /lessons/generate-for-topic?topic=` goes to `generate`.
        .route("/generate-for-topic", post(generate))
}

/// Handler to list every lesson with its exercises.
///
/// The first call on an empty database seeds the starter lessons and the
/// demo population; later calls just read.
async fn all(State(state): State<AppState>) -> Result<Json<Vec<Lesson>>> {
    let repo = LessonRepository::new(state.db.sqlite.clone());

    if repo.count().await? == 0 {
        seed_lessons(&repo).await?;
    }
    seed_demo_users(&state).await?;

    Ok(Json(repo.all_with_exercises().await?))
}

/// Handler to get one lesson with its exercises.
async fn find(
    State(state): State<AppState>,
    Path(lesson_id): Path<i64>,
) -> Result<Json<Lesson>> {
    let repo = LessonRepository::new(state.db.sqlite.clone());

    match repo.find_with_exercises(lesson_id).await? {
        Some(lesson) => Ok(Json(lesson)),
        None => Err(ServerError::NotFound),
    }
}

/// Handler to create a lesson with generated content for a free-form
/// topic. Stands in for the AI generation service.
async fn generate(
    State(state): State<AppState>,
    Query(params): Query<TopicParams>,
) -> Result<impl IntoResponse> {
    let Some(topic) = params.topic.filter(|topic| !topic.trim().is_empty())
    else {
        return Err(ServerError::BadRequest(
            "El tema es obligatorio.".to_owned(),
        ));
    };

    let repo = LessonRepository::new(state.db.sqlite.clone());

    let lesson_id = repo.insert(&topic, &topic, 1).await?;
    let exercises = generate_exercises(&topic, GENERATED_EXERCISES);
    repo.insert_exercises(lesson_id, &exercises).await?;

    tracing::info!(lesson_id, topic, "lesson generated");

    // find_with_exercises rereads the rows so ids are filled in.
    let Some(lesson) = repo.find_with_exercises(lesson_id).await? else {
        return Err(ServerError::NotFound);
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/lessons/{lesson_id}"))],
        Json(lesson),
    ))
}

async fn seed_lessons(repo: &LessonRepository) -> Result<()> {
    for (title, topic) in SEED_TOPICS {
        let lesson_id = repo.insert(title, topic, 1).await?;
        let exercises = generate_exercises(topic, EXERCISES_PER_LESSON);
        repo.insert_exercises(lesson_id, &exercises).await?;
    }

    tracing::info!("starter lessons seeded");

    Ok(())
}

async fn seed_demo_users(state: &AppState) -> Result<()> {
    let users = UserRepository::new(state.db.sqlite.clone());
    if users.count().await? >= MIN_POPULATION {
        return Ok(());
    }

    let progresses = ProgressRepository::new(state.db.sqlite.clone());

    for name in DEMO_NAMES {
        let username = name.to_lowercase();
        if users.find_by_username(&username).await?.is_some() {
            continue;
        }

        let user = User {
            username: username.clone(),
            nickname: state.crypto.encrypt(name),
            email: state.crypto.encrypt(&format!("{username}@euskalia.eus")),
            password: state.crypto.encrypt("demo123"),
            joined_at: Utc::now() - Duration::days(rand::thread_rng().gen_range(10..120)),
            language: DEFAULT_LANGUAGE.to_owned(),
            is_verified: true,
            is_active: true,
            ..Default::default()
        };
        let user_id = users.insert(&user).await?;

        let xp = rand::thread_rng().gen_range(100..5_000);
        let (title, _) = SEED_TOPICS[rand::thread_rng().gen_range(0..SEED_TOPICS.len())];
        let weekly_xp = rand::thread_rng().gen_range(0..500);
        let monthly_xp = rand::thread_rng().gen_range(500..1_500);
        let streak = rand::thread_rng().gen_range(0..30);
        let last_lesson_date =
            Utc::now() - Duration::days(rand::thread_rng().gen_range(0..7));
        progresses
            .insert(&Progress {
                user_id,
                xp,
                weekly_xp,
                monthly_xp,
                streak,
                level: level_for_xp(xp),
                txanponak: 100,
                last_lesson_date,
                last_lesson_title: title.to_owned(),
                ..Default::default()
            })
            .await?;
    }

    tracing::info!("demo users seeded");

    Ok(())
}
