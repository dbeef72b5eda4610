//! Users-related HTTP API: registration, login, account lifecycle,
//! profile and progress.

mod deactivate;
mod delete;
mod get;
mod login;
mod profile;
mod progress;
mod register;
mod verify;

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /users/register` goes to `register`.
        .route("/register", post(register::handler))
        // `GET /users/verify-email?token=` goes to `verify`.
        .route("/verify-email", get(verify::handler))
        // `POST /users/login` goes to `login`.
        .route("/login", post(login::handler))
        // `GET /users/confirm-deactivation?token=` goes to `deactivate`.
        .route("/confirm-deactivation", get(deactivate::confirm_handler))
        // `GET /users/:ID` goes to `get`.
        .route("/{user_id}", get(get::handler))
        // `DELETE /users/:ID?code=` goes to `delete`.
        .route("/{user_id}", delete(delete::handler))
        // `GET /users/:ID/progress` goes to `progress`.
        .route("/{user_id}/progress", get(progress::get_handler))
        // `POST /users/:ID/xp` goes to `progress`.
        .route("/{user_id}/xp", post(progress::add_xp_handler))
        // `PUT /users/:ID/profile` goes to `profile`.
        .route("/{user_id}/profile", put(profile::handler))
        // `PUT /users/:ID/language` goes to `profile`.
        .route("/{user_id}/language", put(profile::language_handler))
        // `POST /users/:ID/request-deactivation` goes to `deactivate`.
        .route(
            "/{user_id}/request-deactivation",
            post(deactivate::request_handler),
        )
        // `POST /users/:ID/request-deletion` goes to `delete`.
        .route(
            "/{user_id}/request-deletion",
            post(delete::request_handler),
        )
}
