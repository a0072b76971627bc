mod disciplinas;
mod escola;
mod membros;
mod reports;
mod resources;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::server::AppState;

/// Routes for the administrators of the selected school.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // School
        .route("/escola", patch(escola::update_escola))
        .route("/escola/logo", post(escola::upload_logo))
        // Resources
        .route(
            "/resources",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route("/resources/reorder", post(resources::reorder_resources))
        .route(
            "/resources/{id}",
            patch(resources::update_resource).delete(resources::delete_resource),
        )
        .route("/resources/{id}/copy", post(resources::copy_resource))
        .route("/resources/{id}/schedules", get(resources::list_schedules))
        .route(
            "/resources/{id}/schedules/{shift}",
            put(resources::upsert_schedule).delete(resources::delete_schedule),
        )
        // Members
        .route(
            "/membros",
            get(membros::list_membros).post(membros::create_membro),
        )
        .route(
            "/membros/{usuario_id}",
            patch(membros::update_membro).delete(membros::remove_membro),
        )
        .route(
            "/membros/{usuario_id}/reset-link",
            post(membros::send_reset_link),
        )
        // Subjects
        .route(
            "/disciplinas",
            get(disciplinas::list_disciplinas).post(disciplinas::create_disciplina),
        )
        .route(
            "/disciplinas/{id}",
            patch(disciplinas::update_disciplina).delete(disciplinas::delete_disciplina),
        )
        // Views
        .route("/weekly-view", get(reports::weekly_view))
        .route("/reports", get(reports::booking_report))
}
