use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/gyms/:gym_id/members",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/api/gyms/:gym_id/checkins",
            get(handlers::list_gym_checkins).post(handlers::front_desk_check_in),
        )
        .route("/api/members/:member_id/scan", post(handlers::scan_check_in))
        .route("/api/members/:member_id/stats", get(handlers::member_stats))
        .route("/api/members/:member_id/referrals", post(handlers::record_referral))
        .with_state(state)
}
