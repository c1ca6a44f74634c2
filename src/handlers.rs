use crate::calendar;
use crate::checkin::CheckInOutcome;
use crate::errors::AppError;
use crate::models::{
    AttendanceQuery, CheckInResponse, FrontDeskCheckInRequest, GymAttendanceResponse, Member, MemberStats,
    NewMemberRequest, ScanCheckInRequest,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn add_member(
    State(state): State<AppState>,
    Path(gym_id): Path<String>,
    Json(payload): Json<NewMemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }

    let member = state
        .store()
        .add_member(&gym_id, name, payload.phone.trim(), payload.user_id, calendar::today())
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn list_members(State(state): State<AppState>, Path(gym_id): Path<String>) -> Json<Vec<Member>> {
    Json(state.store().list_members(&gym_id).await)
}

/// Owner-initiated check-in at the front desk.
pub async fn front_desk_check_in(
    State(state): State<AppState>,
    Path(gym_id): Path<String>,
    Json(payload): Json<FrontDeskCheckInRequest>,
) -> (StatusCode, Json<CheckInResponse>) {
    let outcome = state.service.check_in(payload.member_id.trim(), &gym_id).await;
    to_response(outcome)
}

/// Member self-service check-in after scanning the gym's QR code.
pub async fn scan_check_in(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(payload): Json<ScanCheckInRequest>,
) -> (StatusCode, Json<CheckInResponse>) {
    let outcome = state.service.check_in(&member_id, payload.gym_id.trim()).await;
    to_response(outcome)
}

pub async fn list_gym_checkins(
    State(state): State<AppState>,
    Path(gym_id): Path<String>,
    Query(query): Query<AttendanceQuery>,
) -> Json<GymAttendanceResponse> {
    let date = query.date.unwrap_or_else(calendar::today);
    let records = state.store().list_for_gym(&gym_id, date).await;
    Json(GymAttendanceResponse { gym_id, date, records })
}

pub async fn member_stats(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<Json<MemberStats>, AppError> {
    let stats = state.service.member_stats(&member_id, calendar::today()).await?;
    Ok(Json(stats))
}

pub async fn record_referral(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let count = state.store().record_referral(&member_id).await?;
    Ok(Json(json!({ "member_id": member_id, "referrals": count })))
}

fn to_response(outcome: CheckInOutcome) -> (StatusCode, Json<CheckInResponse>) {
    let (status, body) = match outcome {
        CheckInOutcome::Success(record) => (
            StatusCode::CREATED,
            CheckInResponse {
                status: "success".into(),
                date: Some(record.check_in_date),
                message: "checked in".into(),
            },
        ),
        CheckInOutcome::AlreadyCheckedIn { date } => (
            StatusCode::OK,
            CheckInResponse {
                status: "already_checked_in".into(),
                date: Some(date),
                message: "already checked in today".into(),
            },
        ),
        CheckInOutcome::Rejected { reason } => (
            StatusCode::FORBIDDEN,
            CheckInResponse {
                status: "rejected".into(),
                date: None,
                message: reason,
            },
        ),
        CheckInOutcome::Failure { message } => (
            StatusCode::SERVICE_UNAVAILABLE,
            CheckInResponse {
                status: "failure".into(),
                date: None,
                message,
            },
        ),
    };
    (status, Json(body))
}
