use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;

use super::repository::{PersistenceSink, RepositoryError, SnapshotProvider};
use super::service::{CoordinatorError, LinkCommand, PgCoordinator, UnlinkCommand, Viewer};
use crate::workflows::bridge::ChaplaincyBridge;
use crate::workflows::directory::PersonId;
use crate::workflows::membership::{RequestId, Resolution};
use crate::workflows::scheduling::ScheduleProposal;

#[derive(Debug, Deserialize)]
pub(crate) struct AcknowledgeRequest {
    pub(crate) viewer: Viewer,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssessmentRequest {
    pub(crate) leader_id: PersonId,
    pub(crate) scheduled_at: NaiveDateTime,
}

/// Router builder exposing the membership and scheduling endpoints.
pub fn coordinator_router<R, B>(service: Arc<PgCoordinator<R, B>>) -> Router
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    Router::new()
        .route("/api/v1/memberships/links", post(link_handler::<R, B>))
        .route("/api/v1/memberships/unlinks", post(unlink_handler::<R, B>))
        .route(
            "/api/v1/memberships/requests/pending",
            get(pending_handler::<R, B>),
        )
        .route(
            "/api/v1/memberships/requests/:request_id/resolution",
            post(resolution_handler::<R, B>),
        )
        .route(
            "/api/v1/memberships/requests/:request_id/seen",
            post(acknowledge_handler::<R, B>),
        )
        .route(
            "/api/v1/groups/:group_name/roster",
            get(roster_handler::<R, B>),
        )
        .route(
            "/api/v1/schedules/assessment",
            post(assessment_handler::<R, B>),
        )
        .route("/api/v1/schedules", post(schedule_handler::<R, B>))
        .with_state(service)
}

pub(crate) async fn link_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    axum::Json(command): axum::Json<LinkCommand>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.link_member(command) {
        Ok(decision) => (StatusCode::CREATED, axum::Json(decision)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn unlink_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    axum::Json(command): axum::Json<UnlinkCommand>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.unlink_member(command) {
        Ok(decision) => (StatusCode::CREATED, axum::Json(decision)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.pending_requests() {
        Ok(requests) => (StatusCode::OK, axum::Json(requests)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resolution_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    Path(request_id): Path<String>,
    axum::Json(resolution): axum::Json<Resolution>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.resolve_request(&RequestId(request_id), resolution) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn acknowledge_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    Path(request_id): Path<String>,
    axum::Json(payload): axum::Json<AcknowledgeRequest>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.acknowledge(&RequestId(request_id), payload.viewer) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn roster_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    Path(group_name): Path<String>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.roster(&group_name) {
        Ok(entries) => {
            let payload = json!({
                "group_name": group_name,
                "entries": entries,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assessment_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    axum::Json(request): axum::Json<AssessmentRequest>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.assess_slot(&request.leader_id, request.scheduled_at) {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn schedule_handler<R, B>(
    State(service): State<Arc<PgCoordinator<R, B>>>,
    axum::Json(proposal): axum::Json<ScheduleProposal>,
) -> Response
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    match service.submit_schedule(proposal).await {
        Ok(submission) => (StatusCode::OK, axum::Json(submission)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_status(err: &CoordinatorError) -> StatusCode {
    match err {
        CoordinatorError::Membership(_) | CoordinatorError::Scheduling(_) => {
            if err.is_validation() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::CONFLICT
            }
        }
        CoordinatorError::InactiveGroup(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoordinatorError::NotAnAdministrator(_) => StatusCode::FORBIDDEN,
        CoordinatorError::UnknownLeader(_)
        | CoordinatorError::UnknownMember(_)
        | CoordinatorError::UnknownRequest(_)
        | CoordinatorError::UnknownGroup(_) => StatusCode::NOT_FOUND,
        CoordinatorError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn error_response(err: CoordinatorError) -> Response {
    let status = error_status(&err);
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
