use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::bridge::{BridgeError, ChaplaincyBridge, VisitInvite};
use crate::workflows::coordinator::{
    coordinator_router, DirectorySnapshot, InMemoryDirectory, PersistenceSink, PgCoordinator,
    RepositoryError, SnapshotProvider,
};
use crate::workflows::directory::{
    Chaplain, ChaplainId, Collaborator, Group, Leader, LeaderRole, PersonId,
};
use crate::workflows::membership::{ChangeRequest, LinkAction, MembershipEngine};
use crate::workflows::scheduling::{
    ChaplainStatus, MeetingSchedule, SchedulingEngine, SchedulingPolicy,
};

pub(super) const ESPERANCA: &str = "PG Esperança";
pub(super) const VIDA: &str = "PG Vida";
/// Registered but closed to new members.
pub(super) const OUTONO: &str = "PG Outono";
/// Contact of the ADMIN leader A-1.
pub(super) const ADMIN: &str = "admin@hospital.org";

// 2025-03-12 is a Wednesday, 2025-03-15 a Saturday.
pub(super) fn wednesday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 12)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(super) fn saturday() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 15)
        .expect("valid date")
        .and_hms_opt(10, 0, 0)
        .expect("valid time")
}

fn leader(id: &str, name: &str, unit: &str, sector: &str, group: &str) -> Leader {
    Leader {
        id: PersonId::new(id),
        name: name.to_string(),
        contact: format!("{}@hospital.org", id.to_lowercase()),
        unit: unit.to_string(),
        sector: sector.to_string(),
        group_name: group.to_string(),
        role: LeaderRole::Leader,
    }
}

fn collaborator(id: &str, name: &str, sector: &str, group: Option<&str>) -> Collaborator {
    Collaborator {
        id: PersonId::new(id),
        name: name.to_string(),
        sector: sector.to_string(),
        group: group.map(str::to_string),
        active: true,
    }
}

fn chaplain(id: &str, name: &str) -> Chaplain {
    Chaplain {
        id: ChaplainId::new(id),
        name: name.to_string(),
        active: true,
        unit: "Belém".to_string(),
    }
}

fn administrator() -> Leader {
    Leader {
        contact: ADMIN.to_string(),
        role: LeaderRole::Admin,
        ..leader("A-1", "Ana Souza", "Belém", "Pastoral", "PG Coordenação")
    }
}

/// Lúcia leads a Cardiology group, Paulo an Oncology one; both in Belém. Rita is in a unit
/// without chaplain coordination. Ana resolves requests. Paulo already booked chaplain-0001 on
/// Wednesday at 19:00.
pub(super) fn snapshot() -> DirectorySnapshot {
    DirectorySnapshot {
        leaders: vec![
            leader("L-100", "Lúcia Ramos", "Belém", "Cardiology", ESPERANCA),
            leader("L-200", "Paulo Nunes", "Belém", "Oncology", VIDA),
            leader("L-300", "Rita Alves", "Ananindeua", "Pediatrics", "PG Luz"),
            administrator(),
        ],
        collaborators: vec![
            collaborator("1001", "Marcos Lima", "Cardiology", None),
            collaborator("1002", "Helena Costa", "Oncology", None),
            collaborator("1003", "Joana Prado", "Cardiology", Some(VIDA)),
            collaborator("1004", "Bruno Dias", "Cardiology", Some(ESPERANCA)),
        ],
        groups: vec![
            Group {
                name: ESPERANCA.to_string(),
                active: true,
            },
            Group {
                name: VIDA.to_string(),
                active: true,
            },
            Group {
                name: OUTONO.to_string(),
                active: false,
            },
        ],
        chaplains: vec![
            chaplain("chaplain-0001", "Capelão André"),
            chaplain("chaplain-0002", "Capelã Sara"),
        ],
        change_requests: Vec::new(),
        schedules: vec![MeetingSchedule {
            leader_id: PersonId::new("L-200"),
            leader_name: "Paulo Nunes".to_string(),
            group_name: VIDA.to_string(),
            unit: "Belém".to_string(),
            scheduled_at: wednesday(19, 0),
            request_chaplain: true,
            preferred_chaplain_id: Some(ChaplainId::new("chaplain-0001")),
            chaplain_status: ChaplainStatus::Pending,
            assigned_chaplain_id: None,
            chaplain_response: None,
            notes: None,
        }],
    }
}

pub(super) fn link_action(justification: Option<&str>) -> LinkAction {
    LinkAction {
        group_name: ESPERANCA.to_string(),
        reason: None,
        justification: justification.map(str::to_string),
        auto_seen: true,
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingBridge {
    invites: Arc<Mutex<Vec<VisitInvite>>>,
}

impl RecordingBridge {
    pub(super) fn invites(&self) -> Vec<VisitInvite> {
        self.invites.lock().expect("bridge mutex poisoned").clone()
    }
}

#[async_trait]
impl ChaplaincyBridge for RecordingBridge {
    async fn send_visit_invite(&self, invite: &VisitInvite) -> Result<(), BridgeError> {
        self.invites
            .lock()
            .expect("bridge mutex poisoned")
            .push(invite.clone());
        Ok(())
    }
}

pub(super) struct FailingBridge;

#[async_trait]
impl ChaplaincyBridge for FailingBridge {
    async fn send_visit_invite(&self, _invite: &VisitInvite) -> Result<(), BridgeError> {
        Err(BridgeError::Timeout)
    }
}

pub(super) struct UnavailableDirectory;

impl SnapshotProvider for UnavailableDirectory {
    fn snapshot(&self) -> Result<DirectorySnapshot, RepositoryError> {
        Err(RepositoryError::Unavailable("sheet offline".to_string()))
    }
}

impl PersistenceSink for UnavailableDirectory {
    fn save_change_request(&self, _request: ChangeRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("sheet offline".to_string()))
    }

    fn save_schedule(&self, _schedule: MeetingSchedule) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("sheet offline".to_string()))
    }

    fn save_collaborator(&self, _member: Collaborator) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("sheet offline".to_string()))
    }
}

/// Directory whose member writes fail while every other write goes through.
#[derive(Clone)]
pub(super) struct MemberWritesFail(pub(super) InMemoryDirectory);

impl SnapshotProvider for MemberWritesFail {
    fn snapshot(&self) -> Result<DirectorySnapshot, RepositoryError> {
        self.0.snapshot()
    }
}

impl PersistenceSink for MemberWritesFail {
    fn save_change_request(&self, request: ChangeRequest) -> Result<(), RepositoryError> {
        self.0.save_change_request(request)
    }

    fn save_schedule(&self, schedule: MeetingSchedule) -> Result<(), RepositoryError> {
        self.0.save_schedule(schedule)
    }

    fn save_collaborator(&self, _member: Collaborator) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("members sheet locked".to_string()))
    }
}

pub(super) fn coordinator_with<B: ChaplaincyBridge + 'static>(
    bridge: B,
) -> (InMemoryDirectory, Arc<PgCoordinator<InMemoryDirectory, B>>) {
    let directory = InMemoryDirectory::new(snapshot());
    let coordinator = PgCoordinator::new(
        Arc::new(directory.clone()),
        Arc::new(bridge),
        MembershipEngine::default(),
        SchedulingEngine::new(SchedulingPolicy::default()),
    );
    (directory, Arc::new(coordinator))
}

pub(super) fn build_coordinator() -> (
    InMemoryDirectory,
    RecordingBridge,
    Arc<PgCoordinator<InMemoryDirectory, RecordingBridge>>,
) {
    let bridge = RecordingBridge::default();
    let (directory, coordinator) = coordinator_with(bridge.clone());
    (directory, bridge, coordinator)
}

pub(super) fn router() -> (InMemoryDirectory, RecordingBridge, Router) {
    let (directory, bridge, coordinator) = build_coordinator();
    (directory, bridge, coordinator_router(coordinator))
}

pub(super) fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(body).expect("serialize request body"),
        ))
        .expect("build request")
}

pub(super) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) async fn expect_status(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    read_json_body(response).await
}
