//! End-to-end membership scenarios driven through the public coordinator facade, starting from a
//! JSON directory snapshot the way the demo and external store supply it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use pg_coordinator::workflows::bridge::{BridgeError, ChaplaincyBridge, VisitInvite};
use pg_coordinator::workflows::coordinator::{
    CoordinatorError, DirectorySnapshot, InMemoryDirectory, LinkCommand, LinkTarget,
    PgCoordinator, SnapshotProvider,
};
use pg_coordinator::workflows::directory::PersonId;
use pg_coordinator::workflows::membership::{
    LinkAction, MembershipEngine, MembershipError, RequestStatus, Resolution, ResolutionDecision,
    RosterEntry,
};
use pg_coordinator::workflows::scheduling::SchedulingEngine;

struct SilentBridge;

#[async_trait]
impl ChaplaincyBridge for SilentBridge {
    async fn send_visit_invite(&self, _invite: &VisitInvite) -> Result<(), BridgeError> {
        Ok(())
    }
}

fn directory() -> InMemoryDirectory {
    let snapshot: DirectorySnapshot = serde_json::from_value(json!({
        "leaders": [
            {
                "id": "L-1",
                "name": "Lúcia Ramos",
                "contact": "lucia@hospital.org",
                "unit": "Belém",
                "sector": "Cardiology",
                "group_name": "PG Esperança",
                "role": "LEADER"
            },
            {
                "id": "A-1",
                "name": "Ana Souza",
                "contact": "admin@hospital.org",
                "unit": "Belém",
                "sector": "Pastoral",
                "group_name": "PG Coordenação",
                "role": "ADMIN"
            }
        ],
        "collaborators": [
            { "id": "M-1", "name": "Marcos Lima", "sector": "Cardiology" },
            { "id": "M-2", "name": "Helena Costa", "sector": "Oncology" }
        ],
        "groups": [ { "name": "PG Esperança" } ]
    }))
    .expect("snapshot json is valid");
    InMemoryDirectory::new(snapshot)
}

fn coordinator(directory: &InMemoryDirectory) -> PgCoordinator<InMemoryDirectory, SilentBridge> {
    PgCoordinator::new(
        Arc::new(directory.clone()),
        Arc::new(SilentBridge),
        MembershipEngine::default(),
        SchedulingEngine::default(),
    )
}

fn link(member: &str, justification: Option<&str>) -> LinkCommand {
    LinkCommand {
        leader_id: PersonId::new("L-1"),
        target: LinkTarget::Member {
            id: PersonId::new(member),
        },
        action: LinkAction {
            group_name: "PG Esperança".to_string(),
            reason: None,
            justification: justification.map(str::to_string),
            auto_seen: false,
        },
    }
}

fn group_of(directory: &InMemoryDirectory, member: &str) -> Option<String> {
    directory
        .snapshot()
        .expect("snapshot")
        .collaborator(&PersonId::new(member))
        .and_then(|record| record.group.clone())
}

#[test]
fn same_sector_member_joins_immediately() {
    let directory = directory();
    let coordinator = coordinator(&directory);

    let decision = coordinator
        .link_member(link("M-1", None))
        .expect("link accepted");

    assert_eq!(decision.request.status, RequestStatus::Approved);
    assert_eq!(group_of(&directory, "M-1").as_deref(), Some("PG Esperança"));
}

#[test]
fn cross_sector_member_joins_after_admin_approval() {
    let directory = directory();
    let coordinator = coordinator(&directory);

    let decision = coordinator
        .link_member(link("M-2", Some("requested transfer")))
        .expect("link accepted");
    assert_eq!(decision.request.status, RequestStatus::Pending);
    assert_eq!(group_of(&directory, "M-2"), None);

    coordinator
        .resolve_request(
            &decision.request.id,
            Resolution {
                decision: ResolutionDecision::Approve,
                admin: "admin@hospital.org".to_string(),
                note: None,
            },
        )
        .expect("approved");
    assert_eq!(group_of(&directory, "M-2").as_deref(), Some("PG Esperança"));
}

#[test]
fn rejected_request_stays_as_audit_trail() {
    let directory = directory();
    let coordinator = coordinator(&directory);

    let decision = coordinator
        .link_member(link("M-2", Some("requested transfer")))
        .expect("link accepted");
    coordinator
        .resolve_request(
            &decision.request.id,
            Resolution {
                decision: ResolutionDecision::Reject,
                admin: "admin@hospital.org".to_string(),
                note: Some("setor sem liberação".to_string()),
            },
        )
        .expect("rejected");

    assert_eq!(group_of(&directory, "M-2"), None);
    let snapshot = directory.snapshot().expect("snapshot");
    let stored = snapshot
        .change_request(&decision.request.id)
        .expect("request kept");
    assert_eq!(stored.status, RequestStatus::Rejected);
    assert_eq!(stored.admin_notes, vec!["setor sem liberação".to_string()]);
}

#[test]
fn short_justification_is_a_validation_error() {
    let directory = directory();
    let coordinator = coordinator(&directory);

    match coordinator.link_member(link("M-2", Some(" o k "))) {
        Err(err @ CoordinatorError::Membership(MembershipError::JustificationRequired { .. })) => {
            assert!(err.is_validation());
        }
        other => panic!("expected justification error, got {other:?}"),
    }
}

#[test]
fn roster_lists_leader_once_even_without_a_member_record() {
    let directory = directory();
    let coordinator = coordinator(&directory);
    coordinator
        .link_member(link("M-1", None))
        .expect("link accepted");
    coordinator
        .link_member(LinkCommand {
            leader_id: PersonId::new("L-1"),
            target: LinkTarget::ExternalPerson {
                name: "Carla Mendes".to_string(),
            },
            action: LinkAction {
                group_name: "PG Esperança".to_string(),
                ..LinkAction::default()
            },
        })
        .expect("external link accepted");

    let roster = coordinator.roster("pg esperança").expect("roster");
    let leaders = roster
        .iter()
        .filter(|entry| matches!(entry, RosterEntry::Leader { .. }))
        .count();
    assert_eq!(leaders, 1);
    assert!(matches!(roster[0], RosterEntry::Leader { .. }));

    let mut ids: Vec<&str> = roster.iter().map(|entry| entry.person_id().as_str()).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert_eq!(total, 3);
}
