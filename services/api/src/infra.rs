use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use pg_coordinator::config::BridgeConfig;
use pg_coordinator::error::AppError;
use pg_coordinator::workflows::bridge::{
    BridgeError, ChaplaincyBridge, HttpChaplaincyBridge, VisitInvite,
};
use pg_coordinator::workflows::coordinator::DirectorySnapshot;
use pg_coordinator::workflows::directory::{
    Chaplain, ChaplainId, Collaborator, Group, Leader, LeaderRole, PersonId,
};
use pg_coordinator::workflows::scheduling::{ChaplainStatus, MeetingSchedule};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps invites in memory when no chaplaincy endpoint is configured.
#[derive(Default, Clone)]
pub(crate) struct OutboxBridge {
    invites: Arc<Mutex<Vec<VisitInvite>>>,
}

impl OutboxBridge {
    pub(crate) fn invites(&self) -> Vec<VisitInvite> {
        match self.invites.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ChaplaincyBridge for OutboxBridge {
    async fn send_visit_invite(&self, invite: &VisitInvite) -> Result<(), BridgeError> {
        let mut guard = self
            .invites
            .lock()
            .map_err(|_| BridgeError::Transport("outbox lock poisoned".to_string()))?;
        info!(
            group = %invite.group_name,
            date = %invite.date,
            "chaplaincy endpoint not configured; invite kept in outbox"
        );
        guard.push(invite.clone());
        Ok(())
    }
}

/// Bridge selected from configuration at startup.
pub(crate) enum ConfiguredBridge {
    Http(HttpChaplaincyBridge),
    Outbox(OutboxBridge),
}

impl ConfiguredBridge {
    pub(crate) fn from_config(config: &BridgeConfig) -> Result<Self, AppError> {
        match &config.url {
            Some(url) => Ok(Self::Http(HttpChaplaincyBridge::new(
                url.clone(),
                config.token.clone(),
                config.timeout(),
            )?)),
            None => Ok(Self::Outbox(OutboxBridge::default())),
        }
    }

    pub(crate) fn describe(&self) -> &str {
        match self {
            ConfiguredBridge::Http(bridge) => bridge.endpoint(),
            ConfiguredBridge::Outbox(_) => "in-memory outbox",
        }
    }
}

#[async_trait]
impl ChaplaincyBridge for ConfiguredBridge {
    async fn send_visit_invite(&self, invite: &VisitInvite) -> Result<(), BridgeError> {
        match self {
            ConfiguredBridge::Http(bridge) => bridge.send_visit_invite(invite).await,
            ConfiguredBridge::Outbox(bridge) => bridge.send_visit_invite(invite).await,
        }
    }
}

pub(crate) fn load_snapshot(path: &Path) -> Result<DirectorySnapshot, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

const DEMO_ADMIN_ID: &str = "A-1";

/// Directory used by the demo when no snapshot file is given.
pub(crate) fn seeded_snapshot(reference: NaiveDate) -> DirectorySnapshot {
    let leader = |id: &str, name: &str, sector: &str, group: &str| Leader {
        id: PersonId::new(id),
        name: name.to_string(),
        contact: format!("{}@hospital.org", id.to_lowercase()),
        unit: "Belém".to_string(),
        sector: sector.to_string(),
        group_name: group.to_string(),
        role: LeaderRole::Leader,
    };
    let member = |id: &str, name: &str, sector: &str, group: Option<&str>| Collaborator {
        id: PersonId::new(id),
        name: name.to_string(),
        sector: sector.to_string(),
        group: group.map(str::to_string),
        active: true,
    };
    let chaplain = |id: &str, name: &str| Chaplain {
        id: ChaplainId::new(id),
        name: name.to_string(),
        active: true,
        unit: "Belém".to_string(),
    };

    let paulo_meeting = reference
        .and_hms_opt(19, 0, 0)
        .unwrap_or_else(|| reference.and_time(chrono::NaiveTime::MIN));

    DirectorySnapshot {
        leaders: vec![
            leader("L-100", "Lúcia Ramos", "Cardiology", "PG Esperança"),
            leader("L-200", "Paulo Nunes", "Oncology", "PG Vida"),
            Leader {
                role: LeaderRole::Admin,
                ..leader(DEMO_ADMIN_ID, "Ana Souza", "Pastoral", "PG Coordenação")
            },
        ],
        collaborators: vec![
            member("1001", "Marcos Lima", "Cardiology", None),
            member("1002", "Helena Costa", "Oncology", None),
            member("1004", "Bruno Dias", "Cardiology", Some("PG Esperança")),
        ],
        groups: vec![
            Group {
                name: "PG Esperança".to_string(),
                active: true,
            },
            Group {
                name: "PG Vida".to_string(),
                active: true,
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
            group_name: "PG Vida".to_string(),
            unit: "Belém".to_string(),
            scheduled_at: paulo_meeting,
            request_chaplain: true,
            preferred_chaplain_id: Some(ChaplainId::new("chaplain-0001")),
            chaplain_status: ChaplainStatus::Confirmed,
            assigned_chaplain_id: Some(ChaplainId::new("chaplain-0001")),
            chaplain_response: Some("confirmado".to_string()),
            notes: None,
        }],
    }
}

pub(crate) fn parse_date_time(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM"))
}
