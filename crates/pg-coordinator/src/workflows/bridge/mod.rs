//! Outbound link to the chaplaincy system that owns visit scheduling.

mod http;

pub use http::HttpChaplaincyBridge;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::directory::ChaplainId;
use crate::workflows::scheduling::MeetingSchedule;

/// Preferred-chaplain ids shorter than this are dropped rather than forwarded; the receiving
/// system keys chaplains by a foreign key and rejects anything malformed.
pub const MIN_CHAPLAIN_ID_LEN: usize = 10;

const ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S";

/// Payload accepted by the chaplaincy system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitInvite {
    pub group_name: String,
    pub leader_name: String,
    pub leader_contact: String,
    pub unit_code: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_chaplain_id: Option<String>,
}

impl VisitInvite {
    pub fn from_schedule(schedule: &MeetingSchedule, leader_contact: &str) -> Self {
        Self {
            group_name: schedule.group_name.clone(),
            leader_name: schedule.leader_name.clone(),
            leader_contact: leader_contact.trim().to_string(),
            unit_code: schedule.unit.clone(),
            date: schedule.scheduled_at.format(ISO_DATE_TIME).to_string(),
            notes: schedule.notes.clone(),
            preferred_chaplain_id: sanitize_chaplain_id(schedule.preferred_chaplain_id.as_ref()),
        }
    }
}

pub fn sanitize_chaplain_id(chaplain_id: Option<&ChaplainId>) -> Option<String> {
    let candidate = chaplain_id?.as_str().trim();
    if candidate.chars().count() < MIN_CHAPLAIN_ID_LEN
        || candidate.chars().any(char::is_whitespace)
    {
        return None;
    }
    Some(candidate.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("chaplaincy bridge transport failed: {0}")]
    Transport(String),
    #[error("chaplaincy bridge timed out")]
    Timeout,
    #[error("chaplaincy bridge rejected invite with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("chaplaincy bridge misconfigured: {0}")]
    Configuration(String),
}

/// Fire-and-forget sink for visit invites. Implementations must not retry.
#[async_trait]
pub trait ChaplaincyBridge: Send + Sync {
    async fn send_visit_invite(&self, invite: &VisitInvite) -> Result<(), BridgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::directory::PersonId;
    use crate::workflows::scheduling::ChaplainStatus;
    use chrono::NaiveDate;

    fn schedule(preferred: Option<&str>) -> MeetingSchedule {
        MeetingSchedule {
            leader_id: PersonId::new("L-1"),
            leader_name: "Lúcia Ramos".to_string(),
            group_name: "PG Esperança".to_string(),
            unit: "Belém".to_string(),
            scheduled_at: NaiveDate::from_ymd_opt(2025, 3, 12)
                .expect("valid date")
                .and_hms_opt(19, 0, 0)
                .expect("valid time"),
            request_chaplain: true,
            preferred_chaplain_id: preferred.map(ChaplainId::new),
            chaplain_status: ChaplainStatus::Pending,
            assigned_chaplain_id: None,
            chaplain_response: None,
            notes: Some("Sala 3".to_string()),
        }
    }

    #[test]
    fn invite_carries_iso_date_and_denormalized_fields() {
        let invite = VisitInvite::from_schedule(
            &schedule(Some("3f2c9a10-7d1e-4c55-9a51-0b5d2f8e1a77")),
            " lucia@hospital.org ",
        );
        assert_eq!(invite.date, "2025-03-12T19:00:00");
        assert_eq!(invite.leader_contact, "lucia@hospital.org");
        assert_eq!(invite.unit_code, "Belém");
        assert_eq!(
            invite.preferred_chaplain_id.as_deref(),
            Some("3f2c9a10-7d1e-4c55-9a51-0b5d2f8e1a77")
        );
    }

    #[test]
    fn short_chaplain_ids_are_sent_as_absent() {
        let invite = VisitInvite::from_schedule(&schedule(Some("7")), "lucia@hospital.org");
        assert_eq!(invite.preferred_chaplain_id, None);

        let json = serde_json::to_value(&invite).expect("serializes");
        assert!(json.get("preferred_chaplain_id").is_none());
    }

    #[test]
    fn sanitize_rejects_padded_or_spaced_values() {
        assert_eq!(
            sanitize_chaplain_id(Some(&ChaplainId::new("   abc   "))),
            None
        );
        assert_eq!(
            sanitize_chaplain_id(Some(&ChaplainId::new("chaplain 0001"))),
            None
        );
        assert_eq!(
            sanitize_chaplain_id(Some(&ChaplainId::new(" chaplain-0001 "))),
            Some("chaplain-0001".to_string())
        );
        assert_eq!(sanitize_chaplain_id(None), None);
    }
}
