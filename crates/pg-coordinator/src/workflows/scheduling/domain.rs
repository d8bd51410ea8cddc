use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::workflows::directory::{ChaplainId, PersonId};

/// Chaplain presence lifecycle. `Confirmed` and `Declined` are written only by the external
/// chaplaincy system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaplainStatus {
    #[default]
    None,
    Pending,
    Confirmed,
    Declined,
}

impl ChaplainStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ChaplainStatus::None => "none",
            ChaplainStatus::Pending => "pending",
            ChaplainStatus::Confirmed => "confirmed",
            ChaplainStatus::Declined => "declined",
        }
    }
}

/// Weekly meeting slot chosen by a group leader. One per leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSchedule {
    pub leader_id: PersonId,
    pub leader_name: String,
    pub group_name: String,
    pub unit: String,
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub request_chaplain: bool,
    #[serde(default)]
    pub preferred_chaplain_id: Option<ChaplainId>,
    #[serde(default)]
    pub chaplain_status: ChaplainStatus,
    #[serde(default)]
    pub assigned_chaplain_id: Option<ChaplainId>,
    #[serde(default)]
    pub chaplain_response: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MeetingSchedule {
    /// Whether the chaplaincy assigned this chaplain to the meeting.
    pub fn is_assigned_to(&self, chaplain_id: &ChaplainId) -> bool {
        self.assigned_chaplain_id.as_ref() == Some(chaplain_id)
    }

    /// Whether the meeting holds the chaplain: the assigned one, or the preferred one while
    /// nothing has been assigned yet.
    pub fn holds(&self, chaplain_id: &ChaplainId) -> bool {
        match &self.assigned_chaplain_id {
            Some(assigned) => assigned == chaplain_id,
            None => self.preferred_chaplain_id.as_ref() == Some(chaplain_id),
        }
    }
}

/// Leader input when picking a new meeting date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleProposal {
    pub leader_id: PersonId,
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub request_chaplain: bool,
    #[serde(default)]
    pub preferred_chaplain_id: Option<ChaplainId>,
    #[serde(default)]
    pub notes: Option<String>,
}
