use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::directory::PersonId;

/// Identifier wrapper for membership change requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Derive an id from the frozen request fields so retries of the same submission collide.
    pub fn derive(
        kind: RequestKind,
        group_name: &str,
        member_id: &PersonId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            kind.id_prefix(),
            slugify(group_name),
            slugify(member_id.as_str()),
            created_at.timestamp_millis()
        ))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Admission,
    Removal,
}

impl RequestKind {
    pub const fn label(self) -> &'static str {
        match self {
            RequestKind::Admission => "admission",
            RequestKind::Removal => "removal",
        }
    }

    const fn id_prefix(self) -> &'static str {
        match self {
            RequestKind::Admission => "adm",
            RequestKind::Removal => "rem",
        }
    }
}

/// Lifecycle of a change request. Only `Pending` may move, and only to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Proposed admission or removal, with member details frozen at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: RequestId,
    pub leader_id: PersonId,
    pub leader_name: String,
    pub group_name: String,
    pub member_id: PersonId,
    pub member_name: String,
    pub member_sector: String,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub reason: String,
    pub justification: Option<String>,
    #[serde(default)]
    pub admin_notes: Vec<String>,
    #[serde(default)]
    pub transfer_from: Option<String>,
    #[serde(default)]
    pub external: bool,
    pub seen_by_leader: bool,
    pub seen_by_admin: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
}

impl ChangeRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_transfer(&self) -> bool {
        self.transfer_from.is_some()
    }
}

/// Leader-supplied parameters for adding someone to a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAction {
    pub group_name: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub auto_seen: bool,
}

/// Leader-supplied parameters for removing someone from a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkAction {
    pub group_name: String,
    #[serde(default)]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionDecision {
    Approve,
    Reject,
}

/// Administrator verdict on a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub decision: ResolutionDecision,
    pub admin: String,
    #[serde(default)]
    pub note: Option<String>,
}
