use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ChangeRequest, LinkAction, RequestId, RequestKind, RequestStatus, UnlinkAction,
};
use crate::workflows::directory::{same_label, Collaborator, Leader, PersonId};

/// Reason recorded when a member joins a group led by someone from their own sector.
pub const SECTOR_MEMBER_REASON: &str = "Faz parte do setor";

const DEFAULT_CROSS_SECTOR_REASON: &str = "Inclusão de outro setor";
const DEFAULT_EXTERNAL_REASON: &str = "Pessoa externa";
const DEFAULT_REMOVAL_REASON: &str = "Remoção do PG";
const DEFAULT_MIN_JUSTIFICATION_CHARS: usize = 3;

/// Validation and state errors raised while routing membership changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("justification must contain at least {minimum} non-whitespace characters")]
    JustificationRequired { minimum: usize },
    #[error("{member} is already assigned to {group}")]
    AlreadyInGroup { member: PersonId, group: String },
    #[error("{member} already has a pending request for {group}")]
    DuplicatePending { member: PersonId, group: String },
    #[error("{member} is not assigned to {group}")]
    NotInGroup { member: PersonId, group: String },
    #[error("change request {id} is already {}", .status.label())]
    NotPending { id: RequestId, status: RequestStatus },
}

impl MembershipError {
    /// User-correctable problems, as opposed to caller misuse.
    pub fn is_validation(&self) -> bool {
        !matches!(self, MembershipError::NotPending { .. })
    }
}

/// Policy dial for the approval routing rules.
#[derive(Debug, Clone)]
pub struct MembershipPolicy {
    min_justification_chars: usize,
}

impl MembershipPolicy {
    pub fn new(min_justification_chars: usize) -> Self {
        let sanitized = if min_justification_chars == 0 {
            DEFAULT_MIN_JUSTIFICATION_CHARS
        } else {
            min_justification_chars
        };

        Self {
            min_justification_chars: sanitized,
        }
    }

    /// Returns the trimmed justification when it is long enough to count.
    pub fn accepted_justification(&self, justification: Option<&str>) -> Option<String> {
        let text = justification?.trim();
        let visible = text.chars().filter(|ch| !ch.is_whitespace()).count();
        (visible >= self.min_justification_chars).then(|| text.to_string())
    }

    fn require_justification(
        &self,
        justification: Option<&str>,
    ) -> Result<String, MembershipError> {
        self.accepted_justification(justification)
            .ok_or(MembershipError::JustificationRequired {
                minimum: self.min_justification_chars,
            })
    }
}

impl Default for MembershipPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_JUSTIFICATION_CHARS)
    }
}

/// How a link action was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    AutoApproved,
    ExternalReview,
    CrossSectorReview,
    RemovalReview,
}

impl Routing {
    pub const fn requires_approval(self) -> bool {
        !matches!(self, Routing::AutoApproved)
    }
}

/// Warning for the caller: the member is leaving another group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferNotice {
    pub member_id: PersonId,
    pub from_group: String,
    pub to_group: String,
}

/// Engine output for a link or unlink action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkDecision {
    pub request: ChangeRequest,
    pub routing: Routing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferNotice>,
    /// Member record to persist right away; present only for auto-approved links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_update: Option<Collaborator>,
}

/// Stateless evaluator for membership changes.
#[derive(Debug, Clone, Default)]
pub struct MembershipEngine {
    policy: MembershipPolicy,
}

impl MembershipEngine {
    pub fn new(policy: MembershipPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MembershipPolicy {
        &self.policy
    }

    /// Route a request to add `target` to a group on behalf of `leader`.
    pub fn evaluate_link(
        &self,
        leader: &Leader,
        target: &Collaborator,
        action: &LinkAction,
        existing: &[ChangeRequest],
        now: DateTime<Utc>,
    ) -> Result<LinkDecision, MembershipError> {
        let group_name = action.group_name.trim();
        if group_name.is_empty() {
            return Err(MembershipError::MissingField("group_name"));
        }
        if target.name.trim().is_empty() {
            return Err(MembershipError::MissingField("member_name"));
        }

        let current_group = target.active_group();
        if let Some(current) = current_group {
            if same_label(current, group_name) {
                return Err(MembershipError::AlreadyInGroup {
                    member: target.id.clone(),
                    group: current.to_string(),
                });
            }
        }

        let duplicate = existing.iter().any(|request| {
            request.is_pending()
                && request.kind == RequestKind::Admission
                && request.member_id == target.id
                && same_label(&request.group_name, group_name)
        });
        if duplicate {
            return Err(MembershipError::DuplicatePending {
                member: target.id.clone(),
                group: group_name.to_string(),
            });
        }

        let external = target.is_external();
        let same_sector = !external && same_label(&target.sector, &leader.sector);
        let supplied_reason = action
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty());

        let mut admin_notes = Vec::new();
        let (routing, reason, justification) = if external {
            admin_notes.push("external person outside the HR registry".to_string());
            (
                Routing::ExternalReview,
                supplied_reason.unwrap_or(DEFAULT_EXTERNAL_REASON).to_string(),
                trimmed(action.justification.as_deref()),
            )
        } else if same_sector {
            (
                Routing::AutoApproved,
                SECTOR_MEMBER_REASON.to_string(),
                trimmed(action.justification.as_deref()),
            )
        } else {
            let justification = self
                .policy
                .require_justification(action.justification.as_deref())?;
            (
                Routing::CrossSectorReview,
                supplied_reason
                    .unwrap_or(DEFAULT_CROSS_SECTOR_REASON)
                    .to_string(),
                Some(justification),
            )
        };

        let transfer = current_group.map(|from| TransferNotice {
            member_id: target.id.clone(),
            from_group: from.to_string(),
            to_group: group_name.to_string(),
        });
        if let Some(notice) = &transfer {
            admin_notes.push(format!("transfer from {}", notice.from_group));
        }

        let status = if routing.requires_approval() {
            RequestStatus::Pending
        } else {
            RequestStatus::Approved
        };

        let request = ChangeRequest {
            id: RequestId::derive(RequestKind::Admission, group_name, &target.id, now),
            leader_id: leader.id.clone(),
            leader_name: leader.name.clone(),
            group_name: group_name.to_string(),
            member_id: target.id.clone(),
            member_name: target.name.trim().to_string(),
            member_sector: target.sector.clone(),
            kind: RequestKind::Admission,
            status,
            reason,
            justification,
            admin_notes,
            transfer_from: transfer.as_ref().map(|notice| notice.from_group.clone()),
            external,
            seen_by_leader: action.auto_seen && status == RequestStatus::Approved,
            seen_by_admin: false,
            created_at: now,
            resolved_at: (status == RequestStatus::Approved).then_some(now),
            resolved_by: None,
        };

        let member_update = (status == RequestStatus::Approved).then(|| Collaborator {
            group: Some(group_name.to_string()),
            active: true,
            ..target.clone()
        });

        Ok(LinkDecision {
            request,
            routing,
            transfer,
            member_update,
        })
    }

    /// Route a request to remove `member` from the group. Removals always wait for an admin.
    pub fn evaluate_unlink(
        &self,
        leader: &Leader,
        member: &Collaborator,
        action: &UnlinkAction,
        existing: &[ChangeRequest],
        now: DateTime<Utc>,
    ) -> Result<LinkDecision, MembershipError> {
        let group_name = action.group_name.trim();
        if group_name.is_empty() {
            return Err(MembershipError::MissingField("group_name"));
        }

        let assigned = member
            .active_group()
            .map(|current| same_label(current, group_name))
            .unwrap_or(false);
        if !assigned {
            return Err(MembershipError::NotInGroup {
                member: member.id.clone(),
                group: group_name.to_string(),
            });
        }

        let duplicate = existing.iter().any(|request| {
            request.is_pending()
                && request.kind == RequestKind::Removal
                && request.member_id == member.id
                && same_label(&request.group_name, group_name)
        });
        if duplicate {
            return Err(MembershipError::DuplicatePending {
                member: member.id.clone(),
                group: group_name.to_string(),
            });
        }

        let justification = self
            .policy
            .require_justification(action.justification.as_deref())?;

        let request = ChangeRequest {
            id: RequestId::derive(RequestKind::Removal, group_name, &member.id, now),
            leader_id: leader.id.clone(),
            leader_name: leader.name.clone(),
            group_name: group_name.to_string(),
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            member_sector: member.sector.clone(),
            kind: RequestKind::Removal,
            status: RequestStatus::Pending,
            reason: DEFAULT_REMOVAL_REASON.to_string(),
            justification: Some(justification),
            admin_notes: Vec::new(),
            transfer_from: None,
            external: member.is_external(),
            seen_by_leader: false,
            seen_by_admin: false,
            created_at: now,
            resolved_at: None,
            resolved_by: None,
        };

        Ok(LinkDecision {
            request,
            routing: Routing::RemovalReview,
            transfer: None,
            member_update: None,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
