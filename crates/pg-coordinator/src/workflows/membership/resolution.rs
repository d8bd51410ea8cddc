use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ChangeRequest, RequestKind, RequestStatus, Resolution, ResolutionDecision,
};
use super::routing::{MembershipEngine, MembershipError};
use crate::workflows::directory::{same_label, Collaborator};

/// Terminal request plus the member record the approval implies, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub request: ChangeRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_update: Option<Collaborator>,
}

impl MembershipEngine {
    /// Apply an administrator decision to a pending request.
    ///
    /// `member` is the current snapshot of the affected collaborator. An approved admission for a
    /// person with no record yet (typically an external contributor) creates one from the frozen
    /// request fields. Rejections never touch the member.
    pub fn resolve(
        &self,
        request: &ChangeRequest,
        member: Option<&Collaborator>,
        resolution: &Resolution,
        now: DateTime<Utc>,
    ) -> Result<ResolutionOutcome, MembershipError> {
        if request.status.is_terminal() {
            return Err(MembershipError::NotPending {
                id: request.id.clone(),
                status: request.status,
            });
        }
        if resolution.admin.trim().is_empty() {
            return Err(MembershipError::MissingField("admin"));
        }

        let mut resolved = request.clone();
        resolved.status = match resolution.decision {
            ResolutionDecision::Approve => RequestStatus::Approved,
            ResolutionDecision::Reject => RequestStatus::Rejected,
        };
        resolved.resolved_at = Some(now);
        resolved.resolved_by = Some(resolution.admin.trim().to_string());
        resolved.seen_by_admin = true;
        resolved.seen_by_leader = false;
        if let Some(note) = resolution
            .note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
        {
            resolved.admin_notes.push(note.to_string());
        }

        let member_update = match (resolved.status, request.kind) {
            (RequestStatus::Approved, RequestKind::Admission) => {
                let mut updated = member.cloned().unwrap_or_else(|| Collaborator {
                    id: request.member_id.clone(),
                    name: request.member_name.clone(),
                    sector: request.member_sector.clone(),
                    group: None,
                    active: true,
                });
                updated.group = Some(request.group_name.clone());
                updated.active = true;
                Some(updated)
            }
            (RequestStatus::Approved, RequestKind::Removal) => member
                .filter(|current| {
                    current
                        .group
                        .as_deref()
                        .map(|group| same_label(group, &request.group_name))
                        .unwrap_or(false)
                })
                .map(|current| Collaborator {
                    group: None,
                    ..current.clone()
                }),
            _ => None,
        };

        Ok(ResolutionOutcome {
            request: resolved,
            member_update,
        })
    }
}
