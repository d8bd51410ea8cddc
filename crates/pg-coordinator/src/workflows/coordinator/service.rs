use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{DirectorySnapshot, PersistenceSink, RepositoryError, SnapshotProvider};
use crate::workflows::bridge::{ChaplaincyBridge, VisitInvite};
use crate::workflows::directory::{Collaborator, Leader, PersonId};
use crate::workflows::membership::domain::slugify;
use crate::workflows::membership::{
    build_roster, ChangeRequest, LinkAction, LinkDecision, MembershipEngine, MembershipError,
    RequestId, Resolution, ResolutionOutcome, RosterEntry, UnlinkAction,
};
use crate::workflows::scheduling::{
    MeetingSchedule, ScheduleProposal, SchedulingEngine, SchedulingError, SlotAssessment,
};

/// Who the link action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkTarget {
    /// A collaborator already on record (HR-sourced or external).
    Member { id: PersonId },
    /// Someone outside the HR registry; a synthetic record is created if needed.
    ExternalPerson { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCommand {
    pub leader_id: PersonId,
    pub target: LinkTarget,
    #[serde(flatten)]
    pub action: LinkAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkCommand {
    pub leader_id: PersonId,
    pub member_id: PersonId,
    #[serde(flatten)]
    pub action: UnlinkAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewer {
    Leader,
    Admin,
}

/// Outcome of the chaplaincy notification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    NotRequested,
    Delivered,
    Failed { error: String },
}

/// Result of a schedule submission. The local write is committed even when notification fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSubmission {
    pub schedule: MeetingSchedule,
    pub committed: bool,
    pub notified: bool,
    pub notification: NotificationStatus,
}

/// Facade running the membership and scheduling engines against the external store and bridge.
pub struct PgCoordinator<R, B> {
    repository: Arc<R>,
    bridge: Arc<B>,
    membership: MembershipEngine,
    scheduling: SchedulingEngine,
}

impl<R, B> PgCoordinator<R, B>
where
    R: SnapshotProvider + PersistenceSink + 'static,
    B: ChaplaincyBridge + 'static,
{
    pub fn new(
        repository: Arc<R>,
        bridge: Arc<B>,
        membership: MembershipEngine,
        scheduling: SchedulingEngine,
    ) -> Self {
        Self {
            repository,
            bridge,
            membership,
            scheduling,
        }
    }

    pub fn scheduling(&self) -> &SchedulingEngine {
        &self.scheduling
    }

    /// Submit a link action, persisting the request and any immediate member assignment.
    pub fn link_member(&self, command: LinkCommand) -> Result<LinkDecision, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let leader = find_leader(&snapshot, &command.leader_id)?;
        ensure_open_group(&snapshot, &command.action.group_name)?;
        let now = Utc::now();

        let (target, created) = match &command.target {
            LinkTarget::Member { id } => {
                let member = snapshot
                    .collaborator(id)
                    .cloned()
                    .ok_or_else(|| CoordinatorError::UnknownMember(id.clone()))?;
                (member, false)
            }
            LinkTarget::ExternalPerson { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(MembershipError::MissingField("member_name").into());
                }
                match snapshot.external_by_name(name) {
                    Some(existing) => (existing.clone(), false),
                    None => {
                        let id = PersonId::external(&format!(
                            "{}-{}",
                            slugify(name),
                            now.timestamp_millis()
                        ));
                        (Collaborator::external(id, name), true)
                    }
                }
            }
        };

        let decision = self.membership.evaluate_link(
            leader,
            &target,
            &command.action,
            &snapshot.change_requests,
            now,
        )?;

        if created {
            self.repository.save_collaborator(target.clone())?;
        }
        // Assignment before its audit record: a retry after a failed write finds the member
        // already placed instead of approving a second request.
        if let Some(member) = &decision.member_update {
            self.repository.save_collaborator(member.clone())?;
        }
        self.repository
            .save_change_request(decision.request.clone())?;

        info!(
            request_id = %decision.request.id,
            group = %decision.request.group_name,
            member = %decision.request.member_id,
            status = decision.request.status.label(),
            transfer = decision.transfer.is_some(),
            "membership link recorded"
        );

        Ok(decision)
    }

    /// Submit a removal request for admin review.
    pub fn unlink_member(&self, command: UnlinkCommand) -> Result<LinkDecision, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let leader = find_leader(&snapshot, &command.leader_id)?;
        let member = snapshot
            .collaborator(&command.member_id)
            .ok_or_else(|| CoordinatorError::UnknownMember(command.member_id.clone()))?;

        let decision = self.membership.evaluate_unlink(
            leader,
            member,
            &command.action,
            &snapshot.change_requests,
            Utc::now(),
        )?;
        self.repository
            .save_change_request(decision.request.clone())?;

        info!(
            request_id = %decision.request.id,
            group = %decision.request.group_name,
            member = %decision.request.member_id,
            "membership removal requested"
        );

        Ok(decision)
    }

    /// Apply an administrator decision and persist the implied member change.
    pub fn resolve_request(
        &self,
        request_id: &RequestId,
        resolution: Resolution,
    ) -> Result<ResolutionOutcome, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let request = snapshot
            .change_request(request_id)
            .ok_or_else(|| CoordinatorError::UnknownRequest(request_id.clone()))?;
        let admin = find_administrator(&snapshot, &resolution.admin)?;
        let member = snapshot.collaborator(&request.member_id);

        let outcome = self
            .membership
            .resolve(request, member, &resolution, Utc::now())?;

        self.repository
            .save_change_request(outcome.request.clone())?;
        if let Some(member) = &outcome.member_update {
            self.repository.save_collaborator(member.clone())?;
        }

        info!(
            request_id = %outcome.request.id,
            status = outcome.request.status.label(),
            admin = %admin.id,
            "membership request resolved"
        );

        Ok(outcome)
    }

    /// Mark a request as seen by the leader or the admin.
    pub fn acknowledge(
        &self,
        request_id: &RequestId,
        viewer: Viewer,
    ) -> Result<ChangeRequest, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let mut request = snapshot
            .change_request(request_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownRequest(request_id.clone()))?;

        match viewer {
            Viewer::Leader => request.seen_by_leader = true,
            Viewer::Admin => request.seen_by_admin = true,
        }
        self.repository.save_change_request(request.clone())?;
        Ok(request)
    }

    /// Pending requests awaiting an administrator, oldest first.
    pub fn pending_requests(&self) -> Result<Vec<ChangeRequest>, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let mut pending: Vec<ChangeRequest> = snapshot
            .change_requests
            .into_iter()
            .filter(ChangeRequest::is_pending)
            .collect();
        pending.sort_by_key(|request| request.created_at);
        Ok(pending)
    }

    pub fn roster(&self, group_name: &str) -> Result<Vec<RosterEntry>, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        if !snapshot.knows_group(group_name) {
            return Err(CoordinatorError::UnknownGroup(group_name.to_string()));
        }
        Ok(build_roster(
            group_name,
            &snapshot.leaders,
            &snapshot.collaborators,
            &snapshot.change_requests,
        ))
    }

    pub fn assess_slot(
        &self,
        leader_id: &PersonId,
        scheduled_at: NaiveDateTime,
    ) -> Result<SlotAssessment, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let leader = find_leader(&snapshot, leader_id)?;
        Ok(self.scheduling.assess(
            leader,
            scheduled_at,
            &snapshot.chaplains,
            &snapshot.schedules,
        )?)
    }

    /// Commit the leader's new meeting slot, then notify the chaplaincy if a chaplain was
    /// requested. Notification failures are reported, never propagated.
    pub async fn submit_schedule(
        &self,
        proposal: ScheduleProposal,
    ) -> Result<ScheduleSubmission, CoordinatorError> {
        let snapshot = self.repository.snapshot()?;
        let leader = find_leader(&snapshot, &proposal.leader_id)?;
        let schedule = self.scheduling.plan(
            leader,
            &proposal,
            &snapshot.chaplains,
            &snapshot.schedules,
        )?;

        self.repository.save_schedule(schedule.clone())?;
        info!(
            leader = %schedule.leader_id,
            group = %schedule.group_name,
            scheduled_at = %schedule.scheduled_at,
            chaplain_status = schedule.chaplain_status.label(),
            "meeting schedule committed"
        );

        let notification = if schedule.request_chaplain {
            self.notify(&schedule, leader).await
        } else {
            NotificationStatus::NotRequested
        };

        Ok(ScheduleSubmission {
            notified: notification == NotificationStatus::Delivered,
            committed: true,
            schedule,
            notification,
        })
    }

    async fn notify(&self, schedule: &MeetingSchedule, leader: &Leader) -> NotificationStatus {
        let invite = VisitInvite::from_schedule(schedule, &leader.contact);
        match self.bridge.send_visit_invite(&invite).await {
            Ok(()) => {
                info!(group = %schedule.group_name, "chaplaincy invite delivered");
                NotificationStatus::Delivered
            }
            Err(err) => {
                warn!(
                    group = %schedule.group_name,
                    error = %err,
                    "chaplaincy invite failed; schedule kept"
                );
                NotificationStatus::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

fn find_leader<'a>(
    snapshot: &'a DirectorySnapshot,
    id: &PersonId,
) -> Result<&'a Leader, CoordinatorError> {
    snapshot
        .leader(id)
        .ok_or_else(|| CoordinatorError::UnknownLeader(id.clone()))
}

/// Leader with the ADMIN role matching `reference` by id or contact.
fn find_administrator<'a>(
    snapshot: &'a DirectorySnapshot,
    reference: &str,
) -> Result<&'a Leader, CoordinatorError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(MembershipError::MissingField("admin").into());
    }
    let found = snapshot.leaders.iter().find(|leader| {
        leader.id.as_str() == reference || leader.contact.eq_ignore_ascii_case(reference)
    });
    match found {
        Some(leader) if leader.is_admin() => Ok(leader),
        Some(leader) => {
            warn!(
                leader = %leader.id,
                role = leader.role.label(),
                "resolution refused; leader is not an administrator"
            );
            Err(CoordinatorError::NotAnAdministrator(reference.to_string()))
        }
        None => Err(CoordinatorError::NotAnAdministrator(reference.to_string())),
    }
}

/// Registered groups must be active to take members. A blank name is left to the engine.
fn ensure_open_group(
    snapshot: &DirectorySnapshot,
    group_name: &str,
) -> Result<(), CoordinatorError> {
    let group_name = group_name.trim();
    if group_name.is_empty() {
        return Ok(());
    }
    match snapshot.group(group_name) {
        Some(group) if !group.active => {
            Err(CoordinatorError::InactiveGroup(group.name.clone()))
        }
        Some(_) => Ok(()),
        None if snapshot.knows_group(group_name) => Ok(()),
        None => Err(CoordinatorError::UnknownGroup(group_name.to_string())),
    }
}

/// Error raised by the coordinator facade.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Membership(#[from] MembershipError),
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("unknown leader {0}")]
    UnknownLeader(PersonId),
    #[error("unknown member {0}")]
    UnknownMember(PersonId),
    #[error("unknown change request {0}")]
    UnknownRequest(RequestId),
    #[error("unknown group {0}")]
    UnknownGroup(String),
    #[error("group {0} is inactive")]
    InactiveGroup(String),
    #[error("{0} is not an administrator")]
    NotAnAdministrator(String),
}

impl CoordinatorError {
    pub fn is_validation(&self) -> bool {
        match self {
            CoordinatorError::Membership(err) => err.is_validation(),
            CoordinatorError::Scheduling(err) => err.is_validation(),
            CoordinatorError::InactiveGroup(_) => true,
            _ => false,
        }
    }
}
