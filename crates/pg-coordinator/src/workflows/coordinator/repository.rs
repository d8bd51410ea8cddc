use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::workflows::directory::{same_label, Chaplain, Collaborator, Group, Leader, PersonId};
use crate::workflows::membership::{ChangeRequest, RequestId};
use crate::workflows::scheduling::MeetingSchedule;

/// Point-in-time copy of every record the engines decide against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub leaders: Vec<Leader>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub chaplains: Vec<Chaplain>,
    #[serde(default)]
    pub change_requests: Vec<ChangeRequest>,
    #[serde(default)]
    pub schedules: Vec<MeetingSchedule>,
}

impl DirectorySnapshot {
    pub fn leader(&self, id: &PersonId) -> Option<&Leader> {
        self.leaders.iter().find(|leader| &leader.id == id)
    }

    pub fn collaborator(&self, id: &PersonId) -> Option<&Collaborator> {
        self.collaborators.iter().find(|member| &member.id == id)
    }

    pub fn change_request(&self, id: &RequestId) -> Option<&ChangeRequest> {
        self.change_requests.iter().find(|request| &request.id == id)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| same_label(&group.name, name))
    }

    /// A group is known when it is registered or some leader claims it.
    pub fn knows_group(&self, name: &str) -> bool {
        self.group(name).is_some()
            || self
                .leaders
                .iter()
                .any(|leader| same_label(&leader.group_name, name))
    }

    /// Existing external record with the same (normalized) name, if any.
    pub fn external_by_name(&self, name: &str) -> Option<&Collaborator> {
        self.collaborators
            .iter()
            .find(|member| member.is_external() && same_label(&member.name, name))
    }
}

/// Supplies fresh snapshots before each decision.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> Result<DirectorySnapshot, RepositoryError>;
}

/// Accepts records produced by the engines. Upserts by natural key.
pub trait PersistenceSink: Send + Sync {
    fn save_change_request(&self, request: ChangeRequest) -> Result<(), RepositoryError>;
    fn save_schedule(&self, schedule: MeetingSchedule) -> Result<(), RepositoryError>;
    fn save_collaborator(&self, member: Collaborator) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Mutex-guarded snapshot used by the demo service and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<DirectorySnapshot>>,
}

impl InMemoryDirectory {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DirectorySnapshot>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("directory lock poisoned".to_string()))
    }
}

impl SnapshotProvider for InMemoryDirectory {
    fn snapshot(&self) -> Result<DirectorySnapshot, RepositoryError> {
        Ok(self.lock()?.clone())
    }
}

impl PersistenceSink for InMemoryDirectory {
    fn save_change_request(&self, request: ChangeRequest) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state
            .change_requests
            .iter_mut()
            .find(|existing| existing.id == request.id)
        {
            Some(existing) => *existing = request,
            None => state.change_requests.push(request),
        }
        Ok(())
    }

    fn save_schedule(&self, schedule: MeetingSchedule) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state
            .schedules
            .iter_mut()
            .find(|existing| existing.leader_id == schedule.leader_id)
        {
            Some(existing) => *existing = schedule,
            None => state.schedules.push(schedule),
        }
        Ok(())
    }

    fn save_collaborator(&self, member: Collaborator) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state
            .collaborators
            .iter_mut()
            .find(|existing| existing.id == member.id)
        {
            Some(existing) => *existing = member,
            None => state.collaborators.push(member),
        }
        Ok(())
    }
}
