use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::{ChangeRequest, RequestId, RequestKind};
use crate::workflows::directory::{same_label, Collaborator, Leader, PersonId};

/// One line of a group's effective roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RosterEntry {
    Leader {
        id: PersonId,
        name: String,
        sector: String,
    },
    Member {
        id: PersonId,
        name: String,
        sector: String,
        /// Sector differs from the leader's. Informational only.
        divergent: bool,
        external: bool,
    },
    PendingRequest {
        request_id: RequestId,
        id: PersonId,
        name: String,
        sector: String,
    },
}

impl RosterEntry {
    pub fn person_id(&self) -> &PersonId {
        match self {
            RosterEntry::Leader { id, .. }
            | RosterEntry::Member { id, .. }
            | RosterEntry::PendingRequest { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RosterEntry::Leader { name, .. }
            | RosterEntry::Member { name, .. }
            | RosterEntry::PendingRequest { name, .. } => name,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        !matches!(self, RosterEntry::PendingRequest { .. })
    }
}

/// Leader responsible for `group_name`, if one is on record.
pub fn leader_of<'a>(group_name: &str, leaders: &'a [Leader]) -> Option<&'a Leader> {
    leaders
        .iter()
        .find(|leader| same_label(&leader.group_name, group_name))
}

/// Derive the roster of a group: leader first, then confirmed members, then pending admissions.
/// An identity already listed is never repeated.
pub fn build_roster(
    group_name: &str,
    leaders: &[Leader],
    collaborators: &[Collaborator],
    requests: &[ChangeRequest],
) -> Vec<RosterEntry> {
    let mut seen: HashSet<PersonId> = HashSet::new();
    let mut roster = Vec::new();

    let leader = leader_of(group_name, leaders);
    if let Some(leader) = leader {
        seen.insert(leader.id.clone());
        roster.push(RosterEntry::Leader {
            id: leader.id.clone(),
            name: leader.name.clone(),
            sector: leader.sector.clone(),
        });
    }

    let mut members: Vec<&Collaborator> = collaborators
        .iter()
        .filter(|member| {
            member
                .active_group()
                .map(|group| same_label(group, group_name))
                .unwrap_or(false)
        })
        .collect();
    members.sort_by_key(|member| member.name.to_lowercase());

    for member in members {
        if !seen.insert(member.id.clone()) {
            continue;
        }
        let divergent = leader
            .map(|leader| !same_label(&leader.sector, &member.sector))
            .unwrap_or(false);
        roster.push(RosterEntry::Member {
            id: member.id.clone(),
            name: member.name.clone(),
            sector: member.sector.clone(),
            divergent,
            external: member.is_external(),
        });
    }

    for request in requests.iter().filter(|request| {
        request.is_pending()
            && request.kind == RequestKind::Admission
            && same_label(&request.group_name, group_name)
    }) {
        if !seen.insert(request.member_id.clone()) {
            continue;
        }
        roster.push(RosterEntry::PendingRequest {
            request_id: request.id.clone(),
            id: request.member_id.clone(),
            name: request.member_name.clone(),
            sector: request.member_sector.clone(),
        });
    }

    roster
}
