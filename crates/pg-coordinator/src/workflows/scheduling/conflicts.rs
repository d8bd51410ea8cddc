use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::domain::{ChaplainStatus, MeetingSchedule};
use crate::workflows::directory::{ChaplainId, PersonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The chaplain confirmed another meeting; protected regardless of distance.
    Confirmed,
    /// Another meeting for the chaplain sits inside the conflict window.
    WithinWindow,
}

/// Existing booking that blocks a chaplain for a proposed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChaplainConflict {
    pub chaplain_id: ChaplainId,
    pub group_name: String,
    pub scheduled_at: NaiveDateTime,
    pub kind: ConflictKind,
    /// Advisory only: the conflicting meeting time plus the window.
    pub next_available: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ConflictDetector {
    window: Duration,
}

impl ConflictDetector {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Check `chaplain_id` against every schedule except those owned by `requesting_leader`.
    ///
    /// A confirmed meeting blocks only the chaplain assigned to it, at any distance. Other
    /// meetings holding the chaplain block within the window. Confirmed bookings take precedence
    /// over window overlaps; among bookings of the same kind the latest one is reported so
    /// `next_available` clears all of them.
    pub fn conflict_for(
        &self,
        chaplain_id: &ChaplainId,
        proposed: NaiveDateTime,
        schedules: &[MeetingSchedule],
        requesting_leader: &PersonId,
    ) -> Option<ChaplainConflict> {
        schedules
            .iter()
            .filter(|schedule| &schedule.leader_id != requesting_leader)
            .filter(|schedule| schedule.chaplain_status != ChaplainStatus::Declined)
            .filter_map(|schedule| {
                let kind = if schedule.chaplain_status == ChaplainStatus::Confirmed
                    && schedule.is_assigned_to(chaplain_id)
                {
                    ConflictKind::Confirmed
                } else if schedule.holds(chaplain_id)
                    && gap(schedule.scheduled_at, proposed) < self.window
                {
                    ConflictKind::WithinWindow
                } else {
                    return None;
                };
                Some((kind, schedule))
            })
            .max_by_key(|(kind, schedule)| {
                (*kind == ConflictKind::Confirmed, schedule.scheduled_at)
            })
            .map(|(kind, schedule)| ChaplainConflict {
                chaplain_id: chaplain_id.clone(),
                group_name: schedule.group_name.clone(),
                scheduled_at: schedule.scheduled_at,
                kind,
                next_available: schedule
                    .scheduled_at
                    .checked_add_signed(self.window)
                    .unwrap_or(NaiveDateTime::MAX),
            })
    }
}

fn gap(left: NaiveDateTime, right: NaiveDateTime) -> Duration {
    if left >= right {
        left - right
    } else {
        right - left
    }
}
