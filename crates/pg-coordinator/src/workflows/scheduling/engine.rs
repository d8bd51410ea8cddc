use chrono::NaiveDateTime;
use serde::Serialize;

use super::conflicts::{ChaplainConflict, ConflictDetector};
use super::domain::{ChaplainStatus, MeetingSchedule, ScheduleProposal};
use super::policy::{is_weekend, SchedulingPolicy};
use crate::workflows::directory::{same_label, Chaplain, ChaplainId, Leader};

/// Validation and state errors raised while planning a meeting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("chaplain coordination is not enabled for unit {unit}")]
    UnitNotEnabled { unit: String },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("every chaplain of {unit} is booked around {at}")]
    FullyBooked { unit: String, at: NaiveDateTime },
    #[error("chaplain {chaplain_id} is booked; next available at {next_available}")]
    ChaplainUnavailable {
        chaplain_id: ChaplainId,
        next_available: NaiveDateTime,
    },
    #[error("chaplain {0} is not active in this unit")]
    UnknownChaplain(ChaplainId),
}

impl SchedulingError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, SchedulingError::UnitNotEnabled { .. })
    }
}

/// Availability of one chaplain for a proposed slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChaplainAvailability {
    pub chaplain_id: ChaplainId,
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ChaplainConflict>,
}

/// Everything a leader needs to know about a slot before submitting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAssessment {
    pub scheduled_at: NaiveDateTime,
    pub weekend: bool,
    pub fully_booked: bool,
    pub chaplain_requests_allowed: bool,
    pub chaplains: Vec<ChaplainAvailability>,
}

impl SlotAssessment {
    pub fn availability(&self, chaplain_id: &ChaplainId) -> Option<&ChaplainAvailability> {
        self.chaplains
            .iter()
            .find(|entry| &entry.chaplain_id == chaplain_id)
    }

    pub fn available_chaplains(&self) -> impl Iterator<Item = &ChaplainAvailability> {
        self.chaplains.iter().filter(|entry| entry.available)
    }
}

/// Stateless planner applying unit eligibility, weekend and conflict rules.
#[derive(Debug, Clone, Default)]
pub struct SchedulingEngine {
    policy: SchedulingPolicy,
}

impl SchedulingEngine {
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    pub fn ensure_enabled(&self, unit: &str) -> Result<(), SchedulingError> {
        if self.policy.is_enabled_for(unit) {
            Ok(())
        } else {
            Err(SchedulingError::UnitNotEnabled {
                unit: unit.to_string(),
            })
        }
    }

    /// Evaluate chaplain availability for `leader`'s unit at `scheduled_at`.
    pub fn assess(
        &self,
        leader: &Leader,
        scheduled_at: NaiveDateTime,
        chaplains: &[Chaplain],
        schedules: &[MeetingSchedule],
    ) -> Result<SlotAssessment, SchedulingError> {
        self.ensure_enabled(&leader.unit)?;

        let detector = ConflictDetector::new(self.policy.conflict_window());
        let availability: Vec<ChaplainAvailability> = chaplains
            .iter()
            .filter(|chaplain| chaplain.active && same_label(&chaplain.unit, &leader.unit))
            .map(|chaplain| {
                let conflict =
                    detector.conflict_for(&chaplain.id, scheduled_at, schedules, &leader.id);
                ChaplainAvailability {
                    chaplain_id: chaplain.id.clone(),
                    name: chaplain.name.clone(),
                    available: conflict.is_none(),
                    conflict,
                }
            })
            .collect();

        let weekend = is_weekend(scheduled_at);
        let fully_booked =
            !availability.is_empty() && availability.iter().all(|entry| !entry.available);

        Ok(SlotAssessment {
            scheduled_at,
            weekend,
            fully_booked,
            chaplain_requests_allowed: !weekend && !fully_booked,
            chaplains: availability,
        })
    }

    /// Turn a leader's proposal into the schedule record to persist.
    pub fn plan(
        &self,
        leader: &Leader,
        proposal: &ScheduleProposal,
        chaplains: &[Chaplain],
        schedules: &[MeetingSchedule],
    ) -> Result<MeetingSchedule, SchedulingError> {
        self.ensure_enabled(&leader.unit)?;
        if leader.group_name.trim().is_empty() {
            return Err(SchedulingError::MissingField("group_name"));
        }

        let assessment = self.assess(leader, proposal.scheduled_at, chaplains, schedules)?;
        let request_chaplain = proposal.request_chaplain && !assessment.weekend;

        if request_chaplain && assessment.fully_booked {
            return Err(SchedulingError::FullyBooked {
                unit: leader.unit.clone(),
                at: proposal.scheduled_at,
            });
        }

        let preferred = if request_chaplain {
            proposal
                .preferred_chaplain_id
                .clone()
                .filter(|id| !id.as_str().trim().is_empty())
        } else {
            None
        };

        if let Some(chaplain_id) = &preferred {
            let availability = assessment
                .availability(chaplain_id)
                .ok_or_else(|| SchedulingError::UnknownChaplain(chaplain_id.clone()))?;
            if let Some(conflict) = &availability.conflict {
                return Err(SchedulingError::ChaplainUnavailable {
                    chaplain_id: chaplain_id.clone(),
                    next_available: conflict.next_available,
                });
            }
        }

        Ok(MeetingSchedule {
            leader_id: leader.id.clone(),
            leader_name: leader.name.clone(),
            group_name: leader.group_name.trim().to_string(),
            unit: leader.unit.clone(),
            scheduled_at: proposal.scheduled_at,
            request_chaplain,
            preferred_chaplain_id: preferred,
            chaplain_status: if request_chaplain {
                ChaplainStatus::Pending
            } else {
                ChaplainStatus::None
            },
            assigned_chaplain_id: None,
            chaplain_response: None,
            notes: proposal
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
        })
    }
}
