//! Meeting scheduling and chaplain conflict resolution.

pub mod conflicts;
pub mod domain;
mod engine;
pub mod policy;


pub use conflicts::{ChaplainConflict, ConflictDetector, ConflictKind};
pub use domain::{ChaplainStatus, MeetingSchedule, ScheduleProposal};
pub use engine::{ChaplainAvailability, SchedulingEngine, SchedulingError, SlotAssessment};
pub use policy::{is_weekend, SchedulingPolicy};
