//! Shared people, group and chaplain records consumed by the membership and scheduling
//! workflows.

pub mod domain;

pub use domain::{
    normalize_label, same_label, Chaplain, ChaplainId, Collaborator, Group, Leader, LeaderRole,
    PersonId, EXTERNAL_ID_PREFIX, EXTERNAL_SECTOR,
};
