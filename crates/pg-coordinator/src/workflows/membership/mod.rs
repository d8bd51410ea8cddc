//! Membership change workflow: approval routing for link/unlink actions, administrator
//! resolution and the derived roster of each group.

pub mod domain;
mod resolution;
pub mod roster;
mod routing;


pub use domain::{
    ChangeRequest, LinkAction, RequestId, RequestKind, RequestStatus, Resolution,
    ResolutionDecision, UnlinkAction,
};
pub use resolution::ResolutionOutcome;
pub use roster::{build_roster, leader_of, RosterEntry};
pub use routing::{
    LinkDecision, MembershipEngine, MembershipError, MembershipPolicy, Routing, TransferNotice,
    SECTOR_MEMBER_REASON,
};
