//! Coordinator facade: loads snapshots, runs the engines, persists decisions and forwards
//! chaplain requests over the bridge.

pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use repository::{
    DirectorySnapshot, InMemoryDirectory, PersistenceSink, RepositoryError, SnapshotProvider,
};
pub use router::coordinator_router;
pub use service::{
    CoordinatorError, LinkCommand, LinkTarget, NotificationStatus, PgCoordinator,
    ScheduleSubmission, UnlinkCommand, Viewer,
};
