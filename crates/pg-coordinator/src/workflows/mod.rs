pub mod bridge;
pub mod coordinator;
pub mod directory;
pub mod membership;
pub mod scheduling;
