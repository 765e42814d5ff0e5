pub mod harvest;
pub mod sources;

// Re-export command functions for convenience
pub use harvest::{harvest, HarvestArgs};
pub use sources::sources;
