pub mod bulletin;
pub mod error;
pub mod snapshot;
pub mod types;
pub mod weather;
