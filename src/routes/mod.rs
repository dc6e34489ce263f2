pub mod accommodation;
pub mod flight;
pub mod plan;
pub mod recovery;
