pub mod flight;
pub mod lodging;
pub mod plan;
