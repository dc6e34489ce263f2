pub mod accommodation_service;
pub mod date_service;
pub mod flight_service;
pub mod plan_service;
pub mod recovery_service;
pub mod reorder_service;
pub mod schedule_order;
