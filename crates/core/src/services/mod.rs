pub mod editor_service;
pub mod rebalance_service;
pub mod report_service;
pub mod validation_service;
