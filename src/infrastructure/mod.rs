pub mod catalog_repo;
pub mod json_store;
pub mod models;
pub mod order_repo;
pub mod report;
pub mod session_store;
