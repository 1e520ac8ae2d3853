pub mod catalog_service;
pub mod conversation;
pub mod follow_up;
pub mod order_service;
