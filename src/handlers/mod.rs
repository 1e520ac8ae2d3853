pub mod analytics;
pub mod orders;
pub mod prices;
