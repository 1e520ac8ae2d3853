pub mod dispatcher;
pub mod telegram;
