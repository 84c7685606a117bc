pub mod arena;
pub mod bot_profiles;
pub mod bot_strategy;
pub mod models;
pub mod simulator;
