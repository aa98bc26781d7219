pub mod backend;
pub mod config;
pub mod punch;
pub mod utils;
pub mod verify;
