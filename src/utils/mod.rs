pub mod aggregator;
pub mod format;
pub mod time;
