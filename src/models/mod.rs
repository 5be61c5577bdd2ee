pub mod date_range;
pub mod history;
pub mod snapshot;
