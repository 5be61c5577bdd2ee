// src/lib.rs

pub mod config;
pub mod error;

pub mod entities {
    pub mod prelude;
    pub mod coin_raw;
    pub(crate) mod coin_aggregated;
}

pub mod services {
    pub mod coingecko;
    pub mod raw_store;
    pub mod aggregate_store;
    pub mod file_store;
}

pub mod jobs;
pub mod models;
