pub use super::coin_raw::Entity as CoinRaw;
pub(crate) use super::coin_aggregated::Entity as CoinAggregated;
