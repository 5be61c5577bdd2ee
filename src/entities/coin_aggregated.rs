//! `SeaORM` Entity for coin_aggregated table
//!
//! Rows are derived from `coin_raw` and only written by
//! `services::aggregate_store::refresh_month`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coin_aggregated")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub coin_id: String,
    /// First day of the month
    #[sea_orm(primary_key, auto_increment = false)]
    pub year_month: Date,
    #[sea_orm(column_type = "Double")]
    pub max_price: f64,
    #[sea_orm(column_type = "Double")]
    pub min_price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
