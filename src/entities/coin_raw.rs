//! `SeaORM` Entity for coin_raw table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coin_raw")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub coin_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    /// Full CoinGecko `/history` response, stored verbatim
    #[sea_orm(column_type = "Json")]
    pub response: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
