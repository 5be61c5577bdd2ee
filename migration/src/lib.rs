pub use sea_orm_migration::prelude::*;

mod m20220410_000001_create_coin_raw;
mod m20220410_000002_create_coin_aggregated;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220410_000001_create_coin_raw::Migration),
            Box::new(m20220410_000002_create_coin_aggregated::Migration),
        ]
    }
}
