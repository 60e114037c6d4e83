use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A directed flight connection between two cities.
///
/// `from_city` and `to_city` are copies of `cities.name`. Renaming or deleting
/// a city has to cascade to these columns by hand.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connections")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub from_city: String,
    pub to_city: String,
    pub airfare: f64,
    pub duration: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
