use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored document; `(collection, id)` is the primary key
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Collection name
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,

    /// Document id within the collection
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Record body
    pub data: Json,

    /// Version for optimistic locking
    pub version: i64,

    /// Creation time, epoch milliseconds
    pub created_at: i64,

    /// Last write time, epoch milliseconds
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
