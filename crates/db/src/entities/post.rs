//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post entity - a blog post with an attached image.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Post title.
    pub title: String,

    /// Short description shown in listings.
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Body content.
    #[sea_orm(column_type = "Text")]
    pub story: String,

    /// Public URL of the stored image.
    pub image_url: String,

    /// Media store key used to address/delete the stored image.
    pub image_key: String,

    /// When the post was created.
    pub created_at: DateTimeWithTimeZone,

    /// When the post was last updated. Initialized to the creation instant.
    #[sea_orm(indexed)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
