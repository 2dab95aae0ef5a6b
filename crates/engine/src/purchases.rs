//! Purchase records.
//!
//! A [`Purchase`] is one buying event inside a group: a member paid
//! `total_amount` for a set of line items on behalf of others. Purchases are
//! created by the purchasing workflow and are read-only to the engine.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, purchase_items::PurchaseItem};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub group_id: String,
    pub purchased_by: String,
    pub total_amount: Money,
    pub currency: Currency,
    pub purchased_at: DateTime<Utc>,
    pub items: Vec<PurchaseItem>,
}

impl Purchase {
    /// Total quantity across all line items.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub purchased_by: String,
    pub total_amount_minor: i64,
    pub currency: String,
    pub purchased_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::purchase_items::Entity")]
    PurchaseItems,
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::purchase_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseItems.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<(Model, Vec<PurchaseItem>)> for Purchase {
    type Error = EngineError;

    fn try_from((model, items): (Model, Vec<PurchaseItem>)) -> Result<Self, Self::Error> {
        if model.total_amount_minor < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "purchase {} has a negative total",
                model.id
            )));
        }
        Ok(Self {
            currency: Currency::try_from(model.currency.as_str())?,
            total_amount: Money::new(model.total_amount_minor),
            id: model.id,
            group_id: model.group_id,
            purchased_by: model.purchased_by,
            purchased_at: model.purchased_at,
            items,
        })
    }
}
