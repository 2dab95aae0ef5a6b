//! Split records.
//!
//! A [`Split`] is one participant's share of one purchase. For a given
//! purchase the stored shares always sum exactly to the purchase total; the
//! set is only ever replaced as a whole.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money};

/// How a purchase total was divided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    Equal,
    Quantity,
    Custom,
}

impl SplitRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Quantity => "quantity",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for SplitRule {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "quantity" => Ok(Self::Quantity),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::InvalidSplit(format!(
                "invalid split rule: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub purchase_id: String,
    pub user_id: String,
    pub share_amount: Money,
    pub rule: SplitRule,
}

/// A complete split of one purchase, as previewed or as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub purchase_id: String,
    pub group_id: String,
    pub currency: Currency,
    pub total_amount: Money,
    pub rule: SplitRule,
    pub splits: Vec<Split>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub purchase_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub share_amount_minor: i64,
    pub rule: String,
    /// Position of the share in the computed split, so a stored split reads
    /// back in the order it was computed.
    pub position: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchases::Entity",
        from = "Column::PurchaseId",
        to = "super::purchases::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Purchases,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new(split: &Split, position: i32, created_at: DateTime<Utc>) -> Self {
        Self {
            purchase_id: ActiveValue::Set(split.purchase_id.clone()),
            user_id: ActiveValue::Set(split.user_id.clone()),
            share_amount_minor: ActiveValue::Set(split.share_amount.minor()),
            rule: ActiveValue::Set(split.rule.as_str().to_string()),
            position: ActiveValue::Set(position),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for Split {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            rule: SplitRule::try_from(model.rule.as_str())?,
            share_amount: Money::new(model.share_amount_minor),
            purchase_id: model.purchase_id,
            user_id: model.user_id,
        })
    }
}
