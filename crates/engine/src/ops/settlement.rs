use sea_orm::{JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    EngineError, GroupSettlement, Money, ResultEngine, purchases,
    settlement::{balances, settle},
    splits::{self, Split},
};

use super::{Engine, normalize_required_id, with_tx};

impl Engine {
    /// Nets the whole purchase/split history of a group into payment
    /// instructions.
    ///
    /// Everything is read inside one DB transaction so the result reflects a
    /// single snapshot. Nothing is stored: call again to get a fresh view.
    pub async fn group_settlement(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<GroupSettlement> {
        let group_id = normalize_required_id(group_id, "group")?;
        with_tx!(self, |db_tx| {
            let (group, currency) = self.require_group(&db_tx, &group_id).await?;
            self.assert_member(&db_tx, user_id, &group.id).await?;

            let members = self.group_member_ids(&db_tx, &group.id).await?;
            let purchases = self.group_purchases(&db_tx, &group.id, currency).await?;
            let splits = splits::Entity::find()
                .join(JoinType::InnerJoin, splits::Relation::Purchases.def())
                .filter(purchases::Column::GroupId.eq(group.id.clone()))
                .order_by_asc(splits::Column::PurchaseId)
                .order_by_asc(splits::Column::Position)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Split::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let total_spend = Money::checked_sum(purchases.iter().map(|p| p.total_amount))
                .ok_or_else(|| {
                    EngineError::InvalidAmount("group total spend overflows".to_string())
                })?;
            let member_count = members.len() as u64;
            let average_per_person = if purchases.is_empty() {
                Money::ZERO
            } else {
                total_spend.div_round(member_count)
            };

            let balances = balances(&members, &purchases, &splits)?;
            let settlements = settle(&balances);
            tracing::debug!(
                group_id = %group.id,
                purchases = purchases.len(),
                settlements = settlements.len(),
                "settlement computed"
            );

            Ok(GroupSettlement {
                group_id: group.id,
                currency,
                total_spend,
                average_per_person,
                member_count,
                balances,
                settlements,
            })
        })
    }
}
