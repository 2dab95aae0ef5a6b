use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Purchase, ResultEngine, SplitRequest, calculator,
    splits::{self, Split, SplitResult, SplitRule},
};

use super::{Engine, normalize_required_id, purchases::ensure_group_currency, with_tx};

impl Engine {
    /// Computes the split of a purchase without storing it.
    pub async fn preview_split(
        &self,
        purchase_id: &str,
        request: &SplitRequest,
        user_id: &str,
    ) -> ResultEngine<SplitResult> {
        let purchase_id = normalize_required_id(purchase_id, "purchase")?;
        with_tx!(self, |db_tx| {
            self.checked_split(&db_tx, &purchase_id, request, user_id)
                .await
        })
    }

    /// Computes the split of a purchase and stores it, replacing whatever
    /// split the purchase had before.
    ///
    /// Checks, computation, delete and insert run in one DB transaction: a
    /// concurrent reader sees either the old split set or the new one.
    pub async fn confirm_split(
        &self,
        purchase_id: &str,
        request: &SplitRequest,
        user_id: &str,
    ) -> ResultEngine<SplitResult> {
        let purchase_id = normalize_required_id(purchase_id, "purchase")?;
        with_tx!(self, |db_tx| {
            let result = self
                .checked_split(&db_tx, &purchase_id, request, user_id)
                .await?;
            self.replace_splits(&db_tx, &purchase_id, &result.splits)
                .await?;
            tracing::debug!(
                purchase_id = %result.purchase_id,
                rule = result.rule.as_str(),
                participants = result.splits.len(),
                "split stored"
            );
            Ok(result)
        })
    }

    /// Returns the split currently stored for a purchase.
    pub async fn split(&self, purchase_id: &str, user_id: &str) -> ResultEngine<SplitResult> {
        let purchase_id = normalize_required_id(purchase_id, "purchase")?;
        with_tx!(self, |db_tx| {
            let purchase = self.require_purchase(&db_tx, &purchase_id).await?;
            self.assert_member(&db_tx, user_id, &purchase.group_id)
                .await?;
            let splits = self.load_splits(&db_tx, &purchase_id).await?;
            let rule = splits[0].rule;
            Ok(split_result(purchase, rule, splits))
        })
    }

    /// Runs every check in order (purchase exists, caller is a member,
    /// request is well formed, participants are members), then computes.
    async fn checked_split(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
        request: &SplitRequest,
        user_id: &str,
    ) -> ResultEngine<SplitResult> {
        let purchase = self.require_purchase(db, purchase_id).await?;
        let (_, currency) = self.require_group(db, &purchase.group_id).await?;
        ensure_group_currency(currency, &purchase)?;
        self.assert_member(db, user_id, &purchase.group_id).await?;

        let participants = request.participants()?;
        self.assert_all_members(db, &participants, &purchase.group_id)
            .await?;

        let splits = calculator::compute(&purchase, request)?;
        Ok(split_result(purchase, request.rule, splits))
    }

    /// Deletes every stored split of the purchase and inserts `splits`.
    ///
    /// Must run inside the caller's transaction.
    async fn replace_splits(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
        splits: &[Split],
    ) -> ResultEngine<()> {
        splits::Entity::delete_many()
            .filter(splits::Column::PurchaseId.eq(purchase_id.to_string()))
            .exec(db)
            .await?;

        if splits.is_empty() {
            return Ok(());
        }
        let created_at = Utc::now();
        let models = splits
            .iter()
            .enumerate()
            .map(|(position, split)| {
                let position = i32::try_from(position).map_err(|_| {
                    EngineError::InvalidSplit("too many participants".to_string())
                })?;
                Ok(splits::ActiveModel::new(split, position, created_at))
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        splits::Entity::insert_many(models).exec(db).await?;
        Ok(())
    }

    /// Loads the stored split set of a purchase, in computed order.
    async fn load_splits(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
    ) -> ResultEngine<Vec<Split>> {
        let splits = splits::Entity::find()
            .filter(splits::Column::PurchaseId.eq(purchase_id.to_string()))
            .order_by_asc(splits::Column::Position)
            .all(db)
            .await?
            .into_iter()
            .map(Split::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        if splits.is_empty() {
            return Err(EngineError::KeyNotFound("split not exists".to_string()));
        }
        Ok(splits)
    }
}

fn split_result(purchase: Purchase, rule: SplitRule, splits: Vec<Split>) -> SplitResult {
    SplitResult {
        purchase_id: purchase.id,
        group_id: purchase.group_id,
        currency: purchase.currency,
        total_amount: purchase.total_amount,
        rule,
        splits,
    }
}
