use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Currency, EngineError, Purchase, PurchaseItem, ResultEngine, purchase_items, purchases,
};

use super::Engine;

impl Engine {
    /// Loads a purchase together with its line items.
    pub(super) async fn require_purchase(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
    ) -> ResultEngine<Purchase> {
        let model = purchases::Entity::find_by_id(purchase_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("purchase not exists".to_string()))?;

        let items = purchase_items::Entity::find()
            .filter(purchase_items::Column::PurchaseId.eq(purchase_id.to_string()))
            .order_by_asc(purchase_items::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(PurchaseItem::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Purchase::try_from((model, items))
    }

    /// Loads every purchase of a group, oldest first.
    ///
    /// Line items are left empty: settlement only needs buyer and total.
    pub(super) async fn group_purchases(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        currency: Currency,
    ) -> ResultEngine<Vec<Purchase>> {
        purchases::Entity::find()
            .filter(purchases::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(purchases::Column::PurchasedAt)
            .order_by_asc(purchases::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|model| {
                let purchase = Purchase::try_from((model, Vec::new()))?;
                ensure_group_currency(currency, &purchase)?;
                Ok(purchase)
            })
            .collect()
    }
}

/// A purchase must be expressed in its group's currency; the engine never
/// converts.
pub(super) fn ensure_group_currency(group_currency: Currency, purchase: &Purchase) -> ResultEngine<()> {
    if purchase.currency != group_currency {
        return Err(EngineError::CurrencyMismatch(format!(
            "group currency is {}, purchase {} is in {}",
            group_currency.code(),
            purchase.id,
            purchase.currency.code()
        )));
    }
    Ok(())
}
