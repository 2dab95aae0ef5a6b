//! Settlement netting.
//!
//! Settlement is a derived view: it is recomputed from the purchase and
//! split history on every request and never stored.
//!
//! For every user `paid` is the sum of the totals of the purchases they paid
//! for, `owed` the sum of their shares. `net = paid - owed`: positive means
//! the group owes them (creditor), negative means they owe the group
//! (debtor). The sum of all nets is zero.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, Purchase, ResultEngine, splits::Split};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub user_id: String,
    pub paid: Money,
    pub owed: Money,
}

impl MemberBalance {
    #[must_use]
    pub fn net(&self) -> Money {
        self.paid - self.owed
    }
}

/// `debtor_id` pays `amount` to `creditor_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementInstruction {
    pub debtor_id: String,
    pub creditor_id: String,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettlement {
    pub group_id: String,
    pub currency: Currency,
    pub total_spend: Money,
    pub average_per_person: Money,
    pub member_count: u64,
    pub balances: Vec<MemberBalance>,
    pub settlements: Vec<SettlementInstruction>,
}

/// Accumulates per-user balances, ordered by user id.
///
/// Every id in `members` gets an entry, even with no activity. Users that
/// show up in the history without being members (e.g. someone who left the
/// group) are kept too, otherwise the balances would not sum to zero.
///
/// Only purchases with a split set count: a purchase nobody has split yet
/// would credit its buyer without debiting anyone.
///
/// Fails with `InvalidAmount` if a member's `paid` or `owed` leaves the
/// `i64` range.
pub fn balances<S: AsRef<str>>(
    members: &[S],
    purchases: &[Purchase],
    splits: &[Split],
) -> ResultEngine<Vec<MemberBalance>> {
    let mut by_user: BTreeMap<String, MemberBalance> = BTreeMap::new();
    for member in members {
        balance_entry(&mut by_user, member.as_ref());
    }

    let split_purchases: HashSet<&str> = splits.iter().map(|s| s.purchase_id.as_str()).collect();
    for purchase in purchases {
        if split_purchases.contains(purchase.id.as_str()) {
            let entry = balance_entry(&mut by_user, &purchase.purchased_by);
            entry.paid = accumulate(entry.paid, purchase.total_amount, &entry.user_id)?;
        }
    }
    for split in splits {
        let entry = balance_entry(&mut by_user, &split.user_id);
        entry.owed = accumulate(entry.owed, split.share_amount, &entry.user_id)?;
    }

    Ok(by_user.into_values().collect())
}

fn accumulate(acc: Money, amount: Money, user_id: &str) -> ResultEngine<Money> {
    acc.checked_add(amount).ok_or_else(|| {
        EngineError::InvalidAmount(format!("balance of {user_id} overflows"))
    })
}

fn balance_entry<'m>(
    by_user: &'m mut BTreeMap<String, MemberBalance>,
    user_id: &str,
) -> &'m mut MemberBalance {
    by_user
        .entry(user_id.to_string())
        .or_insert_with(|| MemberBalance {
            user_id: user_id.to_string(),
            ..MemberBalance::default()
        })
}

/// Greedy netting of balances into payment instructions.
///
/// Creditors are sorted by balance and debtors by amount owed, both
/// descending with ties broken by user id. The largest remaining debtor pays
/// the largest remaining creditor `min(owed, due)`; whoever reaches zero is
/// passed over. Not guaranteed to use the fewest payments, but at most
/// `creditors + debtors - 1` of them, and the result is deterministic.
pub fn settle(balances: &[MemberBalance]) -> Vec<SettlementInstruction> {
    let mut creditors: Vec<(&str, Money)> = balances
        .iter()
        .filter(|b| b.net().is_positive())
        .map(|b| (b.user_id.as_str(), b.net()))
        .collect();
    let mut debtors: Vec<(&str, Money)> = balances
        .iter()
        .filter(|b| b.net().is_negative())
        .map(|b| (b.user_id.as_str(), -b.net()))
        .collect();
    let by_amount_desc = |a: &(&str, Money), b: &(&str, Money)| b.1.cmp(&a.1).then(a.0.cmp(b.0));
    creditors.sort_by(by_amount_desc);
    debtors.sort_by(by_amount_desc);

    let mut out = Vec::with_capacity(creditors.len() + debtors.len());
    let (mut c, mut d) = (0, 0);
    while c < creditors.len() && d < debtors.len() {
        let amount = creditors[c].1.min(debtors[d].1);
        out.push(SettlementInstruction {
            debtor_id: debtors[d].0.to_string(),
            creditor_id: creditors[c].0.to_string(),
            amount,
        });
        creditors[c].1 -= amount;
        debtors[d].1 -= amount;
        if creditors[c].1.is_zero() {
            c += 1;
        }
        if debtors[d].1.is_zero() {
            d += 1;
        }
    }
    out
}
