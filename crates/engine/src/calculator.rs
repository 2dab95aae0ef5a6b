//! Split calculator.
//!
//! Pure functions that divide a purchase total among participants. Every
//! rule ends with remainder reconciliation, so the shares of a computed split
//! always sum exactly to the purchase total.
//!
//! Tie-breaks for leftover minor units are fixed per rule:
//!
//! - `equal`: participants sorted by id, the first ones get one extra unit.
//! - `quantity` and `custom`: the first participant in input order absorbs
//!   the rounding difference.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Money, Percentage, Purchase, ResultEngine,
    money::{pro_rata, reconcile_remainder},
    splits::{Split, SplitRule},
};

/// A caller-supplied percentage for one participant of a custom split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSplit {
    pub user_id: String,
    pub percentage: Percentage,
}

/// What the caller asked for: a rule and who takes part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub rule: SplitRule,
    pub participant_ids: Vec<String>,
    pub custom_splits: Option<Vec<CustomSplit>>,
}

impl SplitRequest {
    /// Validates the request shape and returns the participant set, in the
    /// order the rule uses for its tie-break input.
    ///
    /// For the custom rule the participants are the users named in
    /// `custom_splits`; `participant_ids` may be left empty, otherwise it has
    /// to name exactly the same users.
    pub fn participants(&self) -> ResultEngine<Vec<&str>> {
        let participants: Vec<&str> = match self.rule {
            SplitRule::Equal | SplitRule::Quantity => {
                self.participant_ids.iter().map(String::as_str).collect()
            }
            SplitRule::Custom => {
                let custom = self.custom_splits()?;
                let ids: Vec<&str> = custom.iter().map(|c| c.user_id.as_str()).collect();
                if !self.participant_ids.is_empty() {
                    let named: HashSet<&str> =
                        self.participant_ids.iter().map(String::as_str).collect();
                    let custom_ids: HashSet<&str> = ids.iter().copied().collect();
                    if named != custom_ids || named.len() != self.participant_ids.len() {
                        return Err(EngineError::InvalidSplit(
                            "participant_ids do not match custom_splits".to_string(),
                        ));
                    }
                }
                ids
            }
        };

        if participants.is_empty() {
            return Err(EngineError::InvalidSplit(
                "at least one participant is required".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(participants.len());
        for id in &participants {
            if id.trim().is_empty() {
                return Err(EngineError::InvalidSplit(
                    "participant id must not be empty".to_string(),
                ));
            }
            if !seen.insert(*id) {
                return Err(EngineError::InvalidSplit(format!(
                    "duplicate participant: {id}"
                )));
            }
        }

        if self.rule == SplitRule::Custom {
            let sum: Percentage = self.custom_splits()?.iter().map(|c| c.percentage).sum();
            if !sum.is_whole() {
                return Err(EngineError::InvalidSplit(format!(
                    "custom percentages must sum to 100% (got {sum})"
                )));
            }
        }

        Ok(participants)
    }

    fn custom_splits(&self) -> ResultEngine<&[CustomSplit]> {
        match self.custom_splits.as_deref() {
            Some(custom) if !custom.is_empty() => Ok(custom),
            _ => Err(EngineError::InvalidSplit(
                "custom rule requires custom_splits".to_string(),
            )),
        }
    }
}

/// Computes the split of `purchase` described by `request`.
///
/// Pure and deterministic: identical inputs give identical outputs,
/// whatever order `participant_ids` arrives in for the equal rule.
pub fn compute(purchase: &Purchase, request: &SplitRequest) -> ResultEngine<Vec<Split>> {
    let participants = request.participants()?;
    let total = purchase.total_amount;
    if total.is_negative() {
        return Err(EngineError::InvalidAmount(
            "purchase total must not be negative".to_string(),
        ));
    }

    let shares: Vec<(&str, Money)> = if let [only] = participants.as_slice() {
        vec![(*only, total)]
    } else {
        match request.rule {
            SplitRule::Equal => equal(total, &participants),
            SplitRule::Quantity => quantity(total, purchase.total_quantity(), &participants),
            SplitRule::Custom => custom(total, request.custom_splits()?),
        }
    };

    Ok(shares
        .into_iter()
        .map(|(user_id, share_amount)| Split {
            purchase_id: purchase.id.clone(),
            user_id: user_id.to_string(),
            share_amount,
            rule: request.rule,
        })
        .collect())
}

/// `floor(total / n)` each, the first `total mod n` participants in id order
/// get one more unit.
fn equal<'a>(total: Money, participants: &[&'a str]) -> Vec<(&'a str, Money)> {
    let mut sorted = participants.to_vec();
    sorted.sort_unstable();

    let n = sorted.len() as i64;
    let base = total.minor() / n;
    let remainder = (total.minor() % n) as usize;
    let mut shares: Vec<Money> = (0..sorted.len())
        .map(|i| Money::new(if i < remainder { base + 1 } else { base }))
        .collect();
    reconcile_remainder(total, &mut shares);

    sorted.into_iter().zip(shares).collect()
}

/// Proportional to each participant's quantity out of the purchase's total
/// quantity.
///
/// Without per-participant item attribution every participant is credited
/// with `total_quantity / n`. A purchase without quantities falls back to the
/// equal rule.
fn quantity<'a>(
    total: Money,
    total_quantity: u64,
    participants: &[&'a str],
) -> Vec<(&'a str, Money)> {
    let n = participants.len() as u64;
    let Some(denominator) = total_quantity.checked_mul(n).filter(|d| *d > 0) else {
        return equal(total, participants);
    };
    // quantity_i / total_quantity == total_quantity / (total_quantity * n)
    let weights = vec![total_quantity; participants.len()];
    let shares = pro_rata(total, &weights, denominator);
    participants.iter().copied().zip(shares).collect()
}

/// `round(total * percentage / 100)` each, in the supplied order.
fn custom(total: Money, custom: &[CustomSplit]) -> Vec<(&str, Money)> {
    let weights: Vec<u64> = custom.iter().map(|c| c.percentage.units()).collect();
    let shares = pro_rata(total, &weights, Percentage::HUNDRED.units());
    custom.iter().map(|c| c.user_id.as_str()).zip(shares).collect()
}
