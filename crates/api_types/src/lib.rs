use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Jpy,
    Eur,
    Usd,
}

pub mod splits {
    use super::*;

    /// How a purchase total is divided among participants.
    ///
    /// - `equal`: same share for everyone, the remainder goes to the first
    ///   participants by user id.
    /// - `quantity`: proportional to item quantities.
    /// - `custom`: explicit percentages that must sum to 100.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SplitRule {
        Equal,
        Quantity,
        Custom,
    }

    /// Request body for previewing or confirming a split.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitCalculate {
        pub rule: SplitRule,
        /// Ignored for `custom` unless non-empty, in which case it must name
        /// the same users as `custom_splits`.
        #[serde(default)]
        pub participant_ids: Vec<String>,
        pub custom_splits: Option<Vec<CustomSplitView>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomSplitView {
        pub user_id: String,
        /// Percentage of the total, e.g. `33.3333`. At most 4 decimals are
        /// significant.
        pub percentage: Decimal,
    }

    /// One participant's share, in major units of the purchase currency.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub user_id: String,
        pub share_amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitResponse {
        pub purchase_id: String,
        pub group_id: String,
        pub currency: Currency,
        pub total_amount: Decimal,
        pub rule: SplitRule,
        pub splits: Vec<SplitView>,
    }
}

pub mod settlement {
    use super::*;

    /// What a member paid and owes. `net > 0` means the group owes them.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub user_id: String,
        pub paid: Decimal,
        pub owed: Decimal,
        pub net: Decimal,
    }

    /// `debtor_id` pays `amount` to `creditor_id`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub debtor_id: String,
        pub creditor_id: String,
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementResponse {
        pub group_id: String,
        pub currency: Currency,
        pub total_spend: Decimal,
        pub average_per_person: Decimal,
        pub member_count: u64,
        pub balances: Vec<BalanceView>,
        pub settlements: Vec<SettlementView>,
    }
}
