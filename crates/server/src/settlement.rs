//! Settlement endpoint

use api_types::settlement::{BalanceView, SettlementResponse, SettlementView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    ServerError,
    convert::{currency_view, major},
    server::ServerState,
    user,
};

/// Handle requests for the settlement of a group.
pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<SettlementResponse>, ServerError> {
    let settlement = state
        .engine
        .group_settlement(&group_id, &user.username)
        .await?;
    let currency = settlement.currency;

    Ok(Json(SettlementResponse {
        group_id: settlement.group_id,
        currency: currency_view(currency),
        total_spend: major(settlement.total_spend, currency),
        average_per_person: major(settlement.average_per_person, currency),
        member_count: settlement.member_count,
        balances: settlement
            .balances
            .into_iter()
            .map(|balance| BalanceView {
                net: major(balance.net(), currency),
                paid: major(balance.paid, currency),
                owed: major(balance.owed, currency),
                user_id: balance.user_id,
            })
            .collect(),
        settlements: settlement
            .settlements
            .into_iter()
            .map(|s| SettlementView {
                debtor_id: s.debtor_id,
                creditor_id: s.creditor_id,
                amount: major(s.amount, currency),
            })
            .collect(),
    }))
}
