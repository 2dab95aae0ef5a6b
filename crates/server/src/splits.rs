//! Split endpoints: preview, confirm and read back the split of a purchase.

use api_types::splits::{SplitCalculate, SplitResponse, SplitView};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use engine::SplitResult;

use crate::{
    ServerError,
    convert::{currency_view, major, rule_view, split_request},
    server::ServerState,
    user,
};

fn split_response(result: SplitResult) -> SplitResponse {
    let currency = result.currency;
    SplitResponse {
        purchase_id: result.purchase_id,
        group_id: result.group_id,
        currency: currency_view(currency),
        total_amount: major(result.total_amount, currency),
        rule: rule_view(result.rule),
        splits: result
            .splits
            .into_iter()
            .map(|split| SplitView {
                user_id: split.user_id,
                share_amount: major(split.share_amount, currency),
            })
            .collect(),
    }
}

fn body(payload: Result<Json<SplitCalculate>, JsonRejection>) -> Result<SplitCalculate, ServerError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|err| ServerError::Generic(err.body_text()))
}

/// Handle requests for previewing a split. Nothing is stored.
pub async fn calculate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(purchase_id): Path<String>,
    payload: Result<Json<SplitCalculate>, JsonRejection>,
) -> Result<Json<SplitResponse>, ServerError> {
    let request = split_request(body(payload)?)?;
    let result = state
        .engine
        .preview_split(&purchase_id, &request, &user.username)
        .await?;

    Ok(Json(split_response(result)))
}

/// Handle requests for computing and storing a split, replacing the
/// previous one.
pub async fn confirm(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(purchase_id): Path<String>,
    payload: Result<Json<SplitCalculate>, JsonRejection>,
) -> Result<Json<SplitResponse>, ServerError> {
    let request = split_request(body(payload)?)?;
    let result = state
        .engine
        .confirm_split(&purchase_id, &request, &user.username)
        .await?;

    Ok(Json(split_response(result)))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(purchase_id): Path<String>,
) -> Result<Json<SplitResponse>, ServerError> {
    let result = state.engine.split(&purchase_id, &user.username).await?;

    Ok(Json(split_response(result)))
}
