use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::pagination::Pagination;
use crate::services::TransferService;
use crate::services::transfer::TransferRequest;

pub async fn transfer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TransferRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = TransferService::new(state.db.clone())
        .transfer(request, user.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_transfer_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let history = TransferService::new(state.db.clone())
        .get_transaction_history(user.user_id, pagination)
        .await?;

    Ok(Json(history))
}
