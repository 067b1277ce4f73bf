use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::pagination::Pagination;
use crate::services::CardService;
use crate::services::card::{BlockCardRequest, CreateCardRequest};

fn card_service(state: &AppState) -> CardService {
    CardService::new(state.db.clone(), state.cipher.clone())
}

pub async fn create_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let card = card_service(&state)
        .create_card(request, user.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_my_cards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let cards = card_service(&state)
        .get_user_cards(user.user_id, pagination)
        .await?;

    Ok(Json(cards))
}

pub async fn get_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let card = card_service(&state).get_card(id, user.user_id).await?;

    Ok(Json(card))
}

pub async fn block_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(request): Json<BlockCardRequest>,
) -> Result<impl IntoResponse, AppError> {
    card_service(&state)
        .block_card(id, user.user_id, &request.reason)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_all_cards(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let cards = card_service(&state).get_all_cards(pagination).await?;

    Ok(Json(cards))
}

pub async fn activate_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    card_service(&state).activate_card(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    card_service(&state).delete_card(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
