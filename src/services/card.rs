use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::cipher::CardCipher;
use crate::db::models::{Card, CardStatus, NewCard, effective_status};
use crate::db::queries;
use crate::error::AppError;
use crate::pagination::{Page, Pagination};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub card_number: String,
    pub cardholder_name: String,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct BlockCardRequest {
    pub reason: String,
}

/// Caller-facing card view. Carries only the masked number; neither the raw
/// nor the encrypted form ever crosses this boundary.
#[derive(Debug, Serialize)]
pub struct CardView {
    pub id: i64,
    pub masked_number: String,
    pub cardholder_name: String,
    pub expiry_date: NaiveDate,
    pub status: CardStatus,
    pub balance: BigDecimal,
}

impl CardView {
    fn from_card(card: &Card, today: NaiveDate) -> Self {
        Self {
            id: card.id,
            masked_number: card.masked_number(),
            cardholder_name: card.cardholder_name.clone(),
            expiry_date: card.expiry_date,
            // Expiry is recomputed on every read, never trusted from storage.
            status: effective_status(card.status, card.expiry_date, today),
            balance: card.balance.clone(),
        }
    }
}

pub struct CardService {
    pool: PgPool,
    cipher: Arc<CardCipher>,
}

impl CardService {
    pub fn new(pool: PgPool, cipher: Arc<CardCipher>) -> Self {
        Self { pool, cipher }
    }

    pub async fn create_card(
        &self,
        request: CreateCardRequest,
        owner_id: i64,
    ) -> Result<CardView, AppError> {
        let card_number = validation::sanitize_string(&request.card_number);
        let cardholder_name = validation::sanitize_string(&request.cardholder_name);
        let today = Utc::now().date_naive();

        validation::validate_card_number(&card_number)?;
        validation::validate_cardholder_name(&cardholder_name)?;
        validation::validate_expiry_date(request.expiry_date, today)?;

        if !queries::user_exists(&self.pool, owner_id).await? {
            return Err(AppError::UserNotFound(owner_id));
        }

        let encrypted = self.cipher.encrypt(&card_number);
        if queries::exists_card_number(&self.pool, &encrypted).await? {
            return Err(AppError::DuplicateCardNumber);
        }

        let last_four = card_number[card_number.len() - 4..].to_string();
        let card = queries::insert_card(
            &self.pool,
            &NewCard {
                card_number_encrypted: encrypted,
                last_four_digits: last_four,
                user_id: owner_id,
                cardholder_name,
                expiry_date: request.expiry_date,
            },
        )
        .await?;

        tracing::info!(card_id = card.id, user_id = owner_id, "Card created");

        Ok(CardView::from_card(&card, today))
    }

    pub async fn get_user_cards(
        &self,
        owner_id: i64,
        pagination: Pagination,
    ) -> Result<Page<CardView>, AppError> {
        let cards = queries::list_cards_for_owner(
            &self.pool,
            owner_id,
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
        let total = queries::count_cards_for_owner(&self.pool, owner_id).await?;

        let today = Utc::now().date_naive();
        let views = cards
            .iter()
            .map(|card| CardView::from_card(card, today))
            .collect();

        Ok(Page::new(views, total, &pagination))
    }

    /// Owner-scoped read: someone else's card is reported as not found.
    pub async fn get_card(&self, card_id: i64, owner_id: i64) -> Result<CardView, AppError> {
        let card = queries::get_card_for_owner(&self.pool, card_id, owner_id)
            .await?
            .ok_or(AppError::CardNotFound(card_id))?;

        Ok(CardView::from_card(&card, Utc::now().date_naive()))
    }

    /// Administrative: every card in the system, unscoped.
    pub async fn get_all_cards(&self, pagination: Pagination) -> Result<Page<CardView>, AppError> {
        let cards =
            queries::list_cards(&self.pool, pagination.limit(), pagination.offset()).await?;
        let total = queries::count_cards(&self.pool).await?;

        let today = Utc::now().date_naive();
        let views = cards
            .iter()
            .map(|card| CardView::from_card(card, today))
            .collect();

        Ok(Page::new(views, total, &pagination))
    }

    pub async fn block_card(
        &self,
        card_id: i64,
        owner_id: i64,
        reason: &str,
    ) -> Result<(), AppError> {
        let reason = validation::sanitize_string(reason);
        validation::validate_block_reason(&reason)?;

        let mut tx = self.pool.begin().await?;

        let mut card = queries::lock_card(&mut tx, card_id)
            .await?
            .filter(|card| card.user_id == owner_id)
            .ok_or(AppError::CardNotFound(card_id))?;

        let now = Utc::now();
        card.block(&reason, now);
        card.updated_at = now;
        queries::update_card(&mut tx, &card).await?;

        tx.commit().await?;

        tracing::info!(card_id, user_id = owner_id, "Card blocked");

        Ok(())
    }

    /// Administrative: lifts a block. A card past its expiry date comes back
    /// as EXPIRED, never ACTIVE.
    pub async fn activate_card(&self, card_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let mut card = queries::lock_card(&mut tx, card_id)
            .await?
            .ok_or(AppError::CardNotFound(card_id))?;

        let now = Utc::now();
        card.activate(now.date_naive());
        card.updated_at = now;
        queries::update_card(&mut tx, &card).await?;

        tx.commit().await?;

        tracing::info!(card_id, status = ?card.status, "Card activation processed");

        Ok(())
    }

    /// Administrative. Cards with transaction history are kept: the audit
    /// trail must not be orphaned or cascaded away.
    pub async fn delete_card(&self, card_id: i64) -> Result<(), AppError> {
        if !queries::card_exists(&self.pool, card_id).await? {
            return Err(AppError::CardNotFound(card_id));
        }

        if queries::count_transactions_for_card(&self.pool, card_id).await? > 0 {
            return Err(AppError::CardHasHistory(card_id));
        }

        queries::delete_card(&self.pool, card_id).await?;

        tracing::info!(card_id, "Card deleted");

        Ok(())
    }
}
