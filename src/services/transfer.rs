//! Transfer engine: atomic balance movement between two cards of one owner.
//!
//! The whole execution — debit, credit, both card writes, one transaction
//! record — happens inside a single database transaction. Card rows are
//! locked `FOR UPDATE` in ascending id order before validation, so
//! concurrent transfers touching the same card serialize and opposing
//! transfers cannot deadlock.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::models::{Card, NewTransaction, Transaction, TransactionStatus};
use crate::db::queries;
use crate::error::AppError;
use crate::pagination::{Page, Pagination};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_card_id: i64,
    pub to_card_id: i64,
    pub amount: BigDecimal,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub transaction_id: i64,
    pub from_card_id: i64,
    pub to_card_id: i64,
    pub amount: BigDecimal,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub id: i64,
    pub from_card_id: i64,
    pub to_card_id: i64,
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionView {
    fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            from_card_id: tx.source_card_id,
            to_card_id: tx.destination_card_id,
            amount: tx.amount.clone(),
            status: tx.status,
            description: tx.description.clone(),
            created_at: tx.created_at,
        }
    }
}

/// Validation order is fixed: the first failing check wins and nothing is
/// mutated before every check has passed.
pub fn validate_transfer(
    source: &Card,
    destination: &Card,
    amount: &BigDecimal,
    user_id: i64,
    today: NaiveDate,
) -> Result<(), AppError> {
    if source.id == destination.id {
        return Err(AppError::InvalidTransfer(
            "Cannot transfer to the same card".to_string(),
        ));
    }

    if source.user_id != user_id {
        return Err(AppError::InvalidTransfer(
            "Source card does not belong to user".to_string(),
        ));
    }
    if destination.user_id != user_id {
        return Err(AppError::InvalidTransfer(
            "Destination card does not belong to user".to_string(),
        ));
    }

    if !source.is_operable(today) {
        return Err(AppError::CardBlocked {
            card_id: source.id,
            reason: "Source card is not active".to_string(),
        });
    }
    if !destination.is_operable(today) {
        return Err(AppError::CardBlocked {
            card_id: destination.id,
            reason: "Destination card is not active".to_string(),
        });
    }

    if *amount <= BigDecimal::from(0) {
        return Err(AppError::InvalidTransfer(
            "Transfer amount must be positive".to_string(),
        ));
    }
    if fractional_digits(amount) > 2 {
        return Err(AppError::InvalidTransfer(
            "Transfer amount cannot have more than 2 decimal places".to_string(),
        ));
    }

    Ok(())
}

fn fractional_digits(amount: &BigDecimal) -> i64 {
    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    scale.max(0)
}

pub struct TransferService {
    pool: PgPool,
}

impl TransferService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn transfer(
        &self,
        request: TransferRequest,
        user_id: i64,
    ) -> Result<TransferResponse, AppError> {
        if let Some(description) = &request.description {
            validation::validate_description(description)?;
        }

        let mut tx = self.pool.begin().await?;

        // Lock in ascending id order; errors are still reported source-first.
        let (source, destination) = if request.from_card_id == request.to_card_id {
            let card = queries::lock_card(&mut tx, request.from_card_id).await?;
            (card.clone(), card)
        } else if request.from_card_id < request.to_card_id {
            let source = queries::lock_card(&mut tx, request.from_card_id).await?;
            let destination = queries::lock_card(&mut tx, request.to_card_id).await?;
            (source, destination)
        } else {
            let destination = queries::lock_card(&mut tx, request.to_card_id).await?;
            let source = queries::lock_card(&mut tx, request.from_card_id).await?;
            (source, destination)
        };

        let mut source = source.ok_or(AppError::CardNotFound(request.from_card_id))?;
        let mut destination = destination.ok_or(AppError::CardNotFound(request.to_card_id))?;

        let now = Utc::now();
        let today = now.date_naive();

        validate_transfer(&source, &destination, &request.amount, user_id, today)?;

        source.debit(&request.amount)?;
        destination.credit(&request.amount)?;

        source.updated_at = now;
        destination.updated_at = now;
        queries::update_card(&mut tx, &source).await?;
        queries::update_card(&mut tx, &destination).await?;

        let record = queries::insert_transaction(
            &mut tx,
            &NewTransaction {
                source_card_id: source.id,
                destination_card_id: destination.id,
                amount: request.amount.clone(),
                status: TransactionStatus::Completed,
                description: request.description,
                completed_at: Some(now),
            },
        )
        .await?;

        // All five effects become visible together, or not at all: an error
        // anywhere above rolls the transaction back on drop.
        tx.commit().await?;

        tracing::info!(
            transaction_id = record.id,
            from_card_id = source.id,
            to_card_id = destination.id,
            amount = %record.amount,
            "Transfer completed"
        );

        Ok(TransferResponse {
            transaction_id: record.id,
            from_card_id: source.id,
            to_card_id: destination.id,
            amount: record.amount.clone(),
            status: "SUCCESS".to_string(),
            message: "Transfer completed successfully".to_string(),
            timestamp: now,
        })
    }

    pub async fn get_transaction_history(
        &self,
        user_id: i64,
        pagination: Pagination,
    ) -> Result<Page<TransactionView>, AppError> {
        let transactions = queries::list_transactions_for_user(
            &self.pool,
            user_id,
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
        let total = queries::count_transactions_for_user(&self.pool, user_id).await?;

        let views = transactions
            .iter()
            .map(TransactionView::from_transaction)
            .collect();

        Ok(Page::new(views, total, &pagination))
    }
}
