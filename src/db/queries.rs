use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};

use crate::db::models::{Card, NewCard, NewTransaction, Transaction};

// --- Card Queries ---

pub async fn insert_card(pool: &PgPool, card: &NewCard) -> Result<Card> {
    sqlx::query_as::<_, Card>(
        r#"
        INSERT INTO cards (
            card_number_encrypted, last_four_digits, user_id, cardholder_name, expiry_date
        ) VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&card.card_number_encrypted)
    .bind(&card.last_four_digits)
    .bind(card.user_id)
    .bind(&card.cardholder_name)
    .bind(card.expiry_date)
    .fetch_one(pool)
    .await
}

pub async fn get_card(pool: &PgPool, id: i64) -> Result<Option<Card>> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Owner-scoped lookup: a card that exists but belongs to another user is
/// indistinguishable from an absent one.
pub async fn get_card_for_owner(pool: &PgPool, id: i64, user_id: i64) -> Result<Option<Card>> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_card_by_number(pool: &PgPool, card_number_encrypted: &str) -> Result<Option<Card>> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE card_number_encrypted = $1")
        .bind(card_number_encrypted)
        .fetch_optional(pool)
        .await
}

pub async fn exists_card_number(pool: &PgPool, card_number_encrypted: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM cards WHERE card_number_encrypted = $1)",
    )
    .bind(card_number_encrypted)
    .fetch_one(pool)
    .await
}

pub async fn card_exists(pool: &PgPool, id: i64) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM cards WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_cards_for_owner(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Card>> {
    sqlx::query_as::<_, Card>(
        "SELECT * FROM cards WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_cards_for_owner(pool: &PgPool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn list_cards(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Card>> {
    sqlx::query_as::<_, Card>(
        "SELECT * FROM cards ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_cards(pool: &PgPool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards")
        .fetch_one(pool)
        .await
}

/// Row-locked load inside a unit of work. Concurrent transfers and lifecycle
/// mutations on the same card serialize on this lock.
pub async fn lock_card(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: i64,
) -> Result<Option<Card>> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

pub async fn update_card(
    executor: &mut SqlxTransaction<'_, Postgres>,
    card: &Card,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE cards
        SET status = $1, balance = $2, blocked_at = $3, block_reason = $4, updated_at = $5
        WHERE id = $6
        "#,
    )
    .bind(card.status)
    .bind(&card.balance)
    .bind(card.blocked_at)
    .bind(&card.block_reason)
    .bind(card.updated_at)
    .bind(card.id)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

pub async fn delete_card(pool: &PgPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cards WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

// --- Transaction Queries ---

pub async fn insert_transaction(
    executor: &mut SqlxTransaction<'_, Postgres>,
    tx: &NewTransaction,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            source_card_id, destination_card_id, amount, status, description, completed_at
        ) VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(tx.source_card_id)
    .bind(tx.destination_card_id)
    .bind(&tx.amount)
    .bind(tx.status)
    .bind(&tx.description)
    .bind(tx.completed_at)
    .fetch_one(&mut **executor)
    .await
}

/// History for a user: every transaction touching one of their cards as
/// source or destination, newest first (id breaks created_at ties).
pub async fn list_transactions_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT t.*
        FROM transactions t
        JOIN cards s ON t.source_card_id = s.id
        JOIN cards d ON t.destination_card_id = d.id
        WHERE s.user_id = $1 OR d.user_id = $1
        ORDER BY t.created_at DESC, t.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_transactions_for_user(pool: &PgPool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM transactions t
        JOIN cards s ON t.source_card_id = s.id
        JOIN cards d ON t.destination_card_id = d.id
        WHERE s.user_id = $1 OR d.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn count_transactions_for_card(pool: &PgPool, card_id: i64) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM transactions WHERE source_card_id = $1 OR destination_card_id = $1",
    )
    .bind(card_id)
    .fetch_one(pool)
    .await
}

// --- User Queries ---

pub async fn user_exists(pool: &PgPool, id: i64) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}
