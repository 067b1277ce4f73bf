use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::cipher::mask_card_number;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// A non-BLOCKED card past its expiry date is EXPIRED. Recomputed on every
/// read and write pass, never cached.
pub fn effective_status(status: CardStatus, expiry_date: NaiveDate, today: NaiveDate) -> CardStatus {
    if expiry_date < today && status != CardStatus::Blocked {
        CardStatus::Expired
    } else {
        status
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    /// Ciphertext of the full card number; never leaves the service layer.
    pub card_number_encrypted: String,
    pub last_four_digits: String,
    pub user_id: i64,
    pub cardholder_name: String,
    pub expiry_date: NaiveDate,
    pub status: CardStatus,
    pub balance: BigDecimal,
    pub blocked_at: Option<DateTime<Utc>>,
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Folds the expiry recomputation into the entity; returns whether the
    /// stored status changed.
    pub fn refresh_status(&mut self, today: NaiveDate) -> bool {
        let refreshed = effective_status(self.status, self.expiry_date, today);
        let changed = refreshed != self.status;
        self.status = refreshed;
        changed
    }

    /// The single predicate the transfer engine consults before moving funds.
    pub fn is_operable(&self, today: NaiveDate) -> bool {
        self.status == CardStatus::Active && self.expiry_date >= today
    }

    pub fn block(&mut self, reason: &str, now: DateTime<Utc>) {
        self.status = CardStatus::Blocked;
        self.blocked_at = Some(now);
        self.block_reason = Some(reason.to_string());
    }

    /// Clears a block. Activation never resurrects an expired card.
    pub fn activate(&mut self, today: NaiveDate) {
        if self.expiry_date < today {
            self.status = CardStatus::Expired;
        } else {
            self.status = CardStatus::Active;
            self.blocked_at = None;
            self.block_reason = None;
        }
    }

    pub fn credit(&mut self, amount: &BigDecimal) -> Result<(), AppError> {
        if *amount <= BigDecimal::from(0) {
            return Err(AppError::InvalidAmount("Amount must be positive".to_string()));
        }
        self.balance = &self.balance + amount;
        Ok(())
    }

    pub fn debit(&mut self, amount: &BigDecimal) -> Result<(), AppError> {
        if *amount <= BigDecimal::from(0) {
            return Err(AppError::InvalidAmount("Amount must be positive".to_string()));
        }
        if self.balance < *amount {
            return Err(AppError::InsufficientBalance {
                required: amount.clone(),
                available: self.balance.clone(),
            });
        }
        self.balance = &self.balance - amount;
        Ok(())
    }

    pub fn masked_number(&self) -> String {
        mask_card_number(&self.last_four_digits)
    }
}

/// Insert payload for a new card; ids and timestamps are assigned by the
/// database.
#[derive(Debug)]
pub struct NewCard {
    pub card_number_encrypted: String,
    pub last_four_digits: String,
    pub user_id: i64,
    pub cardholder_name: String,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub source_card_id: i64,
    pub destination_card_id: i64,
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NewTransaction {
    pub source_card_id: i64,
    pub destination_card_id: i64,
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn decimal(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn test_card(id: i64, user_id: i64, balance: &str, expiry: NaiveDate) -> Card {
        let now = Utc::now();
        Card {
            id,
            card_number_encrypted: format!("ciphertext-{id}"),
            last_four_digits: "1111".to_string(),
            user_id,
            cardholder_name: "JOHN DOE".to_string(),
            expiry_date: expiry,
            status: CardStatus::Active,
            balance: decimal(balance),
            blocked_at: None,
            block_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn next_year() -> NaiveDate {
        today() + chrono::Duration::days(365)
    }

    #[test]
    fn credit_increases_balance() {
        let mut card = test_card(1, 1, "200.00", next_year());
        card.credit(&decimal("100.00")).unwrap();

        assert_eq!(card.balance, decimal("300.00"));
    }

    #[test]
    fn credit_rejects_non_positive_amounts() {
        let mut card = test_card(1, 1, "200.00", next_year());

        assert!(matches!(
            card.credit(&decimal("0")),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            card.credit(&decimal("-5.00")),
            Err(AppError::InvalidAmount(_))
        ));
        assert_eq!(card.balance, decimal("200.00"));
    }

    #[test]
    fn debit_decreases_balance() {
        let mut card = test_card(1, 1, "500.00", next_year());
        card.debit(&decimal("100.00")).unwrap();

        assert_eq!(card.balance, decimal("400.00"));
    }

    #[test]
    fn debit_never_overdraws() {
        let mut card = test_card(1, 1, "500.00", next_year());

        let err = card.debit(&decimal("600.00")).unwrap_err();
        match err {
            AppError::InsufficientBalance {
                required,
                available,
            } => {
                assert_eq!(required, decimal("600.00"));
                assert_eq!(available, decimal("500.00"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Balance unchanged on rejection.
        assert_eq!(card.balance, decimal("500.00"));
    }

    #[test]
    fn debit_allows_exact_balance() {
        let mut card = test_card(1, 1, "500.00", next_year());
        card.debit(&decimal("500.00")).unwrap();

        assert_eq!(card.balance, decimal("0.00"));
    }

    #[test]
    fn block_records_reason_and_timestamp() {
        let mut card = test_card(1, 1, "0.00", next_year());
        let now = Utc::now();
        card.block("lost", now);

        assert_eq!(card.status, CardStatus::Blocked);
        assert_eq!(card.blocked_at, Some(now));
        assert_eq!(card.block_reason.as_deref(), Some("lost"));
    }

    #[test]
    fn activate_clears_block_fields() {
        let mut card = test_card(1, 1, "0.00", next_year());
        card.block("lost", Utc::now());
        card.activate(today());

        assert_eq!(card.status, CardStatus::Active);
        assert_eq!(card.blocked_at, None);
        assert_eq!(card.block_reason, None);
    }

    #[test]
    fn activate_never_resurrects_an_expired_card() {
        let yesterday = today() - chrono::Duration::days(1);
        let mut card = test_card(1, 1, "0.00", yesterday);
        card.block("lost", Utc::now());
        card.activate(today());

        assert_eq!(card.status, CardStatus::Expired);
    }

    #[test]
    fn effective_status_expires_past_due_cards() {
        let yesterday = today() - chrono::Duration::days(1);

        assert_eq!(
            effective_status(CardStatus::Active, yesterday, today()),
            CardStatus::Expired
        );
        // A blocked card stays blocked even past expiry.
        assert_eq!(
            effective_status(CardStatus::Blocked, yesterday, today()),
            CardStatus::Blocked
        );
        assert_eq!(
            effective_status(CardStatus::Active, next_year(), today()),
            CardStatus::Active
        );
    }

    #[test]
    fn refresh_status_reports_changes() {
        let yesterday = today() - chrono::Duration::days(1);
        let mut card = test_card(1, 1, "0.00", yesterday);

        assert!(card.refresh_status(today()));
        assert_eq!(card.status, CardStatus::Expired);
        assert!(!card.refresh_status(today()));
    }

    #[test]
    fn operable_requires_active_and_unexpired() {
        let mut card = test_card(1, 1, "0.00", next_year());
        assert!(card.is_operable(today()));

        card.block("stolen", Utc::now());
        assert!(!card.is_operable(today()));

        let expired = test_card(2, 1, "0.00", today() - chrono::Duration::days(1));
        assert!(!expired.is_operable(today()));

        // Expiring today is still operable.
        let expiring = test_card(3, 1, "0.00", today());
        assert!(expiring.is_operable(today()));
    }

    #[test]
    fn masked_number_hides_all_but_last_four() {
        let card = test_card(1, 1, "0.00", next_year());
        assert_eq!(card.masked_number(), "**** **** **** 1111");
    }
}
