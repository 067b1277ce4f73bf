//! End-to-end scenarios over the domain core: cipher, card lifecycle and the
//! transfer validation/execution rules, driven without a database.

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};
use std::str::FromStr;

use cardledger::cipher::{CardCipher, mask_card_number};
use cardledger::db::models::{Card, CardStatus, effective_status};
use cardledger::error::AppError;
use cardledger::services::transfer::validate_transfer;

fn decimal(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn card(id: i64, user_id: i64, balance: &str, expiry: NaiveDate) -> Card {
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

#[test]
fn created_card_is_masked_and_empty() {
    let cipher = CardCipher::new("s3cr3t-pass", "deadbeefdeadbeef").unwrap();
    let number = "4111111111111111";

    let encrypted = cipher.encrypt(number);
    let last_four = &number[number.len() - 4..];

    assert_ne!(encrypted, number);
    assert_eq!(cipher.decrypt(&encrypted).unwrap(), number);
    assert_eq!(mask_card_number(last_four), "**** **** **** 1111");

    let mut new_card = card(1, 1, "0.00", today() + Duration::days(730));
    new_card.last_four_digits = last_four.to_string();
    assert_eq!(new_card.status, CardStatus::Active);
    assert_eq!(new_card.balance, decimal("0.00"));
    assert_eq!(new_card.masked_number(), "**** **** **** 1111");
}

#[test]
fn successful_transfer_conserves_funds_and_records_once() {
    let expiry = today() + Duration::days(730);
    let mut source = card(1, 1, "500.00", expiry);
    let mut destination = card(2, 1, "200.00", expiry);
    let amount = decimal("100.00");
    let before = &source.balance + &destination.balance;

    validate_transfer(&source, &destination, &amount, 1, today()).unwrap();
    source.debit(&amount).unwrap();
    destination.credit(&amount).unwrap();

    assert_eq!(source.balance, decimal("400.00"));
    assert_eq!(destination.balance, decimal("300.00"));
    assert_eq!(&source.balance + &destination.balance, before);
}

#[test]
fn insufficient_balance_leaves_both_cards_untouched() {
    let expiry = today() + Duration::days(730);
    let mut source = card(1, 1, "500.00", expiry);
    let destination = card(2, 1, "200.00", expiry);
    let amount = decimal("600.00");

    validate_transfer(&source, &destination, &amount, 1, today()).unwrap();
    let err = source.debit(&amount).unwrap_err();

    match err {
        AppError::InsufficientBalance {
            required,
            available,
        } => {
            assert_eq!(required, decimal("600.00"));
            assert_eq!(available, decimal("500.00"));
            assert_eq!(&required - &available, decimal("100.00"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(source.balance, decimal("500.00"));
    assert_eq!(destination.balance, decimal("200.00"));
}

#[test]
fn same_card_transfer_is_rejected_before_any_mutation() {
    let expiry = today() + Duration::days(730);
    let source = card(1, 1, "500.00", expiry);
    let destination = source.clone();

    let err =
        validate_transfer(&source, &destination, &decimal("100.00"), 1, today()).unwrap_err();

    assert_eq!(err.to_string(), "Cannot transfer to the same card");
    assert_eq!(source.balance, decimal("500.00"));
}

#[test]
fn block_then_activate_restores_a_live_card() {
    let next_year = today() + Duration::days(365);
    let mut card = card(1, 1, "0.00", next_year);

    card.block("lost", Utc::now());
    assert_eq!(card.status, CardStatus::Blocked);
    assert!(card.blocked_at.is_some());
    assert_eq!(card.block_reason.as_deref(), Some("lost"));
    assert!(!card.is_operable(today()));

    card.activate(today());
    assert_eq!(card.status, CardStatus::Active);
    assert_eq!(card.blocked_at, None);
    assert_eq!(card.block_reason, None);
    assert!(card.is_operable(today()));
}

#[test]
fn past_expiry_is_reported_expired_on_next_pass() {
    let yesterday = today() - Duration::days(1);
    let mut card = card(1, 1, "0.00", yesterday);
    assert_eq!(card.status, CardStatus::Active);

    // Read-time recomputation.
    assert_eq!(
        effective_status(card.status, card.expiry_date, today()),
        CardStatus::Expired
    );

    // Write-time recomputation persists the correction.
    assert!(card.refresh_status(today()));
    assert_eq!(card.status, CardStatus::Expired);

    // Activation of an expired card never yields ACTIVE.
    card.activate(today());
    assert_eq!(card.status, CardStatus::Expired);
}

#[test]
fn transfers_between_owners_are_rejected_in_order() {
    let expiry = today() + Duration::days(730);
    let their_card = card(1, 2, "500.00", expiry);
    let my_card = card(2, 1, "200.00", expiry);

    let err =
        validate_transfer(&their_card, &my_card, &decimal("100.00"), 1, today()).unwrap_err();
    assert_eq!(err.to_string(), "Source card does not belong to user");

    let err =
        validate_transfer(&my_card, &their_card, &decimal("100.00"), 1, today()).unwrap_err();
    assert_eq!(err.to_string(), "Destination card does not belong to user");
}
