use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::{Validate, ValidationError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
}

/// Card details as entered at checkout. Only the shape is checked here;
/// approval is up to the payment gateway.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct PaymentInfo {
    pub method: PaymentMethod,

    #[validate(custom(function = "validate_card_number"))]
    pub card_number: String,

    #[validate(custom(function = "validate_cvv"))]
    pub cvv: String,

    // MM/YYYY
    #[validate(custom(function = "validate_expiry"))]
    pub expiry: String,
}

impl PaymentInfo {
    pub fn card_digits(&self) -> String {
        self.card_number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Last day the card is valid, if the expiry parses.
    pub fn expires_on(&self) -> Option<NaiveDate> {
        parse_expiry(&self.expiry)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct ReservationRequest {
    pub fixture_id: i32,
    pub zone_id: i32,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub requested_count: i32,

    #[validate(nested)]
    pub payment: PaymentInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Ticket {
    pub id: i32,
    pub order_id: i32,
    pub fixture_id: i32,
    pub zone_id: i32,
    pub account_id: i32,
    pub seat_number: i32,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Order {
    pub id: i32,
    pub account_id: i32,
    pub fixture_id: i32,
    pub zone_id: i32,
    pub no_of_tickets: i32,
    #[schemars(with = "String")]
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_ref: String,
    pub created_at: NaiveDateTime,
    pub tickets: Vec<Ticket>,
}

/// Everything a claimed reservation needs to become an order once paid.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub account_id: i32,
    pub fixture_id: i32,
    pub zone_id: i32,
    pub requested_count: i32,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OrderHistoryResponse {
    pub orders: Vec<Order>,
}

fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    let digits: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() == 16 && digits.iter().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("card_number").with_message("must be 16 digits".into()))
    }
}

fn validate_cvv(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("cvv").with_message("must be 3 digits".into()))
    }
}

fn validate_expiry(value: &str) -> Result<(), ValidationError> {
    match parse_expiry(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("expiry").with_message("must be MM/YYYY".into())),
    }
}

fn parse_expiry(value: &str) -> Option<NaiveDate> {
    let (month, year) = value.trim().split_once('/')?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    if year < 1000 {
        return None;
    }

    // a card is valid through the last day of its expiry month
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    NaiveDate::from_ymd_opt(year, month, 1)?;
    first_of_next.pred_opt()
}
