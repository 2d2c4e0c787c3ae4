use crate::models::ticket::PaymentInfo;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub transaction_ref: String,
    pub amount: Decimal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentDeclined {
    #[error("card number was rejected")]
    InvalidCard,

    #[error("card expired on {0}")]
    Expired(NaiveDate),

    #[error("{0}")]
    Gateway(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, payment: &PaymentInfo, amount: Decimal) -> Result<PaymentReceipt, PaymentDeclined>;

    /// Cancel a captured charge whose order could not be recorded.
    async fn void(&self, receipt: &PaymentReceipt) -> Result<(), PaymentDeclined>;
}

/// Stand-in processor: approves Luhn-valid cards that have not expired.
#[derive(Debug, Default, Clone)]
pub struct SimulatedPaymentGateway;

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(&self, payment: &PaymentInfo, amount: Decimal) -> Result<PaymentReceipt, PaymentDeclined> {
        if !luhn_valid(&payment.card_digits()) {
            return Err(PaymentDeclined::InvalidCard);
        }

        let today = chrono::Local::now().date_naive();
        match payment.expires_on() {
            Some(last_day) if last_day >= today => {}
            Some(last_day) => return Err(PaymentDeclined::Expired(last_day)),
            None => return Err(PaymentDeclined::InvalidCard),
        }

        Ok(PaymentReceipt {
            transaction_ref: Uuid::new_v4().to_string(),
            amount,
        })
    }

    async fn void(&self, receipt: &PaymentReceipt) -> Result<(), PaymentDeclined> {
        if Uuid::parse_str(&receipt.transaction_ref).is_err() {
            return Err(PaymentDeclined::Gateway(format!(
                "unknown transaction {}",
                receipt.transaction_ref
            )));
        }
        tracing::info!(transaction_ref = %receipt.transaction_ref, amount = %receipt.amount, "charge voided");
        Ok(())
    }
}

fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}
