use crate::models::ticket::{Order, OrderDraft, OrderHistoryResponse, ReservationRequest};
use crate::services::payment::{PaymentGateway, PaymentReceipt};
use crate::services::store::BookingStore;
use crate::utils::config::RetryPolicy;
use crate::utils::error::{AppError, AppResult};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentGateway>,
    retry: RetryPolicy,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentGateway>,
        retry: RetryPolicy,
    ) -> Self {
        TicketService {
            store,
            payments,
            retry,
        }
    }

    /// Reserve `requested_count` seats in a zone of a fixture and record the sale.
    ///
    /// The capacity claim, the charge and the order insert form one unit: if the
    /// payment is declined the claim is rolled back and nothing is persisted,
    /// and if the order cannot be committed after a successful charge the
    /// charge is voided.
    /// A claim that loses a race to a concurrent reservation is retried up to
    /// `retry.max_attempts` times before failing with `Conflict`.
    pub async fn reserve(&self, account_id: i32, request: ReservationRequest) -> AppResult<Order> {
        request.validate()?;

        let mut attempts = 0;
        while attempts < self.retry.max_attempts {
            attempts += 1;

            let inventory = self
                .store
                .zone_inventory(request.fixture_id, request.zone_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Zone {} for fixture {}",
                        request.zone_id, request.fixture_id
                    ))
                })?;

            if inventory.starts_at() <= chrono::Local::now().naive_local() {
                return Err(AppError::ValidationError(format!(
                    "fixture_id: fixture {} is closed for booking",
                    request.fixture_id
                )));
            }

            if !inventory.can_accommodate(request.requested_count) {
                return Err(AppError::InsufficientCapacity {
                    requested: request.requested_count,
                    remaining: inventory.remaining(),
                });
            }

            let draft = OrderDraft {
                account_id,
                fixture_id: request.fixture_id,
                zone_id: request.zone_id,
                requested_count: request.requested_count,
                total_amount: inventory.price_per_seat * Decimal::from(request.requested_count),
                payment_method: request.payment.method,
            };

            let pending = match self.store.begin_reservation(&inventory, &draft).await? {
                Some(pending) => pending,
                None => {
                    tracing::warn!(
                        fixture_id = draft.fixture_id,
                        zone_id = draft.zone_id,
                        attempt = attempts,
                        "reservation claim lost to a concurrent booking"
                    );
                    if attempts < self.retry.max_attempts {
                        tokio::time::sleep(self.backoff(attempts)).await;
                    }
                    continue;
                }
            };

            let receipt = match self.payments.charge(&request.payment, draft.total_amount).await {
                Ok(receipt) => receipt,
                Err(declined) => {
                    if let Err(err) = pending.rollback().await {
                        tracing::error!(
                            fixture_id = draft.fixture_id,
                            zone_id = draft.zone_id,
                            error = %err,
                            "rollback after a declined payment failed"
                        );
                    }
                    tracing::warn!(
                        account_id,
                        fixture_id = draft.fixture_id,
                        zone_id = draft.zone_id,
                        reason = %declined,
                        "payment declined, reservation rolled back"
                    );
                    return Err(AppError::PaymentFailed(declined.to_string()));
                }
            };

            let order = match pending.commit(&receipt).await {
                Ok(order) => order,
                Err(err) => {
                    self.void_charge(&receipt, &draft, &err).await;
                    return Err(err);
                }
            };
            tracing::info!(
                order_id = order.id,
                account_id,
                fixture_id = order.fixture_id,
                zone_id = order.zone_id,
                tickets = order.no_of_tickets,
                "reservation committed"
            );
            return Ok(order);
        }

        Err(AppError::Conflict(format!(
            "Zone {} for fixture {} is busy, gave up after {} attempts",
            request.zone_id, request.fixture_id, attempts
        )))
    }

    pub async fn order_history(&self, account_id: i32) -> AppResult<OrderHistoryResponse> {
        let orders = self.store.orders_for_account(account_id).await?;
        tracing::debug!(account_id, orders = orders.len(), "loaded order history");
        Ok(OrderHistoryResponse { orders })
    }

    // the customer was charged but no order exists
    async fn void_charge(&self, receipt: &PaymentReceipt, draft: &OrderDraft, cause: &AppError) {
        match self.payments.void(receipt).await {
            Ok(()) => tracing::error!(
                account_id = draft.account_id,
                fixture_id = draft.fixture_id,
                zone_id = draft.zone_id,
                transaction_ref = %receipt.transaction_ref,
                error = %cause,
                "order commit failed, charge voided"
            ),
            Err(declined) => tracing::error!(
                account_id = draft.account_id,
                fixture_id = draft.fixture_id,
                zone_id = draft.zone_id,
                transaction_ref = %receipt.transaction_ref,
                amount = %receipt.amount,
                error = %cause,
                void_error = %declined,
                "order commit failed and the charge could not be voided"
            ),
        }
    }

    // linear backoff with full jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.retry.backoff.as_millis() as u64 * attempt as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling))
    }
}
