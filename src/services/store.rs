use crate::models::fixture::{FixtureSummary, ZoneAvailability, ZoneInventory};
use crate::models::ticket::{Order, OrderDraft};
use crate::services::payment::PaymentReceipt;
use crate::utils::error::AppResult;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Transactional persistence used by the booking services.
///
/// Every capacity-affecting write goes through [`BookingStore::begin_reservation`]:
/// the claim it takes on a (fixture, zone) inventory row is held until the
/// returned [`PendingReservation`] is committed, rolled back or dropped.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Capacity, price and issued count for a zone of a fixture.
    ///
    /// `None` when the fixture or zone is missing, or the zone belongs to a
    /// different stadium than the fixture.
    async fn zone_inventory(&self, fixture_id: i32, zone_id: i32) -> AppResult<Option<ZoneInventory>>;

    /// Claim `draft.requested_count` seats against the inventory snapshot.
    ///
    /// Returns `None` when the row changed since `inventory` was read or no
    /// longer has room; the caller should re-read and decide again.
    async fn begin_reservation(
        &self,
        inventory: &ZoneInventory,
        draft: &OrderDraft,
    ) -> AppResult<Option<Box<dyn PendingReservation>>>;

    /// Fixtures starting strictly after `from`, earliest first.
    async fn upcoming_fixtures(&self, from: NaiveDateTime) -> AppResult<Vec<FixtureSummary>>;

    /// `None` when the fixture does not exist.
    async fn zone_availability(&self, fixture_id: i32) -> AppResult<Option<Vec<ZoneAvailability>>>;

    async fn orders_for_account(&self, account_id: i32) -> AppResult<Vec<Order>>;
}

/// A claimed, not yet visible reservation.
#[async_trait]
pub trait PendingReservation: Send {
    /// Persist the order and its tickets and release the claim.
    async fn commit(self: Box<Self>, receipt: &PaymentReceipt) -> AppResult<Order>;

    /// Release the claim without persisting anything.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
