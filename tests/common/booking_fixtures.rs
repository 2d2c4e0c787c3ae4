#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use cricket_ticket_booking::models::fixture::{
    Fixture, FixtureSummary, ZoneAvailability, ZoneInventory, Zone,
};
use cricket_ticket_booking::models::ticket::{
    Order, OrderDraft, PaymentInfo, PaymentMethod, ReservationRequest,
};
use cricket_ticket_booking::services::memory_store::InMemoryBookingStore;
use cricket_ticket_booking::services::payment::{
    PaymentDeclined, PaymentGateway, PaymentReceipt, SimulatedPaymentGateway,
};
use cricket_ticket_booking::services::store::{BookingStore, PendingReservation};
use cricket_ticket_booking::services::ticket_service::TicketService;
use cricket_ticket_booking::utils::config::RetryPolicy;
use cricket_ticket_booking::utils::error::{AppError, AppResult};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A stadium with two zones, a second stadium with one zone, and one
/// upcoming fixture at the first stadium.
pub struct Venue {
    pub store: InMemoryBookingStore,
    pub fixture: Fixture,
    pub zone: Zone,
    pub second_zone: Zone,
    pub foreign_zone: Zone,
}

pub fn days_from_today(days: i64) -> NaiveDate {
    chrono::Local::now().date_naive() + Duration::days(days)
}

pub fn evening() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
    )
}

pub fn seed_venue(capacity: i32, price_per_seat: Decimal) -> Venue {
    let store = InMemoryBookingStore::new();
    let mi = store.add_team("Mumbai Indians", "MI");
    let csk = store.add_team("Chennai Super Kings", "CSK");

    let wankhede = store.add_stadium("Wankhede Stadium", "ws");
    let zone = store.add_zone(wankhede.id, "Zone A", capacity, price_per_seat);
    let second_zone = store.add_zone(wankhede.id, "Zone B", 2000, Decimal::new(200, 0));

    let kotla = store.add_stadium("Feroz Shah Kotla", "fsk");
    let foreign_zone = store.add_zone(kotla.id, "Zone A", 1000, Decimal::new(100, 0));

    let (start, end) = evening();
    let fixture = store.add_fixture(mi.id, csk.id, wankhede.id, days_from_today(30), start, end);

    Venue {
        store,
        fixture,
        zone,
        second_zone,
        foreign_zone,
    }
}

pub fn card() -> PaymentInfo {
    PaymentInfo {
        method: PaymentMethod::CreditCard,
        card_number: "4242 4242 4242 4242".to_string(),
        cvv: "123".to_string(),
        expiry: "12/2099".to_string(),
    }
}

pub fn request(fixture_id: i32, zone_id: i32, requested_count: i32) -> ReservationRequest {
    ReservationRequest {
        fixture_id,
        zone_id,
        requested_count,
        payment: card(),
    }
}

pub fn retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: std::time::Duration::from_millis(1),
    }
}

pub fn ticket_service<S>(store: S, max_attempts: u32) -> TicketService
where
    S: BookingStore + 'static,
{
    TicketService::new(Arc::new(store), Arc::new(SimulatedPaymentGateway), retry(max_attempts))
}

/// Declines every charge.
pub struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn charge(&self, _payment: &PaymentInfo, _amount: Decimal) -> Result<PaymentReceipt, PaymentDeclined> {
        Err(PaymentDeclined::Gateway("insufficient funds".to_string()))
    }

    async fn void(&self, _receipt: &PaymentReceipt) -> Result<(), PaymentDeclined> {
        Err(PaymentDeclined::Gateway("nothing to void".to_string()))
    }
}

/// Approves like the simulated gateway and counts captures and voids.
#[derive(Default)]
pub struct CountingGateway {
    pub charges: AtomicU32,
    pub voids: AtomicU32,
}

#[async_trait]
impl PaymentGateway for CountingGateway {
    async fn charge(&self, payment: &PaymentInfo, amount: Decimal) -> Result<PaymentReceipt, PaymentDeclined> {
        let receipt = SimulatedPaymentGateway.charge(payment, amount).await?;
        self.charges.fetch_add(1, Ordering::SeqCst);
        Ok(receipt)
    }

    async fn void(&self, receipt: &PaymentReceipt) -> Result<(), PaymentDeclined> {
        SimulatedPaymentGateway.void(receipt).await?;
        self.voids.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Which step of a pending reservation should fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breakage {
    Commit,
    Rollback,
}

/// Claims through the inner store, then fails the chosen step after
/// releasing the inner claim, the way a dropped connection would.
pub struct UnreliableStore {
    inner: InMemoryBookingStore,
    breakage: Breakage,
}

impl UnreliableStore {
    pub fn new(inner: InMemoryBookingStore, breakage: Breakage) -> Self {
        UnreliableStore { inner, breakage }
    }
}

struct UnreliablePending {
    inner: Box<dyn PendingReservation>,
    breakage: Breakage,
}

#[async_trait]
impl PendingReservation for UnreliablePending {
    async fn commit(self: Box<Self>, receipt: &PaymentReceipt) -> AppResult<Order> {
        if self.breakage == Breakage::Commit {
            self.inner.rollback().await?;
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }
        self.inner.commit(receipt).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.inner.rollback().await?;
        if self.breakage == Breakage::Rollback {
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for UnreliableStore {
    async fn zone_inventory(&self, fixture_id: i32, zone_id: i32) -> AppResult<Option<ZoneInventory>> {
        self.inner.zone_inventory(fixture_id, zone_id).await
    }

    async fn begin_reservation(
        &self,
        inventory: &ZoneInventory,
        draft: &OrderDraft,
    ) -> AppResult<Option<Box<dyn PendingReservation>>> {
        let Some(inner) = self.inner.begin_reservation(inventory, draft).await? else {
            return Ok(None);
        };
        Ok(Some(Box::new(UnreliablePending {
            inner,
            breakage: self.breakage,
        })))
    }

    async fn upcoming_fixtures(&self, from: NaiveDateTime) -> AppResult<Vec<FixtureSummary>> {
        self.inner.upcoming_fixtures(from).await
    }

    async fn zone_availability(&self, fixture_id: i32) -> AppResult<Option<Vec<ZoneAvailability>>> {
        self.inner.zone_availability(fixture_id).await
    }

    async fn orders_for_account(&self, account_id: i32) -> AppResult<Vec<Order>> {
        self.inner.orders_for_account(account_id).await
    }
}

/// Loses the first `conflicts` claims as if another booking got there first.
pub struct FlakyStore {
    inner: InMemoryBookingStore,
    conflicts_left: AtomicU32,
    pub claims_attempted: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: InMemoryBookingStore, conflicts: u32) -> Self {
        FlakyStore {
            inner,
            conflicts_left: AtomicU32::new(conflicts),
            claims_attempted: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl BookingStore for FlakyStore {
    async fn zone_inventory(&self, fixture_id: i32, zone_id: i32) -> AppResult<Option<ZoneInventory>> {
        self.inner.zone_inventory(fixture_id, zone_id).await
    }

    async fn begin_reservation(
        &self,
        inventory: &ZoneInventory,
        draft: &OrderDraft,
    ) -> AppResult<Option<Box<dyn PendingReservation>>> {
        self.claims_attempted.fetch_add(1, Ordering::SeqCst);
        let lost = self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if lost {
            return Ok(None);
        }
        self.inner.begin_reservation(inventory, draft).await
    }

    async fn upcoming_fixtures(&self, from: NaiveDateTime) -> AppResult<Vec<FixtureSummary>> {
        self.inner.upcoming_fixtures(from).await
    }

    async fn zone_availability(&self, fixture_id: i32) -> AppResult<Option<Vec<ZoneAvailability>>> {
        self.inner.zone_availability(fixture_id).await
    }

    async fn orders_for_account(&self, account_id: i32) -> AppResult<Vec<Order>> {
        self.inner.orders_for_account(account_id).await
    }
}
