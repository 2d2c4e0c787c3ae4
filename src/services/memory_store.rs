use crate::models::fixture::{
    Fixture, FixtureSummary, Stadium, Team, Zone, ZoneAvailability, ZoneInventory,
};
use crate::models::ticket::{Order, OrderDraft, Ticket};
use crate::services::payment::PaymentReceipt;
use crate::services::store::{BookingStore, PendingReservation};
use crate::utils::error::AppResult;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

type PairKey = (i32, i32);

#[derive(Debug, Default, Clone, Copy)]
struct InventoryRow {
    issued: i32,
    version: i32,
}

#[derive(Default)]
struct Catalog {
    next_id: i32,
    teams: HashMap<i32, Team>,
    stadiums: HashMap<i32, Stadium>,
    zones: HashMap<i32, Zone>,
    fixtures: HashMap<i32, Fixture>,
    inventory: HashMap<PairKey, InventoryRow>,
    row_locks: HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>,
    orders: Vec<Order>,
}

impl Catalog {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    // zone must sit in the fixture's stadium
    fn pair(&self, fixture_id: i32, zone_id: i32) -> Option<(&Fixture, &Zone)> {
        let fixture = self.fixtures.get(&fixture_id)?;
        let zone = self
            .zones
            .get(&zone_id)
            .filter(|zone| zone.stadium_id == fixture.stadium_id)?;
        Some((fixture, zone))
    }
}

/// Process-local [`BookingStore`].
///
/// Committed state lives behind one mutex; each (fixture, zone) pair also has
/// an async row lock that a pending reservation holds until it finishes,
/// mirroring the row lock a MySQL claim takes.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    catalog: Arc<Mutex<Catalog>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn catalog(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_team(&self, name: &str, abbr: &str) -> Team {
        let mut catalog = self.catalog();
        let team = Team {
            id: catalog.next_id(),
            name: name.to_string(),
            abbr: abbr.to_string(),
        };
        catalog.teams.insert(team.id, team.clone());
        team
    }

    pub fn add_stadium(&self, name: &str, abbr: &str) -> Stadium {
        let mut catalog = self.catalog();
        let stadium = Stadium {
            id: catalog.next_id(),
            name: name.to_string(),
            abbr: abbr.to_string(),
        };
        catalog.stadiums.insert(stadium.id, stadium.clone());
        stadium
    }

    pub fn add_zone(&self, stadium_id: i32, name: &str, capacity: i32, price_per_seat: Decimal) -> Zone {
        let mut catalog = self.catalog();
        let zone = Zone {
            id: catalog.next_id(),
            stadium_id,
            name: name.to_string(),
            capacity,
            price_per_seat,
        };
        catalog.zones.insert(zone.id, zone.clone());
        zone
    }

    pub fn add_fixture(
        &self,
        team_one_id: i32,
        team_two_id: i32,
        stadium_id: i32,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Fixture {
        let mut catalog = self.catalog();
        let fixture = Fixture {
            id: catalog.next_id(),
            team_one_id,
            team_two_id,
            stadium_id,
            date,
            start_time,
            end_time,
        };
        catalog.fixtures.insert(fixture.id, fixture.clone());
        fixture
    }

    /// Committed tickets for a (fixture, zone) pair.
    pub fn ticket_count(&self, fixture_id: i32, zone_id: i32) -> usize {
        self.catalog()
            .orders
            .iter()
            .filter(|o| o.fixture_id == fixture_id && o.zone_id == zone_id)
            .map(|o| o.tickets.len())
            .sum()
    }

    pub fn order_count(&self) -> usize {
        self.catalog().orders.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn zone_inventory(&self, fixture_id: i32, zone_id: i32) -> AppResult<Option<ZoneInventory>> {
        let mut catalog = self.catalog();
        let Some((fixture, zone)) = catalog.pair(fixture_id, zone_id) else {
            return Ok(None);
        };
        let (capacity, price_per_seat) = (zone.capacity, zone.price_per_seat);
        let (fixture_date, fixture_start) = (fixture.date, fixture.start_time);

        let row = *catalog.inventory.entry((fixture_id, zone_id)).or_default();
        Ok(Some(ZoneInventory {
            fixture_id,
            zone_id,
            capacity,
            price_per_seat,
            issued: row.issued,
            version: row.version,
            fixture_date,
            fixture_start,
        }))
    }

    async fn begin_reservation(
        &self,
        inventory: &ZoneInventory,
        draft: &OrderDraft,
    ) -> AppResult<Option<Box<dyn PendingReservation>>> {
        let key = (inventory.fixture_id, inventory.zone_id);
        let row_lock = self
            .catalog()
            .row_locks
            .entry(key)
            .or_default()
            .clone();
        let guard = row_lock.lock_owned().await;

        let first_seat = {
            let catalog = self.catalog();
            let Some((_, zone)) = catalog.pair(key.0, key.1) else {
                return Ok(None);
            };
            let row = catalog.inventory.get(&key).copied().unwrap_or_default();
            if row.version != inventory.version || row.issued + draft.requested_count > zone.capacity {
                return Ok(None);
            }
            row.issued + 1
        };

        Ok(Some(Box::new(InMemoryPendingReservation {
            catalog: Arc::clone(&self.catalog),
            draft: draft.clone(),
            first_seat,
            _row_guard: guard,
        })))
    }

    async fn upcoming_fixtures(&self, from: NaiveDateTime) -> AppResult<Vec<FixtureSummary>> {
        let catalog = self.catalog();
        let abbr = |team_id: i32| {
            catalog
                .teams
                .get(&team_id)
                .map(|t| t.abbr.clone())
                .unwrap_or_default()
        };

        let mut fixtures: Vec<&Fixture> = catalog
            .fixtures
            .values()
            .filter(|f| f.starts_at() > from)
            .collect();
        fixtures.sort_by_key(|f| (f.date, f.start_time, f.id));

        Ok(fixtures
            .into_iter()
            .map(|f| {
                let prices: Vec<Decimal> = catalog
                    .zones
                    .values()
                    .filter(|z| z.stadium_id == f.stadium_id)
                    .map(|z| z.price_per_seat)
                    .collect();
                FixtureSummary {
                    fixture_id: f.id,
                    team_one: abbr(f.team_one_id),
                    team_two: abbr(f.team_two_id),
                    stadium: catalog
                        .stadiums
                        .get(&f.stadium_id)
                        .map(|s| s.name.clone())
                        .unwrap_or_default(),
                    date: f.date,
                    start_time: f.start_time,
                    end_time: f.end_time,
                    min_price: prices.iter().min().copied(),
                    max_price: prices.iter().max().copied(),
                }
            })
            .collect())
    }

    async fn zone_availability(&self, fixture_id: i32) -> AppResult<Option<Vec<ZoneAvailability>>> {
        let catalog = self.catalog();
        let Some(fixture) = catalog.fixtures.get(&fixture_id) else {
            return Ok(None);
        };

        let mut zones: Vec<&Zone> = catalog
            .zones
            .values()
            .filter(|z| z.stadium_id == fixture.stadium_id)
            .collect();
        zones.sort_by_key(|z| z.id);

        Ok(Some(
            zones
                .into_iter()
                .map(|z| {
                    let issued = catalog
                        .inventory
                        .get(&(fixture_id, z.id))
                        .map(|row| row.issued)
                        .unwrap_or(0);
                    ZoneAvailability {
                        zone_id: z.id,
                        name: z.name.clone(),
                        capacity: z.capacity,
                        issued,
                        remaining: (z.capacity - issued).max(0),
                        price_per_seat: z.price_per_seat,
                    }
                })
                .collect(),
        ))
    }

    async fn orders_for_account(&self, account_id: i32) -> AppResult<Vec<Order>> {
        let catalog = self.catalog();
        // newest first; ids are monotonic
        let mut orders: Vec<Order> = catalog
            .orders
            .iter()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(orders)
    }
}

struct InMemoryPendingReservation {
    catalog: Arc<Mutex<Catalog>>,
    draft: OrderDraft,
    first_seat: i32,
    // released on commit, rollback or drop
    _row_guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl PendingReservation for InMemoryPendingReservation {
    async fn commit(self: Box<Self>, receipt: &PaymentReceipt) -> AppResult<Order> {
        let mut catalog = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);
        let draft = &self.draft;

        let row = catalog
            .inventory
            .entry((draft.fixture_id, draft.zone_id))
            .or_default();
        row.issued += draft.requested_count;
        row.version += 1;

        let order_id = catalog.next_id();
        let mut tickets = Vec::with_capacity(draft.requested_count as usize);
        for seat_number in self.first_seat..self.first_seat + draft.requested_count {
            tickets.push(Ticket {
                id: catalog.next_id(),
                order_id,
                fixture_id: draft.fixture_id,
                zone_id: draft.zone_id,
                account_id: draft.account_id,
                seat_number,
            });
        }

        let order = Order {
            id: order_id,
            account_id: draft.account_id,
            fixture_id: draft.fixture_id,
            zone_id: draft.zone_id,
            no_of_tickets: draft.requested_count,
            total_amount: draft.total_amount,
            payment_method: draft.payment_method,
            payment_ref: receipt.transaction_ref.clone(),
            created_at: chrono::Utc::now().naive_utc(),
            tickets,
        };
        catalog.orders.push(order.clone());
        Ok(order)
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
