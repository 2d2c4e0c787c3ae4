use crate::models::fixture::{FixtureSummary, ZoneAvailability, ZoneInventory};
use crate::models::ticket::{Order, OrderDraft, PaymentMethod, Ticket};
use crate::services::payment::PaymentReceipt;
use crate::services::store::{BookingStore, PendingReservation};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlDatabaseError;
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};
use std::collections::HashMap;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    account_id: i32,
    fixture_id: i32,
    zone_id: i32,
    no_of_tickets: i32,
    total_amount: Decimal,
    payment_method: String,
    payment_ref: String,
    created_at: NaiveDateTime,
}

impl OrderRow {
    fn into_order(self, tickets: Vec<Ticket>) -> AppResult<Order> {
        let payment_method: PaymentMethod = self.payment_method.parse().map_err(|_| {
            AppError::DatabaseError(format!(
                "order {} has unknown payment method {}",
                self.id, self.payment_method
            ))
        })?;

        Ok(Order {
            id: self.id,
            account_id: self.account_id,
            fixture_id: self.fixture_id,
            zone_id: self.zone_id,
            no_of_tickets: self.no_of_tickets,
            total_amount: self.total_amount,
            payment_method,
            payment_ref: self.payment_ref,
            created_at: self.created_at,
            tickets,
        })
    }
}

pub struct MySqlBookingStore {
    pool: MySqlPool,
}

impl MySqlBookingStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlBookingStore { pool }
    }

    async fn fetch_inventory(&self, fixture_id: i32, zone_id: i32) -> AppResult<Option<ZoneInventory>> {
        let inventory = sqlx::query_as::<_, ZoneInventory>(
            r#"
            SELECT
                i.fixture_id,
                i.zone_id,
                z.capacity,
                z.price_per_seat,
                i.issued,
                i.version,
                f.date AS fixture_date,
                f.start_time AS fixture_start
            FROM fixture_zone_inventory i
            JOIN fixture f ON f.id = i.fixture_id
            JOIN zone z ON z.id = i.zone_id AND z.stadium_id = f.stadium_id
            WHERE i.fixture_id = ? AND i.zone_id = ?
            "#,
        )
        .bind(fixture_id)
        .bind(zone_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inventory)
    }
}

// 5 binds per ticket row, well under MySQL's 65535 placeholders per statement
const TICKET_INSERT_CHUNK: i32 = 1000;

// ER_LOCK_WAIT_TIMEOUT (1205) and ER_LOCK_DEADLOCK (1213) on the claim are lost races
fn is_lost_race(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.try_downcast_ref::<MySqlDatabaseError>())
        .map(|db| matches!(db.number(), 1205 | 1213))
        .unwrap_or(false)
}

#[async_trait]
impl BookingStore for MySqlBookingStore {
    async fn zone_inventory(&self, fixture_id: i32, zone_id: i32) -> AppResult<Option<ZoneInventory>> {
        if let Some(inventory) = self.fetch_inventory(fixture_id, zone_id).await? {
            return Ok(Some(inventory));
        }

        // first booking for this pair; only valid (fixture, zone) pairs get a row
        sqlx::query(
            r#"
            INSERT IGNORE INTO fixture_zone_inventory (fixture_id, zone_id, issued, version)
            SELECT f.id, z.id, 0, 0
            FROM fixture f
            JOIN zone z ON z.stadium_id = f.stadium_id
            WHERE f.id = ? AND z.id = ?
            "#,
        )
        .bind(fixture_id)
        .bind(zone_id)
        .execute(&self.pool)
        .await?;

        self.fetch_inventory(fixture_id, zone_id).await
    }

    async fn begin_reservation(
        &self,
        inventory: &ZoneInventory,
        draft: &OrderDraft,
    ) -> AppResult<Option<Box<dyn PendingReservation>>> {
        let mut tx = self.pool.begin().await?;

        // the row lock taken here is held until commit or rollback
        let claim = sqlx::query(
            r#"
            UPDATE fixture_zone_inventory i
            JOIN zone z ON z.id = i.zone_id
            SET i.issued = i.issued + ?,
                i.version = i.version + 1
            WHERE i.fixture_id = ?
            AND i.zone_id = ?
            AND i.version = ?
            AND i.issued + ? <= z.capacity
            "#,
        )
        .bind(draft.requested_count)
        .bind(inventory.fixture_id)
        .bind(inventory.zone_id)
        .bind(inventory.version)
        .bind(draft.requested_count)
        .execute(&mut *tx)
        .await;

        let claim = match claim {
            Ok(claim) => claim,
            Err(err) if is_lost_race(&err) => {
                tracing::warn!(error = %err, "claim aborted by the database");
                tx.rollback().await?;
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        if claim.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Ok(Some(Box::new(MySqlPendingReservation {
            tx,
            draft: draft.clone(),
            first_seat: inventory.issued + 1,
        })))
    }

    async fn upcoming_fixtures(&self, from: NaiveDateTime) -> AppResult<Vec<FixtureSummary>> {
        let fixtures = sqlx::query_as::<_, FixtureSummary>(
            r#"
            SELECT
                f.id AS fixture_id,
                t1.abbr AS team_one,
                t2.abbr AS team_two,
                s.name AS stadium,
                f.date,
                f.start_time,
                f.end_time,
                MIN(z.price_per_seat) AS min_price,
                MAX(z.price_per_seat) AS max_price
            FROM fixture f
            JOIN team t1 ON t1.id = f.team_one_id
            JOIN team t2 ON t2.id = f.team_two_id
            JOIN stadium s ON s.id = f.stadium_id
            LEFT JOIN zone z ON z.stadium_id = f.stadium_id
            WHERE TIMESTAMP(f.date, f.start_time) > ?
            GROUP BY f.id, t1.abbr, t2.abbr, s.name, f.date, f.start_time, f.end_time
            ORDER BY f.date, f.start_time, f.id
            "#,
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        Ok(fixtures)
    }

    async fn zone_availability(&self, fixture_id: i32) -> AppResult<Option<Vec<ZoneAvailability>>> {
        let stadium_id = sqlx::query_scalar::<_, i32>("SELECT stadium_id FROM fixture WHERE id = ?")
            .bind(fixture_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(stadium_id) = stadium_id else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, (i32, String, i32, i64, Decimal)>(
            r#"
            SELECT
                z.id,
                z.name,
                z.capacity,
                CAST(COALESCE(i.issued, 0) AS SIGNED) AS issued,
                z.price_per_seat
            FROM zone z
            LEFT JOIN fixture_zone_inventory i ON i.zone_id = z.id AND i.fixture_id = ?
            WHERE z.stadium_id = ?
            ORDER BY z.id
            "#,
        )
        .bind(fixture_id)
        .bind(stadium_id)
        .fetch_all(&self.pool)
        .await?;

        let zones = rows
            .into_iter()
            .map(|(zone_id, name, capacity, issued, price_per_seat)| {
                let issued = issued as i32;
                ZoneAvailability {
                    zone_id,
                    name,
                    capacity,
                    issued,
                    remaining: (capacity - issued).max(0),
                    price_per_seat,
                }
            })
            .collect();

        Ok(Some(zones))
    }

    async fn orders_for_account(&self, account_id: i32) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, account_id, fixture_id, zone_id, no_of_tickets, total_amount,
                payment_method, payment_ref, created_at
            FROM orders
            WHERE account_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, order_id, fixture_id, zone_id, account_id, seat_number
            FROM ticket
            WHERE account_id = ?
            ORDER BY order_id, seat_number
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<Ticket>> = HashMap::new();
        for ticket in tickets {
            by_order.entry(ticket.order_id).or_default().push(ticket);
        }

        rows.into_iter()
            .map(|row| {
                let tickets = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(tickets)
            })
            .collect()
    }
}

struct MySqlPendingReservation {
    tx: Transaction<'static, MySql>,
    draft: OrderDraft,
    first_seat: i32,
}

#[async_trait]
impl PendingReservation for MySqlPendingReservation {
    async fn commit(self: Box<Self>, receipt: &PaymentReceipt) -> AppResult<Order> {
        let MySqlPendingReservation {
            mut tx,
            draft,
            first_seat,
        } = *self;
        let created_at = chrono::Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO orders
            (account_id, fixture_id, zone_id, no_of_tickets, total_amount,
                payment_method, payment_ref, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.account_id)
        .bind(draft.fixture_id)
        .bind(draft.zone_id)
        .bind(draft.requested_count)
        .bind(draft.total_amount)
        .bind(draft.payment_method.to_string())
        .bind(receipt.transaction_ref.clone())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_id() as i32;

        let last_seat = first_seat + draft.requested_count;
        let mut chunk_start = first_seat;
        while chunk_start < last_seat {
            let chunk_end = (chunk_start + TICKET_INSERT_CHUNK).min(last_seat);
            let mut insert: QueryBuilder<MySql> = QueryBuilder::new(
                "INSERT INTO ticket (order_id, fixture_id, zone_id, account_id, seat_number) ",
            );
            insert.push_values(chunk_start..chunk_end, |mut row, seat| {
                row.push_bind(order_id)
                    .push_bind(draft.fixture_id)
                    .push_bind(draft.zone_id)
                    .push_bind(draft.account_id)
                    .push_bind(seat);
            });
            insert.build().execute(&mut *tx).await?;
            chunk_start = chunk_end;
        }

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, order_id, fixture_id, zone_id, account_id, seat_number
            FROM ticket
            WHERE order_id = ?
            ORDER BY seat_number
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            account_id: draft.account_id,
            fixture_id: draft.fixture_id,
            zone_id: draft.zone_id,
            no_of_tickets: draft.requested_count,
            total_amount: draft.total_amount,
            payment_method: draft.payment_method,
            payment_ref: receipt.transaction_ref.clone(),
            created_at,
            tickets,
        })
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.tx.rollback().await?;
        Ok(())
    }
}
