#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use cricket_ticket_booking::db::create_schema;
use dotenv::dotenv;
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool as Pool;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::Error;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

static TEST_DB: OnceCell<Mutex<Option<TestDb>>> = OnceCell::new();
static DB_NAME: OnceCell<String> = OnceCell::new();

#[derive(Debug)]
pub struct TestDb {
    pub pool: Pool,
    pub db_name: String,
}

/// Ids of one stadium, its zone and a fixture played there.
#[derive(Debug, Clone, Copy)]
pub struct SeededMatch {
    pub stadium_id: i32,
    pub zone_id: i32,
    pub fixture_id: i32,
}

fn base_url() -> String {
    dotenv().ok();
    let db_url = env::var("ADMIN_DATABASE_URL")
        .expect("ADMIN_DATABASE_URL must be set in .env file");

    db_url.split('/').collect::<Vec<&str>>()[..3].join("/")
}

// Create a connection pool without a database, used to create a new database
async fn create_connection_pool_without_db() -> Result<Pool, Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(&base_url())
        .await
}

// Create a connection pool with the test database
async fn create_connection_pool_with_db(db_name: &str) -> Result<Pool, Error> {
    MySqlPoolOptions::new()
        .max_connections(30)
        .connect(&format!("{}/{}", base_url(), db_name))
        .await
}

impl TestDb {
    // One database per test binary run, shared by every test in it
    pub async fn get_instance() -> Result<Pool, Error> {
        let test_db = TEST_DB.get_or_init(|| Mutex::new(None));
        let mut guard = test_db.lock().await;

        if let Some(db) = guard.as_ref() {
            return Ok(db.pool.clone());
        }

        let db = Self::setup_database().await?;
        let pool = db.pool.clone();
        *guard = Some(db);
        Ok(pool)
    }

    async fn setup_database() -> Result<Self, Error> {
        let db_name = DB_NAME
            .get_or_init(|| {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_millis();
                format!("ticketing_test_{}", timestamp)
            })
            .clone();

        let admin_pool = create_connection_pool_without_db().await?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin_pool)
            .await?;

        let pool = create_connection_pool_with_db(&db_name).await?;
        create_schema(&pool).await?;

        Ok(Self { pool, db_name })
    }

    /// A stadium with a single zone and an upcoming fixture between two fresh teams.
    pub async fn seed_match(
        pool: &Pool,
        capacity: i32,
        price_per_seat: Decimal,
        date: NaiveDate,
    ) -> Result<SeededMatch, Error> {
        let team_one = sqlx::query("INSERT INTO team (name, abbr) VALUES ('Mumbai Indians', 'MI')")
            .execute(pool)
            .await?
            .last_insert_id() as i32;
        let team_two = sqlx::query("INSERT INTO team (name, abbr) VALUES ('Delhi Capitals', 'DC')")
            .execute(pool)
            .await?
            .last_insert_id() as i32;

        let stadium_id = sqlx::query("INSERT INTO stadium (name, abbr) VALUES ('Wankhede Stadium', 'ws')")
            .execute(pool)
            .await?
            .last_insert_id() as i32;

        let zone_id = Self::add_zone(pool, stadium_id, capacity, price_per_seat).await?;

        let fixture_id = sqlx::query(
            r#"
            INSERT INTO fixture (team_one_id, team_two_id, stadium_id, date, start_time, end_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(team_one)
        .bind(team_two)
        .bind(stadium_id)
        .bind(date)
        .bind(NaiveTime::from_hms_opt(19, 30, 0).unwrap())
        .bind(NaiveTime::from_hms_opt(23, 0, 0).unwrap())
        .execute(pool)
        .await?
        .last_insert_id() as i32;

        Ok(SeededMatch {
            stadium_id,
            zone_id,
            fixture_id,
        })
    }

    pub async fn add_zone(
        pool: &Pool,
        stadium_id: i32,
        capacity: i32,
        price_per_seat: Decimal,
    ) -> Result<i32, Error> {
        let result = sqlx::query(
            "INSERT INTO zone (stadium_id, name, capacity, price_per_seat) VALUES (?, 'Zone A', ?, ?)",
        )
        .bind(stadium_id)
        .bind(capacity)
        .bind(price_per_seat)
        .execute(pool)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    pub async fn ticket_count(pool: &Pool, fixture_id: i32, zone_id: i32) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ticket WHERE fixture_id = ? AND zone_id = ?")
            .bind(fixture_id)
            .bind(zone_id)
            .fetch_one(pool)
            .await
    }

    pub async fn order_count(pool: &Pool, fixture_id: i32) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE fixture_id = ?")
            .bind(fixture_id)
            .fetch_one(pool)
            .await
    }

    // Teardown: drop the database after the test run (not after each test)
    pub fn cleanup_database_sync() -> Result<(), Error> {
        let Some(db_name) = DB_NAME.get() else {
            return Ok(());
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Io)?;
        runtime.block_on(async {
            let admin_pool = create_connection_pool_without_db().await?;
            sqlx::query(&format!("DROP DATABASE IF EXISTS {}", db_name))
                .execute(&admin_pool)
                .await?;
            Ok(())
        })
    }
}
