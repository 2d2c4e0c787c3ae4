use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

// Tables are created in dependency order
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS team (
        id INT AUTO_INCREMENT PRIMARY KEY,
        name CHAR(255) NOT NULL,
        abbr CHAR(16) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS stadium (
        id INT AUTO_INCREMENT PRIMARY KEY,
        name CHAR(255) NOT NULL,
        abbr CHAR(16) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS zone (
        id INT AUTO_INCREMENT PRIMARY KEY,
        stadium_id INT NOT NULL,
        name CHAR(255) NOT NULL,
        capacity INT NOT NULL,
        price_per_seat DECIMAL(10,2) NOT NULL,
        CONSTRAINT zone_stadium_id_fk
            FOREIGN KEY (stadium_id) REFERENCES stadium(id)
            ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS fixture (
        id INT AUTO_INCREMENT PRIMARY KEY,
        team_one_id INT NOT NULL,
        team_two_id INT NOT NULL,
        stadium_id INT NOT NULL,
        date DATE NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        CONSTRAINT fixture_team_one_id_fk FOREIGN KEY (team_one_id) REFERENCES team(id),
        CONSTRAINT fixture_team_two_id_fk FOREIGN KEY (team_two_id) REFERENCES team(id),
        CONSTRAINT fixture_stadium_id_fk FOREIGN KEY (stadium_id) REFERENCES stadium(id)
    )",
    "CREATE TABLE IF NOT EXISTS fixture_zone_inventory (
        fixture_id INT NOT NULL,
        zone_id INT NOT NULL,
        issued INT DEFAULT 0 NOT NULL,
        version INT DEFAULT 0 NOT NULL,
        PRIMARY KEY (fixture_id, zone_id),
        CONSTRAINT inventory_fixture_id_fk
            FOREIGN KEY (fixture_id) REFERENCES fixture(id)
            ON DELETE CASCADE,
        CONSTRAINT inventory_zone_id_fk
            FOREIGN KEY (zone_id) REFERENCES zone(id)
            ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INT AUTO_INCREMENT PRIMARY KEY,
        account_id INT NOT NULL,
        fixture_id INT NOT NULL,
        zone_id INT NOT NULL,
        no_of_tickets INT NOT NULL,
        total_amount DECIMAL(12,2) NOT NULL,
        payment_method CHAR(32) NOT NULL,
        payment_ref CHAR(64) NOT NULL,
        created_at DATETIME NOT NULL,
        CONSTRAINT orders_inventory_fk
            FOREIGN KEY (fixture_id, zone_id)
            REFERENCES fixture_zone_inventory(fixture_id, zone_id)
    )",
    "CREATE TABLE IF NOT EXISTS ticket (
        id INT AUTO_INCREMENT PRIMARY KEY,
        order_id INT NOT NULL,
        fixture_id INT NOT NULL,
        zone_id INT NOT NULL,
        account_id INT NOT NULL,
        seat_number INT NOT NULL,
        CONSTRAINT ticket_seat_uindex UNIQUE (fixture_id, zone_id, seat_number),
        CONSTRAINT ticket_order_id_fk
            FOREIGN KEY (order_id) REFERENCES orders(id)
            ON DELETE CASCADE
    )",
];

// Database connection manager
pub struct Database {
    pub pool: MySqlPool,
}

impl Database {
    // Create a new database connection pool
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        create_schema(&self.pool).await
    }
}

pub async fn create_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for create_sql in SCHEMA {
        sqlx::query(*create_sql).execute(pool).await?;
    }
    tracing::debug!(tables = SCHEMA.len(), "schema ready");
    Ok(())
}
