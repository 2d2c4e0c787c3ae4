use cricket_ticket_booking::db::Database;
use cricket_ticket_booking::services::fixture_service::FixtureService;
use cricket_ticket_booking::services::mysql_store::MySqlBookingStore;
use cricket_ticket_booking::services::payment::SimulatedPaymentGateway;
use cricket_ticket_booking::services::store::BookingStore;
use cricket_ticket_booking::services::ticket_service::TicketService;
use cricket_ticket_booking::utils::config::AppConfig;
use cricket_ticket_booking::utils::jwt::JwtKeys;
use dotenv::dotenv;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[rocket::launch]
async fn rocket() -> _ {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    // Connect to the database
    let database = Database::new(&config.database_url, config.max_connections)
        .await
        .expect("Failed to connect to database");
    database
        .create_schema()
        .await
        .expect("Failed to create database schema");
    tracing::info!(max_connections = config.max_connections, "connected to database");

    let store: Arc<dyn BookingStore> = Arc::new(MySqlBookingStore::new(database.pool.clone()));
    let ticket_service = TicketService::new(
        store.clone(),
        Arc::new(SimulatedPaymentGateway),
        config.retry,
    );
    let fixture_service = FixtureService::new(store);

    cricket_ticket_booking::build_rocket(
        ticket_service,
        fixture_service,
        JwtKeys::new(config.jwt_secret),
    )
}
