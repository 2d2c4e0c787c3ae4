use crate::models::fixture::{UpcomingFixturesResponse, ZoneAvailabilityResponse};
use crate::services::store::BookingStore;
use crate::utils::error::{AppError, AppResult};
use chrono::NaiveDateTime;
use std::sync::Arc;

#[derive(Clone)]
pub struct FixtureService {
    store: Arc<dyn BookingStore>,
}

impl FixtureService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        FixtureService { store }
    }

    // Fixtures still open for booking, earliest first
    pub async fn upcoming_fixtures(&self) -> AppResult<UpcomingFixturesResponse> {
        self.fixtures_from(chrono::Local::now().naive_local()).await
    }

    pub async fn fixtures_from(&self, from: NaiveDateTime) -> AppResult<UpcomingFixturesResponse> {
        let fixtures = self.store.upcoming_fixtures(from).await?;
        Ok(UpcomingFixturesResponse { fixtures })
    }

    pub async fn zone_availability(&self, fixture_id: i32) -> AppResult<ZoneAvailabilityResponse> {
        let zones = self
            .store
            .zone_availability(fixture_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fixture {}", fixture_id)))?;

        Ok(ZoneAvailabilityResponse { fixture_id, zones })
    }
}
