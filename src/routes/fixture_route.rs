use crate::models::fixture::{UpcomingFixturesResponse, ZoneAvailabilityResponse};
use crate::services::fixture_service::FixtureService;
use crate::utils::error::AppError;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Upcoming fixtures with their zone price range
#[openapi(tag = "Fixtures")]
#[get("/fixtures/upcoming")]
pub async fn upcoming_fixtures(
    fixture_service: &State<FixtureService>,
) -> Result<Json<UpcomingFixturesResponse>, AppError> {
    let fixtures = fixture_service.upcoming_fixtures().await?;
    Ok(Json(fixtures))
}

/// Seats left in every zone of a fixture
#[openapi(tag = "Fixtures")]
#[get("/fixtures/<fixture_id>/zones")]
pub async fn zone_availability(
    fixture_id: i32,
    fixture_service: &State<FixtureService>,
) -> Result<Json<ZoneAvailabilityResponse>, AppError> {
    let zones = fixture_service.zone_availability(fixture_id).await?;
    Ok(Json(zones))
}
