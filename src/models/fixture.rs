use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub abbr: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Stadium {
    pub id: i32,
    pub name: String,
    pub abbr: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Zone {
    pub id: i32,
    pub stadium_id: i32,
    pub name: String,
    pub capacity: i32,
    pub price_per_seat: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Fixture {
    pub id: i32,
    pub team_one_id: i32,
    pub team_two_id: i32,
    pub stadium_id: i32,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Fixture {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// Snapshot of one (fixture, zone) pair as read before a reservation claim.
///
/// `version` is the optimistic token the claim must still match.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZoneInventory {
    pub fixture_id: i32,
    pub zone_id: i32,
    pub capacity: i32,
    pub price_per_seat: Decimal,
    pub issued: i32,
    pub version: i32,
    pub fixture_date: NaiveDate,
    pub fixture_start: NaiveTime,
}

impl ZoneInventory {
    pub fn remaining(&self) -> i32 {
        (self.capacity - self.issued).max(0)
    }

    pub fn can_accommodate(&self, requested: i32) -> bool {
        requested <= self.remaining()
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.fixture_date.and_time(self.fixture_start)
    }
}

// Single fixture in UpcomingFixturesResponse
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct FixtureSummary {
    pub fixture_id: i32,
    pub team_one: String,
    pub team_two: String,
    pub stadium: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[schemars(with = "Option<String>")]
    pub min_price: Option<Decimal>,
    #[schemars(with = "Option<String>")]
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UpcomingFixturesResponse {
    pub fixtures: Vec<FixtureSummary>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ZoneAvailability {
    pub zone_id: i32,
    pub name: String,
    pub capacity: i32,
    pub issued: i32,
    pub remaining: i32,
    #[schemars(with = "String")]
    pub price_per_seat: Decimal,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ZoneAvailabilityResponse {
    pub fixture_id: i32,
    pub zones: Vec<ZoneAvailability>,
}
