#[macro_use]
extern crate rocket;

pub mod db;
pub mod models;
pub mod routes;
pub mod services;
pub mod swagger;
pub mod utils;

use crate::services::fixture_service::FixtureService;
use crate::services::ticket_service::TicketService;
use crate::swagger::swagger_ui;
use crate::utils::jwt::JwtKeys;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::make_swagger_ui;

/// Assemble the HTTP surface around already-constructed services.
pub fn build_rocket(
    ticket_service: TicketService,
    fixture_service: FixtureService,
    jwt_keys: JwtKeys,
) -> Rocket<Build> {
    rocket::build()
        .manage(ticket_service)
        .manage(fixture_service)
        .manage(jwt_keys)
        .mount(
            "/api",
            openapi_get_routes![
                routes::ticket_route::purchase_tickets,
                routes::ticket_route::order_history,
                routes::fixture_route::upcoming_fixtures,
                routes::fixture_route::zone_availability,
            ],
        )
        .mount("/swagger", make_swagger_ui(&swagger_ui()))
        .register(
            "/",
            catchers![
                routes::unauthorized,
                routes::not_found,
                routes::unprocessable
            ],
        )
        .attach(AdHoc::on_response("CORS", |_, res| {
            Box::pin(async move {
                res.set_header(rocket::http::Header::new(
                    "Access-Control-Allow-Origin",
                    "*",
                ));
            })
        }))
}
