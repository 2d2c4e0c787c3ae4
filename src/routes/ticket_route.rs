use crate::models::ticket::{Order, OrderHistoryResponse, ReservationRequest};
use crate::services::ticket_service::TicketService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Buy tickets for a zone of a fixture
#[openapi(tag = "Tickets")]
#[post("/tickets/purchase", format = "json", data = "<request>")]
pub async fn purchase_tickets(
    request: Json<ReservationRequest>,
    auth: AuthenticatedUser,
    ticket_service: &State<TicketService>,
) -> Result<Json<Order>, AppError> {
    let order = ticket_service
        .reserve(auth.account_id, request.into_inner())
        .await?;

    Ok(Json(order))
}

/// Orders placed by the caller, newest first
#[openapi(tag = "Tickets")]
#[get("/orders")]
pub async fn order_history(
    auth: AuthenticatedUser,
    ticket_service: &State<TicketService>,
) -> Result<Json<OrderHistoryResponse>, AppError> {
    let history = ticket_service.order_history(auth.account_id).await?;
    Ok(Json(history))
}
