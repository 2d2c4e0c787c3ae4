use rocket::serde::json::{json, Value};
use rocket::Request;
use crate::utils::error::AppError;

pub mod fixture_route;
pub mod ticket_route;

// Guard and routing failures answer in the same JSON shape as AppError

#[catch(401)]
pub fn unauthorized() -> Value {
    let error = AppError::AuthError("missing or invalid bearer token".to_string());
    json!({ "error": error.to_string() })
}

#[catch(404)]
pub fn not_found(request: &Request<'_>) -> Value {
    json!({ "error": AppError::NotFound(request.uri().to_string()).to_string() })
}

#[catch(422)]
pub fn unprocessable(request: &Request<'_>) -> Value {
    let error = AppError::BadRequest(format!("malformed request body for {}", request.uri()));
    json!({ "error": error.to_string() })
}
