use crate::utils::error::AppError;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{MediaType, RefOr, Response, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use schemars::schema::SchemaObject;
use schemars::Map;
use serde_json::json;

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();

        // One documented example per error status the service can produce
        let error_responses = [
            ("Bad Request", AppError::ValidationError("requested_count: must be at least 1".to_string())),
            ("Unauthorized", AppError::AuthError("Unauthorized".to_string())),
            ("Payment Required", AppError::PaymentFailed("card declined".to_string())),
            ("Not Found", AppError::NotFound("Zone 3 for fixture 1".to_string())),
            ("Conflict", AppError::Conflict("reservation retries exhausted".to_string())),
            ("Unprocessable", AppError::InsufficientCapacity { requested: 6, remaining: 4 }),
            ("Internal Server Error", AppError::DatabaseError("Internal Server Error".to_string())),
        ];

        for (description, error) in error_responses {
            let mut content = Map::new();
            content.insert(
                "application/json".to_string(),
                MediaType {
                    schema: Some(SchemaObject::default()),
                    example: Some(json!({
                        "error": error.to_string()
                    })),
                    ..Default::default()
                },
            );

            responses.responses.insert(
                error.status().code.to_string(),
                RefOr::Object(Response {
                    description: description.to_string(),
                    content,
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}
