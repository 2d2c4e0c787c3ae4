use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use serde::{Deserialize, Serialize};
use rocket_okapi::request::OpenApiFromRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,  // account_id
    pub exp: usize,
}

/// Signing material for account tokens, managed as Rocket state.
pub struct JwtKeys {
    secret: String,
}

/// The account a request was made on behalf of.
#[derive(Debug, OpenApiFromRequest)]
pub struct AuthenticatedUser {
    pub account_id: i32,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        JwtKeys {
            secret: secret.into(),
        }
    }

    pub fn generate_token(&self, account_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
        // Tokens are valid for 24 hours
        let expiration = (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize;

        let claims = Claims {
            sub: account_id,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn resolve_account(&self, token: &str) -> Option<i32> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims.sub)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match request.headers().get_one("Authorization") {
            Some(header) => match header.strip_prefix("Bearer ") {
                Some(token) => token,
                None => return Outcome::Error((Status::Unauthorized, ())),
            },
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let keys = match request.rocket().state::<JwtKeys>() {
            Some(keys) => keys,
            None => {
                tracing::error!("JwtKeys are not managed; rejecting authenticated route");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match keys.resolve_account(token) {
            Some(account_id) => Outcome::Success(AuthenticatedUser { account_id }),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}
