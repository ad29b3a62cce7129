use std::fmt::Display;

mod endpoints_auth;
mod endpoints_booking;
mod endpoints_review;
mod endpoints_room;
#[cfg(test)]
mod tests;

use crate::auth_session::SessionToken;
use crate::data_store::auth_token::Privilege;
use crate::data_store::models::BookingStatus;
use crate::data_store::StoreError;
use actix_web::error::JsonPayloadError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, HttpResponse,
};
use serde_json::json;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    web::scope("/api/v1")
        .app_data(json_config)
        .service(endpoints_auth::login)
        .service(endpoints_auth::check_authorization)
        .service(endpoints_room::list_rooms)
        .service(endpoints_room::get_busy_slots)
        .service(endpoints_room::get_availability)
        .service(endpoints_booking::create_booking)
        .service(endpoints_booking::list_own_bookings)
        .service(endpoints_booking::cancel_booking)
        .service(endpoints_review::list_all_bookings)
        .service(endpoints_review::approve_booking)
        .service(endpoints_review::reject_booking)
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    AlreadyExisting,
    SlotNotAvailable,
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    PermissionDenied {
        required_privilege: Privilege,
    },
    NoSessionToken,
    InvalidSessionToken,
    AuthenticationFailed,
    InvalidJson(actix_web::error::JsonPayloadError),
    InvalidData(String),
    TransactionConflict,
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::AlreadyExisting => {
                f.write_str("Element already exists")?;
            }
            Self::SlotNotAvailable => {
                f.write_str("The requested slot is no longer available for this room and date. Please refresh the room's availability and pick another slot.")?;
            }
            Self::InvalidTransition { from, to } => {
                write!(
                    f,
                    "The booking's status does not allow this action (cannot change a {} booking to {}).",
                    from.name(),
                    to.name()
                )?;
            }
            Self::PermissionDenied { required_privilege } => {
                write!(
                    f,
                    "Client is not authorized to perform this action. Authentication as {} is required.",
                    required_privilege
                        .qualifying_roles()
                        .iter()
                        .map(|role| role.name().to_owned())
                        .collect::<Vec<String>>()
                        .join(" or ")
                )?;
            }
            Self::NoSessionToken => {
                f.write_str("This action requires authentication, but client did not send a bearer session token.")?
            }
            Self::InvalidSessionToken => {
                f.write_str("This action requires authentication, but the session token given by the client is not valid.")?
            }
            Self::AuthenticationFailed => {
                f.write_str("Authentication with the given email address and password failed.")?;
            }
            Self::InternalError(s) => {
                f.write_str("Internal error: ")?;
                f.write_str(s)?;
            }
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            }
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            }
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")?;
            }
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        let message = format!("{}", self);

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({
                "httpCode": self.status_code().as_u16(),
                "message": message
            }))
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::CONFLICT,
            Self::SlotNotAvailable => StatusCode::CONFLICT,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSessionToken => StatusCode::UNAUTHORIZED,
            Self::InvalidSessionToken => StatusCode::UNAUTHORIZED,
            Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::Deserialize(json_error) if json_error.is_data() => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::SlotNotAvailable => Self::SlotNotAvailable,
            StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            StoreError::PermissionDenied { required_privilege } => {
                Self::PermissionDenied { required_privilege }
            }
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<crate::auth_session::SessionError> for APIError {
    fn from(_e: crate::auth_session::SessionError) -> Self {
        APIError::InvalidSessionToken
    }
}

struct BearerTokenHeader(String);

const SESSION_TOKEN_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 86400);

impl BearerTokenHeader {
    fn session_token(
        &self,
        secret: &str,
    ) -> Result<crate::auth_session::SessionToken, crate::auth_session::SessionError> {
        SessionToken::from_string(&self.0, secret, SESSION_TOKEN_MAX_AGE)
    }
}

impl actix_web::http::header::TryIntoHeaderValue for BearerTokenHeader {
    type Error = actix_web::http::header::InvalidHeaderValue;

    fn try_into_value(self) -> Result<actix_web::http::header::HeaderValue, Self::Error> {
        format!("Bearer {}", self.0).parse()
    }
}

impl actix_web::http::header::Header for BearerTokenHeader {
    fn name() -> actix_web::http::header::HeaderName {
        actix_web::http::header::AUTHORIZATION
    }

    fn parse<M: actix_web::HttpMessage>(msg: &M) -> Result<Self, actix_web::error::ParseError> {
        let value = msg
            .headers()
            .get(Self::name())
            .ok_or(actix_web::error::ParseError::Header)?
            .to_str()
            .unwrap_or("");
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(actix_web::error::ParseError::Header)?;
        Ok(Self(token.to_owned()))
    }
}
