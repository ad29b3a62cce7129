//! The persistence layer of the booking service.
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [BookingStore] trait. This object can be shared between threads in a
//! global application state and be used to create [BookingStoreFacade] instances for interaction
//! with the database. These provide a CRUD-like interface, using the data models from the [models]
//! module.
//!
//! The primary implementation of [BookingStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [BookingStoreFacade] objects hold a reference to one
//! pooled connection each, using the Diesel query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests.
//!
//! The store is the conflict-of-record for bookings: [BookingStoreFacade::create_booking]
//! validates the submission against the slot catalog and re-checks the busy-slot set inside the
//! insert transaction, so a submission that looked fine at availability-read time can still be
//! refused here with [StoreError::SlotNotAvailable].

use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::cli_error::CliError::UnexpectedStoreError;
use crate::schedule;
use crate::setup;
use auth_token::{AuthToken, GlobalAuthToken, Privilege};
use chrono::{DateTime, NaiveDate, Utc};
use roombook_api_types::{BusySlotEntry, NewBooking};

pub mod auth_token;
pub mod models;
mod postgres;
mod schema;

/// Get a [BookingStore] instance, according to the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PostgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl BookingStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| UnexpectedStoreError(err.to_string()))
}

pub type UserId = uuid::Uuid;
pub type RoomId = uuid::Uuid;
pub type BookingId = uuid::Uuid;

/// The two possible outcomes of a staff review of a pending booking.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn target_status(self) -> models::BookingStatus {
        match self {
            ReviewDecision::Approve => models::BookingStatus::Approved,
            ReviewDecision::Reject => models::BookingStatus::Rejected,
        }
    }
}

pub trait BookingStoreFacade {
    /// Look up a user account by its (unique) email address, for password verification during
    /// login.
    fn get_user_by_email(&mut self, email: &str) -> Result<models::User, StoreError>;
    fn get_user(&mut self, user_id: UserId) -> Result<models::User, StoreError>;
    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: models::User,
    ) -> Result<UserId, StoreError>;

    /// Get an [AuthToken] instance for a client, representing the user authenticated by the
    /// given session token.
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError>;

    fn get_rooms(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Room>, StoreError>;
    /// Create a new room or update the existing room with the same id.
    ///
    /// # return value
    /// - `Ok(true)` if the room has been created, successfully
    /// - `Ok(false)` if an existing room has been updated, successfully
    /// - `Err(_)` if something went wrong, as usual
    fn create_or_update_room(
        &mut self,
        auth_token: &GlobalAuthToken,
        room: models::Room,
    ) -> Result<bool, StoreError>;

    /// Get the busy-slot set of the given (room, date) pair: one entry per booking whose status
    /// blocks its slot (pending or approved). Rejected, cancelled and completed bookings are
    /// never included.
    ///
    /// Fails with [StoreError::NotExisting] if the room is unknown.
    fn get_busy_slots(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Vec<BusySlotEntry>, StoreError>;

    /// Validate and store a new booking request of the authenticated user, with status pending.
    ///
    /// The submission is checked against [validate_new_booking] and the busy-slot set of the
    /// (room, date) pair is re-checked within the insert transaction. A submission for a slot
    /// that is already held by a pending or approved booking fails with
    /// [StoreError::SlotNotAvailable].
    fn create_booking(
        &mut self,
        auth_token: &AuthToken,
        request: NewBooking,
    ) -> Result<models::FullBooking, StoreError>;

    /// Get all bookings of the authenticated user, newest first.
    fn get_own_bookings(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::FullBooking>, StoreError>;
    /// Get all bookings of all users for staff review, newest first.
    fn get_all_bookings(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::FullBooking>, StoreError>;

    /// Cancel a pending booking owned by the authenticated user.
    ///
    /// Fails with [StoreError::PermissionDenied] if the booking belongs to another user and with
    /// [StoreError::InvalidTransition] if the booking is not pending anymore.
    fn cancel_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<models::FullBooking, StoreError>;

    /// Approve or reject a pending booking (staff only).
    fn review_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
        decision: ReviewDecision,
    ) -> Result<models::FullBooking, StoreError>;

    /// Mark all approved bookings whose slot end has passed as completed. Returns the number of
    /// affected bookings. Meant to be run periodically from the command line interface.
    fn complete_elapsed_bookings(
        &mut self,
        auth_token: &GlobalAuthToken,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;
}

pub trait BookingStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BookingStoreFacade + 'a>, StoreError>;
}

/// Check a booking submission against the local validation rules, before it touches any booking
/// row: the purpose must be non-empty, the date must be today or later and the requested bounds
/// must exactly match one catalog slot.
///
/// Room existence and slot occupancy are checked by the store implementations within the insert
/// transaction, since they depend on the database state.
pub fn validate_new_booking(request: &NewBooking, today: NaiveDate) -> Result<(), StoreError> {
    if request.purpose.trim().is_empty() {
        return Err(StoreError::InvalidInputData(
            "A purpose must be given".to_owned(),
        ));
    }
    if request.booking_date < today {
        return Err(StoreError::InvalidInputData(
            "The booking date must not be in the past".to_owned(),
        ));
    }
    if schedule::find_slot(request.slot_start, request.slot_end).is_none() {
        return Err(StoreError::InvalidInputData(format!(
            "{}–{} is not a valid booking slot",
            request.slot_start, request.slot_end
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub enum StoreError {
    /// Connecting to the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be committed due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because a conflicting entity exists already (e.g. a user
    /// with the same email address).
    ConflictEntityExists,
    /// The requested slot is already held by a pending or approved booking for the same room and
    /// date.
    SlotNotAvailable,
    /// The requested status change is not a legal lifecycle edge (see
    /// [models::BookingStatus::can_transition]).
    InvalidTransition {
        from: models::BookingStatus,
        to: models::BookingStatus,
    },
    /// The client is not authorized for this action. It would need an access role qualifying for
    /// the `required_privilege` (or, for ownership-bound actions, be the owner of the entity).
    PermissionDenied { required_privilege: Privilege },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation,
                _,
            ) => Self::InvalidInputData(format!("{:?}", e)),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str(
                "Database transaction could not be committed due to a conflicting concurrent transaction",
            ),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::SlotNotAvailable => {
                f.write_str("The requested slot is already booked for this room and date.")
            }
            Self::InvalidTransition { from, to } => write!(
                f,
                "A booking with status {:?} cannot change to status {:?}.",
                from, to
            ),
            Self::PermissionDenied { required_privilege } => write!(
                f,
                "Client is not authorized to perform this action. {:?} privilege required.",
                required_privilege
            ),
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            Self::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            }
        }
    }
}

impl std::error::Error for StoreError {}
