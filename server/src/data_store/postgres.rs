use super::{
    models, schema, validate_new_booking, BookingId, BookingStore, BookingStoreFacade,
    ReviewDecision, RoomId, StoreError, UserId,
};
use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AccessRole, AuthToken, GlobalAuthToken, Privilege};
use crate::data_store::models::BookingStatus;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use roombook_api_types::{BusySlotEntry, NewBooking};
use uuid::Uuid;

const SLOT_BLOCKING_STATUSES: [BookingStatus; 2] =
    [BookingStatus::Pending, BookingStatus::Approved];

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl BookingStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BookingStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

/// Load a booking with its room and the requesting user's name, within the given connection or
/// transaction.
fn load_full_booking(
    connection: &mut PgConnection,
    booking_id: BookingId,
) -> Result<models::FullBooking, StoreError> {
    let (booking, room, user_name) = schema::bookings::table
        .inner_join(schema::rooms::table)
        .inner_join(schema::users::table)
        .filter(schema::bookings::id.eq(booking_id))
        .select((
            models::Booking::as_select(),
            models::Room::as_select(),
            schema::users::name,
        ))
        .first::<(models::Booking, models::Room, String)>(connection)?;
    Ok(models::FullBooking {
        booking,
        room,
        user_name,
    })
}

/// Change a booking's status along a legal lifecycle edge.
///
/// Fails with [StoreError::InvalidTransition] if the edge from the booking's current status to
/// `target` is not permitted by [BookingStatus::can_transition].
fn update_status_checked(
    connection: &mut PgConnection,
    booking: &models::Booking,
    target: BookingStatus,
) -> Result<(), StoreError> {
    use schema::bookings::dsl::*;

    if !booking.status.can_transition(target) {
        return Err(StoreError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }
    let result = diesel::update(bookings)
        .filter(id.eq(booking.id))
        .filter(status.eq(booking.status))
        .set(status.eq(target))
        .execute(connection)?;
    if result == 1 {
        Ok(())
    } else {
        // The booking's status changed concurrently since we loaded it.
        Err(StoreError::TransactionConflict)
    }
}

impl BookingStoreFacade for PgDataStoreFacade {
    fn get_user_by_email(&mut self, user_email: &str) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;

        users
            .filter(email.eq(user_email))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_user(&mut self, the_user_id: UserId) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;

        users
            .filter(id.eq(the_user_id))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: models::User,
    ) -> Result<UserId, StoreError> {
        use schema::users::dsl::*;
        auth_token.check_privilege(Privilege::ManageUsers)?;

        Ok(diesel::insert_into(users)
            .values(&user)
            .returning(id)
            .get_result::<UserId>(&mut self.connection)?)
    }

    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError> {
        let user = self.get_user(session_token.user_id())?;
        let role = AccessRole::try_from(user.role)
            .map_err(|e| StoreError::InvalidDataInDatabase(e.to_string()))?;
        Ok(AuthToken::create_for_session(user.id, role))
    }

    fn get_rooms(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Room>, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ViewRooms)?;

        rooms
            .order_by(name.asc())
            .select(models::Room::as_select())
            .load::<models::Room>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_or_update_room(
        &mut self,
        auth_token: &GlobalAuthToken,
        room: models::Room,
    ) -> Result<bool, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageRooms)?;

        let updated = diesel::insert_into(rooms)
            .values(&room)
            .on_conflict(id)
            .do_update()
            .set((
                name.eq(&room.name),
                room_type.eq(&room.room_type),
                capacity.eq(room.capacity),
                image_url.eq(&room.image_url),
            ))
            .returning(sql_upsert_is_updated())
            .get_result::<bool>(&mut self.connection)?;
        Ok(!updated)
    }

    fn get_busy_slots(
        &mut self,
        auth_token: &AuthToken,
        the_room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Vec<BusySlotEntry>, StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_privilege(Privilege::ViewRooms)?;

        self.connection.transaction(|connection| {
            let room_exists: bool = diesel::select(exists(
                schema::rooms::table.filter(schema::rooms::id.eq(the_room_id)),
            ))
            .get_result(connection)?;
            if !room_exists {
                return Err(StoreError::NotExisting);
            }
            let blocking_bookings = bookings
                .filter(room_id.eq(the_room_id))
                .filter(booking_date.eq(date))
                .filter(status.eq_any(SLOT_BLOCKING_STATUSES))
                .order_by(slot_start.asc())
                .select(models::Booking::as_select())
                .load::<models::Booking>(connection)?;
            Ok(blocking_bookings
                .iter()
                .filter_map(models::Booking::busy_entry)
                .collect())
        })
    }

    fn create_booking(
        &mut self,
        auth_token: &AuthToken,
        request: NewBooking,
    ) -> Result<models::FullBooking, StoreError> {
        auth_token.check_privilege(Privilege::CreateBookings)?;
        validate_new_booking(&request, Utc::now().date_naive())?;
        let requesting_user_id = auth_token.user_id();

        self.connection
            .transaction(|connection| {
                use schema::bookings::dsl::*;

                let room = schema::rooms::table
                    .filter(schema::rooms::id.eq(request.room_id))
                    .select(models::Room::as_select())
                    .first::<models::Room>(connection)
                    .optional()?
                    .ok_or_else(|| {
                        StoreError::InvalidInputData("The requested room does not exist".to_owned())
                    })?;

                // Authoritative re-check of the busy-slot set. The availability a client saw at
                // read time may be outdated by now.
                let occupied: bool = diesel::select(exists(
                    bookings
                        .filter(room_id.eq(request.room_id))
                        .filter(booking_date.eq(request.booking_date))
                        .filter(slot_start.eq(request.slot_start))
                        .filter(status.eq_any(SLOT_BLOCKING_STATUSES)),
                ))
                .get_result(connection)?;
                if occupied {
                    return Err(StoreError::SlotNotAvailable);
                }

                let new_booking = models::Booking {
                    id: Uuid::new_v4(),
                    user_id: requesting_user_id,
                    room_id: request.room_id,
                    booking_date: request.booking_date,
                    slot_start: request.slot_start,
                    slot_end: request.slot_end,
                    purpose: request.purpose,
                    notes: request.notes,
                    status: BookingStatus::Pending,
                    created_at: Utc::now(),
                };
                diesel::insert_into(bookings)
                    .values(&new_booking)
                    .execute(connection)?;
                let user_name = schema::users::table
                    .filter(schema::users::id.eq(requesting_user_id))
                    .select(schema::users::name)
                    .first::<String>(connection)?;
                Ok(models::FullBooking {
                    booking: new_booking,
                    room,
                    user_name,
                })
            })
            .map_err(|e| match e {
                // Insert raced with another one past the re-check; the partial unique index on
                // active bookings caught it.
                StoreError::ConflictEntityExists => StoreError::SlotNotAvailable,
                e => e,
            })
    }

    fn get_own_bookings(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::FullBooking>, StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_privilege(Privilege::ManageOwnBookings)?;

        let rows = bookings
            .inner_join(schema::rooms::table)
            .inner_join(schema::users::table)
            .filter(user_id.eq(auth_token.user_id()))
            .order_by((created_at.desc(), id.asc()))
            .select((
                models::Booking::as_select(),
                models::Room::as_select(),
                schema::users::name,
            ))
            .load::<(models::Booking, models::Room, String)>(&mut self.connection)?;
        Ok(rows
            .into_iter()
            .map(|(booking, room, user_name)| models::FullBooking {
                booking,
                room,
                user_name,
            })
            .collect())
    }

    fn get_all_bookings(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::FullBooking>, StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_privilege(Privilege::ReviewBookings)?;

        let rows = bookings
            .inner_join(schema::rooms::table)
            .inner_join(schema::users::table)
            .order_by((created_at.desc(), id.asc()))
            .select((
                models::Booking::as_select(),
                models::Room::as_select(),
                schema::users::name,
            ))
            .load::<(models::Booking, models::Room, String)>(&mut self.connection)?;
        Ok(rows
            .into_iter()
            .map(|(booking, room, user_name)| models::FullBooking {
                booking,
                room,
                user_name,
            })
            .collect())
    }

    fn cancel_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<models::FullBooking, StoreError> {
        auth_token.check_privilege(Privilege::ManageOwnBookings)?;

        self.connection.transaction(|connection| {
            let mut full_booking = load_full_booking(connection, booking_id)?;
            if full_booking.booking.user_id != auth_token.user_id() {
                return Err(StoreError::PermissionDenied {
                    required_privilege: Privilege::ManageOwnBookings,
                });
            }
            update_status_checked(connection, &full_booking.booking, BookingStatus::Cancelled)?;
            full_booking.booking.status = BookingStatus::Cancelled;
            Ok(full_booking)
        })
    }

    fn review_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
        decision: ReviewDecision,
    ) -> Result<models::FullBooking, StoreError> {
        auth_token.check_privilege(Privilege::ReviewBookings)?;
        let target = decision.target_status();

        self.connection.transaction(|connection| {
            let mut full_booking = load_full_booking(connection, booking_id)?;
            update_status_checked(connection, &full_booking.booking, target)?;
            full_booking.booking.status = target;
            Ok(full_booking)
        })
    }

    fn complete_elapsed_bookings(
        &mut self,
        auth_token: &GlobalAuthToken,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_privilege(Privilege::ReviewBookings)?;

        let today = now.date_naive();
        let time_of_day = now.time();
        Ok(diesel::update(bookings)
            .filter(status.eq(BookingStatus::Approved))
            .filter(
                booking_date
                    .lt(today)
                    .or(booking_date.eq(today).and(slot_end.le(time_of_day))),
            )
            .set(status.eq(BookingStatus::Completed))
            .execute(&mut self.connection)?)
    }
}

/// Create an Sql expression to check if a row has been created or updated by a Postgres "upsert"
/// statement
fn sql_upsert_is_updated() -> diesel::expression::SqlLiteral<diesel::sql_types::Bool> {
    // See https://stackoverflow.com/q/34762732 and https://stackoverflow.com/q/49597793
    diesel::dsl::sql("xmax::text <> '0'")
}
