use crate::data_store::auth_token::EnumMemberNotExistingError;
use chrono::{naive::NaiveDate, naive::NaiveTime, DateTime, Utc};
use diesel::deserialize::FromSql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{Output, ToSql};
use diesel::sql_types::Int4;
use diesel::{AsExpression, FromSqlRow};
use roombook_api_types::{BusySlotEntry, BusyStatus};
use uuid::Uuid;

/// The lifecycle states of a booking.
///
/// A booking starts out as [Pending](BookingStatus::Pending) and moves through the state machine
/// defined by [BookingStatus::can_transition]. Rejected, Cancelled and Completed are terminal.
/// Only Pending and Approved bookings occupy their slot, see [BookingStatus::busy_status].
#[derive(Clone, Copy, Debug, Eq, PartialEq, AsExpression, FromSqlRow)]
#[diesel(sql_type = Int4)]
#[repr(i32)]
pub enum BookingStatus {
    Pending = 1,
    Approved = 2,
    Rejected = 3,
    Cancelled = 4,
    Completed = 5,
}

impl BookingStatus {
    /// Check if the transition from this status to `target` is a legal lifecycle edge.
    ///
    /// Legal edges are Pending → Approved/Rejected (staff review), Pending → Cancelled (owning
    /// user) and Approved → Completed (maintenance sweep after the slot has elapsed). There is no
    /// edge out of a terminal state and no self transition.
    pub fn can_transition(self, target: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, target),
            (BookingStatus::Pending, BookingStatus::Approved)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Approved, BookingStatus::Completed)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    /// The status this booking contributes to the busy-slot set, if any. A booking with a status
    /// mapping to `None` does not make its slot unavailable for new requests.
    pub fn busy_status(self) -> Option<BusyStatus> {
        match self {
            BookingStatus::Pending => Some(BusyStatus::Pending),
            BookingStatus::Approved => Some(BusyStatus::Approved),
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed => None,
        }
    }
}

impl TryFrom<i32> for BookingStatus {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BookingStatus::Pending),
            2 => Ok(BookingStatus::Approved),
            3 => Ok(BookingStatus::Rejected),
            4 => Ok(BookingStatus::Cancelled),
            5 => Ok(BookingStatus::Completed),
            value => Err(EnumMemberNotExistingError {
                member_value: value,
                enum_name: "BookingStatus",
            }),
        }
    }
}

impl<DB> FromSql<Int4, DB> for BookingStatus
where
    DB: diesel::backend::Backend,
    i32: FromSql<Int4, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let value = i32::from_sql(bytes)?;
        Ok(Self::try_from(value)?)
    }
}

impl ToSql<Int4, Pg> for BookingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> diesel::serialize::Result {
        match self {
            BookingStatus::Pending => <i32 as ToSql<Int4, Pg>>::to_sql(&1, &mut out.reborrow()),
            BookingStatus::Approved => <i32 as ToSql<Int4, Pg>>::to_sql(&2, &mut out.reborrow()),
            BookingStatus::Rejected => <i32 as ToSql<Int4, Pg>>::to_sql(&3, &mut out.reborrow()),
            BookingStatus::Cancelled => <i32 as ToSql<Int4, Pg>>::to_sql(&4, &mut out.reborrow()),
            BookingStatus::Completed => <i32 as ToSql<Int4, Pg>>::to_sql(&5, &mut out.reborrow()),
        }
    }
}

impl From<BookingStatus> for roombook_api_types::BookingStatus {
    fn from(value: BookingStatus) -> Self {
        match value {
            BookingStatus::Pending => Self::Pending,
            BookingStatus::Approved => Self::Approved,
            BookingStatus::Rejected => Self::Rejected,
            BookingStatus::Cancelled => Self::Cancelled,
            BookingStatus::Completed => Self::Completed,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name=super::schema::rooms)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub room_type: String,
    pub capacity: i32,
    pub image_url: Option<String>,
}

impl From<roombook_api_types::Room> for Room {
    fn from(value: roombook_api_types::Room) -> Self {
        Self {
            id: value.id,
            name: value.name,
            room_type: value.room_type,
            capacity: value.capacity,
            image_url: value.image_url,
        }
    }
}

impl From<Room> for roombook_api_types::Room {
    fn from(value: Room) -> Self {
        Self {
            id: value.id,
            name: value.name,
            room_type: value.room_type,
            capacity: value.capacity,
            image_url: value.image_url,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name=super::schema::users)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Stored representation of [super::auth_token::AccessRole]
    pub role: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<User> for roombook_api_types::User {
    type Error = super::auth_token::EnumMemberNotExistingError;

    fn try_from(value: User) -> Result<Self, Self::Error> {
        let role = super::auth_token::AccessRole::try_from(value.role)?;
        Ok(Self {
            id: value.id,
            name: value.name,
            email: value.email,
            role: role.into(),
        })
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name=super::schema::bookings)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub booking_date: NaiveDate,
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub purpose: String,
    pub notes: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// The booking's contribution to the busy-slot set of its (room, date) pair, if its status
    /// blocks the slot.
    pub fn busy_entry(&self) -> Option<BusySlotEntry> {
        self.status.busy_status().map(|status| BusySlotEntry {
            slot_start: self.slot_start,
            slot_end: self.slot_end,
            status,
        })
    }
}

/// A booking together with its room and the requesting user's display name, as rendered in
/// booking lists.
#[derive(Clone, Debug)]
pub struct FullBooking {
    pub booking: Booking,
    pub room: Room,
    pub user_name: String,
}

impl From<FullBooking> for roombook_api_types::Booking {
    fn from(value: FullBooking) -> Self {
        Self {
            id: value.booking.id,
            user_id: value.booking.user_id,
            user_name: value.user_name,
            room: value.room.into(),
            booking_date: value.booking.booking_date,
            slot_start: value.booking.slot_start,
            slot_end: value.booking.slot_end,
            purpose: value.booking.purpose,
            notes: value.booking.notes,
            status: value.booking.status.into(),
            created_at: value.booking.created_at,
        }
    }
}
