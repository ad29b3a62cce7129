use chrono::{naive::NaiveDate, naive::NaiveTime, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub capacity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

/// Status of a busy-slot entry. Only pending and approved bookings occupy a
/// slot, so the busy-slot query never reports other statuses.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum BusyStatus {
    Pending,
    Approved,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BusySlotEntry {
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub status: BusyStatus,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Pending,
    Approved,
}

/// One catalog slot of a (room, date) pair, classified by the availability
/// resolver.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClassifiedSlot {
    pub id: String,
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub label: String,
    pub status: SlotStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub room: Room,
    pub booking_date: NaiveDate,
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub purpose: String,
    #[serde(default)]
    pub notes: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewBooking {
    pub room_id: Uuid,
    pub booking_date: NaiveDate,
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub purpose: String,
    #[serde(default)]
    pub notes: String,
}
