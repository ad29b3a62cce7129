use crate::auth_session::SessionToken;
use crate::data_store::store_mock::StoreMock;
use crate::data_store::StoreError;
use crate::web::AppState;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use roombook_api_types as api;
use std::sync::Arc;
use uuid::Uuid;


use sample_data::{
    fill_sample_data, LECTURE_HALL_ID, OTHER_STUDENT_ID, SEMINAR_ROOM_ID, STAFF_ID, STUDENT_ID,
    STUDENT_PASSWORD,
};

const SECRET: &str = "unittest-secret";

fn test_state(store: Arc<StoreMock>) -> AppState {
    AppState {
        store,
        secret: SECRET.to_owned(),
    }
}

fn auth_header(user_id: Uuid) -> (&'static str, String) {
    let token = SessionToken::new(user_id).as_string(SECRET);
    ("Authorization", format!("Bearer {}", token))
}

fn clock(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Days::new(1)
}

fn booking_request(room_id: Uuid, date: NaiveDate, start_hour: u32) -> api::NewBooking {
    api::NewBooking {
        room_id,
        booking_date: date,
        slot_start: clock(start_hour),
        slot_end: clock(start_hour + 2),
        purpose: "Study group meeting".to_owned(),
        notes: String::new(),
    }
}

macro_rules! test_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(test_state($store.clone())))
                .configure(crate::web::api::configure_app),
        )
        .await
    };
}

#[actix_web::test]
async fn login_and_check_authorization() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(api::LoginRequest {
            email: "sam@example.edu".to_owned(),
            password: STUDENT_PASSWORD.to_owned(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: api::LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.user.id, STUDENT_ID);
    assert_eq!(login.user.role, api::Role::Student);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth")
        .insert_header(("Authorization", format!("Bearer {}", login.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: api::User = test::read_body_json(resp).await;
    assert_eq!(user.email, "sam@example.edu");
}

#[actix_web::test]
async fn login_with_bad_credentials_fails() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(api::LoginRequest {
            email: "sam@example.edu".to_owned(),
            password: "wrong password".to_owned(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // An unknown email address must be indistinguishable from a wrong password
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(api::LoginRequest {
            email: "nobody@example.edu".to_owned(),
            password: STUDENT_PASSWORD.to_owned(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn requests_without_token_are_rejected() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::get().uri("/api/v1/rooms").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_request(LECTURE_HALL_ID, tomorrow(), 9))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .insert_header(("Authorization", "Bearer not-a-valid-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn list_rooms_works() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rooms: Vec<api::Room> = test::read_body_json(resp).await;
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].name, "Lecture Hall 1");
    assert_eq!(rooms[1].name, "Seminar Room 2.04");
}

#[actix_web::test]
async fn created_booking_shows_up_as_busy_slot() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);
    let date = tomorrow();

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 9))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booking: api::Booking = test::read_body_json(resp).await;
    assert_eq!(booking.status, api::BookingStatus::Pending);
    assert_eq!(booking.user_name, "Sam Student");
    assert_eq!(booking.room.id, LECTURE_HALL_ID);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/busy-slots?date={}",
            LECTURE_HALL_ID, date
        ))
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let busy: Vec<api::BusySlotEntry> = test::read_body_json(resp).await;
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].slot_start, clock(9));
    assert_eq!(busy[0].status, api::BusyStatus::Pending);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/availability?date={}",
            LECTURE_HALL_ID, date
        ))
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let slots: Vec<api::ClassifiedSlot> = test::read_body_json(resp).await;
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[1].status, api::SlotStatus::Pending);
    for slot in [&slots[0], &slots[2], &slots[3], &slots[4]] {
        assert_eq!(slot.status, api::SlotStatus::Available);
    }

    // The same slot in another room stays available
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/busy-slots?date={}",
            SEMINAR_ROOM_ID, date
        ))
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let busy: Vec<api::BusySlotEntry> = test::read_body_json(resp).await;
    assert!(busy.is_empty());
}

#[actix_web::test]
async fn conflicting_booking_is_refused() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);
    let date = tomorrow();

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 9))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 9))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(store.data.lock().unwrap().bookings.len(), 1);

    // Another slot of the same room and date is still bookable
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 13))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );
    assert_eq!(store.data.lock().unwrap().bookings.len(), 2);
}

#[actix_web::test]
async fn invalid_booking_submissions_are_refused() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let mut without_purpose = booking_request(LECTURE_HALL_ID, tomorrow(), 9);
    without_purpose.purpose = "   ".to_owned();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(without_purpose)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let past_date = booking_request(
        LECTURE_HALL_ID,
        Utc::now().date_naive() - Days::new(1),
        9,
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(past_date)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // 11:00 to 13:00 is the midday break, not a catalog slot
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, tomorrow(), 11))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // An unknown room is reported as invalid data, not as a conflict
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(Uuid::new_v4(), tomorrow(), 9))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert!(store.data.lock().unwrap().bookings.is_empty());
}

#[actix_web::test]
async fn cancelling_a_booking_frees_its_slot() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);
    let date = tomorrow();

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 15))
        .to_request();
    let booking: api::Booking = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/cancel", booking.id))
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: api::Booking = test::read_body_json(resp).await;
    assert_eq!(cancelled.status, api::BookingStatus::Cancelled);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/busy-slots?date={}",
            LECTURE_HALL_ID, date
        ))
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    let busy: Vec<api::BusySlotEntry> =
        test::read_body_json(test::call_service(&app, req).await).await;
    assert!(busy.is_empty());

    // The slot can be booked again now
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 15))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );
}

#[actix_web::test]
async fn only_the_owner_can_cancel_a_booking() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, tomorrow(), 9))
        .to_request();
    let booking: api::Booking = test::read_body_json(test::call_service(&app, req).await).await;

    for user_id in [OTHER_STUDENT_ID, STAFF_ID] {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/v1/bookings/{}/cancel", booking.id))
            .insert_header(auth_header(user_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}

#[actix_web::test]
async fn review_approves_and_rejects_pending_bookings() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);
    let date = tomorrow();

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 9))
        .to_request();
    let first: api::Booking = test::read_body_json(test::call_service(&app, req).await).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, date, 13))
        .to_request();
    let second: api::Booking = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/approve", first.id))
        .insert_header(auth_header(STAFF_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let approved: api::Booking = test::read_body_json(resp).await;
    assert_eq!(approved.status, api::BookingStatus::Approved);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/reject", second.id))
        .insert_header(auth_header(STAFF_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rejected: api::Booking = test::read_body_json(resp).await;
    assert_eq!(rejected.status, api::BookingStatus::Rejected);

    // The approved slot stays busy, the rejected one is free again
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/busy-slots?date={}",
            LECTURE_HALL_ID, date
        ))
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    let busy: Vec<api::BusySlotEntry> =
        test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].slot_start, clock(9));
    assert_eq!(busy[0].status, api::BusyStatus::Approved);
}

#[actix_web::test]
async fn settled_bookings_cannot_change_anymore() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, tomorrow(), 9))
        .to_request();
    let booking: api::Booking = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/approve", booking.id))
        .insert_header(auth_header(STAFF_ID))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Approving twice is not a legal transition
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/approve", booking.id))
        .insert_header(auth_header(STAFF_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    // Cancelling an already approved booking is refused as well
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/cancel", booking.id))
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );
}

#[actix_web::test]
async fn review_endpoints_require_staff_role() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, tomorrow(), 9))
        .to_request();
    let booking: api::Booking = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}/approve", booking.id))
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings/all")
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings/all")
        .insert_header(auth_header(STAFF_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let all: Vec<api::Booking> = test::read_body_json(resp).await;
    assert_eq!(all.len(), 1);
}

#[actix_web::test]
async fn own_booking_list_is_scoped_to_the_user() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .set_json(booking_request(LECTURE_HALL_ID, tomorrow(), 9))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(OTHER_STUDENT_ID))
        .set_json(booking_request(SEMINAR_ROOM_ID, tomorrow(), 9))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings")
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    let own: Vec<api::Booking> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].user_id, STUDENT_ID);
    assert_eq!(own[0].room.id, LECTURE_HALL_ID);
}

#[actix_web::test]
async fn unknown_room_is_reported_as_not_found() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/busy-slots?date={}",
            Uuid::new_v4(),
            tomorrow()
        ))
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn store_errors_are_mapped_to_http_errors() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test_app!(store);

    store.data.lock().unwrap().next_error = Some(StoreError::TransactionConflict);
    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .insert_header(auth_header(STUDENT_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
