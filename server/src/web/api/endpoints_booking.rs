use crate::web::api::{APIError, BearerTokenHeader};
use crate::web::AppState;
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use roombook_api_types::{Booking, NewBooking};
use uuid::Uuid;

#[post("/bookings")]
async fn create_booking(
    body: web::Json<NewBooking>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let booking = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.create_booking(&auth, body.into_inner())?)
    })
    .await??;
    Ok(HttpResponse::Created().json(Booking::from(booking)))
}

#[get("/bookings")]
async fn list_own_bookings(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let bookings = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_own_bookings(&auth)?)
    })
    .await??;
    Ok(web::Json(
        bookings.into_iter().map(Booking::from).collect::<Vec<_>>(),
    ))
}

#[patch("/bookings/{bookingId}/cancel")]
async fn cancel_booking(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let booking_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let booking = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.cancel_booking(&auth, booking_id)?)
    })
    .await??;
    Ok(web::Json(Booking::from(booking)))
}
