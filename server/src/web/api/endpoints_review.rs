use crate::data_store::ReviewDecision;
use crate::web::api::{APIError, BearerTokenHeader};
use crate::web::AppState;
use actix_web::{get, patch, web, Responder};
use roombook_api_types::Booking;
use uuid::Uuid;

#[get("/bookings/all")]
async fn list_all_bookings(
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
        Ok(store.get_all_bookings(&auth)?)
    })
    .await??;
    Ok(web::Json(
        bookings.into_iter().map(Booking::from).collect::<Vec<_>>(),
    ))
}

async fn review_booking(
    booking_id: Uuid,
    decision: ReviewDecision,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<web::Json<Booking>, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let booking = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.review_booking(&auth, booking_id, decision)?)
    })
    .await??;
    Ok(web::Json(Booking::from(booking)))
}

#[patch("/bookings/{bookingId}/approve")]
async fn approve_booking(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    review_booking(
        path.into_inner(),
        ReviewDecision::Approve,
        state,
        session_token_header,
    )
    .await
}

#[patch("/bookings/{bookingId}/reject")]
async fn reject_booking(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    review_booking(
        path.into_inner(),
        ReviewDecision::Reject,
        state,
        session_token_header,
    )
    .await
}
