use crate::schedule;
use crate::web::api::{APIError, BearerTokenHeader};
use crate::web::AppState;
use actix_web::{get, web, Responder};
use chrono::NaiveDate;
use roombook_api_types::Room;
use serde::Deserialize;
use uuid::Uuid;

#[get("/rooms")]
async fn list_rooms(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let rooms = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_rooms(&auth)?)
    })
    .await??;
    Ok(web::Json(
        rooms.into_iter().map(Room::from).collect::<Vec<_>>(),
    ))
}

#[derive(Deserialize)]
struct DateQuery {
    date: NaiveDate,
}

#[get("/rooms/{roomId}/busy-slots")]
async fn get_busy_slots(
    path: web::Path<Uuid>,
    query: web::Query<DateQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let date = query.into_inner().date;
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let busy_slots = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_busy_slots(&auth, room_id, date)?)
    })
    .await??;
    Ok(web::Json(busy_slots))
}

#[get("/rooms/{roomId}/availability")]
async fn get_availability(
    path: web::Path<Uuid>,
    query: web::Query<DateQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let date = query.into_inner().date;
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let busy_slots = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_busy_slots(&auth, room_id, date)?)
    })
    .await??;
    Ok(web::Json(schedule::resolve_availability(&busy_slots)))
}
