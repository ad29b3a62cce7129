use crate::auth_session::{verify_password, SessionToken};
use crate::data_store::StoreError;
use crate::web::api::{APIError, BearerTokenHeader};
use crate::web::AppState;
use actix_web::{get, post, web, Responder};
use roombook_api_types::{LoginRequest, LoginResponse, User};

#[post("/auth/login")]
async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let store = state.store.clone();
    let user = web::block(move || -> Result<_, APIError> {
        let body = body.into_inner();
        let mut store = store.get_facade()?;
        // An unknown email address and a wrong password are reported identically, so the login
        // endpoint cannot be used to probe which email addresses have an account.
        let user = store.get_user_by_email(&body.email).map_err(|e| match e {
            StoreError::NotExisting => APIError::AuthenticationFailed,
            e => e.into(),
        })?;
        if !verify_password(&user.password_hash, &body.password) {
            return Err(APIError::AuthenticationFailed);
        }
        Ok(user)
    })
    .await??;
    let token = SessionToken::new(user.id).as_string(&state.secret);
    let user = User::try_from(user).map_err(|e| APIError::InternalError(e.to_string()))?;
    Ok(web::Json(LoginResponse { token, user }))
}

#[get("/auth")]
async fn check_authorization(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<BearerTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let store = state.store.clone();
    let user = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        // The token is signed, but the account may have been deleted since it was issued.
        store
            .get_user(session_token.user_id())
            .map_err(|e| match e {
                StoreError::NotExisting => APIError::InvalidSessionToken,
                e => e.into(),
            })
    })
    .await??;
    let user = User::try_from(user).map_err(|e| APIError::InternalError(e.to_string()))?;
    Ok(web::Json(user))
}
