use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::GlobalAuthToken;
use crate::data_store::{get_store_from_env, BookingStore};
use chrono::Utc;

/// Mark all approved bookings whose slot has fully elapsed as completed.
///
/// Meant to be run periodically (e.g. from a cron job). Prints the number of affected bookings.
pub fn complete_elapsed_bookings() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let admin_auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let count = data_store.complete_elapsed_bookings(&admin_auth_token, Utc::now())?;
    println!("Marked {} elapsed bookings as completed.", count);

    Ok(())
}
