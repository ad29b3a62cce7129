use crate::auth_session::hash_password;
use crate::cli::util::query_user_and_check;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::{AccessRole, GlobalAuthToken};
use crate::data_store::{get_store_from_env, models, BookingStore};
use chrono::Utc;
use std::str::FromStr;
use uuid::Uuid;

/// Wrapper around [AccessRole] to parse it from its command line representation.
struct AccessRoleArg(AccessRole);

impl FromStr for AccessRoleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self(AccessRole::Student)),
            "staff" => Ok(Self(AccessRole::Staff)),
            _ => Err(format!(
                "'{}' is not a valid role. Valid roles: student, staff",
                s
            )),
        }
    }
}

/// Create a new user account with the given email address, display name and role.
///
/// The password is queried interactively on the terminal and stored as a salted hash.
pub fn create_user(email: String, name: String, role: String) -> Result<(), CliError> {
    let role = AccessRoleArg::from_str(&role).map_err(CliError::DataError)?.0;

    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let password: String = query_user_and_check("Enter password for the new user", |v: &String| {
        if v.is_empty() {
            Err("Password must not be empty")
        } else {
            Ok(())
        }
    });

    let user = models::User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash: hash_password(&password)?,
        role: role.into(),
        created_at: Utc::now(),
    };

    let auth_key = CliAuthTokenKey::new();
    let admin_auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let user_id = data_store.create_user(&admin_auth_token, user)?;
    println!("Created user {} with role '{}'.", user_id, role.name());

    Ok(())
}
