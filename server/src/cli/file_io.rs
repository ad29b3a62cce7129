use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::GlobalAuthToken;
use crate::data_store::{get_store_from_env, models, BookingStore};
use roombook_api_types::Room;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Load the room catalog from a JSON file and upsert it into the database.
///
/// The file contains a JSON array of rooms in the API representation. Rooms are matched by their
/// id, so re-loading an updated file overwrites the existing room records in place.
pub fn load_rooms_from_file(path: &PathBuf) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let f = File::open(path).map_err(|e| {
        CliError::FileError(format!("Could not open {:?} for reading: {}", path, e))
    })?;
    let rooms: Vec<Room> = serde_json::from_reader(BufReader::new(f))?;

    let auth_key = CliAuthTokenKey::new();
    let admin_auth_token = GlobalAuthToken::create_for_cli(&auth_key);

    let mut created = 0usize;
    let mut updated = 0usize;
    for room in rooms {
        let is_new =
            data_store.create_or_update_room(&admin_auth_token, models::Room::from(room))?;
        if is_new {
            created += 1;
        } else {
            updated += 1;
        }
    }
    println!("Loaded rooms: {} created, {} updated.", created, updated);

    Ok(())
}
