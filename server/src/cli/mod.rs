pub mod database_migration;
pub mod file_io;
pub mod maintenance;
pub mod manage_users;
mod util;

pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}
