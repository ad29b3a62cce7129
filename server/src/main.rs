use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::warn;
use std::path::PathBuf;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if dotenv_result.is_err() {
        warn!("Could not read .env file: {}", dotenv_result.unwrap_err());
    }

    let result = match args.command {
        Command::Serve => roombook_server::cli::database_migration::check_migration_state()
            .and_then(|()| roombook_server::web::serve()),
        Command::MigrateDatabase => roombook_server::cli::database_migration::run_migrations(),
        Command::LoadRooms { path } => roombook_server::cli::file_io::load_rooms_from_file(&path),
        Command::CreateUser { email, name, role } => {
            roombook_server::cli::manage_users::create_user(email, name, role)
        }
        Command::CompleteElapsed => roombook_server::cli::maintenance::complete_elapsed_bookings(),
    };

    if let Err(error) = result {
        eprintln!("Error: {}", error);
        std::process::exit(error.exit_code());
    }
}

/// Backend server and management cli of the room booking service
#[derive(Debug, Parser)]
#[clap(name = "roombook-server", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the room booking web API
    Serve,
    /// Migrate the database schema to the latest version
    MigrateDatabase,
    /// Load the room catalog from a JSON file, creating or updating rooms by id
    LoadRooms {
        /// The path of the JSON file to read from
        path: PathBuf,
    },
    /// Create a new user account. The password is queried interactively.
    CreateUser {
        /// Email address of the new user (used for login)
        email: String,
        /// Display name of the new user
        name: String,
        /// Role of the new user ("student" or "staff")
        role: String,
    },
    /// Mark approved bookings whose slot has elapsed as completed
    CompleteElapsed,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
