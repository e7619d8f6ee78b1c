//! Applies the tracker's migrations to the database named by
//! `TRACKER_DB_CONNECTION_STRING`.

use std::env;

use movine::Movine;
use postgres::{Client, NoTls};

use log::{debug, info, initialize_logger};

const DEFAULT_MIGRATIONS_DIR: &str = "./migrations";

fn main() {
    dotenv::dotenv().ok();

    let logger = initialize_logger();
    let connection_string = env::var("TRACKER_DB_CONNECTION_STRING")
        .expect("could not read TRACKER_DB_CONNECTION_STRING");
    let migrations_dir =
        env::var("TRACKER_MIGRATIONS_DIR").unwrap_or_else(|_| DEFAULT_MIGRATIONS_DIR.to_owned());

    debug!(logger, "Connecting to database...");

    let client = Client::connect(&connection_string, NoTls).expect("could not connect to database");

    let mut movine = Movine::new(client);
    movine.set_migration_dir(&migrations_dir);

    if movine.status().is_err() {
        debug!(logger, "Initializing movine...");
        movine.initialize().expect("failed to initialize movine")
    }

    debug!(logger, "Running migrations..."; "directory" => &migrations_dir);
    movine.up().expect("failed to run migrations");

    info!(logger, "Database is ready"; "version" => info::VERSION);
}
