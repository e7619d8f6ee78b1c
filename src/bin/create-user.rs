use std::error::Error;
use std::time::Duration;

use dotenv::dotenv;
use structopt::StructOpt;

use log::{info, initialize_logger};
use tracker::config::{get_variable, parse_variable};
use tracker::db::{connect_with_retry, Db, PgDb};
use tracker::user::{Credentials, LoginRequest};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "create-user",
    about = "Create an account directly in the tracker database"
)]
struct Opt {
    /// The name to log in with
    username: String,

    /// The password to log in with
    #[structopt(long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let (username, password) = LoginRequest::new(opt.username, opt.password).into_registration()?;

    let connection_string = get_variable("TRACKER_DB_CONNECTION_STRING");
    let attempts = parse_variable("TRACKER_DB_CONNECT_ATTEMPTS", 5)?;
    let delay = Duration::from_secs(parse_variable("TRACKER_DB_RETRY_SECONDS", 5)?);
    let pool = connect_with_retry(&logger, &connection_string, attempts, delay).await?;
    let db = PgDb::new(pool);

    info!(logger, "Creating user..."; "username" => &username);
    db.create_user(&username, Credentials::new(&password)).await?;

    println!("Created user {}", username);

    Ok(())
}
