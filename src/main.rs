use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use log::{info, initialize_logger};
use tokio::sync::mpsc;
use warp::Filter;

use tracker::config::{
    flag_variable, get_variable, get_variable_or, parse_variable, seconds_variable, Storage,
};
use tracker::db::{connect_with_retry, MemoryDb, PgDb};
use tracker::environment::{Config, Environment, SafeDb};
use tracker::routes;
use tracker::session::{Sessions, MAX_SESSION_TTL};
use tracker::urls::Urls;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = parse_variable("TRACKER_PORT", 3000)?;
    let admin_port: u16 = parse_variable("TRACKER_ADMIN_PORT", 3001)?;
    let storage: Storage = parse_variable("TRACKER_STORAGE", Storage::Memory)?;

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port, "storage" => ?storage);
    let logger = Arc::new(logger);

    let db: Arc<SafeDb> = match storage {
        Storage::Memory => Arc::new(MemoryDb::new()),
        Storage::Postgres => {
            info!(logger, "Creating database pool...");
            let connection_string = get_variable("TRACKER_DB_CONNECTION_STRING");
            let attempts = parse_variable("TRACKER_DB_CONNECT_ATTEMPTS", 5)?;
            let delay = Duration::from_secs(parse_variable("TRACKER_DB_RETRY_SECONDS", 5)?);

            let pool = connect_with_retry(&logger, &connection_string, attempts, delay).await?;
            Arc::new(PgDb::new(pool))
        }
    };

    let sessions = Arc::new(Sessions::new(seconds_variable(
        "TRACKER_SESSION_TTL_SECONDS",
        Duration::from_secs(24 * 60 * 60),
        MAX_SESSION_TTL,
    )?));

    let urls = Arc::new(Urls::new(get_variable_or(
        "TRACKER_BASE_URL",
        "http://localhost:3000/",
    ))?);

    let config = Config::new(
        flag_variable("TRACKER_REQUIRE_LOGIN", true)?,
        get_variable_or("TRACKER_PUBLIC_DIR", "public"),
    );
    info!(logger, "Configured"; "require_login" => config.require_login(), "public_dir" => %config.public_dir().display());

    let environment = Environment::new(logger.clone(), db, sessions, urls, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // a closed channel means shutdown is already under way
            termination_sender.send(()).await.ok();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::make_routes(environment.clone());

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone())
            .or(routes::admin::make_termination_route(terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
