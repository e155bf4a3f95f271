use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::FutureExt;
use log::{error, info, initialize_logger};
use tokio::sync::mpsc;
use warp::Filter;

use goshuin::catalog::{Catalog, MemoryCatalog};
use goshuin::config::{get_optional, get_variable};
use goshuin::environment::{Config, Environment};
use goshuin::nearby::DEFAULT_SERVER_RADIUS_KM;
use goshuin::records::{JsonRecordStore, RecordStore};
use goshuin::routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("GOSHUIN_PORT")
        .parse()
        .expect("parse GOSHUIN_PORT as u16");
    let admin_port: u16 = get_variable("GOSHUIN_ADMIN_PORT")
        .parse()
        .expect("parse GOSHUIN_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Loading catalog...");
    let catalog_path = PathBuf::from(get_variable("GOSHUIN_CATALOG_PATH"));
    let catalog = MemoryCatalog::from_json_file(&logger, &catalog_path)
        .await
        .expect("load catalog from GOSHUIN_CATALOG_PATH");
    info!(logger, "Loaded catalog"; "places" => catalog.len());
    let catalog: Arc<dyn Catalog> = Arc::new(catalog);

    let records: Arc<dyn RecordStore> = match get_optional::<PathBuf>("GOSHUIN_RECORDS_PATH") {
        Some(path) => {
            info!(logger, "Opening visit record store..."; "path" => %path.display());
            Arc::new(
                JsonRecordStore::open(path)
                    .await
                    .expect("open visit records from GOSHUIN_RECORDS_PATH"),
            )
        }
        None => {
            info!(logger, "Keeping visit records in memory");
            Arc::new(JsonRecordStore::in_memory())
        }
    };

    let config = Config::new(
        get_optional("GOSHUIN_NEARBY_RADIUS_KM").unwrap_or(DEFAULT_SERVER_RADIUS_KM),
    );
    let environment = Environment::new(logger.clone(), catalog, records, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = {
        let logger = logger.clone();

        Arc::new(move || {
            let termination_sender = termination_sender.clone();
            let logger = logger.clone();

            async move {
                if termination_sender.send(()).await.is_err() {
                    error!(logger, "Shutdown already in progress");
                }
            }
            .boxed()
        })
    };

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

        let routes = routes::make_api(environment.clone());

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

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
