use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io::{Error, ErrorKind};
use tracing::{error, info};

use food_lovers::utils::panic_hook;
use food_lovers::{api, logging, AppState, Config, Store};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env().map_err(|e| Error::new(ErrorKind::InvalidInput, e))?;
    logging::init_logging(&config);
    panic_hook::init();

    // Local runs attach now; platform runs attach on the first request.
    let store = Store::for_target(&config).await.map_err(|e| {
        error!("Failed to open database at {}: {}", config.database_path, e);
        Error::new(ErrorKind::Other, e)
    })?;
    if store.is_attached() {
        info!("Database connected successfully!");
    }

    let state = web::Data::new(AppState::new(store, config.featured_limit));
    let json_limit = config.json_limit;
    let addr = config.bind_addr();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(api::json_config(json_limit))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind(&addr)?;

    info!(
        deploy_target = ?config.deploy_target,
        "Local Food Lovers Network Server is running on {addr}"
    );
    server.run().await
}
