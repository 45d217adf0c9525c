use actix_web::{middleware, web, App, HttpServer};
use std::sync::{Arc, Mutex};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use racecast::config::AppConfig;
use racecast::data::{DimensionTables, FeatureTable};
use racecast::handlers::{health, predict, AppState};
use racecast::predictor::ModelSet;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    // Configuration problems and missing data are startup failures, never
    // served as empty results
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let table = match FeatureTable::load_csv(&config.data_path) {
        Ok(table) => table,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let models = match ModelSet::load(&config.models_dir) {
        Ok(models) => models,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let dims = DimensionTables::load(&config.dims_dir);

    let app_state = Arc::new(AppState {
        table,
        models: Mutex::new(models),
        dims,
    });

    info!("Starting racecast API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/predict", web::get().to(predict::predict_race))
    })
    .bind(&addr)?
    .run()
    .await
}
