use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use log::info;
use sqlx::postgres::PgPoolOptions;

use sqi_calculator::api;
use sqi_calculator::config::Config;
use sqi_calculator::service::CalculatorService;
use sqi_calculator::store::PgQuotationStore;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Can't connect to the database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Can't apply database migrations")?;
    info!("Database ready");

    let service = web::Data::new(CalculatorService::with_series(
        PgQuotationStore::new(pool),
        config.series_id.clone(),
    ));

    info!(
        "Calculator listening on {} for series {}",
        config.bind_address, config.series_id
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(api::configure::<PgQuotationStore>)
    })
    .bind(&config.bind_address)
    .with_context(|| format!("Can't bind to {}", config.bind_address))?
    .run()
    .await?;

    Ok(())
}
