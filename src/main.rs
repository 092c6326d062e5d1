use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use async_openai::config::OpenAIConfig;
use async_openai::Client;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

mod config;
mod errors;
mod middleware;
mod models;
mod prompts;
mod routes;
mod service;
mod types;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::middleware::auth::Authentication;
use crate::service::{ChatEngine, Notifier, RazorpayClient};

pub struct AppState {
    pub pool: PgPool,
    pub chat_engine: ChatEngine,
    pub gateway: RazorpayClient,
    pub notifier: Notifier,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkchat=debug,actix_web=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database connection established and migrations applied");

    let oai_client = Client::with_config(OpenAIConfig::new().with_api_key(&config.openai_api_key));
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let gateway = RazorpayClient::new(
        http.clone(),
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    );
    let notifier = Notifier::from_config(http, &config);

    let app_state = Arc::new(AppState {
        pool: pool.clone(),
        chat_engine: ChatEngine::new(pool, oai_client),
        gateway,
        notifier,
    });
    let app_config = Arc::new(config);
    let port = app_config.port;

    info!("Starting server on port {}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::validation(err.to_string()).into()
            }))
            .wrap(Authentication {
                app_config: app_config.clone(),
            })
            .wrap(Cors::permissive())
            .service(routes::health::health_check)
            .service(routes::parks::list_parks)
            .service(routes::parks::park_availability)
            .service(routes::chat::chat)
            .service(routes::bookings::list_bookings)
            .service(routes::bookings::create_booking)
            .service(routes::bookings::cancel_booking)
            .service(routes::payments::create_order)
            .service(routes::payments::verify_payment)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
