use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use sqlx::PgPool;
use std::io;
use std::sync::Arc;

use taskdesk::auth::{
    AuthMiddleware, BcryptHasher, Clock, PgTokenStore, PgUserDirectory, SessionManager,
    SystemClock, TokenSigner,
};
use taskdesk::config::Config;
use taskdesk::routes::{self, health};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let signer = TokenSigner::new(&config.jwt_secret, config.token_ttl, clock.clone())
        .map_err(|e| startup_error("Invalid signing secret", e))?;
    let sessions = SessionManager::new(
        signer,
        Arc::new(PgTokenStore::new(pool.clone())),
        Arc::new(PgUserDirectory::new(pool)),
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        clock,
    );
    let sessions = web::Data::new(sessions);

    info!("Starting TaskDesk server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(sessions.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
