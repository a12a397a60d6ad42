pub mod auth;
pub mod health;
pub mod users;

use actix_web::web;

/// Registers the `/api` routes. Wrap the enclosing scope in
/// `AuthMiddleware` to protect everything except login.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .app_data(auth::json_config())
            .service(auth::login),
    )
    .service(web::scope("/users").service(users::me));
}
