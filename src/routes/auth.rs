use crate::{
    auth::{LoginRequest, SessionManager},
    error::AppError,
};
use actix_web::{error::JsonPayloadError, post, web, HttpRequest, HttpResponse, Responder};
use log::debug;
use validator::Validate;

/// Renders unparseable login bodies as `AppError::BadRequest` JSON.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        debug!("Rejected login payload: {}", err);
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Login user
///
/// Authenticates a user and returns a session token of the form
/// `"Bearer <jwt>"` together with the session's expiry.
///
/// ## Responses:
/// - `200 OK`: `{"token": "...", "expiredAt": "..."}`.
/// - `400 Bad Request`: body is not a login payload.
/// - `401 Unauthorized`: wrong password.
/// - `404 Not Found`: no user with that email.
/// - `422 Unprocessable Entity`: malformed email or empty password.
#[post("/login")]
pub async fn login(
    sessions: web::Data<SessionManager>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let session = sessions
        .issue_session(&login_data.email, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        BcryptHasher, Clock, IssuedSession, MemoryTokenStore, MemoryUserDirectory, PasswordHasher,
        SystemClock, TokenSigner,
    };
    use crate::models::Role;
    use actix_web::{http::StatusCode, test, App};
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;

    fn sessions() -> (SessionManager, MemoryTokenStore) {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let hasher = BcryptHasher::new(4);
        let users = MemoryUserDirectory::new();
        users.add(
            "alice",
            "alice@example.com",
            &hasher.generate_hash("Password123!").unwrap(),
            Role::WebUser,
        );
        let store = MemoryTokenStore::new();
        let signer = TokenSigner::new("route-test-secret", Duration::hours(1), clock.clone()).unwrap();

        let manager = SessionManager::new(
            signer,
            Arc::new(store.clone()),
            Arc::new(users),
            Arc::new(hasher),
            clock,
        );
        (manager, store)
    }

    #[actix_rt::test]
    async fn test_login_responses() {
        let (manager, store) = sessions();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(manager))
                .app_data(json_config())
                .service(login),
        )
        .await;

        let cases = vec![
            (
                json!({ "email": "alice@example.com", "password": "wrong" }),
                StatusCode::UNAUTHORIZED,
                "incorrect password",
            ),
            (
                json!({ "email": "nobody@example.com", "password": "Password123!" }),
                StatusCode::NOT_FOUND,
                "unknown email",
            ),
            (
                json!({ "email": "not-an-email", "password": "Password123!" }),
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid email format",
            ),
            (
                json!({ "email": "alice@example.com" }),
                StatusCode::BAD_REQUEST,
                "missing password",
            ),
        ];

        for (payload, expected_status, description) in cases {
            let req = test::TestRequest::post()
                .uri("/login")
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected_status, "case: {}", description);
        }
        assert!(store.is_empty(), "failed logins must not create sessions");

        let req = test::TestRequest::post()
            .uri("/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"email\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string(), "truncated body renders a JSON error");

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": "alice@example.com", "password": "Password123!" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["expiredAt"].is_string());

        let session: IssuedSession = serde_json::from_value(body).unwrap();
        assert!(session.token.starts_with("Bearer "));
        assert_eq!(store.len(), 1);
    }
}
