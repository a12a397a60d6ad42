use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::session::{SessionError, SessionManager};
use crate::error::AppError;

/// Paths reachable without a session.
const PUBLIC_PATHS: [&str; 2] = ["/health", "/api/auth/login"];

/// Authorization gate.
///
/// Reads the `Authorization` header, hands the raw value to
/// [`SessionManager::validate_session`] and stores the resolved
/// [`User`](crate::models::User) in the request extensions. The
/// `SessionManager` must be registered as `web::Data<SessionManager>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            return Box::pin(self.service.call(req));
        }

        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let sessions = req.app_data::<web::Data<SessionManager>>().cloned();
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let presented =
                presented.ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;
            let sessions = sessions.ok_or_else(|| {
                AppError::InternalServerError("Session manager not configured".into())
            })?;

            let user = sessions
                .validate_session(&presented)
                .await
                .map_err(gate_error)?;

            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}

/// Every session failure is a 401 at the gate; only store and internal
/// failures surface as 500.
pub fn gate_error(error: SessionError) -> AppError {
    match error {
        SessionError::Store(store_error) => AppError::from(store_error),
        SessionError::Internal(msg) => AppError::InternalServerError(msg),
        other => AppError::Unauthorized(other.to_string()),
    }
}
