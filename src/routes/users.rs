use crate::auth::CurrentUser;
use actix_web::{get, HttpResponse, Responder};

/// Returns the user the presented session token belongs to.
#[get("/me")]
pub async fn me(CurrentUser(user): CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(user)
}
