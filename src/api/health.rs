use actix_web::{HttpResponse, Responder, get};

#[get("/heartbeat")]
pub async fn heartbeat() -> impl Responder {
    HttpResponse::Ok().body("SolverNet Blockchain API\n")
}

#[get("/home")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().body("SolverNet Blockchain API\n")
}
