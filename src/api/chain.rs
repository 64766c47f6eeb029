use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, ValidateResponse};

/// Get the full blockchain.
#[get("/get_blockchain")]
pub async fn get_blockchain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.read();
    HttpResponse::Ok().json(bc.blocks())
}

/// Get the current address balances.
#[get("/get_current_state")]
pub async fn get_current_state(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.read();
    HttpResponse::Ok().json(bc.ledger())
}

/// Re-verify the whole chain and compare the ledger with a full replay.
#[get("/validate")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.read();
    HttpResponse::Ok().json(ValidateResponse {
        valid: bc.is_valid_chain(),
        length: bc.len(),
        ledger_consistent: bc.is_ledger_consistent(),
    })
}
