mod chain;
mod health;
pub mod models;
mod submit;

use actix_cors::Cors;
use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

/// Browser frontends are served from other origins; accept all of them.
pub fn cors() -> Cors {
    Cors::permissive()
}

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::heartbeat)
            .service(health::home)
            .service(chain::get_blockchain)
            .service(chain::get_current_state)
            .service(chain::validate_chain)
            .service(submit::send_problem)
            .service(submit::send_proposed_solution),
    );
}
