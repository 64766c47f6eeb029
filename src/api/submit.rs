use actix_web::{HttpResponse, Responder, post, web};
use log::{error, info, warn};

use super::models::{AppState, ErrorResponse};
use crate::blockchain::{Block, Blockchain, ChainError};
use crate::knapsack::{KnapsackProblem, KnapsackProposedSolution};

/// Submit a new knapsack problem.
#[post("/send_problem")]
pub async fn send_problem(
    state: web::Data<AppState>,
    body: web::Json<KnapsackProblem>,
) -> impl Responder {
    info!(
        "POST /send_problem - received problem from {} ({} items, bounty {})",
        body.address,
        body.items.len(),
        body.bounty
    );
    let problem = body.into_inner();
    submit_block(&state, move |bc| bc.generate_problem_block(problem))
}

/// Submit a proposed solution for an open problem.
#[post("/send_proposed_solution")]
pub async fn send_proposed_solution(
    state: web::Data<AppState>,
    body: web::Json<KnapsackProposedSolution>,
) -> impl Responder {
    info!(
        "POST /send_proposed_solution - received solution from {} for problem #{} (value {})",
        body.address, body.problem_block_height, body.value
    );
    let solution = body.into_inner();
    submit_block(&state, move |bc| {
        bc.generate_proposed_solution_block(solution)
    })
}

/// Generate, link-check and append under a single write lock so no other
/// submission can move the tip in between.
fn submit_block<F>(state: &AppState, generate: F) -> HttpResponse
where
    F: FnOnce(&Blockchain) -> Result<Block, ChainError>,
{
    let mut guard = state.blockchain.write();
    let bc = &mut *guard;

    let result = generate(&*bc).and_then(|block| {
        bc.check_chained(&block)?;
        bc.add_block(block.clone())?;
        Ok(block)
    });

    match result {
        Ok(block) => HttpResponse::Created().json(block),
        Err(e) if e.is_internal() => {
            error!("submission failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
        Err(e) => {
            warn!("submission rejected: {e}");
            HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}
