//! Peer simulation: fabricates random problems and solutions and posts them
//! to the other nodes, the way independent participants would.

use std::time::Duration;

use actix_web::{rt::time::sleep, web};
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

use crate::api::AppState;
use crate::blockchain::{Blockchain, validation};
use crate::knapsack::{
    Item, KnapsackProblem, KnapsackProposedSolution, sum_selected_value, sum_weights,
};

const HEARTBEAT_RETRY: Duration = Duration::from_secs(5);
/// One round in this many submits a problem instead of a solution.
const PROBLEM_ODDS: u32 = 10;

pub struct Node {
    address: String,
    peers: Vec<String>,
    client: reqwest::Client,
    state: web::Data<AppState>,
}

impl Node {
    pub fn new(address: String, peers: Vec<String>, state: web::Data<AppState>) -> Self {
        Self {
            address,
            peers,
            client: reqwest::Client::new(),
            state,
        }
    }

    /// Wait until every peer answers, then submit forever.
    pub async fn run(self) {
        while let Err(e) = self.check_online().await {
            warn!("peers not reachable yet: {e}");
            sleep(HEARTBEAT_RETRY).await;
        }
        info!("ONLINE - {} peers reachable", self.peers.len());

        loop {
            let (pause, submit_problem) = {
                let mut rng = rand::thread_rng();
                (
                    Duration::from_secs(rng.gen_range(1..=10)),
                    rng.gen_ratio(1, PROBLEM_ODDS),
                )
            };
            sleep(pause).await;

            if submit_problem {
                self.submit_problem().await;
            } else {
                self.submit_proposed_solution().await;
            }
        }
    }

    async fn check_online(&self) -> Result<(), reqwest::Error> {
        for peer in &self.peers {
            self.client
                .get(format!("{peer}/api/heartbeat"))
                .send()
                .await?
                .error_for_status()?;
        }
        Ok(())
    }

    async fn submit_problem(&self) {
        let problem = random_problem(&mut rand::thread_rng(), &self.address);
        if let Err(e) = validation::validate_problem(&problem) {
            debug!("generated problem is invalid: {e}. Discarding...");
            return;
        }
        info!(
            "SUBMITTING problem with {} items (bounty {:.2})",
            problem.items.len(),
            problem.bounty
        );
        self.broadcast("/api/send_problem", &problem).await;
    }

    async fn submit_proposed_solution(&self) {
        let solution = {
            let bc = self.state.blockchain.read();
            random_solution(&mut rand::thread_rng(), &bc, &self.address)
        };
        let Some(solution) = solution else {
            return;
        };
        info!(
            "SUBMITTING solution for problem #{} (value {})",
            solution.problem_block_height, solution.value
        );
        self.broadcast("/api/send_proposed_solution", &solution).await;
    }

    /// POST `payload` to every peer. Failures are logged per peer.
    async fn broadcast<T: Serialize>(&self, path: &str, payload: &T) {
        for peer in &self.peers {
            let url = format!("{peer}{path}");
            match self.client.post(&url).json(payload).send().await {
                Ok(resp) if resp.status().is_success() => debug!("{url} accepted submission"),
                Ok(resp) => debug!("{url} rejected submission: {}", resp.status()),
                Err(e) => warn!("failed to reach {url}: {e}"),
            }
        }
    }
}

/// 1-10 items with weight and value in 1..=10, capacity two thirds of the
/// total weight, bounty in [1, 10).
pub fn random_problem<R: Rng>(rng: &mut R, address: &str) -> KnapsackProblem {
    let count = rng.gen_range(1..=10);
    let items = (0..count)
        .map(|_| Item {
            weight: rng.gen_range(1..=10),
            value: rng.gen_range(1..=10),
        })
        .collect();
    let mut problem = KnapsackProblem {
        items,
        capacity: 0,
        bounty: rng.gen_range(1.0..10.0),
        address: address.to_string(),
    };
    problem.capacity = sum_weights(&problem).unwrap_or_default() * 2 / 3;
    problem
}

/// Random selection for a random open problem, kept only if the chain
/// would currently accept it.
pub fn random_solution<R: Rng>(
    rng: &mut R,
    bc: &Blockchain,
    address: &str,
) -> Option<KnapsackProposedSolution> {
    let open = bc.find_open_problems();
    if open.is_empty() {
        debug!("no open problems found. Aborting...");
        return None;
    }
    let block = open[rng.gen_range(0..open.len())];
    let problem = block.data.as_problem()?;

    let item_indexes: Vec<i64> = (0..problem.items.len() as i64)
        .filter(|_| rng.gen_bool(0.5))
        .collect();
    let mut solution = KnapsackProposedSolution {
        value: 0,
        item_indexes,
        problem_block_height: block.height,
        address: address.to_string(),
    };
    solution.value = sum_selected_value(problem, &solution.item_indexes)?;

    match validation::validate_proposed_solution(&solution, bc) {
        Ok(()) => Some(solution),
        Err(e) => {
            debug!("generated solution is invalid: {e}. Discarding...");
            None
        }
    }
}
