mod api;
mod blockchain;
mod config;
mod knapsack;
mod ledger;
mod node;
mod transaction;

use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use config::NodeConfig;
use node::Node;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let state = web::Data::new(AppState::new().map_err(std::io::Error::other)?);

    if config.simulate {
        info!("Simulating submissions to {} peers", config.peers.len());
        let node = Node::new(config.address(), config.peers.clone(), state.clone());
        rt::spawn(node.run());
    }

    info!(
        "⛓️ Starting SolverNet node at http://{}:{}",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(api::cors())
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
