use log::warn;
use std::env;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Runtime settings read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Base URLs of the other nodes, e.g. `http://localhost:3001`.
    pub peers: Vec<String>,
    /// Run the problem/solution simulation loop against `peers`.
    pub simulate: bool,
}

impl NodeConfig {
    /// `HOST`, `PORT`, `PEERS`, `SIMULATE`; the first command-line argument
    /// overrides `PORT`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok(), env::args().nth(1))
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>, port_arg: Option<String>) -> Self {
        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = port_arg
            .or_else(|| get("PORT"))
            .and_then(|raw| match raw.trim().parse() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!("invalid port {raw:?}, using {DEFAULT_PORT}");
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let own_url = format!("http://localhost:{port}");
        let peers: Vec<String> = get("PEERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(peer_url)
            .filter(|p| *p != own_url)
            .collect();

        let simulate = match get("SIMULATE").as_deref().map(str::trim) {
            Some("1" | "true" | "yes") => true,
            Some("0" | "false" | "no") => false,
            Some(other) => {
                warn!("invalid SIMULATE value {other:?}, ignoring");
                !peers.is_empty()
            }
            None => !peers.is_empty(),
        };

        Self {
            host,
            port,
            peers,
            simulate,
        }
    }

    /// Identity this node signs its submissions with. Addresses are plain
    /// labels, so the listening port is enough to tell nodes apart.
    pub fn address(&self) -> String {
        self.port.to_string()
    }
}

/// A bare port means a node on localhost.
fn peer_url(raw: &str) -> String {
    if raw.chars().all(|c| c.is_ascii_digit()) {
        format!("http://localhost:{raw}")
    } else {
        raw.trim_end_matches('/').to_string()
    }
}
