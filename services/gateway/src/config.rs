use std::env;
use std::time::Duration;

/// Node configuration, read once from the environment at startup (§6's
/// configuration option table). No config-file crate is introduced here --
/// the teacher's own `main.rs` reads `DATABASE_URL`/`BIND_ADDR` the same
/// way, and this service follows that convention rather than the
/// config-loading machinery a CLI front end might add later.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HTTP path for peer broadcast (`PUT`).
    pub broadcast_path: String,
    /// HTTP path for the realtime transport (`GET`/WS upgrade).
    pub endpoint_path: String,
    /// URL to 301-redirect unmatched requests to; `None` means 400 instead.
    pub redirect: Option<String>,
    /// Key prefix in the directory.
    pub namespace: String,
    /// Session entry TTL.
    pub timeout: Duration,
    /// This node's externally reachable hostname.
    pub address: String,
    /// This node's externally reachable port, if different from the bind
    /// port (e.g. behind a reverse proxy).
    pub port: Option<u16>,
    /// Address to bind the HTTP listener on.
    pub bind_addr: String,
    /// Directory store connection string.
    pub redis_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            broadcast_path: env::var("GATEWAY_BROADCAST_PATH")
                .unwrap_or_else(|_| "/primacron/broadcast".to_owned()),
            endpoint_path: env::var("GATEWAY_ENDPOINT").unwrap_or_else(|_| "/stream/".to_owned()),
            redirect: env::var("GATEWAY_REDIRECT").ok(),
            namespace: env::var("GATEWAY_NAMESPACE").unwrap_or_else(|_| "primacron".to_owned()),
            timeout: Duration::from_secs(
                env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(900),
            ),
            address: env::var("GATEWAY_ADDRESS").unwrap_or_else(|_| "localhost".to_owned()),
            port: env::var("GATEWAY_PORT").ok().and_then(|v| v.parse().ok()),
            bind_addr: env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_owned()),
        }
    }

    /// `"http://" + address + (":" + port if set)`, per §3's value
    /// discipline for session entries.
    pub fn node_url(&self) -> String {
        match self.port {
            Some(port) => format!("http://{}:{}", self.address, port),
            None => format!("http://{}", self.address),
        }
    }
}
