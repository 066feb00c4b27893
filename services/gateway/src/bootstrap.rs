use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::connection::ConnId;
use crate::state::AppState;
use gateway_wire::GatewayEvent;

/// Pluggable session id generator (§4.6 step 1). The default produces four
/// random alphanumeric blocks joined by `-`, e.g. `a1B2-c3D4-e5F6-g7H8`.
pub trait SessionIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

#[derive(Default)]
pub struct RandomSessionId;

impl SessionIdGenerator for RandomSessionId {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..4)
            .map(|_| {
                (&mut rng)
                    .sample_iter(&Alphanumeric)
                    .take(4)
                    .map(char::from)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("directory error during session bootstrap: {0}")]
    Directory(#[from] gateway_directory::DirectoryError),
}

/// Result of a successful bootstrap: the session id assigned and the
/// tailgator addresses (if any) that were already waiting for this
/// `(account, session)` pair.
pub struct Bootstrapped {
    pub session: String,
    pub tailgators: Vec<String>,
}

/// Registers a newly-opened connection with the Session Directory and
/// returns the session id plus any tailgators already waiting (§4.6 steps
/// 1, 3). The caller is responsible for deferring this call by one
/// scheduler tick relative to the transport's open event (§5, §4.6 step 4)
/// and for storing the returned tailgators on the connection.
pub async fn bootstrap(
    state: &AppState,
    generator: &dyn SessionIdGenerator,
    account: &str,
    conn_id: &ConnId,
) -> Result<Bootstrapped, BootstrapError> {
    let session = generator.generate();
    let tailgators = state
        .sessions
        .register(account, &session, &state.node_url, conn_id)
        .await?;
    Ok(Bootstrapped { session, tailgators })
}
