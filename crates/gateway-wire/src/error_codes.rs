use serde::Serialize;

/// Frozen outcomes of the inbound broadcast handler. The variant names are
/// internal; `kind()` returns the exact wire-level `type` string from the
/// spec (including the spaced "unknown socket" and "bad request").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Sending,
    Broken,
    Invalid,
    UnknownSocket,
    BadRequest,
}

impl BroadcastOutcome {
    pub fn status(self) -> u16 {
        match self {
            BroadcastOutcome::Sending => 200,
            BroadcastOutcome::Broken => 400,
            BroadcastOutcome::Invalid => 400,
            BroadcastOutcome::UnknownSocket => 404,
            BroadcastOutcome::BadRequest => 400,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            BroadcastOutcome::Sending => "sending",
            BroadcastOutcome::Broken => "broken",
            BroadcastOutcome::Invalid => "invalid",
            BroadcastOutcome::UnknownSocket => "unknown socket",
            BroadcastOutcome::BadRequest => "bad request",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BroadcastOutcome::Sending => "message delivered to local connection",
            BroadcastOutcome::Broken => "request body could not be decoded",
            BroadcastOutcome::Invalid => "request body was well-formed but had the wrong shape",
            BroadcastOutcome::UnknownSocket => "no local connection with that id",
            BroadcastOutcome::BadRequest => "request did not match any known route",
        }
    }

    pub fn body(self) -> BroadcastResponseBody {
        BroadcastResponseBody {
            status: self.status(),
            kind: self.kind().to_owned(),
            description: self.description().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastResponseBody {
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}
