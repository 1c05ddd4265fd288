//! Request counters for calls to the storefront API.

pub const API_REQUESTS_TOTAL: &str = "padpals_api_requests_total";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
    Transport,
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => Outcome::Success,
            400..=499 => Outcome::ClientError,
            _ => Outcome::ServerError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::ClientError => "client_error",
            Outcome::ServerError => "server_error",
            Outcome::Transport => "transport",
        }
    }
}

pub fn record_api_request(endpoint: &'static str, outcome: Outcome) {
    metrics::counter!(API_REQUESTS_TOTAL, "endpoint" => endpoint, "outcome" => outcome.as_str())
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_from_status() {
        assert_eq!(Outcome::from_status(201), Outcome::Success);
        assert_eq!(Outcome::from_status(404), Outcome::ClientError);
        assert_eq!(Outcome::from_status(502), Outcome::ServerError);
    }

    #[test]
    fn recording_without_recorder_is_a_noop() {
        record_api_request("tracker.list", Outcome::Transport);
    }
}
