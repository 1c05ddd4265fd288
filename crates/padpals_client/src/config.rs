use crate::PadPalsError;
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub timeout: Duration,
    pub session_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            session_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, PadPalsError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, PadPalsError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = get("PADPALS_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let api_token = get("PADPALS_API_TOKEN")
            .filter(|s| !s.is_empty())
            .map(|t| SecretString::new(t.into()));
        let timeout = match get("PADPALS_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PadPalsError::Config(format!("PADPALS_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                if secs == 0 {
                    return Err(PadPalsError::Config(
                        "PADPALS_TIMEOUT_SECS must be positive".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };
        let session_path = get("PADPALS_SESSION_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        Ok(Self {
            base_url,
            api_token,
            timeout,
            session_path,
        })
    }
}
