//! Custom error types for the MCP server.

use thiserror::Error;

/// MCP server errors.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("API error: {0}")]
    Api(#[from] padpals_client::PadPalsError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] padpals_client::navigation::NavigationError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<McpError> for String {
    fn from(err: McpError) -> Self {
        err.to_string()
    }
}

/// Result type alias for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_convert_to_tool_messages() {
        let err: McpError = padpals_client::PadPalsError::NotFound("user".into()).into();
        let msg: String = err.into();
        assert_eq!(msg, "API error: not found: user");
    }
}
