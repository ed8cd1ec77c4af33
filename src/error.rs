use thiserror::Error;

/// Sweep error types
/// Covers browser transport, navigation, persistence, config and internal errors
#[derive(Error, Debug)]
pub enum SweepError {
    /// WebDriver endpoint rejected or failed a command
    #[error("WebDriver error: {0}")]
    WebDriver(String),

    /// Browser session died or was closed underneath us
    #[error("Browser session lost: {0}")]
    SessionLost(String),

    /// Calculator entry page could not be loaded
    #[error("Entry page unreachable: {0}")]
    EntryUnreachable(String),

    /// Wizard never reached the results screen
    #[error("Results screen not reached: {0}")]
    ResultsUnreachable(String),

    /// Injected script threw inside the page
    #[error("Script error: {0}")]
    Script(String),

    /// Run or variation write failed
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error wrapper (screenshots, data directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error talking to the WebDriver endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SweepError {
    /// Check if the error ends the whole sweep session
    /// Fatal: transport failures, lost session, unreachable entry/results screens
    /// Recoverable: script errors (element-level), persistence, IO
    pub fn is_session_fatal(&self) -> bool {
        match self {
            SweepError::WebDriver(_) => true,
            SweepError::SessionLost(_) => true,
            SweepError::EntryUnreachable(_) => true,
            SweepError::ResultsUnreachable(_) => true,
            SweepError::Http(_) => true,

            SweepError::Script(_) => false,
            SweepError::Persistence(_) => false,
            SweepError::InvalidConfig(_) => false,
            SweepError::Io(_) => false,
        }
    }

    /// Short category label used in log lines
    pub fn category(&self) -> &'static str {
        match self {
            SweepError::Script(_) => "selector",
            SweepError::Persistence(_) => "persistence",
            SweepError::InvalidConfig(_) => "config",
            SweepError::Io(_) => "io",
            _ => "session",
        }
    }
}

impl From<anyhow::Error> for SweepError {
    fn from(err: anyhow::Error) -> Self {
        SweepError::Persistence(format!("{:#}", err))
    }
}

/// Result type alias for sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Pass session-fatal errors through; replace anything else with `fallback`
pub fn recover<T>(result: Result<T>, fallback: T, operation: &str) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_session_fatal() => Err(e),
        Err(e) => {
            tracing::debug!(operation, category = e.category(), error = %e, "recovered from element-level error");
            Ok(fallback)
        }
    }
}
