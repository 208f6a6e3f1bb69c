//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Configuration,
    Storage,
    Network,
    Timeout,
    Api,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Run the browser authorization again.
    Reauthorize,
    /// Supply the client id and secret.
    ProvideClientCredentials,
    /// Fix a field name or value.
    CheckConfiguration,
    /// Inspect or repair the config file.
    CheckConfigFile,
    RetryLater,
    None,
}
