//! CLI-specific error formatting for user-facing messages.

use crate::error::{PlaylisterError, RecoverySuggestion};

/// Map a [`PlaylisterError`] to a user-facing string with actionable guidance.
pub fn format_error_help(err: &PlaylisterError) -> String {
    match err.recovery_suggestion() {
        RecoverySuggestion::ProvideClientCredentials => format!(
            "{err}. Pass --client and --secret (or set PLAYLISTER_CLIENT_ID and PLAYLISTER_CLIENT_SECRET)"
        ),
        RecoverySuggestion::Reauthorize => format!("{err}. Run: playlister auth --force"),
        RecoverySuggestion::CheckConfiguration => format!(
            "{err}. Known fields: client, secret, token, refresh, validity, playlists"
        ),
        RecoverySuggestion::CheckConfigFile => {
            format!("{err}. Fix or remove the config file, or point --path elsewhere")
        }
        RecoverySuggestion::RetryLater => format!("{err}. Try again later"),
        RecoverySuggestion::None => err.to_string(),
    }
}
