//! OAuth2 authorization-code flow, token refresh, and their collaborators.

pub mod browser;
pub mod callback;
pub mod error;
pub mod manager;
pub mod state;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use callback::{CallbackListener, CodeReceiver, LocalCallbackListener};
pub use error::AuthError;
pub use manager::TokenManager;
pub use state::TokenState;
