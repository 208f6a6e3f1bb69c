use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::browser::{BrowserLauncher, SystemBrowser};
use super::callback::{CallbackListener, CodeReceiver, LocalCallbackListener};
use super::error::AuthError;
use super::state::TokenState;
use crate::config::{CredentialStore, Field, FieldValue};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888";
pub const DEFAULT_SCOPE: &str = "playlist-modify-public playlist-modify-private";
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Drives the OAuth2 authorization-code grant and token refresh, reading and
/// writing every credential through the owned [`CredentialStore`].
///
/// # Example
/// ```no_run
/// use playlister::auth::TokenManager;
/// use playlister::config::CredentialStore;
///
/// # async fn example() -> Result<(), playlister::auth::AuthError> {
/// let mut manager = TokenManager::new(CredentialStore::new_default());
/// let token = manager.current_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct TokenManager {
    store: CredentialStore,
    client: reqwest::Client,
    accounts_url: String,
    redirect_uri: String,
    scope: String,
    callback_timeout: Duration,
    browser: Box<dyn BrowserLauncher>,
    listener: Box<dyn CallbackListener>,
}

impl TokenManager {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            browser: Box::new(SystemBrowser),
            listener: Box::new(LocalCallbackListener),
        }
    }

    pub fn with_accounts_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_url = url.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn with_listener(mut self, listener: impl CallbackListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CredentialStore {
        &mut self.store
    }

    pub fn into_store(self) -> CredentialStore {
        self.store
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn state(&mut self) -> Result<TokenState, AuthError> {
        Ok(TokenState::derive(self.store.record()?, Utc::now()))
    }

    /// Return a usable access token, authorizing or refreshing first when
    /// there is none or it has expired.
    ///
    /// A valid token on record is returned without any I/O.
    pub async fn current_token(&mut self) -> Result<String, AuthError> {
        match self.state()? {
            TokenState::NoToken => self.authorize().await,
            TokenState::Stale => self.refresh().await,
            TokenState::Valid => Ok(self.store.record()?.access_token.clone()),
        }
    }

    /// The provider's consent page for the configured client.
    pub fn authorization_url(&mut self) -> Result<Url, AuthError> {
        let (client_id, _) = self.client_credentials()?;
        self.build_authorization_url(&client_id)
    }

    /// Run the full browser consent flow and store the resulting tokens.
    ///
    /// Nothing is written unless the code exchange succeeds.
    pub async fn authorize(&mut self) -> Result<String, AuthError> {
        let (client_id, client_secret) = self.client_credentials()?;
        let redirect = Url::parse(&self.redirect_uri)?;
        let authorization_url = self.build_authorization_url(&client_id)?;

        let receiver = self.listener.start(&redirect).await?;
        info!("Opening browser for authorization");
        self.browser.open(authorization_url.as_str());
        let code = self.wait_for_code(receiver).await?;

        self.authenticate(&code, &client_id, &client_secret).await
    }

    /// Trade the stored refresh token for a new access token.
    pub async fn refresh(&mut self) -> Result<String, AuthError> {
        let record = self.store.record()?;
        if record.refresh_token.is_empty() {
            return Err(AuthError::MissingRefreshToken);
        }
        let refresh_token = record.refresh_token.clone();
        let keys = STANDARD.encode(format!("{}:{}", record.client_id, record.client_secret));

        info!("Refreshing token");
        let resp = self
            .client
            .post(self.token_url())
            .header(AUTHORIZATION, format!("Basic {keys}"))
            .form(&[
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed {
                status: status.as_u16(),
                reason: failure_reason(status, &body),
            });
        }

        let payload: TokenResponse = resp.json().await?;
        let access_token = payload.access_token.clone();
        let expires_at = payload.expires_at()?;
        let mut updates = vec![
            (Field::Token, FieldValue::Text(payload.access_token)),
            (Field::Validity, FieldValue::from(expires_at)),
        ];
        if let Some(rotated) = payload.refresh_token.filter(|token| !token.is_empty()) {
            debug!("Provider rotated the refresh token");
            updates.push((Field::Refresh, FieldValue::Text(rotated)));
        }
        self.store.update(updates)?;
        Ok(access_token)
    }

    async fn authenticate(
        &mut self,
        code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, AuthError> {
        info!("Authenticating client");
        let resp = self
            .client
            .post(self.token_url())
            .form(&[
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::AuthExchangeFailed {
                status: status.as_u16(),
                reason: failure_reason(status, &body),
            });
        }

        let payload: TokenResponse = resp.json().await?;
        let access_token = payload.access_token.clone();
        let expires_at = payload.expires_at()?;
        self.store.update([
            (Field::Token, FieldValue::Text(payload.access_token)),
            (
                Field::Refresh,
                FieldValue::Text(payload.refresh_token.unwrap_or_default()),
            ),
            (Field::Validity, FieldValue::from(expires_at)),
        ])?;
        Ok(access_token)
    }

    async fn wait_for_code(&self, receiver: CodeReceiver) -> Result<String, AuthError> {
        match tokio::time::timeout(self.callback_timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AuthError::Listener(
                "callback listener stopped before receiving a code".to_string(),
            )),
            Err(_) => Err(AuthError::Timeout {
                secs: self.callback_timeout.as_secs(),
            }),
        }
    }

    fn client_credentials(&mut self) -> Result<(String, String), AuthError> {
        let record = self.store.record()?;
        if record.client_id.is_empty() || record.client_secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok((record.client_id.clone(), record.client_secret.clone()))
    }

    fn build_authorization_url(&self, client_id: &str) -> Result<Url, AuthError> {
        let mut url = Url::parse(&format!(
            "{}/authorize",
            self.accounts_url.trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope);
        Ok(url)
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

impl TokenResponse {
    fn expires_at(&self) -> Result<chrono::DateTime<Utc>, AuthError> {
        chrono::Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("expires_in out of range: {}", self.expires_in))
            })
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: Option<serde_json::Value>,
    error_description: Option<String>,
}

/// Human-readable reason for a failed token request: the provider's
/// `error`/`error_description` when present, else the HTTP reason phrase.
fn failure_reason(status: StatusCode, body: &str) -> String {
    let canonical = status.canonical_reason().unwrap_or("Unknown").to_string();
    let Ok(parsed) = serde_json::from_str::<ProviderError>(body) else {
        return canonical;
    };
    let error = match parsed.error {
        Some(serde_json::Value::String(code)) => Some(code),
        Some(serde_json::Value::Object(obj)) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(ToString::to_string),
        _ => None,
    };
    match (error, parsed.error_description) {
        (Some(error), Some(description)) => format!("{error}: {description}"),
        (Some(error), None) => error,
        (None, Some(description)) => description,
        (None, None) => canonical,
    }
}
