#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use playlister::auth::{AuthError, BrowserLauncher, CallbackListener, CodeReceiver};
use playlister::config::{CredentialStore, StoreConfig};
use tempfile::TempDir;
use tokio::sync::oneshot;
use url::Url;

/// Records every URL it is asked to open instead of launching anything.
#[derive(Clone, Default)]
pub struct RecordingBrowser {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("browser lock poisoned").clone()
    }
}

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) {
        self.opened
            .lock()
            .expect("browser lock poisoned")
            .push(url.to_string());
    }
}

/// Answers immediately with a fixed authorization code.
pub struct StaticCodeListener {
    code: String,
}

impl StaticCodeListener {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
        }
    }
}

#[async_trait]
impl CallbackListener for StaticCodeListener {
    async fn start(&self, _redirect_uri: &Url) -> Result<CodeReceiver, AuthError> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(self.code.clone()));
        Ok(rx)
    }
}

/// Binds successfully but never receives a callback.
#[derive(Default)]
pub struct PendingListener {
    senders: Mutex<Vec<oneshot::Sender<Result<String, AuthError>>>>,
}

#[async_trait]
impl CallbackListener for PendingListener {
    async fn start(&self, _redirect_uri: &Url) -> Result<CodeReceiver, AuthError> {
        let (tx, rx) = oneshot::channel();
        self.senders.lock().expect("listener lock poisoned").push(tx);
        Ok(rx)
    }
}

/// Fails to bind.
pub struct FailingListener;

#[async_trait]
impl CallbackListener for FailingListener {
    async fn start(&self, redirect_uri: &Url) -> Result<CodeReceiver, AuthError> {
        Err(AuthError::Listener(format!(
            "failed to bind {redirect_uri}: address in use"
        )))
    }
}

pub fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.toml")
}

pub fn write_config(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

pub fn open_store(path: &Path) -> CredentialStore {
    CredentialStore::new(StoreConfig::new(path))
}

/// Epoch seconds `offset_secs` from now.
pub fn epoch_from_now(offset_secs: i64) -> i64 {
    (Utc::now() + Duration::seconds(offset_secs)).timestamp()
}
