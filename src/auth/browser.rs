use tracing::warn;

/// Opens the authorization URL for the user. Fire-and-forget.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str);
}

/// Launches the user's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) {
        if let Err(err) = webbrowser::open(url) {
            warn!(
                error = %err,
                "Failed to open browser. Please navigate to the following URL manually:\n{url}"
            );
        }
    }
}
