use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use url::Url;

use super::error::AuthError;

/// Resolves once with the authorization code (or the reason there is none).
pub type CodeReceiver = oneshot::Receiver<Result<String, AuthError>>;

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
<p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
<p>Check the terminal for details.</p></body></html>";
const NOT_FOUND_PAGE: &str = "<html><body><h1>Not found</h1></body></html>";
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Captures the authorization code from the provider's browser redirect.
#[async_trait]
pub trait CallbackListener: Send + Sync {
    /// Bind to the redirect URI's address before returning, then accept
    /// requests in the background until the redirect arrives and resolve the
    /// receiver with its `code` query parameter.
    async fn start(&self, redirect_uri: &Url) -> Result<CodeReceiver, AuthError>;
}

/// Single-shot HTTP listener on the redirect URI's host and port.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalCallbackListener;

#[async_trait]
impl CallbackListener for LocalCallbackListener {
    async fn start(&self, redirect_uri: &Url) -> Result<CodeReceiver, AuthError> {
        let host = redirect_uri
            .host_str()
            .ok_or_else(|| AuthError::Listener(format!("redirect URI {redirect_uri} has no host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = redirect_uri
            .port_or_known_default()
            .ok_or_else(|| AuthError::Listener(format!("redirect URI {redirect_uri} has no port")))?;

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|err| AuthError::Listener(format!("failed to bind {host}:{port}: {err}")))?;
        debug!(%host, port, "Callback listener bound");

        let (mut tx, rx) = oneshot::channel();
        let base = redirect_uri.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = tx.closed() => {
                    debug!("Callback listener abandoned");
                    return;
                }
                result = accept_callback(listener, base) => result,
            };
            let _ = tx.send(result);
        });
        Ok(rx)
    }
}

/// Accept connections until one carries the provider's redirect.
///
/// Each connection is read in its own task, so an idle preconnect socket
/// cannot hold up the real callback.
async fn accept_callback(listener: TcpListener, base: Url) -> Result<String, AuthError> {
    let (done_tx, mut done_rx) = mpsc::channel(1);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted
                    .map_err(|err| AuthError::Listener(format!("accept failed: {err}")))?;
                let done_tx = done_tx.clone();
                let base = base.clone();
                tokio::spawn(async move {
                    match tokio::time::timeout(REQUEST_READ_TIMEOUT, serve_one(stream, &base)).await {
                        Ok(Some(outcome)) => {
                            let _ = done_tx.send(outcome).await;
                        }
                        Ok(None) => {}
                        Err(_) => debug!("Dropped idle callback connection"),
                    }
                });
            }
            Some(outcome) = done_rx.recv() => return outcome,
        }
    }
}

/// Answer one HTTP request. `None` means it was not the redirect.
async fn serve_one(stream: TcpStream, base: &Url) -> Option<Result<String, AuthError>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if let Err(err) = reader.read_line(&mut request_line).await {
        debug!(error = %err, "Failed to read callback request");
        return None;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header).await {
            Ok(read) if read > 0 && !header.trim().is_empty() => {}
            Ok(_) => break,
            Err(err) => {
                debug!(error = %err, "Failed to read callback request");
                return None;
            }
        }
    }

    let outcome = parse_callback(&request_line, base);
    let (status, body) = match &outcome {
        Some(Ok(_)) => ("200 OK", SUCCESS_PAGE),
        Some(Err(_)) => ("400 Bad Request", FAILURE_PAGE),
        None => ("404 Not Found", NOT_FOUND_PAGE),
    };
    match &outcome {
        Some(result) => debug!(received_code = result.is_ok(), "Callback request received"),
        None => debug!("Ignoring request outside the callback"),
    }
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = reader.into_inner();
    if let Err(err) = stream.write_all(response.as_bytes()).await {
        debug!(error = %err, "Failed to answer callback request");
    }
    let _ = stream.shutdown().await;
    outcome
}

/// Pull `code` (or `error`) out of an HTTP request line such as
/// `GET /?code=abc HTTP/1.1`.
///
/// Requests for another path, or at the redirect path without either
/// parameter, are not the redirect and yield `None`.
fn parse_callback(request_line: &str, base: &Url) -> Option<Result<String, AuthError>> {
    let target = request_line.split_whitespace().nth(1)?;
    let url = base.join(target).ok()?;
    if url.path().trim_end_matches('/') != base.path().trim_end_matches('/') {
        return None;
    }

    let mut code = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let detail = description.map(|d| format!(" ({d})")).unwrap_or_default();
        return Some(Err(AuthError::Listener(format!(
            "authorization was not granted: {error}{detail}"
        ))));
    }
    match code {
        Some(code) if !code.is_empty() => Some(Ok(code)),
        Some(_) => Some(Err(AuthError::Listener(
            "callback request carried an empty authorization code".to_string(),
        ))),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8888").unwrap()
    }

    #[test]
    fn extracts_code_from_request_line() {
        let code = parse_callback("GET /?code=AQB-xyz%2F1&state=s HTTP/1.1\r\n", &base())
            .unwrap()
            .unwrap();
        assert_eq!(code, "AQB-xyz/1");
    }

    #[test]
    fn error_parameter_wins_over_code() {
        let err = parse_callback(
            "GET /?code=abc&error=access_denied&error_description=user+cancelled HTTP/1.1",
            &base(),
        )
        .unwrap()
        .unwrap_err();
        match err {
            AuthError::Listener(message) => {
                assert!(message.contains("access_denied"));
                assert!(message.contains("user cancelled"));
            }
            other => panic!("expected Listener, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_requests_are_not_the_redirect() {
        assert!(parse_callback("GET /favicon.ico HTTP/1.1", &base()).is_none());
        assert!(parse_callback("GET / HTTP/1.1", &base()).is_none());
        assert!(parse_callback("", &base()).is_none());

        let nested = Url::parse("http://localhost:8888/callback").unwrap();
        assert!(parse_callback("GET /?code=abc HTTP/1.1", &nested).is_none());
        assert_eq!(
            parse_callback("GET /callback/?code=abc HTTP/1.1", &nested)
                .unwrap()
                .unwrap(),
            "abc"
        );
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(matches!(
            parse_callback("GET /?code= HTTP/1.1", &base()),
            Some(Err(AuthError::Listener(_)))
        ));
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn listener_returns_code_and_answers_browser() {
        let port = free_port();
        let redirect = Url::parse(&format!("http://127.0.0.1:{port}/callback")).unwrap();
        let rx = LocalCallbackListener.start(&redirect).await.unwrap();

        let response = reqwest::get(format!("http://127.0.0.1:{port}/callback?code=CODE1"))
            .await
            .unwrap();
        assert!(response.status().is_success());

        assert_eq!(rx.await.unwrap().unwrap(), "CODE1");
    }

    #[tokio::test]
    async fn listener_skips_idle_and_unrelated_connections() {
        let port = free_port();
        let redirect = Url::parse(&format!("http://127.0.0.1:{port}/callback")).unwrap();
        let rx = LocalCallbackListener.start(&redirect).await.unwrap();

        let _idle = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        let favicon = reqwest::get(format!("http://127.0.0.1:{port}/favicon.ico"))
            .await
            .unwrap();
        assert_eq!(favicon.status().as_u16(), 404);

        let response = reqwest::get(format!("http://127.0.0.1:{port}/callback?code=CODE2"))
            .await
            .unwrap();
        assert!(response.status().is_success());

        let code = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(code, "CODE2");
    }

    #[tokio::test]
    async fn listener_reports_provider_error() {
        let port = free_port();
        let redirect = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
        let rx = LocalCallbackListener.start(&redirect).await.unwrap();

        let response = reqwest::get(format!("http://127.0.0.1:{port}/?error=access_denied"))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);

        assert!(matches!(rx.await.unwrap(), Err(AuthError::Listener(_))));
    }

    #[tokio::test]
    async fn bind_failure_is_a_listener_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let redirect = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();

        let result = LocalCallbackListener.start(&redirect).await;
        assert!(matches!(result, Err(AuthError::Listener(message)) if message.contains("bind")));
    }
}
