//! One-shot localhost listener that captures the OAuth authorization code.
//!
//! The listener accepts exactly one connection and drops its sockets right
//! after the accept, so a second redirect is refused by the OS. A
//! `localhost` redirect is served on both 127.0.0.1 and ::1, since browsers
//! may resolve the name to either. The result
//! travels over a oneshot channel that is resolved exactly once; the caller
//! awaits it under a timeout. Nothing here writes to stdout.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};

const SUCCESS_HTML: &str = "<html>\
<body>\
<h1>Authentication Successful!</h1>\
<p>You can close this window and return to the terminal.</p>\
<script>window.close();</script>\
</body>\
</html>";

const FAILURE_HTML: &str = "<html>\
<body>\
<h1>Authentication Failed</h1>\
<p>No authorization code was received. Return to the terminal for details.</p>\
</body>\
</html>";

/// Upper bound on the request head we are willing to buffer.
const MAX_REQUEST_HEAD: usize = 8192;

/// A bound, not yet started, callback listener.
///
/// Holds one socket, or two when serving both loopback families.
#[derive(Debug)]
pub struct CallbackListener {
    listeners: Vec<TcpListener>,
}

impl CallbackListener {
    /// Bind to an explicit address.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            Error::with_source(
                ErrorKind::Listener(format!("cannot listen on {addr}: {e}")),
                e,
            )
        })?;
        Ok(Self {
            listeners: vec![listener],
        })
    }

    /// Bind `port` on 127.0.0.1 and ::1, keeping whichever succeed.
    ///
    /// Port 0 takes a free port from the first successful bind and reuses
    /// it for the other family. Fails only when neither family binds.
    pub async fn bind_loopback(port: u16) -> Result<Self> {
        let mut port = port;
        let mut listeners = Vec::with_capacity(2);
        let mut failures = Vec::new();

        for ip in [IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)] {
            let addr = SocketAddr::new(ip, port);
            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    port = listener.local_addr()?.port();
                    listeners.push(listener);
                }
                Err(e) => failures.push(format!("{addr} ({e})")),
            }
        }

        if listeners.is_empty() {
            return Err(Error::new(ErrorKind::Listener(format!(
                "cannot listen on {}",
                failures.join("; ")
            ))));
        }
        if !failures.is_empty() {
            debug!(failed = %failures.join("; "), "callback bound on one loopback family only");
        }
        Ok(Self { listeners })
    }

    /// Bind to the host and port named by an OAuth redirect URI.
    ///
    /// `http://localhost:8080/callback` binds port 8080 on both loopback
    /// addresses; any other host is bound as given. The path is not
    /// checked when the callback arrives.
    pub async fn for_redirect_uri(redirect_uri: &str) -> Result<Self> {
        let url = url::Url::parse(redirect_uri)?;
        let host = url.host_str().ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(format!(
                "redirect URI has no host: {redirect_uri}"
            )))
        })?;
        let port = url.port_or_known_default().ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(format!(
                "redirect URI has no port: {redirect_uri}"
            )))
        })?;

        if host.eq_ignore_ascii_case("localhost") {
            Self::bind_loopback(port).await
        } else {
            Self::bind(&format!("{host}:{port}")).await
        }
    }

    /// Every address actually bound.
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>> {
        Ok(self
            .listeners
            .iter()
            .map(TcpListener::local_addr)
            .collect::<io::Result<_>>()?)
    }

    /// Start serving the single callback in a background task.
    pub fn spawn(self) -> PendingCode {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let outcome = serve_one(self.listeners).await;
            let _ = tx.send(outcome);
        });
        PendingCode { rx, task }
    }
}

/// The eventual result of a spawned [`CallbackListener`].
///
/// Dropping it stops the listener task if it is still waiting.
#[derive(Debug)]
pub struct PendingCode {
    rx: oneshot::Receiver<Result<String>>,
    task: JoinHandle<()>,
}

impl PendingCode {
    /// Wait for the authorization code.
    ///
    /// Fails with [`ErrorKind::CallbackTimeout`] when nothing arrives in
    /// time and with [`ErrorKind::Listener`] when the callback carried no
    /// code.
    pub async fn wait(mut self, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(Error::new(ErrorKind::Listener(
                "callback listener stopped without a result".to_string(),
            ))),
            Err(_) => Err(Error::new(ErrorKind::CallbackTimeout(timeout))),
        }
    }
}

impl Drop for PendingCode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Accept on whichever socket is connected to first.
async fn accept_first(listeners: &[TcpListener]) -> io::Result<(TcpStream, SocketAddr)> {
    match listeners {
        [] => Err(io::Error::new(
            io::ErrorKind::NotConnected,
            "no callback socket bound",
        )),
        [only] => only.accept().await,
        [first, second, ..] => tokio::select! {
            accepted = first.accept() => accepted,
            accepted = second.accept() => accepted,
        },
    }
}

#[instrument(skip(listeners))]
async fn serve_one(listeners: Vec<TcpListener>) -> Result<String> {
    let (mut socket, peer) = accept_first(&listeners).await?;
    drop(listeners);
    debug!(%peer, "OAuth callback connection accepted");

    let head = read_request_head(&mut socket).await?;
    let outcome = parse_callback_request(&head);

    let (status_line, body) = match &outcome {
        Ok(_) => ("HTTP/1.1 200 OK", SUCCESS_HTML),
        Err(_) => ("HTTP/1.1 400 Bad Request", FAILURE_HTML),
    };
    let response = format!(
        "{status_line}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;

    debug!(captured = outcome.is_ok(), "OAuth callback answered");
    outcome
}

async fn read_request_head(socket: &mut TcpStream) -> Result<String> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }

    if buffer.is_empty() {
        return Err(Error::new(ErrorKind::Listener(
            "callback request is empty".to_string(),
        )));
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Extract the authorization code from a raw HTTP request head.
///
/// Only `GET` is accepted. A missing or empty `code` parameter is an error;
/// a provider `error` parameter is reported in the message.
fn parse_callback_request(head: &str) -> Result<String> {
    let first = head.lines().next().unwrap_or_default();
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    if method != "GET" || target.is_empty() {
        return Err(Error::new(ErrorKind::Listener(format!(
            "expected a GET callback, got {first:?}"
        ))));
    }

    let url = if target.starts_with('/') {
        url::Url::parse(&format!("http://localhost{target}"))
    } else {
        url::Url::parse(target)
    }
    .map_err(|e| {
        Error::with_source(
            ErrorKind::Listener(format!("invalid callback target: {e}")),
            e,
        )
    })?;

    let mut code = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if code.is_none() => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code.filter(|c| !c.is_empty()), error) {
        (Some(code), _) => Ok(code),
        (None, Some(error)) => Err(Error::new(ErrorKind::Listener(format!(
            "authorization denied: {error}{}",
            error_description
                .map(|d| format!(" ({d})"))
                .unwrap_or_default()
        )))),
        (None, None) => Err(Error::new(ErrorKind::Listener(
            "no authorization code received".to_string(),
        ))),
    }
}
