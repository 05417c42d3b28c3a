use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use dlq_logging::{dlq_error, dlq_info};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::collaborator::FetchCapability;
use crate::config::PARTIAL_DOWNLOAD_MARKER;
use crate::filename::download_filename;

#[derive(Debug, Clone)]
pub struct HttpFetchSettings {
    /// Directory transfers are streamed into.
    pub incomplete_dir: PathBuf,
    pub connect_timeout: Duration,
    /// Whole-transfer timeout. `None` lets a stalled transfer hang.
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
}

impl Default for HttpFetchSettings {
    fn default() -> Self {
        Self {
            incomplete_dir: PathBuf::from("./incomplete"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn io(err: std::io::Error) -> Self {
        Self::new(FailureKind::Io, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    Network,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

enum FetchCommand {
    Begin { url: String },
}

/// Plain HTTP stand-in for a browser session.
///
/// Transfers run on a background tokio runtime. Each one is streamed into
/// `{incomplete_dir}/{name}.crdownload` and renamed to `{name}` once the body
/// has fully arrived, which is the layout [`crate::DirectoryCompletionSource`]
/// expects.
pub struct HttpFetcher {
    cmd_tx: mpsc::Sender<FetchCommand>,
}

impl HttpFetcher {
    pub fn new(settings: HttpFetchSettings) -> Result<Self, FetchError> {
        let client = build_client(&settings)?;
        let runtime = tokio::runtime::Runtime::new().map_err(FetchError::io)?;
        let dir = Arc::new(settings.incomplete_dir);
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let dir = dir.clone();
                runtime.spawn(async move {
                    handle_command(&client, &dir, command).await;
                });
            }
        });

        Ok(Self { cmd_tx })
    }
}

impl FetchCapability for HttpFetcher {
    fn begin(&mut self, url: &str) {
        if self
            .cmd_tx
            .send(FetchCommand::Begin {
                url: url.to_string(),
            })
            .is_err()
        {
            dlq_error!("Fetch worker is gone; cannot start {}", url);
        }
    }
}

async fn handle_command(client: &reqwest::Client, dir: &Path, command: FetchCommand) {
    match command {
        FetchCommand::Begin { url } => match transfer(client, dir, &url).await {
            Ok(path) => dlq_info!("Fetched {} into {:?}", url, path),
            Err(err) => dlq_error!("Fetch of {} failed: {}", url, err),
        },
    }
}

fn build_client(settings: &HttpFetchSettings) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit));
    if let Some(timeout) = settings.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

async fn transfer(client: &reqwest::Client, dir: &Path, url: &str) -> Result<PathBuf, FetchError> {
    let parsed =
        Url::parse(url).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
    // Named after the requested URL, not the redirect target, so the name
    // stays a substring of the queued job.
    let name = download_filename(url).ok_or_else(|| {
        FetchError::new(FailureKind::InvalidUrl, "no usable file name in url")
    })?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }

    let final_path = dir.join(&name);
    let partial_path = dir.join(format!("{name}{PARTIAL_DOWNLOAD_MARKER}"));

    let mut file = tokio::fs::File::create(&partial_path)
        .await
        .map_err(FetchError::io)?;
    let mut stream = response.bytes_stream();
    let streamed: Result<(), FetchError> = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            file.write_all(&chunk).await.map_err(FetchError::io)?;
        }
        file.flush().await.map_err(FetchError::io)?;
        file.sync_all().await.map_err(FetchError::io)?;
        Ok(())
    }
    .await;
    drop(file);

    if let Err(err) = streamed {
        let _ = tokio::fs::remove_file(&partial_path).await;
        return Err(err);
    }

    tokio::fs::rename(&partial_path, &final_path)
        .await
        .map_err(FetchError::io)?;
    Ok(final_path)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
