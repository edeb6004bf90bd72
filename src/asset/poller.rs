use snafu::{ResultExt, Snafu};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    asset::{AssetState, AssetStore, RemoteAsset, Upload},
    client::Error as ClientError,
    clock::Clock,
    error::ErrorKind,
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("file not found: {}", path.display()))]
    FileNotFound { path: PathBuf },

    #[snafu(display("failed to read '{}'", path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to upload '{}'", path.display()))]
    Upload {
        source: Box<ClientError>,
        path: PathBuf,
    },

    #[snafu(display("failed to fetch status of '{handle}'"))]
    FetchStatus {
        source: Box<ClientError>,
        handle: String,
    },

    #[snafu(display(
        "processing of '{handle}' failed: {}",
        message.as_deref().unwrap_or("no details")
    ))]
    ProcessingFailed {
        handle: String,
        message: Option<String>,
    },

    #[snafu(display(
        "'{handle}' did not become active within {}s; last state: {last_state}",
        max_wait.as_secs()
    ))]
    Timeout {
        handle: String,
        /// Configured limit
        max_wait: Duration,
        /// Measured time since polling started; can overshoot `max_wait` by one interval
        waited: Duration,
        last_state: AssetState,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound { .. } => ErrorKind::NotFound,
            Error::ReadFile { .. } => ErrorKind::Input,
            Error::Upload { source, .. } | Error::FetchStatus { source, .. } => source.kind(),
            Error::ProcessingFailed { .. } => ErrorKind::ProcessingFailed,
            Error::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

/// How often to poll and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// Where the poll loop stands after observing a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Waiting(RemoteAsset),
    Active(RemoteAsset),
    Failed(RemoteAsset),
    TimedOut(RemoteAsset),
}

impl PollState {
    /// Classify a snapshot taken `elapsed` after polling started.
    ///
    /// `Active` and `Failed` win over the deadline: a snapshot fetched exactly at the
    /// deadline still counts.
    pub fn observe(asset: RemoteAsset, elapsed: Duration, max_wait: Duration) -> Self {
        match asset.state {
            AssetState::Active => PollState::Active(asset),
            AssetState::Failed => PollState::Failed(asset),
            AssetState::Pending | AssetState::Unknown if elapsed >= max_wait => {
                PollState::TimedOut(asset)
            }
            AssetState::Pending | AssetState::Unknown => PollState::Waiting(asset),
        }
    }
}

/// Uploads a local file and polls the store until the asset is usable.
pub struct AssetPoller<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    clock: &'a C,
    config: PollConfig,
}

impl<'a, S, C> AssetPoller<'a, S, C>
where
    S: AssetStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'a S, clock: &'a C, config: PollConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Upload `path` once, then wait for the asset to become active.
    pub async fn upload_and_wait(&self, path: &Path) -> Result<RemoteAsset, Error> {
        let asset = self.upload(path).await?;
        self.wait_until_active(asset).await
    }

    /// Upload `path` once. Fails before any network call if the file is missing.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn upload(&self, path: &Path) -> Result<RemoteAsset, Error> {
        let exists = tokio::fs::try_exists(path)
            .await
            .context(ReadFileSnafu { path })?;
        if !exists {
            return FileNotFoundSnafu { path }.fail();
        }

        let bytes = tokio::fs::read(path).await.context(ReadFileSnafu { path })?;
        let upload = Upload {
            display_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            mime_type: mime_guess::from_path(path).first_or_octet_stream(),
            bytes,
        };
        info!(
            size = upload.bytes.len(),
            mime.type = %upload.mime_type,
            "uploading file"
        );

        let asset = self
            .store
            .upload(upload)
            .await
            .map_err(Box::new)
            .context(UploadSnafu { path })?;
        info!(handle = %asset.handle, state = %asset.state, "file uploaded");
        Ok(asset)
    }

    /// Poll until `asset` is active, failed, or the configured wait is exhausted.
    ///
    /// The remote asset is left in place on timeout.
    #[instrument(skip_all, fields(
        handle = %asset.handle,
        poll.interval.secs = self.config.interval.as_secs(),
        timeout.secs = self.config.max_wait.as_secs(),
    ))]
    pub async fn wait_until_active(&self, asset: RemoteAsset) -> Result<RemoteAsset, Error> {
        let start = self.clock.now();
        let mut state = PollState::observe(asset, Duration::ZERO, self.config.max_wait);

        loop {
            state = match state {
                PollState::Active(asset) => {
                    info!("asset is active");
                    return Ok(asset);
                }
                PollState::Failed(asset) => {
                    warn!(error = asset.error.as_deref(), "asset processing failed");
                    return ProcessingFailedSnafu {
                        handle: asset.handle,
                        message: asset.error,
                    }
                    .fail();
                }
                PollState::TimedOut(asset) => {
                    let waited = self.clock.now().saturating_duration_since(start);
                    warn!(waited.secs = waited.as_secs(), state = %asset.state, "gave up waiting");
                    return TimeoutSnafu {
                        handle: asset.handle,
                        max_wait: self.config.max_wait,
                        waited,
                        last_state: asset.state,
                    }
                    .fail();
                }
                PollState::Waiting(asset) => {
                    let elapsed = self.clock.now().saturating_duration_since(start);
                    debug!(state = %asset.state, waited.secs = elapsed.as_secs(), "waiting for asset");

                    self.clock.sleep(self.config.interval).await;
                    let refreshed = self
                        .store
                        .fetch(&asset.handle)
                        .await
                        .map_err(Box::new)
                        .context(FetchStatusSnafu {
                            handle: asset.handle.as_str(),
                        })?;

                    let elapsed = self.clock.now().saturating_duration_since(start);
                    PollState::observe(refreshed, elapsed, self.config.max_wait)
                }
            };
        }
    }
}
