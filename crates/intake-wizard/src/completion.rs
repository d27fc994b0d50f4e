//! Terminal actions run once every step of the wizard is satisfied.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use intake_spec::AnswerSet;
use tracing::{debug, info};

use crate::error::CompletionError;

/// Acknowledgement returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Which handler accepted the submission.
    pub handler: String,
    pub reference: String,
    /// Where the submission was persisted, if anywhere.
    pub location: Option<PathBuf>,
}

impl Receipt {
    pub fn new(handler: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            reference: reference.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Finalization step the controller awaits after the last question.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn complete(&self, submission: &AnswerSet) -> Result<Receipt, CompletionError>;
}

/// Accepts every submission after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedDelay {
    delay: Duration,
}

impl SimulatedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl CompletionHandler for SimulatedDelay {
    async fn complete(&self, submission: &AnswerSet) -> Result<Receipt, CompletionError> {
        debug!(delay_ms = self.delay.as_millis() as u64, "simulating submission");
        tokio::time::sleep(self.delay).await;
        Ok(Receipt::new(
            "simulated",
            format!(
                "{}@{}:{}",
                submission.registry_id,
                submission.registry_version,
                submission.answers.len()
            ),
        ))
    }
}

/// Writes each submission as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(path: &Path, source: std::io::Error) -> CompletionError {
        CompletionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl CompletionHandler for JsonFileSink {
    async fn complete(&self, submission: &AnswerSet) -> Result<Receipt, CompletionError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| Self::io_error(&self.dir, source))?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let mut suffix = 0u32;
        let path = loop {
            let name = if suffix == 0 {
                format!("{}-{}.json", submission.registry_id, stamp)
            } else {
                format!("{}-{}-{}.json", submission.registry_id, stamp, suffix)
            };
            let candidate = self.dir.join(name);
            let exists = tokio::fs::try_exists(&candidate)
                .await
                .map_err(|source| Self::io_error(&candidate, source))?;
            if !exists {
                break candidate;
            }
            suffix += 1;
        };

        let body = submission.to_json_pretty()?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| Self::io_error(&path, source))?;
        info!(path = %path.display(), "submission written");

        let reference = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Receipt::new("json_file", reference).with_location(path))
    }
}

/// Adapts an async closure into a handler.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> CompletionHandler for FnHandler<F>
where
    F: Fn(AnswerSet) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Receipt, CompletionError>> + Send,
{
    async fn complete(&self, submission: &AnswerSet) -> Result<Receipt, CompletionError> {
        (self.func)(submission.clone()).await
    }
}
