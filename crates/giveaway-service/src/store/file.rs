use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::GiveawayError;
use crate::state::Contest;
use crate::store::StoreBackend;

/// Flat-file backend: the whole collection serialized as one JSON array
/// and rewritten in full on every mutation.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact. A missing or
/// malformed file reads as an empty collection; corruption is logged as a
/// recoverable condition rather than crashing the process.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreBackend for FileBackend {
    async fn load(&self) -> Result<Vec<Contest>, GiveawayError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(contests) => Ok(contests),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "contest file is malformed, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, contests: &[Contest]) -> Result<(), GiveawayError> {
        let encoded = serde_json::to_vec_pretty(contests)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
