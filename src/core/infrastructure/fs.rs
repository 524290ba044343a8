//! Reading and writing of config and license files.

use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("not valid UTF-8 text: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Reads a whole file and decodes it as UTF-8.
pub async fn read_text(path: &Path) -> Result<String, FileError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8(bytes)?)
}

/// Writes `content` to `path`, replacing any existing file.
///
/// The file is flushed before it is closed, on success and on failure.
pub async fn write_text(path: &Path, content: &str) -> Result<(), FileError> {
    let mut file = tokio::fs::File::create(path).await?;
    let written = file.write_all(content.as_bytes()).await;
    let flushed = file.flush().await;
    written?;
    flushed?;
    Ok(())
}
