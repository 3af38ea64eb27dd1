use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;

use crate::schema::Comic;

/// Failures that end a run. Nothing is retried.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to encode the comic collection: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Encodes the collection as a JSON array indented with four spaces.
///
/// Output is deterministic: the same records always produce the
/// same bytes. An empty collection encodes as `[]`.
pub fn encode(records: &[Comic]) -> Result<Vec<u8>, OutputError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser)?;
    Ok(buf)
}

/// Writes `data` to `path`, replacing any existing file.
///
/// The file is synced before returning so a failed close surfaces
/// as an error rather than a silently truncated document.
pub fn write_output(path: impl AsRef<Path>, data: &[u8]) -> Result<(), OutputError> {
    let path = path.as_ref();
    let sink_err = |source| OutputError::Sink {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(sink_err)?;
    file.write_all(data).map_err(sink_err)?;
    file.sync_all().map_err(sink_err)?;
    Ok(())
}
