use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Converting '{path}' with wslpath failed: {source}")]
    PathConversion {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WEBOTS_SHARED_FOLDER is malformed: '{0}' (expected <host_root>:<container_root>)")]
    SharedFolder(String),

    #[error("Copying '{}' to the shared folder '{}' failed: {source}", .source_dir.display(), .destination.display())]
    Copy {
        source_dir: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read the spawn request file '{}': {reason}", .path.display())]
    RequestFile { path: PathBuf, reason: String },

    #[error("Reconciling the relative path prefix was interrupted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SpawnError>;
