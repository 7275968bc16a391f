// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Error type for this crate.
///
/// Only errors that abort an import run are represented here. Problems with
/// individual packages are reported through logging and [crate::ImportReport].
#[derive(Debug, Error)]
pub enum RpmImportError {
    #[error("source path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf, #[source] std::io::Error),

    #[error("repository path is not a directory: {}", .0.display())]
    RepositoryNotDirectory(PathBuf),

    #[error("I/O error on path {0}: {1:?}")]
    IoPath(String, std::io::Error),

    #[error("unable to create scratch directory: {0:?}")]
    ScratchDirectory(std::io::Error),

    #[error("unable to move {} to {}: {source:?}", .from.display(), .to.display())]
    Promote {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

impl RpmImportError {
    /// Process exit code to use when this error terminates the program.
    ///
    /// Invalid source or repository paths are usage errors and share clap's
    /// exit code for bad arguments.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotDirectory(..) | Self::RepositoryNotDirectory(_) => 2,
            Self::IoPath(..) | Self::ScratchDirectory(_) | Self::Promote { .. } => 1,
        }
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, RpmImportError>;
