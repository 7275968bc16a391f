// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Moving packages into a repository directory. */

use {
    crate::{
        error::{Result, RpmImportError},
        signing::PackageSigner,
    },
    log::{debug, error, info, warn},
    std::path::{Path, PathBuf},
};

/// File name suffix of packages to import.
pub const PACKAGE_SUFFIX: &str = ".rpm";

/// Find packages directly inside a directory.
///
/// Only regular files (or symlinks to them) whose name ends in
/// [PACKAGE_SUFFIX] are returned. Results are sorted by path.
pub fn find_candidates(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(source_dir)
        .map_err(|e| RpmImportError::SourceNotDirectory(source_dir.to_path_buf(), e))?;

    let mut candidates = vec![];

    for entry in entries {
        let entry =
            entry.map_err(|e| RpmImportError::IoPath(format!("{}", source_dir.display()), e))?;
        let path = entry.path();

        if !entry.file_name().to_string_lossy().ends_with(PACKAGE_SUFFIX) {
            continue;
        }

        if path.is_file() {
            candidates.push(path);
        } else {
            debug!("ignoring {}: not a file", path.display());
        }
    }

    candidates.sort();

    Ok(candidates)
}

/// What happened to a single package during an import run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImportOutcome {
    /// The package was placed in the repository and removed from the source.
    Imported,
    /// A file with the same name already exists in the repository.
    Collision,
    /// The package could not be copied to the scratch directory.
    CopyFailed,
    /// The signer rejected the package.
    SigningFailed,
}

/// Summary of an import run.
///
/// Each field holds the source paths of packages with that outcome.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<PathBuf>,
    pub collisions: Vec<PathBuf>,
    pub copy_failures: Vec<PathBuf>,
    pub signing_failures: Vec<PathBuf>,
}

impl ImportReport {
    fn record(&mut self, path: PathBuf, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Imported => self.imported.push(path),
            ImportOutcome::Collision => self.collisions.push(path),
            ImportOutcome::CopyFailed => self.copy_failures.push(path),
            ImportOutcome::SigningFailed => self.signing_failures.push(path),
        }
    }

    /// Number of packages that were looked at.
    pub fn total(&self) -> usize {
        self.imported.len()
            + self.collisions.len()
            + self.copy_failures.len()
            + self.signing_failures.len()
    }
}

/// Imports packages from a source directory into a repository directory.
///
/// Packages are processed one at a time:
///
/// 1. If the repository already has an entry with the package's name, the
///    package is skipped.
/// 2. The package is copied into a scratch directory.
/// 3. If a signer is configured, the scratch copy is signed. On failure the
///    scratch copy is discarded and the package skipped.
/// 4. The scratch copy is renamed into the repository.
/// 5. The original package is deleted.
///
/// Skipped packages remain in the source directory. The rename in step 4 is
/// only atomic if the scratch directory and the repository share a
/// filesystem. See [Self::scratch_parent].
pub struct RpmImporter<'a> {
    source_dir: PathBuf,
    repository_dir: PathBuf,
    scratch_parent: Option<PathBuf>,
    signer: Option<&'a dyn PackageSigner>,
}

impl<'a> RpmImporter<'a> {
    /// Construct an instance that imports without signing.
    pub fn new(source_dir: impl AsRef<Path>, repository_dir: impl AsRef<Path>) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            repository_dir: repository_dir.as_ref().to_path_buf(),
            scratch_parent: None,
            signer: None,
        }
    }

    /// Sign packages with the given signer before importing them.
    pub fn signer(&mut self, signer: &'a dyn PackageSigner) -> &mut Self {
        self.signer = Some(signer);
        self
    }

    /// Create the scratch directory under this path instead of the system
    /// temporary directory.
    pub fn scratch_parent(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.scratch_parent = Some(path.as_ref().to_path_buf());
        self
    }

    /// Perform the import.
    ///
    /// Problems with individual packages don't fail the run. An error is
    /// returned if the source or repository isn't a directory (in which case
    /// nothing was touched) or if a signed package couldn't be moved into the
    /// repository.
    pub fn run(&self) -> Result<ImportReport> {
        let candidates = find_candidates(&self.source_dir)?;

        if !self.repository_dir.is_dir() {
            return Err(RpmImportError::RepositoryNotDirectory(
                self.repository_dir.clone(),
            ));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("rpmimport");
        let scratch = match &self.scratch_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        let scratch = scratch.map_err(RpmImportError::ScratchDirectory)?;

        debug!("using scratch directory {}", scratch.path().display());

        let mut report = ImportReport::default();

        for candidate in candidates {
            let outcome = self.import_package(scratch.path(), &candidate)?;
            report.record(candidate, outcome);
        }

        Ok(report)
    }

    fn import_package(&self, scratch_dir: &Path, candidate: &Path) -> Result<ImportOutcome> {
        let file_name = match candidate.file_name() {
            Some(name) => name,
            None => return Ok(ImportOutcome::CopyFailed),
        };

        let destination = self.repository_dir.join(file_name);

        // symlink_metadata() so a dangling symlink still counts.
        if destination.symlink_metadata().is_ok() {
            warn!(
                "file already exists in repository, ignoring: {}",
                destination.display()
            );
            return Ok(ImportOutcome::Collision);
        }

        let scratch_path = scratch_dir.join(file_name);

        if let Err(e) = std::fs::copy(candidate, &scratch_path) {
            error!("unable to copy {}: {}", candidate.display(), e);
            remove_quietly(&scratch_path);
            return Ok(ImportOutcome::CopyFailed);
        }

        if let Some(signer) = self.signer {
            info!("signing {}", candidate.display());

            if let Err(e) = signer.sign_package(&scratch_path) {
                // The signer already told the user what went wrong.
                debug!("{}", e);
                remove_quietly(&scratch_path);
                return Ok(ImportOutcome::SigningFailed);
            }
        }

        if let Err(e) = std::fs::rename(&scratch_path, &destination) {
            remove_quietly(&scratch_path);
            return Err(RpmImportError::Promote {
                from: scratch_path,
                to: destination,
                source: e,
            });
        }

        if let Err(e) = std::fs::remove_file(candidate) {
            warn!(
                "imported {} but unable to remove it: {}",
                candidate.display(),
                e
            );
        }

        info!("imported {}", destination.display());

        Ok(ImportOutcome::Imported)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        debug!("unable to remove {}: {}", path.display(), e);
    }
}
