// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Interface to `rpmsign`. */

use {
    log::debug,
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

/// Program invoked to sign packages when no other is configured.
pub const DEFAULT_RPMSIGN: &str = "rpmsign";

/// Environment variable through which GnuPG finds its home directory.
pub const GPG_HOME_ENV: &str = "GNUPGHOME";

/// Error signing a single package.
///
/// Callers usually don't care why signing failed: the signing tool writes
/// its own diagnostics to the terminal.
#[derive(Debug, Error)]
pub enum RpmSignError {
    /// The signing program ran and exited non-zero.
    #[error("signing of RPM failed: {0}")]
    Failed(String),

    /// The signing program could not be started or waited on.
    #[error("signing of RPM failed: {0}: {1}")]
    Launch(String, std::io::Error),
}

/// Something that signs a package file in place.
pub trait PackageSigner {
    /// Sign the package at `path`, rewriting it in place.
    fn sign_package(&self, path: &Path) -> Result<(), RpmSignError>;
}

impl<F> PackageSigner for F
where
    F: Fn(&Path) -> Result<(), RpmSignError>,
{
    fn sign_package(&self, path: &Path) -> Result<(), RpmSignError> {
        self(path)
    }
}

/// Represents invocations of `rpmsign --addsign` to sign packages.
///
/// Without a key id or GnuPG home, `rpmsign` falls back to whatever
/// `/etc/rpm/macros` or `~/.rpmmacros` configure.
#[derive(Clone, Debug)]
pub struct RpmSign {
    program: OsString,
    key_id: Option<String>,
    gpg_home: Option<PathBuf>,
}

impl Default for RpmSign {
    fn default() -> Self {
        Self {
            program: OsString::from(DEFAULT_RPMSIGN),
            key_id: None,
            gpg_home: None,
        }
    }
}

impl RpmSign {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the program to execute instead of `rpmsign`.
    ///
    /// A bare name is searched for on `PATH`.
    pub fn program(&mut self, program: impl Into<OsString>) -> &mut Self {
        self.program = program.into();
        self
    }

    /// Set the id of the GPG key to sign with.
    ///
    /// This is passed into the `--key-id` argument.
    pub fn key_id(&mut self, key_id: impl ToString) -> &mut Self {
        self.key_id = Some(key_id.to_string());
        self
    }

    /// Set the GnuPG home directory holding the signing key.
    ///
    /// This is exported to `rpmsign` via `GNUPGHOME`.
    pub fn gpg_home(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.gpg_home = Some(path.as_ref().to_path_buf());
        self
    }

    /// Arguments passed to the signing program to sign `path`.
    pub fn args(&self, path: &Path) -> std::io::Result<Vec<OsString>> {
        let mut args = vec![];

        if let Some(key_id) = &self.key_id {
            args.push(OsString::from("--key-id"));
            args.push(OsString::from(key_id));
        }

        args.push(OsString::from("--addsign"));
        args.push(std::path::absolute(path)?.into_os_string());

        Ok(args)
    }

    /// Value of `GNUPGHOME` to export to the signing program, if any.
    pub fn gpg_home_env(&self) -> std::io::Result<Option<PathBuf>> {
        self.gpg_home
            .as_ref()
            .map(std::path::absolute)
            .transpose()
    }

    /// Run the signing program against a file.
    ///
    /// The program inherits stdin, stdout and stderr. This blocks until it
    /// exits.
    pub fn sign(&self, path: &Path) -> Result<(), RpmSignError> {
        let launch_error = |e| RpmSignError::Launch(path.display().to_string(), e);

        let args = self.args(path).map_err(launch_error)?;

        debug!(
            "running {} {}",
            self.program.to_string_lossy(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut expression = duct::cmd(self.program.clone(), args).unchecked();

        if let Some(gpg_home) = self.gpg_home_env().map_err(launch_error)? {
            expression = expression.env(GPG_HOME_ENV, gpg_home);
        }

        let output = expression.run().map_err(launch_error)?;

        if output.status.success() {
            Ok(())
        } else {
            debug!("{} exited with {}", self.program.to_string_lossy(), output.status);
            Err(RpmSignError::Failed(path.display().to_string()))
        }
    }
}

impl PackageSigner for RpmSign {
    fn sign_package(&self, path: &Path) -> Result<(), RpmSignError> {
        self.sign(path)
    }
}
