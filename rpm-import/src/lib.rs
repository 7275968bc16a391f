// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import RPM packages into a RPM repository directory.
//!
//! This crate moves `.rpm` files from a staging directory into the directory
//! backing a RPM repository, optionally signing each one with `rpmsign` on
//! the way in.
//!
//! Every package is copied to a scratch directory first. Signing happens on
//! the scratch copy, so a package that fails to sign never reaches the
//! repository and its original is left in place. Packages are placed into the
//! repository with a rename, so the repository never sees a partially written
//! file. Packages already present in the repository are never overwritten.
//!
//! Repository metadata (`repodata/`) is not touched. Run `createrepo` or
//! similar after importing.

pub mod error;
pub mod import;
pub mod signing;

#[cfg(test)]
mod testutil;

pub use {
    error::{Result, RpmImportError},
    import::{find_candidates, ImportOutcome, ImportReport, RpmImporter, PACKAGE_SUFFIX},
    signing::{PackageSigner, RpmSign, RpmSignError},
};
