// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    once_cell::sync::Lazy,
    std::path::{Path, PathBuf},
};

pub static DEFAULT_TEMP_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
    tempfile::Builder::new()
        .prefix("rpm-import-test")
        .tempdir()
        .expect("unable to create temporary directory")
});

/// Fake `rpmsign` that appends its arguments and `GNUPGHOME` to the package.
#[cfg(unix)]
pub static FAKE_RPMSIGN: Lazy<PathBuf> = Lazy::new(|| {
    write_script(
        "fake-rpmsign",
        "#!/bin/sh\n\
         for last; do :; done\n\
         printf 'signed args=%s home=%s\\n' \"$*\" \"${GNUPGHOME:-}\" >> \"$last\"\n",
    )
});

/// Fake `rpmsign` that refuses to sign anything.
#[cfg(unix)]
pub static FAILING_RPMSIGN: Lazy<PathBuf> = Lazy::new(|| {
    write_script(
        "failing-rpmsign",
        "#!/bin/sh\necho 'rpmsign: refusing to sign' >&2\nexit 1\n",
    )
});

#[cfg(unix)]
fn write_script(name: &str, content: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = DEFAULT_TEMP_DIR.path().join(name);
    std::fs::write(&path, content).expect("unable to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("unable to mark script executable");

    wait_until_executable(&path);

    path
}

/// Block until a freshly written executable can be spawned.
///
/// A child forked by another test thread while the script was open for
/// writing keeps the write descriptor until it execs. Spawning the script in
/// that window fails with ETXTBSY.
#[cfg(unix)]
fn wait_until_executable(path: &Path) {
    const ETXTBSY: i32 = 26;

    for _ in 0..100 {
        match duct::cmd(path, ["/dev/null"])
            .stdout_null()
            .stderr_null()
            .unchecked()
            .run()
        {
            Ok(_) => return,
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            Err(e) => panic!("unable to run {}: {}", path.display(), e),
        }
    }

    panic!("{} never became executable", path.display());
}

/// Create a fresh directory with `source`, `repository` and `scratch` children.
pub fn import_dirs(name: &str) -> (PathBuf, PathBuf, PathBuf) {
    let root = DEFAULT_TEMP_DIR.path().join(name);
    let source = root.join("source");
    let repository = root.join("repository");
    let scratch = root.join("scratch");

    for p in [&source, &repository, &scratch] {
        std::fs::create_dir_all(p).expect("unable to create test directory");
    }

    (source, repository, scratch)
}

/// Sorted file names inside a directory.
pub fn dir_names(path: &Path) -> Vec<String> {
    let mut names = std::fs::read_dir(path)
        .expect("unable to read directory")
        .map(|entry| {
            entry
                .expect("unable to read directory entry")
                .file_name()
                .to_string_lossy()
                .to_string()
        })
        .collect::<Vec<_>>();
    names.sort();

    names
}
