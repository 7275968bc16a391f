// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    clap::{value_parser, Arg, ArgAction, ArgMatches, Command},
    log::{info, LevelFilter},
    rpm_import::{signing::DEFAULT_RPMSIGN, Result, RpmImporter, RpmSign},
    std::{ffi::OsString, path::PathBuf},
};

const ABOUT: &str = "\
Signs and imports RPM packages into a RPM repository.

Every file ending in `.rpm` directly inside SOURCE_DIR is moved into
REPOSITORY_DIR. Other files and directories are left alone.

Each package is first copied into a scratch directory. Unless `--no-sign` is
given, `rpmsign --addsign` is run against the copy. The (signed) copy is then
renamed into the repository and the original is deleted.

Packages are never overwritten. If REPOSITORY_DIR already contains a file of
the same name, the package is skipped and left in SOURCE_DIR. Packages that
fail to sign are also left in SOURCE_DIR. Neither condition fails the run.

The rename into the repository is only atomic if the scratch directory is on
the same filesystem as the repository. Use `--scratch-dir` to choose where the
scratch directory is created if the system temporary directory is on a
different filesystem.

Repository metadata is not updated. Run `createrepo` afterwards.
";

fn command() -> Command {
    Command::new("rpmimport")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Signs and imports RPM packages into a RPM repository")
        .long_about(ABOUT)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .arg(
            Arg::new("key_id")
                .long("key-id")
                .short('k')
                .action(ArgAction::Set)
                .help("ID of GPG key to use for signing"),
        )
        .arg(
            Arg::new("gpg_home")
                .long("gpg-home")
                .short('g')
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .help("GPG keychain to use"),
        )
        .arg(
            Arg::new("sign")
                .long("sign")
                .action(ArgAction::SetTrue)
                .overrides_with("no_sign")
                .help("Sign packages before importing them (the default)"),
        )
        .arg(
            Arg::new("no_sign")
                .long("no-sign")
                .action(ArgAction::SetTrue)
                .overrides_with("sign")
                .help("Import packages without signing them"),
        )
        .arg(
            Arg::new("rpmsign")
                .long("rpmsign")
                .action(ArgAction::Set)
                .value_parser(value_parser!(OsString))
                .default_value(DEFAULT_RPMSIGN)
                .help("Program to sign packages with"),
        )
        .arg(
            Arg::new("scratch_dir")
                .long("scratch-dir")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .help("Directory in which to create the scratch directory"),
        )
        .arg(
            Arg::new("source_dir")
                .required(true)
                .value_name("SOURCE_DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory where the RPMs to import are stored"),
        )
        .arg(
            Arg::new("repository_dir")
                .required(true)
                .value_name("REPOSITORY_DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory where the RPM repository is stored"),
        )
}

fn init_logging(args: &ArgMatches) {
    let log_level = match args.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();
}

fn command_import(args: &ArgMatches) -> Result<()> {
    let source_dir = args
        .get_one::<PathBuf>("source_dir")
        .expect("source_dir argument is required");
    let repository_dir = args
        .get_one::<PathBuf>("repository_dir")
        .expect("repository_dir argument is required");

    let mut signer = RpmSign::new();
    if let Some(program) = args.get_one::<OsString>("rpmsign") {
        signer.program(program.clone());
    }
    if let Some(key_id) = args.get_one::<String>("key_id") {
        signer.key_id(key_id);
    }
    if let Some(gpg_home) = args.get_one::<PathBuf>("gpg_home") {
        signer.gpg_home(gpg_home);
    }

    let mut importer = RpmImporter::new(source_dir, repository_dir);

    if !args.get_flag("no_sign") {
        importer.signer(&signer);
    }
    if let Some(scratch_dir) = args.get_one::<PathBuf>("scratch_dir") {
        importer.scratch_parent(scratch_dir);
    }

    let report = importer.run()?;

    info!(
        "{} packages processed: {} imported, {} already in repository, {} failed to sign, {} failed to copy",
        report.total(),
        report.imported.len(),
        report.collisions.len(),
        report.signing_failures.len(),
        report.copy_failures.len()
    );

    Ok(())
}

pub fn run_cli() -> Result<()> {
    let matches = command().get_matches();

    init_logging(&matches);

    command_import(&matches)
}
