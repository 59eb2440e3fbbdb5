use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use ircheck::check::{Checker, ValidationReport};
use ircheck::driver::config::CheckerConfig;
use tempfile::TempDir;

pub const SAMPLE_DUMPS: &[(&str, &str)] = &[
    (
        "001_pass_0001_ets_string_concat_loop_ETSGLOBAL_concat_loop0_BranchElimination.ir",
        include_str!(
            "dumps/001_pass_0001_ets_string_concat_loop_ETSGLOBAL_concat_loop0_BranchElimination.ir"
        ),
    ),
    (
        "002_pass_0002_ets_string_concat_loop_ETSGLOBAL_concat_loop0_SimplifyStringBuilder.ir",
        include_str!(
            "dumps/002_pass_0002_ets_string_concat_loop_ETSGLOBAL_concat_loop0_SimplifyStringBuilder.ir"
        ),
    ),
    (
        "003_pass_0003_ets_string_concat_loop_ETSGLOBAL_concat_loop5_ChecksElimination.ir",
        include_str!(
            "dumps/003_pass_0003_ets_string_concat_loop_ETSGLOBAL_concat_loop5_ChecksElimination.ir"
        ),
    ),
];

/// Creates a work directory whose `ir_dump` subdirectory holds `dumps`.
pub fn work_dir(dumps: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create work dir");
    let dump_dir = dir.path().join("ir_dump");
    fs::create_dir(&dump_dir).expect("failed to create dump dir");
    for (name, body) in dumps {
        fs::write(dump_dir.join(name), body).expect("failed to write dump");
    }
    dir
}

#[allow(unused)]
pub fn sample_work_dir() -> TempDir {
    work_dir(SAMPLE_DUMPS)
}

#[allow(unused)]
pub fn check(dir: &TempDir, source: &str) -> ValidationReport {
    Checker::new(dir.path(), CheckerConfig::default()).run_source(source)
}

#[allow(unused)]
pub fn failure_messages(report: &ValidationReport) -> Vec<String> {
    report.failures.iter().map(|x| x.error.to_string()).collect()
}

#[allow(unused)]
pub fn transcript_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/transcripts")
        .join(name)
}

#[allow(unused)]
pub fn run_checker(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ircheck"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ircheck")
}
