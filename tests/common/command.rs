use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
// %Y-%m-%d %H:%M:%S %z
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with `a.txt` ("hi") and `dir/b.txt` ("yo") written but not staged.
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        "hi".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("dir").join("b.txt"),
        "yo".to_string(),
    ));

    repository_dir
}

/// [`init_repository_dir`] with everything staged and committed as "first".
#[fixture]
pub fn committed_repository_dir(init_repository_dir: TempDir) -> TempDir {
    run_kit_command(init_repository_dir.path(), &["add", "."])
        .assert()
        .success();

    kit_commit(init_repository_dir.path(), "first")
        .assert()
        .success();

    init_repository_dir
}

pub fn run_kit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("kit").expect("Failed to find kit binary");
    cmd.current_dir(dir);
    cmd.envs(vec![("NO_COLOR", "1"), ("CLICOLOR", "0")]);
    cmd.env_remove("KIT_AUTHOR_NAME")
        .env_remove("KIT_AUTHOR_EMAIL")
        .env_remove("KIT_AUTHOR_DATE");
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn kit_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_kit_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("KIT_AUTHOR_NAME", AUTHOR_NAME),
        ("KIT_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("KIT_AUTHOR_DATE", AUTHOR_DATE),
    ]);
    cmd
}

/// Read the commit ID the current branch points to.
pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let head = std::fs::read_to_string(dir.join(".kit").join("HEAD"))?;
    let head = head.trim();

    match head.strip_prefix("ref: ") {
        Some(branch) => Ok(std::fs::read_to_string(dir.join(".kit").join(branch))?
            .trim()
            .to_string()),
        None => Ok(head.to_string()),
    }
}

/// Paths recorded in the index ledger, in ledger order.
pub fn read_index_paths(dir: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let ledger = std::fs::read_to_string(dir.join(".kit").join("index"))?;

    Ok(ledger
        .lines()
        .filter_map(|line| line.rsplitn(5, '|').last())
        .map(str::to_string)
        .collect())
}
