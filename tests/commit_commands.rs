use assert_fs::TempDir;
use assert_fs::prelude::*;
use fake::Fake;
use fake::faker::lorem::en::Words;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

use common::command::{
    committed_repository_dir, get_head_commit_sha, init_repository_dir, kit_commit,
    repository_dir, run_kit_command,
};

const FIRST_COMMIT_OID: &str = "66045a45e864202932b0ee417d0c860b9a0abb4d";
const ROOT_TREE_OID: &str = "6568594102aa023bcfab9c8bad79d78665481c95";
const DIR_TREE_OID: &str = "29b3498a6666031d125650c6b2592c82c537dd72";

#[rstest]
fn write_root_commit_successfully(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = init_repository_dir.path();
    run_kit_command(root, &["add", "."]).assert().success();

    kit_commit(root, "first")
        .assert()
        .success()
        .stdout("[master (root-commit) 66045a4] first\n");

    assert_eq!(get_head_commit_sha(root)?, FIRST_COMMIT_OID);
    init_repository_dir
        .child(".kit/refs/heads/master")
        .assert(format!("{FIRST_COMMIT_OID}\n"));

    run_kit_command(root, &["cat-file", "-p", FIRST_COMMIT_OID])
        .assert()
        .success()
        .stdout(format!(
            "\n{ROOT_TREE_OID}\nfake_user <fake_email@email.com>\n1672574400 +0000\nfirst\n"
        ));

    run_kit_command(root, &["cat-file", "-t", FIRST_COMMIT_OID])
        .assert()
        .success()
        .stdout("commit\n");
    run_kit_command(root, &["cat-file", "-t", ROOT_TREE_OID])
        .assert()
        .success()
        .stdout("tree\n");

    Ok(())
}

#[rstest]
fn second_commit_points_at_the_first(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = committed_repository_dir.path();
    committed_repository_dir.child("c.txt").write_str("new")?;
    run_kit_command(root, &["add", "c.txt"]).assert().success();

    kit_commit(root, "second")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[master "))
        .stdout(predicate::str::contains("root-commit").not());

    let head = get_head_commit_sha(root)?;
    assert_ne!(head, FIRST_COMMIT_OID);

    let output = run_kit_command(root, &["cat-file", "-p", &head]).output()?;
    let content = String::from_utf8(output.stdout)?;
    assert_eq!(content.lines().next(), Some(FIRST_COMMIT_OID));

    Ok(())
}

#[rstest]
fn commit_message_keeps_every_line(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = init_repository_dir.path();
    run_kit_command(root, &["add", "a.txt"]).assert().success();
    let message = Words(3..6).fake::<Vec<String>>().join("\n");

    kit_commit(root, &message).assert().success();

    let head = get_head_commit_sha(root)?;
    run_kit_command(root, &["cat-file", "-p", &head])
        .assert()
        .success()
        .stdout(predicate::str::ends_with(format!("+0000\n{message}\n")));

    Ok(())
}

#[rstest]
fn committing_an_empty_index_records_the_empty_tree(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = repository_dir.path();
    run_kit_command(root, &["init"]).assert().success();

    kit_commit(root, "nothing yet").assert().success();

    run_kit_command(root, &["ls-tree", "HEAD"])
        .assert()
        .success()
        .stdout("");

    Ok(())
}

#[rstest]
fn commit_requires_an_author(init_repository_dir: TempDir) {
    run_kit_command(init_repository_dir.path(), &["commit", "-m", "anonymous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KIT_AUTHOR_NAME"));

    init_repository_dir
        .child(".kit/refs/heads/master")
        .assert(predicate::path::missing());
}

#[rstest]
fn commit_rejects_an_empty_message(init_repository_dir: TempDir) {
    kit_commit(init_repository_dir.path(), "  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty commit message"));
}

#[rstest]
fn log_shows_history_newest_first(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = committed_repository_dir.path();
    committed_repository_dir.child("c.txt").write_str("new")?;
    run_kit_command(root, &["add", "c.txt"]).assert().success();
    kit_commit(root, "second\n\nwith a body").assert().success();
    let head = get_head_commit_sha(root)?;

    run_kit_command(root, &["log", "--oneline"])
        .assert()
        .success()
        .stdout(format!(
            "{} (HEAD -> master) second\n66045a4 first\n",
            &head[..7]
        ));

    run_kit_command(root, &["log"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "commit {head} (HEAD -> master)\n"
        )))
        .stdout(predicate::str::contains(
            "Author: fake_user <fake_email@email.com>\n\
             Date:   Sun Jan 1 12:00:00 2023 +0000\n\
             \n    second\n    \n    with a body\n",
        ))
        .stdout(predicate::str::ends_with(format!(
            "\ncommit {FIRST_COMMIT_OID}\nAuthor: fake_user <fake_email@email.com>\n\
             Date:   Sun Jan 1 12:00:00 2023 +0000\n\n    first\n"
        )));

    Ok(())
}

#[rstest]
fn log_of_an_empty_repository_prints_nothing(repository_dir: TempDir) {
    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_kit_command(repository_dir.path(), &["log"])
        .assert()
        .success()
        .stdout("");
}

#[rstest]
fn ls_tree_lists_the_head_snapshot(committed_repository_dir: TempDir) {
    let root = committed_repository_dir.path();

    run_kit_command(root, &["ls-tree", "HEAD"])
        .assert()
        .success()
        .stdout(format!(
            "100644 blob c22b5f9178342609428d6f51b2c5af4c0bde6a42\ta.txt\n\
             040000 tree {DIR_TREE_OID}\tdir\n"
        ));

    run_kit_command(root, &["ls-tree", "-r", &FIRST_COMMIT_OID[..8]])
        .assert()
        .success()
        .stdout(
            "100644 blob c22b5f9178342609428d6f51b2c5af4c0bde6a42\ta.txt\n\
             100644 blob c41975d1dae1cc69b16ad8892b8c77164e84ca39\tdir/b.txt\n",
        );

    run_kit_command(root, &["ls-tree", DIR_TREE_OID])
        .assert()
        .success()
        .stdout("100644 blob c41975d1dae1cc69b16ad8892b8c77164e84ca39\tb.txt\n");
}

#[rstest]
fn ls_tree_of_head_without_commits_fails(init_repository_dir: TempDir) {
    run_kit_command(init_repository_dir.path(), &["ls-tree", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HEAD does not point to a commit yet"));
}
