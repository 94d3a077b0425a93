use crate::common::command::{
    branch_head, commit_file, repository_dir, run_hero_command,
};
use assert_fs::TempDir;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn log_lists_commits_newest_first(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    let root = branch_head(dir, "main");

    std::fs::write(dir.join("a.txt"), "hi")?;
    run_hero_command(dir, &["add", "a.txt"]).assert().success();
    run_hero_command(dir, &["commit", "-t", "Add a", "-m", "first line\nsecond line"])
        .assert()
        .success();
    let tip = branch_head(dir, "main");

    let output = run_hero_command(dir, &["log"]).output()?;
    assert!(output.status.success());

    let expected = format!(
        "commit {tip} (main)\n\
         Committed on 2023-01-01 at 12:00:00 UTC\n\
         \tAdd a\n\
         \n\
         \tfirst line\n\
         \tsecond line\n\
         \n\
         commit {root}\n\
         Committed on 2023-01-01 at 12:00:00 UTC\n\
         \tInitial Commit\n\
         \n\
         \tThis commit marks the initialization of the repository.\n\
         \n"
    );
    assert_eq!(String::from_utf8(output.stdout)?, expected);

    Ok(())
}

#[rstest]
fn commits_without_message_have_no_message_block(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    commit_file(dir, "a.txt", "hi", "Only a title");

    run_hero_command(dir, &["log", "main"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "commit {} (main)\nCommitted on 2023-01-01 at 12:00:00 UTC\n\tOnly a title\n\ncommit ",
            branch_head(dir, "main")
        )));

    Ok(())
}

#[rstest]
fn log_of_a_branch_skips_detached_commits(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    let root = branch_head(dir, "main");
    commit_file(dir, "a.txt", "hi", "on main");

    run_hero_command(dir, &["checkout", &root]).assert().success();
    commit_file(dir, "b.txt", "bee", "detached work");

    run_hero_command(dir, &["log", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("on main"))
        .stdout(predicate::str::contains("detached work").not());

    run_hero_command(dir, &["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("detached work").not());

    Ok(())
}

#[rstest]
fn log_of_an_unknown_reference_fails(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();

    run_hero_command(dir, &["log", "nowhere"])
        .assert()
        .code(2)
        .stdout("");

    Ok(())
}
