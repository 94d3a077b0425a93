use crate::common::command::{
    branch_head, commit_file, commit_lock, hero_commit, index_map, init_repository_dir,
    repository_dir, run_hero_command,
};
use crate::common::file::{FileSpec, write_file};
use assert_fs::TempDir;
use hero::artifacts::objects::digest::Digest;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn commit_records_the_parent_and_advances_the_branch(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init", "main"]).assert().success();
    let root = branch_head(dir, "main");

    write_file(FileSpec::new(dir.join("a.txt"), "hi".to_string()));
    run_hero_command(dir, &["add", "a.txt"]).assert().success();
    assert_eq!(index_map(dir), format!("a.txt,{}\n", Digest::of("hi")));

    hero_commit(dir, "t")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[main [0-9a-f]{7}\] t\n$")?);

    let head = branch_head(dir, "main");
    assert_ne!(head, root);
    assert_eq!(index_map(dir), "");

    run_hero_command(dir, &["cat-file", &head])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("parent {root}")))
        .stdout(predicate::str::contains("title t"))
        .stdout(predicate::str::contains(format!("{} ", Digest::of("hi"))))
        .stdout(predicate::str::contains("integrity: ok"));

    Ok(())
}

#[rstest]
fn stored_commits_hash_to_their_names(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let head = branch_head(init_repository_dir.path(), "main");
    let blob = std::fs::read(
        init_repository_dir
            .path()
            .join(".hero")
            .join("commits")
            .join(&head),
    )?;

    assert_eq!(Digest::of(&blob).to_string(), head);
    assert!(blob.starts_with(b"COMMIT HEADER\n&&&\nparent "));
    assert!(blob.ends_with(b"COMMIT FOOTER\n&&&\ncount 3\nsize 11\n&&&&&\n"));

    Ok(())
}

#[rstest]
fn commit_takes_title_and_message_from_the_prompt(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("notes.txt"), "notes".to_string()));
    run_hero_command(dir, &["add", "notes.txt"]).assert().success();

    run_hero_command(dir, &["commit"])
        .write_stdin("Prompted title\nfirst line\nsecond & last\x18\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Commit title:"));

    run_hero_command(dir, &["cat-file", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title Prompted title"))
        .stdout(predicate::str::contains("    first line\n    second & last"));

    Ok(())
}

#[rstest]
fn commit_with_an_empty_title_is_refused(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    let root = branch_head(dir, "main");

    run_hero_command(dir, &["commit"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("empty title"));

    assert_eq!(branch_head(dir, "main"), root);

    Ok(())
}

#[rstest]
fn commit_all_restages_the_files_of_the_current_commit(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "uno".to_string()));

    run_hero_command(dir, &["commit", "-a", "-t", "update"])
        .assert()
        .success();

    run_hero_command(dir, &["cat-file", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{}", Digest::of("uno"))))
        .stdout(predicate::str::contains("a/2.txt"))
        .stdout(predicate::str::contains("a/b/3.txt"))
        .stdout(predicate::str::contains(format!("{}", Digest::of("one"))).not());

    Ok(())
}

#[rstest]
fn commit_paths_keeps_the_rest_of_the_index_staged(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("x.txt"), "x".to_string()));
    write_file(FileSpec::new(dir.join("y.txt"), "y".to_string()));
    run_hero_command(dir, &["add", "x.txt", "y.txt"])
        .assert()
        .success();

    run_hero_command(dir, &["commit", "-t", "only y", "y.txt"])
        .assert()
        .success();

    run_hero_command(dir, &["cat-file", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("y.txt"))
        .stdout(predicate::str::contains("x.txt").not());

    assert_eq!(index_map(dir), format!("x.txt,{}\n", Digest::of("x")));
    assert!(!dir.join(".hero").join("index.backup").exists());

    Ok(())
}

#[rstest]
fn committing_while_detached_moves_no_branch(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_hero_command(dir, &["init"]).assert().success();
    let root = branch_head(dir, "main");
    commit_file(dir, "a.txt", "hi", "second");
    let head = branch_head(dir, "main");

    run_hero_command(dir, &["checkout", &root])
        .assert()
        .success();
    write_file(FileSpec::new(dir.join("b.txt"), "detached".to_string()));
    run_hero_command(dir, &["add", "b.txt"]).assert().success();

    let output = hero_commit(dir, "experiment")
        .assert()
        .success()
        .stderr(predicate::str::contains("no branch was updated"))
        .get_output()
        .stdout
        .clone();
    let output = String::from_utf8(output)?;
    let digest = output.lines().last().unwrap_or_default().to_string();

    assert_eq!(branch_head(dir, "main"), head);
    assert_eq!(commit_lock(dir), Some(root));
    run_hero_command(dir, &["cat-file", &digest])
        .assert()
        .success()
        .stdout(predicate::str::contains("title experiment"));

    Ok(())
}
