use crate::common::file::{FileSpec, write_file};
use crate::common::redirect_temp_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

/// Every commit made by the tests carries this timestamp
pub const COMMIT_DATE: &str = "2023-01-01 12:00:00";

#[fixture]
pub fn repository_dir() -> TempDir {
    redirect_temp_dir();
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with `1.txt`, `a/2.txt` and `a/b/3.txt` committed on `main`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_hero_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    let file1 = FileSpec::new(repository_dir.path().join("1.txt"), "one".to_string());
    write_file(file1);

    let file2 = FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    );
    write_file(file2);

    let file3 = FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    );
    write_file(file3);

    run_hero_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    hero_commit(repository_dir.path(), "First commit")
        .assert()
        .success();

    repository_dir
}

/// Run `hero` in `dir` with an empty stdin, so every question gets its default answer
pub fn run_hero_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("hero").expect("Failed to find hero binary");
    cmd.envs(vec![("HERO_COMMIT_DATE", COMMIT_DATE), ("HERO_LOG", "warn")]);
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd.write_stdin("");
    cmd
}

pub fn run_repofix_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("hero-repofix").expect("Failed to find hero-repofix binary");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn hero_commit(dir: &Path, title: &str) -> Command {
    run_hero_command(dir, &["commit", "-t", title])
}

/// Stage and commit a single file with the given content
pub fn commit_file(dir: &Path, name: &str, content: &str, title: &str) {
    write_file(FileSpec::new(dir.join(name), content.to_string()));

    run_hero_command(dir, &["add", name]).assert().success();
    hero_commit(dir, title).assert().success();
}

pub fn read_head(dir: &Path) -> String {
    read_repository_file(dir, "HEAD")
}

pub fn branch_head(dir: &Path, branch: &str) -> String {
    read_repository_file(dir, &format!("branches/{branch}"))
}

pub fn commit_lock(dir: &Path) -> Option<String> {
    let lock_path = dir.join(".hero").join("COMMIT_LOCK");

    lock_path
        .exists()
        .then(|| read_repository_file(dir, "COMMIT_LOCK"))
}

/// Digest of the current position, whether attached or detached
pub fn current_position(dir: &Path) -> String {
    commit_lock(dir).unwrap_or_else(|| branch_head(dir, &read_head(dir)))
}

pub fn index_map(dir: &Path) -> String {
    std::fs::read_to_string(dir.join(".hero").join("index").join("map"))
        .expect("Failed to read the index table")
}

fn read_repository_file(dir: &Path, name: &str) -> String {
    let path = dir.join(".hero").join(name);

    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
        .trim()
        .to_string()
}
