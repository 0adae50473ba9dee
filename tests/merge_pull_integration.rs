//! Integration tests for merge and pull.
//!
//! Pull tests clone a local "origin" repository so fetching goes through
//! libgit2's local transport without any network access.

use std::path::Path;
use std::process::Command as Process;

use tempfile::TempDir;

use logicalgit::cli::args::{Command, MergeResume, ReplayResume};
use logicalgit::cli::commands::dispatch;
use logicalgit::engine::{Context, ExitStatus, Rendered};

fn run_git(dir: &Path, args: &[&str]) {
    let status = Process::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = Process::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(output.status.success(), "git {:?} failed", args);
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn configure(dir: &Path) {
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "core.editor", "true"]);
}

fn commit(dir: &Path, filename: &str, content: &str, message: &str) {
    std::fs::write(dir.join(filename), content).unwrap();
    run_git(dir, &["add", filename]);
    run_git(dir, &["commit", "-q", "-m", message]);
}

fn short(dir: &Path, spec: &str) -> String {
    git_output(dir, &["rev-parse", "--short=7", spec])
}

fn run(dir: &Path, command: Command) -> Rendered {
    let ctx = Context {
        cwd: Some(dir.to_path_buf()),
        ..Default::default()
    };
    dispatch(command, &ctx)
}

fn merge(commit: &str) -> Command {
    Command::Merge {
        commit: Some(commit.to_string()),
        resume: MergeResume::default(),
    }
}

fn merge_resume(continue_op: bool, abort: bool) -> Command {
    Command::Merge {
        commit: None,
        resume: MergeResume { continue_op, abort },
    }
}

fn pull(rebase: bool) -> Command {
    Command::Pull {
        rebase,
        no_rebase: false,
        resume: ReplayResume::default(),
    }
}

/// A repository where `main` and `topic` both changed since forking.
/// `clash` makes both sides edit README.md.
fn diverged(clash: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    run_git(path, &["init", "-q", "-b", "main"]);
    configure(path);
    commit(path, "README.md", "# Test\n", "Initial commit");

    run_git(path, &["checkout", "-q", "-b", "topic"]);
    if clash {
        commit(path, "README.md", "topic\n", "Topic edit");
    } else {
        commit(path, "topic.txt", "t\n", "Topic file");
    }
    run_git(path, &["checkout", "-q", "main"]);
    commit(path, "README.md", "main\n", "Main edit");
    dir
}

mod merge {
    use super::*;

    #[test]
    fn clean_merge() {
        let dir = diverged(false);
        let path = dir.path();

        let rendered = run(path, merge("topic"));
        assert_eq!(rendered.exit_status, ExitStatus::Complete);
        assert_eq!(
            rendered.message,
            format!(
                "Applied [{}] Merge topic into main\nMerge made by the recursive strategy.\n\n",
                short(path, "HEAD")
            )
        );
        assert_eq!(
            git_output(path, &["rev-parse", "HEAD^2"]),
            git_output(path, &["rev-parse", "topic"])
        );
        assert_eq!(git_output(path, &["status", "--porcelain"]), "");
    }

    #[test]
    fn conflict_then_continue() {
        let dir = diverged(true);
        let path = dir.path();
        let topic = short(path, "topic");

        let stopped = run(path, merge("topic"));
        assert_eq!(stopped.exit_status, ExitStatus::Aborted);
        assert!(stopped.message.starts_with(&format!(
            "error: could not merge [{topic}] Topic edit\nConflicts:\n\tREADME.md\n\n"
        )));
        assert!(stopped.message.contains(
            "hint: You can instead commit the resolved result yourself with \"git commit\".\n"
        ));
        assert!(path.join(".git/MERGE_HEAD").is_file());

        std::fs::write(path.join("README.md"), "both\n").unwrap();
        run_git(path, &["add", "README.md"]);

        let done = run(path, merge_resume(true, false));
        assert_eq!(done.exit_status, ExitStatus::Complete);
        assert!(done
            .message
            .ends_with("Merge topic into main\nMerge made by the recursive strategy.\n\n"));
        assert!(!path.join(".git/MERGE_HEAD").exists());
        assert_eq!(git_output(path, &["log", "-1", "--format=%p"]).split(' ').count(), 2);
    }

    #[test]
    fn abort() {
        let dir = diverged(true);
        let path = dir.path();
        let original = short(path, "HEAD");
        run(path, merge("topic"));

        let aborted = run(path, merge_resume(false, true));
        assert_eq!(aborted.exit_status, ExitStatus::Aborted);
        assert_eq!(
            aborted.message,
            format!("Aborted merge. Restored main to [{original}].\n\n")
        );
        assert_eq!(
            std::fs::read_to_string(path.join("README.md")).unwrap(),
            "main\n"
        );
        assert!(!path.join(".git/MERGE_HEAD").exists());
    }

    #[test]
    fn already_merged() {
        let dir = diverged(false);
        let rendered = run(dir.path(), merge("main~1"));
        assert_eq!(rendered.exit_status, ExitStatus::Complete);
        assert_eq!(rendered.message, "Already up to date.\n\n");
    }

    #[test]
    fn git_merge_in_progress_blocks_rebase() {
        let dir = diverged(true);
        let path = dir.path();
        run(path, merge("topic"));

        let rendered = run(
            path,
            Command::Rebase {
                upstream: Some("topic".to_string()),
                branch: None,
                resume: ReplayResume::default(),
            },
        );
        assert_eq!(rendered.exit_status, ExitStatus::Error);
        assert!(rendered
            .message
            .starts_with("error: a git merge is already in progress\n"));
    }
}

mod pull {
    use super::*;

    /// An origin repository and a clone of it tracking `origin/main`.
    struct Remote {
        origin: TempDir,
        clone: TempDir,
    }

    impl Remote {
        fn new() -> Self {
            let origin = TempDir::new().unwrap();
            run_git(origin.path(), &["init", "-q", "-b", "main"]);
            configure(origin.path());
            commit(origin.path(), "README.md", "# Test\n", "Initial commit");

            let clone = TempDir::new().unwrap();
            run_git(
                clone.path(),
                &["clone", "-q", origin.path().to_str().unwrap(), "."],
            );
            configure(clone.path());
            Self { origin, clone }
        }

        fn path(&self) -> &Path {
            self.clone.path()
        }
    }

    #[test]
    fn fast_forwards_to_fetched_commits() {
        let remote = Remote::new();
        let old = short(remote.path(), "HEAD");
        commit(remote.origin.path(), "new.txt", "n\n", "Upstream work");
        let new = short(remote.origin.path(), "HEAD");

        let rendered = run(remote.path(), pull(false));
        assert_eq!(rendered.exit_status, ExitStatus::Complete);
        assert_eq!(
            rendered.message,
            format!("Updating {old}..{new}\nFast-forward\n\n")
        );
        assert!(remote.path().join("new.txt").is_file());
    }

    #[test]
    fn up_to_date() {
        let remote = Remote::new();
        let rendered = run(remote.path(), pull(false));
        assert_eq!(rendered.message, "Already up to date.\n\n");
    }

    #[test]
    fn rebase_replays_local_commits() {
        let remote = Remote::new();
        commit(remote.origin.path(), "upstream.txt", "u\n", "Upstream work");
        commit(remote.path(), "local.txt", "l\n", "Local work");

        let rendered = run(remote.path(), pull(true));
        assert_eq!(rendered.exit_status, ExitStatus::Complete);
        assert_eq!(
            rendered.message,
            format!(
                "Applied [{}] Local work\nSuccessfully rebased and updated refs/heads/main.\n\n",
                short(remote.path(), "HEAD")
            )
        );
        assert_eq!(
            git_output(remote.path(), &["log", "--format=%s"]),
            "Local work\nUpstream work\nInitial commit"
        );
    }

    #[test]
    fn config_selects_rebase() {
        let remote = Remote::new();
        commit(remote.origin.path(), "upstream.txt", "u\n", "Upstream work");
        commit(remote.path(), "local.txt", "l\n", "Local work");
        let config = remote.path().join(".git/logical/config.toml");
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(&config, "[pull]\nrebase = true\n").unwrap();

        let rendered = run(remote.path(), pull(false));
        assert!(rendered
            .message
            .ends_with("Successfully rebased and updated refs/heads/main.\n\n"));
    }

    #[test]
    fn rebase_conflict_resumes_through_pull() {
        let remote = Remote::new();
        commit(remote.origin.path(), "README.md", "upstream\n", "Upstream edit");
        commit(remote.path(), "README.md", "local\n", "Local edit");

        let stopped = run(remote.path(), pull(true));
        assert_eq!(stopped.exit_status, ExitStatus::Aborted);
        assert!(stopped.message.contains("hint: Then run \"lgit pull --continue\" to resume.\n"));

        let aborted = run(
            remote.path(),
            Command::Pull {
                rebase: false,
                no_rebase: false,
                resume: ReplayResume {
                    abort: true,
                    ..Default::default()
                },
            },
        );
        assert_eq!(aborted.exit_status, ExitStatus::Aborted);
        assert!(aborted.message.starts_with("Aborted rebase. Restored main to ["));
        assert_eq!(
            std::fs::read_to_string(remote.path().join("README.md")).unwrap(),
            "local\n"
        );
    }

    #[test]
    fn no_tracking_branch() {
        let dir = diverged(false);
        let rendered = run(dir.path(), pull(false));
        assert_eq!(rendered.exit_status, ExitStatus::Error);
        assert_eq!(
            rendered.message,
            "error: there is no tracking information for the current branch main\n\
             hint: Set one with \"git branch --set-upstream-to=<remote>/<branch> main\".\n\n"
        );
    }
}
