//! Branch, commit, push and review-request sequencing over `git` and `gh`.
//!
//! Every step is one external invocation. A non-zero exit becomes
//! [`RegistryError::Tool`] carrying the tool's own error text and aborts the
//! remaining steps; completed steps are never rolled back. Nothing retries.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::GitConfig;
use crate::error::{RegistryError, Result};
use crate::metadata::MetadataRecord;

pub const GIT: &str = "git";
pub const GH: &str = "gh";

// ---------------------------------------------------------------------------
// CommandRunner
// ---------------------------------------------------------------------------

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Seam over subprocess execution.
pub trait CommandRunner {
    /// Run `program` with `args` in `cwd` and capture its output. Only a
    /// failure to start the program is an `Err`; a non-zero exit is reported
    /// through [`CommandOutput::success`].
    fn run(&mut self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput>;
}

/// Runs real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput> {
        tracing::debug!(program, ?args, "running");
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|source| RegistryError::ToolSpawn {
                tool: program.to_string(),
                source,
            })?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub branch: String,
    /// `false` when the branch already existed and was reused.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Address of the created review request.
    Opened(String),
    /// Push succeeded but the review request did not; needs manual follow-up.
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub branch: String,
    pub review: ReviewOutcome,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

pub struct Publisher<R: CommandRunner> {
    runner: R,
    root: PathBuf,
    git: GitConfig,
}

impl<R: CommandRunner> Publisher<R> {
    pub fn new(runner: R, root: impl Into<PathBuf>, git: GitConfig) -> Self {
        Self {
            runner,
            root: root.into(),
            git,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn remote(&self) -> &str {
        &self.git.remote
    }

    pub fn branch_name(&self, name: &str) -> String {
        format!("{}{}", self.git.branch_prefix, name)
    }

    /// Switch to the registration branch (creating it when absent), stage
    /// everything and commit.
    pub fn commit_registration(&mut self, record: &MetadataRecord) -> Result<CommitOutcome> {
        let branch = self.branch_name(&record.name);

        let created = if self.branch_exists(&branch)? {
            tracing::info!(branch = %branch, "branch already exists, reusing it");
            let current = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
            if current.trim() != branch {
                self.git(&["checkout", &branch])?;
            }
            false
        } else {
            self.git(&["checkout", "-b", &branch])?;
            true
        };

        self.git(&["add", "."])?;
        self.git(&["commit", "-m", &commit_message(record)])?;
        tracing::info!(branch = %branch, created, "committed registration");

        Ok(CommitOutcome { branch, created })
    }

    pub fn push(&mut self, branch: &str) -> Result<()> {
        let remote = self.git.remote.clone();
        self.git(&["push", "-u", &remote, branch])?;
        Ok(())
    }

    /// Open a review request and return its address (the last non-empty
    /// line `gh` prints).
    pub fn open_review_request(&mut self, record: &MetadataRecord, branch: &str) -> Result<String> {
        let title = review_title(record);
        let body = review_body(record);
        let base = self.git.base_branch.clone();
        let stdout = self.exec(
            GH,
            &[
                "pr", "create", "--title", &title, "--body", &body, "--base", &base, "--head",
                branch,
            ],
        )?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or_default()
            .to_string())
    }

    /// Push `branch`, then optionally open a review request. A failed push is
    /// an error; a failed review request is reported in the outcome.
    pub fn submit(
        &mut self,
        record: &MetadataRecord,
        branch: &str,
        open_review: bool,
    ) -> Result<SubmitOutcome> {
        self.push(branch)?;
        let review = if !open_review {
            ReviewOutcome::Skipped
        } else {
            match self.open_review_request(record, branch) {
                Ok(url) => ReviewOutcome::Opened(url),
                Err(e) => {
                    tracing::warn!(error = %e, branch, "could not open review request");
                    ReviewOutcome::Failed(e.to_string())
                }
            }
        };
        Ok(SubmitOutcome {
            branch: branch.to_string(),
            review,
        })
    }

    fn branch_exists(&mut self, branch: &str) -> Result<bool> {
        let args = to_args(&["rev-parse", "--verify", "--quiet", branch]);
        let out = self.runner.run(GIT, &args, &self.root)?;
        Ok(out.success && !out.stdout.trim().is_empty())
    }

    fn git(&mut self, args: &[&str]) -> Result<String> {
        self.exec(GIT, args)
    }

    fn exec(&mut self, tool: &str, args: &[&str]) -> Result<String> {
        let args = to_args(args);
        let out = self.runner.run(tool, &args, &self.root)?;
        if !out.success {
            // Some failures (e.g. "nothing to commit") only go to stdout.
            let stderr = if out.stderr.trim().is_empty() {
                out.stdout
            } else {
                out.stderr
            };
            return Err(RegistryError::Tool {
                tool: tool.to_string(),
                args,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(out.stdout)
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub fn commit_message(record: &MetadataRecord) -> String {
    format!(
        "Register MCP server: {}\n\n- Repository: {}\n- Company: {}\n- Owner: {}\n- Lifecycle: {}\n- Status: {}",
        record.name,
        record.repository_url,
        record.company,
        record.owner,
        record.lifecycle,
        record.status
    )
}

pub fn review_title(record: &MetadataRecord) -> String {
    format!("Register MCP server: {}", record.name)
}

pub fn review_body(record: &MetadataRecord) -> String {
    let rows = [
        ("Name", &record.name),
        ("Repository", &record.repository_url),
        ("Description", &record.description),
        ("Company", &record.company),
        ("Owner", &record.owner),
        ("Version", &record.version),
        ("Status", &record.status),
        ("Lifecycle", &record.lifecycle),
        ("Auth Method", &record.auth_method),
    ];
    let mut body = String::from(
        "## MCP Server Registration\n\nThis PR registers the following MCP server in the registry.\n\n| Field | Value |\n|-------|-------|\n",
    );
    for (label, value) in rows {
        body.push_str(&format!("| **{label}** | {} |\n", value.replace('|', "\\|")));
    }
    body.push_str("\n> Generated by mcpreg");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every call; answers from a script keyed on leading args.
    #[derive(Default)]
    struct FakeRunner {
        calls: Vec<(String, Vec<String>)>,
        script: Vec<(String, Vec<&'static str>, CommandOutput)>,
    }

    impl FakeRunner {
        fn on(mut self, program: &str, prefix: &[&'static str], out: CommandOutput) -> Self {
            self.script.push((program.to_string(), prefix.to_vec(), out));
            self
        }

        fn commands(&self) -> Vec<String> {
            self.calls
                .iter()
                .map(|(p, a)| format!("{p} {}", a.join(" ")))
                .collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&mut self, program: &str, args: &[String], _cwd: &Path) -> Result<CommandOutput> {
            self.calls.push((program.to_string(), args.to_vec()));
            let scripted = self.script.iter().find(|(p, prefix, _)| {
                p == program
                    && prefix.len() <= args.len()
                    && prefix.iter().zip(args).all(|(a, b)| *a == b.as_str())
            });
            Ok(match scripted {
                Some((_, _, out)) => out.clone(),
                None => ok(""),
            })
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn fail(stderr: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn record() -> MetadataRecord {
        MetadataRecord {
            name: "weather".into(),
            description: "Weather data".into(),
            company: "acme".into(),
            owner: "acme".into(),
            repository_url: "https://github.com/acme/weather".into(),
            ..Default::default()
        }
    }

    fn publisher(runner: FakeRunner) -> Publisher<FakeRunner> {
        Publisher::new(runner, "/repo", GitConfig::default())
    }

    #[test]
    fn new_branch_is_created_then_committed() {
        let runner = FakeRunner::default().on("git", &["rev-parse", "--verify"], fail(""));
        let mut p = publisher(runner);
        let outcome = p.commit_registration(&record()).unwrap();
        assert_eq!(
            outcome,
            CommitOutcome {
                branch: "mcp-registration/weather".into(),
                created: true
            }
        );
        let cmds = p.runner().commands();
        assert_eq!(cmds[0], "git rev-parse --verify --quiet mcp-registration/weather");
        assert_eq!(cmds[1], "git checkout -b mcp-registration/weather");
        assert_eq!(cmds[2], "git add .");
        assert!(cmds[3].starts_with("git commit -m Register MCP server: weather\n\n- Repository: https://github.com/acme/weather"));
        assert_eq!(cmds.len(), 4);
    }

    #[test]
    fn existing_branch_skips_creation_but_still_commits() {
        let runner = FakeRunner::default()
            .on("git", &["rev-parse", "--verify"], ok("abc123\n"))
            .on("git", &["rev-parse", "--abbrev-ref"], ok("main\n"));
        let mut p = publisher(runner);
        let outcome = p.commit_registration(&record()).unwrap();
        assert!(!outcome.created);
        let cmds = p.runner().commands();
        assert!(!cmds.iter().any(|c| c.contains("checkout -b")));
        assert!(cmds.contains(&"git checkout mcp-registration/weather".to_string()));
        assert!(cmds.contains(&"git add .".to_string()));
        assert!(cmds.last().unwrap().starts_with("git commit -m"));
    }

    #[test]
    fn already_on_existing_branch_does_not_checkout() {
        let runner = FakeRunner::default()
            .on("git", &["rev-parse", "--verify"], ok("abc123\n"))
            .on("git", &["rev-parse", "--abbrev-ref"], ok("mcp-registration/weather\n"));
        let mut p = publisher(runner);
        p.commit_registration(&record()).unwrap();
        assert!(!p.runner().commands().iter().any(|c| c.starts_with("git checkout")));
    }

    #[test]
    fn failing_step_carries_stderr_and_stops() {
        let runner = FakeRunner::default()
            .on("git", &["rev-parse", "--verify"], fail(""))
            .on("git", &["add"], fail("fatal: pathspec error\n"));
        let mut p = publisher(runner);
        let err = p.commit_registration(&record()).unwrap_err();
        match err {
            RegistryError::Tool { tool, args, stderr } => {
                assert_eq!(tool, "git");
                assert_eq!(args, vec!["add", "."]);
                assert_eq!(stderr, "fatal: pathspec error");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!p.runner().commands().iter().any(|c| c.starts_with("git commit")));
    }

    #[test]
    fn nothing_to_commit_reports_stdout() {
        let runner = FakeRunner::default()
            .on("git", &["rev-parse", "--verify"], fail(""))
            .on(
                "git",
                &["commit"],
                CommandOutput {
                    success: false,
                    stdout: "nothing to commit, working tree clean\n".into(),
                    stderr: String::new(),
                },
            );
        let err = publisher(runner).commit_registration(&record()).unwrap_err();
        assert!(err.to_string().contains("nothing to commit"));
    }

    #[test]
    fn submit_pushes_and_opens_review() {
        let runner = FakeRunner::default().on(
            "gh",
            &["pr", "create"],
            ok("Creating pull request...\nhttps://github.com/acme/registry/pull/7\n\n"),
        );
        let mut p = publisher(runner);
        let outcome = p.submit(&record(), "mcp-registration/weather", true).unwrap();
        assert_eq!(
            outcome.review,
            ReviewOutcome::Opened("https://github.com/acme/registry/pull/7".into())
        );
        let calls = &p.runner().calls;
        assert_eq!(
            calls[0].1,
            vec!["push", "-u", "origin", "mcp-registration/weather"]
        );
        let gh_args = &calls[1].1;
        assert_eq!(calls[1].0, "gh");
        assert!(gh_args.windows(2).any(|w| w == ["--title", "Register MCP server: weather"]));
        assert!(gh_args.windows(2).any(|w| w == ["--base", "main"]));
        let body_pos = gh_args.iter().position(|a| a == "--body").unwrap();
        assert!(gh_args[body_pos + 1].contains("| **Auth Method** | api-key |"));
    }

    #[test]
    fn review_failure_after_push_is_not_fatal() {
        let runner = FakeRunner::default().on("gh", &["pr"], fail("gh: not logged in"));
        let mut p = publisher(runner);
        let outcome = p.submit(&record(), "mcp-registration/weather", true).unwrap();
        match outcome.review {
            ReviewOutcome::Failed(msg) => assert!(msg.contains("not logged in")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn push_failure_is_fatal() {
        let runner = FakeRunner::default().on("git", &["push"], fail("rejected"));
        let mut p = publisher(runner);
        assert!(matches!(
            p.submit(&record(), "b", true),
            Err(RegistryError::Tool { .. })
        ));
        assert_eq!(p.runner().calls.len(), 1);
    }

    #[test]
    fn review_can_be_skipped() {
        let mut p = publisher(FakeRunner::default());
        let outcome = p.submit(&record(), "b", false).unwrap();
        assert_eq!(outcome.review, ReviewOutcome::Skipped);
        assert_eq!(p.runner().calls.len(), 1);
    }

    #[test]
    fn prefix_and_remote_come_from_config() {
        let git = GitConfig {
            branch_prefix: "registry/".into(),
            base_branch: "develop".into(),
            remote: "upstream".into(),
        };
        let mut p = Publisher::new(FakeRunner::default(), "/repo", git);
        assert_eq!(p.branch_name("weather"), "registry/weather");
        p.push("registry/weather").unwrap();
        assert_eq!(
            p.runner().commands(),
            vec!["git push -u upstream registry/weather"]
        );
    }

    #[test]
    fn commit_message_template() {
        assert_eq!(
            commit_message(&record()),
            "Register MCP server: weather\n\n- Repository: https://github.com/acme/weather\n- Company: acme\n- Owner: acme\n- Lifecycle: development\n- Status: active"
        );
    }
}
