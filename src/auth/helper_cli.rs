//! auth::helper_cli
//!
//! Token source backed by the platform's official CLI (`gh`, `glab`).
//!
//! # Protocol
//!
//! 1. The binary must be on `PATH`; otherwise the source is skipped.
//! 2. `<tool> --version` must print `<tool> version X.Y.Z`. A successful
//!    run whose output cannot be parsed is an unexpected error: the tool is
//!    present but not behaving like the tool we know.
//! 3. Versions below the tool's minimum are skipped without running
//!    anything else.
//! 4. `<tool> auth status --hostname <domain> --show-token` prints a
//!    `Token: <value>` line when logged in.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{AccessToken, TokenSource};
use crate::forge::{Domain, ForgeError, HelperCli};

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Locates and runs external programs.
///
/// Abstracted so the helper-CLI protocol can be tested without the real
/// tools installed.
pub trait CommandRunner {
    /// Find `program` on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run `program` with `args` to completion.
    fn run(&self, program: &Path, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs real processes found on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn run(&self, program: &Path, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Parse `<tool> version X.Y.Z` out of `--version` output.
pub fn parse_cli_version(tool: &str, output: &str) -> Option<(u32, u32, u32)> {
    static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
    let re = VERSION
        .get_or_init(|| Regex::new(r"(\S+) version (\d+)\.(\d+)\.(\d+)").ok())
        .as_ref()?;
    let caps = re.captures_iter(output).find(|caps| &caps[1] == tool)?;
    Some((
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
    ))
}

/// Extract the value of a `Token: <value>` line from auth-status output.
///
/// ```
/// use forgelink::auth::extract_status_token;
///
/// let status = "git.example.com\n  ✓ Logged in to git.example.com as bob\n  ✓ Token: glpat-abc123\n";
/// assert_eq!(extract_status_token(status), Some("glpat-abc123".to_string()));
/// assert_eq!(extract_status_token("  x No token provided"), None);
/// ```
pub fn extract_status_token(output: &str) -> Option<String> {
    static STATUS_TOKEN: OnceLock<Option<Regex>> = OnceLock::new();
    let re = STATUS_TOKEN
        .get_or_init(|| Regex::new(r"(?m)Token:[ \t]*(\S+)[ \t]*\r?$").ok())
        .as_ref()?;
    re.captures(output).map(|caps| caps[1].to_string())
}

/// Asks the platform CLI for its current token.
pub struct CliTokenSource {
    cli: HelperCli,
    runner: Box<dyn CommandRunner>,
}

impl CliTokenSource {
    /// Source using real processes.
    pub fn new(cli: HelperCli) -> Self {
        Self::with_runner(cli, Box::new(SystemCommandRunner))
    }

    /// Source using a custom runner.
    pub fn with_runner(cli: HelperCli, runner: Box<dyn CommandRunner>) -> Self {
        Self { cli, runner }
    }

    fn run(&self, program: &Path, args: &[&str]) -> Option<CommandOutput> {
        match self.runner.run(program, args) {
            Ok(output) => Some(output),
            Err(e) => {
                debug!("Could not run `{} {}`: {}", self.cli.name, args.join(" "), e);
                None
            }
        }
    }
}

impl std::fmt::Debug for CliTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliTokenSource")
            .field("cli", &self.cli)
            .finish_non_exhaustive()
    }
}

impl TokenSource for CliTokenSource {
    fn description(&self) -> String {
        format!(
            "current auth token from the `{}` {}",
            self.cli.name, self.cli.description
        )
    }

    fn token_for(&self, domain: &Domain) -> Result<Option<AccessToken>, ForgeError> {
        let name = self.cli.name;
        debug!("Trying to find token via `{}` {}", name, self.cli.description);

        let Some(program) = self.runner.locate(name) else {
            debug!("`{}` not found on PATH", name);
            return Ok(None);
        };

        let Some(version_output) = self.run(&program, &["--version"]) else {
            return Ok(None);
        };
        if !version_output.success {
            return Ok(None);
        }

        let version = parse_cli_version(name, &version_output.stdout).ok_or_else(|| {
            ForgeError::Unexpected(format!(
                "Could not parse output of `{} --version`: `{}`",
                name,
                version_output.stdout.trim_end()
            ))
        })?;

        if version < self.cli.min_version {
            let (major, minor, patch) = self.cli.min_version;
            debug!(
                "`{}` {}.{}.{} is older than {}.{}.{}, skipping",
                name, version.0, version.1, version.2, major, minor, patch
            );
            return Ok(None);
        }

        let Some(status) = self.run(
            &program,
            &["auth", "status", "--hostname", domain.value(), "--show-token"],
        ) else {
            return Ok(None);
        };
        if !status.success {
            return Ok(None);
        }

        // Older releases print status to stderr, newer ones to stdout
        let token = extract_status_token(&status.stderr)
            .or_else(|| extract_status_token(&status.stdout));

        Ok(token.map(|value| {
            AccessToken::new(
                value,
                format!(
                    "auth token for {} from `{}` {}",
                    domain, name, self.cli.description
                ),
            )
        }))
    }
}
