//! Starting, finding and stopping the gateway process through OS utilities.

use std::fmt::Display;
use std::num::ParseIntError;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;

use anyhow::Context;

pub mod command;
pub use command::CommandLine;

mod listing;
pub use listing::{ListingError, ProcessListing, TaskRecord, NO_TASKS_INFO};

/// Decides which utilities are used to list, start and kill processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `tasklist`, `taskkill` and `cmd`
    Windows,
    /// `pgrep`, `kill` and `bash`
    Unix,
}

impl Platform {
    pub fn current() -> Platform {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GatewayPid(pub u32);

impl Display for GatewayPid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GatewayPid {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GatewayPid)
    }
}

/// What a finished command printed and whether it exited with `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// Whichever of stderr and stdout has something to say, stderr first.
    pub fn message(&self) -> &str {
        match self.stderr.trim() {
            "" => self.stdout.trim(),
            stderr => stderr,
        }
    }
}

/// Run `line` to completion and capture its output.
///
/// A non-zero exit status is not an error here, `pgrep` exits with `1` when
/// nothing matched. Callers decide with [`Captured::success`].
pub async fn run_capture(line: &CommandLine) -> anyhow::Result<Captured> {
    let mut cmd = line.to_command();
    cmd.stdin(Stdio::null());

    let output = cmd
        .output()
        .await
        .with_context(|| format!("run `{}`", line))?;

    if !output.status.success() {
        log::debug!("`{}` exited with {}", line, output.status);
    }

    Ok(Captured {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Start `line` inside `cwd`, detached from this process.
pub fn spawn_detached(line: &CommandLine, cwd: &Path) -> anyhow::Result<GatewayPid> {
    let mut cmd = line.to_command();
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut cmd);

    let child = cmd
        .spawn()
        .with_context(|| format!("spawn `{}` in {}", line, cwd.display()))?;
    let pid = child
        .id()
        .context("process exited before its pid could be read")?;

    log::debug!("spawned `{}` (pid {})", line, pid);

    // dropping the handle neither waits for nor kills the process
    Ok(GatewayPid(pid))
}

#[cfg(unix)]
fn detach(cmd: &mut tokio::process::Command) {
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut tokio::process::Command) {
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    cmd.creation_flags(CREATE_NEW_CONSOLE);
}

/// Run `line` with its output discarded, fail on a non-zero exit status.
pub async fn run_status(line: &CommandLine) -> anyhow::Result<()> {
    let mut cmd = line.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = cmd
        .status()
        .await
        .with_context(|| format!("run `{}`", line))?;

    if !status.success() {
        anyhow::bail!("`{}` exited with {}", line, status);
    }
    Ok(())
}

/// Everything the authenticator needs from the operating system.
#[allow(async_fn_in_trait)]
pub trait Processes {
    /// Run to completion and capture the output, see [`run_capture`].
    async fn capture(&self, line: &CommandLine) -> anyhow::Result<Captured>;
    /// Start without waiting, see [`spawn_detached`].
    fn spawn(&self, line: &CommandLine, cwd: &Path) -> anyhow::Result<GatewayPid>;
    /// Run to completion and check the exit status, see [`run_status`].
    async fn status(&self, line: &CommandLine) -> anyhow::Result<()>;
}

/// The real thing.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

impl Processes for System {
    async fn capture(&self, line: &CommandLine) -> anyhow::Result<Captured> {
        run_capture(line).await
    }
    fn spawn(&self, line: &CommandLine, cwd: &Path) -> anyhow::Result<GatewayPid> {
        spawn_detached(line, cwd)
    }
    async fn status(&self, line: &CommandLine) -> anyhow::Result<()> {
        run_status(line).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_from_str() {
        assert_eq!(GatewayPid::from_str("4711").unwrap(), GatewayPid(4711));
        assert_eq!(GatewayPid::from_str(" 4711\r").unwrap(), GatewayPid(4711));
        assert!(GatewayPid::from_str("").is_err());
        assert!(GatewayPid::from_str("-1").is_err());
    }

    #[test]
    fn current_platform() {
        let expected = if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        };
        assert_eq!(Platform::current(), expected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_capture_returns_stdout() {
        let out = run_capture(&CommandLine::new("echo", ["4711"])).await.unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "4711\n");
        assert_eq!(out.message(), "4711");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_capture_tolerates_failure_status() {
        let line = CommandLine::new("sh", ["-c", "echo nope; echo denied >&2; exit 1"]);
        let out = run_capture(&line).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.stdout, "nope\n");
        assert_eq!(out.stderr, "denied\n");
        assert_eq!(out.message(), "denied");
    }

    #[tokio::test]
    async fn run_capture_missing_program() {
        let line = CommandLine::new("this-program-does-not-exist-4711", Vec::<String>::new());
        assert!(run_capture(&line).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_in_missing_dir() {
        let dir = Path::new("/this/resource/dir/does/not/exist");
        assert!(spawn_detached(&command::launch(Platform::Unix), dir).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_returns_pid() {
        let pid = spawn_detached(&CommandLine::new("true", Vec::<String>::new()), Path::new("/"))
            .unwrap();
        assert!(pid.0 > 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_status_checks_exit_code() {
        assert!(run_status(&CommandLine::new("true", Vec::<String>::new()))
            .await
            .is_ok());
        assert!(run_status(&CommandLine::new("false", Vec::<String>::new()))
            .await
            .is_err());
    }
}
