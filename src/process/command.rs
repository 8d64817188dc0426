use std::fmt::Display;

use super::{GatewayPid, Platform};

/// Title of the console window the gateway runs in on Windows.
pub const WINDOW_TITLE: &str = "Interactive Brokers Python API";

/// Launcher script and config of the gateway, relative to the resource directory.
pub const LAUNCH_SCRIPT: &str = "bin/run.sh";
pub const LAUNCH_CONFIG: &str = "root/conf.yaml";

/// `pgrep -f` pattern matching the command line of a launched gateway.
///
/// `run.sh` doesn't exec java, so the `bash bin/run.sh root/conf.yaml`
/// process stays alive as long as the gateway does.
pub const PROCESS_PATTERN: &str = r"bin/run\.sh root/conf\.yaml";

/// A program and its arguments, not bound to a working directory yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: &str, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Lists processes that look like a running gateway.
pub fn listing(platform: Platform) -> CommandLine {
    match platform {
        Platform::Windows => CommandLine::new(
            "tasklist",
            [
                "/fi".to_string(),
                format!("WindowTitle eq {}*", WINDOW_TITLE),
                "/FO".to_string(),
                "CSV".to_string(),
            ],
        ),
        Platform::Unix => CommandLine::new("pgrep", ["-f", PROCESS_PATTERN]),
    }
}

/// Starts the gateway, relative to the resource directory.
pub fn launch(platform: Platform) -> CommandLine {
    match platform {
        Platform::Windows => CommandLine::new(
            "cmd",
            ["/k", "start", WINDOW_TITLE, r"bin\run.bat", r"root\conf.yaml"],
        ),
        // run through bash directly, the script may lack its executable bit
        Platform::Unix => CommandLine::new("bash", [LAUNCH_SCRIPT, LAUNCH_CONFIG]),
    }
}

/// Forcefully terminates `pid`.
pub fn kill(platform: Platform, pid: GatewayPid) -> CommandLine {
    let pid = pid.to_string();
    match platform {
        Platform::Windows => CommandLine::new("taskkill", ["/F", "/PID", pid.as_str()]),
        Platform::Unix => CommandLine::new("kill", ["-9", pid.as_str()]),
    }
}

/// Opens `url` with whatever the desktop considers the default browser.
pub fn browser(platform: Platform, url: &str) -> CommandLine {
    match platform {
        // the empty string is the window title `start` expects first
        Platform::Windows => CommandLine::new("cmd", ["/c", "start", "", url]),
        Platform::Unix if cfg!(target_os = "macos") => CommandLine::new("open", [url]),
        Platform::Unix => CommandLine::new("xdg-open", [url]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_commands() {
        assert_eq!(
            listing(Platform::Windows),
            CommandLine::new(
                "tasklist",
                [
                    "/fi",
                    "WindowTitle eq Interactive Brokers Python API*",
                    "/FO",
                    "CSV"
                ]
            )
        );
        assert_eq!(
            listing(Platform::Unix),
            CommandLine::new("pgrep", ["-f", r"bin/run\.sh root/conf\.yaml"])
        );
    }

    #[test]
    fn launch_commands() {
        assert_eq!(
            launch(Platform::Unix),
            CommandLine::new("bash", ["bin/run.sh", "root/conf.yaml"])
        );

        let windows = launch(Platform::Windows);
        assert_eq!(windows.program, "cmd");
        assert_eq!(
            windows.args,
            [
                "/k",
                "start",
                "Interactive Brokers Python API",
                r"bin\run.bat",
                r"root\conf.yaml"
            ]
        );
    }

    #[test]
    fn kill_commands() {
        assert_eq!(
            kill(Platform::Windows, GatewayPid(4242)),
            CommandLine::new("taskkill", ["/F", "/PID", "4242"])
        );
        assert_eq!(
            kill(Platform::Unix, GatewayPid(4242)),
            CommandLine::new("kill", ["-9", "4242"])
        );
    }

    #[test]
    fn browser_commands() {
        const URL: &str = "https://localhost:5000";

        assert_eq!(
            browser(Platform::Windows, URL),
            CommandLine::new("cmd", ["/c", "start", "", URL])
        );
        let unix = browser(Platform::Unix, URL);
        assert!(unix.program == "open" || unix.program == "xdg-open");
        assert_eq!(unix.args, [URL]);
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        assert_eq!(
            listing(Platform::Windows).to_string(),
            r#"tasklist /fi "WindowTitle eq Interactive Brokers Python API*" /FO CSV"#
        );
        assert_eq!(
            kill(Platform::Unix, GatewayPid(7)).to_string(),
            "kill -9 7"
        );
    }
}
