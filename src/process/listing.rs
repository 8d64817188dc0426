//! Parsing of `tasklist /FO CSV` and `pgrep` output.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

use super::{GatewayPid, Platform};

/// What `pgrep` prints nothing for, phrased the way `tasklist` does.
pub const NO_TASKS_INFO: &str = "INFO: No tasks are running which match the specified criteria.";

/// One row of `tasklist /FO CSV`, keyed by the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRecord {
    pub columns: BTreeMap<String, String>,
}

impl TaskRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessListing {
    /// `INFO: ...` line instead of any process
    Info(String),
    /// `tasklist` rows
    Tasks(Vec<TaskRecord>),
    /// `pgrep` lines, one pid each
    Pids(Vec<String>),
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("couldn't parse tasklist csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("couldn't parse pid `{pid}`: {source}")]
    Pid {
        pid: String,
        source: std::num::ParseIntError,
    },
}

impl ProcessListing {
    pub fn parse(platform: Platform, output: &str) -> Result<ProcessListing, ListingError> {
        match platform {
            Platform::Windows => Self::parse_tasklist(output),
            Platform::Unix => Ok(Self::parse_pgrep(output)),
        }
    }

    /// Header row followed by quoted records, or a single `INFO:` line.
    pub fn parse_tasklist(output: &str) -> Result<ProcessListing, ListingError> {
        if output.contains("INFO:") {
            return Ok(ProcessListing::Info(output.trim().to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(output.trim().as_bytes());

        let headers = reader.headers()?.clone();
        let tasks = reader
            .records()
            .map(|record| {
                record.map(|record| TaskRecord {
                    columns: headers
                        .iter()
                        .zip(record.iter())
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProcessListing::Tasks(tasks))
    }

    pub fn parse_pgrep(output: &str) -> ProcessListing {
        if output.trim().is_empty() {
            return ProcessListing::Info(NO_TASKS_INFO.to_string());
        }

        ProcessListing::Pids(
            output
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// A gateway is running if `tasklist` reported a row with a `PID` column
    /// or `pgrep` printed anything at all.
    pub fn is_running(&self) -> bool {
        match self {
            ProcessListing::Info(_) => false,
            ProcessListing::Tasks(tasks) => tasks
                .first()
                .map_or(false, |task| task.get("PID").is_some()),
            ProcessListing::Pids(pids) => !pids.is_empty(),
        }
    }

    /// Pid of the first match, if any.
    pub fn first_pid(&self) -> Result<Option<GatewayPid>, ListingError> {
        let pid = match self {
            ProcessListing::Info(_) => None,
            ProcessListing::Tasks(tasks) => tasks.first().and_then(|task| task.get("PID")),
            ProcessListing::Pids(pids) => pids.first().map(String::as_str),
        };

        pid.map(|pid| {
            GatewayPid::from_str(pid).map_err(|source| ListingError::Pid {
                pid: pid.to_string(),
                source,
            })
        })
        .transpose()
    }
}
