//! Runs the terminus CLI as a child process.
//!
//! [`MetricsSource`] is the seam between the pipeline and the outside world: the dashboard and the terminal
//! report only ever talk to it, so tests substitute a fake that returns canned [`RawOutput`].

use crate::{
    MetricsError,
    MetricsRequest,
};
use futures::{
    future::BoxFuture,
    FutureExt as _,
};
use serde::Serialize;
use std::{
    io::ErrorKind,
    path::PathBuf,
    process::Stdio,
    time::Duration,
};
use terminus_metrics_config::{
    OutputFormat,
    TerminusConfig,
};
use tokio::process::Command;

/// Captured result of one terminus invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RawOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Turns a non-zero exit status into [`MetricsError::ToolExecution`], keeping stderr as terminus wrote it.
    pub fn ensure_success(self) -> Result<Self, MetricsError> {
        if self.exit_code == 0 {
            return Ok(self);
        }
        let stderr = match self.stderr.trim() {
            "" => self.stdout.trim().to_string(),
            stderr => stderr.to_string(),
        };
        Err(MetricsError::ToolExecution {
            exit_code: self.exit_code,
            stderr,
        })
    }

    /// Non-fatal messages terminus printed on stderr, without its PHP deprecation noise.
    pub fn warnings(&self) -> Vec<&str> {
        self.stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty() && !line.contains("Deprecated"))
            .collect()
    }
}

/// Anything that can answer a [`MetricsRequest`] with terminus output.
pub trait MetricsSource: Send + Sync {
    /// `terminus env:metrics` for the requested site environment.
    fn fetch_metrics<'a>(&'a self, request: &'a MetricsRequest) -> BoxFuture<'a, Result<RawOutput, MetricsError>>;

    /// `terminus site:list` as CSV.
    fn fetch_sites(&self) -> BoxFuture<'_, Result<RawOutput, MetricsError>>;
}

/// The real terminus executable.
#[derive(Debug, Clone)]
pub struct TerminusCli {
    binary: String,
    timeout: Duration,
    datapoints: String,
    format: OutputFormat,
    fields: Vec<String>,
}

impl TerminusCli {
    pub fn new(config: &TerminusConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout(),
            datapoints: config.datapoints.clone(),
            format: config.format,
            fields: config.fields.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments for `terminus env:metrics`. The target goes after `--` so a site name can never be read as a flag.
    pub fn metrics_args(&self, request: &MetricsRequest) -> Vec<String> {
        let mut args = vec![
            "env:metrics".to_string(),
            "--period".to_string(),
            request.period().to_string(),
            "--datapoints".to_string(),
            self.datapoints.clone(),
            "--format".to_string(),
            self.format.to_string(),
        ];
        if !self.fields.is_empty() {
            args.push("--fields".to_string());
            args.push(self.fields.join(","));
        }
        args.push("--".to_string());
        args.push(request.target());
        args
    }

    pub fn site_list_args(&self) -> Vec<String> {
        vec!["site:list".to_string(), "--format=csv".to_string()]
    }

    fn resolve_binary(&self) -> Result<PathBuf, MetricsError> {
        which::which(&self.binary).map_err(|err| {
            debug!(binary = %self.binary, %err, "terminus binary not found");
            MetricsError::ToolNotFound {
                binary: self.binary.clone(),
            }
        })
    }

    #[instrument(level = "debug", skip(self, args), fields(binary = %self.binary))]
    async fn run(&self, args: Vec<String>) -> Result<RawOutput, MetricsError> {
        let binary = self.resolve_binary()?;
        debug!(?binary, ?args, "spawning terminus");

        let child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => MetricsError::ToolNotFound {
                    binary: self.binary.clone(),
                },
                _ => MetricsError::Io(err),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(timeout = ?self.timeout, "terminus timed out");
                MetricsError::ToolTimeout { timeout: self.timeout }
            })??;

        let raw = RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };
        info!(
            exit_code = raw.exit_code,
            stdout_bytes = raw.stdout.len(),
            stderr_bytes = raw.stderr.len(),
            "terminus finished"
        );
        Ok(raw)
    }
}

impl MetricsSource for TerminusCli {
    fn fetch_metrics<'a>(&'a self, request: &'a MetricsRequest) -> BoxFuture<'a, Result<RawOutput, MetricsError>> {
        self.run(self.metrics_args(request)).boxed()
    }

    fn fetch_sites(&self) -> BoxFuture<'_, Result<RawOutput, MetricsError>> {
        self.run(self.site_list_args()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use terminus_metrics_config::{
        Config,
        Period,
    };

    fn cli(binary: &str) -> TerminusCli {
        let mut config = Config::default().terminus;
        config.binary = binary.to_string();
        TerminusCli::new(&config)
    }

    #[test]
    fn builds_env_metrics_arguments() {
        let request = MetricsRequest::new("acme", "live", Period::Week).unwrap();
        assert_eq!(
            cli("terminus").metrics_args(&request),
            vec![
                "env:metrics",
                "--period",
                "week",
                "--datapoints",
                "auto",
                "--format",
                "csv",
                "--fields",
                "Period,Visits,Pages Served,Cache Hits,Cache Misses,Cache Hit Ratio",
                "--",
                "acme.live",
            ]
        );
    }

    #[test]
    fn non_zero_exit_keeps_stderr_verbatim() {
        let raw = RawOutput {
            stdout: String::new(),
            stderr: "not authenticated\n".to_string(),
            exit_code: 1,
        };
        match raw.ensure_success() {
            Err(MetricsError::ToolExecution { exit_code, stderr }) => {
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "not authenticated");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn warnings_drop_deprecation_lines() {
        let raw = RawOutput {
            stdout: String::new(),
            stderr: "Deprecated: something in vendor/foo.php\n\n [warning] Datapoints capped at 28\n".to_string(),
            exit_code: 0,
        };
        assert_eq!(raw.warnings(), vec![" [warning] Datapoints capped at 28"]);
    }

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let request = MetricsRequest::new("acme", "live", Period::Day).unwrap();
        let err = cli("terminus-binary-that-does-not-exist")
            .fetch_metrics(&request)
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::ToolNotFound { ref binary } if binary == "terminus-binary-that-does-not-exist"));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use pretty_assertions::assert_eq;
        use std::{
            os::unix::fs::PermissionsExt as _,
            path::Path,
        };
        use temp_dir::TempDir;

        fn script(dir: &TempDir, body: &str) -> String {
            let path = dir.child("terminus");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path_str(&path)
        }

        fn path_str(path: &Path) -> String {
            path.to_str().unwrap().to_string()
        }

        #[tokio::test]
        async fn captures_stdout_and_arguments() {
            let dir = TempDir::new().unwrap();
            let binary = script(&dir, r#"echo "2024-01-01,10,8,2"; echo "args: $*" >&2"#);
            let request = MetricsRequest::new("acme", "dev", Period::Month).unwrap();

            let raw = cli(&binary).fetch_metrics(&request).await.unwrap();
            assert_eq!(raw.exit_code, 0);
            assert_eq!(raw.stdout, "2024-01-01,10,8,2\n");
            assert!(raw.stderr.contains("--period month"), "{}", raw.stderr);
            assert!(raw.stderr.trim_end().ends_with("-- acme.dev"), "{}", raw.stderr);
        }

        #[tokio::test]
        async fn reports_exit_status() {
            let dir = TempDir::new().unwrap();
            let binary = script(&dir, r#"echo "not authenticated" >&2; exit 1"#);
            let request = MetricsRequest::new("acme", "dev", Period::Day).unwrap();

            let raw = cli(&binary).fetch_metrics(&request).await.unwrap();
            assert_eq!(raw.exit_code, 1);
            assert!(matches!(
                raw.ensure_success(),
                Err(MetricsError::ToolExecution { exit_code: 1, ref stderr }) if stderr == "not authenticated"
            ));
        }

        #[tokio::test]
        async fn times_out() {
            let dir = TempDir::new().unwrap();
            let binary = script(&dir, "sleep 5");
            let request = MetricsRequest::new("acme", "dev", Period::Day).unwrap();

            let err = cli(&binary)
                .with_timeout(Duration::from_millis(200))
                .fetch_metrics(&request)
                .await
                .unwrap_err();
            assert!(matches!(err, MetricsError::ToolTimeout { timeout } if timeout == Duration::from_millis(200)));
        }
    }
}
