use std::process::{Command, ExitStatus};

use crate::config;
use crate::harness::types::{HarnessError, HarnessResult};
use crate::session::ReportSink;

/// Placeholder replaced with the resolved report path
pub const REPORT_PLACEHOLDER: &str = "{report}";

/// Placeholder replaced with `true` / `false`
pub const SELF_CONTAINED_PLACEHOLDER: &str = "{self_contained}";

/// Runs the external test command to completion and returns its status.
///
/// The report settings reach the command two ways: `{report}` and
/// `{self_contained}` placeholders in its arguments, and the
/// `TESTPLAN_GCS_REPORT_PATH` / `TESTPLAN_GCS_SELF_CONTAINED` environment
/// variables.
pub fn run_tests(command: &[String], report: &ReportSink) -> HarnessResult<ExitStatus> {
    let mut cmd = build_command(command, report)?;

    tracing::info!(command = %command.join(" "), "running tests");
    let status = cmd.status().map_err(|e| HarnessError::Spawn {
        program: command[0].clone(),
        source: e,
    })?;
    tracing::info!(%status, "test command finished");

    Ok(status)
}

fn build_command(command: &[String], report: &ReportSink) -> HarnessResult<Command> {
    let (program, args) = command.split_first().ok_or(HarnessError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    for arg in args {
        cmd.arg(expand_placeholders(arg, report)?);
    }

    if let Some(path) = &report.path {
        cmd.env(config::ENV_REPORT_PATH, path);
    }
    cmd.env(config::ENV_SELF_CONTAINED, report.self_contained.to_string());
    Ok(cmd)
}

/// Expand report placeholders in a single argument
pub fn expand_placeholders(arg: &str, report: &ReportSink) -> HarnessResult<String> {
    let mut expanded = arg.replace(SELF_CONTAINED_PLACEHOLDER, &report.self_contained.to_string());

    if expanded.contains(REPORT_PLACEHOLDER) {
        let path = report
            .path
            .as_ref()
            .ok_or_else(|| HarnessError::NoReportPath(arg.to_string()))?;
        expanded = expanded.replace(REPORT_PLACEHOLDER, &path.to_string_lossy());
    }

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sink(path: Option<&str>, self_contained: bool) -> ReportSink {
        ReportSink {
            path: path.map(PathBuf::from),
            self_contained,
        }
    }

    #[test]
    fn test_expand_report_placeholder() {
        let report = sink(Some("20240101T120000_report.html"), true);
        assert_eq!(
            expand_placeholders("--html={report}", &report).unwrap(),
            "--html=20240101T120000_report.html"
        );
        assert_eq!(
            expand_placeholders("--inline={self_contained}", &report).unwrap(),
            "--inline=true"
        );
        assert_eq!(expand_placeholders("-x", &report).unwrap(), "-x");
    }

    #[test]
    fn test_report_placeholder_without_path() {
        let err = expand_placeholders("--html={report}", &sink(None, false)).unwrap_err();
        assert!(matches!(err, HarnessError::NoReportPath(_)));
    }

    #[test]
    fn test_empty_command() {
        assert!(matches!(
            build_command(&[], &ReportSink::default()),
            Err(HarnessError::EmptyCommand)
        ));
    }

    #[test]
    fn test_build_command_sets_env() {
        let command = vec!["pytest".to_string(), "--html={report}".to_string()];
        let cmd = build_command(&command, &sink(Some("r.html"), true)).unwrap();

        let envs: Vec<_> = cmd
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.map(|v| v.to_string_lossy().into_owned()),
                )
            })
            .collect();
        assert!(envs.contains(&(config::ENV_REPORT_PATH.to_string(), Some("r.html".to_string()))));
        assert!(envs.contains(&(config::ENV_SELF_CONTAINED.to_string(), Some("true".to_string()))));

        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["--html=r.html"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tests_reports_exit_status() {
        let ok = run_tests(&["true".to_string()], &ReportSink::default()).unwrap();
        assert!(ok.success());
        let failed = run_tests(&["false".to_string()], &ReportSink::default()).unwrap();
        assert!(!failed.success());
    }

    #[test]
    fn test_run_tests_missing_program() {
        let err = run_tests(
            &["/nonexistent/test-runner".to_string()],
            &ReportSink::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }
}
