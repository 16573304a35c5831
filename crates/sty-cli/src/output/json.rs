//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use sty_core::InstallReport;

pub struct JsonFormatter;

#[derive(Serialize)]
struct InstallOutput {
    destination: String,
    files_written: usize,
    directories_created: usize,
    symlinks_created: usize,
    bytes_written: u64,
    written: Vec<String>,
    preserved: Vec<String>,
    duration_ms: u128,
}

impl InstallOutput {
    fn from_report(report: &InstallReport) -> Self {
        fn strings(paths: &[PathBuf]) -> Vec<String> {
            paths.iter().map(|p| p.display().to_string()).collect()
        }

        Self {
            destination: report.destination.display().to_string(),
            files_written: report.files_written,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            bytes_written: report.bytes_written,
            written: strings(&report.written),
            preserved: strings(&report.skipped),
            duration_ms: report.duration.as_millis(),
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_install_result(&self, report: &InstallReport) -> Result<()> {
        Self::output(&JsonOutput::success("init", InstallOutput::from_report(report)))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_install_output_fields() {
        let mut report = InstallReport::new("/opt/pigsty");
        report.files_written = 2;
        report.written = vec![PathBuf::from("conf/meta.yml"), PathBuf::from("configure")];
        report.skipped = vec![PathBuf::from("pigsty.yml")];

        let json = serde_json::to_value(InstallOutput::from_report(&report)).unwrap();
        assert_eq!(json["destination"], "/opt/pigsty");
        assert_eq!(json["files_written"], 2);
        assert_eq!(json["written"][1], "configure");
        assert_eq!(json["preserved"][0], "pigsty.yml");
    }
}
