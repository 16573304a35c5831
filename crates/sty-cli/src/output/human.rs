//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::progress::humanize_bytes;
use anyhow::Result;
use console::Term;
use console::style;
use sty_core::InstallReport;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    out: Term,
    err: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    fn summary_lines(&self, report: &InstallReport) -> Vec<String> {
        let mut lines = vec![
            format!("  Files: {}", report.files_written),
            format!("  Directories: {}", report.directories_created),
            format!("  Symlinks: {}", report.symlinks_created),
            format!("  Total size: {}", humanize_bytes(report.bytes_written)),
        ];

        if report.has_skipped() {
            lines.push(format!("  Preserved: {}", report.skipped.len()));
            if self.verbose {
                lines.extend(
                    report
                        .skipped
                        .iter()
                        .map(|path| format!("    {}", path.display())),
                );
            }
        }

        if self.verbose {
            lines.push(format!("  Duration: {:?}", report.duration));
        }

        lines
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_install_result(&self, report: &InstallReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let dest = report.destination.display();
        if self.use_colors {
            self.out.write_line(&format!(
                "{} Installed into {dest}",
                style("✓").green().bold()
            ))?;
        } else {
            self.out.write_line(&format!("Installed into {dest}"))?;
        }

        for line in self.summary_lines(report) {
            self.out.write_line(&line)?;
        }

        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            let _ = self
                .err
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.err.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .err
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.err.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_report() -> InstallReport {
        let mut report = InstallReport::new("/home/dba/pigsty");
        report.files_written = 12;
        report.directories_created = 3;
        report.bytes_written = 2048;
        report.skipped = vec![PathBuf::from("pigsty.yml")];
        report
    }

    #[test]
    fn test_summary_counts() {
        let lines = HumanFormatter::new(false, false).summary_lines(&sample_report());
        assert!(lines.contains(&"  Files: 12".to_string()));
        assert!(lines.contains(&"  Total size: 2.0 KB".to_string()));
        assert!(lines.contains(&"  Preserved: 1".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Duration")));
        assert!(!lines.iter().any(|l| l.contains("    pigsty.yml")));
    }

    #[test]
    fn test_summary_verbose_lists_preserved() {
        let lines = HumanFormatter::new(true, false).summary_lines(&sample_report());
        assert!(lines.contains(&"    pigsty.yml".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("  Duration:")));
    }

    #[test]
    fn test_summary_without_preserved() {
        let lines = HumanFormatter::new(false, false).summary_lines(&InstallReport::new("/tmp/x"));
        assert!(!lines.iter().any(|l| l.contains("Preserved")));
    }
}
