//! Init command implementation.

use crate::cli::InitArgs;
use crate::error::convert_install_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use std::path::Path;
use sty_core::InstallConfig;
use sty_core::Installer;
use sty_core::NoopProgress;
use sty_core::ProgressCallback;
use sty_core::load_archive;
use tracing::debug;

pub fn execute(args: &InitArgs, formatter: &dyn OutputFormatter, show_progress: bool) -> Result<()> {
    let bundle =
        load_archive(&args.archive).map_err(|e| convert_install_error(e, &args.archive))?;

    let config = InstallConfig::default().with_overwrite(args.force);
    let target = args.path.as_deref().unwrap_or_else(|| Path::new(""));
    debug!(
        archive = %args.archive.display(),
        bytes = bundle.len(),
        force = args.force,
        "loaded bundle"
    );

    let mut progress: Box<dyn ProgressCallback> = if show_progress && CliProgress::should_show() {
        Box::new(CliProgress::new("Installing"))
    } else {
        Box::new(NoopProgress)
    };

    let result = Installer::new(config).run(bundle.as_slice(), target, progress.as_mut());
    drop(progress);

    if let Some(err) = result.error {
        let written = result.report.written.len();
        if written > 0 {
            formatter.format_warning(&format!(
                "{written} entries were written to {} before the failure",
                result.report.destination.display()
            ));
        }
        return Err(convert_install_error(err, &args.archive));
    }

    formatter.format_install_result(&result.report)
}
