use super::{write_file, Reporter};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::runner::RunReport;
use std::path::PathBuf;
use tracing::info;

/// Writes the full [`RunReport`] to `<output_dir>/report.json`.
pub struct JsonReporter;

impl JsonReporter {
    pub fn path(config: &RunConfig) -> PathBuf {
        config.output_dir.join("report.json")
    }
}

impl Reporter for JsonReporter {
    fn on_end(&mut self, config: &RunConfig, report: &RunReport) -> Result<(), RunError> {
        let path = Self::path(config);
        let bytes = serde_json::to_vec_pretty(report).map_err(|err| RunError::Render {
            what: "json report",
            message: err.to_string(),
        })?;
        write_file(&path, &bytes)?;
        info!(path = %path.display(), "json report written");
        Ok(())
    }
}
