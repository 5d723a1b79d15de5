//! Report writer.
//!
//! Persists serialized reports under an output root:
//! - destination directories are created as needed
//! - one JSON file per scenario, named after the scenario id; ids that
//!   sanitize to the same name get a numeric suffix (`login-2.json`)
//! - a `.scribe.json` manifest describing the batch
//!
//! Failed writes are returned to the caller as-is.

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};
use crate::report::RenderedReport;

/// Name of the per-batch manifest file
pub const MANIFEST_FILE: &str = ".scribe.json";

/// Writes reports below a root directory
#[derive(Debug, Clone)]
pub struct Scribe {
    /// Root directory for report files
    pub root: PathBuf,
    /// Whether to pretty-print JSON
    pub pretty: bool,
}

impl Scribe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pretty: false,
        }
    }

    /// Set whether to pretty-print JSON
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Write `report` to `relative_path` under the root, returning the full path
    pub async fn write(&self, report: &Value, relative_path: impl AsRef<Path>) -> ReportResult<PathBuf> {
        let full_path = self.root.join(relative_path);
        let dir = full_path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(dir)
            .await
            .map_err(|e| ReportError::io(dir, e))?;

        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        fs::write(&full_path, json)
            .await
            .map_err(|e| ReportError::io(&full_path, e))?;

        Ok(full_path)
    }

    /// Write every report to its own file and record the batch in the manifest
    pub async fn write_all(&self, reports: &[RenderedReport]) -> ReportResult<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(reports.len());
        let mut used = HashSet::with_capacity(reports.len());
        for report in reports {
            let file_name = unique_file_name(&report.scenario_id, &mut used);
            let path = self.write(&report.value, &file_name).await?;
            written.push(path);
        }

        let manifest = serde_json::json!({
            "created": chrono::Utc::now().to_rfc3339(),
            "reports": written
                .iter()
                .filter_map(|p| p.file_name())
                .map(|name| name.to_string_lossy())
                .collect::<Vec<_>>(),
        });
        self.write(&manifest, MANIFEST_FILE).await?;

        info!(root = %self.root.display(), reports = written.len(), "wrote reports");
        Ok(written)
    }
}

/// File name for the report of scenario `id`
pub fn report_file_name(id: &str) -> String {
    format!("{}.json", sanitize_name(id))
}

/// Like [`report_file_name`], but never returns a name already in `used`
fn unique_file_name(id: &str, used: &mut HashSet<String>) -> String {
    let stem = sanitize_name(id);
    let mut file_name = format!("{stem}.json");
    let mut n = 2;
    while !used.insert(file_name.clone()) {
        file_name = format!("{stem}-{n}.json");
        n += 1;
    }
    if n > 2 {
        debug!(scenario = id, file = %file_name, "report file name taken, using suffix");
    }
    file_name
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();

    match sanitized.trim_start_matches('.') {
        "" => "scenario".to_string(),
        trimmed => trimmed.to_string(),
    }
}
