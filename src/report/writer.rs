// src/report/writer.rs

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::report::json::render_json;
use crate::report::markdown::render_markdown;
use crate::report::summary::{ReportMeta, Summary};
use crate::types::ReportFormat;

/// `report-<YYYYmmdd_HHMMSS_mmm>.<ext>`, stamped with `meta.generated_at`.
pub fn report_file_name(meta: &ReportMeta, format: ReportFormat) -> String {
    format!(
        "report-{}.{}",
        meta.generated_at.format("%Y%m%d_%H%M%S_%3f"),
        format.extension()
    )
}

/// First path in `dir` for this report that no existing file occupies:
/// the plain name, then `-1`, `-2`, ... before the extension.
fn unused_report_path(fs: &dyn FileSystem, dir: &Path, meta: &ReportMeta, format: ReportFormat) -> PathBuf {
    let path = dir.join(report_file_name(meta, format));
    if !fs.is_file(&path) {
        return path;
    }

    let stem = format!("report-{}", meta.generated_at.format("%Y%m%d_%H%M%S_%3f"));
    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}.{}", format.extension())))
        .find(|candidate| !fs.is_file(candidate))
        .unwrap_or(path)
}

/// Render and write the report into `dir`, creating it if needed.
///
/// An existing report with the same name is never overwritten. Returns the
/// path of the written file.
pub fn write_report(
    fs: &dyn FileSystem,
    dir: &Path,
    format: ReportFormat,
    summary: &Summary,
    meta: &ReportMeta,
) -> Result<PathBuf> {
    let body = match format {
        ReportFormat::Markdown => render_markdown(summary, meta),
        ReportFormat::Json => render_json(summary, meta)?,
    };

    let path = unused_report_path(fs, dir, meta, format);
    fs.write(&path, body.as_bytes())?;

    info!(path = %path.display(), ?format, "report written");
    Ok(path)
}
