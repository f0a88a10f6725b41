use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use beastvault_import::{
    ImportProgress, IngestError, IngestItem, IngestionPipeline, ItemStatus, JsonEntryParser,
};
use beastvault_lib::settings::PathOverrides;

use super::Library;
use crate::CliError;

/// Import entry files into the library.
pub(crate) fn run_import(
    overrides: &PathOverrides,
    files: Vec<PathBuf>,
    progress: &dyn ImportProgress,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;

    let mut items = Vec::with_capacity(files.len());
    for path in &files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(bytes) => items.push(IngestItem::upload(file_name, bytes)),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    if items.is_empty() {
        return Err(CliError::other("No readable files to import"));
    }

    let pipeline = IngestionPipeline::new(&lib.conn, &lib.store, &JsonEntryParser, &lib.tables);
    let report = match pipeline.ingest(items, progress) {
        Ok(report) => report,
        Err(IngestError::BatchAborted {
            report,
            file_name,
            source,
        }) => {
            log::info!(
                "{} item(s) completed before the failure ({}); re-running the import is safe.",
                report.items.len(),
                report.summary()
            );
            return Err(CliError::database(format!(
                "Import stopped at {}: {}",
                file_name, source
            )));
        }
        Err(e @ IngestError::Lock(_)) => return Err(CliError::storage(e.to_string())),
    };

    log::info!("{}", "Import Results".if_supports_color(Stdout, |t| t.bold()));
    for item in &report.items {
        match &item.status {
            ItemStatus::Imported { entry_id, .. } => log::info!(
                "  {} {} -> #{}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                item.file_name,
                entry_id,
            ),
            ItemStatus::Duplicate { entry_id } => log::info!(
                "  {} {} (duplicate{})",
                "=".if_supports_color(Stdout, |t| t.yellow()),
                item.file_name.if_supports_color(Stdout, |t| t.dimmed()),
                entry_id.map(|id| format!(" of #{}", id)).unwrap_or_default(),
            ),
            ItemStatus::Error { message } => log::info!(
                "  {} {}: {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                item.file_name,
                message,
            ),
        }
    }
    crate::log_blank();
    log::info!(
        "  Imported: {}  Duplicates: {}  Errors: {}",
        report.imported().if_supports_color(Stdout, |t| t.green()),
        report.duplicates(),
        report.errors().if_supports_color(Stdout, |t| t.red()),
    );

    Ok(())
}
