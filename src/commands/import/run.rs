use std::ops::Range;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::filter::filter_by_annotation_type;
use super::loader::load_annotations;
use super::upload::{chunk_ranges, render_summary, upload_all};
use crate::cli::{ImportArgs, SinkKind};
use crate::config::{ConfigError, StoreConfig, load_env_file};
use crate::model::ImportRunManifest;
use crate::store::{RestSink, RowSink, SqliteSink};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: ImportArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("import-{}", utc_compact_string(started_ts));
    let batch_size = usize::try_from(args.batch_size).context("batch size does not fit in usize")?;

    info!(run_id = %run_id, input = %args.input.display(), "loading UHRI data");
    let export = load_annotations(&args.input)?;
    let loaded_count = export.records.len();

    info!(annotation_type = %args.annotation_type, "filtering annotations");
    let filtered = filter_by_annotation_type(export.records, &args.annotation_type);
    info!(
        loaded = loaded_count,
        filtered = filtered.len(),
        "found matching annotations"
    );

    if args.dry_run {
        let sizes = chunk_ranges(filtered.len(), batch_size)
            .iter()
            .map(Range::len)
            .collect::<Vec<usize>>();
        info!(batches = sizes.len(), ?sizes, "dry run, skipping upload");
        return Ok(());
    }

    let mut sink = open_sink(&args, StoreConfig::from_env)?;
    let report = upload_all(sink.as_mut(), &args.table, &filtered, batch_size);
    print!("{}", render_summary(&report));

    if let Some(report_path) = &args.report_path {
        let manifest = ImportRunManifest {
            manifest_version: 1,
            run_id,
            status: if report.failures.is_empty() {
                "completed".to_string()
            } else {
                "completed_with_errors".to_string()
            },
            started_at,
            finished_at: now_utc_string(),
            command: std::env::args().collect::<Vec<String>>().join(" "),
            input_path: args.input.display().to_string(),
            input_sha256: export.sha256,
            annotation_type: args.annotation_type.clone(),
            sink: args.sink.as_str().to_string(),
            table: args.table.clone(),
            batch_size,
            loaded_count,
            filtered_count: filtered.len(),
            report,
        };
        write_json_pretty(report_path, &manifest)?;
        info!(path = %report_path.display(), "wrote import run report");
    }

    Ok(())
}

/// Builds the configured sink. For the REST sink, `resolve_config` runs after
/// the env file is loaded and before any client exists.
pub(super) fn open_sink<F>(args: &ImportArgs, resolve_config: F) -> Result<Box<dyn RowSink>>
where
    F: FnOnce() -> Result<StoreConfig, ConfigError>,
{
    match args.sink {
        SinkKind::Rest => {
            load_env_file(&args.env_file);
            let config = resolve_config()?;
            info!(base_url = %config.base_url, "initializing store client");
            let sink = RestSink::new(&config, args.timeout_secs.map(Duration::from_secs))?;
            Ok(Box::new(sink))
        }
        SinkKind::Sqlite => {
            info!(db_path = %args.db_path.display(), "opening local sqlite store");
            Ok(Box::new(SqliteSink::open(&args.db_path)?))
        }
    }
}
