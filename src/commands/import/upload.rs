use std::fmt::Write as _;
use std::ops::Range;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::model::{BatchFailure, BatchOutcome, IncidentRow, UploadReport};
use crate::store::RowSink;

pub(super) const EMPTY_INSERT_ERROR: &str = "insert returned no rows";

/// Contiguous `[start, end)` windows covering `0..len`. Only the last window
/// may be shorter than `batch_size`.
pub fn chunk_ranges(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

pub fn upload_batch<S: RowSink + ?Sized>(
    sink: &mut S,
    table: &str,
    batch_start: usize,
    records: &[Value],
) -> BatchOutcome {
    let batch_size = records.len();
    let failed = |error: String| {
        BatchOutcome::Failed(BatchFailure {
            batch_start,
            batch_size,
            error,
        })
    };

    let rows = match records
        .iter()
        .map(IncidentRow::from_annotation)
        .collect::<Result<Vec<IncidentRow>>>()
    {
        Ok(rows) => rows,
        Err(err) => return failed(format!("{err:#}")),
    };

    match sink.insert_rows(table, &rows) {
        Ok(inserted) if inserted.is_empty() => failed(EMPTY_INSERT_ERROR.to_string()),
        Ok(inserted) => BatchOutcome::Inserted {
            batch_start,
            batch_size,
            count: inserted.len(),
        },
        Err(err) => failed(format!("{err:#}")),
    }
}

/// Submits `records` chunk by chunk, in order. A failed chunk is recorded in
/// the report and never stops the remaining chunks.
pub fn upload_all<S: RowSink + ?Sized>(
    sink: &mut S,
    table: &str,
    records: &[Value],
    batch_size: usize,
) -> UploadReport {
    info!(
        records = records.len(),
        batch_size,
        table,
        "preparing batch insert"
    );

    let mut report = UploadReport::default();
    for range in chunk_ranges(records.len(), batch_size) {
        let outcome = upload_batch(sink, table, range.start, &records[range]);
        let batch_start = outcome.batch_start();

        match &outcome {
            BatchOutcome::Inserted { count, .. } => info!(
                batch_start,
                count = *count,
                total = report.total_inserted + count,
                filtered = records.len(),
                "inserted batch"
            ),
            BatchOutcome::Failed(failure) => warn!(
                batch_start,
                batch_size = failure.batch_size,
                error = %failure.error,
                "batch insert failed"
            ),
        }

        report.record(outcome);
    }

    report
}

pub fn render_summary(report: &UploadReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Successfully inserted {} records",
        report.total_inserted
    );

    if !report.failures.is_empty() {
        let _ = writeln!(
            out,
            "Encountered {} errors during batch insertion",
            report.failures.len()
        );
        let _ = writeln!(out, "Errors:");
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "  batch_start={} batch_size={} error={}",
                failure.batch_start, failure.batch_size, failure.error
            );
        }
    }

    out
}
