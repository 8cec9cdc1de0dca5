use std::collections::BTreeMap;

use serde_json::Value;

pub(super) const ANNOTATION_TYPE_FIELD: &str = "AnnotationType";
pub(super) const MISSING_TYPE_LABEL: &str = "<missing>";

fn annotation_type(record: &Value) -> Option<&str> {
    record.get(ANNOTATION_TYPE_FIELD).and_then(Value::as_str)
}

/// Keeps records whose `AnnotationType` equals `wanted`, in input order.
/// Records without a string-valued type never match.
pub fn filter_by_annotation_type(records: Vec<Value>, wanted: &str) -> Vec<Value> {
    records
        .into_iter()
        .filter(|record| annotation_type(record) == Some(wanted))
        .collect()
}

pub fn count_annotation_types(records: &[Value]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::<String, usize>::new();
    for record in records {
        let label = annotation_type(record).unwrap_or(MISSING_TYPE_LABEL);
        *counts.entry(label.to_string()).or_default() += 1;
    }
    counts
}
