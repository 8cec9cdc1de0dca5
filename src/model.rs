use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The four list fields forwarded to the incidents table. Deserializes from a
/// raw annotation object; everything else on the annotation is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRow {
    #[serde(
        rename(deserialize = "AffectedPersons"),
        default,
        deserialize_with = "null_as_empty"
    )]
    pub affected_persons: Vec<String>,
    #[serde(
        rename(deserialize = "Countries"),
        default,
        deserialize_with = "null_as_empty"
    )]
    pub countries: Vec<String>,
    #[serde(
        rename(deserialize = "Regions"),
        default,
        deserialize_with = "null_as_empty"
    )]
    pub regions: Vec<String>,
    #[serde(
        rename(deserialize = "Themes"),
        default,
        deserialize_with = "null_as_empty"
    )]
    pub themes: Vec<String>,
}

impl IncidentRow {
    pub fn from_annotation(record: &Value) -> Result<Self> {
        let annotation_id = record
            .get("AnnotationId")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");

        IncidentRow::deserialize(record)
            .with_context(|| format!("annotation {annotation_id} has malformed list fields"))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub batch_start: usize,
    pub batch_size: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Inserted {
        batch_start: usize,
        batch_size: usize,
        count: usize,
    },
    Failed(BatchFailure),
}

impl BatchOutcome {
    pub fn batch_start(&self) -> usize {
        match self {
            Self::Inserted { batch_start, .. } => *batch_start,
            Self::Failed(failure) => failure.batch_start,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub total_inserted: usize,
    pub attempted_records: usize,
    pub batch_count: usize,
    pub failures: Vec<BatchFailure>,
}

impl UploadReport {
    pub fn record(&mut self, outcome: BatchOutcome) {
        self.batch_count += 1;
        match outcome {
            BatchOutcome::Inserted {
                batch_size, count, ..
            } => {
                self.attempted_records += batch_size;
                self.total_inserted += count;
            }
            BatchOutcome::Failed(failure) => {
                self.attempted_records += failure.batch_size;
                self.failures.push(failure);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub command: String,
    pub input_path: String,
    pub input_sha256: String,
    pub annotation_type: String,
    pub sink: String,
    pub table: String,
    pub batch_size: usize,
    pub loaded_count: usize,
    pub filtered_count: usize,
    pub report: UploadReport,
}
