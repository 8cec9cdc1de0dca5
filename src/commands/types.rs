use anyhow::Result;
use tracing::info;

use crate::cli::TypesArgs;
use crate::commands::import::{count_annotation_types, load_annotations};

pub fn run(args: TypesArgs) -> Result<()> {
    let export = load_annotations(&args.input)?;
    let counts = count_annotation_types(&export.records);

    info!(
        loaded = export.records.len(),
        distinct = counts.len(),
        "annotation type census"
    );

    for (annotation_type, count) in &counts {
        println!("{count:>8}  {annotation_type}");
    }

    Ok(())
}
