mod filter;
mod loader;
mod run;
mod upload;

pub use filter::count_annotation_types;
pub use loader::load_annotations;
pub use run::run;
