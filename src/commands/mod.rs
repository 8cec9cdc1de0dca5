pub mod import;
pub mod types;
