pub mod csv_import;

pub use csv_import::{CsvImporter, ImportStats};
