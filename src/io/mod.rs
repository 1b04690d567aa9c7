pub mod export;
pub mod import;

pub use export::{DebtView, Exporter, TripInfo, TripSnapshot};
pub use import::{ImportError, ImportOptions, ImportResult, Importer, SnapshotImport, import_full_json};
