mod engine;
mod error;
mod sources;
mod types;

pub use engine::{ConversionReport, Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use sources::{FALLBACK_CATEGORY, SourceBook, SourceCatalog};
pub use types::{
    RecordType, ScanOptions, ScanReport, SourceData, SourceRecord, TargetRecord, count_by_type,
};
