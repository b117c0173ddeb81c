use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::adversary;
use crate::convert;
use crate::oggdude;
use crate::reader::{self, SourceFile, SourceFormat};
use crate::reference::ReferenceIndex;

use super::error::{CoreError, CoreErrorCode};
use super::sources::SourceCatalog;
use super::types::{RecordType, ScanOptions, ScanReport, SourceData, SourceRecord, TargetRecord};

#[derive(Debug, Default)]
pub struct Engine {
    catalog: SourceCatalog,
    indexes: Mutex<HashMap<PathBuf, Arc<ReferenceIndex>>>,
}

/// Converted records grouped by type, plus everything that degraded on the way.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub records: BTreeMap<RecordType, Vec<TargetRecord>>,
    pub issues: Vec<CoreError>,
}

impl ConversionReport {
    pub fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Records of every type, in record type order.
    pub fn into_records(self) -> Vec<TargetRecord> {
        self.records.into_values().flatten().collect()
    }
}

/// Conversion context for one scan root. Cheap to clone; the index is
/// shared and never mutated after it is built.
#[derive(Debug, Clone)]
pub struct Session {
    root: PathBuf,
    index: Arc<ReferenceIndex>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: SourceCatalog) -> Self {
        Self {
            catalog,
            indexes: Mutex::default(),
        }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Reads every source file under `root` and groups the kept records by
    /// type. Only an unreadable root is an error; everything else lands in
    /// [`ScanReport::issues`].
    pub fn scan(&self, root: &Path, options: &ScanOptions) -> Result<ScanReport, CoreError> {
        let files = reader::discover(root)?;
        let mut report = ScanReport {
            files_seen: files.len(),
            ..ScanReport::default()
        };
        let mut seen_keys: HashSet<(RecordType, String)> = HashSet::new();

        for file in &files {
            if file.is_definition_file() {
                debug!(path = %file.path.display(), "definition file, not scanned for records");
                continue;
            }
            let records = match read_file(file) {
                Ok((records, issues)) => {
                    report.issues.extend(issues);
                    records
                }
                Err(err) => {
                    warn!(path = %file.path.display(), "skipping file: {}", err.message);
                    report.issues.push(err);
                    continue;
                }
            };
            for mut record in records {
                if !options.wants(record.record_type) {
                    continue;
                }
                if let Some(key) = &record.key
                    && !seen_keys.insert((record.record_type, key.clone()))
                {
                    warn!(
                        key = %key,
                        record_type = %record.record_type,
                        path = %file.path.display(),
                        "duplicate key, keeping the first record"
                    );
                    continue;
                }
                let Some(category) = self.category_for(&record, options) else {
                    continue;
                };
                record.category = Some(category);
                let group = report.records.entry(record.record_type).or_default();
                if options.max_per_type > 0 && group.len() >= options.max_per_type {
                    continue;
                }
                group.push(record);
            }
        }

        for (kind, group) in &report.records {
            debug!(record_type = %kind, count = group.len(), "scan group");
        }
        info!(
            root = %root.display(),
            files = report.files_seen,
            records = report.total(),
            issues = report.issues.len(),
            "scan finished"
        );
        Ok(report)
    }

    fn category_for(&self, record: &SourceRecord, options: &ScanOptions) -> Option<String> {
        let selected = &options.selected_sources;
        match &record.data {
            SourceData::Adversary(stats) => {
                self.catalog
                    .match_adversary(&stats.tags, &stats.source, selected)
            }
            SourceData::Npc(_) => {
                let source = record.sources.first().map(String::as_str).unwrap_or("");
                self.catalog.match_adversary(&[], source, selected)
            }
            _ => self.catalog.match_oggdude(&record.sources, selected),
        }
    }

    /// Session for `root`, building its reference index on first use. Later
    /// calls for the same root share the cached index.
    pub fn open(&self, root: &Path) -> Result<Session, CoreError> {
        let canonical = root.canonicalize().map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to resolve {}: {e}", root.display()),
            )
        })?;
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| CoreError::new(CoreErrorCode::Io, "reference index cache poisoned"))?;
        let index = match indexes.get(&canonical) {
            Some(index) => Arc::clone(index),
            None => {
                let index = Arc::new(ReferenceIndex::build(&canonical)?);
                indexes.insert(canonical.clone(), Arc::clone(&index));
                index
            }
        };
        Ok(Session {
            root: canonical,
            index,
        })
    }
}

fn read_file(file: &SourceFile) -> Result<(Vec<SourceRecord>, Vec<CoreError>), CoreError> {
    let bytes = reader::read_bytes(&file.path)?;
    match file.format {
        SourceFormat::Xml => {
            let parsed = oggdude::parse_document(&reader::decode_text(&bytes), &file.path)?;
            Ok((parsed.records, parsed.issues))
        }
        SourceFormat::Json => {
            let parsed = adversary::parse_document(&bytes, &file.path)?;
            Ok((parsed.records, parsed.issues))
        }
    }
}

impl Session {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    /// `None` when the record's kind is not recognized; the record should
    /// be skipped and the batch continued.
    pub fn convert(
        &self,
        record: &SourceRecord,
        campaign_id: &str,
        category: &str,
    ) -> Option<TargetRecord> {
        convert::convert(record, &self.index, campaign_id, category)
            .ok()
            .map(|conversion| conversion.record)
    }

    /// Converts every record of a scan, using each record's own category.
    /// Skipped records and placeholder lookups land in the report's issues.
    pub fn convert_all(&self, report: &ScanReport, campaign_id: &str) -> ConversionReport {
        let mut out = ConversionReport::default();
        for (kind, records) in &report.records {
            let group = out.records.entry(*kind).or_default();
            for record in records {
                let category = record
                    .category
                    .as_deref()
                    .unwrap_or(super::sources::FALLBACK_CATEGORY);
                match convert::convert(record, &self.index, campaign_id, category) {
                    Ok(conversion) => {
                        group.push(conversion.record);
                        out.issues.extend(conversion.issues);
                    }
                    Err(err) => out.issues.push(err),
                }
            }
        }
        out
    }
}
