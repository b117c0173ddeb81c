//! Source file discovery and text decoding.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::core_api::{CoreError, CoreErrorCode};

/// Side-channel definition files read only for lookups.
pub const DEFINITION_FILES: [&str; 3] = ["talents.json", "abilities.json", "force-powers.json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xml,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: SourceFormat,
}

impl SourceFile {
    pub fn is_definition_file(&self) -> bool {
        self.format == SourceFormat::Json && is_definition_file(&self.path)
    }
}

pub fn is_definition_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_ascii_lowercase())
        .is_some_and(|n| DEFINITION_FILES.contains(&n.as_str()))
}

fn format_of(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xml" => Some(SourceFormat::Xml),
        "json" => Some(SourceFormat::Json),
        _ => None,
    }
}

/// Every XML and JSON file under `root`, in a stable order. Unreadable
/// subdirectories are logged and skipped.
pub fn discover(root: &Path) -> Result<Vec<SourceFile>, CoreError> {
    if !root.is_dir() {
        return Err(CoreError::new(
            CoreErrorCode::Io,
            format!("{} is not a readable directory", root.display()),
        ));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), "skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(format) = format_of(entry.path()) else {
            continue;
        };
        files.push(SourceFile {
            path: entry.into_path(),
            format,
        });
    }
    Ok(files)
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, CoreError> {
    fs::read(path).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to read {}: {e}", path.display()),
        )
    })
}

/// Decodings to try in order: UTF-8 with a byte-order mark, plain UTF-8,
/// then Windows-1252 (a superset of Latin-1 for printable text).
pub fn decode_candidates(bytes: &[u8]) -> Vec<(&'static str, Cow<'_, str>)> {
    let mut out = Vec::with_capacity(3);
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF")
        && let Ok(text) = std::str::from_utf8(rest)
    {
        out.push(("utf-8-sig", Cow::Borrowed(text)));
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        out.push(("utf-8", Cow::Borrowed(text)));
    }
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    out.push(("windows-1252", text));
    out
}

/// Best single decoding, for formats that carry their own parser errors.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    decode_candidates(bytes)
        .into_iter()
        .next()
        .map(|(_, text)| text)
        .unwrap_or(Cow::Borrowed(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_is_stripped_first() {
        let candidates = decode_candidates(b"\xEF\xBB\xBF[1]");
        assert_eq!(candidates[0].0, "utf-8-sig");
        assert_eq!(candidates[0].1, "[1]");
    }

    #[test]
    fn latin1_falls_back_to_windows_1252() {
        let bytes = b"\"Caf\xe9\"";
        let candidates = decode_candidates(bytes);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].0, "windows-1252");
        assert_eq!(candidates[0].1, "\"Café\"");
        assert_eq!(decode_text(bytes), "\"Café\"");
    }

    #[test]
    fn discover_finds_sources_and_flags_definitions() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("Data/Nested")).expect("mkdir");
        fs::write(dir.path().join("Data/Weapons.xml"), "<Weapons/>").expect("write");
        fs::write(dir.path().join("Data/Nested/talents.json"), "[]").expect("write");
        fs::write(dir.path().join("Data/Nested/thugs.JSON"), "[]").expect("write");
        fs::write(dir.path().join("notes.txt"), "skip").expect("write");
        let files = discover(dir.path()).expect("discover");
        assert_eq!(files.len(), 3);
        let definitions: Vec<bool> = files.iter().map(SourceFile::is_definition_file).collect();
        assert_eq!(definitions.iter().filter(|d| **d).count(), 1);
        assert!(discover(&dir.path().join("missing")).is_err());
    }
}
