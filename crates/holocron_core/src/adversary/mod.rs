//! Adversaries JSON reader.
//!
//! Stat-block files come in three top-level shapes (a list, an object with
//! `npcs`, or a single object) and most fields can be a string, a list, or
//! a map depending on who wrote the file. Everything is resolved here into
//! [`AdversaryData`] so conversion never looks at raw JSON shapes.

mod definitions;
mod types;

use std::path::Path;

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use crate::core_api::{CoreError, CoreErrorCode, RecordType, SourceData, SourceRecord};
use crate::oggdude::types::Characteristics;
use crate::reader;

pub use definitions::{AdversaryDefinitions, DefinitionKind};
pub use types::{AdversaryData, DerivedStats, NamedEntry, SkillRank, Tier, WeaponEntry};

const SOURCE_TAG_PREFIXES: [&str; 3] = ["source:", "adventure:", "book:"];

/// Records and per-record problems from one JSON file.
#[derive(Debug, Default)]
pub struct JsonFile {
    pub records: Vec<SourceRecord>,
    pub issues: Vec<CoreError>,
}

/// Decodes with the first encoding that yields valid JSON.
pub fn decode_json(bytes: &[u8], origin: &Path) -> Result<JsonValue, CoreError> {
    let mut last_error = String::from("empty file");
    for (encoding, text) in reader::decode_candidates(bytes) {
        match serde_json::from_str::<JsonValue>(&text) {
            Ok(value) => {
                if encoding == "windows-1252" {
                    warn!(path = %origin.display(), encoding, "decoded with fallback encoding");
                }
                return Ok(value);
            }
            Err(e) => last_error = format!("{encoding}: {e}"),
        }
    }
    Err(CoreError::new(
        CoreErrorCode::MalformedSource,
        format!("failed to parse {}: {last_error}", origin.display()),
    ))
}

pub fn parse_document(bytes: &[u8], origin: &Path) -> Result<JsonFile, CoreError> {
    let value = decode_json(bytes, origin)?;
    let mut out = JsonFile::default();

    let (entries, subtype): (Vec<&JsonValue>, String) = match &value {
        JsonValue::Array(list) => (list.iter().collect(), subtype_from_path(origin)),
        JsonValue::Object(map) => match map.get("npcs") {
            Some(JsonValue::Array(list)) => (list.iter().collect(), String::new()),
            _ => (vec![&value], String::new()),
        },
        _ => {
            return Err(CoreError::new(
                CoreErrorCode::MalformedSource,
                format!("{}: top level is neither a list nor an object", origin.display()),
            ));
        }
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            out.issues.push(CoreError::new(
                CoreErrorCode::MalformedSource,
                format!("{}: entry {index} is not an object", origin.display()),
            ));
            continue;
        };
        match record_from_object(obj, &subtype) {
            Ok(record) => out.records.push(record),
            Err(mut err) => {
                err.message = format!("{}: entry {index}: {}", origin.display(), err.message);
                out.issues.push(err);
            }
        }
    }
    debug!(path = %origin.display(), records = out.records.len(), "parsed adversary json");
    Ok(out)
}

/// File stem with dashes as spaces, each word capitalised.
fn subtype_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| {
                    first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect::<String>()
                })
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive field lookup; the corpus mixes `name` and `Name`.
fn field<'a>(obj: &'a JsonMap<String, JsonValue>, key: &str) -> Option<&'a JsonValue> {
    obj.get(key).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn field_string(obj: &JsonMap<String, JsonValue>, key: &str) -> Option<String> {
    field(obj, key)
        .and_then(as_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_int(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().trim_start_matches('+').parse().ok(),
        _ => None,
    }
}

fn record_from_object(
    obj: &JsonMap<String, JsonValue>,
    subtype: &str,
) -> Result<SourceRecord, CoreError> {
    let name = field_string(obj, "name").ok_or_else(|| {
        CoreError::new(CoreErrorCode::MalformedSource, "record has no name")
    })?;
    let tags = string_list(field(obj, "tags"));
    let source = tags
        .iter()
        .find(|t| SOURCE_TAG_PREFIXES.iter().any(|p| t.starts_with(p)))
        .cloned()
        .or_else(|| field_string(obj, "source"))
        .unwrap_or_default();

    let is_stat_block = field(obj, "characteristics").is_some_and(JsonValue::is_object)
        && field(obj, "derived").is_some_and(JsonValue::is_object);

    let data = if is_stat_block {
        SourceData::Adversary(Box::new(AdversaryData {
            tier: Tier::parse(&field_string(obj, "type").unwrap_or_default()),
            subtype: subtype.to_string(),
            species: field_string(obj, "species"),
            characteristics: characteristics(field(obj, "characteristics")),
            derived: derived(field(obj, "derived")),
            skills: skills(field(obj, "skills")),
            talents: named_entries(field(obj, "talents")),
            abilities: named_entries(field(obj, "abilities")),
            weapons: weapons(field(obj, "weapons")),
            gear: string_list(field(obj, "gear").or_else(|| field(obj, "equipment"))),
            armor: string_list(field(obj, "armor")),
            tags,
            source: source.clone(),
            notes: field_string(obj, "notes").unwrap_or_default(),
        }))
    } else {
        SourceData::Npc(obj.clone())
    };

    let mut record = SourceRecord::new(RecordType::Npcs, name, data);
    record.description = field_string(obj, "description").unwrap_or_default();
    if !source.is_empty() {
        record.sources.push(source);
    }
    Ok(record)
}

fn characteristics(value: Option<&JsonValue>) -> Characteristics {
    let mut out = Characteristics::default();
    if let Some(JsonValue::Object(map)) = value {
        for (name, v) in map {
            if let Some(n) = as_int(v) {
                out.set(name, n);
            }
        }
    }
    out
}

fn derived(value: Option<&JsonValue>) -> DerivedStats {
    let mut out = DerivedStats::default();
    let Some(JsonValue::Object(map)) = value else {
        return out;
    };
    let get = |key: &str| field(map, key).and_then(as_int);
    out.soak = get("soak").unwrap_or(0);
    out.wounds = get("wounds").unwrap_or(0);
    out.strain = get("strain");
    let defence = field(map, "defence").or_else(|| field(map, "defense"));
    match defence {
        Some(JsonValue::Array(pair)) => {
            out.melee_defense = pair.first().and_then(as_int).unwrap_or(0);
            out.ranged_defense = pair.get(1).and_then(as_int).unwrap_or(0);
        }
        Some(JsonValue::Object(sides)) => {
            out.melee_defense = field(sides, "melee").and_then(as_int).unwrap_or(0);
            out.ranged_defense = field(sides, "ranged").and_then(as_int).unwrap_or(0);
        }
        Some(v) => {
            let both = as_int(v).unwrap_or(0);
            out.melee_defense = both;
            out.ranged_defense = both;
        }
        None => {}
    }
    out
}

fn skills(value: Option<&JsonValue>) -> Vec<SkillRank> {
    match value {
        Some(JsonValue::Object(map)) => map
            .iter()
            .map(|(name, rank)| SkillRank {
                name: name.trim().to_string(),
                rank: as_int(rank).unwrap_or(0),
            })
            .collect(),
        Some(JsonValue::Array(list)) => list
            .iter()
            .filter_map(|entry| match entry {
                JsonValue::String(name) => Some(SkillRank {
                    name: name.trim().to_string(),
                    rank: 1,
                }),
                JsonValue::Object(obj) => field_string(obj, "name").map(|name| SkillRank {
                    name,
                    rank: field(obj, "rank").and_then(as_int).unwrap_or(1),
                }),
                _ => None,
            })
            .collect(),
        Some(JsonValue::String(name)) => vec![SkillRank {
            name: name.trim().to_string(),
            rank: 1,
        }],
        _ => Vec::new(),
    }
}

/// Strings, lists of strings or objects, and name-keyed maps all become a
/// list of named entries.
fn named_entries(value: Option<&JsonValue>) -> Vec<NamedEntry> {
    match value {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => {
            vec![NamedEntry::new(name.trim(), "")]
        }
        Some(JsonValue::Array(list)) => list
            .iter()
            .filter_map(|entry| match entry {
                JsonValue::String(name) if !name.trim().is_empty() => {
                    Some(NamedEntry::new(name.trim(), ""))
                }
                JsonValue::Object(obj) => field_string(obj, "name")
                    .or_else(|| field_string(obj, "key"))
                    .map(|name| {
                        NamedEntry::new(name, field_string(obj, "description").unwrap_or_default())
                    }),
                _ => None,
            })
            .collect(),
        Some(JsonValue::Object(map)) => map
            .iter()
            .map(|(name, desc)| NamedEntry::new(name.trim(), as_text(desc).unwrap_or_default()))
            .collect(),
        _ => Vec::new(),
    }
}

fn string_list(value: Option<&JsonValue>) -> Vec<String> {
    named_entries(value).into_iter().map(|e| e.name).collect()
}

fn weapons(value: Option<&JsonValue>) -> Vec<WeaponEntry> {
    let list: Vec<&JsonValue> = match value {
        Some(JsonValue::Array(list)) => list.iter().collect(),
        Some(v @ (JsonValue::String(_) | JsonValue::Object(_))) => vec![v],
        _ => Vec::new(),
    };
    list.into_iter()
        .filter_map(|entry| match entry {
            JsonValue::String(name) if !name.trim().is_empty() => {
                Some(WeaponEntry::named(name.trim()))
            }
            JsonValue::Object(obj) => weapon_entry(obj),
            _ => None,
        })
        .collect()
}

fn weapon_entry(obj: &JsonMap<String, JsonValue>) -> Option<WeaponEntry> {
    let name = field_string(obj, "name").or_else(|| field_string(obj, "key"))?;
    let qualities = match field(obj, "qualities") {
        Some(JsonValue::String(text)) => text
            .split(',')
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
        other => string_list(other),
    };
    Some(WeaponEntry {
        name,
        skill: field_string(obj, "skill"),
        damage: field(obj, "damage").and_then(as_int),
        plus_damage: field(obj, "plus-damage").and_then(as_int),
        critical: field(obj, "critical")
            .or_else(|| field(obj, "crit"))
            .and_then(as_int),
        range: field_string(obj, "range"),
        qualities,
    })
}
