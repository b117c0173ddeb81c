//! Normalization from parsed [`SourceRecord`]s into VTT [`TargetRecord`]s.
//!
//! [`convert`] dispatches on the record payload. Every per-kind writer fills
//! `target.data` in place; nothing here fails, problems degrade to
//! placeholders and are logged.

mod adversary;
mod character;
pub mod inventory;
pub mod items;
mod powers;
pub mod qualities;
mod vehicle;

use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core_api::{CoreError, CoreErrorCode, RecordType, SourceData, SourceRecord, TargetRecord};
use crate::grid::DecodedGrid;
use crate::markup;
use crate::reference::ReferenceIndex;

pub use character::talent_modifiers;
pub use items::ItemKind;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// An embedded feature record, as shown in a sheet's features list.
pub(crate) fn feature(name: &str, description: &str) -> JsonValue {
    json!({
        "_id": new_id(),
        "name": name,
        "recordType": "records",
        "identified": true,
        "unidentifiedName": "Feature",
        "data": { "description": description },
    })
}

/// An embedded item record for an inventory list.
pub(crate) fn embedded_item(name: &str, data: JsonMap<String, JsonValue>, kind: ItemKind) -> JsonValue {
    json!({
        "_id": new_id(),
        "name": name,
        "recordType": "items",
        "identified": true,
        "unidentifiedName": "Unidentified Item",
        "data": data,
        "fields": items::field_hints(kind),
    })
}

/// A lookup that fell back to a placeholder while converting `record`.
pub(crate) fn missing_reference(record: &str, what: &str, key: &str) -> CoreError {
    CoreError::new(
        CoreErrorCode::MissingReference,
        format!("{record}: {what} '{key}' not in the reference index"),
    )
}

fn report_missing_keys(record: &str, decoded: &DecodedGrid, issues: &mut Vec<CoreError>) {
    issues.extend(
        decoded
            .missing_keys
            .iter()
            .map(|key| missing_reference(record, "talent grid occupant", key)),
    );
}

/// One converted record plus every lookup that degraded to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub record: TargetRecord,
    pub issues: Vec<CoreError>,
}

fn expected_type(data: &SourceData) -> RecordType {
    match data {
        SourceData::Weapon(_)
        | SourceData::Armor(_)
        | SourceData::Gear(_)
        | SourceData::Attachment(_) => RecordType::Items,
        SourceData::Species(_) => RecordType::Species,
        SourceData::Career(_) => RecordType::Careers,
        SourceData::Specialization(_) => RecordType::Specializations,
        SourceData::Talent(_) => RecordType::Talents,
        SourceData::ForcePower(_) => RecordType::ForcePowers,
        SourceData::SignatureAbility(_) => RecordType::SignatureAbilities,
        SourceData::Skill(_) => RecordType::Skills,
        SourceData::Vehicle(_) | SourceData::Adversary(_) | SourceData::Npc(_) => RecordType::Npcs,
    }
}

/// Converts one record. An `UnknownRecordKind` error means the record's type
/// does not match its payload; skip it and carry on with the batch.
pub fn convert(
    record: &SourceRecord,
    index: &ReferenceIndex,
    campaign_id: &str,
    category: &str,
) -> Result<Conversion, CoreError> {
    let expected = expected_type(&record.data);
    if record.record_type != expected {
        warn!(
            name = %record.name,
            record_type = %record.record_type,
            expected = %expected,
            "unknown record kind, skipping"
        );
        return Err(unknown_kind(record));
    }
    let mut issues = Vec::new();

    let mut target = TargetRecord::new(&record.name, record.record_type, campaign_id, category);
    target.data.insert("name".into(), json!(record.name));
    target.data.insert(
        "description".into(),
        json!(markup::translate(&record.description)),
    );

    match &record.data {
        SourceData::Weapon(_)
        | SourceData::Armor(_)
        | SourceData::Gear(_)
        | SourceData::Attachment(_) => {
            let (kind, data) =
                items::item_data(record, index).ok_or_else(|| unknown_kind(record))?;
            target.data.extend(data);
            target.fields.extend(items::field_hints(kind));
        }
        SourceData::Species(species) => character::species(&mut target, species, index),
        SourceData::Career(career) => character::career(&mut target, career, index),
        SourceData::Specialization(tree) => {
            character::specialization(&mut target, tree, index, &mut issues)
        }
        SourceData::Talent(talent) => {
            character::talent(&mut target, record.key.as_deref(), talent, index)
        }
        SourceData::Skill(skill) => character::skill(&mut target, skill),
        SourceData::ForcePower(power) => {
            powers::force_power(&mut target, &record.description, power, index, &mut issues)
        }
        SourceData::SignatureAbility(ability) => {
            powers::signature_ability(&mut target, &record.description, ability, index, &mut issues)
        }
        SourceData::Vehicle(vehicle_data) => {
            vehicle::vehicle(&mut target, vehicle_data, index, &mut issues)
        }
        SourceData::Adversary(stats) => {
            adversary::adversary(&mut target, &record.description, stats, index, &mut issues)
        }
        SourceData::Npc(raw) => {
            for (field, value) in raw {
                if field != "name" && field != "description" {
                    target.data.insert(field.clone(), value.clone());
                }
            }
        }
    }
    debug!(
        name = %target.name,
        record_type = %target.record_type,
        issues = issues.len(),
        "converted record"
    );
    Ok(Conversion {
        record: target,
        issues,
    })
}

fn unknown_kind(record: &SourceRecord) -> CoreError {
    CoreError::new(
        CoreErrorCode::UnknownRecordKind,
        format!(
            "{}: payload does not fit record type {}",
            record.name, record.record_type
        ),
    )
}
