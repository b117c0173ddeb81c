use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::adversary::AdversaryData;
use crate::oggdude::types::{
    ArmorData, AttachmentData, CareerData, ForcePowerData, GearData, SignatureAbilityData,
    SkillData, SpecializationData, SpeciesData, TalentData, VehicleData, WeaponData,
};

use super::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Items,
    Species,
    Careers,
    Specializations,
    Talents,
    ForcePowers,
    Skills,
    Npcs,
    SignatureAbilities,
}

impl RecordType {
    pub const ALL: [RecordType; 9] = [
        RecordType::Items,
        RecordType::Species,
        RecordType::Careers,
        RecordType::Specializations,
        RecordType::Talents,
        RecordType::ForcePowers,
        RecordType::Skills,
        RecordType::Npcs,
        RecordType::SignatureAbilities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Items => "items",
            RecordType::Species => "species",
            RecordType::Careers => "careers",
            RecordType::Specializations => "specializations",
            RecordType::Talents => "talents",
            RecordType::ForcePowers => "force_powers",
            RecordType::Skills => "skills",
            RecordType::Npcs => "npcs",
            RecordType::SignatureAbilities => "signature_abilities",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        RecordType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("unknown record type '{s}'"))
    }
}

/// Kind-specific payload of a parsed entity, already resolved to one shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Weapon(WeaponData),
    Armor(ArmorData),
    Gear(GearData),
    Attachment(AttachmentData),
    Species(SpeciesData),
    Career(CareerData),
    Specialization(SpecializationData),
    Talent(TalentData),
    ForcePower(ForcePowerData),
    SignatureAbility(SignatureAbilityData),
    Skill(SkillData),
    Vehicle(VehicleData),
    Adversary(Box<AdversaryData>),
    /// Non-player record without a stat block; passed through untouched.
    Npc(JsonMap<String, JsonValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub record_type: RecordType,
    pub name: String,
    pub description: String,
    pub sources: Vec<String>,
    pub category: Option<String>,
    pub key: Option<String>,
    pub data: SourceData,
}

impl SourceRecord {
    pub fn new(record_type: RecordType, name: impl Into<String>, data: SourceData) -> Self {
        Self {
            record_type,
            name: name.into(),
            description: String::new(),
            sources: Vec::new(),
            category: None,
            key: None,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRecord {
    pub name: String,
    pub record_type: RecordType,
    pub campaign_id: String,
    pub category: String,
    pub identified: bool,
    pub shared: bool,
    pub locked: bool,
    pub data: JsonMap<String, JsonValue>,
    pub fields: JsonMap<String, JsonValue>,
}

impl TargetRecord {
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        campaign_id: &str,
        category: &str,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            campaign_id: campaign_id.to_string(),
            category: category.to_string(),
            identified: true,
            shared: false,
            locked: false,
            data: JsonMap::new(),
            fields: JsonMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Source catalog keys; empty keeps every record.
    pub selected_sources: BTreeSet<String>,
    /// Record types to keep; empty keeps every type.
    pub selected_types: BTreeSet<RecordType>,
    /// Per-type cap; 0 means no cap.
    pub max_per_type: usize,
    /// Stamped on every converted record.
    pub campaign_id: String,
}

impl ScanOptions {
    pub fn wants(&self, record_type: RecordType) -> bool {
        self.selected_types.is_empty() || self.selected_types.contains(&record_type)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub records: BTreeMap<RecordType, Vec<SourceRecord>>,
    pub files_seen: usize,
    pub issues: Vec<CoreError>,
}

impl ScanReport {
    pub fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn counts(&self) -> BTreeMap<RecordType, usize> {
        count_by_type(&self.records)
    }
}

pub fn count_by_type<T>(records: &BTreeMap<RecordType, Vec<T>>) -> BTreeMap<RecordType, usize> {
    records
        .iter()
        .map(|(kind, list)| (*kind, list.len()))
        .collect()
}
