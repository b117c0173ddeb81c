//! Read-only lookup tables built once per scan root: talents, skills,
//! careers, specializations, ability nodes, item descriptors, the item
//! catalog and adversary definition text.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::adversary::{self, AdversaryDefinitions, DefinitionKind};
use crate::core_api::{CoreError, RecordType, SourceData, SourceRecord};
use crate::grid::{GridKind, Occupant, OccupantLookup};
use crate::heuristics::{activation_label, skill_for_key};
use crate::markup;
use crate::oggdude::{
    self,
    types::{AbilityText, ItemDescriptor, ReferenceEntry},
};
use crate::reader::{self, SourceFormat};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TalentInfo {
    pub key: String,
    pub name: String,
    /// Raw markup.
    pub description: String,
    pub ranked: bool,
    pub activation: String,
    pub force_talent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    talents: HashMap<String, TalentInfo>,
    talent_keys_by_name: HashMap<String, String>,
    talent_trees: HashMap<String, Vec<String>>,
    skills: HashMap<String, String>,
    careers: HashMap<String, String>,
    specializations: HashMap<String, String>,
    force_abilities: HashMap<String, AbilityText>,
    signature_nodes: HashMap<String, AbilityText>,
    vehicle_actions: HashMap<String, AbilityText>,
    descriptors: HashMap<String, ItemDescriptor>,
    items: HashMap<String, SourceRecord>,
    item_keys_by_name: HashMap<String, String>,
    definitions: AdversaryDefinitions,
    issues: Vec<CoreError>,
}

fn first_wins<V>(map: &mut HashMap<String, V>, key: &str, value: V) {
    map.entry(key.to_string()).or_insert(value);
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks `root` and indexes every XML file plus any adversary definition
    /// files. Unreadable files are logged and recorded in [`Self::issues`].
    pub fn build(root: &Path) -> Result<Self, CoreError> {
        let mut index = Self::new();
        for file in reader::discover(root)? {
            match file.format {
                SourceFormat::Xml => {
                    let parsed = reader::read_bytes(&file.path).and_then(|bytes| {
                        oggdude::parse_document(&reader::decode_text(&bytes), &file.path)
                    });
                    match parsed {
                        Ok(parsed) => {
                            for record in &parsed.records {
                                index.insert_record(record);
                            }
                            for entry in parsed.references {
                                index.insert_reference(entry);
                            }
                        }
                        Err(err) => {
                            warn!(path = %file.path.display(), "{}", err.message);
                            index.issues.push(err);
                        }
                    }
                }
                SourceFormat::Json => {
                    let Some(kind) = file
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .and_then(DefinitionKind::from_file_name)
                    else {
                        continue;
                    };
                    let parsed = reader::read_bytes(&file.path)
                        .and_then(|bytes| adversary::decode_json(&bytes, &file.path));
                    match parsed {
                        Ok(value) => {
                            let added = index.definitions.index(kind, &value);
                            debug!(path = %file.path.display(), added, "indexed definitions");
                        }
                        Err(err) => {
                            warn!(path = %file.path.display(), "{}", err.message);
                            index.issues.push(err);
                        }
                    }
                }
            }
        }
        info!(
            root = %root.display(),
            talents = index.talents.len(),
            items = index.items.len(),
            definitions = index.definitions.len(),
            "reference index built"
        );
        Ok(index)
    }

    pub fn insert_record(&mut self, record: &SourceRecord) {
        let Some(key) = record.key.as_deref() else {
            if record.record_type == RecordType::Items {
                first_wins(
                    &mut self.item_keys_by_name,
                    &record.name.to_lowercase(),
                    record.name.clone(),
                );
                first_wins(&mut self.items, &record.name, record.clone());
            }
            return;
        };
        match &record.data {
            SourceData::Weapon(_)
            | SourceData::Armor(_)
            | SourceData::Gear(_)
            | SourceData::Attachment(_) => {
                first_wins(&mut self.items, key, record.clone());
                first_wins(
                    &mut self.item_keys_by_name,
                    &record.name.to_lowercase(),
                    key.to_string(),
                );
            }
            SourceData::Talent(data) => {
                first_wins(
                    &mut self.talents,
                    key,
                    TalentInfo {
                        key: key.to_string(),
                        name: record.name.clone(),
                        description: record.description.clone(),
                        ranked: data.ranked,
                        activation: data.activation.clone(),
                        force_talent: data.force_talent,
                    },
                );
                first_wins(
                    &mut self.talent_keys_by_name,
                    &record.name.to_lowercase(),
                    key.to_string(),
                );
            }
            SourceData::Skill(_) => first_wins(&mut self.skills, key, record.name.clone()),
            SourceData::Career(_) => first_wins(&mut self.careers, key, record.name.clone()),
            SourceData::Specialization(data) => {
                first_wins(&mut self.specializations, key, record.name.clone());
                for row in &data.grid.rows {
                    for talent in row.occupants.iter().flatten() {
                        let trees = self.talent_trees.entry(talent.clone()).or_default();
                        if !trees.contains(&record.name) {
                            trees.push(record.name.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub fn insert_reference(&mut self, entry: ReferenceEntry) {
        match entry {
            ReferenceEntry::Descriptor(d) => first_wins(&mut self.descriptors, &d.key.clone(), d),
            ReferenceEntry::ForceAbility(a) => {
                first_wins(&mut self.force_abilities, &a.key.clone(), a)
            }
            ReferenceEntry::SignatureNode(a) => {
                first_wins(&mut self.signature_nodes, &a.key.clone(), a)
            }
            ReferenceEntry::VehicleAction(a) => {
                first_wins(&mut self.vehicle_actions, &a.key.clone(), a)
            }
        }
    }

    pub fn definitions_mut(&mut self) -> &mut AdversaryDefinitions {
        &mut self.definitions
    }

    pub fn definitions(&self) -> &AdversaryDefinitions {
        &self.definitions
    }

    pub fn talent(&self, key: &str) -> Option<&TalentInfo> {
        self.talents.get(key)
    }

    pub fn talent_by_name(&self, name: &str) -> Option<&TalentInfo> {
        self.talent_keys_by_name
            .get(&name.trim().to_lowercase())
            .and_then(|key| self.talents.get(key))
    }

    /// Specializations whose tree contains the talent, in insertion order.
    pub fn specialization_trees(&self, talent_key: &str) -> &[String] {
        self.talent_trees
            .get(talent_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Skill label for a key; falls back to the built-in key table and then
    /// to the key itself.
    pub fn skill_name(&self, key: &str) -> String {
        self.skills
            .get(key)
            .cloned()
            .or_else(|| skill_for_key(key).map(str::to_string))
            .unwrap_or_else(|| key.to_string())
    }

    pub fn is_skill_key(&self, key: &str) -> bool {
        self.skills.contains_key(key) || skill_for_key(key).is_some()
    }

    pub fn career_name(&self, key: &str) -> Option<&str> {
        self.careers.get(key).map(String::as_str)
    }

    pub fn specialization_name(&self, key: &str) -> Option<&str> {
        self.specializations.get(key).map(String::as_str)
    }

    pub fn force_ability(&self, key: &str) -> Option<&AbilityText> {
        self.force_abilities.get(key)
    }

    pub fn signature_node(&self, key: &str) -> Option<&AbilityText> {
        self.signature_nodes.get(key)
    }

    pub fn vehicle_action(&self, key: &str) -> Option<&AbilityText> {
        self.vehicle_actions.get(key)
    }

    pub fn descriptor(&self, key: &str) -> Option<&ItemDescriptor> {
        self.descriptors.get(key)
    }

    pub fn item(&self, key: &str) -> Option<&SourceRecord> {
        self.items.get(key)
    }

    /// Case-insensitive exact name match against the item catalog.
    pub fn item_by_name(&self, name: &str) -> Option<&SourceRecord> {
        self.item_keys_by_name
            .get(&name.trim().to_lowercase())
            .and_then(|key| self.items.get(key))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn issues(&self) -> &[CoreError] {
        &self.issues
    }

    fn ability_occupant(ability: &AbilityText, kind: GridKind) -> Occupant {
        Occupant {
            key: ability.key.clone(),
            name: ability.name.clone(),
            description: markup::translate(&ability.description),
            activation: "Passive".to_string(),
            ranked: false,
            force_talent: kind == GridKind::ForcePower,
            specialization_trees: Vec::new(),
            resolved: true,
        }
    }
}

impl OccupantLookup for ReferenceIndex {
    fn occupant(&self, kind: GridKind, key: &str) -> Option<Occupant> {
        match kind {
            GridKind::Specialization => self.talent(key).map(|talent| Occupant {
                key: talent.key.clone(),
                name: talent.name.clone(),
                description: markup::translate(&talent.description),
                activation: activation_label(&talent.activation).to_string(),
                ranked: talent.ranked,
                force_talent: talent.force_talent,
                specialization_trees: self.specialization_trees(key).to_vec(),
                resolved: true,
            }),
            GridKind::ForcePower => self
                .force_ability(key)
                .map(|a| Self::ability_occupant(a, kind)),
            GridKind::SignatureAbility => self
                .signature_node(key)
                .map(|a| Self::ability_occupant(a, kind)),
        }
    }
}
