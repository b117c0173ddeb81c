use std::collections::HashMap;

use serde_json::Value as JsonValue;
use tracing::warn;

use super::types::NamedEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Talents,
    Abilities,
    ForcePowers,
}

impl DefinitionKind {
    /// Kind for a definition file name, compared case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "talents.json" => Some(DefinitionKind::Talents),
            "abilities.json" => Some(DefinitionKind::Abilities),
            "force-powers.json" => Some(DefinitionKind::ForcePowers),
            _ => None,
        }
    }
}

/// Display text for adversary talents, abilities and force powers, keyed
/// by lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdversaryDefinitions {
    talents: HashMap<String, NamedEntry>,
    abilities: HashMap<String, NamedEntry>,
    force_powers: HashMap<String, NamedEntry>,
}

impl AdversaryDefinitions {
    fn table_mut(&mut self, kind: DefinitionKind) -> &mut HashMap<String, NamedEntry> {
        match kind {
            DefinitionKind::Talents => &mut self.talents,
            DefinitionKind::Abilities => &mut self.abilities,
            DefinitionKind::ForcePowers => &mut self.force_powers,
        }
    }

    /// Accepts a list of `{name, description}` objects or a map from name to
    /// a description string or object. The first definition of a name wins.
    /// Returns the number of entries added.
    pub fn index(&mut self, kind: DefinitionKind, value: &JsonValue) -> usize {
        let mut entries = Vec::new();
        match value {
            JsonValue::Array(list) => {
                for entry in list {
                    let Some(obj) = entry.as_object() else {
                        continue;
                    };
                    let Some(name) = field_str(obj, "name") else {
                        continue;
                    };
                    let description = field_str(obj, "description").unwrap_or_default();
                    entries.push(NamedEntry::new(name.trim(), description));
                }
            }
            JsonValue::Object(map) => {
                for (key, entry) in map {
                    match entry {
                        JsonValue::String(text) => {
                            entries.push(NamedEntry::new(key.trim(), text.as_str()));
                        }
                        JsonValue::Object(obj) => {
                            let name = field_str(obj, "name").unwrap_or(key.as_str());
                            let description = field_str(obj, "description").unwrap_or_default();
                            entries.push(NamedEntry::new(name.trim(), description));
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        let table = self.table_mut(kind);
        let mut added = 0;
        for entry in entries {
            let key = entry.name.to_lowercase();
            if let Some(kept) = table.get(&key) {
                if kept.description != entry.description {
                    warn!(name = %entry.name, ?kind, "duplicate definition, keeping the first");
                }
                continue;
            }
            table.insert(key, entry);
            added += 1;
        }
        added
    }

    pub fn talent(&self, name: &str) -> Option<&NamedEntry> {
        self.talents.get(&name.trim().to_lowercase())
    }

    /// Abilities first, then force powers.
    pub fn ability(&self, name: &str) -> Option<&NamedEntry> {
        let key = name.trim().to_lowercase();
        self.abilities
            .get(&key)
            .or_else(|| self.force_powers.get(&key))
            .or_else(|| {
                key.strip_prefix("force power:")
                    .and_then(|rest| self.force_powers.get(rest.trim()))
            })
    }

    pub fn len(&self) -> usize {
        self.talents.len() + self.abilities.len() + self.force_powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn field_str<'a>(obj: &'a serde_json::Map<String, JsonValue>, key: &str) -> Option<&'a str> {
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .and_then(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_and_map_shapes_are_indexed() {
        let mut defs = AdversaryDefinitions::default();
        let added = defs.index(
            DefinitionKind::Talents,
            &json!([{ "name": "Adversary", "description": "Upgrade difficulty." }, { "bad": 1 }]),
        );
        assert_eq!(added, 1);
        defs.index(
            DefinitionKind::ForcePowers,
            &json!({ "Enhance": "Jump further.", "Move": { "description": "Lift things." } }),
        );
        assert_eq!(defs.talent("ADVERSARY").map(|t| t.description.as_str()), Some("Upgrade difficulty."));
        assert_eq!(defs.ability("Move").map(|t| t.description.as_str()), Some("Lift things."));
        assert_eq!(
            defs.ability("Force Power: Enhance").map(|t| t.name.as_str()),
            Some("Enhance")
        );
        assert_eq!(defs.len(), 3);
        assert!(defs.ability("Unknown").is_none());
    }

    #[test]
    fn first_definition_of_a_name_is_kept() {
        let mut defs = AdversaryDefinitions::default();
        defs.index(
            DefinitionKind::Talents,
            &json!([{ "name": "Adversary", "description": "Upgrade difficulty." }]),
        );
        let added = defs.index(
            DefinitionKind::Talents,
            &json!({ "adversary": "Something else.", "Durable": "Reduce crits." }),
        );
        assert_eq!(added, 1);
        assert_eq!(
            defs.talent("Adversary").map(|t| t.description.as_str()),
            Some("Upgrade difficulty.")
        );
        assert_eq!(defs.len(), 2);
    }

    #[test]
    fn file_names_map_to_kinds() {
        assert_eq!(
            DefinitionKind::from_file_name("Force-Powers.json"),
            Some(DefinitionKind::ForcePowers)
        );
        assert_eq!(DefinitionKind::from_file_name("thugs.json"), None);
    }
}
