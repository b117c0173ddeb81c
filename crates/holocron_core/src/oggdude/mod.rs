//! OggDude XML reader. One schema per entity kind; a file holds either a
//! single entity as its root element or a plural wrapper of entities.

mod character;
mod items;
mod powers;
pub mod types;
mod vehicle;
mod xml;

use std::path::Path;

use roxmltree::Node;
use tracing::debug;

use crate::core_api::{CoreError, CoreErrorCode, RecordType, SourceData, SourceRecord};

use types::ReferenceEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    Weapon,
    Armor,
    Gear,
    Attachment,
    Species,
    Career,
    Specialization,
    Talent,
    ForcePower,
    SignatureAbility,
    Skill,
    Vehicle,
    Descriptor,
    ForceAbility,
    SignatureNode,
    VehicleAction,
}

impl Entity {
    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "Weapon" => Entity::Weapon,
            "Armor" => Entity::Armor,
            "Gear" => Entity::Gear,
            "ItemAttachment" => Entity::Attachment,
            "Species" => Entity::Species,
            "Career" => Entity::Career,
            "Specialization" => Entity::Specialization,
            "Talent" => Entity::Talent,
            "ForcePower" => Entity::ForcePower,
            "SigAbility" => Entity::SignatureAbility,
            "Skill" => Entity::Skill,
            "Vehicle" => Entity::Vehicle,
            "ItemDescriptor" => Entity::Descriptor,
            "ForceAbility" => Entity::ForceAbility,
            "SigAbilityNode" => Entity::SignatureNode,
            "VehAction" => Entity::VehicleAction,
            _ => return None,
        })
    }
}

/// Everything one XML file contributed.
#[derive(Debug, Default)]
pub struct XmlFile {
    pub records: Vec<SourceRecord>,
    pub references: Vec<ReferenceEntry>,
    pub issues: Vec<CoreError>,
}

impl XmlFile {
    fn read(&mut self, entity: Entity, node: Node<'_, '_>) {
        let issues = &mut self.issues;
        let record = match entity {
            Entity::Weapon => items::weapon(node),
            Entity::Armor => items::armor(node),
            Entity::Gear => items::gear(node),
            Entity::Attachment => items::attachment(node),
            Entity::Species => character::species(node),
            Entity::Career => character::career(node),
            Entity::Specialization => character::specialization(node, issues),
            Entity::Talent => character::talent(node),
            Entity::ForcePower => powers::force_power(node, issues),
            Entity::SignatureAbility => powers::signature_ability(node, issues),
            Entity::Skill => character::skill(node),
            Entity::Vehicle => vehicle::vehicle(node),
            Entity::Descriptor => {
                self.references
                    .extend(items::descriptor(node).map(ReferenceEntry::Descriptor));
                return;
            }
            Entity::ForceAbility => {
                self.references
                    .extend(powers::ability_text(node).map(ReferenceEntry::ForceAbility));
                return;
            }
            Entity::SignatureNode => {
                self.references
                    .extend(powers::ability_text(node).map(ReferenceEntry::SignatureNode));
                return;
            }
            Entity::VehicleAction => {
                self.references
                    .extend(powers::ability_text(node).map(ReferenceEntry::VehicleAction));
                return;
            }
        };
        match record {
            Ok(record) => self.records.push(record),
            Err(err) => self.issues.push(err),
        }
    }
}

/// Parses one XML document. A document that is not well-formed is an
/// error; problems with single entities are collected in `issues`.
pub fn parse_document(text: &str, origin: &Path) -> Result<XmlFile, CoreError> {
    let text = text.trim_start_matches('\u{feff}');
    let doc = roxmltree::Document::parse(text).map_err(|e| {
        CoreError::new(
            CoreErrorCode::MalformedSource,
            format!("failed to parse {}: {e}", origin.display()),
        )
    })?;
    let root = doc.root_element();
    let mut out = XmlFile::default();

    if let Some(entity) = Entity::from_tag(root.tag_name().name()) {
        out.read(entity, root);
    } else {
        for child in root.children().filter(|c| c.is_element()) {
            if let Some(entity) = Entity::from_tag(child.tag_name().name()) {
                out.read(entity, child);
            }
        }
    }
    for issue in &mut out.issues {
        issue.message = format!("{}: {}", origin.display(), issue.message);
    }
    debug!(
        path = %origin.display(),
        records = out.records.len(),
        references = out.references.len(),
        "parsed xml"
    );
    Ok(out)
}

/// Shared envelope fields; an entity without a name is malformed.
fn header(
    node: Node<'_, '_>,
    record_type: RecordType,
    data: SourceData,
) -> Result<SourceRecord, CoreError> {
    let name = xml::text(node, "Name");
    if name.is_empty() {
        let key = xml::text(node, "Key");
        return Err(CoreError::new(
            CoreErrorCode::MalformedSource,
            format!("<{}> {key} has no Name", node.tag_name().name()),
        ));
    }
    let mut record = SourceRecord::new(record_type, name, data);
    record.key = xml::opt_text(node, "Key");
    record.description = xml::description(node);
    record.sources = xml::sources(node);
    Ok(record)
}
