use roxmltree::Node;

use crate::core_api::{CoreError, RecordType, SourceData, SourceRecord};

use super::types::{
    ArmorData, AttachmentData, AttachmentKind, GearData, ItemDescriptor, WeaponData,
};
use super::xml;

pub(super) fn weapon(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let data = WeaponData {
        weapon_type: xml::text(node, "Type"),
        skill_key: xml::text(node, "SkillKey"),
        damage: xml::int(node, "Damage"),
        damage_add: xml::int(node, "DamageAdd"),
        crit: xml::int(node, "Crit"),
        range_value: xml::text(node, "RangeValue"),
        categories: xml::list(node, "Categories", "Category"),
        qualities: xml::qualities(node),
        commerce: xml::commerce(node),
    };
    super::header(node, RecordType::Items, SourceData::Weapon(data))
}

pub(super) fn armor(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let data = ArmorData {
        soak: xml::int(node, "Soak"),
        defense: xml::int(node, "Defense"),
        qualities: xml::qualities(node),
        commerce: xml::commerce(node),
    };
    super::header(node, RecordType::Items, SourceData::Armor(data))
}

pub(super) fn gear(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let data = GearData {
        gear_type: xml::text(node, "Type"),
        commerce: xml::commerce(node),
    };
    super::header(node, RecordType::Items, SourceData::Gear(data))
}

pub(super) fn attachment(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let mut commerce = xml::commerce(node);
    let slots = commerce.hardpoints;
    commerce.hardpoints = 0;
    let data = AttachmentData {
        kind: AttachmentKind::from_source(&xml::text(node, "Type")),
        slots,
        category_limits: xml::list(node, "CategoryLimit", "Category"),
        base_mods: xml::mods(node, "BaseMods"),
        added_mods: xml::mods(node, "AddedMods"),
        commerce,
    };
    super::header(node, RecordType::Items, SourceData::Attachment(data))
}

pub(super) fn descriptor(node: Node<'_, '_>) -> Option<ItemDescriptor> {
    let key = xml::text(node, "Key");
    if key.is_empty() {
        return None;
    }
    Some(ItemDescriptor {
        name: xml::opt_text(node, "Name").unwrap_or_else(|| key.clone()),
        description: xml::description(node),
        mod_desc: xml::text(node, "ModDesc"),
        qual_desc: xml::text(node, "QualDesc"),
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oggdude::types::{ModEntry, QualityRef};

    fn parse<T>(xml_text: &str, f: impl Fn(Node<'_, '_>) -> T) -> T {
        let doc = roxmltree::Document::parse(xml_text).expect("xml");
        f(doc.root_element())
    }

    #[test]
    fn weapon_fields_are_read() {
        let record = parse(
            r#"<Weapon>
                <Key>BLASTPIST</Key><Name>Blaster Pistol</Name>
                <Description>[H3]Blaster Pistol[h3]</Description>
                <Source Page="162">Edge of the Empire Core Rulebook</Source>
                <Type>Energy Weapon</Type><SkillKey>RANGLT</SkillKey>
                <Damage>6</Damage><Crit>3</Crit><RangeValue>wrMedium</RangeValue>
                <Encumbrance>1</Encumbrance><HP>3</HP><Price>400</Price><Rarity>4</Rarity>
                <Qualities><Quality><Key>STUNSETTING</Key></Quality></Qualities>
            </Weapon>"#,
            weapon,
        )
        .expect("weapon");
        assert_eq!(record.name, "Blaster Pistol");
        assert_eq!(record.key.as_deref(), Some("BLASTPIST"));
        assert_eq!(record.sources, vec!["Edge of the Empire Core Rulebook"]);
        let SourceData::Weapon(data) = record.data else {
            panic!("expected weapon payload");
        };
        assert_eq!(data.skill_key, "RANGLT");
        assert_eq!(data.damage, 6);
        assert_eq!(data.commerce.hardpoints, 3);
        assert_eq!(data.qualities, vec![QualityRef::bare("STUNSETTING")]);
    }

    #[test]
    fn attachment_mods_and_slots() {
        let record = parse(
            r#"<ItemAttachment>
                <Key>CURVHILT</Key><Name>Curved Hilt</Name><Type>Weapon</Type><HP>1</HP>
                <CategoryLimit><Category>Lightsaber</Category></CategoryLimit>
                <BaseMods><Mod><MiscDesc>Add [BO] to Deception checks.</MiscDesc></Mod></BaseMods>
                <AddedMods><Mod><Key>DEFENSIVE</Key><Count>1</Count></Mod></AddedMods>
            </ItemAttachment>"#,
            attachment,
        )
        .expect("attachment");
        let SourceData::Attachment(data) = record.data else {
            panic!("expected attachment payload");
        };
        assert_eq!(data.kind, AttachmentKind::Weapon);
        assert_eq!(data.slots, 1);
        assert_eq!(data.category_limits, vec!["Lightsaber"]);
        assert_eq!(data.base_mods[0].misc_desc.as_deref(), Some("Add [BO] to Deception checks."));
        assert_eq!(
            data.added_mods[0],
            ModEntry {
                key: Some("DEFENSIVE".into()),
                count: 1,
                misc_desc: None
            }
        );
    }

    #[test]
    fn missing_name_is_malformed() {
        let err = parse("<Gear><Key>X</Key></Gear>", gear).expect_err("no name");
        assert_eq!(err.code, crate::core_api::CoreErrorCode::MalformedSource);
    }
}
