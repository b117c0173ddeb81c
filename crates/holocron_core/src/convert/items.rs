//! Equipment records: weapons, armor, gear and attachments. The builders
//! here are shared by the inventory and vehicle converters, which embed
//! catalog items inside non-player records.

use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::core_api::{SourceData, SourceRecord};
use crate::heuristics::{is_melee_skill, normalize_skill_name, range_name, yes_no};
use crate::markup;
use crate::oggdude::types::{
    ArmorData, AttachmentData, Commerce, GearData, ModEntry, WeaponData,
};
use crate::reference::ReferenceIndex;

use super::qualities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Weapon,
    Armor,
    Gear,
    Attachment,
    /// Currency and other containers of counted value.
    Pack,
}

/// UI property groups and the item kinds that show them.
#[rustfmt::skip]
const FIELD_GROUPS: &[(&str, &[ItemKind])] = &[
    ("animationProps",             &[ItemKind::Weapon]),
    ("armorAttachmentProperties",  &[ItemKind::Armor]),
    ("armorProperties",            &[ItemKind::Armor]),
    ("attackDividerBox",           &[ItemKind::Weapon]),
    ("consumableProperties",       &[ItemKind::Gear]),
    ("generalWeaponProperties",    &[ItemKind::Weapon]),
    ("hardpoints",                 &[ItemKind::Weapon, ItemKind::Armor]),
    ("itemQualities",              &[ItemKind::Weapon, ItemKind::Armor, ItemKind::Gear]),
    ("packProperties",             &[ItemKind::Gear, ItemKind::Pack]),
    ("weaponAttachmentProperties", &[ItemKind::Weapon, ItemKind::Attachment]),
    ("weaponProperties",           &[ItemKind::Weapon]),
];

pub fn field_hints(kind: ItemKind) -> JsonMap<String, JsonValue> {
    FIELD_GROUPS
        .iter()
        .map(|(group, kinds)| {
            (
                (*group).to_string(),
                json!({ "hidden": !kinds.contains(&kind) }),
            )
        })
        .collect()
}

fn insert_defaults(data: &mut JsonMap<String, JsonValue>, defaults: Vec<(&str, JsonValue)>) {
    for (field, value) in defaults {
        data.entry(field).or_insert(value);
    }
}

fn write_commerce(data: &mut JsonMap<String, JsonValue>, commerce: &Commerce) {
    data.insert("encumbrance".into(), json!(commerce.encumbrance));
    data.insert("price".into(), json!(commerce.price));
    data.insert("rarity".into(), json!(commerce.rarity));
    data.insert("restricted".into(), json!(yes_no(commerce.restricted)));
}

/// Damage shown on the sheet: the brawn bonus when one is declared, else
/// the flat value.
pub fn weapon_damage(weapon: &WeaponData) -> i64 {
    if weapon.damage_add > 0 {
        weapon.damage_add
    } else {
        weapon.damage
    }
}

pub fn weapon(data: &mut JsonMap<String, JsonValue>, weapon: &WeaponData, index: &ReferenceIndex) {
    let skill = normalize_skill_name(&index.skill_name(&weapon.skill_key));
    let vehicle = weapon.is_vehicle_weapon();
    let melee = !vehicle && is_melee_skill(&skill);

    data.insert(
        "type".into(),
        json!(if melee { "melee weapon" } else { "ranged weapon" }),
    );
    let subtype = if vehicle {
        "Vehicle Weapon"
    } else {
        weapon.weapon_type.as_str()
    };
    data.insert("subtype".into(), json!(subtype));
    data.insert("weaponSkill".into(), json!(skill));
    data.insert("damage".into(), json!(weapon_damage(weapon)));
    data.insert(
        "noAddBrawn".into(),
        json!(melee && weapon.damage_add == 0 && weapon.damage > 0),
    );
    data.insert("crit".into(), json!(weapon.crit));
    data.insert("range".into(), json!(range_name(&weapon.range_value)));
    write_commerce(data, &weapon.commerce);
    data.insert("hardpoints".into(), json!(weapon.commerce.hardpoints));
    qualities::expand(&weapon.qualities).write_into(data);
    let animation = if skill.eq_ignore_ascii_case("lightsaber") {
        "lightsaber"
    } else {
        "blaster"
    };
    data.insert("animation".into(), json!(animation));
    insert_defaults(
        data,
        vec![
            ("modifiers", json!([])),
            ("equipEffect", JsonValue::Null),
            ("stun", json!(0)),
            ("consumable", json!(false)),
            ("hasUseBtn", json!(false)),
            ("attachments", json!([])),
            ("slotsUsed", json!(0)),
        ],
    );
}

pub fn armor(data: &mut JsonMap<String, JsonValue>, armor: &ArmorData) {
    data.insert("type".into(), json!("armor"));
    data.insert("soakBonus".into(), json!(armor.soak));
    data.insert("defense".into(), json!(armor.defense));
    write_commerce(data, &armor.commerce);
    data.insert("hardpoints".into(), json!(armor.commerce.hardpoints));
    qualities::expand(&armor.qualities).write_into(data);
    insert_defaults(
        data,
        vec![
            ("modifiers", json!([])),
            ("equipEffect", JsonValue::Null),
            ("consumable", json!(false)),
            ("hasUseBtn", json!(false)),
            ("attachments", json!([])),
            ("slotsUsed", json!(0)),
        ],
    );
}

fn is_stimpack(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case("stimpack")
}

pub fn gear(data: &mut JsonMap<String, JsonValue>, name: &str, gear: &GearData) {
    data.insert("type".into(), json!("general"));
    let subtype = match gear.gear_type.trim() {
        "" | "Gear" => "General",
        other => other,
    };
    data.insert("subtype".into(), json!(subtype));
    write_commerce(data, &gear.commerce);
    if is_stimpack(name) {
        data.insert("consumable".into(), json!(true));
        data.insert("hasUseBtn".into(), json!(true));
        data.insert("healing".into(), json!("5"));
        data.insert("countsAsHealing".into(), json!(true));
    }
    insert_defaults(
        data,
        vec![
            ("modifiers", json!([])),
            ("consumable", json!(false)),
            ("hasUseBtn", json!(false)),
            ("attachments", json!([])),
            ("slotsUsed", json!(0)),
        ],
    );
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Talent and skill mods read the same in both mod lists.
fn keyed_line(key: &str, count: i64, index: &ReferenceIndex) -> Option<String> {
    if let Some(talent) = index.talent(key) {
        return Some(format!("Innate Talent ({})", talent.name));
    }
    if index.is_skill_key(key) {
        return Some(format!("{count} Skill ({}) Mod", index.skill_name(key)));
    }
    None
}

fn descriptor_line(key: &str, count: i64, index: &ReferenceIndex) -> String {
    let Some(descriptor) = index.descriptor(key) else {
        return if count > 1 {
            format!("{count} {key}")
        } else {
            key.to_string()
        };
    };
    let template = [&descriptor.mod_desc, &descriptor.description, &descriptor.name]
        .into_iter()
        .find(|text| !text.trim().is_empty())
        .map(String::as_str)
        .unwrap_or(key);
    let text = if template.contains("{0}") {
        template.replace("{0}", &count.to_string())
    } else if count > 1 {
        format!("{count} {template}")
    } else {
        template.to_string()
    };
    markup::plain_text(&text)
}

fn base_mod_line(entry: &ModEntry, index: &ReferenceIndex) -> Option<String> {
    if let Some(key) = entry.key.as_deref() {
        return Some(
            keyed_line(key, entry.count, index)
                .unwrap_or_else(|| descriptor_line(key, entry.count, index)),
        );
    }
    entry
        .misc_desc
        .as_deref()
        .map(markup::plain_text)
        .filter(|line| !line.is_empty())
}

fn added_mod_line(entry: &ModEntry, index: &ReferenceIndex) -> Option<String> {
    if let Some(key) = entry.key.as_deref() {
        return Some(
            keyed_line(key, entry.count, index)
                .unwrap_or_else(|| descriptor_line(key, entry.count, index)),
        );
    }
    let misc = collapse_whitespace(entry.misc_desc.as_deref()?);
    if misc.is_empty() {
        None
    } else if entry.count > 1 {
        Some(format!("{} {misc}", entry.count))
    } else {
        Some(misc)
    }
}

pub fn attachment(
    data: &mut JsonMap<String, JsonValue>,
    attachment: &AttachmentData,
    index: &ReferenceIndex,
) {
    data.insert("type".into(), json!(attachment.kind.label()));
    data.insert("slotsUsed".into(), json!(attachment.slots));
    write_commerce(data, &attachment.commerce);
    let base: Vec<String> = attachment
        .base_mods
        .iter()
        .filter_map(|entry| base_mod_line(entry, index))
        .collect();
    let added: Vec<String> = attachment
        .added_mods
        .iter()
        .filter_map(|entry| added_mod_line(entry, index))
        .collect();
    data.insert("baseModifiers".into(), json!(base.join(", ")));
    data.insert("modificationOptions".into(), json!(added.join(", ")));
    if !attachment.category_limits.is_empty() {
        data.insert(
            "categoryLimit".into(),
            json!(attachment.category_limits.join(", ")),
        );
    }
    insert_defaults(data, vec![("modifiers", json!([])), ("attachments", json!([]))]);
}

/// Data block and kind for any catalog item; `None` for non-equipment.
pub fn item_data(
    record: &SourceRecord,
    index: &ReferenceIndex,
) -> Option<(ItemKind, JsonMap<String, JsonValue>)> {
    let mut data = JsonMap::new();
    data.insert(
        "description".into(),
        json!(markup::translate(&record.description)),
    );
    let kind = match &record.data {
        SourceData::Weapon(w) => {
            weapon(&mut data, w, index);
            ItemKind::Weapon
        }
        SourceData::Armor(a) => {
            armor(&mut data, a);
            ItemKind::Armor
        }
        SourceData::Gear(g) => {
            gear(&mut data, &record.name, g);
            ItemKind::Gear
        }
        SourceData::Attachment(a) => {
            attachment(&mut data, a, index);
            ItemKind::Attachment
        }
        _ => return None,
    };
    Some((kind, data))
}
