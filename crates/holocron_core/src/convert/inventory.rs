//! Adversary inventory: free-text weapon, armor and gear lines become
//! embedded item records, resolved against the item catalog where possible.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing::debug;

use crate::adversary::{AdversaryData, WeaponEntry};
use crate::heuristics::{is_melee_skill, normalize_skill_name, range_name};
use crate::reference::ReferenceIndex;

use super::embedded_item;
use super::items::{self, ItemKind};
use super::qualities;

const DEFAULT_CREDITS: i64 = 100;

/// Words that are already singular or only exist in the plural.
const PLURAL_ONLY: &[&str] = &[
    "binoculars",
    "clothes",
    "electrobinoculars",
    "goggles",
    "macrobinoculars",
    "pliers",
];

static LEADING_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[xX]?\s+(\S.*?)\s*$").expect("valid regex"));

static CREDITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:(\d[\d,]*)\s+)?credits?\s*$").expect("valid regex")
});

static ARMOR_BONUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\+\s*(\d+)\s*(soak|defen[cs]e)").expect("valid regex"));

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(([^)]*)\)\s*$").expect("valid regex"));

static ARMOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)armour").expect("valid regex"));

/// Singular form of the last word: "Frag grenades" -> "Frag grenade",
/// "Batteries" -> "Battery", "Knives" -> "Knife". "Glasses" is left alone.
pub fn singularize(name: &str) -> String {
    let name = name.trim();
    let (head, last) = match name.rsplit_once(' ') {
        Some((head, last)) => (Some(head), last),
        None => (None, name),
    };
    let lower = last.to_lowercase();
    let stem_len = |suffix: &str| last.len() - suffix.len();
    let singular = if PLURAL_ONLY.contains(&lower.as_str()) || lower.len() < 3 {
        last.to_string()
    } else if lower.ends_with("ies") && lower.len() > 4 {
        format!("{}y", &last[..stem_len("ies")])
    } else if lower.ends_with("knives") {
        format!("{}fe", &last[..stem_len("ves")])
    } else if lower.ends_with("ches") || lower.ends_with("shes") || lower.ends_with("xes") {
        last[..stem_len("es")].to_string()
    } else if ["ss", "sses", "us", "is"].iter().any(|s| lower.ends_with(s)) {
        last.to_string()
    } else if lower.ends_with('s') {
        last[..stem_len("s")].to_string()
    } else {
        last.to_string()
    };
    match head {
        Some(head) => format!("{head} {singular}"),
        None => singular,
    }
}

/// Splits a leading quantity off a line: "2 Frag grenades" -> (2, "Frag grenade").
/// Lines without a count are quantity 1. The name is singularized either way.
pub fn parse_count(text: &str) -> (i64, String) {
    match LEADING_COUNT.captures(text) {
        Some(caps) => {
            let count = caps[1].parse().unwrap_or(1).max(1);
            (count, singularize(&caps[2]))
        }
        None => (1, singularize(text)),
    }
}

/// Currency amount for "500 credits" or a bare "credits" line.
pub fn parse_credits(text: &str) -> Option<i64> {
    let caps = CREDITS.captures(text)?;
    Some(match caps.get(1) {
        Some(amount) => amount.as_str().replace(',', "").parse().unwrap_or(DEFAULT_CREDITS),
        None => DEFAULT_CREDITS,
    })
}

/// Armor written inline: "Padded armour (+2 Soak)" -> ("Padded armor", 2, 0).
/// Returns (name, soak, defense).
pub fn parse_armor(text: &str) -> (String, i64, i64) {
    let text = text.trim();
    let (name, stats) = match PARENTHETICAL.captures(text) {
        Some(caps) => {
            let start = caps.get(0).map_or(text.len(), |m| m.start());
            (&text[..start], caps[1].to_string())
        }
        None => (text, String::new()),
    };
    let mut soak: i64 = 0;
    let mut defense: i64 = 0;
    for caps in ARMOR_BONUS.captures_iter(&stats) {
        let value: i64 = caps[1].parse().unwrap_or(0);
        if caps[2].eq_ignore_ascii_case("soak") {
            soak = soak.saturating_add(value);
        } else {
            defense = defense.saturating_add(value);
        }
    }
    let name = ARMOUR.replace_all(name, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        if matched.starts_with('A') {
            "Armor"
        } else {
            "armor"
        }
    });
    (name.trim().to_string(), soak, defense)
}

/// Capitalizes each word without touching the rest of it, so model
/// numbers like "DL-44" survive.
fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Weapons,
    Armor,
    Gear,
}

#[derive(Debug)]
struct Entry {
    name: String,
    kind: ItemKind,
    data: JsonMap<String, JsonValue>,
    weapons: i64,
    armor: i64,
    gear: i64,
}

impl Entry {
    fn add(&mut self, origin: Origin, count: i64) {
        match origin {
            Origin::Weapons => self.weapons = self.weapons.saturating_add(count),
            Origin::Armor => self.armor = self.armor.saturating_add(count),
            Origin::Gear => self.gear = self.gear.saturating_add(count),
        }
    }

    /// Gear-list quantity wins when the item also came from another list.
    fn quantity(&self) -> i64 {
        if self.gear > 0 && (self.weapons > 0 || self.armor > 0) {
            self.gear
        } else {
            self.weapons
                .saturating_add(self.armor)
                .saturating_add(self.gear)
                .max(1)
        }
    }
}

#[derive(Debug, Default)]
struct Inventory {
    entries: Vec<Entry>,
}

impl Inventory {
    fn push(
        &mut self,
        origin: Origin,
        count: i64,
        name: String,
        kind: ItemKind,
        data: JsonMap<String, JsonValue>,
    ) {
        let key = name.to_lowercase();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name.to_lowercase() == key) {
            debug!(item = %name, "merging duplicate inventory line");
            entry.add(origin, count);
            return;
        }
        let mut entry = Entry {
            name,
            kind,
            data,
            weapons: 0,
            armor: 0,
            gear: 0,
        };
        entry.add(origin, count);
        self.entries.push(entry);
    }

    fn into_records(self) -> Vec<JsonValue> {
        self.entries
            .into_iter()
            .map(|entry| {
                let quantity = entry.quantity();
                let mut data = entry.data;
                data.insert("carried".into(), json!("equipped"));
                data.insert("count".into(), json!(quantity));
                if entry.kind == ItemKind::Weapon {
                    data.insert("ammo".into(), json!(quantity));
                }
                embedded_item(&entry.name, data, entry.kind)
            })
            .collect()
    }
}

/// Catalog entry by exact name, retrying with the singular form.
fn catalog_item(
    name: &str,
    index: &ReferenceIndex,
) -> Option<(String, ItemKind, JsonMap<String, JsonValue>)> {
    let record = index
        .item_by_name(name)
        .or_else(|| index.item_by_name(&singularize(name)))?;
    let (kind, data) = items::item_data(record, index)?;
    Some((record.name.clone(), kind, data))
}

fn unarmed() -> JsonMap<String, JsonValue> {
    let mut data = JsonMap::new();
    for (field, value) in [
        ("description", json!("")),
        ("type", json!("melee weapon")),
        ("subtype", json!("Unarmed")),
        ("skill", json!("Brawl")),
        ("weaponSkill", json!("Brawl")),
        ("damage", json!(0)),
        ("noAddBrawn", json!(false)),
        ("crit", json!(5)),
        ("range", json!("Engaged")),
        ("special", json!(["disorient"])),
        ("disorient", json!(1)),
        ("animation", json!("blaster")),
    ] {
        data.insert(field.into(), value);
    }
    data
}

fn range_label(range: &str) -> String {
    let range = range.trim();
    if range.starts_with("wr") {
        range_name(range)
    } else {
        capitalize_words(&range.to_lowercase())
    }
}

/// Item data for a weapon line that carries its own stat block. Melee
/// damage is stored without the wielder's brawn; the sheet adds it back.
fn ad_hoc_weapon(entry: &WeaponEntry, brawn: i64) -> JsonMap<String, JsonValue> {
    let skill = normalize_skill_name(entry.skill.as_deref().unwrap_or("Ranged (Light)"));
    let melee = is_melee_skill(&skill);
    let damage = match (entry.plus_damage, entry.damage) {
        (Some(plus), _) => plus,
        (None, Some(total)) if melee => total.saturating_sub(brawn).max(0),
        (None, Some(total)) => total,
        (None, None) => 0,
    };
    let range = entry
        .range
        .as_deref()
        .map(range_label)
        .unwrap_or_else(|| if melee { "Engaged" } else { "Short" }.to_string());

    let mut data = JsonMap::new();
    data.insert("description".into(), json!(""));
    data.insert(
        "type".into(),
        json!(if melee { "melee weapon" } else { "ranged weapon" }),
    );
    data.insert("skill".into(), json!(skill));
    data.insert("weaponSkill".into(), json!(skill));
    data.insert("damage".into(), json!(damage));
    data.insert("noAddBrawn".into(), json!(false));
    data.insert("crit".into(), json!(entry.critical.unwrap_or(0)));
    data.insert("range".into(), json!(range));
    qualities::expand_free_text(&entry.qualities).write_into(&mut data);
    let animation = if skill.eq_ignore_ascii_case("lightsaber") {
        "lightsaber"
    } else {
        "blaster"
    };
    data.insert("animation".into(), json!(animation));
    data
}

fn ad_hoc_armor(soak: i64, defense: i64) -> JsonMap<String, JsonValue> {
    let mut data = JsonMap::new();
    data.insert("description".into(), json!(""));
    data.insert("type".into(), json!("armor"));
    data.insert("soakBonus".into(), json!(soak));
    data.insert("defense".into(), json!(defense));
    data.insert("special".into(), json!([]));
    data
}

fn ad_hoc_gear() -> JsonMap<String, JsonValue> {
    let mut data = JsonMap::new();
    data.insert("description".into(), json!(""));
    data.insert("type".into(), json!("general"));
    data.insert("subtype".into(), json!("General"));
    data
}

/// The currency pack a "N credits" gear line turns into.
pub fn credits_item(amount: i64) -> JsonValue {
    let mut data = JsonMap::new();
    data.insert("description".into(), json!(""));
    data.insert("type".into(), json!("pack"));
    data.insert("cash".into(), json!(amount));
    data.insert("carried".into(), json!("equipped"));
    data.insert("count".into(), json!(1));
    embedded_item("Credits", data, ItemKind::Pack)
}

fn add_weapon(inventory: &mut Inventory, entry: &WeaponEntry, brawn: i64, index: &ReferenceIndex) {
    if entry.has_stats() {
        let data = ad_hoc_weapon(entry, brawn);
        inventory.push(Origin::Weapons, 1, entry.name.trim().to_string(), ItemKind::Weapon, data);
        return;
    }
    let (count, name) = parse_count(&entry.name);
    match catalog_item(&name, index) {
        Some((name, kind, data)) => inventory.push(Origin::Weapons, count, name, kind, data),
        None => {
            debug!(item = %name, "weapon not in item catalog, building ad-hoc entry");
            let data = ad_hoc_weapon(&WeaponEntry::named(name.clone()), brawn);
            inventory.push(Origin::Weapons, count, capitalize_words(&name), ItemKind::Weapon, data);
        }
    }
}

fn add_armor(inventory: &mut Inventory, origin: Origin, text: &str, index: &ReferenceIndex) {
    let (count, rest) = match LEADING_COUNT.captures(text) {
        Some(caps) => (caps[1].parse().unwrap_or(1), caps[2].to_string()),
        None => (1, text.to_string()),
    };
    let (name, soak, defense) = parse_armor(&rest);
    match catalog_item(&name, index) {
        Some((name, kind, data)) => inventory.push(origin, count, name, kind, data),
        None => inventory.push(
            origin,
            count,
            capitalize_words(&name),
            ItemKind::Armor,
            ad_hoc_armor(soak, defense),
        ),
    }
}

fn is_armor_line(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("armor") || lower.contains("armour") || ARMOR_BONUS.is_match(text)
}

fn add_gear(
    inventory: &mut Inventory,
    credits: &mut Vec<i64>,
    text: &str,
    index: &ReferenceIndex,
) {
    if let Some(amount) = parse_credits(text) {
        credits.push(amount);
        return;
    }
    let (count, name) = parse_count(text);
    if let Some((name, kind, data)) = catalog_item(&name, index) {
        inventory.push(Origin::Gear, count, name, kind, data);
        return;
    }
    // An unknown line may name something already carried in the weapons list.
    let display = capitalize_words(&name);
    if inventory
        .entries
        .iter()
        .any(|e| e.name.eq_ignore_ascii_case(&display))
    {
        inventory.push(Origin::Gear, count, display, ItemKind::Gear, JsonMap::new());
    } else if is_armor_line(text) {
        add_armor(inventory, Origin::Gear, text, index);
    } else {
        inventory.push(Origin::Gear, count, display, ItemKind::Gear, ad_hoc_gear());
    }
}

/// Full inventory for a stat block: unarmed combat first, then weapons,
/// armor and gear in listed order, with credits last.
pub fn build(stats: &AdversaryData, index: &ReferenceIndex) -> Vec<JsonValue> {
    let mut inventory = Inventory::default();
    inventory.push(
        Origin::Weapons,
        1,
        "Unarmed Combat".to_string(),
        ItemKind::Weapon,
        unarmed(),
    );
    let brawn = stats.characteristics.brawn;
    for weapon in &stats.weapons {
        add_weapon(&mut inventory, weapon, brawn, index);
    }
    for line in &stats.armor {
        add_armor(&mut inventory, Origin::Armor, line, index);
    }
    let mut credits = Vec::new();
    for line in &stats.gear {
        add_gear(&mut inventory, &mut credits, line, index);
    }
    let mut records = inventory.into_records();
    if !credits.is_empty() {
        records.push(credits_item(
            credits.iter().fold(0i64, |sum, amount| sum.saturating_add(*amount)),
        ));
    }
    records
}
