//! Adversary stat blocks: tiered wound and strain pools, embedded skills and
//! talents, ability features and a synthesized inventory.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value as JsonValue, json};
use tracing::debug;
use uuid::Uuid;

use crate::adversary::{AdversaryData, NamedEntry, Tier};
use crate::core_api::{CoreError, TargetRecord};
use crate::heuristics::{
    activation_label, infer_skill_check, normalize_skill_name, parse_ranked_name,
    parse_silhouette, yes_no,
};
use crate::markup;
use crate::reference::ReferenceIndex;

use super::character::{talent_modifiers, write_characteristics};
use super::{feature, inventory, missing_reference};

/// Minions are statted per individual and fielded in groups of this size.
pub const MINION_GROUP_SIZE: i64 = 3;

const FORCE_RATING: &str = "force rating";
const FORCE_POWER_PREFIX: &str = "force power:";

static TIERED_TALENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<base>.+?)\s*\((?P<tier>improved|supreme)\)$").expect("valid regex")
});

/// (wound threshold, strain threshold) for a tier.
pub fn pools(tier: Tier, wounds: i64, strain: Option<i64>) -> (i64, i64) {
    match tier {
        Tier::Minion => (wounds.saturating_mul(MINION_GROUP_SIZE), 0),
        Tier::Rival => (wounds, 0),
        Tier::Nemesis => (wounds, strain.unwrap_or(0)),
    }
}

/// One talent line after rank parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentLine {
    pub name: String,
    pub rank: Option<i64>,
    pub description: String,
}

impl TalentLine {
    fn synthesized(name: String) -> Self {
        Self {
            name,
            rank: None,
            description: String::new(),
        }
    }
}

fn tier_of(name: &str) -> Option<(String, bool)> {
    let caps = TIERED_TALENT.captures(name)?;
    let supreme = caps["tier"].eq_ignore_ascii_case("supreme");
    Some((caps["base"].to_string(), supreme))
}

/// Inserts missing lower tiers in front of every "(Improved)" and
/// "(Supreme)" talent. Existing tiers are never duplicated and unrelated
/// entries keep their order.
pub fn expand_talent_tiers(lines: Vec<TalentLine>) -> Vec<TalentLine> {
    let mut present: Vec<String> = lines.iter().map(|l| l.name.to_lowercase()).collect();
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some((base, supreme)) = tier_of(&line.name) {
            let mut wanted = vec![base.clone()];
            if supreme {
                wanted.push(format!("{base} (Improved)"));
            }
            for name in wanted {
                if !present.contains(&name.to_lowercase()) {
                    debug!(talent = %name, "adding prerequisite talent tier");
                    present.push(name.to_lowercase());
                    out.push(TalentLine::synthesized(name));
                }
            }
        }
        out.push(line);
    }
    out
}

fn talent_lines(entries: &[NamedEntry]) -> (Vec<TalentLine>, Option<i64>) {
    let mut force_rating = None;
    let mut lines = Vec::new();
    for entry in entries {
        let (name, rank) = parse_ranked_name(&entry.name);
        if name.eq_ignore_ascii_case(FORCE_RATING) {
            force_rating = rank;
            continue;
        }
        lines.push(TalentLine {
            name,
            rank,
            description: entry.description.clone(),
        });
    }
    (expand_talent_tiers(lines), force_rating)
}

fn embedded_talent(
    line: &TalentLine,
    index: &ReferenceIndex,
    adversary_name: &str,
    issues: &mut Vec<CoreError>,
) -> JsonValue {
    let info = index.talent_by_name(&line.name);
    let description = match info {
        Some(info) => info.description.clone(),
        None if !line.description.is_empty() => line.description.clone(),
        None => match index.definitions().talent(&line.name) {
            Some(entry) => entry.description.clone(),
            None => {
                debug!(talent = %line.name, "talent has no reference text");
                issues.push(missing_reference(adversary_name, "talent", &line.name));
                String::new()
            }
        },
    };
    let name = info.map_or(line.name.as_str(), |info| info.name.as_str());
    let ranked = line.rank.is_some() || info.is_some_and(|info| info.ranked);
    let rank = line.rank.unwrap_or(1);

    let mut modifiers = talent_modifiers(name);
    for modifier in &mut modifiers {
        modifier["data"]["value"] = json!(rank.to_string());
    }
    json!({
        "_id": Uuid::new_v4().to_string(),
        "name": name,
        "recordType": "talents",
        "identified": true,
        "data": {
            "name": name,
            "description": markup::translate(&description),
            "rank": rank,
            "ranked": yes_no(ranked),
            "activation": activation_label(info.map_or("", |info| info.activation.as_str())),
            "forceTalent": yes_no(info.is_some_and(|info| info.force_talent)),
            "modifiers": modifiers,
        },
    })
}

fn embedded_skill(name: &str, rank: i64) -> JsonValue {
    let name = normalize_skill_name(name);
    json!({
        "_id": Uuid::new_v4().to_string(),
        "name": name,
        "recordType": "skills",
        "identified": true,
        "data": { "name": name, "rank": rank },
    })
}

fn is_silhouette_entry(entry: &NamedEntry) -> bool {
    entry.description.is_empty() && parse_silhouette(&entry.name).is_some()
}

fn silhouette(abilities: &[NamedEntry]) -> i64 {
    abilities
        .iter()
        .find_map(|entry| {
            parse_silhouette(&entry.name).or_else(|| parse_silhouette(&entry.description))
        })
        .unwrap_or(1)
}

fn ability_feature(entry: &NamedEntry, index: &ReferenceIndex) -> JsonValue {
    let raw = if entry.description.is_empty() {
        index
            .definitions()
            .ability(&entry.name)
            .map(|def| def.description.clone())
            .unwrap_or_default()
    } else {
        entry.description.clone()
    };
    let mut value = feature(&entry.name, &markup::translate(&raw));
    let check = infer_skill_check(&raw);
    let is_force_power = entry.name.to_lowercase().starts_with(FORCE_POWER_PREFIX);
    if let Some(data) = value.get_mut("data").and_then(JsonValue::as_object_mut) {
        if let Some(skill) = check.skill {
            data.insert("skill".into(), json!(skill));
        }
        if let Some(difficulty) = check.difficulty {
            data.insert("difficulty".into(), json!(difficulty));
        }
        if is_force_power {
            data.insert("isForcePower".into(), json!(true));
        }
    }
    value
}

fn describe(name: &str, description: &str, notes: &str) -> String {
    let mut html = format!("<h2>{name}</h2>");
    html.push_str(&markup::translate(description));
    if !notes.is_empty() {
        html.push_str(&markup::translate(notes));
    }
    html
}

pub(super) fn adversary(
    target: &mut TargetRecord,
    raw_description: &str,
    stats: &AdversaryData,
    index: &ReferenceIndex,
    issues: &mut Vec<CoreError>,
) {
    let (talents, force_rating) = talent_lines(&stats.talents);
    let talents: Vec<JsonValue> = talents
        .iter()
        .map(|line| embedded_talent(line, index, &target.name, issues))
        .collect();
    let skills: Vec<JsonValue> = stats
        .skills
        .iter()
        .map(|skill| embedded_skill(&skill.name, skill.rank))
        .collect();
    let features: Vec<JsonValue> = stats
        .abilities
        .iter()
        .filter(|entry| !is_silhouette_entry(entry))
        .map(|entry| ability_feature(entry, index))
        .collect();
    let (wounds, strain) = pools(stats.tier, stats.derived.wounds, stats.derived.strain);
    let description = describe(&target.name, raw_description, &stats.notes);

    let data = &mut target.data;
    data.insert("description".into(), json!(description));
    data.insert("type".into(), json!(stats.tier.as_str()));
    data.insert("subtype".into(), json!(stats.subtype));
    data.insert("speciesName".into(), json!(stats.species_name()));
    data.insert("silhouette".into(), json!(silhouette(&stats.abilities)));
    write_characteristics(data, &stats.characteristics);
    data.insert("soakValue".into(), json!(stats.derived.soak));
    data.insert("woundThreshold".into(), json!(wounds));
    data.insert("woundsRemaining".into(), json!(wounds));
    data.insert("strainThreshold".into(), json!(strain));
    data.insert("strainRemaining".into(), json!(strain));
    data.insert("meleeDefense".into(), json!(stats.derived.melee_defense));
    data.insert("rangedDefense".into(), json!(stats.derived.ranged_defense));
    if let Some(rating) = force_rating {
        data.insert("forceRating".into(), json!(rating));
    }
    data.insert("skills".into(), JsonValue::Array(skills));
    data.insert("talents".into(), JsonValue::Array(talents));
    data.insert("features".into(), JsonValue::Array(features));
    data.insert(
        "inventory".into(),
        JsonValue::Array(inventory::build(stats, index)),
    );
    if !stats.tags.is_empty() {
        data.insert("tags".into(), json!(stats.tags));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adversary::{DefinitionKind, DerivedStats, SkillRank};
    use crate::core_api::{CoreErrorCode, RecordType};
    use crate::oggdude::types::Characteristics;

    fn line(name: &str) -> TalentLine {
        TalentLine {
            name: name.into(),
            rank: None,
            description: String::new(),
        }
    }

    fn names(lines: &[TalentLine]) -> Vec<&str> {
        lines.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn supreme_alone_gains_both_lower_tiers() {
        let expanded = expand_talent_tiers(vec![line("Parry (Supreme)")]);
        assert_eq!(
            names(&expanded),
            vec!["Parry", "Parry (Improved)", "Parry (Supreme)"]
        );
    }

    #[test]
    fn present_tiers_are_not_duplicated() {
        let expanded = expand_talent_tiers(vec![
            line("Adversary"),
            line("Parry (Improved)"),
            line("Parry (Supreme)"),
            line("Toughened"),
        ]);
        assert_eq!(
            names(&expanded),
            vec!["Adversary", "Parry", "Parry (Improved)", "Parry (Supreme)", "Toughened"]
        );
        let untouched = expand_talent_tiers(vec![line("Parry"), line("Parry (Improved)")]);
        assert_eq!(names(&untouched), vec!["Parry", "Parry (Improved)"]);
    }

    #[test]
    fn tier_pools() {
        assert_eq!(pools(Tier::Minion, 3, Some(4)), (9, 0));
        assert_eq!(pools(Tier::Rival, 14, Some(12)), (14, 0));
        assert_eq!(pools(Tier::Nemesis, 18, Some(20)), (18, 20));
        assert_eq!(pools(Tier::Nemesis, 18, None), (18, 0));
    }

    #[test]
    fn huge_minion_wounds_saturate() {
        assert_eq!(pools(Tier::Minion, i64::MAX / 2, None), (i64::MAX, 0));
        assert_eq!(pools(Tier::Minion, i64::MIN, None), (i64::MIN, 0));
    }

    fn convert(name: &str, stats: &AdversaryData, index: &ReferenceIndex) -> TargetRecord {
        let mut target = TargetRecord::new(name, RecordType::Npcs, "camp", "Core");
        adversary(&mut target, "Elite agent.", stats, index, &mut Vec::new());
        target
    }

    #[test]
    fn nemesis_stat_block() {
        let stats = AdversaryData {
            tier: Tier::Nemesis,
            characteristics: Characteristics {
                presence: 2,
                ..Characteristics::uniform(3)
            },
            derived: DerivedStats {
                soak: 3,
                wounds: 18,
                strain: Some(20),
                melee_defense: 1,
                ranged_defense: 2,
            },
            skills: vec![
                SkillRank { name: "Piloting: Space".into(), rank: 2 },
                SkillRank { name: "Ranged - Heavy".into(), rank: 4 },
            ],
            talents: vec![
                NamedEntry::new("Adversary 1", ""),
                NamedEntry::new("Force Rating 4", ""),
                NamedEntry::new("Parry 3", ""),
            ],
            abilities: vec![
                NamedEntry::new("Silhouette 2", ""),
                NamedEntry::new(
                    "Imperial Intimidation",
                    "May make an :average: Coercion check; targets add :setback:.",
                ),
                NamedEntry::new("Force Power: Enhance", "Spend :forcepip: to gain :success:."),
                NamedEntry::new("Tricky Flight", "This makes a :easy: Piloting: Plantary check"),
            ],
            tags: vec!["species:Human".into()],
            ..AdversaryData::default()
        };
        let target = convert("Imperial Assassin", &stats, &ReferenceIndex::new());
        let data = &target.data;
        assert_eq!(data["type"], "nemesis");
        assert_eq!(data["speciesName"], "Human");
        assert_eq!(data["silhouette"], 2);
        assert_eq!(data["brawn"], 3);
        assert_eq!(data["presence"], 2);
        assert_eq!(data["soakValue"], 3);
        assert_eq!(data["woundThreshold"], 18);
        assert_eq!(data["strainRemaining"], 20);
        assert_eq!(data["rangedDefense"], 2);
        assert_eq!(data["forceRating"], 4);
        let description = data["description"].as_str().expect("text");
        assert!(description.starts_with("<h2>Imperial Assassin</h2>"));

        let skills = data["skills"].as_array().expect("skills");
        assert_eq!(skills[0]["name"], "Piloting (Space)");
        assert_eq!(skills[0]["data"]["rank"], 2);
        assert_eq!(skills[1]["name"], "Ranged (Heavy)");

        let talents = data["talents"].as_array().expect("talents");
        let talent_names: Vec<&str> = talents.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(talent_names, vec!["Adversary", "Parry"]);
        assert_eq!(talents[0]["data"]["rank"], 1);
        assert_eq!(talents[0]["data"]["modifiers"][0]["data"]["value"], "1");
        assert_eq!(talents[1]["data"]["rank"], 3);

        let features = data["features"].as_array().expect("features");
        assert_eq!(features.len(), 3);
        assert_eq!(features[0]["data"]["skill"], "Coercion");
        assert_eq!(features[0]["data"]["difficulty"], "Average");
        let text = features[0]["data"]["description"].as_str().expect("text");
        assert!(text.contains("class=\"setback\""));
        assert!(!text.contains(":average:"));
        assert_eq!(features[1]["data"]["isForcePower"], true);
        assert_eq!(features[2]["data"]["skill"], "Piloting (Planetary)");
        assert_eq!(features[2]["data"]["difficulty"], "Easy");

        let inventory = data["inventory"].as_array().expect("inventory");
        assert_eq!(inventory[0]["name"], "Unarmed Combat");
    }

    #[test]
    fn minion_pools_and_definition_text() {
        let mut index = ReferenceIndex::new();
        index.definitions_mut().index(
            DefinitionKind::Abilities,
            &json!({ "Darkside Force User": "Draws on the dark side." }),
        );
        index.definitions_mut().index(
            DefinitionKind::Talents,
            &json!([{ "name": "Durable", "description": "Reduce Critical Injury results." }]),
        );
        let stats = AdversaryData {
            tier: Tier::Minion,
            derived: DerivedStats {
                soak: 2,
                wounds: 3,
                strain: Some(5),
                ..DerivedStats::default()
            },
            talents: vec![NamedEntry::new("Durable", "")],
            abilities: vec![NamedEntry::new("Darkside Force User", "")],
            ..AdversaryData::default()
        };
        let target = convert("Cultist", &stats, &index);
        let data = &target.data;
        assert_eq!(data["woundThreshold"], 9);
        assert_eq!(data["woundsRemaining"], 9);
        assert_eq!(data["strainThreshold"], 0);
        assert_eq!(data["silhouette"], 1);
        assert!(!data.contains_key("forceRating"));
        let feature_text = data["features"][0]["data"]["description"].as_str().expect("text");
        assert!(feature_text.contains("Draws on the dark side."));
        let talent_text = data["talents"][0]["data"]["description"].as_str().expect("text");
        assert!(talent_text.contains("Reduce Critical Injury results."));
        assert_eq!(data["talents"][0]["data"]["ranked"], "no");
    }

    #[test]
    fn talents_without_text_are_reported() {
        let stats = AdversaryData {
            talents: vec![NamedEntry::new("Mystery Knack", ""), NamedEntry::new("Grit", "Tough.")],
            ..AdversaryData::default()
        };
        let mut target = TargetRecord::new("Thug", RecordType::Npcs, "camp", "Core");
        let mut issues = Vec::new();
        adversary(&mut target, "", &stats, &ReferenceIndex::new(), &mut issues);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, CoreErrorCode::MissingReference);
        assert!(issues[0].message.contains("Mystery Knack"));
        assert!(issues[0].message.starts_with("Thug:"));
        assert_eq!(target.data["talents"][0]["name"], "Mystery Knack");
    }
}
