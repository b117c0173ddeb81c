use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::core_api::{CoreError, TargetRecord};
use crate::grid::{self, OccupantFlags};
use crate::heuristics::{
    activation_label, characteristic_name, normalize_skill_name, skill_group_name, yes_no,
};
use crate::markup;
use crate::oggdude::types::{
    CareerData, Characteristics, SkillData, SkillModifier, SpecializationData, SpeciesData,
    TalentData,
};
use crate::reference::ReferenceIndex;

use super::feature;

const ADVERSARY_MODIFIER_ID: &str = "80ec474f-faea-4179-b19b-a66a4ba4de8b";

/// Sheet modifiers a talent applies on its own. Only "Adversary" has one.
pub fn talent_modifiers(name: &str) -> Vec<JsonValue> {
    if name.trim().eq_ignore_ascii_case("adversary") {
        vec![json!({
            "_id": ADVERSARY_MODIFIER_ID,
            "name": "Adversary",
            "recordType": "modifiers",
            "data": {
                "type": "upgradeDifficultyOfAttacksTargetingYou",
                "value": "1",
            },
        })]
    } else {
        Vec::new()
    }
}

pub(super) fn write_characteristics(data: &mut JsonMap<String, JsonValue>, chars: &Characteristics) {
    for (name, value) in Characteristics::NAMES.iter().zip(chars.values()) {
        data.insert((*name).to_string(), json!(value));
    }
}

fn starting_skills(modifiers: &[SkillModifier], index: &ReferenceIndex) -> String {
    modifiers
        .iter()
        .map(|m| {
            let skill = index.skill_name(&m.key);
            let mut sentence = format!("Begin the game with {} rank in {skill}.", m.rank_start.max(1));
            if m.rank_limit > 0 {
                sentence.push_str(&format!(
                    " They still may not train {skill} above rank {} during character creation.",
                    m.rank_limit
                ));
            }
            sentence
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn species(target: &mut TargetRecord, species: &SpeciesData, index: &ReferenceIndex) {
    let data = &mut target.data;
    write_characteristics(data, &species.characteristics);
    data.insert("woundThreshold".into(), json!(species.wound_threshold));
    data.insert("strainThreshold".into(), json!(species.strain_threshold));
    data.insert("startingXp".into(), json!(species.experience));
    data.insert(
        "startingSkills".into(),
        json!(starting_skills(&species.skill_modifiers, index)),
    );

    let mut features: Vec<JsonValue> = species
        .option_choices
        .iter()
        .flat_map(|choice| &choice.options)
        .map(|option| feature(&option.name, &markup::translate(&option.description)))
        .collect();
    for key in &species.talent_keys {
        match index.talent(key) {
            Some(talent) => features.push(feature(&talent.name, &markup::translate(&talent.description))),
            None => features.push(feature(key, "")),
        }
    }
    data.insert("features".into(), JsonValue::Array(features));
}

fn names_or_keys(keys: &[String], name: impl Fn(&str) -> String) -> String {
    keys.iter()
        .map(|key| name(key))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn career(target: &mut TargetRecord, career: &CareerData, index: &ReferenceIndex) {
    let skills = names_or_keys(&career.career_skills, |k| index.skill_name(k));
    let specializations = names_or_keys(&career.specializations, |k| {
        index.specialization_name(k).unwrap_or(k).to_string()
    });
    target.data.insert("skills".into(), json!(skills));
    target.data.insert("specializations".into(), json!(specializations));
    target.data.insert("forceRating".into(), json!(career.force_rating));
}

pub(super) fn specialization(
    target: &mut TargetRecord,
    tree: &SpecializationData,
    index: &ReferenceIndex,
    issues: &mut Vec<CoreError>,
) {
    let skills = names_or_keys(&tree.career_skills, |k| index.skill_name(k));
    target.data.insert("careerSkills".into(), json!(skills));
    let decoded = grid::decode(&tree.grid, index);
    super::report_missing_keys(&target.name, &decoded, issues);
    for row in &decoded.rows {
        target
            .data
            .insert(format!("cost{}", row.row), json!(row.cost));
    }
    decoded.write_fields(&mut target.data, &mut target.fields, OccupantFlags::default());
}

pub(super) fn talent(
    target: &mut TargetRecord,
    key: Option<&str>,
    talent: &TalentData,
    index: &ReferenceIndex,
) {
    let data = &mut target.data;
    data.insert(
        "activation".into(),
        json!(activation_label(&talent.activation)),
    );
    data.insert("ranked".into(), json!(yes_no(talent.ranked)));
    data.insert("forceTalent".into(), json!(yes_no(talent.force_talent)));
    let trees = key.map(|k| index.specialization_trees(k)).unwrap_or(&[]);
    data.insert("specializationTrees".into(), json!(trees));
    let modifiers = talent_modifiers(&target.name);
    if !modifiers.is_empty() {
        target.data.insert("modifiers".into(), JsonValue::Array(modifiers));
    }
}

pub(super) fn skill(target: &mut TargetRecord, skill: &SkillData) {
    let name = normalize_skill_name(&target.name);
    target.name = name.clone();
    target.data.insert("name".into(), json!(name));
    target.data.insert(
        "stat".into(),
        json!(characteristic_name(&skill.char_key).to_lowercase()),
    );
    target
        .data
        .insert("group".into(), json!(skill_group_name(&skill.skill_type)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_api::{CoreErrorCode, RecordType, SourceData, SourceRecord};
    use crate::grid::{Directions, GridKind, TalentGrid, TalentRow};
    use crate::oggdude::types::{OptionChoice, SpeciesOption};

    fn target(name: &str, kind: RecordType) -> TargetRecord {
        TargetRecord::new(name, kind, "camp", "Core")
    }

    fn index_with_talent(key: &str, name: &str) -> ReferenceIndex {
        let mut index = ReferenceIndex::new();
        let mut record = SourceRecord::new(
            RecordType::Talents,
            name,
            SourceData::Talent(TalentData {
                ranked: true,
                activation: "taPassive".into(),
                force_talent: false,
            }),
        );
        record.key = Some(key.into());
        record.description = "Gain [B]one[b] rank.".into();
        index.insert_record(&record);
        index
    }

    #[test]
    fn species_sheet() {
        let index = ReferenceIndex::new();
        let species_data = SpeciesData {
            characteristics: Characteristics {
                brawn: 3,
                willpower: 1,
                ..Characteristics::uniform(2)
            },
            wound_threshold: 14,
            strain_threshold: 8,
            experience: 90,
            skill_modifiers: vec![SkillModifier {
                key: "BRAWL".into(),
                rank_start: 1,
                rank_limit: 2,
            }],
            talent_keys: Vec::new(),
            option_choices: vec![OptionChoice {
                name: "Rage".into(),
                options: vec![SpeciesOption {
                    key: "WOOKABRAGE".into(),
                    name: "Rages when Wounded".into(),
                    description: "Deals +1 damage.".into(),
                }],
            }],
        };
        let mut record = target("Wookiee", RecordType::Species);
        species(&mut record, &species_data, &index);
        let data = &record.data;
        assert_eq!(data["brawn"], 3);
        assert_eq!(data["willpower"], 1);
        assert_eq!(data["startingXp"], 90);
        let skills = data["startingSkills"].as_str().expect("text");
        assert!(skills.contains("Begin the game with 1 rank in Brawl"));
        assert!(skills.contains("They still may not train Brawl above rank 2 during character creation"));
        let features = data["features"].as_array().expect("features");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["name"], "Rages when Wounded");
        assert_eq!(features[0]["recordType"], "records");
        assert_eq!(features[0]["unidentifiedName"], "Feature");
        assert!(features[0]["_id"].is_string());
        assert!(features[0]["data"]["description"].as_str().unwrap_or("").contains("<p>"));
    }

    #[test]
    fn career_resolves_names_with_key_fallback() {
        let index = ReferenceIndex::new();
        let data = CareerData {
            career_skills: vec!["BRAWL".into(), "COOL".into(), "ODDSKILL".into()],
            specializations: vec!["ARMORER".into()],
            force_rating: 1,
        };
        let mut record = target("Guardian", RecordType::Careers);
        career(&mut record, &data, &index);
        assert_eq!(record.data["skills"], "Brawl, Cool, ODDSKILL");
        assert_eq!(record.data["specializations"], "ARMORER");
        assert_eq!(record.data["forceRating"], 1);
    }

    #[test]
    fn specialization_grid_fields() {
        let index = index_with_talent("GRIT", "Grit");
        let down = Directions {
            down: true,
            ..Directions::default()
        };
        let rows = vec![
            TalentRow {
                index: Some(0),
                cost: 5,
                occupants: std::array::from_fn(|_| Some("GRIT".to_string())),
                directions: [down; 4],
                spans: [1; 4],
                costs: [5; 4],
            },
            TalentRow {
                index: Some(1),
                cost: 10,
                occupants: std::array::from_fn(|_| Some("MISSING".to_string())),
                directions: [Directions::default(); 4],
                spans: [1; 4],
                costs: [10; 4],
            },
        ];
        let tree = SpecializationData {
            career_skills: vec!["ASTRO".into()],
            grid: TalentGrid::new(GridKind::Specialization, rows),
        };
        let mut record = target("Fringer", RecordType::Specializations);
        let mut issues = Vec::new();
        specialization(&mut record, &tree, &index, &mut issues);
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|issue| issue.code == CoreErrorCode::MissingReference));
        assert!(issues[0].message.contains("'MISSING'"));
        let data = &record.data;
        assert_eq!(data["careerSkills"], "Astrogation");
        assert_eq!(data["cost1"], 5);
        assert_eq!(data["talent1_1"][0]["name"], "Grit");
        assert_eq!(data["talent1_1"][0]["data"]["cost"], 5);
        assert_eq!(data["talent1_1"][0]["data"]["ranked"], "yes");
        assert_eq!(data["talent2_3"][0]["name"], "MISSING");
        assert_eq!(data["connector1_1"], "No");
        assert_eq!(data["connector2_1"], "Yes");
    }

    #[test]
    fn adversary_talent_carries_modifier() {
        let index = index_with_talent("ADVERSARY", "Adversary");
        let mut record = target("Adversary", RecordType::Talents);
        talent(
            &mut record,
            Some("ADVERSARY"),
            &TalentData {
                ranked: true,
                activation: "taPassive".into(),
                force_talent: false,
            },
            &index,
        );
        assert_eq!(record.data["activation"], "Passive");
        assert_eq!(record.data["ranked"], "yes");
        assert_eq!(record.data["forceTalent"], "no");
        let modifier = &record.data["modifiers"][0];
        assert_eq!(modifier["_id"], ADVERSARY_MODIFIER_ID);
        assert_eq!(modifier["data"]["type"], "upgradeDifficultyOfAttacksTargetingYou");
        assert_eq!(modifier["data"]["value"], "1");
    }

    #[test]
    fn incidental_talent_is_active() {
        let index = ReferenceIndex::new();
        let mut record = target("Quick Draw", RecordType::Talents);
        talent(
            &mut record,
            None,
            &TalentData {
                activation: "taIncidental".into(),
                ..TalentData::default()
            },
            &index,
        );
        assert_eq!(record.data["activation"], "Active");
        assert!(!record.data.contains_key("modifiers"));
    }

    #[test]
    fn skill_name_is_normalized() {
        let mut record = target("Piloting - Planetary", RecordType::Skills);
        skill(
            &mut record,
            &SkillData {
                char_key: "AG".into(),
                skill_type: "stGeneral".into(),
            },
        );
        assert_eq!(record.name, "Piloting (Planetary)");
        assert_eq!(record.data["stat"], "agility");
        assert_eq!(record.data["group"], "General");
    }
}
