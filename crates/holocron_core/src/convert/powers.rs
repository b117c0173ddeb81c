//! Force powers and signature abilities: a base ability anchor plus a grid
//! of upgrades.

use serde_json::json;

use crate::core_api::{CoreError, TargetRecord};
use crate::grid::{self, DecodedGrid, DecodedRow, OccupantFlags};
use crate::heuristics::infer_skill_check;
use crate::markup;
use crate::oggdude::types::{ForcePowerData, SignatureAbilityData};
use crate::reference::ReferenceIndex;

/// Cost of unlocking the power itself: the highest cost in the base row.
fn base_cost(base: Option<&DecodedRow>) -> i64 {
    base.map(|row| row.slots.iter().map(|slot| slot.cost).max().unwrap_or(row.cost))
        .unwrap_or(0)
}

fn base_key(decoded: &DecodedGrid) -> Option<&str> {
    decoded
        .base
        .as_ref()?
        .slots
        .iter()
        .find_map(|slot| slot.occupant.as_ref())
        .map(|occupant| occupant.key.as_str())
}

/// Record description followed by the base ability block.
fn describe(description: &str, decoded: &DecodedGrid) -> String {
    let mut html = markup::translate(description);
    let base = decoded
        .base
        .as_ref()
        .and_then(|row| row.slots.iter().find_map(|slot| slot.occupant.as_ref()));
    if let Some(base) = base {
        html.push_str("<p><strong>Base Ability:</strong> ");
        html.push_str(&base.name);
        html.push_str("</p>");
        html.push_str(&base.description);
    }
    html
}

pub(super) fn force_power(
    target: &mut TargetRecord,
    raw_description: &str,
    power: &ForcePowerData,
    index: &ReferenceIndex,
    issues: &mut Vec<CoreError>,
) {
    let decoded = grid::decode(&power.grid, index);
    super::report_missing_keys(&target.name, &decoded, issues);
    let description = describe(raw_description, &decoded);
    let data = &mut target.data;
    data.insert("description".into(), json!(description));
    data.insert("cost".into(), json!(base_cost(decoded.base.as_ref())));
    data.insert("minForceRating".into(), json!(power.min_force_rating));
    data.insert(
        "prereqs".into(),
        json!(format!("Force Rating {}+", power.min_force_rating)),
    );
    decoded.write_fields(
        &mut target.data,
        &mut target.fields,
        OccupantFlags {
            force_power_upgrade: true,
            ..OccupantFlags::default()
        },
    );
}

pub(super) fn signature_ability(
    target: &mut TargetRecord,
    raw_description: &str,
    ability: &SignatureAbilityData,
    index: &ReferenceIndex,
    issues: &mut Vec<CoreError>,
) {
    let decoded = grid::decode(&ability.grid, index);
    super::report_missing_keys(&target.name, &decoded, issues);
    let description = describe(raw_description, &decoded);

    let base_text = base_key(&decoded)
        .and_then(|key| index.signature_node(key))
        .map(|node| node.description.clone())
        .unwrap_or_default();
    let mut check = infer_skill_check(&base_text);
    if check.is_empty() {
        check = infer_skill_check(raw_description);
    }

    let careers: Vec<String> = ability
        .careers
        .iter()
        .map(|key| index.career_name(key).unwrap_or(key).to_string())
        .collect();

    let data = &mut target.data;
    data.insert("description".into(), json!(description));
    data.insert("cost".into(), json!(base_cost(decoded.base.as_ref())));
    data.insert(
        "career".into(),
        json!(careers.first().cloned().unwrap_or_default()),
    );
    if careers.len() > 1 {
        data.insert("careers".into(), json!(careers));
    }
    data.insert("skill".into(), json!(check.skill.unwrap_or_default()));
    data.insert(
        "difficulty".into(),
        json!(check.difficulty.unwrap_or_default()),
    );
    decoded.write_fields(
        &mut target.data,
        &mut target.fields,
        OccupantFlags {
            signature_ability_upgrade: true,
            ..OccupantFlags::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_api::{RecordType, SourceData, SourceRecord};
    use crate::grid::{Directions, GridKind, TalentGrid, TalentRow};
    use crate::oggdude::types::{AbilityText, CareerData, ReferenceEntry};

    fn row(keys: [&str; 4], spans: [u8; 4], costs: [i64; 4], down: [bool; 4], right: [bool; 4]) -> TalentRow {
        TalentRow {
            index: Some(0),
            cost: costs[0],
            occupants: keys.map(|k| Some(k.to_string())),
            directions: std::array::from_fn(|c| Directions {
                down: down[c],
                right: right[c],
                ..Directions::default()
            }),
            spans,
            costs,
        }
    }

    fn force_index() -> ReferenceIndex {
        let mut index = ReferenceIndex::new();
        for (key, name, text) in [
            ("MOVEBASIC", "Move Basic Power", "Move objects with [FP]."),
            ("MOVEMAG", "Magnitude", "More objects."),
            ("MOVESTR", "Strength", "Heavier objects."),
            ("MOVERAN", "Range", "Further objects."),
            ("MOVECON", "Control", "Throw objects."),
        ] {
            index.insert_reference(ReferenceEntry::ForceAbility(AbilityText {
                key: key.into(),
                name: name.into(),
                description: text.into(),
            }));
        }
        index
    }

    fn move_power() -> ForcePowerData {
        let none = [false; 4];
        ForcePowerData {
            min_force_rating: 1,
            grid: TalentGrid::new(
                GridKind::ForcePower,
                vec![
                    row(["MOVEBASIC"; 4], [4, 0, 0, 0], [10, 0, 0, 0], [true; 4], none),
                    row(
                        ["MOVEMAG", "MOVESTR", "MOVERAN", "MOVERAN"],
                        [1; 4],
                        [5; 4],
                        [false, true, true, false],
                        none,
                    ),
                    row(
                        ["MOVECON", "MOVEMAG", "MOVESTR", "MOVESTR"],
                        [1, 1, 2, 0],
                        [10; 4],
                        none,
                        [true, false, false, false],
                    ),
                ],
            ),
        }
    }

    #[test]
    fn move_force_power_fields() {
        let index = force_index();
        let mut record = TargetRecord::new("Move", RecordType::ForcePowers, "camp", "Core");
        force_power(&mut record, "Telekinesis.", &move_power(), &index, &mut Vec::new());
        let data = &record.data;
        assert_eq!(data["cost"], 10);
        assert_eq!(data["prereqs"], "Force Rating 1+");
        let description = data["description"].as_str().expect("text");
        assert!(description.contains("<strong>Base Ability:</strong>"));
        assert!(!data.contains_key("talent0_1"));
        for (field, name) in [
            ("talent1_1", "Magnitude"),
            ("talent1_2", "Strength"),
            ("talent1_3", "Range"),
            ("talent1_4", "Range"),
        ] {
            let occupant = &data[field][0];
            assert_eq!(occupant["name"], name);
            assert_eq!(occupant["data"]["forceTalent"], "yes");
            assert_eq!(occupant["data"]["forcePowerUpgrade"], "yes");
        }
        assert_eq!(data["connector1_1"], "Yes");
        assert_eq!(data["connector2_2"], "Yes");
        assert_eq!(data["connector2_1"], "No");
        assert_eq!(data["hide2_4"], "Yes");
        assert_eq!(data["talent2_4"], json!([]));
        assert_eq!(record.fields["talent2_4"]["hidden"], true);
        assert_eq!(data["h_connector2_2"], "Yes");
        assert_eq!(data["h_connector2_4"], "No");
    }

    #[test]
    fn signature_ability_career_and_check() {
        let mut index = ReferenceIndex::new();
        let mut career = SourceRecord::new(
            RecordType::Careers,
            "Smuggler",
            SourceData::Career(CareerData::default()),
        );
        career.key = Some("SMUG".into());
        index.insert_record(&career);
        index.insert_reference(ReferenceEntry::SignatureNode(AbilityText {
            key: "NEBASE".into(),
            name: "Narrow Escape Basic".into(),
            description: "The character makes a Hard ([DI][DI][DI]) Streetwise check.".into(),
        }));
        let mut grid = TalentGrid::new(
            GridKind::SignatureAbility,
            vec![
                row(["NEBASE"; 4], [4, 0, 0, 0], [30, 0, 0, 0], [false, true, true, false], [false; 4]),
                row(["A", "B", "C", "D"], [1; 4], [10; 4], [false; 4], [true, false, true, false]),
            ],
        );
        grid.matching_nodes = [false, true, true, false];
        let ability = SignatureAbilityData {
            careers: vec!["SMUG".into()],
            grid,
        };
        let mut record = TargetRecord::new("Narrow Escape", RecordType::SignatureAbilities, "camp", "Core");
        signature_ability(&mut record, "Get away.", &ability, &index, &mut Vec::new());
        let data = &record.data;
        assert_eq!(data["career"], "Smuggler");
        assert_eq!(data["cost"], 30);
        assert_eq!(data["skill"], "Streetwise");
        assert_eq!(data["difficulty"], "Hard");
        assert_eq!(data["connector0_1"], "No");
        assert_eq!(data["connector0_2"], "Yes");
        assert_eq!(data["connector1_2"], "Yes");
        assert_eq!(data["h_connector1_2"], "Yes");
        assert_eq!(data["h_connector1_3"], "No");
        assert_eq!(data["talent1_1"][0]["data"]["signatureAbilityUpgrade"], "yes");
        assert!(!data.contains_key("talent0_1"));
    }
}
