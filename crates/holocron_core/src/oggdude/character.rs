use roxmltree::Node;

use crate::core_api::{CoreError, RecordType, SourceData, SourceRecord};
use crate::grid::{GridKind, TalentGrid};

use super::types::{
    CareerData, Characteristics, OptionChoice, SkillData, SkillModifier, SpecializationData,
    SpeciesData, SpeciesOption, TalentData,
};
use super::{powers, xml};

pub(super) fn species(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let mut characteristics = Characteristics::default();
    if let Some(chars) = xml::child(node, "StartingChars") {
        for name in Characteristics::NAMES {
            let tag = title_case(name);
            if let Some(value) = xml::opt_text(chars, &tag).and_then(|v| xml::parse_int(&v)) {
                characteristics.set(name, value);
            }
        }
    }
    let attrs = xml::child(node, "StartingAttrs");
    let attr = |tag: &str| attrs.map(|a| xml::int(a, tag)).unwrap_or(0);

    let skill_modifiers = xml::child(node, "SkillModifiers")
        .map(|container| {
            xml::children(container, "SkillModifier")
                .map(|m| SkillModifier {
                    key: xml::text(m, "Key"),
                    rank_start: xml::int(m, "RankStart"),
                    rank_limit: xml::int(m, "RankLimit"),
                })
                .filter(|m| !m.key.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let option_choices = xml::child(node, "OptionChoices")
        .map(|container| {
            xml::children(container, "OptionChoice")
                .map(|choice| OptionChoice {
                    name: xml::text(choice, "Name"),
                    options: xml::child(choice, "Options")
                        .map(|options| {
                            xml::children(options, "Option")
                                .map(|o| SpeciesOption {
                                    key: xml::text(o, "Key"),
                                    name: xml::text(o, "Name"),
                                    description: xml::description(o),
                                })
                                .filter(|o| !o.name.is_empty())
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    let data = SpeciesData {
        characteristics,
        wound_threshold: attr("WoundThreshold"),
        strain_threshold: attr("StrainThreshold"),
        experience: attr("Experience"),
        skill_modifiers,
        talent_keys: xml::nested_keys(node, "TalentModifiers", "TalentModifier"),
        option_choices,
    };
    super::header(node, RecordType::Species, SourceData::Species(data))
}

pub(super) fn career(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let data = CareerData {
        career_skills: xml::list(node, "CareerSkills", "Key"),
        specializations: xml::list(node, "Specializations", "Key"),
        force_rating: xml::int(node, "ForceRating"),
    };
    super::header(node, RecordType::Careers, SourceData::Career(data))
}

pub(super) fn specialization(
    node: Node<'_, '_>,
    issues: &mut Vec<CoreError>,
) -> Result<SourceRecord, CoreError> {
    let rows = powers::rows(node, powers::RowLayout::TALENTS, issues);
    let data = SpecializationData {
        career_skills: xml::list(node, "CareerSkills", "Key"),
        grid: TalentGrid::new(GridKind::Specialization, rows),
    };
    super::header(
        node,
        RecordType::Specializations,
        SourceData::Specialization(data),
    )
}

pub(super) fn talent(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let data = TalentData {
        ranked: xml::flag(node, "Ranked"),
        activation: xml::text(node, "ActivationValue"),
        force_talent: xml::flag(node, "ForceTalent"),
    };
    super::header(node, RecordType::Talents, SourceData::Talent(data))
}

pub(super) fn skill(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let data = SkillData {
        char_key: xml::text(node, "CharKey"),
        skill_type: xml::text(node, "TypeValue"),
    };
    super::header(node, RecordType::Skills, SourceData::Skill(data))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
