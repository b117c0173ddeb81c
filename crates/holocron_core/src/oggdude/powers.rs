use roxmltree::Node;

use crate::core_api::{CoreError, RecordType, SourceData, SourceRecord};
use crate::grid::{GRID_WIDTH, GridKind, RawRow, TalentGrid, TalentRow};

use super::types::{AbilityText, ForcePowerData, SignatureAbilityData};
use super::xml;

/// Element names of one flavour of grid row.
#[derive(Debug, Clone, Copy)]
pub(super) struct RowLayout {
    container: &'static str,
    row: &'static str,
    keys: &'static str,
    spans: Option<(&'static str, &'static str)>,
    costs: Option<(&'static str, &'static str)>,
}

impl RowLayout {
    pub(super) const TALENTS: RowLayout = RowLayout {
        container: "TalentRows",
        row: "TalentRow",
        keys: "Talents",
        spans: None,
        costs: None,
    };

    pub(super) const ABILITIES: RowLayout = RowLayout {
        container: "AbilityRows",
        row: "AbilityRow",
        keys: "Abilities",
        spans: Some(("AbilitySpan", "Span")),
        costs: Some(("Costs", "Cost")),
    };
}

pub(super) fn rows(
    node: Node<'_, '_>,
    layout: RowLayout,
    issues: &mut Vec<CoreError>,
) -> Vec<TalentRow> {
    let Some(container) = xml::child(node, layout.container) else {
        return Vec::new();
    };
    xml::children(container, layout.row)
        .map(|row| {
            let raw = RawRow {
                index: xml::opt_text(row, "Index")
                    .and_then(|v| xml::parse_int(&v))
                    .and_then(|v| u32::try_from(v).ok()),
                cost: xml::opt_text(row, "Cost").and_then(|v| xml::parse_int(&v)),
                keys: xml::list(row, layout.keys, "Key"),
                directions: xml::directions(row),
                spans: layout
                    .spans
                    .map(|(c, i)| {
                        xml::int_list(row, c, i)
                            .into_iter()
                            .map(|s| u8::try_from(s.max(0)).unwrap_or(u8::MAX))
                            .collect()
                    })
                    .unwrap_or_default(),
                costs: layout
                    .costs
                    .map(|(c, i)| xml::int_list(row, c, i))
                    .unwrap_or_default(),
            };
            let (row, issue) = TalentRow::from_raw(raw);
            if let Some(mut issue) = issue {
                issue.message = format!("{}: {}", xml::text(node, "Key"), issue.message);
                issues.push(issue);
            }
            row
        })
        .collect()
}

pub(super) fn force_power(
    node: Node<'_, '_>,
    issues: &mut Vec<CoreError>,
) -> Result<SourceRecord, CoreError> {
    let rows = rows(node, RowLayout::ABILITIES, issues);
    let data = ForcePowerData {
        min_force_rating: xml::int(node, "MinForceRating").max(1),
        grid: TalentGrid::new(GridKind::ForcePower, rows),
    };
    super::header(node, RecordType::ForcePowers, SourceData::ForcePower(data))
}

pub(super) fn signature_ability(
    node: Node<'_, '_>,
    issues: &mut Vec<CoreError>,
) -> Result<SourceRecord, CoreError> {
    let rows = rows(node, RowLayout::ABILITIES, issues);
    let mut grid = TalentGrid::new(GridKind::SignatureAbility, rows);
    for (col, on) in xml::flag_list(node, "MatchingNodes", "Node")
        .into_iter()
        .take(GRID_WIDTH)
        .enumerate()
    {
        grid.matching_nodes[col] = on;
    }
    let data = SignatureAbilityData {
        careers: xml::list(node, "Careers", "Key"),
        grid,
    };
    super::header(
        node,
        RecordType::SignatureAbilities,
        SourceData::SignatureAbility(data),
    )
}

/// Keyed ability text: ForceAbility, SigAbilityNode and VehAction entries.
pub(super) fn ability_text(node: Node<'_, '_>) -> Option<AbilityText> {
    let key = xml::text(node, "Key");
    if key.is_empty() {
        return None;
    }
    Some(AbilityText {
        name: xml::opt_text(node, "Name").unwrap_or_else(|| key.clone()),
        description: xml::description(node),
        key,
    })
}
