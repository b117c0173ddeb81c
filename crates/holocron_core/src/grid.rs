//! Talent-tree grid codec.
//!
//! Specialization trees, force powers and signature abilities all arrive as
//! flat rows of four columns with per-column keys, directions and spans.
//! [`decode`] turns them into slot, connector and hide maps addressed by
//! (row, column), which [`DecodedGrid::write_fields`] then lays out as the
//! `talent{r}_{c}` / `connector{r}_{c}` / `h_connector{r}_{c}` / `hide{r}_{c}`
//! record fields.

use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing::warn;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::heuristics::yes_no;

pub const GRID_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    Specialization,
    ForcePower,
    SignatureAbility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentRow {
    pub index: Option<u32>,
    pub cost: i64,
    pub occupants: [Option<String>; GRID_WIDTH],
    pub directions: [Directions; GRID_WIDTH],
    pub spans: [u8; GRID_WIDTH],
    pub costs: [i64; GRID_WIDTH],
}

/// Raw per-column arrays of one row as read from the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub index: Option<u32>,
    pub cost: Option<i64>,
    pub keys: Vec<String>,
    pub directions: Vec<Directions>,
    pub spans: Vec<u8>,
    pub costs: Vec<i64>,
}

impl TalentRow {
    /// Builds a four-column row, clamping longer arrays and padding shorter
    /// ones. Any mismatch is reported as a structural inconsistency.
    pub fn from_raw(raw: RawRow) -> (Self, Option<CoreError>) {
        let mut problems = Vec::new();
        let mut check = |label: &str, len: usize, optional: bool| {
            if len > GRID_WIDTH || (len < GRID_WIDTH && !(optional && len == 0)) {
                problems.push(format!("{label} has {len} entries"));
            }
        };
        check("keys", raw.keys.len(), false);
        check("directions", raw.directions.len(), true);
        check("spans", raw.spans.len(), true);
        check("costs", raw.costs.len(), true);

        let cost = raw
            .cost
            .or_else(|| raw.costs.first().copied())
            .unwrap_or(0);
        let mut row = TalentRow {
            index: raw.index,
            cost,
            occupants: Default::default(),
            directions: [Directions::default(); GRID_WIDTH],
            spans: [1; GRID_WIDTH],
            costs: [cost; GRID_WIDTH],
        };
        for (col, key) in raw.keys.into_iter().take(GRID_WIDTH).enumerate() {
            let key = key.trim().to_string();
            row.occupants[col] = (!key.is_empty()).then_some(key);
        }
        for (col, dir) in raw.directions.into_iter().take(GRID_WIDTH).enumerate() {
            row.directions[col] = dir;
        }
        for (col, span) in raw.spans.into_iter().take(GRID_WIDTH).enumerate() {
            row.spans[col] = span;
        }
        for (col, c) in raw.costs.into_iter().take(GRID_WIDTH).enumerate() {
            row.costs[col] = c;
        }

        let issue = (!problems.is_empty()).then(|| {
            let message = format!("grid row clamped to {GRID_WIDTH} columns: {}", problems.join(", "));
            warn!(index = ?row.index, "{message}");
            CoreError::new(CoreErrorCode::StructuralInconsistency, message)
        });
        (row, issue)
    }

    fn is_hidden(&self, col: usize) -> bool {
        self.spans[col] == 0
    }

    /// Column whose slot visually covers `col`.
    fn owner_of(&self, col: usize) -> usize {
        let mut owner = col;
        while owner > 0 && self.spans[owner] == 0 {
            owner -= 1;
        }
        owner
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentGrid {
    pub kind: GridKind,
    pub rows: Vec<TalentRow>,
    /// Base-row connectors for signature abilities.
    pub matching_nodes: [bool; GRID_WIDTH],
}

impl TalentGrid {
    pub fn new(kind: GridKind, rows: Vec<TalentRow>) -> Self {
        Self {
            kind,
            rows,
            matching_nodes: [false; GRID_WIDTH],
        }
    }

    fn has_base_row(&self) -> bool {
        matches!(self.kind, GridKind::ForcePower | GridKind::SignatureAbility)
    }
}

/// Display data for one grid occupant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupant {
    pub key: String,
    pub name: String,
    /// Rich-text description.
    pub description: String,
    pub activation: String,
    pub ranked: bool,
    pub force_talent: bool,
    pub specialization_trees: Vec<String>,
    pub resolved: bool,
}

impl Occupant {
    pub fn placeholder(key: &str) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            activation: "Passive".to_string(),
            ..Self::default()
        }
    }
}

pub trait OccupantLookup {
    fn occupant(&self, kind: GridKind, key: &str) -> Option<Occupant>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSlot {
    pub occupant: Option<Occupant>,
    pub hidden: bool,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    pub row: usize,
    pub cost: i64,
    pub slots: [GridSlot; GRID_WIDTH],
    pub connectors: [bool; GRID_WIDTH],
    /// Connector between column `c` and `c + 1`.
    pub h_connectors: [bool; GRID_WIDTH - 1],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGrid {
    pub kind: GridKind,
    /// Base ability anchor (row 0) for force powers and signature abilities.
    pub base: Option<DecodedRow>,
    pub base_connectors: Option<[bool; GRID_WIDTH]>,
    pub rows: Vec<DecodedRow>,
    pub missing_keys: Vec<String>,
}

fn ordered_rows(rows: &[TalentRow]) -> (Vec<&TalentRow>, bool) {
    let first = rows.first().map(|r| r.index.unwrap_or(0));
    let varies = rows.iter().any(|r| Some(r.index.unwrap_or(0)) != first);
    let mut ordered: Vec<&TalentRow> = rows.iter().collect();
    if varies {
        ordered.sort_by_key(|r| r.index.unwrap_or(0));
    }
    (ordered, varies)
}

fn decode_row(
    kind: GridKind,
    row_number: usize,
    row: &TalentRow,
    above: Option<&TalentRow>,
    lookup: &dyn OccupantLookup,
    missing: &mut Vec<String>,
) -> DecodedRow {
    let slots: [GridSlot; GRID_WIDTH] = std::array::from_fn(|col| {
        if row.is_hidden(col) {
            return GridSlot {
                occupant: None,
                hidden: true,
                cost: row.costs[col],
            };
        }
        let occupant = row.occupants[col].as_deref().map(|key| {
            lookup.occupant(kind, key).unwrap_or_else(|| {
                warn!(key, "grid occupant missing from reference index");
                missing.push(key.to_string());
                Occupant::placeholder(key)
            })
        });
        GridSlot {
            occupant,
            hidden: false,
            cost: row.costs[col],
        }
    });
    let connectors = std::array::from_fn(|col| above.is_some_and(|a| a.directions[col].down));
    let h_connectors = std::array::from_fn(|gap| {
        let right_col = gap + 1;
        if row.is_hidden(right_col) {
            return false;
        }
        row.directions[row.owner_of(gap)].right
    });
    DecodedRow {
        row: row_number,
        cost: row.cost,
        slots,
        connectors,
        h_connectors,
    }
}

/// Decodes a grid into addressed slots and connectors. Deterministic for a
/// given grid and lookup.
pub fn decode(grid: &TalentGrid, lookup: &dyn OccupantLookup) -> DecodedGrid {
    let (ordered, varies) = ordered_rows(&grid.rows);
    let mut missing = Vec::new();
    let mut rows = Vec::new();
    let mut base = None;
    let mut base_connectors = None;

    if grid.has_base_row() {
        let mut iter = ordered.into_iter();
        let Some(base_row) = iter.next() else {
            return DecodedGrid {
                kind: grid.kind,
                base: None,
                base_connectors: None,
                rows,
                missing_keys: missing,
            };
        };
        base = Some(decode_row(grid.kind, 0, base_row, None, lookup, &mut missing));
        if grid.kind == GridKind::SignatureAbility {
            base_connectors = Some(grid.matching_nodes);
        }
        let mut above = base_row;
        for (pos, row) in iter.enumerate() {
            rows.push(decode_row(grid.kind, pos + 1, row, Some(above), lookup, &mut missing));
            above = row;
        }
    } else {
        let mut above: Option<&TalentRow> = None;
        for (pos, row) in ordered.into_iter().enumerate() {
            let number = if varies {
                (row.index.unwrap_or(0) as usize).saturating_add(1)
            } else {
                pos + 1
            };
            rows.push(decode_row(grid.kind, number, row, above, lookup, &mut missing));
            above = Some(row);
        }
    }

    DecodedGrid {
        kind: grid.kind,
        base,
        base_connectors,
        rows,
        missing_keys: missing,
    }
}

/// Extra flags stamped on every occupant's data block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccupantFlags {
    pub force_power_upgrade: bool,
    pub signature_ability_upgrade: bool,
}

fn yes_no_field(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn occupant_json(occupant: &Occupant, cost: i64, kind: GridKind, flags: OccupantFlags) -> JsonValue {
    let mut data = JsonMap::new();
    data.insert("name".into(), json!(occupant.name));
    data.insert("description".into(), json!(occupant.description));
    data.insert("cost".into(), json!(cost));
    data.insert("activation".into(), json!(occupant.activation));
    data.insert("ranked".into(), json!(yes_no(occupant.ranked)));
    let force_talent = occupant.force_talent || kind == GridKind::ForcePower;
    data.insert("forceTalent".into(), json!(yes_no(force_talent)));
    data.insert(
        "specializationTrees".into(),
        json!(occupant.specialization_trees),
    );
    if flags.force_power_upgrade {
        data.insert("forcePowerUpgrade".into(), json!("yes"));
    }
    if flags.signature_ability_upgrade {
        data.insert("signatureAbilityUpgrade".into(), json!("yes"));
    }
    json!({
        "name": occupant.name,
        "recordType": "talents",
        "data": JsonValue::Object(data),
    })
}

impl DecodedGrid {
    /// Writes the `talent` / `connector` / `h_connector` / `hide` fields and
    /// the matching UI field hints.
    pub fn write_fields(
        &self,
        data: &mut JsonMap<String, JsonValue>,
        fields: &mut JsonMap<String, JsonValue>,
        flags: OccupantFlags,
    ) {
        if let Some(connectors) = self.base_connectors {
            for (col, on) in connectors.iter().enumerate() {
                data.insert(format!("connector0_{}", col + 1), json!(yes_no_field(*on)));
            }
        }
        for row in &self.rows {
            let r = row.row;
            for (col, slot) in row.slots.iter().enumerate() {
                let c = col + 1;
                let list = match (&slot.occupant, slot.hidden) {
                    (Some(occupant), false) => {
                        vec![occupant_json(occupant, slot.cost, self.kind, flags)]
                    }
                    _ => Vec::new(),
                };
                data.insert(format!("talent{r}_{c}"), JsonValue::Array(list));
                data.insert(
                    format!("connector{r}_{c}"),
                    json!(yes_no_field(row.connectors[col])),
                );
                if slot.hidden {
                    data.insert(format!("hide{r}_{c}"), json!("Yes"));
                    fields.insert(format!("talent{r}_{c}"), json!({ "hidden": true }));
                    fields.insert(format!("no_talent{r}_{c}"), json!({ "hidden": false }));
                    if col > 0 {
                        fields.insert(format!("h_connector{r}_{c}"), json!({ "hidden": true }));
                    }
                }
            }
            for (gap, on) in row.h_connectors.iter().enumerate() {
                data.insert(
                    format!("h_connector{r}_{}", gap + 2),
                    json!(yes_no_field(*on)),
                );
            }
        }
    }

    pub fn hidden_slots(&self) -> Vec<(usize, usize)> {
        self.rows
            .iter()
            .flat_map(|row| {
                row.slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.hidden)
                    .map(move |(col, _)| (row.row, col + 1))
            })
            .collect()
    }
}
