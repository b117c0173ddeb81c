use crate::grid::TalentGrid;

/// The six characteristics in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristics {
    pub brawn: i64,
    pub agility: i64,
    pub intellect: i64,
    pub cunning: i64,
    pub willpower: i64,
    pub presence: i64,
}

impl Default for Characteristics {
    fn default() -> Self {
        Self::uniform(1)
    }
}

impl Characteristics {
    pub const NAMES: [&'static str; 6] = [
        "brawn",
        "agility",
        "intellect",
        "cunning",
        "willpower",
        "presence",
    ];

    pub fn uniform(value: i64) -> Self {
        Self {
            brawn: value,
            agility: value,
            intellect: value,
            cunning: value,
            willpower: value,
            presence: value,
        }
    }

    pub fn values(&self) -> [i64; 6] {
        [
            self.brawn,
            self.agility,
            self.intellect,
            self.cunning,
            self.willpower,
            self.presence,
        ]
    }

    pub fn set(&mut self, name: &str, value: i64) -> bool {
        let slot = match name.trim().to_ascii_lowercase().as_str() {
            "brawn" | "br" => &mut self.brawn,
            "agility" | "ag" => &mut self.agility,
            "intellect" | "int" => &mut self.intellect,
            "cunning" | "cun" => &mut self.cunning,
            "willpower" | "wil" => &mut self.willpower,
            "presence" | "pr" => &mut self.presence,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// One quality reference; `count` is `None` for bare keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityRef {
    pub key: String,
    pub count: Option<i64>,
}

impl QualityRef {
    pub fn new(key: impl Into<String>, count: Option<i64>) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }

    pub fn bare(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }
}

/// Shop fields shared by every equipment kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commerce {
    pub encumbrance: i64,
    pub price: i64,
    pub rarity: i64,
    pub restricted: bool,
    pub hardpoints: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaponData {
    /// Source `Type`, e.g. "Energy Weapon" or "Vehicle".
    pub weapon_type: String,
    pub skill_key: String,
    pub damage: i64,
    pub damage_add: i64,
    pub crit: i64,
    pub range_value: String,
    pub categories: Vec<String>,
    pub qualities: Vec<QualityRef>,
    pub commerce: Commerce,
}

impl WeaponData {
    pub fn is_vehicle_weapon(&self) -> bool {
        self.weapon_type.eq_ignore_ascii_case("vehicle")
            || self.categories.iter().any(|c| c.eq_ignore_ascii_case("vehicle"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmorData {
    pub soak: i64,
    pub defense: i64,
    pub qualities: Vec<QualityRef>,
    pub commerce: Commerce,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GearData {
    pub gear_type: String,
    pub commerce: Commerce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Weapon,
    Armor,
    Vehicle,
}

impl AttachmentKind {
    pub fn from_source(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "armor" | "armour" => AttachmentKind::Armor,
            "vehicle" => AttachmentKind::Vehicle,
            _ => AttachmentKind::Weapon,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttachmentKind::Weapon => "weapon attachment",
            AttachmentKind::Armor => "armor attachment",
            AttachmentKind::Vehicle => "vehicle attachment",
        }
    }
}

/// One `<Mod>` entry of an attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModEntry {
    pub key: Option<String>,
    pub count: i64,
    pub misc_desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    pub kind: AttachmentKind,
    pub slots: i64,
    pub category_limits: Vec<String>,
    pub base_mods: Vec<ModEntry>,
    pub added_mods: Vec<ModEntry>,
    pub commerce: Commerce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillModifier {
    pub key: String,
    pub rank_start: i64,
    pub rank_limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesOption {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChoice {
    pub name: String,
    pub options: Vec<SpeciesOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesData {
    pub characteristics: Characteristics,
    pub wound_threshold: i64,
    pub strain_threshold: i64,
    pub experience: i64,
    pub skill_modifiers: Vec<SkillModifier>,
    pub talent_keys: Vec<String>,
    pub option_choices: Vec<OptionChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CareerData {
    pub career_skills: Vec<String>,
    pub specializations: Vec<String>,
    pub force_rating: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializationData {
    pub career_skills: Vec<String>,
    pub grid: TalentGrid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TalentData {
    pub ranked: bool,
    pub activation: String,
    pub force_talent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcePowerData {
    pub min_force_rating: i64,
    pub grid: TalentGrid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureAbilityData {
    pub careers: Vec<String>,
    pub grid: TalentGrid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillData {
    pub char_key: String,
    pub skill_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiringArcs {
    pub fore: bool,
    pub aft: bool,
    pub port: bool,
    pub starboard: bool,
    pub dorsal: bool,
    pub ventral: bool,
}

impl FiringArcs {
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.fore, "fore"),
            (self.aft, "aft"),
            (self.port, "port"),
            (self.starboard, "starboard"),
            (self.dorsal, "dorsal"),
            (self.ventral, "ventral"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }

    pub fn is_all(&self) -> bool {
        self.names().len() == 6
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleWeapon {
    pub key: String,
    pub location: String,
    pub count: i64,
    pub turret: bool,
    pub arcs: FiringArcs,
    pub qualities: Vec<QualityRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Defense {
    pub fore: i64,
    pub aft: i64,
    pub port: i64,
    pub starboard: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleData {
    pub vehicle_type: String,
    pub silhouette: i64,
    pub speed: i64,
    pub handling: i64,
    pub armor: i64,
    pub hull_trauma: i64,
    pub system_strain: i64,
    pub defense: Defense,
    pub sensor_range: String,
    pub crew: String,
    pub passengers: i64,
    pub encumbrance_capacity: i64,
    pub consumables: String,
    pub hyperdrive_primary: i64,
    pub hyperdrive_backup: i64,
    pub navicomputer: bool,
    pub weapons: Vec<VehicleWeapon>,
    pub actions: Vec<String>,
    pub commerce: Commerce,
}

/// Name and text of a keyed ability node (force ability, signature ability
/// node, vehicle action).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbilityText {
    pub key: String,
    pub name: String,
    pub description: String,
}

/// An item quality or mod descriptor. `mod_desc` carries a `{0}` slot for
/// the mod count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDescriptor {
    pub key: String,
    pub name: String,
    pub description: String,
    pub mod_desc: String,
    pub qual_desc: String,
}

/// Lookup-only entries that never become records themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceEntry {
    Descriptor(ItemDescriptor),
    ForceAbility(AbilityText),
    SignatureNode(AbilityText),
    VehicleAction(AbilityText),
}
