use crate::oggdude::types::Characteristics;

/// Creature tier; decides how wounds and strain pools are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tier {
    Minion,
    #[default]
    Rival,
    Nemesis,
}

impl Tier {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "minion" => Tier::Minion,
            "nemesis" => Tier::Nemesis,
            _ => Tier::Rival,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Minion => "minion",
            Tier::Rival => "rival",
            Tier::Nemesis => "nemesis",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedStats {
    pub soak: i64,
    pub wounds: i64,
    pub strain: Option<i64>,
    pub melee_defense: i64,
    pub ranged_defense: i64,
}

/// A named entry that may or may not carry its own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntry {
    pub name: String,
    pub description: String,
}

impl NamedEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRank {
    pub name: String,
    pub rank: i64,
}

/// A weapon line: either a bare name or a full stat block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaponEntry {
    pub name: String,
    pub skill: Option<String>,
    pub damage: Option<i64>,
    /// Damage written as "+N" on top of Brawn.
    pub plus_damage: Option<i64>,
    pub critical: Option<i64>,
    pub range: Option<String>,
    pub qualities: Vec<String>,
}

impl WeaponEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_stats(&self) -> bool {
        self.skill.is_some()
            || self.damage.is_some()
            || self.plus_damage.is_some()
            || self.critical.is_some()
            || self.range.is_some()
            || !self.qualities.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdversaryData {
    pub tier: Tier,
    pub subtype: String,
    pub species: Option<String>,
    pub characteristics: Characteristics,
    pub derived: DerivedStats,
    pub skills: Vec<SkillRank>,
    pub talents: Vec<NamedEntry>,
    pub abilities: Vec<NamedEntry>,
    pub weapons: Vec<WeaponEntry>,
    pub gear: Vec<String>,
    pub armor: Vec<String>,
    pub tags: Vec<String>,
    pub source: String,
    pub notes: String,
}

impl AdversaryData {
    /// Species from the explicit field, else the first `species:` tag.
    pub fn species_name(&self) -> String {
        if let Some(species) = self.species.as_deref().map(str::trim)
            && !species.is_empty()
        {
            return species.to_string();
        }
        self.tags
            .iter()
            .find_map(|tag| tag.strip_prefix("species:"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}
