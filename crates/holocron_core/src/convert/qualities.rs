//! Item quality expansion: a raw keyword list becomes the `special` list
//! plus one count field per quality.

use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::oggdude::types::QualityRef;

/// (source key, special-list name, count field)
#[rustfmt::skip]
const QUALITIES: &[(&str, &str, &str)] = &[
    ("ACCURATE", "accurate", "accurate"),
    ("AUTOFIRE", "auto-fire", "auto-fire"),
    ("BREACH", "breach", "breach"),
    ("BURN", "burn", "burn"),
    ("BLAST", "blast", "blast"),
    ("CONCUSSIVE", "concussive", "concussive"),
    ("CORTOSIS", "cortosis", "cortosis"),
    ("CUMBERSOME", "cumbersome", "cumbersome"),
    ("DEFENSIVE", "defensive", "defensive"),
    ("DEFLECTION", "deflection", "deflection"),
    ("DISORIENT", "disorient", "disorient"),
    ("ENSNARE", "ensnare", "ensnare"),
    ("GUIDED", "guided", "guided"),
    ("KNOCKDOWN", "knockdown", "knockdown"),
    ("INACCURATE", "inaccurate", "inaccurate"),
    ("INFERIOR", "inferior", "inferior"),
    ("ION", "ion", "ion"),
    ("LIMITEDAMMO", "limited-ammo", "limitedAmmo"),
    ("LINKED", "linked", "linked"),
    ("PIERCE", "pierce", "pierce"),
    ("PREPARE", "prepare", "prepare"),
    ("SLOWFIRING", "slow-firing", "slowFiring"),
    ("STUN", "stun", "stun"),
    ("STUNDAMAGE", "stun-damage", "stun-damage"),
    ("STUNDAMAGEDROID", "stun-damage-droid", "stun-damage-droid"),
    ("STUNSETTING", "stun-setting", "stun-setting"),
    ("SUNDER", "sunder", "sunder"),
    ("SUPERIOR", "superior", "superior"),
    ("TRACTOR", "tractor", "tractor"),
    ("VICIOUS", "vicious", "vicious"),
    ("UNARMED", "unarmed", "unarmed"),
];

fn lookup(key: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    let normalized: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();
    QUALITIES.iter().find(|(k, _, _)| *k == normalized)
}

/// Canonical special-list name for a quality key; unknown keys are
/// lowercased with spaces as hyphens.
pub fn special_name(key: &str) -> String {
    match lookup(key) {
        Some((_, name, _)) => (*name).to_string(),
        None => key.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"),
    }
}

fn camel_case(hyphenated: &str) -> String {
    let mut out = String::with_capacity(hyphenated.len());
    let mut upper = false;
    for c in hyphenated.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedQualities {
    pub special: Vec<String>,
    pub counts: Vec<(String, JsonValue)>,
}

impl ExpandedQualities {
    fn push(&mut self, special: String, field: String, value: JsonValue) {
        if !self.special.contains(&special) {
            self.special.push(special);
        }
        match self.counts.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.counts.push((field, value)),
        }
    }

    /// Writes `special` and every count field into an item data block.
    pub fn write_into(&self, data: &mut JsonMap<String, JsonValue>) {
        data.insert("special".into(), json!(self.special));
        for (field, value) in &self.counts {
            data.insert(field.clone(), value.clone());
        }
    }
}

/// OggDude qualities: bare keywords count as 1.
pub fn expand(qualities: &[QualityRef]) -> ExpandedQualities {
    let mut out = ExpandedQualities::default();
    for quality in qualities {
        let (special, field) = match lookup(&quality.key) {
            Some((_, name, field)) => ((*name).to_string(), (*field).to_string()),
            None => {
                let name = special_name(&quality.key);
                (name.clone(), name)
            }
        };
        out.push(special, field, json!(quality.count.unwrap_or(1)));
    }
    out
}

/// Free-text qualities such as "Pierce 2" or "Stun Damage". Rated qualities
/// keep their rating; unrated ones are flagged `true`. Count fields use
/// camelCase here.
pub fn expand_free_text(qualities: &[String]) -> ExpandedQualities {
    let mut out = ExpandedQualities::default();
    for text in qualities {
        let (name, rating) = crate::heuristics::parse_ranked_name(text);
        if name.is_empty() {
            continue;
        }
        let special = special_name(&name);
        let field = camel_case(&special);
        let value = rating.map_or(json!(true), |r| json!(r));
        out.push(special, field, value);
    }
    out
}

/// Vehicle-specific qualities layered over a weapon's own; the override
/// wins when both name the same quality.
pub fn merge(base: &[QualityRef], overrides: &[QualityRef]) -> Vec<QualityRef> {
    let mut merged: Vec<QualityRef> = base.to_vec();
    for quality in overrides {
        let name = special_name(&quality.key);
        match merged.iter_mut().find(|q| special_name(&q.key) == name) {
            Some(existing) => existing.count = quality.count,
            None => merged.push(quality.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rated_quality_round_trip() {
        let expanded = expand(&[QualityRef::new("VICIOUS", Some(3))]);
        assert_eq!(expanded.special, vec!["vicious"]);
        assert_eq!(expanded.counts, vec![("vicious".to_string(), json!(3))]);
    }

    #[test]
    fn bare_keywords_count_one_and_fields_follow_table() {
        let expanded = expand(&[
            QualityRef::bare("AUTOFIRE"),
            QualityRef::new("LIMITEDAMMO", Some(2)),
            QualityRef::bare("SLOWFIRING"),
            QualityRef::bare("NEWTHING"),
        ]);
        assert_eq!(
            expanded.special,
            vec!["auto-fire", "limited-ammo", "slow-firing", "newthing"]
        );
        let fields: Vec<&str> = expanded.counts.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["auto-fire", "limitedAmmo", "slowFiring", "newthing"]);
        assert_eq!(expanded.counts[0].1, json!(1));
    }

    #[test]
    fn repeated_quality_is_listed_once() {
        let expanded = expand(&[QualityRef::new("PIERCE", Some(1)), QualityRef::new("PIERCE", Some(3))]);
        assert_eq!(expanded.special, vec!["pierce"]);
        assert_eq!(expanded.counts, vec![("pierce".to_string(), json!(3))]);
    }

    #[test]
    fn free_text_qualities_use_camel_case_fields() {
        let expanded = expand_free_text(&[
            "Pierce 2".to_string(),
            "Stun Damage".to_string(),
            "Auto-fire".to_string(),
            "Limited Ammo 1".to_string(),
        ]);
        assert_eq!(
            expanded.special,
            vec!["pierce", "stun-damage", "auto-fire", "limited-ammo"]
        );
        let mut data = JsonMap::new();
        expanded.write_into(&mut data);
        assert_eq!(data["pierce"], 2);
        assert_eq!(data["stunDamage"], true);
        assert_eq!(data["autoFire"], true);
        assert_eq!(data["limitedAmmo"], 1);
    }

    #[test]
    fn vehicle_overrides_win() {
        let merged = merge(
            &[QualityRef::new("LINKED", Some(1)), QualityRef::bare("STUNSETTING")],
            &[QualityRef::new("LINKED", Some(3)), QualityRef::new("ION", None)],
        );
        assert_eq!(
            merged,
            vec![
                QualityRef::new("LINKED", Some(3)),
                QualityRef::bare("STUNSETTING"),
                QualityRef::new("ION", None),
            ]
        );
    }
}
