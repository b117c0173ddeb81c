//! Free-text inference: skill checks, canonical skill names, ranked names
//! and silhouettes, plus the static key and label tables the converters
//! share.

use once_cell::sync::Lazy;
use regex::Regex;

/// Skill and difficulty inferred from prose. Both may be absent; that is a
/// normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillCheckReference {
    pub skill: Option<String>,
    pub difficulty: Option<String>,
}

impl SkillCheckReference {
    pub fn is_empty(&self) -> bool {
        self.skill.is_none() && self.difficulty.is_none()
    }
}

#[rustfmt::skip]
const DIFFICULTIES: &[&str] = &["Simple", "Easy", "Average", "Hard", "Daunting", "Formidable"];

#[rustfmt::skip]
const KNOWN_SKILLS: &[&str] = &[
    "Astrogation", "Athletics", "Brawl", "Charm", "Coercion", "Computers", "Cool",
    "Coordination", "Cybernetics", "Deception", "Discipline", "Gunnery", "Leadership",
    "Lightsaber", "Mechanics", "Medicine", "Melee", "Negotiation", "Perception",
    "Piloting (Planetary)", "Piloting (Space)", "Ranged (Light)", "Ranged (Heavy)",
    "Resilience", "Skulduggery", "Stealth", "Streetwise", "Survival", "Vigilance",
    "Knowledge", "Core Worlds", "Education", "Lore", "Outer Rim", "Underworld", "Warfare",
    "Xenology",
];

#[rustfmt::skip]
const KNOWLEDGE_SUBSKILLS: &[(&str, &str)] = &[
    ("core worlds", "Core Worlds"),
    ("education", "Education"),
    ("lore", "Lore"),
    ("outer rim", "Outer Rim"),
    ("underworld", "Underworld"),
    ("warfare", "Warfare"),
    ("xenology", "Xenology"),
];

/// Bases whose sub-category has been written with a colon, a hyphen or
/// parentheses across source books.
const COMPOUND_BASES: &[&str] = &["Ranged", "Piloting", "Melee", "Knowledge"];

#[rustfmt::skip]
const SPELLING_FIXES: &[(&str, &str)] = &[
    ("Plantary", "Planetary"),
    ("plantary", "planetary"),
];

#[rustfmt::skip]
const SKILL_KEYS: &[(&str, &str)] = &[
    ("ASTRO", "Astrogation"),          ("ATHL", "Athletics"),
    ("BRAWL", "Brawl"),                ("CHARM", "Charm"),
    ("COERC", "Coercion"),             ("COMP", "Computers"),
    ("COOL", "Cool"),                  ("COORD", "Coordination"),
    ("CYBER", "Cybernetics"),          ("DECEP", "Deception"),
    ("DISC", "Discipline"),            ("GUNN", "Gunnery"),
    ("GUNNERY", "Gunnery"),            ("LEAD", "Leadership"),
    ("LIGHTSABER", "Lightsaber"),      ("LTSABER", "Lightsaber"),
    ("MECH", "Mechanics"),             ("MED", "Medicine"),
    ("MELEE", "Melee"),                ("NEG", "Negotiation"),
    ("PERC", "Perception"),            ("PILOTPL", "Piloting (Planetary)"),
    ("PILOTPLANETARY", "Piloting (Planetary)"),
    ("PILOTSP", "Piloting (Space)"),   ("PILOTSPACE", "Piloting (Space)"),
    ("RANGLT", "Ranged (Light)"),      ("LIGHT", "Ranged (Light)"),
    ("RANGHV", "Ranged (Heavy)"),      ("RANGHVY", "Ranged (Heavy)"),
    ("HEAVY", "Ranged (Heavy)"),       ("RESIL", "Resilience"),
    ("SKUL", "Skulduggery"),           ("STEAL", "Stealth"),
    ("SW", "Streetwise"),              ("SURV", "Survival"),
    ("VIGIL", "Vigilance"),            ("CORE", "Core Worlds"),
    ("EDU", "Education"),              ("LORE", "Lore"),
    ("OUT", "Outer Rim"),              ("UND", "Underworld"),
    ("WAR", "Warfare"),                ("XEN", "Xenology"),
];

#[rustfmt::skip]
const RANGE_BANDS: &[(&str, &str)] = &[
    ("wrEngaged", "Engaged"),
    ("wrClose", "Engaged"),
    ("wrShort", "Short"),
    ("wrMedium", "Medium"),
    ("wrLong", "Long"),
    ("wrExtreme", "Extreme"),
];

#[rustfmt::skip]
const CHARACTERISTIC_KEYS: &[(&str, &str)] = &[
    ("BR", "Brawn"),
    ("AG", "Agility"),
    ("INT", "Intellect"),
    ("CUN", "Cunning"),
    ("WIL", "Willpower"),
    ("PR", "Presence"),
];

#[rustfmt::skip]
const SKILL_GROUPS: &[(&str, &str)] = &[
    ("stGeneral", "General"),
    ("stCombat", "Combat"),
    ("stKnowledge", "Knowledge"),
];

const MELEE_SKILLS: &[&str] = &["Melee", "Brawl", "Lightsaber"];

pub fn skill_for_key(key: &str) -> Option<&'static str> {
    let key = key.trim().to_ascii_uppercase();
    SKILL_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

pub fn is_melee_skill(skill: &str) -> bool {
    let canonical = normalize_skill_name(skill);
    MELEE_SKILLS
        .iter()
        .any(|name| canonical.eq_ignore_ascii_case(name))
}

/// Range band label for an OggDude `RangeValue`; unknown values pass through.
pub fn range_name(value: &str) -> String {
    RANGE_BANDS
        .iter()
        .find(|(k, _)| *k == value)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| value.to_string())
}

pub fn characteristic_name(key: &str) -> String {
    CHARACTERISTIC_KEYS
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| key.to_string())
}

pub fn skill_group_name(value: &str) -> String {
    SKILL_GROUPS
        .iter()
        .find(|(k, _)| *k == value)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| value.to_string())
}

/// `taPassive` is passive; every other activation (actions, maneuvers,
/// incidentals) is active.
pub fn activation_label(value: &str) -> &'static str {
    if value.trim() == "taPassive" {
        "Passive"
    } else {
        "Active"
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|part| {
            part.split('/')
                .map(title_word)
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

static COMPOUND_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\s*(?:\(\s*([^()]+?)\s*\)|:\s*(.+?)|\s-\s*(.+?))\s*$")
        .expect("valid regex")
});

/// Canonical skill label: "Ranged: Heavy", "Ranged - Heavy" and
/// "Ranged (Heavy)" all become "Ranged (Heavy)"; "Knowledge (Lore)"
/// becomes "Lore". Idempotent.
pub fn normalize_skill_name(text: &str) -> String {
    let mut name = text.trim().to_string();
    if name.is_empty() {
        return name;
    }
    for (from, to) in SPELLING_FIXES {
        if name.contains(from) {
            name = name.replace(from, to);
        }
    }
    let Some(caps) = COMPOUND_FORM.captures(&name) else {
        return name;
    };
    let base = title_word(&caps[1]);
    if !COMPOUND_BASES.contains(&base.as_str()) {
        return name;
    }
    let Some(sub) = caps.get(2).or(caps.get(3)).or(caps.get(4)) else {
        return name;
    };
    let sub = sub.as_str().trim();
    if base == "Knowledge" {
        let lowered = sub.to_lowercase();
        if let Some((_, canonical)) = KNOWLEDGE_SUBSKILLS.iter().find(|(k, _)| *k == lowered) {
            return (*canonical).to_string();
        }
    }
    format!("{base} ({})", title_case(sub))
}

fn known_skill(candidate: &str) -> Option<String> {
    let canonical = normalize_skill_name(candidate);
    KNOWN_SKILLS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(&canonical))
        .map(|known| (*known).to_string())
}

fn canonical_difficulty(word: &str) -> Option<String> {
    DIFFICULTIES
        .iter()
        .find(|d| d.eq_ignore_ascii_case(word))
        .map(|d| (*d).to_string())
}

const DIFF: &str = r"(?P<diff>(?i:simple|easy|average|hard|daunting|formidable))";
const SKILL: &str = r"(?P<skill>[A-Z][A-Za-z]+(?:\s*\([A-Za-z /]+\)|\s*:\s*[A-Za-z]+|\s+-\s+[A-Za-z]+|\s+[A-Z][a-z]+)?)";
const DICE_PARENS: &str = r"\s*\([^)]*\)\s*";
const LEAD_IN: &str = r"(?i:makes?|requires?|must\s+make|make)\s+(?i:an?)\s+";

/// Ordered, first-match-wins. Entries only get appended.
static SKILL_CHECK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"{LEAD_IN}{DIFF}{DICE_PARENS}{SKILL}\s+check"),
        format!(r"\b{DIFF}{DICE_PARENS}{SKILL}\s+check"),
        format!(r"{LEAD_IN}{DIFF}\s+{SKILL}\s+check"),
        format!(r"\b{DIFF}{DICE_PARENS}{SKILL}"),
        format!(r"\b{DIFF}\s+{SKILL}"),
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static FORMAT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[/?[A-Za-z]+\]").expect("valid regex"));

static COLON_DIFFICULTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i):(simple|easy|average|hard|daunting|formidable):").expect("valid regex")
});

fn prepare_for_inference(text: &str) -> String {
    let stripped = FORMAT_TAG.replace_all(text, "");
    let words = COLON_DIFFICULTY.replace_all(&stripped, |caps: &regex::Captures<'_>| {
        title_word(&caps[1])
    });
    words.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Infers the skill and difficulty of a check described in prose.
pub fn infer_skill_check(text: &str) -> SkillCheckReference {
    let prepared = prepare_for_inference(text);
    for pattern in SKILL_CHECK_PATTERNS.iter() {
        for caps in pattern.captures_iter(&prepared) {
            let (Some(diff), Some(skill)) = (caps.name("diff"), caps.name("skill")) else {
                continue;
            };
            let candidate = skill.as_str();
            let resolved = known_skill(candidate).or_else(|| {
                candidate
                    .split_whitespace()
                    .next()
                    .and_then(known_skill)
            });
            if let Some(skill) = resolved {
                return SkillCheckReference {
                    skill: Some(skill),
                    difficulty: canonical_difficulty(diff.as_str()),
                };
            }
        }
    }
    SkillCheckReference::default()
}

static RANKED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?\S)\s+(\d+)$").expect("valid regex"));

/// Splits shorthand like "Adversary 2" into the name and its rank.
pub fn parse_ranked_name(text: &str) -> (String, Option<i64>) {
    let text = text.trim();
    match RANKED_NAME.captures(text) {
        Some(caps) => (caps[1].to_string(), caps[2].parse().ok()),
        None => (text.to_string(), None),
    }
}

static SILHOUETTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsilhouette\s*:?\s*(\d+)").expect("valid regex"));

pub fn parse_silhouette(text: &str) -> Option<i64> {
    SILHOUETTE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}
