//! Small accessors over `roxmltree` nodes. OggDude files are loose about
//! which elements are present, so every getter has a default.

use roxmltree::Node;

use crate::grid::Directions;

use super::types::{Commerce, ModEntry, QualityRef};

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

pub(crate) fn children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == tag)
}

/// Trimmed text of a child element, or "" when absent.
pub(crate) fn text(node: Node<'_, '_>, tag: &str) -> String {
    child(node, tag)
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn opt_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    let value = text(node, tag);
    (!value.is_empty()).then_some(value)
}

/// Raw description text. Leading and trailing whitespace is kept out but
/// interior newlines are significant to the markup translator.
pub(crate) fn description(node: Node<'_, '_>) -> String {
    child(node, "Description")
        .and_then(|c| c.text())
        .map(|t| t.trim().replace("\r\n", "\n"))
        .unwrap_or_default()
}

pub(crate) fn int(node: Node<'_, '_>, tag: &str) -> i64 {
    parse_int(&text(node, tag)).unwrap_or(0)
}

pub(crate) fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f as i64))
}

pub(crate) fn flag(node: Node<'_, '_>, tag: &str) -> bool {
    crate::heuristics::parse_flag(&text(node, tag))
}

/// Text of every `<item>` child of `<container>`.
pub(crate) fn list(node: Node<'_, '_>, container: &str, item: &str) -> Vec<String> {
    let Some(container) = child(node, container) else {
        return Vec::new();
    };
    children(container, item)
        .filter_map(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// `<Container><Wrapper><Key>..</Key></Wrapper></Container>` key lists.
pub(crate) fn nested_keys(node: Node<'_, '_>, container: &str, wrapper: &str) -> Vec<String> {
    let Some(container) = child(node, container) else {
        return Vec::new();
    };
    children(container, wrapper)
        .map(|w| text(w, "Key"))
        .filter(|k| !k.is_empty())
        .collect()
}

/// Both `<Source>` and `<Sources><Source>` forms, in document order.
pub(crate) fn sources(node: Node<'_, '_>) -> Vec<String> {
    let mut out: Vec<String> = children(node, "Source")
        .filter_map(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    for source in list(node, "Sources", "Source") {
        if !out.contains(&source) {
            out.push(source);
        }
    }
    out
}

pub(crate) fn qualities(node: Node<'_, '_>) -> Vec<QualityRef> {
    let Some(container) = child(node, "Qualities") else {
        return Vec::new();
    };
    children(container, "Quality")
        .filter_map(|q| {
            let key = text(q, "Key");
            if key.is_empty() {
                return None;
            }
            let count = opt_text(q, "Count").and_then(|c| parse_int(&c));
            Some(QualityRef::new(key, count))
        })
        .collect()
}

pub(crate) fn commerce(node: Node<'_, '_>) -> Commerce {
    Commerce {
        encumbrance: int(node, "Encumbrance"),
        price: int(node, "Price"),
        rarity: int(node, "Rarity"),
        restricted: flag(node, "Restricted"),
        hardpoints: int(node, "HP"),
    }
}

pub(crate) fn mods(node: Node<'_, '_>, container: &str) -> Vec<ModEntry> {
    let Some(container) = child(node, container) else {
        return Vec::new();
    };
    children(container, "Mod")
        .map(|m| ModEntry {
            key: opt_text(m, "Key"),
            count: opt_text(m, "Count")
                .and_then(|c| parse_int(&c))
                .unwrap_or(1),
            misc_desc: opt_text(m, "MiscDesc"),
        })
        .collect()
}

pub(crate) fn directions(node: Node<'_, '_>) -> Vec<Directions> {
    let Some(container) = child(node, "Directions") else {
        return Vec::new();
    };
    children(container, "Direction")
        .map(|d| Directions {
            up: flag(d, "Up"),
            down: flag(d, "Down"),
            left: flag(d, "Left"),
            right: flag(d, "Right"),
        })
        .collect()
}

pub(crate) fn int_list(node: Node<'_, '_>, container: &str, item: &str) -> Vec<i64> {
    list(node, container, item)
        .iter()
        .map(|v| parse_int(v).unwrap_or(0))
        .collect()
}

pub(crate) fn flag_list(node: Node<'_, '_>, container: &str, item: &str) -> Vec<bool> {
    list(node, container, item)
        .iter()
        .map(|v| crate::heuristics::parse_flag(v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_default_when_elements_are_missing() {
        let doc = roxmltree::Document::parse(
            "<Weapon><Name> Blaster </Name><Damage>6</Damage><Restricted>true</Restricted></Weapon>",
        )
        .expect("xml");
        let root = doc.root_element();
        assert_eq!(text(root, "Name"), "Blaster");
        assert_eq!(text(root, "Key"), "");
        assert_eq!(int(root, "Damage"), 6);
        assert_eq!(int(root, "Crit"), 0);
        assert!(flag(root, "Restricted"));
        assert!(!flag(root, "Missing"));
    }

    #[test]
    fn both_source_forms_are_collected() {
        let doc = roxmltree::Document::parse(
            "<Gear><Source Page=\"12\">Core</Source><Sources><Source>Core</Source><Source>Dangerous Covenants</Source></Sources></Gear>",
        )
        .expect("xml");
        assert_eq!(
            sources(doc.root_element()),
            vec!["Core".to_string(), "Dangerous Covenants".to_string()]
        );
    }

    #[test]
    fn qualities_keep_missing_counts_as_bare() {
        let doc = roxmltree::Document::parse(
            "<Weapon><Qualities><Quality><Key>PIERCE</Key><Count>2</Count></Quality><Quality><Key>STUNSETTING</Key></Quality></Qualities></Weapon>",
        )
        .expect("xml");
        let qualities = qualities(doc.root_element());
        assert_eq!(qualities[0], QualityRef::new("PIERCE", Some(2)));
        assert_eq!(qualities[1], QualityRef::bare("STUNSETTING"));
    }
}
