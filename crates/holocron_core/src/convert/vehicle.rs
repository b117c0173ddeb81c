//! Vehicles are emitted as non-player records so the sheet can track hull
//! trauma and system strain in the wound and strain slots.

use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing::warn;

use crate::core_api::{CoreError, SourceData, TargetRecord};
use crate::heuristics::yes_no;
use crate::markup;
use crate::oggdude::types::{VehicleData, VehicleWeapon, WeaponData};
use crate::reference::ReferenceIndex;

use super::items::{self, ItemKind};
use super::qualities;
use super::{embedded_item, feature, missing_reference};

/// Vehicle types that never leave a planet's atmosphere.
const PLANETARY_TYPES: &[&str] = &[
    "speeder", "walker", "wheeled", "tracked", "repulsor", "swoop", "crawler", "barge", "skiff",
];

fn is_starship(vehicle: &VehicleData) -> bool {
    let kind = vehicle.vehicle_type.to_lowercase();
    vehicle.hyperdrive_primary > 0 || !PLANETARY_TYPES.iter().any(|p| kind.contains(p))
}

fn hyperdrive(vehicle: &VehicleData) -> String {
    match (vehicle.hyperdrive_primary, vehicle.hyperdrive_backup) {
        (0, _) => String::new(),
        (primary, 0) => format!("Class {primary}"),
        (primary, backup) => format!("Class {primary} (backup Class {backup})"),
    }
}

fn firing_arc(weapon: &VehicleWeapon) -> Vec<&'static str> {
    if weapon.arcs.is_all() {
        vec!["all"]
    } else {
        weapon.arcs.names()
    }
}

fn mount_description(base: &str, weapon: &VehicleWeapon) -> String {
    let mut html = markup::translate(base);
    if !weapon.location.is_empty() {
        html.push_str(&format!("<p><strong>Location:</strong> {}</p>", weapon.location));
    }
    let turret = if weapon.turret { "Yes" } else { "No" };
    html.push_str(&format!("<p><strong>Turret:</strong> {turret}</p>"));
    html
}

fn laser_animation(name: &str, vehicle_name: &str) -> Option<JsonValue> {
    if !name.to_lowercase().contains("laser") {
        return None;
    }
    let hue = if vehicle_name.contains("TIE") { 120 } else { 360 };
    Some(json!({ "animationName": "bolt_3", "hue": hue, "sound": "laser_2" }))
}

fn mounted_weapon(
    weapon: &VehicleWeapon,
    vehicle_name: &str,
    index: &ReferenceIndex,
    issues: &mut Vec<CoreError>,
) -> JsonValue {
    let base = index.item(&weapon.key).and_then(|record| match &record.data {
        SourceData::Weapon(w) => Some((record, w)),
        _ => None,
    });
    let (base_name, base_description, mut stats) = match base {
        Some((record, w)) => (record.name.clone(), record.description.clone(), w.clone()),
        None => {
            warn!(key = %weapon.key, "vehicle weapon missing from item catalog");
            issues.push(missing_reference(vehicle_name, "vehicle weapon", &weapon.key));
            (weapon.key.clone(), String::new(), WeaponData::default())
        }
    };
    stats.weapon_type = "Vehicle".to_string();
    stats.qualities = qualities::merge(&stats.qualities, &weapon.qualities);

    let name = if weapon.location.is_empty() {
        base_name.clone()
    } else {
        format!("{base_name} ({})", weapon.location)
    };
    let mut data = JsonMap::new();
    data.insert(
        "description".into(),
        json!(mount_description(&base_description, weapon)),
    );
    items::weapon(&mut data, &stats, index);
    data.insert("firingArc".into(), json!(firing_arc(weapon)));
    data.insert("turret".into(), json!(yes_no(weapon.turret)));
    data.insert("count".into(), json!(weapon.count.max(1)));
    data.insert("carried".into(), json!("equipped"));
    if let Some(animation) = laser_animation(&base_name, vehicle_name) {
        data.insert("animation".into(), animation);
    }
    embedded_item(&name, data, ItemKind::Weapon)
}

pub(super) fn vehicle(
    target: &mut TargetRecord,
    vehicle: &VehicleData,
    index: &ReferenceIndex,
    issues: &mut Vec<CoreError>,
) {
    let inventory: Vec<JsonValue> = vehicle
        .weapons
        .iter()
        .map(|weapon| mounted_weapon(weapon, &target.name, index, issues))
        .collect();
    let features: Vec<JsonValue> = vehicle
        .actions
        .iter()
        .map(|key| match index.vehicle_action(key) {
            Some(action) => feature(&action.name, &markup::translate(&action.description)),
            None => {
                warn!(key = %key, "vehicle action missing from reference index");
                issues.push(missing_reference(&target.name, "vehicle action", key));
                feature(key, "")
            }
        })
        .collect();

    let data = &mut target.data;
    data.insert("type".into(), json!("vehicle"));
    data.insert("subtype".into(), json!(vehicle.vehicle_type));
    data.insert("starship".into(), json!(is_starship(vehicle)));
    data.insert("silhouette".into(), json!(vehicle.silhouette));
    data.insert("size".into(), json!(format!("Silhouette {}", vehicle.silhouette)));
    data.insert("speed".into(), json!(vehicle.speed));
    data.insert("handling".into(), json!(vehicle.handling));
    data.insert("soakValue".into(), json!(vehicle.armor));
    data.insert("woundThreshold".into(), json!(vehicle.hull_trauma));
    data.insert("woundsRemaining".into(), json!(vehicle.hull_trauma));
    data.insert("strainThreshold".into(), json!(vehicle.system_strain));
    data.insert("strainRemaining".into(), json!(vehicle.system_strain));
    for (field, value) in [
        ("defFore", vehicle.defense.fore),
        ("defAft", vehicle.defense.aft),
        ("defPort", vehicle.defense.port),
        ("defStarboard", vehicle.defense.starboard),
    ] {
        if value != 0 {
            data.insert(field.into(), json!(value));
        }
    }
    let sensor = vehicle
        .sensor_range
        .strip_prefix("sr")
        .unwrap_or(&vehicle.sensor_range);
    data.insert("sensorRange".into(), json!(sensor));
    data.insert("crew".into(), json!(vehicle.crew));
    data.insert("passengers".into(), json!(vehicle.passengers));
    data.insert(
        "encumbranceCapacity".into(),
        json!(vehicle.encumbrance_capacity),
    );
    data.insert("consumables".into(), json!(vehicle.consumables));
    data.insert("hyperdrive".into(), json!(hyperdrive(vehicle)));
    data.insert("navicomputer".into(), json!(vehicle.navicomputer));
    data.insert("hardpoints".into(), json!(vehicle.commerce.hardpoints));
    data.insert("price".into(), json!(vehicle.commerce.price));
    data.insert("rarity".into(), json!(vehicle.commerce.rarity));
    data.insert(
        "restricted".into(),
        json!(yes_no(vehicle.commerce.restricted)),
    );
    data.insert("inventory".into(), JsonValue::Array(inventory));
    data.insert("features".into(), JsonValue::Array(features));
}
