use roxmltree::Node;

use crate::core_api::{CoreError, RecordType, SourceData, SourceRecord};

use super::types::{Defense, FiringArcs, VehicleData, VehicleWeapon};
use super::xml;

pub(super) fn vehicle(node: Node<'_, '_>) -> Result<SourceRecord, CoreError> {
    let weapons = xml::child(node, "VehicleWeapons")
        .map(|container| {
            xml::children(container, "VehicleWeapon")
                .filter_map(vehicle_weapon)
                .collect()
        })
        .unwrap_or_default();

    let data = VehicleData {
        vehicle_type: xml::text(node, "Type"),
        silhouette: xml::int(node, "Silhouette"),
        speed: xml::int(node, "Speed"),
        handling: xml::int(node, "Handling"),
        armor: xml::int(node, "Armor"),
        hull_trauma: xml::int(node, "HullTrauma"),
        system_strain: xml::int(node, "SystemStrain"),
        defense: Defense {
            fore: xml::int(node, "DefFore"),
            aft: xml::int(node, "DefAft"),
            port: xml::int(node, "DefPort"),
            starboard: xml::int(node, "DefStarboard"),
        },
        sensor_range: xml::text(node, "SensorRangeValue"),
        crew: xml::text(node, "Crew"),
        passengers: xml::int(node, "Passengers"),
        encumbrance_capacity: xml::int(node, "EncumbranceCapacity"),
        consumables: xml::text(node, "Consumables"),
        hyperdrive_primary: xml::int(node, "HyperdrivePrimary"),
        hyperdrive_backup: xml::int(node, "HyperdriveBackup"),
        navicomputer: xml::flag(node, "NaviComputer"),
        weapons,
        actions: xml::list(node, "VehActions", "Key"),
        commerce: xml::commerce(node),
    };
    super::header(node, RecordType::Npcs, SourceData::Vehicle(data))
}

fn vehicle_weapon(node: Node<'_, '_>) -> Option<VehicleWeapon> {
    let key = xml::text(node, "Key");
    if key.is_empty() {
        return None;
    }
    let arcs = xml::child(node, "FiringArcs")
        .map(|a| FiringArcs {
            fore: xml::flag(a, "Fore"),
            aft: xml::flag(a, "Aft"),
            port: xml::flag(a, "Port"),
            starboard: xml::flag(a, "Starboard"),
            dorsal: xml::flag(a, "Dorsal"),
            ventral: xml::flag(a, "Ventral"),
        })
        .unwrap_or_default();
    Some(VehicleWeapon {
        key,
        location: xml::text(node, "Location"),
        count: xml::opt_text(node, "Count")
            .and_then(|c| xml::parse_int(&c))
            .unwrap_or(1),
        turret: xml::flag(node, "Turret"),
        arcs,
        qualities: xml::qualities(node),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oggdude::types::QualityRef;

    #[test]
    fn vehicle_weapons_and_defense() {
        let doc = roxmltree::Document::parse(
            r#"<Vehicle><Key>TIEFTR</Key><Name>TIE Fighter</Name><Type>Starfighter</Type>
                <Silhouette>3</Silhouette><Speed>5</Speed><Handling>3</Handling>
                <DefFore>0</DefFore><DefAft>0</DefAft><Armor>2</Armor>
                <HullTrauma>9</HullTrauma><SystemStrain>10</SystemStrain>
                <SensorRangeValue>srShort</SensorRangeValue>
                <VehicleWeapons><VehicleWeapon><Key>LTLASCAN</Key><Location>Hull</Location><Count>2</Count>
                  <FiringArcs><Fore>true</Fore></FiringArcs>
                  <Qualities><Quality><Key>LINKED</Key><Count>1</Count></Quality></Qualities>
                </VehicleWeapon></VehicleWeapons>
                <VehActions><Key>BARREL</Key></VehActions>
            </Vehicle>"#,
        )
        .expect("xml");
        let record = vehicle(doc.root_element()).expect("vehicle");
        assert_eq!(record.record_type, RecordType::Npcs);
        let SourceData::Vehicle(data) = record.data else {
            panic!("expected vehicle payload");
        };
        assert_eq!(data.hull_trauma, 9);
        assert_eq!(data.sensor_range, "srShort");
        assert_eq!(data.weapons.len(), 1);
        let weapon = &data.weapons[0];
        assert_eq!(weapon.count, 2);
        assert_eq!(weapon.arcs.names(), vec!["fore"]);
        assert_eq!(weapon.qualities, vec![QualityRef::new("LINKED", Some(1))]);
        assert_eq!(data.actions, vec!["BARREL"]);
    }
}
