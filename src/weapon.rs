use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::census::{load_data_file, CensusFireGroup, CensusItem, DataFile, CENSUS_BASE_URL};
use crate::enums::{Faction, ItemCategory};
use crate::error::{Error, Result};
use crate::fire_group::{index_fire_groups, FireGroup};

// Test and placeholder items that Census lists as weapons.
pub const INFANTRY_EXCLUDED_ITEM_IDS: [u32; 4] = [1, 1_044, 6_003_950, 6_009_600];
pub const VEHICLE_EXCLUDED_ITEM_IDS: [u32; 2] = [4_209, 6_003_812];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponClass {
    Infantry,
    Vehicle,
}

impl WeaponClass {
    #[must_use]
    pub fn excluded_item_ids(self) -> &'static [u32] {
        match self {
            WeaponClass::Infantry => &INFANTRY_EXCLUDED_ITEM_IDS,
            WeaponClass::Vehicle => &VEHICLE_EXCLUDED_ITEM_IDS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Weapon {
    pub item_id: u32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub faction: Faction,
    pub category: ItemCategory,
    pub image_url: Option<String>,
    pub class: WeaponClass,
    pub clip_size: u32,
    pub ammo_capacity: u32,
    pub equip_time: u32,
    pub unequip_time: u32,
    pub to_ads_time: u32,
    pub from_ads_time: u32,
    pub sprint_recovery_time: u32,
    pub heat_capacity: Option<u32>,
    pub fire_groups: Vec<FireGroup>,
}

/// Lower cased name with every run of non alphanumeric characters replaced by a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl Weapon {
    /// Build a weapon from its Census item, resolving its fire groups through `fire_groups`.
    ///
    /// Returns `Ok(None)` for items that are not weapons of a known category.
    ///
    /// # Errors
    /// Returns `Err` if the item has an unknown faction.
    pub fn from_census(
        item: CensusItem,
        fire_groups: &HashMap<u32, FireGroup>,
    ) -> Result<Option<Weapon>> {
        let Some(census_weapon) = item.weapon else {
            debug!("(Weapon.from_census) Item {} has no weapon data.", item.item_id);
            return Ok(None);
        };

        let category = match ItemCategory::from_census_id(item.item_category_id.unwrap_or(0)) {
            Ok(category) => category,
            Err(Error::UnknownId { id, .. }) => {
                warn!(
                    "(Weapon.from_census) Skipping item {} with unknown category {id}.",
                    item.item_id
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let faction = Faction::from_census_id(item.faction_id.unwrap_or(0))?;
        let class = if item.is_vehicle_weapon.unwrap_or(false) {
            WeaponClass::Vehicle
        } else {
            WeaponClass::Infantry
        };

        let mut ammo_slots = census_weapon.ammo_slots;
        ammo_slots.sort_by_key(|slot| slot.weapon_slot_index.unwrap_or(0));
        let first_slot = ammo_slots.into_iter().next().unwrap_or_default();
        let clip_size = first_slot.clip_size.unwrap_or(0);

        let mut links = census_weapon.fire_groups;
        links.sort_by_key(|link| link.fire_group_index.unwrap_or(u32::MAX));

        let mut weapon_fire_groups = Vec::with_capacity(links.len());
        for link in links {
            let Some(fire_group) = fire_groups.get(&link.fire_group_id) else {
                warn!(
                    "(Weapon.from_census) Item {} refers to missing fire group {}.",
                    item.item_id, link.fire_group_id
                );
                continue;
            };
            let mut fire_group = fire_group.clone();
            for fire_mode in &mut fire_group.fire_modes {
                fire_mode.max_consecutive_shots = clip_size / fire_mode.ammo_per_shot.max(1);
            }
            weapon_fire_groups.push(fire_group);
        }

        let name = item
            .name
            .map(|n| n.en)
            .unwrap_or_else(|| format!("Item {}", item.item_id));
        let details = census_weapon.details.unwrap_or_default();

        Ok(Some(Weapon {
            item_id: item.item_id,
            slug: slugify(&name),
            name,
            description: item.description.map(|d| d.en).unwrap_or_default(),
            faction,
            category,
            image_url: item
                .image_path
                .filter(|path| !path.is_empty())
                .map(|path| format!("{CENSUS_BASE_URL}{path}")),
            class,
            clip_size,
            ammo_capacity: first_slot.capacity.unwrap_or(0),
            equip_time: details.equip_ms.unwrap_or(0),
            unequip_time: details.unequip_ms.unwrap_or(0),
            to_ads_time: details.to_iron_sights_ms.unwrap_or(0),
            from_ads_time: details.from_iron_sights_ms.unwrap_or(0),
            sprint_recovery_time: details.sprint_recovery_ms.unwrap_or(0),
            heat_capacity: details.heat_capacity.filter(|h| *h > 0),
            fire_groups: weapon_fire_groups,
        }))
    }

    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.class.excluded_item_ids().contains(&self.item_id)
    }

    /// File name, without extension, of the weapon's pages.
    #[must_use]
    pub fn base_file_name(&self) -> String {
        format!("{}-{}", self.slug, self.item_id)
    }
}

/// Build every weapon item, dropping excluded items.
///
/// # Errors
/// Returns `Err` if an item has an unknown faction.
pub fn build_weapons(items: Vec<CensusItem>, fire_groups: &HashMap<u32, FireGroup>) -> Result<Vec<Weapon>> {
    let mut weapons = Vec::with_capacity(items.len());
    for item in items {
        if let Some(weapon) = Weapon::from_census(item, fire_groups)? {
            if weapon.is_excluded() {
                debug!("(build_weapons) Excluding {} ({}).", weapon.name, weapon.item_id);
            } else {
                weapons.push(weapon);
            }
        }
    }
    Ok(weapons)
}

/// Load and build all weapons from the data files directory.
///
/// # Errors
/// Returns `Err` if a data file is missing, malformed or holds an unknown enum value.
pub fn load_weapons(data_files_directory: &Path) -> Result<Vec<Weapon>> {
    let raw_fire_groups: Vec<CensusFireGroup> =
        load_data_file(data_files_directory, DataFile::FireGroups)?;
    let fire_groups = index_fire_groups(raw_fire_groups)?;
    let items: Vec<CensusItem> = load_data_file(data_files_directory, DataFile::Weapons)?;

    build_weapons(items, &fire_groups)
}

pub type WeaponsByFactionCategory<'a> = BTreeMap<Faction, BTreeMap<ItemCategory, Vec<&'a Weapon>>>;

/// Group weapons by faction then category, each group sorted by name.
#[must_use]
pub fn group_by_faction_category<'a>(
    weapons: impl IntoIterator<Item = &'a Weapon>,
) -> WeaponsByFactionCategory<'a> {
    let mut grouped: WeaponsByFactionCategory<'a> = BTreeMap::new();
    for weapon in weapons {
        grouped
            .entry(weapon.faction)
            .or_default()
            .entry(weapon.category)
            .or_default()
            .push(weapon);
    }
    for categories in grouped.values_mut() {
        for weapons in categories.values_mut() {
            weapons.sort_by(|a, b| a.name.cmp(&b.name).then(a.item_id.cmp(&b.item_id)));
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fire_groups() -> HashMap<u32, FireGroup> {
        let raw: Vec<CensusFireGroup> = serde_json::from_value(json!([{
            "fire_group_id": "10",
            "fire_modes": [{
                "fire_mode_id": "100",
                "fire_mode_index": "0",
                "fire_mode": {"fire_mode_id": "100", "fire_mode_type_id": "0", "fire_ammo_per_shot": "2"}
            }]
        }, {
            "fire_group_id": "11",
            "fire_modes": [{
                "fire_mode_id": "110",
                "fire_mode_index": "0",
                "fire_mode": {"fire_mode_id": "110", "fire_mode_type_id": "1"}
            }]
        }]))
        .unwrap();
        index_fire_groups(raw).unwrap()
    }

    fn item(item_id: &str, category: &str, name: &str) -> CensusItem {
        serde_json::from_value(json!({
            "item_id": item_id,
            "item_category_id": category,
            "is_vehicle_weapon": "0",
            "name": {"en": name},
            "faction_id": "1",
            "image_path": "/files/ps2/images/static/1.png",
            "weapon": {
                "weapon_id": "5",
                "details": {"equip_ms": "500", "to_iron_sights_ms": "250"},
                "fire_groups": [
                    {"fire_group_id": "11", "fire_group_index": "1"},
                    {"fire_group_id": "10", "fire_group_index": "0"},
                    {"fire_group_id": "99", "fire_group_index": "2"}
                ],
                "ammo_slots": [{"weapon_slot_index": "0", "clip_size": "30", "capacity": "210"}]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("NS-11A"), "ns-11a");
        assert_eq!(slugify("Pulsar VS1"), "pulsar-vs1");
        assert_eq!(slugify("  T1 Cycler -- (AE)  "), "t1-cycler-ae");
        assert_eq!(slugify("Orion VS54"), "orion-vs54");
    }

    #[test]
    fn test_weapon_from_census() {
        let weapon = Weapon::from_census(item("7", "7", "Pulsar VS1"), &fire_groups())
            .unwrap()
            .unwrap();

        assert_eq!(weapon.slug, "pulsar-vs1");
        assert_eq!(weapon.base_file_name(), "pulsar-vs1-7");
        assert_eq!(weapon.faction, Faction::VanuSovereignty);
        assert_eq!(weapon.category, ItemCategory::AssaultRifle);
        assert_eq!(weapon.class, WeaponClass::Infantry);
        assert_eq!(
            weapon.image_url.as_deref(),
            Some("https://census.daybreakgames.com/files/ps2/images/static/1.png")
        );
        assert_eq!(weapon.clip_size, 30);
        assert_eq!(weapon.ammo_capacity, 210);
        assert_eq!(weapon.equip_time, 500);
        assert_eq!(weapon.to_ads_time, 250);

        // Ordered by index, missing fire group dropped.
        let ids: Vec<u32> = weapon.fire_groups.iter().map(|fg| fg.fire_group_id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(weapon.fire_groups[0].fire_modes[0].max_consecutive_shots, 15);
        assert_eq!(weapon.fire_groups[1].fire_modes[0].max_consecutive_shots, 30);
    }

    #[test]
    fn test_unknown_category_is_skipped() {
        let weapon = Weapon::from_census(item("7", "1", "Nothing"), &fire_groups()).unwrap();
        assert!(weapon.is_none());
    }

    #[test]
    fn test_build_weapons_excludes() {
        let items = vec![item("7", "7", "Pulsar VS1"), item("1044", "7", "Test rifle")];
        let weapons = build_weapons(items, &fire_groups()).unwrap();
        assert_eq!(weapons.len(), 1);
        assert_eq!(weapons[0].item_id, 7);
    }

    #[test]
    fn test_group_by_faction_category() {
        let fire_groups = fire_groups();
        let mut weapons = build_weapons(
            vec![
                item("7", "7", "Pulsar VS1"),
                item("8", "7", "Equinox VE2"),
                item("9", "6", "Eridani SX5"),
            ],
            &fire_groups,
        )
        .unwrap();
        weapons[2].faction = Faction::NsOperatives;

        let grouped = group_by_faction_category(&weapons);
        assert_eq!(grouped.len(), 2);
        let names: Vec<&str> = grouped[&Faction::VanuSovereignty][&ItemCategory::AssaultRifle]
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["Equinox VE2", "Pulsar VS1"]);
        assert_eq!(grouped[&Faction::NsOperatives][&ItemCategory::Lmg].len(), 1);
    }
}
