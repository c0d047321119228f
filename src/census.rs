//! Client for the Daybreak Census API and the raw records it returns.
//!
//! Census answers with every number encoded as a string and silently drops absent fields, so the
//! raw records below are deliberately loose.  They are turned into the typed model in
//! [`crate::fire_group`] and [`crate::weapon`].
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use log::{debug, info};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

use crate::error::{Error, Result};

pub const CENSUS_BASE_URL: &str = "https://census.daybreakgames.com";
pub const CENSUS_PAGE_SIZE: usize = 500;

// Census item type of every weapon item.
const WEAPON_ITEM_TYPE_ID: &str = "26";

const FIRE_GROUP_JOIN: &str = "fire_group_to_fire_mode^on:fire_group_id^list:1^inject_at:fire_modes\
    (fire_mode_2^on:fire_mode_id^inject_at:fire_mode\
    (player_state_group_2^on:player_state_group_id^list:1^inject_at:player_states,\
    projectile^on:projectile_id^inject_at:projectile))";

const WEAPON_JOIN: &str = "item_to_weapon^on:item_id^inject_at:weapon\
    (weapon^on:weapon_id^inject_at:details,\
    weapon_to_fire_group^on:weapon_id^list:1^inject_at:fire_groups,\
    weapon_ammo_slot^on:weapon_id^list:1^inject_at:ammo_slots)";

/// The data sets cached on disk between a data update and page generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    FireGroups,
    Weapons,
}

impl DataFile {
    pub const ALL: [DataFile; 2] = [DataFile::FireGroups, DataFile::Weapons];

    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            DataFile::FireGroups => "fire_group",
            DataFile::Weapons => "item",
        }
    }

    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            DataFile::FireGroups => "fire_groups.json",
            DataFile::Weapons => "weapons.json",
        }
    }

    #[must_use]
    pub fn path(self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }

    fn query(self) -> Vec<(&'static str, &'static str)> {
        match self {
            DataFile::FireGroups => vec![("c:join", FIRE_GROUP_JOIN), ("c:lang", "en")],
            DataFile::Weapons => vec![
                ("item_type_id", WEAPON_ITEM_TYPE_ID),
                ("c:join", WEAPON_JOIN),
                ("c:lang", "en"),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CensusClient {
    client: reqwest::Client,
    base_url: String,
    service_id: String,
    page_size: usize,
}

impl CensusClient {
    #[must_use]
    pub fn new(service_id: &str) -> Self {
        CensusClient {
            client: reqwest::Client::new(),
            base_url: CENSUS_BASE_URL.to_string(),
            service_id: service_id.to_string(),
            page_size: CENSUS_PAGE_SIZE,
        }
    }

    /// Points the client at another server, e.g. a local mock.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch every record of a data file's collection, one page at a time.
    ///
    /// # Errors
    /// Returns `Err` if the server cannot be reached, answers with a failure status, or reports an
    /// error in its payload.
    pub async fn fetch_all(&self, data_file: DataFile) -> Result<Vec<Value>> {
        let collection = data_file.collection();
        let url = format!(
            "{}/s:{}/get/ps2:v2/{}",
            self.base_url, self.service_id, collection
        );
        let list_key = format!("{collection}_list");

        let mut records = Vec::new();
        loop {
            let mut query: Vec<(&str, String)> = data_file
                .query()
                .into_iter()
                .map(|(key, value)| (key, value.to_string()))
                .collect();
            query.push(("c:start", records.len().to_string()));
            query.push(("c:limit", self.page_size.to_string()));

            debug!("(CensusClient.fetch_all) GET {url} starting at {}", records.len());

            let response: Value = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let page = take_list(response, &list_key).map_err(|message| Error::CensusResponse {
                collection: collection.to_string(),
                message,
            })?;

            let count = page.len();
            records.extend(page);
            if count < self.page_size {
                break;
            }
        }

        Ok(records)
    }

    /// Refresh a data file on disk from the API.  Returns the number of records written.
    ///
    /// # Errors
    /// Returns `Err` if the records cannot be fetched or the file cannot be written.
    pub async fn update_data_file(&self, data_file: DataFile, directory: &Path) -> Result<usize> {
        info!("Updating {} data file", data_file.file_name());

        let records = self.fetch_all(data_file).await?;
        tokio::fs::create_dir_all(directory).await?;
        let path = data_file.path(directory);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&records)?).await?;

        info!("Wrote {} records to {}", records.len(), path.display());
        Ok(records.len())
    }
}

// Census reports failures inside an otherwise successful response.
fn take_list(response: Value, list_key: &str) -> std::result::Result<Vec<Value>, String> {
    let Value::Object(mut body) = response else {
        return Err("response is not an object".to_string());
    };

    if let Some(error) = body.get("error").or_else(|| body.get("errorMessage")) {
        return Err(error.as_str().map_or_else(|| error.to_string(), str::to_string));
    }
    if let Some(code) = body.get("errorCode") {
        return Err(format!("error code {code}"));
    }

    match body.remove(list_key) {
        Some(Value::Array(list)) => Ok(list),
        Some(other) => Err(format!("{list_key} is not a list: {other}")),
        None => Err(format!("missing {list_key}")),
    }
}

/// Read back a data file written by [`CensusClient::update_data_file`].
///
/// # Errors
/// Returns `Err` if the file cannot be read or does not hold a list of `T`.
pub fn load_data_file<T: DeserializeOwned>(directory: &Path, data_file: DataFile) -> Result<Vec<T>> {
    let path = data_file.path(directory);
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|source| Error::DataFile { path, source })
}

/*
 * CensusBool exists because Census encodes flags as the strings "0" and "1".
 */
serde_with::serde_conv!(
    pub CensusBool,
    bool,
    |flag: &bool| if *flag { "1" } else { "0" },
    |value: String| -> std::result::Result<_, std::convert::Infallible> { Ok(value == "1") }
);

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LocalizedString {
    #[serde(default)]
    pub en: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CensusFireGroup {
    #[serde_as(as = "DisplayFromStr")]
    pub fire_group_id: u32,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub chamber_duration_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub transition_duration_ms: Option<u32>,
    #[serde(default)]
    pub fire_modes: Vec<CensusFireModeLink>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CensusFireModeLink {
    #[serde_as(as = "DisplayFromStr")]
    pub fire_mode_id: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_mode_index: Option<u32>,
    #[serde(default)]
    pub fire_mode: Option<CensusFireMode>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CensusFireMode {
    #[serde_as(as = "DisplayFromStr")]
    pub fire_mode_id: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_mode_type_id: Option<u32>,
    #[serde(default)]
    pub description: Option<LocalizedString>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_pellet_spread: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_range: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_recoil: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_scalar: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_scalar_moving: Option<f64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub damage_head_multiplier: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub damage_legs_multiplier: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub damage_resist_type_id: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_damage: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_damage_range: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub min_damage: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub min_damage_range: Option<f64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_ammo_per_shot: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_auto_fire_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_burst_count: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_charge_up_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_delay_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_detect_range: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_pellets_per_shot: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_refire_ms: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub move_modifier: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub turn_modifier: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub zoom_default: Option<f64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_angle_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_angle_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_first_shot_modifier: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_horizontal_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_horizontal_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_horizontal_max_increase: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_horizontal_min_increase: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_horizontal_tolerance: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_increase: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_increase_crouched: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_magnitude_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_magnitude_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_max_total_magnitude: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_recovery_acceleration: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_recovery_delay_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_recovery_rate: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recoil_shots_at_min_magnitude: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub reload_time_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub reload_chamber_ms: Option<u32>,

    #[serde(default)]
    pub player_states: Vec<CensusPlayerStateGroup>,
    #[serde(default)]
    pub projectile: Option<CensusProjectile>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CensusPlayerStateGroup {
    #[serde_as(as = "DisplayFromStr")]
    pub player_state_id: u32,
    #[serde_as(as = "Option<CensusBool>")]
    pub can_iron_sight: Option<bool>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_grow_rate: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_recovery_delay_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_recovery_rate: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_shots_before_penalty: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cof_turn_penalty: Option<f64>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CensusProjectile {
    #[serde_as(as = "DisplayFromStr")]
    pub projectile_id: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub projectile_flight_type_id: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub speed: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub speed_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub acceleration: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub gravity: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub drag: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub lifespan: Option<f64>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CensusItem {
    #[serde_as(as = "DisplayFromStr")]
    pub item_id: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub item_category_id: Option<u32>,
    #[serde_as(as = "Option<CensusBool>")]
    pub is_vehicle_weapon: Option<bool>,
    #[serde(default)]
    pub name: Option<LocalizedString>,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub faction_id: Option<u32>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub weapon: Option<CensusWeapon>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CensusWeapon {
    #[serde_as(as = "DisplayFromStr")]
    pub weapon_id: u32,
    #[serde(default)]
    pub details: Option<CensusWeaponDetails>,
    #[serde(default)]
    pub fire_groups: Vec<CensusFireGroupLink>,
    #[serde(default)]
    pub ammo_slots: Vec<CensusAmmoSlot>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CensusWeaponDetails {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub equip_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub unequip_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub to_iron_sights_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub from_iron_sights_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub sprint_recovery_ms: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub heat_capacity: Option<u32>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CensusFireGroupLink {
    #[serde_as(as = "DisplayFromStr")]
    pub fire_group_id: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub fire_group_index: Option<u32>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CensusAmmoSlot {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub weapon_slot_index: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub clip_size: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub capacity: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fire_mode_from_strings() {
        let raw = json!({
            "fire_mode_id": "1373",
            "fire_mode_type_id": "0",
            "fire_refire_ms": "75",
            "max_damage": "143",
            "recoil_angle_min": "-10",
            "player_states": [
                {"player_state_id": "0", "can_iron_sight": "1", "cof_min": "0.1", "cof_max": "3"}
            ]
        });

        let fire_mode: CensusFireMode = serde_json::from_value(raw).unwrap();
        assert_eq!(fire_mode.fire_mode_id, 1373);
        assert_eq!(fire_mode.fire_refire_ms, Some(75));
        assert_eq!(fire_mode.max_damage, Some(143.0));
        assert_eq!(fire_mode.recoil_angle_min, Some(-10.0));
        assert_eq!(fire_mode.min_damage, None);
        assert!(fire_mode.projectile.is_none());
        assert_eq!(fire_mode.player_states.len(), 1);
        assert_eq!(fire_mode.player_states[0].can_iron_sight, Some(true));
        assert_eq!(fire_mode.player_states[0].cof_recovery_rate, None);
    }

    #[test]
    fn test_item_from_strings() {
        let raw = json!({
            "item_id": "43",
            "item_category_id": "6",
            "is_vehicle_weapon": "0",
            "name": {"en": "Gauss SAW"},
            "faction_id": "2",
            "weapon": {
                "weapon_id": "43",
                "fire_groups": [{"fire_group_id": "12", "fire_group_index": "0"}],
                "ammo_slots": [{"clip_size": "100", "capacity": "500"}]
            }
        });

        let item: CensusItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.item_id, 43);
        assert_eq!(item.is_vehicle_weapon, Some(false));
        assert_eq!(item.name.unwrap().en, "Gauss SAW");
        let weapon = item.weapon.unwrap();
        assert_eq!(weapon.fire_groups[0].fire_group_id, 12);
        assert_eq!(weapon.ammo_slots[0].clip_size, Some(100));
        assert!(weapon.details.is_none());
    }

    #[test]
    fn test_take_list() {
        let ok = json!({"item_list": [{"item_id": "1"}], "returned": 1});
        assert_eq!(take_list(ok, "item_list").unwrap().len(), 1);

        let error = json!({"error": "Missing Service ID."});
        assert_eq!(take_list(error, "item_list").unwrap_err(), "Missing Service ID.");

        let missing = json!({"returned": 0});
        assert_eq!(take_list(missing, "item_list").unwrap_err(), "missing item_list");
    }

    #[test]
    fn test_data_file_paths() {
        let directory = Path::new("datafiles");
        assert_eq!(
            DataFile::FireGroups.path(directory),
            PathBuf::from("datafiles/fire_groups.json")
        );
        assert_eq!(DataFile::Weapons.collection(), "item");
    }
}
