//! Typed fire groups and fire modes, built from the raw Census records.
use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::census::{CensusFireGroup, CensusFireMode, CensusPlayerStateGroup, CensusProjectile};
use crate::enums::{DamageLocation, FireModeType, PlayerState, ProjectileFlightType, ResistType};
use crate::error::Result;
use crate::stkr::ShotsToKill;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FireGroup {
    pub fire_group_id: u32,
    pub description: String,
    pub chamber_time: u32,
    pub transition_time: u32,
    pub fire_modes: Vec<FireMode>,
    // Site relative path (without extension) of the fire group magdump chart, once generated.
    pub magdump_simulation_base_path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FireMode {
    pub fire_mode_id: u32,
    pub fire_mode_type: FireModeType,
    pub description: String,
    pub is_ads: bool,
    pub detect_range: f64,
    pub move_multiplier: f64,
    pub turn_multiplier: f64,
    pub zoom: f64,
    pub ammo_per_shot: u32,
    // Filled in from the clip size of the weapon using this fire mode.
    pub max_consecutive_shots: u32,
    pub fire_timing: FireTiming,
    pub reload: ReloadTiming,
    pub damage_profile: Option<DamageProfile>,
    pub projectile: Option<Projectile>,
    pub recoil: Recoil,
    pub player_state_cone_of_fire: BTreeMap<PlayerState, ConeOfFire>,
    pub player_state_can_ads: BTreeMap<PlayerState, bool>,
    pub magdump_simulation_base_path: Option<String>,
    pub shots_to_kill_ranges: BTreeMap<DamageLocation, Vec<ShotsToKill>>,
}

/// All times in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FireTiming {
    pub refire_time: u32,
    pub fire_delay: u32,
    pub burst_count: u32,
    pub auto_fire_time: u32,
    pub charge_up_time: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReloadTiming {
    pub reload_time: u32,
    pub chamber_time: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DamageProfile {
    pub max_damage: f64,
    pub max_damage_range: f64,
    pub min_damage: f64,
    pub min_damage_range: f64,
    pub pellets_count: u32,
    pub resist_type: ResistType,
    pub location_multiplier: BTreeMap<DamageLocation, f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub speed: f64,
    pub max_speed: f64,
    pub acceleration: f64,
    pub gravity: f64,
    pub drag: f64,
    pub life_time: f64,
    pub flight_type: Option<ProjectileFlightType>,
}

/// Recoil angles and magnitudes are in degrees, rates in degrees per second.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recoil {
    pub angle_min: f64,
    pub angle_max: f64,
    pub vertical_min: f64,
    pub vertical_max: f64,
    pub vertical_increase: f64,
    pub vertical_crouched_increase: f64,
    pub horizontal_min: f64,
    pub horizontal_max: f64,
    pub horizontal_min_increase: f64,
    pub horizontal_max_increase: f64,
    pub horizontal_tolerance: Option<f64>,
    pub first_shot_multiplier: f64,
    pub max_total_vertical: Option<f64>,
    pub recovery_delay: u32,
    pub recovery_rate: f64,
    pub recovery_acceleration: f64,
    pub shots_at_min_magnitude: u32,
}

impl Default for Recoil {
    fn default() -> Self {
        Recoil {
            angle_min: 0.0,
            angle_max: 0.0,
            vertical_min: 0.0,
            vertical_max: 0.0,
            vertical_increase: 0.0,
            vertical_crouched_increase: 0.0,
            horizontal_min: 0.0,
            horizontal_max: 0.0,
            horizontal_min_increase: 0.0,
            horizontal_max_increase: 0.0,
            horizontal_tolerance: None,
            first_shot_multiplier: 1.0,
            max_total_vertical: None,
            recovery_delay: 0,
            recovery_rate: 0.0,
            recovery_acceleration: 0.0,
            shots_at_min_magnitude: 0,
        }
    }
}

/// Cone of fire for one player state.  Angles in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConeOfFire {
    pub min: f64,
    pub max: f64,
    pub bloom: f64,
    pub grow_rate: f64,
    pub recovery_rate: f64,
    pub recovery_delay: u32,
    pub shots_before_penalty: u32,
    pub turn_penalty: f64,
    pub multiplier: f64,
    pub moving_multiplier: f64,
    pub pellet_spread: f64,
}

impl Default for ConeOfFire {
    fn default() -> Self {
        ConeOfFire {
            min: 0.0,
            max: 0.0,
            bloom: 0.0,
            grow_rate: 0.0,
            recovery_rate: 0.0,
            recovery_delay: 0,
            shots_before_penalty: 0,
            turn_penalty: 0.0,
            multiplier: 1.0,
            moving_multiplier: 1.0,
            pellet_spread: 0.0,
        }
    }
}

impl FireGroup {
    /// Build a fire group from its Census record.  Fire mode links without joined fire mode data
    /// are dropped.
    ///
    /// # Errors
    /// Returns `Err` if a fire mode refers to an unknown Census enum value.
    pub fn from_census(raw: CensusFireGroup) -> Result<Self> {
        let mut links = raw.fire_modes;
        links.sort_by_key(|link| (link.fire_mode_index.unwrap_or(u32::MAX), link.fire_mode_id));

        let mut fire_modes = Vec::with_capacity(links.len());
        for link in links {
            match link.fire_mode {
                Some(fire_mode) => fire_modes.push(FireMode::from_census(fire_mode)?),
                None => warn!(
                    "(FireGroup.from_census) Fire mode {} of fire group {} has no data.",
                    link.fire_mode_id, raw.fire_group_id
                ),
            }
        }

        let description = raw
            .description
            .map(|d| d.en)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Fire group {}", raw.fire_group_id));

        Ok(FireGroup {
            fire_group_id: raw.fire_group_id,
            description,
            chamber_time: raw.chamber_duration_ms.unwrap_or(0),
            transition_time: raw.transition_duration_ms.unwrap_or(0),
            fire_modes,
            magdump_simulation_base_path: None,
        })
    }
}

impl FireMode {
    /// Build a fire mode from its Census record.
    ///
    /// # Errors
    /// Returns `Err` if the record refers to an unknown fire mode type, player state, resist type
    /// or projectile flight type.
    pub fn from_census(raw: CensusFireMode) -> Result<Self> {
        let fire_mode_type = FireModeType::from_census_id(raw.fire_mode_type_id.unwrap_or(0))?;
        let zoom = raw.zoom_default.unwrap_or(1.0);

        let damage_profile = raw.max_damage.map(|max_damage| -> Result<DamageProfile> {
            let location_multiplier: BTreeMap<DamageLocation, f64> = [
                (DamageLocation::Head, 1.0 + raw.damage_head_multiplier.unwrap_or(0.0)),
                (DamageLocation::Torso, 1.0),
                (DamageLocation::Legs, 1.0 + raw.damage_legs_multiplier.unwrap_or(0.0)),
            ]
            .into_iter()
            .collect();

            Ok(DamageProfile {
                max_damage,
                max_damage_range: raw.max_damage_range.unwrap_or(0.0),
                min_damage: raw.min_damage.unwrap_or(max_damage),
                min_damage_range: raw.min_damage_range.unwrap_or(0.0),
                pellets_count: raw.fire_pellets_per_shot.unwrap_or(1).max(1),
                resist_type: ResistType::from_census_id(raw.damage_resist_type_id.unwrap_or(0))?,
                location_multiplier,
            })
        });
        let damage_profile = damage_profile.transpose()?;

        let mut player_state_cone_of_fire = BTreeMap::new();
        let mut player_state_can_ads = BTreeMap::new();
        for group in &raw.player_states {
            let state = PlayerState::from_census_id(group.player_state_id)?;
            player_state_cone_of_fire.insert(state, cone_of_fire_from_census(group, &raw));
            player_state_can_ads.insert(state, group.can_iron_sight.unwrap_or(false));
        }

        let projectile = raw.projectile.map(projectile_from_census).transpose()?;

        let recoil = Recoil {
            angle_min: raw.recoil_angle_min.unwrap_or(0.0),
            angle_max: raw.recoil_angle_max.unwrap_or(0.0),
            vertical_min: raw.recoil_magnitude_min.unwrap_or(0.0),
            vertical_max: raw.recoil_magnitude_max.unwrap_or(0.0),
            vertical_increase: raw.recoil_increase.unwrap_or(0.0),
            vertical_crouched_increase: raw.recoil_increase_crouched.unwrap_or(0.0),
            horizontal_min: raw.recoil_horizontal_min.unwrap_or(0.0),
            horizontal_max: raw.recoil_horizontal_max.unwrap_or(0.0),
            horizontal_min_increase: raw.recoil_horizontal_min_increase.unwrap_or(0.0),
            horizontal_max_increase: raw.recoil_horizontal_max_increase.unwrap_or(0.0),
            horizontal_tolerance: raw.recoil_horizontal_tolerance,
            first_shot_multiplier: raw.recoil_first_shot_modifier.unwrap_or(1.0),
            max_total_vertical: raw.recoil_max_total_magnitude.filter(|m| *m > 0.0),
            recovery_delay: raw.recoil_recovery_delay_ms.unwrap_or(0),
            recovery_rate: raw.recoil_recovery_rate.unwrap_or(0.0),
            recovery_acceleration: raw.recoil_recovery_acceleration.unwrap_or(0.0),
            shots_at_min_magnitude: raw.recoil_shots_at_min_magnitude.unwrap_or(0),
        };

        if damage_profile.is_none() {
            debug!(
                "(FireMode.from_census) Fire mode {} deals no direct damage.",
                raw.fire_mode_id
            );
        }

        Ok(FireMode {
            fire_mode_id: raw.fire_mode_id,
            fire_mode_type,
            description: raw.description.map(|d| d.en).unwrap_or_default(),
            is_ads: fire_mode_type == FireModeType::IronSight || zoom > 1.0,
            detect_range: raw.fire_detect_range.unwrap_or(0.0),
            move_multiplier: raw.move_modifier.unwrap_or(1.0),
            turn_multiplier: raw.turn_modifier.unwrap_or(1.0),
            zoom,
            ammo_per_shot: raw.fire_ammo_per_shot.unwrap_or(1),
            max_consecutive_shots: 0,
            fire_timing: FireTiming {
                refire_time: raw.fire_refire_ms.unwrap_or(0),
                fire_delay: raw.fire_delay_ms.unwrap_or(0),
                burst_count: raw.fire_burst_count.unwrap_or(1),
                auto_fire_time: raw.fire_auto_fire_ms.unwrap_or(0),
                charge_up_time: raw.fire_charge_up_ms.unwrap_or(0),
            },
            reload: ReloadTiming {
                reload_time: raw.reload_time_ms.unwrap_or(0),
                chamber_time: raw.reload_chamber_ms.unwrap_or(0),
            },
            damage_profile,
            projectile,
            recoil,
            player_state_cone_of_fire,
            player_state_can_ads,
            magdump_simulation_base_path: None,
            shots_to_kill_ranges: BTreeMap::new(),
        })
    }

    /// Label used in chart legends and titles, e.g. "Hip fire ADS (1373)".
    #[must_use]
    pub fn legend_label(&self) -> String {
        format!(
            "{} {} ({})",
            crate::enums::Labeled::label(&self.fire_mode_type),
            if self.is_ads { "ADS" } else { "Hipfire" },
            self.fire_mode_id
        )
    }

    /// Cone of fire for a player state, standing if that state has none.
    #[must_use]
    pub fn cone_of_fire(&self, player_state: PlayerState) -> ConeOfFire {
        self.player_state_cone_of_fire
            .get(&player_state)
            .or_else(|| self.player_state_cone_of_fire.get(&PlayerState::Standing))
            .cloned()
            .unwrap_or_default()
    }
}

fn cone_of_fire_from_census(group: &CensusPlayerStateGroup, fire_mode: &CensusFireMode) -> ConeOfFire {
    ConeOfFire {
        min: group.cof_min.unwrap_or(0.0),
        max: group.cof_max.unwrap_or(0.0),
        bloom: fire_mode.cof_recoil.unwrap_or(0.0),
        grow_rate: group.cof_grow_rate.unwrap_or(0.0),
        recovery_rate: group.cof_recovery_rate.unwrap_or(0.0),
        recovery_delay: group.cof_recovery_delay_ms.unwrap_or(0),
        shots_before_penalty: group.cof_shots_before_penalty.unwrap_or(0),
        turn_penalty: group.cof_turn_penalty.unwrap_or(0.0),
        multiplier: fire_mode.cof_scalar.unwrap_or(1.0),
        moving_multiplier: fire_mode.cof_scalar_moving.unwrap_or(1.0),
        pellet_spread: fire_mode.cof_pellet_spread.unwrap_or(0.0),
    }
}

fn projectile_from_census(raw: CensusProjectile) -> Result<Projectile> {
    let flight_type = raw
        .projectile_flight_type_id
        .map(ProjectileFlightType::from_census_id)
        .transpose()?;
    let speed = raw.speed.unwrap_or(0.0);

    Ok(Projectile {
        speed,
        max_speed: raw.speed_max.unwrap_or(speed),
        acceleration: raw.acceleration.unwrap_or(0.0),
        gravity: raw.gravity.unwrap_or(0.0),
        drag: raw.drag.unwrap_or(0.0),
        life_time: raw.lifespan.unwrap_or(0.0),
        flight_type,
    })
}

/// Parse every fire group record and index the result by fire group id.
///
/// # Errors
/// Returns `Err` on the first record that cannot be converted.
pub fn index_fire_groups(raw: Vec<CensusFireGroup>) -> Result<HashMap<u32, FireGroup>> {
    raw.into_iter()
        .map(|record| FireGroup::from_census(record).map(|fg| (fg.fire_group_id, fg)))
        .collect()
}
