//! Recoil and cone of fire simulation of a fire mode emptying its magazine ("magdump").
//!
//! Coordinates are angles in degrees relative to where the player was aiming before the first
//! shot: `x` grows to the right, `y` grows upwards.
use std::f64::consts::TAU;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::enums::PlayerState;
use crate::fire_group::FireMode;

pub const DEFAULT_RECENTERING_RESPONSE_TIME: u32 = 1_000;
pub const DEFAULT_RECENTERING_INERTIA_FACTOR: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub shots: u32,
    /// Pause in ms between two bursts when `auto_burst_length` is set.
    pub control_time: u32,
    pub auto_burst_length: Option<u32>,
    pub recentering: bool,
    pub recentering_response_time: u32,
    pub recentering_inertia_factor: f64,
    pub player_state: PlayerState,
}

impl SimulationParams {
    #[must_use]
    pub fn new(shots: u32) -> Self {
        SimulationParams {
            shots,
            control_time: 0,
            auto_burst_length: None,
            recentering: false,
            recentering_response_time: DEFAULT_RECENTERING_RESPONSE_TIME,
            recentering_inertia_factor: DEFAULT_RECENTERING_INERTIA_FACTOR,
            player_state: PlayerState::Standing,
        }
    }
}

/// Where the cursor and every pellet of one shot ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSample {
    pub time: u32,
    pub cursor: (f64, f64),
    pub pellets: Vec<(f64, f64)>,
}

/// Random number generator for simulations.  In test mode it is seeded with `seed` so that the
/// generated charts are reproducible.
#[must_use]
pub fn get_rng(test_mode: bool, seed: u64) -> SmallRng {
    if test_mode {
        debug!("(get_rng) TEST mode for random numbers (constant seed of {seed}).");
        SmallRng::seed_from_u64(seed)
    } else {
        SmallRng::from_entropy()
    }
}

fn uniform(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

// Uniformly distributed point inside a disc of the given diameter.
fn point_in_disc(rng: &mut dyn RngCore, diameter: f64) -> (f64, f64) {
    if diameter <= 0.0 {
        return (0.0, 0.0);
    }
    let radius = diameter / 2.0 * rng.gen::<f64>().sqrt();
    let theta = rng.gen::<f64>() * TAU;
    (radius * theta.cos(), radius * theta.sin())
}

struct Aim {
    cursor: (f64, f64),
    cone: f64,
}

impl FireMode {
    /// Simulate `params.shots` consecutive shots.
    ///
    /// Between shots the recoil and the cone of fire recover once their respective recovery delays
    /// have elapsed.  With `auto_burst_length`, the player stops firing for `control_time` ms after
    /// every burst.  With `recentering`, the player pulls the cursor back toward the starting
    /// point once `recentering_response_time` ms have passed.
    #[must_use]
    pub fn simulate_shots(&self, params: &SimulationParams, rng: &mut dyn RngCore) -> Vec<ShotSample> {
        let cone_of_fire = self.cone_of_fire(params.player_state);
        let recoil = &self.recoil;
        let pellets_count = self
            .damage_profile
            .as_ref()
            .map_or(1, |profile| profile.pellets_count.max(1));
        let vertical_increase = if matches!(
            params.player_state,
            PlayerState::Crouching | PlayerState::CrouchWalking
        ) {
            recoil.vertical_crouched_increase
        } else {
            recoil.vertical_increase
        };

        let mut aim = Aim {
            cursor: (0.0, 0.0),
            cone: cone_of_fire.min,
        };
        let mut time: u32 = 0;
        let mut samples = Vec::with_capacity(params.shots as usize);

        let recover = |aim: &mut Aim, gap: u32| {
            if gap > recoil.recovery_delay && recoil.recovery_rate > 0.0 {
                let amount = recoil.recovery_rate * f64::from(gap - recoil.recovery_delay) / 1000.0;
                aim.cursor.1 = (aim.cursor.1 - amount).max(0.0);
            }
            if gap > cone_of_fire.recovery_delay && cone_of_fire.recovery_rate > 0.0 {
                let amount =
                    cone_of_fire.recovery_rate * f64::from(gap - cone_of_fire.recovery_delay) / 1000.0;
                aim.cone = (aim.cone - amount).max(cone_of_fire.min);
            }
        };

        for shot in 0..params.shots {
            if let Some(burst) = params.auto_burst_length.filter(|b| *b > 0) {
                if shot > 0 && shot % burst == 0 {
                    recover(&mut aim, params.control_time);
                    time += params.control_time;
                }
            }

            let diameter = aim.cone * cone_of_fire.multiplier;
            let pellets = (0..pellets_count)
                .map(|_| {
                    let (cx, cy) = point_in_disc(rng, diameter);
                    let (px, py) = if pellets_count > 1 {
                        point_in_disc(rng, cone_of_fire.pellet_spread)
                    } else {
                        (0.0, 0.0)
                    };
                    (aim.cursor.0 + cx + px, aim.cursor.1 + cy + py)
                })
                .collect();

            samples.push(ShotSample {
                time,
                cursor: aim.cursor,
                pellets,
            });

            // Recoil kick
            let shot_index = f64::from(shot);
            let mut magnitude =
                uniform(rng, recoil.vertical_min, recoil.vertical_max) + vertical_increase * shot_index;
            if shot == 0 {
                magnitude *= recoil.first_shot_multiplier;
            }
            let angle = uniform(rng, recoil.angle_min, recoil.angle_max).to_radians();

            let mut horizontal = uniform(
                rng,
                recoil.horizontal_min + recoil.horizontal_min_increase * shot_index,
                recoil.horizontal_max + recoil.horizontal_max_increase * shot_index,
            );
            if rng.gen_bool(0.5) {
                horizontal = -horizontal;
            }
            if let Some(tolerance) = recoil.horizontal_tolerance.filter(|t| *t > 0.0) {
                if (aim.cursor.0 + horizontal).abs() > tolerance {
                    horizontal = -horizontal;
                }
            }

            aim.cursor.0 += magnitude * angle.sin() + horizontal;
            aim.cursor.1 += magnitude * angle.cos();
            if let Some(max_total) = recoil.max_total_vertical {
                aim.cursor.1 = aim.cursor.1.min(max_total);
            }

            // Bloom
            if shot + 1 >= cone_of_fire.shots_before_penalty {
                aim.cone = (aim.cone + cone_of_fire.bloom).min(cone_of_fire.max.max(cone_of_fire.min));
            }

            let gap = self.fire_timing.refire_time.max(1);
            recover(&mut aim, gap);
            time += gap;

            if params.recentering && time >= params.recentering_response_time {
                let pull = params.recentering_inertia_factor.clamp(0.0, 1.0);
                aim.cursor.0 -= aim.cursor.0 * pull;
                aim.cursor.1 -= aim.cursor.1 * pull;
            }
        }

        debug!(
            "(FireMode.simulate_shots) Simulated {} shots of fire mode {}, final cursor {:?}",
            params.shots, self.fire_mode_id, aim.cursor
        );

        samples
    }
}
