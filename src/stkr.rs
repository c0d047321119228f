//! Shots-to-kill ranges: how many hits a fire mode needs to kill a target, depending on the range.
use serde::{Deserialize, Serialize};

use crate::enums::DamageLocation;
use crate::fire_group::{DamageProfile, FireMode};

// Past this many shots a fire mode is not considered able to kill at all.
const MAX_SHOTS_TO_KILL: u32 = 100;

/// From `range` (meters) onwards, `shots` hits are needed, which takes `time_to_kill` ms.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShotsToKill {
    pub range: f64,
    pub shots: u32,
    pub time_to_kill: u32,
}

impl DamageProfile {
    /// Damage of a single pellet at `range`, going linearly from max to min damage between the max
    /// and min damage ranges.
    #[must_use]
    pub fn damage_at(&self, range: f64) -> f64 {
        if range <= self.max_damage_range {
            self.max_damage
        } else if range >= self.min_damage_range {
            self.min_damage
        } else {
            let progress =
                (range - self.max_damage_range) / (self.min_damage_range - self.max_damage_range);
            self.max_damage - progress * (self.max_damage - self.min_damage)
        }
    }

    // Range inside the falloff where pellet damage reaches `damage`, whether damage falls or rises
    // with range.  Clamped to the falloff.
    fn range_of(&self, damage: f64) -> f64 {
        let range = self.max_damage_range
            + (damage - self.max_damage) * (self.min_damage_range - self.max_damage_range)
                / (self.min_damage - self.max_damage);
        range.clamp(self.max_damage_range, self.min_damage_range)
    }

    fn location_factor(&self, location: DamageLocation) -> f64 {
        self.location_multiplier.get(&location).copied().unwrap_or(1.0) * f64::from(self.pellets_count)
    }
}

fn shots_needed(damage_per_shot: f64, health: f64) -> Option<u32> {
    if damage_per_shot <= 0.0 {
        return None;
    }
    // Shots are bounded by MAX_SHOTS_TO_KILL so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shots = (health / damage_per_shot).ceil() as u32;
    (shots <= MAX_SHOTS_TO_KILL).then_some(shots.max(1))
}

/// Ordered breakpoints where the shots-to-kill changes, starting at range 0.
///
/// Damage follows [`DamageProfile::damage_at`]: flat up to the max damage range, linear over the
/// falloff, flat past the min damage range.  When the min damage range is not past the max damage
/// range, damage steps from max to min right after the max damage range.  Ranges where a kill takes
/// more than `MAX_SHOTS_TO_KILL` shots are left out, so the result is empty when the fire mode
/// cannot kill the target at any range.
#[must_use]
pub fn shots_to_kill_ranges(
    profile: &DamageProfile,
    location: DamageLocation,
    health: f64,
    refire_time: u32,
) -> Vec<ShotsToKill> {
    let factor = profile.location_factor(location);
    let entry = |range: f64, shots: u32| ShotsToKill {
        range,
        shots,
        time_to_kill: (shots - 1) * refire_time,
    };
    // Unable to kill counts as one shot more than the cap.
    let shots_at = |damage: f64| shots_needed(damage * factor, health).unwrap_or(MAX_SHOTS_TO_KILL + 1);

    let near = shots_at(profile.max_damage);
    let far = shots_at(profile.min_damage);

    let mut ranges = Vec::new();
    if near <= MAX_SHOTS_TO_KILL {
        ranges.push(entry(0.0, near));
    }
    if near == far {
        return ranges;
    }

    if profile.min_damage_range <= profile.max_damage_range {
        if far <= MAX_SHOTS_TO_KILL {
            ranges.push(entry(profile.max_damage_range, far));
        }
        return ranges;
    }

    // A shot dealing exactly health / n kills in n shots.
    let threshold = |shots: u32| health / f64::from(shots) / factor;
    if near < far {
        // Falling damage: past the range where a shot deals health / n, n + 1 shots are needed.
        for shots in near..far.min(MAX_SHOTS_TO_KILL) {
            ranges.push(entry(profile.range_of(threshold(shots)), shots + 1));
        }
    } else {
        // Rising damage: from the range where a shot deals health / n, n shots are enough.
        for shots in (far..near.min(MAX_SHOTS_TO_KILL + 1)).rev() {
            ranges.push(entry(profile.range_of(threshold(shots)), shots));
        }
    }

    ranges
}

impl FireMode {
    /// Fill `shots_to_kill_ranges` for every body location against a target with `health`.
    pub fn update_shots_to_kill_ranges(&mut self, health: f64) {
        self.shots_to_kill_ranges.clear();

        let Some(profile) = &self.damage_profile else {
            return;
        };

        for location in DamageLocation::ALL {
            let ranges =
                shots_to_kill_ranges(profile, location, health, self.fire_timing.refire_time);
            if !ranges.is_empty() {
                self.shots_to_kill_ranges.insert(location, ranges);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ResistType;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn profile() -> DamageProfile {
        DamageProfile {
            max_damage: 143.0,
            max_damage_range: 10.0,
            min_damage: 125.0,
            min_damage_range: 65.0,
            pellets_count: 1,
            resist_type: ResistType::SmallArm,
            location_multiplier: [
                (DamageLocation::Head, 2.0),
                (DamageLocation::Torso, 1.0),
                (DamageLocation::Legs, 0.9),
            ]
            .into_iter()
            .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_damage_at() {
        let profile = profile();
        assert_relative_eq!(profile.damage_at(0.0), 143.0);
        assert_relative_eq!(profile.damage_at(10.0), 143.0);
        assert_relative_eq!(profile.damage_at(37.5), 134.0);
        assert_relative_eq!(profile.damage_at(65.0), 125.0);
        assert_relative_eq!(profile.damage_at(500.0), 125.0);
    }

    #[test]
    fn test_torso_breakpoint() {
        let ranges = shots_to_kill_ranges(&profile(), DamageLocation::Torso, 1000.0, 75);

        assert_eq!(ranges.len(), 2);
        assert_relative_eq!(ranges[0].range, 0.0);
        assert_eq!(ranges[0].shots, 7);
        assert_eq!(ranges[0].time_to_kill, 450);

        // 1000 / 7 = 142.857 damage is reached at 10 + 0.142857 * 55 / 18 meters.
        assert_relative_eq!(ranges[1].range, 10.0 + (143.0 - 1000.0 / 7.0) * 55.0 / 18.0, epsilon = 1e-9);
        assert_eq!(ranges[1].shots, 8);
        assert_eq!(ranges[1].time_to_kill, 525);
    }

    #[test]
    fn test_headshots_do_not_change() {
        let ranges = shots_to_kill_ranges(&profile(), DamageLocation::Head, 1000.0, 75);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].shots, 4);
    }

    #[test]
    fn test_pellets_multiply_damage() {
        let mut shotgun = profile();
        shotgun.max_damage = 100.0;
        shotgun.min_damage = 100.0;
        shotgun.pellets_count = 6;
        let ranges = shots_to_kill_ranges(&shotgun, DamageLocation::Torso, 1000.0, 700);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].shots, 2);
        assert_eq!(ranges[0].time_to_kill, 700);
    }

    #[test]
    fn test_no_damage() {
        let mut harmless = profile();
        harmless.max_damage = 0.0;
        harmless.min_damage = 0.0;
        assert!(shots_to_kill_ranges(&harmless, DamageLocation::Torso, 1000.0, 75).is_empty());
    }

    // Each breakpoint holds until the next one, as computed from damage_at.
    fn assert_matches_damage_at(profile: &DamageProfile, ranges: &[ShotsToKill]) {
        assert!(ranges.windows(2).all(|w| w[0].range < w[1].range), "{ranges:?}");
        for (i, stk) in ranges.iter().enumerate() {
            let next = ranges.get(i + 1).map_or(stk.range + 100.0, |n| n.range);
            for range in [stk.range + 1e-6, (stk.range + next) / 2.0, next - 1e-6] {
                let shots = (1000.0 / profile.damage_at(range)).ceil() as u32;
                assert_eq!(shots, stk.shots, "at {range} m in {ranges:?}");
            }
        }
    }

    #[test]
    fn test_falling_damage_matches_damage_at() {
        let profile = profile();
        let ranges = shots_to_kill_ranges(&profile, DamageLocation::Torso, 1000.0, 75);
        assert_matches_damage_at(&profile, &ranges);
    }

    #[test]
    fn test_rising_damage() {
        let mut rising = profile();
        rising.max_damage = 100.0;
        rising.max_damage_range = 50.0;
        rising.min_damage = 200.0;
        rising.min_damage_range = 100.0;

        let ranges = shots_to_kill_ranges(&rising, DamageLocation::Torso, 1000.0, 100);

        let shots: Vec<u32> = ranges.iter().map(|stk| stk.shots).collect();
        assert_eq!(shots, vec![10, 9, 8, 7, 6, 5]);
        assert_relative_eq!(ranges[1].range, 50.0 + (1000.0 / 9.0 - 100.0) / 2.0, epsilon = 1e-9);
        assert_relative_eq!(ranges[5].range, 100.0);
        assert_eq!(ranges[5].time_to_kill, 400);
        assert_matches_damage_at(&rising, &ranges);
    }

    #[test]
    fn test_rising_damage_from_unable_to_kill() {
        let mut rising = profile();
        rising.max_damage = 5.0;
        rising.max_damage_range = 0.0;
        rising.min_damage = 500.0;
        rising.min_damage_range = 100.0;

        let ranges = shots_to_kill_ranges(&rising, DamageLocation::Torso, 1000.0, 100);

        assert_eq!(ranges.first().unwrap().shots, MAX_SHOTS_TO_KILL);
        assert!(ranges.first().unwrap().range > 0.0);
        assert_eq!(ranges.last().unwrap().shots, 2);
        assert_matches_damage_at(&rising, &ranges);
    }

    #[test]
    fn test_min_damage_range_before_max_damage_range() {
        let mut stepped = profile();
        stepped.min_damage_range = 0.0;

        let ranges = shots_to_kill_ranges(&stepped, DamageLocation::Torso, 1000.0, 75);

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].shots, 7);
        assert_relative_eq!(ranges[1].range, 10.0);
        assert_eq!(ranges[1].shots, 8);
        assert_relative_eq!(stepped.damage_at(9.93), 143.0);
        assert_matches_damage_at(&stepped, &ranges);
    }

    #[test]
    fn test_damage_dropping_to_zero_is_capped() {
        let mut fading = profile();
        fading.min_damage = 0.0;
        let ranges = shots_to_kill_ranges(&fading, DamageLocation::Torso, 1000.0, 75);
        assert_eq!(ranges.first().unwrap().shots, 7);
        assert_eq!(ranges.last().unwrap().shots, MAX_SHOTS_TO_KILL);
        assert!(ranges.windows(2).all(|w| w[0].range < w[1].range));
    }
}
