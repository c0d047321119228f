//! Weapon stats pages and their magdump simulation charts.
//!
//! Weapons are independent of each other, so each one is generated on the blocking thread pool and
//! at most one weapon per available core is in flight.
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::chart::{generate_magdump_simulation, Sizing};
use crate::constants::{
    CHART_TEMPLATE_PATH, FIRE_GROUP_BACKGROUND_CLASSES, FIRE_MODE_BACKGROUND_CLASSES,
    INFANTRY_HEALTH, INFANTRY_WEAPONS_FOLDER, INFANTRY_WEAPON_STATS_TEMPLATE_PATH,
    MAGDUMP_CHART_HEIGHT, MAGDUMP_RUNS, SIMULATIONS_DIRECTORY, VEHICLE_WEAPONS_FOLDER,
    VEHICLE_WEAPON_STATS_TEMPLATE_PATH,
};
use crate::enums::{DamageLocation, Faction};
use crate::error::{Error, Result};
use crate::pages::{damage_location_names, faction_background_colors};
use crate::render::Renderer;
use crate::simulation::{get_rng, SimulationParams};
use crate::site::SitePaths;
use crate::weapon::{Weapon, WeaponClass};

const STATS_DIRECTORY: &str = "stats";

#[derive(Serialize)]
struct StatsPageContext<'a> {
    weapon: &'a Weapon,
    #[serde(rename = "DamageLocation")]
    damage_locations: BTreeMap<DamageLocation, &'static str>,
    faction_background_colors: BTreeMap<Faction, &'static str>,
    fire_group_background_classes: [&'static str; 2],
    fire_mode_background_classes: [&'static str; 2],
    with_stk_simulation: bool,
    with_magdump_simulation: bool,
    update_datetime: &'a str,
}

#[derive(Serialize)]
struct ChartPageContext<'a> {
    title: String,
    chart: &'a Value,
    faction_background_colors: BTreeMap<Faction, &'static str>,
    update_datetime: &'a str,
}

// Appends an extension without touching dots already in the file name.
fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut path: OsString = base.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// A chart is only reused when both its page and its spec were written.
#[must_use]
pub fn chart_exists(output_base: &Path) -> bool {
    with_suffix(output_base, "html").is_file() && with_suffix(output_base, "json").is_file()
}

/// Location of one magdump chart, both as a site URL path and on disk.  Neither has an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLocation {
    pub site_path: String,
    pub output_base: PathBuf,
}

impl ChartLocation {
    fn new(paths: &SitePaths, folder: &str, base_file_name: String) -> Self {
        ChartLocation {
            site_path: format!("{SIMULATIONS_DIRECTORY}/{folder}/{base_file_name}"),
            output_base: paths.simulations().join(folder).join(base_file_name),
        }
    }

    /// `weapon_base` is the weapon's [`Weapon::base_file_name`].
    #[must_use]
    pub fn fire_group(paths: &SitePaths, weapon_base: &str, fire_group_id: u32) -> Self {
        ChartLocation::new(
            paths,
            INFANTRY_WEAPONS_FOLDER,
            format!("{weapon_base}-fg{fire_group_id}-magdump"),
        )
    }

    #[must_use]
    pub fn fire_mode(paths: &SitePaths, weapon_base: &str, fire_group_id: u32, fire_mode_id: u32) -> Self {
        ChartLocation::new(
            paths,
            INFANTRY_WEAPONS_FOLDER,
            format!("{weapon_base}-fg{fire_group_id}-fm{fire_mode_id}-magdump"),
        )
    }
}

/// Generates the pages of one weapon at a time.  Shared by every worker.
pub struct PageGenerator {
    paths: SitePaths,
    renderer: Renderer,
    update_simulations: bool,
    test_mode: bool,
    update_datetime: String,
}

impl PageGenerator {
    #[must_use]
    pub fn new(paths: &SitePaths, update_simulations: bool, test_mode: bool, update_datetime: String) -> Self {
        PageGenerator {
            paths: paths.clone(),
            renderer: paths.renderer(),
            update_simulations,
            test_mode,
            update_datetime,
        }
    }

    #[must_use]
    pub fn stats_page_path(&self, weapon: &Weapon) -> PathBuf {
        let folder = match weapon.class {
            WeaponClass::Infantry => INFANTRY_WEAPONS_FOLDER,
            WeaponClass::Vehicle => VEHICLE_WEAPONS_FOLDER,
        };
        self.paths
            .site
            .join(STATS_DIRECTORY)
            .join(folder)
            .join(format!("{}.html", weapon.base_file_name()))
    }

    /// Compute, simulate and write everything shown on a weapon's stats page.
    ///
    /// # Errors
    /// Returns `Err` if a chart or the stats page cannot be written.
    pub fn generate(&self, mut weapon: Weapon) -> Result<()> {
        for fire_group in &mut weapon.fire_groups {
            for fire_mode in &mut fire_group.fire_modes {
                fire_mode.update_shots_to_kill_ranges(INFANTRY_HEALTH);
            }
        }

        let with_magdump_simulation =
            weapon.class == WeaponClass::Infantry && weapon.category.has_magdump_simulation();
        if with_magdump_simulation {
            if self.update_simulations {
                self.simulate_magdumps(&mut weapon)?;
            } else {
                self.reuse_magdumps(&mut weapon);
            }
        }

        let template = match weapon.class {
            WeaponClass::Infantry => INFANTRY_WEAPON_STATS_TEMPLATE_PATH,
            WeaponClass::Vehicle => VEHICLE_WEAPON_STATS_TEMPLATE_PATH,
        };
        let context = StatsPageContext {
            weapon: &weapon,
            damage_locations: damage_location_names(),
            faction_background_colors: faction_background_colors(),
            fire_group_background_classes: FIRE_GROUP_BACKGROUND_CLASSES,
            fire_mode_background_classes: FIRE_MODE_BACKGROUND_CLASSES,
            with_stk_simulation: true,
            with_magdump_simulation,
            update_datetime: &self.update_datetime,
        };

        let output_path = self.stats_page_path(&weapon);
        info!("Creating {}", output_path.display());
        self.renderer.render_to_file(template, &context, &output_path)
    }

    // Point every fire group and fire mode at the charts of a previous build, when they exist.
    fn reuse_magdumps(&self, weapon: &mut Weapon) {
        let weapon_base = weapon.base_file_name();
        let existing = |location: ChartLocation| {
            chart_exists(&location.output_base).then_some(location.site_path)
        };

        for fire_group in &mut weapon.fire_groups {
            let fire_group_id = fire_group.fire_group_id;
            fire_group.magdump_simulation_base_path =
                existing(ChartLocation::fire_group(&self.paths, &weapon_base, fire_group_id));
            for fire_mode in &mut fire_group.fire_modes {
                fire_mode.magdump_simulation_base_path = existing(ChartLocation::fire_mode(
                    &self.paths,
                    &weapon_base,
                    fire_group_id,
                    fire_mode.fire_mode_id,
                ));
            }
        }
    }

    fn simulate_magdumps(&self, weapon: &mut Weapon) -> Result<()> {
        info!("Simulating {} magdump", weapon.slug);
        let weapon_base = weapon.base_file_name();
        let mut rng = get_rng(self.test_mode, u64::from(weapon.item_id));
        let params = SimulationParams::new(0);
        let sizing = Sizing::Height(MAGDUMP_CHART_HEIGHT);

        for index in 0..weapon.fire_groups.len() {
            let fire_group = &weapon.fire_groups[index];
            let (fire_group_chart, fire_mode_charts) =
                generate_magdump_simulation(fire_group, MAGDUMP_RUNS, &params, sizing, &mut rng);

            let mut fire_group_path = None;
            if let Some(chart) = fire_group_chart {
                let location = ChartLocation::fire_group(&self.paths, &weapon_base, fire_group.fire_group_id);
                let title = format!(
                    "{} {} fire group magazine dump simulation",
                    weapon.name, fire_group.description
                );
                self.write_chart(&title, &chart, &location.output_base)?;
                fire_group_path = Some(location.site_path);
            }

            let mut fire_mode_paths = Vec::with_capacity(fire_group.fire_modes.len());
            for fire_mode in &fire_group.fire_modes {
                let Some(chart) = fire_mode_charts.get(&fire_mode.fire_mode_id) else {
                    fire_mode_paths.push(None);
                    continue;
                };
                let location = ChartLocation::fire_mode(
                    &self.paths,
                    &weapon_base,
                    fire_group.fire_group_id,
                    fire_mode.fire_mode_id,
                );
                let title = format!(
                    "{} {} {} magazine dump simulation",
                    weapon.name,
                    fire_group.description,
                    fire_mode.legend_label()
                );
                self.write_chart(&title, chart, &location.output_base)?;
                fire_mode_paths.push(Some(location.site_path));
            }

            let fire_group = &mut weapon.fire_groups[index];
            fire_group.magdump_simulation_base_path = fire_group_path;
            for (fire_mode, path) in fire_group.fire_modes.iter_mut().zip(fire_mode_paths) {
                fire_mode.magdump_simulation_base_path = path;
            }
        }
        Ok(())
    }

    fn write_chart(&self, title: &str, chart: &Value, output_base: &Path) -> Result<()> {
        if let Some(parent) = output_base.parent() {
            fs::create_dir_all(parent)?;
        }
        let json_path = with_suffix(output_base, "json");
        debug!("(PageGenerator.write_chart) Writing {}", json_path.display());
        fs::write(&json_path, serde_json::to_string(chart)?)?;

        let context = ChartPageContext {
            title: title.to_string(),
            chart,
            faction_background_colors: faction_background_colors(),
            update_datetime: &self.update_datetime,
        };
        self.renderer
            .render_to_file(CHART_TEMPLATE_PATH, &context, &with_suffix(output_base, "html"))
    }
}

/// Run `work` on every item on the blocking thread pool, at most `workers` at a time.  Returns the
/// number of items processed.
///
/// Once an item fails, items not yet started are skipped, but the ones already running are waited
/// for so nothing is still writing when this returns.
///
/// # Errors
/// Returns the first error, or `Err` if a worker panics.
pub async fn run_workers<T, F>(items: Vec<T>, workers: usize, work: F) -> Result<usize>
where
    T: Send + 'static,
    F: Fn(T) -> Result<()> + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let failed = Arc::new(AtomicBool::new(false));
    let count = items.len();

    let results: Vec<Result<()>> = futures::stream::iter(items)
        .map(|item| {
            let work = Arc::clone(&work);
            let failed = Arc::clone(&failed);
            tokio::task::spawn_blocking(move || {
                if failed.load(Ordering::Acquire) {
                    return Ok(());
                }
                work(item)
            })
        })
        .buffer_unordered(workers.max(1))
        .map(|joined| {
            let result = joined.map_err(Error::from).and_then(|result| result);
            if result.is_err() {
                failed.store(true, Ordering::Release);
            }
            result
        })
        .collect()
        .await;

    results.into_iter().collect::<Result<Vec<()>>>()?;
    Ok(count)
}

/// Generate every weapon's pages on a worker pool sized to the available parallelism.  Returns the
/// number of weapons processed.
///
/// # Errors
/// Returns `Err` from the first weapon that fails, or if a worker panics.
pub async fn generate_dynamic_pages(
    paths: &SitePaths,
    weapons: Vec<Weapon>,
    update_simulations: bool,
    test_mode: bool,
    update_datetime: String,
) -> Result<usize> {
    let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    debug!("(generate_dynamic_pages) Using {workers} workers.");

    let generator = PageGenerator::new(paths, update_simulations, test_mode, update_datetime);
    run_workers(weapons, workers, move |weapon| generator.generate(weapon)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("a/b-1-fg2-magdump"), "html"),
            PathBuf::from("a/b-1-fg2-magdump.html")
        );
        assert_eq!(with_suffix(Path::new("a/v1.5"), "json"), PathBuf::from("a/v1.5.json"));
    }

    #[test]
    fn test_chart_exists_needs_both_files() {
        let root = tempdir().unwrap();
        let base = root.path().join("chart");
        assert!(!chart_exists(&base));
        fs::write(with_suffix(&base, "html"), "").unwrap();
        assert!(!chart_exists(&base));
        fs::write(with_suffix(&base, "json"), "{}").unwrap();
        assert!(chart_exists(&base));
    }

    #[test_log::test(tokio::test)]
    async fn test_run_workers() {
        let done = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&done);
        let count = run_workers((0..10).collect(), 3, move |item: u32| {
            recorder.lock().unwrap().push(item);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(count, 10);
        let mut done = done.lock().unwrap().clone();
        done.sort_unstable();
        assert_eq!(done, (0..10).collect::<Vec<_>>());
    }

    #[test_log::test(tokio::test)]
    async fn test_run_workers_drains_after_failure() {
        let done = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&done);
        let result = run_workers((0..20).collect(), 2, move |item: u32| {
            std::thread::sleep(Duration::from_millis(20));
            if item == 1 {
                return Err(Error::MissingServiceId);
            }
            recorder.lock().unwrap().push(item);
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(Error::MissingServiceId)));
        let finished = done.lock().unwrap().len();
        assert!(finished < 19, "{finished} items ran after the failure");

        // Nothing still running once the error is returned.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(done.lock().unwrap().len(), finished);
    }
}
