//! Predefined pages: every template under the pages directory rendered once with site wide data.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use walkdir::WalkDir;

use crate::constants::TEMPLATE_EXTENSION;
use crate::enums::{DamageLocation, Faction, ItemCategory, Labeled};
use crate::error::Result;
use crate::render::Renderer;
use crate::site::SitePaths;
use crate::weapon::{group_by_faction_category, Weapon, WeaponClass, WeaponsByFactionCategory};

#[must_use]
pub fn faction_background_colors() -> BTreeMap<Faction, &'static str> {
    Faction::ALL
        .into_iter()
        .map(|faction| (faction, faction.background_color()))
        .collect()
}

#[must_use]
pub fn damage_location_names() -> BTreeMap<DamageLocation, &'static str> {
    DamageLocation::ALL
        .into_iter()
        .map(|location| (location, location.label()))
        .collect()
}

#[derive(Serialize)]
struct PredefinedPageContext<'a> {
    #[serde(rename = "DamageLocation")]
    damage_locations: BTreeMap<DamageLocation, &'static str>,
    #[serde(rename = "ItemCategory")]
    item_categories: BTreeMap<ItemCategory, &'static str>,
    faction_background_colors: BTreeMap<Faction, &'static str>,
    faction_category_infantry_weapons: WeaponsByFactionCategory<'a>,
    faction_category_vehicle_weapons: WeaponsByFactionCategory<'a>,
    update_datetime: &'a str,
}

/// A page template and the site file it renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedPage {
    pub template: String,
    pub output_path: PathBuf,
}

/// Find every page template, mirroring its location under the pages directory into the site.
///
/// `weapons/index.html.jinja` renders to `weapons/index.html`.
///
/// # Errors
/// Returns `Err` if the pages directory cannot be walked.
pub fn find_predefined_pages(pages_directory: &Path, site_directory: &Path) -> Result<Vec<PredefinedPage>> {
    let suffix = format!(".{TEMPLATE_EXTENSION}");
    let mut pages = Vec::new();

    for entry in WalkDir::new(pages_directory).sort_by_file_name() {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file() || !file_name.ends_with(&suffix) {
            continue;
        }

        let relative = entry.path().strip_prefix(pages_directory)?;
        let template = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let stem = file_name.split('.').next().unwrap_or_default();
        let mut output_path = site_directory.to_path_buf();
        if let Some(parent) = relative.parent() {
            output_path.push(parent);
        }
        output_path.push(format!("{stem}.html"));

        pages.push(PredefinedPage {
            template,
            output_path,
        });
    }

    Ok(pages)
}

/// Render every predefined page.  Returns the number of pages written.
///
/// # Errors
/// Returns `Err` if a page fails to render or cannot be written.
pub fn generate_predefined_pages(
    paths: &SitePaths,
    renderer: &Renderer,
    weapons: &[Weapon],
    update_datetime: &str,
) -> Result<usize> {
    let infantry = weapons.iter().filter(|w| w.class == WeaponClass::Infantry);
    let vehicle = weapons.iter().filter(|w| w.class == WeaponClass::Vehicle);

    let context = PredefinedPageContext {
        damage_locations: damage_location_names(),
        item_categories: weapons.iter().map(|w| (w.category, w.category.label())).collect(),
        faction_background_colors: faction_background_colors(),
        faction_category_infantry_weapons: group_by_faction_category(infantry),
        faction_category_vehicle_weapons: group_by_faction_category(vehicle),
        update_datetime,
    };

    let pages = find_predefined_pages(&paths.pages, &paths.site)?;
    for page in &pages {
        info!("Creating {}", page.output_path.display());
        renderer.render_to_file(&page.template, &context, &page.output_path)?;
    }

    Ok(pages.len())
}
