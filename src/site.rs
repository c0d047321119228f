//! The steps of a site build, each runnable on its own from the command line.
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::census::{CensusClient, DataFile};
use crate::constants::{
    DATA_FILES_DIRECTORY, PAGES_DIRECTORY, SIMULATIONS_DIRECTORY,
    SITE_DIRECTORY, STATICS_DIRECTORY, STATICS_FOLDER, TEMPLATES_DIRECTORY,
};
use crate::dynamic_pages::generate_dynamic_pages;
use crate::error::{Error, Result};
use crate::pages::generate_predefined_pages;
use crate::render::{format_update_datetime, Renderer};
use crate::weapon::load_weapons;

/// Directory layout of a site project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub site: PathBuf,
    pub templates: PathBuf,
    pub pages: PathBuf,
    pub statics: PathBuf,
    pub datafiles: PathBuf,
}

impl SitePaths {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        SitePaths {
            root: root.to_path_buf(),
            site: root.join(SITE_DIRECTORY),
            templates: root.join(TEMPLATES_DIRECTORY),
            pages: root.join(PAGES_DIRECTORY),
            statics: root.join(STATICS_DIRECTORY),
            datafiles: root.join(DATA_FILES_DIRECTORY),
        }
    }

    #[must_use]
    pub fn simulations(&self) -> PathBuf {
        self.site.join(SIMULATIONS_DIRECTORY)
    }

    #[must_use]
    pub fn renderer(&self) -> Renderer {
        Renderer::new(&self.templates, &self.pages)
    }
}

/// Delete everything inside the site directory, keeping the directory itself.
///
/// # Errors
/// Returns `Err` if an entry cannot be removed.
pub fn clean_site(paths: &SitePaths) -> Result<()> {
    info!("Cleaning site");
    if !paths.site.exists() {
        debug!("(clean_site) {} does not exist, nothing to clean.", paths.site.display());
        return Ok(());
    }

    for entry in fs::read_dir(&paths.site)? {
        let path = entry?.path();
        info!("Deleting {}", path.display());
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Run the CSS build command from the project root.
///
/// # Errors
/// Returns `Err` if the command cannot be started or exits with a failure status.
pub async fn generate_css(paths: &SitePaths, command: &str) -> Result<()> {
    info!("Generating CSS with `{command}`");
    let mut words = command.split_whitespace();
    let Some(program) = words.next() else {
        return Ok(());
    };

    let status = tokio::process::Command::new(program)
        .args(words)
        .current_dir(&paths.root)
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command: command.to_string(),
            status,
        })
    }
}

/// Refresh every data file from Census.
///
/// # Errors
/// Returns `Err` on the first data file that cannot be fetched or written.
pub async fn update_all_data_files(paths: &SitePaths, client: &CensusClient) -> Result<()> {
    fs::create_dir_all(&paths.datafiles)?;
    for data_file in DataFile::ALL {
        let count = client.update_data_file(data_file, &paths.datafiles).await?;
        info!("Updated {} with {count} records", data_file.file_name());
    }
    Ok(())
}

/// Generate the predefined pages and the weapon stats pages from the data files.
///
/// With `update_simulations` unset, magdump charts from a previous build are reused instead of
/// being simulated again.  `test_mode` makes the simulations reproducible.
///
/// # Errors
/// Returns `Err` if the data files cannot be loaded or a page fails to generate.
pub async fn generate_pages(paths: &SitePaths, update_simulations: bool, test_mode: bool) -> Result<()> {
    let weapons = load_weapons(&paths.datafiles)?;
    info!("Loaded {} weapons", weapons.len());

    let update_datetime = format_update_datetime(chrono::Utc::now());
    let renderer = paths.renderer();

    let predefined = generate_predefined_pages(paths, &renderer, &weapons, &update_datetime)?;
    info!("Generated {predefined} predefined pages");

    let dynamic =
        generate_dynamic_pages(paths, weapons, update_simulations, test_mode, update_datetime).await?;
    info!("Generated {dynamic} weapon pages");
    Ok(())
}

/// Copy the statics directory under the site, preserving relative paths.  Returns the number of
/// files copied.
///
/// # Errors
/// Returns `Err` if the statics cannot be walked or a file cannot be copied.
pub fn copy_statics(paths: &SitePaths) -> Result<usize> {
    let destination_root = paths.site.join(STATICS_FOLDER);
    let mut copied = 0;

    for entry in WalkDir::new(&paths.statics) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(&paths.statics)?;
        let destination = destination_root.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("Copying {}", destination.display());
        fs::copy(entry.path(), &destination)?;
        copied += 1;
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_site_paths() {
        let paths = SitePaths::new(Path::new("/project"));
        assert_eq!(paths.site, Path::new("/project/site"));
        assert_eq!(paths.datafiles, Path::new("/project/datafiles"));
        assert_eq!(paths.simulations(), Path::new("/project/site/simulations"));
    }

    #[test]
    fn test_clean_site() {
        let root = tempdir().unwrap();
        let paths = SitePaths::new(root.path());
        fs::create_dir_all(paths.site.join("stats/infantry-weapons")).unwrap();
        fs::write(paths.site.join("index.html"), "x").unwrap();
        fs::write(paths.site.join("stats/infantry-weapons/a.html"), "x").unwrap();

        clean_site(&paths).unwrap();

        assert!(paths.site.is_dir());
        assert_eq!(fs::read_dir(&paths.site).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_missing_site() {
        let root = tempdir().unwrap();
        clean_site(&SitePaths::new(root.path())).unwrap();
    }

    #[test]
    fn test_copy_statics() {
        let root = tempdir().unwrap();
        let paths = SitePaths::new(root.path());
        fs::create_dir_all(paths.statics.join("css")).unwrap();
        fs::write(paths.statics.join("css/main.css"), "body{}").unwrap();
        fs::write(paths.statics.join("favicon.ico"), "icon").unwrap();

        assert_eq!(copy_statics(&paths).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(paths.site.join("statics/css/main.css")).unwrap(),
            "body{}"
        );
        assert!(paths.site.join("statics/favicon.ico").is_file());
    }

    #[test_log::test(tokio::test)]
    async fn test_generate_css_failure() {
        let root = tempdir().unwrap();
        let paths = SitePaths::new(root.path());
        generate_css(&paths, "true").await.unwrap();
        let err = generate_css(&paths, "false").await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
