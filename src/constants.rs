// Layout of the working tree, relative to the project root.
pub const SITE_DIRECTORY: &str = "site";
pub const TEMPLATES_DIRECTORY: &str = "templates";
pub const PAGES_DIRECTORY: &str = "pages";
pub const STATICS_DIRECTORY: &str = "statics";
pub const DATA_FILES_DIRECTORY: &str = "datafiles";
pub const SIMULATIONS_DIRECTORY: &str = "simulations";

// Statics are copied under this folder of the site.
pub const STATICS_FOLDER: &str = "statics";

pub const TEMPLATE_EXTENSION: &str = "html.jinja";

pub const INFANTRY_WEAPON_STATS_TEMPLATE_PATH: &str = "stats/infantry_weapon.html.jinja";
pub const VEHICLE_WEAPON_STATS_TEMPLATE_PATH: &str = "stats/vehicle_weapon.html.jinja";
pub const CHART_TEMPLATE_PATH: &str = "chart.html.jinja";

pub const INFANTRY_WEAPONS_FOLDER: &str = "infantry-weapons";
pub const VEHICLE_WEAPONS_FOLDER: &str = "vehicle-weapons";

pub const DEFAULT_BUCKET: &str = "gs://ps2.liquidwarp.net";
pub const DEFAULT_CSS_BUILD_COMMAND: &str = "npm run css-build";
pub const DEFAULT_SERVE_PORT: u16 = 8080;

// Magdump simulation settings used for the stats pages.
pub const MAGDUMP_RUNS: u32 = 50;
pub const MAGDUMP_CHART_HEIGHT: u32 = 600;

// Health plus shields of a standard infantry target.
pub const INFANTRY_HEALTH: f64 = 1000.0;

// Indexed by Faction as usize: None, VS, NC, TR, NSO.
pub const FACTION_BACKGROUND_COLORS: [&str; 5] = ["", "#352c4f", "#1a2b3d", "#692b34", ""];

// Alternating backgrounds for consecutive fire groups and fire modes on a stats page.
pub const FIRE_GROUP_BACKGROUND_CLASSES: [&str; 2] =
    ["has-background-grey-darker", "has-background-black-ter"];
pub const FIRE_MODE_BACKGROUND_CLASSES: [&str; 2] =
    ["has-background-black-bis", "has-background-dark"];
