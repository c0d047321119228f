use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use log::{debug, info};

extern crate ps2stats;

use ps2stats::bucket::{clean_bucket, open_store, upload_to_bucket};
use ps2stats::census::CensusClient;
use ps2stats::constants::{DEFAULT_BUCKET, DEFAULT_CSS_BUILD_COMMAND};
use ps2stats::site::{
    clean_site, copy_statics, generate_css, generate_pages, update_all_data_files, SitePaths,
};
use ps2stats::Error;

/// Build and publish the Planetside 2 weapon statistics site.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("action").required(true).multiple(false)))]
struct Args {
    /// Update the data files from Census and generate every page
    #[arg(long, group = "action")]
    generate_all: bool,

    /// Upload the site to the bucket
    #[arg(long, group = "action")]
    upload: bool,

    /// Clean, build CSS, update data, generate pages, copy statics and upload
    #[arg(long, group = "action")]
    update: bool,

    /// Copy the statics into the site
    #[arg(long, group = "action")]
    copy_statics: bool,

    /// Build the site CSS
    #[arg(long, group = "action")]
    generate_css: bool,

    /// Delete the local site
    #[arg(long, group = "action")]
    clean_local: bool,

    /// Delete every object of the bucket
    #[arg(long, group = "action")]
    clean_remote: bool,

    /// Census service id, required to update the data files
    #[arg(long, env = "CENSUS_SERVICE_ID", hide_env_values = true)]
    census_service_id: Option<String>,

    /// Bucket to publish to: gs://<bucket> or a local directory
    #[arg(short, long, env = "PS2STATS_BUCKET", default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// Only upload site files whose path starts with this prefix
    #[arg(long, default_value = "")]
    prefix: String,

    /// Project root holding the templates, pages, statics, datafiles and site directories
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Command building the CSS, run from the project root
    #[arg(long, default_value = DEFAULT_CSS_BUILD_COMMAND)]
    css_command: String,

    /// Reuse magdump charts of the previous build instead of simulating again
    #[arg(long)]
    skip_simulations: bool,

    /// Run in test mode. Specifically, this will use a fixed random number generator.
    #[arg(short, long)]
    test: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init();
    let args = Args::parse();
    debug!("(main) Arguments: {args:?}");

    let paths = SitePaths::new(&args.root);

    if args.update || args.clean_local {
        clean_site(&paths)?;
    }

    if args.update || args.generate_css {
        generate_css(&paths, &args.css_command).await?;
    }

    if args.update || args.generate_all {
        let service_id = args.census_service_id.as_deref().ok_or(Error::MissingServiceId)?;
        update_all_data_files(&paths, &CensusClient::new(service_id)).await?;
        generate_pages(&paths, !args.skip_simulations, args.test).await?;
    }

    if args.update || args.copy_statics {
        let copied = copy_statics(&paths)?;
        info!("Copied {copied} statics");
    }

    if args.clean_remote {
        let store = open_store(&args.bucket).await?;
        let deleted = clean_bucket(store.as_ref()).await?;
        info!("Deleted {deleted} objects from {}", args.bucket);
    }

    if args.update || args.upload {
        let store = open_store(&args.bucket).await?;
        let uploaded = upload_to_bucket(store.as_ref(), &paths.site, &args.prefix).await?;
        info!("Uploaded {uploaded} files to {}", args.bucket);
    }

    Ok(())
}
