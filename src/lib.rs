//! Static site generator for Planetside 2 weapon statistics.
//!
//! Weapon data is pulled from the Census API into data files, turned into typed weapons, enriched
//! with shots-to-kill ranges and magdump simulations, and rendered to minified HTML pages that can
//! be published to a bucket.  The binaries in `main.rs` and `bin/serve.rs` drive these steps.
pub mod bucket;
pub mod census;
pub mod chart;
pub mod constants;
pub mod dynamic_pages;
pub mod enums;
pub mod error;
pub mod fire_group;
pub mod pages;
pub mod render;
pub mod server;
pub mod simulation;
pub mod site;
pub mod stkr;
pub mod weapon;

pub use error::{Error, Result};
