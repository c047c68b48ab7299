use anyhow::Result;
use civicmap::{LookupEngine, LookupOutcome, RegionBounds};

use crate::cli::{Cli, LookupArgs};

pub fn run(cli: &Cli, args: &LookupArgs) -> Result<()> {
    let store = super::build_store(cli)?;
    let engine = LookupEngine::new(store, RegionBounds::los_angeles());

    let outcome = match engine.query_point(args.lat, args.lon) {
        Ok(results) => LookupOutcome::success(args.lat, args.lon, results),
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&LookupOutcome::error(format!("{e}")))?);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
