use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use log::info;

/// Dumps the points in an .ov2 file as GeoJSON next to it, to check output in a map viewer.
fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        bail!("Pass in an .ov2 file");
    }
    let input = PathBuf::from(&args[1]);
    let bytes = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    let pois = ov2::decode(&bytes).with_context(|| format!("decoding {}", input.display()))?;
    info!("Got {} points", pois.len());

    let mut features = Vec::new();
    for poi in pois {
        let mut f = Feature::from(Geometry::from(geojson::Value::Point(vec![poi.lon, poi.lat])));
        f.set_property("name", poi.name);
        features.push(f);
    }
    let gj = GeoJson::from(features.into_iter().collect::<FeatureCollection>());

    let output = input.with_extension("geojson");
    std::fs::write(&output, serde_json::to_string_pretty(&gj)?)?;
    info!("Wrote {}", output.display());
    Ok(())
}
