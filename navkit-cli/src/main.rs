//! Development CLI exercising `navkit-engine`'s public façade the way an
//! Android/iOS embedder would: load an OSM extract, ask for routes, or
//! replay a recorded `RawFix` stream through `update_location` and print
//! the resulting `MatchResult`s. This core makes no network calls of its
//! own; the CLI is purely an in-process harness around the façade.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use navkit_common::RawFix;
use navkit_engine::NavEngine;
use navkit_geo::LatLon;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "navkit")]
#[command(about = "Offline navigation core demo CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an OSM XML extract and report graph statistics.
    Load {
        /// Path to an OSM XML 0.6 file
        osm: PathBuf,
    },
    /// Load an OSM extract and compute routes between two points.
    Route {
        /// Path to an OSM XML 0.6 file
        osm: PathBuf,
        /// Start coordinate "lat,lon"
        #[arg(long)]
        from: String,
        /// End coordinate "lat,lon"
        #[arg(long)]
        to: String,
    },
    /// Replay a file of newline-delimited `RawFix` JSON through
    /// `update_location`, printing the resulting `MatchResult` stream.
    /// This is a terminal-driven development convenience that drives the
    /// façade directly, not a UI.
    Simulate {
        /// Path to an OSM XML 0.6 file
        osm: PathBuf,
        /// Destination coordinate "lat,lon"
        #[arg(long)]
        destination: String,
        /// Path to a file of newline-delimited `RawFix` JSON objects
        fixes: PathBuf,
    },
}

fn parse_coord(s: &str) -> Result<LatLon> {
    let (lat, lon) = s
        .split_once(',')
        .with_context(|| format!("coordinate '{s}' must be in the form 'lat,lon'"))?;
    Ok(LatLon::new(lat.trim().parse()?, lon.trim().parse()?))
}

fn load_engine(osm: &PathBuf) -> Result<NavEngine> {
    let mut engine = NavEngine::new();
    let file = File::open(osm).with_context(|| format!("opening {}", osm.display()))?;
    if !engine.load_osm(BufReader::new(file)) {
        bail!("failed to ingest {} as OSM XML", osm.display());
    }
    Ok(engine)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load { osm } => {
            let engine = load_engine(&osm)?;
            println!("loaded {}", osm.display());
            println!("nodes: {}", engine.node_count());
            println!("edges: {}", engine.edge_count());
        }
        Commands::Route { osm, from, to } => {
            let mut engine = load_engine(&osm)?;
            let from = parse_coord(&from)?;
            let to = parse_coord(&to)?;

            let path = engine.detailed_path(from, to, 100);
            println!("points: {}", path.len());
            for fix in &path {
                println!(
                    "{:.6},{:.6} bearing={:.1} speed={:.1}",
                    fix.pos.lat, fix.pos.lon, fix.bearing_deg, fix.speed_mps
                );
            }
        }
        Commands::Simulate { osm, destination, fixes } => {
            let mut engine = load_engine(&osm)?;
            let destination = parse_coord(&destination)?;
            if !engine.set_destination(destination) {
                bail!("set_destination rejected {destination:?}");
            }

            let file = File::open(&fixes).with_context(|| format!("opening {}", fixes.display()))?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let raw: RawFix = serde_json::from_str(&line)
                    .with_context(|| format!("parsing RawFix JSON: {line}"))?;
                let result = engine.update_location(raw);
                println!("{}", serde_json::to_string(&result)?);
            }
        }
    }

    Ok(())
}
