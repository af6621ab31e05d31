use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewport::{ProjectOptions, UnprojectOptions, Viewport, ViewportProps};

#[derive(Parser, Debug)]
#[command(author, version, about = "Project and unproject coordinates through a viewport")]
struct Args {
    /// Viewport props as JSON (see `ViewportProps`)
    #[arg(long)]
    props: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved camera state and matrices
    Describe,

    /// Coordinates (lng,lat[,meters] or x,y[,z]) to pixels
    Project {
        /// Flip pixel y to `height - y`
        #[arg(long)]
        top_left: bool,

        /// One or more `x,y` or `x,y,z` triples
        #[arg(required = true, allow_hyphen_values = true)]
        coords: Vec<String>,
    },

    /// Pixels back to coordinates on the plane `z = target_z`
    Unproject {
        /// Read pixel y as `height - y`
        #[arg(long)]
        top_left: bool,

        /// Target plane, unless the pixel carries a third component
        #[arg(long)]
        target_z: Option<f64>,

        /// One or more `x,y` or `x,y,target_z` pixels
        #[arg(required = true, allow_hyphen_values = true)]
        coords: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let viewport = load_viewport(&args.props)?;
    info!(
        id = viewport.id(),
        geospatial = viewport.is_geospatial(),
        zoom = viewport.zoom(),
        "viewport loaded"
    );

    match args.command {
        Command::Describe => {
            println!("{}", serde_json::to_string_pretty(&describe(&viewport))?);
        }
        Command::Project { top_left, coords } => {
            let opts = ProjectOptions { top_left };
            for raw in coords {
                let out = match parse_coordinate(&raw)? {
                    Coordinate::Xy(p) => viewport.project(p, opts)?.to_vec(),
                    Coordinate::Xyz(p) => viewport.project(p, opts)?.to_vec(),
                };
                println!("{}", json!(out));
            }
        }
        Command::Unproject {
            top_left,
            target_z,
            coords,
        } => {
            let opts = UnprojectOptions { top_left, target_z };
            for raw in coords {
                let out = match parse_coordinate(&raw)? {
                    Coordinate::Xy(p) => viewport.unproject(p, opts)?.map(|c| c.to_vec()),
                    Coordinate::Xyz(p) => viewport.unproject(p, opts)?.map(|c| c.to_vec()),
                };
                // `null` when the viewport cannot unproject.
                println!("{}", json!(out));
            }
        }
    }

    Ok(())
}

fn load_viewport(path: &Path) -> Result<Viewport, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let props = ViewportProps::from_json(&text)?;
    Ok(Viewport::new(props)?)
}

fn describe(viewport: &Viewport) -> serde_json::Value {
    json!({
        "id": viewport.id(),
        "x": viewport.x(),
        "y": viewport.y(),
        "width": viewport.width(),
        "height": viewport.height(),
        "geospatial": viewport.is_geospatial(),
        "longitude": viewport.longitude(),
        "latitude": viewport.latitude(),
        "zoom": viewport.zoom(),
        "scale": viewport.scale(),
        "center": viewport.center(),
        "distance_scales": viewport.distance_scales(),
        "camera_position": viewport.camera_position(),
        "camera_direction": viewport.camera_direction(),
        "camera_up": viewport.camera_up(),
        "invertible_view": viewport.has_invertible_view(),
        "view_matrix": viewport.view_matrix(),
        "projection_matrix": viewport.projection_matrix(),
        "pixel_projection_matrix": viewport.pixel_projection_matrix(),
        "pixel_unprojection_matrix": viewport.pixel_unprojection_matrix(),
    })
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Coordinate {
    Xy([f64; 2]),
    Xyz([f64; 3]),
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, Box<dyn std::error::Error>> {
    let parts = raw
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("coordinate {raw:?}: {e}"))?;
    match parts.as_slice() {
        [x, y] => Ok(Coordinate::Xy([*x, *y])),
        [x, y, z] => Ok(Coordinate::Xyz([*x, *y, *z])),
        _ => Err(format!("coordinate {raw:?} must be x,y or x,y,z").into()),
    }
}
