//! Inspect and render OTMM minimap files
//!
//! Run with: cargo run --bin otmm -- info minimap.otmm

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use otmm_minimap::codec::LAYER_COUNT;
use otmm_minimap::{
    Canvas, Color, DrawList, Minimap, MinimapConfig, Position, Rect, Size, SoftwareTextures,
};

#[derive(Parser)]
#[command(name = "otmm")]
#[command(about = "Inspect and render OTMM minimap files")]
struct Cli {
    /// JSON file with minimap settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RenderArgs {
    file: PathBuf,
    #[arg(long)]
    x: u16,
    #[arg(long)]
    y: u16,
    #[arg(long)]
    z: u8,
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(i32).range(1..))]
    width: i32,
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(i32).range(1..))]
    height: i32,
    /// Marker list as a JSON array
    #[arg(long)]
    markers: Option<PathBuf>,
    /// Directory the marker atlas path is resolved against
    #[arg(long)]
    atlas_root: Option<PathBuf>,
    /// Reference image imported below explored tiles
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    image_x: u16,
    #[arg(long, default_value_t = 0)]
    image_y: u16,
    #[arg(long, default_value_t = 1.0)]
    color_factor: f32,
    #[arg(long)]
    out: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Header and block counts
    Info {
        file: PathBuf,
    },
    /// Draw a view of the minimap into a PNG
    Render(RenderArgs),
    /// Print one stored tile
    Tile {
        file: PathBuf,
        #[arg(long)]
        x: u16,
        #[arg(long)]
        y: u16,
        #[arg(long)]
        z: u8,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_config(path: Option<&Path>) -> CliResult<MinimapConfig> {
    Ok(match path {
        Some(path) => MinimapConfig::from_json_file(path)?,
        None => MinimapConfig::default(),
    })
}

fn open(config: Option<&Path>, file: &Path) -> CliResult<Minimap> {
    let minimap = Minimap::new(load_config(config)?);
    let report = minimap.load_otmm(file)?;
    if report.truncated {
        eprintln!("warning: {} is truncated, loaded {} blocks", file.display(), report.blocks);
    }
    Ok(minimap)
}

fn info(config: Option<&Path>, file: &Path) -> CliResult<()> {
    let minimap = Minimap::new(load_config(config)?);
    let report = minimap.load_otmm(file)?;

    println!("File:        {}", file.display());
    println!("Description: {}", report.description);
    println!("Blocks:      {}", report.blocks);
    println!("Truncated:   {}", report.truncated);
    for z in 0..LAYER_COUNT as u8 {
        let count = minimap.layer_block_count(z);
        if count > 0 {
            println!("  floor {:2}: {} blocks", z, count);
        }
    }
    Ok(())
}

fn render(config: Option<&Path>, args: RenderArgs) -> CliResult<()> {
    let minimap = open(config, &args.file)?;
    if let Some(markers) = &args.markers {
        let count = minimap.load_markers_from_json(markers)?;
        println!("Loaded {} markers", count);
    }
    if let Some(image) = &args.image {
        let top_left = Position::new(args.image_x, args.image_y, args.z);
        let tiles = minimap.load_image(image, top_left, args.color_factor)?;
        println!("Imported {} tiles from {}", tiles, image.display());
    }

    let mut textures = match args.atlas_root {
        Some(root) => SoftwareTextures::with_root(root),
        None => SoftwareTextures::new(),
    };
    let screen = Rect::new(0, 0, args.width, args.height);
    let center = Position::new(args.x, args.y, args.z);
    let mut list = DrawList::new();
    minimap.draw(&mut list, &mut textures, screen, center, args.scale, Color::BLACK);

    let mut canvas = Canvas::new(Size::new(args.width, args.height), Color::BLACK);
    canvas.render(&list, &textures);
    canvas.save_png(&args.out)?;
    println!(
        "Rendered {}x{} around ({}, {}, {}) to {}",
        args.width, args.height, args.x, args.y, args.z, args.out.display()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Info { file } => info(config, &file),
        Commands::Render(args) => render(config, args),
        Commands::Tile { file, x, y, z } => open(config, &file).map(|minimap| {
            let tile = minimap.get_tile(Position::new(x, y, z));
            let out = json!({
                "position": { "x": x, "y": y, "z": z },
                "color": tile.color,
                "flags": format!("{:?}", tile.flags),
                "seen": tile.was_seen(),
                "walkable": tile.is_walkable(),
                "pathable": tile.is_pathable(),
                "ground_speed": tile.ground_speed(),
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
