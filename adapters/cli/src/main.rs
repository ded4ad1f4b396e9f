#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for inspecting warren maps, areas and paths.

mod layout_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use warren_core::{Command, MoverId, PathOptions, Side, TileCoord, Vec2, WallSpec};
use warren_system_navigation::PathFollower;
use warren_world::{self as world, query, World, WorldConfig};

const DEFAULT_LOG_FILTER: &str = "warren=info";
const MAX_WALK_STEPS: usize = 10_000;
const TICK: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(
    name = "warren",
    version,
    about = "Inspect tile maps, wall-bounded areas and paths"
)]
struct Cli {
    /// TOML file holding the world configuration.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Layout string as printed by `warren demo`.
    #[arg(long, value_name = "LAYOUT", global = true)]
    layout: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// List every area with its size and door links.
    Areas,
    /// Search a grid path between two tiles.
    Path {
        /// Start tile as `column,row`.
        #[arg(long, value_parser = parse_tile)]
        from: TileCoord,
        /// Goal tile as `column,row`.
        #[arg(long, value_parser = parse_tile)]
        to: TileCoord,
        /// Drop waypoints a straight walkable segment can skip.
        #[arg(long)]
        optimise: bool,
    },
    /// Walk a mover between two tiles, crossing areas through doors.
    Walk {
        /// Start tile as `column,row`.
        #[arg(long, value_parser = parse_tile)]
        from: TileCoord,
        /// Goal tile as `column,row`.
        #[arg(long, value_parser = parse_tile)]
        to: TileCoord,
        /// Distance covered per tick in tiles.
        #[arg(long, default_value_t = 0.25)]
        speed: f32,
    },
    /// Print the layout string of a sample map with two rooms.
    Demo,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => WorldConfig::default(),
    };

    match cli.action {
        Action::Demo => {
            let layout = demo_world(config).layout();
            println!("{}", layout_transfer::encode(&layout)?);
        }
        Action::Areas => list_areas(&build_world(config, cli.layout.as_deref())?),
        Action::Path { from, to, optimise } => {
            let world = build_world(config, cli.layout.as_deref())?;
            print_path(&world, from, to, optimise)?;
        }
        Action::Walk { from, to, speed } => {
            let mut world = build_world(config, cli.layout.as_deref())?;
            walk(&mut world, from, to, speed)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<WorldConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse_config(text: &str) -> Result<WorldConfig> {
    Ok(toml::from_str(text)?)
}

fn build_world(config: WorldConfig, layout: Option<&str>) -> Result<World> {
    let Some(encoded) = layout else {
        return Ok(World::with_config(config));
    };
    let layout = layout_transfer::decode(encoded).context("could not decode layout string")?;
    let world = World::from_layout(config, &layout).context("layout does not fit its grid")?;
    debug!(areas = query::area_count(&world), "layout loaded");
    Ok(world)
}

fn parse_tile(value: &str) -> Result<TileCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    Ok(TileCoord::new(column, row))
}

/// Ten by eight map: a solid pillar line in the west and two rooms joined by doors.
fn demo_world(config: WorldConfig) -> World {
    let mut world = World::with_config(config.with_dimensions(10, 8));
    let mut commands = Vec::new();

    for row in 1..6 {
        commands.push(Command::SetTileSolid {
            tile: TileCoord::new(2, row),
            solid: true,
        });
    }
    for column in 0..10 {
        commands.push(Command::SetTileSurface {
            tile: TileCoord::new(column, 7),
            paved: true,
        });
    }

    let mut wall = |column: u32, row: u32, side: Side, door: bool| {
        commands.push(Command::PlaceWall {
            tile: TileCoord::new(column, row),
            side,
            spec: WallSpec::new(if door { "walls/door" } else { "walls/brick" }),
            door,
        });
    };
    for column in 5..9 {
        wall(column, 1, Side::North, false);
        wall(column, 5, Side::South, false);
    }
    for row in 1..6 {
        wall(5, row, Side::West, row == 3);
        wall(8, row, Side::East, false);
    }
    for row in 1..6 {
        wall(6, row, Side::East, row == 4);
    }

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    world
}

fn list_areas(world: &World) {
    for area in query::areas(world) {
        let color = area.color();
        let links: Vec<String> = area
            .connected_areas()
            .map(|other| format!("{}x{}", other.get(), area.doors_to(other).len()))
            .collect();
        println!(
            "#{:<3} {:<10} tiles={:<4} color=#{:02x}{:02x}{:02x} doors=[{}]",
            area.id().get(),
            area.name(),
            area.tile_count(),
            color.red(),
            color.green(),
            color.blue(),
            links.join(", ")
        );
    }
}

fn print_path(world: &World, from: TileCoord, to: TileCoord, optimise: bool) -> Result<()> {
    let options = PathOptions {
        optimise,
        ..PathOptions::walkable_optimised()
    };
    let Some(waypoints) = query::find_path(world, from.center(), to.center(), options) else {
        bail!("no path from {} to {}", describe(from), describe(to));
    };
    for point in waypoints {
        println!("{:.1},{:.1}", point.x, point.y);
    }
    Ok(())
}

fn walk(world: &mut World, from: TileCoord, to: TileCoord, speed: f32) -> Result<()> {
    let mut follower = PathFollower::new(MoverId::new(1), from.center());
    let mut commands = Vec::new();
    if !follower.path_to(world, to.center(), &mut commands) {
        bail!("no area route from {} to {}", describe(from), describe(to));
    }

    let mut last_tile = Some(from);
    report_position(world, follower.position());
    for _ in 0..MAX_WALK_STEPS {
        let mut events = Vec::new();
        for command in commands.drain(..) {
            world::apply(world, command, &mut events);
        }
        world::apply(world, Command::Tick { dt: TICK }, &mut events);
        follower.handle(&events, world, &mut commands);

        let arrived = follower.follow_path(world, speed, &mut commands);
        let tile = query::tile_at(world, follower.position());
        if tile != last_tile {
            report_position(world, follower.position());
            last_tile = tile;
        }
        if arrived {
            info!(ticks = query::tick_index(world), "mover arrived");
            return Ok(());
        }
        if !follower.has_path() {
            bail!("mover lost its path after {} ticks", query::tick_index(world));
        }
    }

    bail!("mover did not arrive within {MAX_WALK_STEPS} ticks")
}

fn report_position(world: &World, position: Vec2) {
    let area = query::area_at(world, position).map_or("-", |area| area.name());
    println!("{:.2},{:.2} {area}", position.x, position.y);
}

fn describe(tile: TileCoord) -> String {
    format!("{},{}", tile.column(), tile.row())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tile_arguments() {
        assert_eq!(parse_tile("3, 4"), Ok(TileCoord::new(3, 4)));
        assert!(parse_tile("3").is_err());
        assert!(parse_tile("a,1").is_err());
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config = parse_config("columns = 24\npath_budget_per_tick = 2\n").expect("config");
        assert_eq!(config.columns, 24);
        assert_eq!(config.rows, WorldConfig::default().rows);
        assert_eq!(config.path_budget_per_tick, 2);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(parse_config("cells_per_tile = 4\n").is_err());
    }

    #[test]
    fn demo_layout_reloads_with_the_same_areas() {
        let demo = demo_world(WorldConfig::default());
        assert_eq!(query::area_count(&demo), 3);

        let encoded = layout_transfer::encode(&demo.layout()).expect("encode");
        let reloaded = build_world(WorldConfig::default(), Some(&encoded)).expect("reload");
        assert_eq!(query::area_count(&reloaded), 3);
        assert_eq!(reloaded.layout(), demo.layout());
    }

    #[test]
    fn demo_walk_crosses_both_rooms() {
        let mut demo = demo_world(WorldConfig::default());
        walk(&mut demo, TileCoord::new(0, 0), TileCoord::new(7, 3), 0.5).expect("walk");
    }
}
