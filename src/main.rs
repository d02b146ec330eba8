//! Hyper tree grid generator binary.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>         Load a JSON source config (flags below override it)
//!   --descriptor <STRING>   Refinement descriptor (default: ".")
//!   --mask <STRING>         Material mask; enables masking
//!   --dimension <N>         Refined axes, 1..=3 (default: 3)
//!   --branch-factor <N>     Children per refined axis (default: 2)
//!   --max-level <N>         Maximum tree depth (default: 1)
//!   --size <X,Y,Z>          Root cells per axis (default: 1,1,1)
//!   --scale <X,Y,Z>         Root cell spacing per axis (default: 1,1,1)
//!   --dual                  Expose the dual grid
//!   --parallel              Build root trees on the rayon pool
//!   --jobs <N>              Rayon worker threads (default: rayon's choice)
//!   --save <PATH>           Write the resolved config as JSON
//!   --report <PATH>         Write a JSON report of the generated grid
//!   --dump                  Print every leaf id with its value

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use glam::{DVec3, UVec3};
use serde_json::json;

use hypergrid::core::{logging, Result};
use hypergrid::generation::{GridSource, SourceConfig};
use hypergrid::grid::HyperTreeGrid;

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            if e.is_descriptor_error() {
                log::error!("Check --descriptor, --mask and --size against each other");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let config = build_config(args)?;

    if let Some(jobs) = parse_usize_arg(args, "--jobs") {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("Could not configure thread pool: {}", e);
        }
    }

    if let Some(path) = parse_str_arg(args, "--save") {
        config.save(&path)?;
        log::info!("Saved config to {}", path);
    }

    let source = GridSource::new(config);
    let parallel = has_flag(args, "--parallel");

    println!("=== Hyper Tree Grid Source ===");
    println!("{}", source);
    println!();

    let start = Instant::now();
    let grid = if parallel {
        source.generate_parallel()?
    } else {
        source.generate()?
    };
    let elapsed = start.elapsed();

    let data = grid.leaf_data();
    println!("Trees:   {}", grid.tree_count());
    println!("Nodes:   {}", grid.forest().node_count());
    println!("Leaves:  {}", grid.number_of_leaves());
    println!("Levels:  {}", grid.number_of_levels());
    if data.has_mask() {
        println!("Blanked: {}", data.blanked_count());
    }
    println!(
        "Built in {:.2}ms ({})",
        elapsed.as_secs_f64() * 1000.0,
        if parallel { "parallel" } else { "sequential" }
    );

    if has_flag(args, "--dump") {
        dump_leaves(&grid);
    }

    if let Some(path) = parse_str_arg(args, "--report") {
        write_report(&source, &grid, PathBuf::from(path))?;
    }

    Ok(())
}

/// Start from `--config` (or defaults) and apply command-line overrides.
fn build_config(args: &[String]) -> Result<SourceConfig> {
    let mut config = match parse_str_arg(args, "--config") {
        Some(path) => {
            log::info!("Loading config from {}", path);
            SourceConfig::load(&path)?
        }
        None => SourceConfig::default(),
    };

    if let Some(descriptor) = parse_str_arg(args, "--descriptor") {
        config.descriptor = descriptor;
    }
    if let Some(mask) = parse_str_arg(args, "--mask") {
        config.material_mask = mask;
        config.use_material_mask = true;
    }
    if let Some(dimension) = parse_u32_arg(args, "--dimension") {
        config.dimension = dimension;
    }
    if let Some(factor) = parse_u32_arg(args, "--branch-factor") {
        config.branch_factor = factor;
    }
    if let Some(level) = parse_u32_arg(args, "--max-level") {
        config.max_level = level;
    }
    if let Some(size) = parse_u32_triple_arg(args, "--size") {
        config.grid_size = UVec3::from_array(size);
    }
    if let Some(scale) = parse_f64_triple_arg(args, "--scale") {
        config.grid_scale = DVec3::from_array(scale);
    }
    if has_flag(args, "--dual") {
        config.dual = true;
    }

    Ok(config)
}

fn dump_leaves(grid: &HyperTreeGrid) {
    let data = grid.leaf_data();
    println!();
    println!("{:>8}  {}", "leaf", data.name());
    for (id, value) in data.scalars().iter().enumerate() {
        if data.has_mask() && data.is_blanked(id) {
            println!("{:>8}  {} (blanked)", id, value);
        } else {
            println!("{:>8}  {}", id, value);
        }
    }
}

fn write_report(source: &GridSource, grid: &HyperTreeGrid, path: PathBuf) -> Result<()> {
    let config = source.config();
    let data = grid.leaf_data();
    let info = source.information();

    let report = json!({
        "config": config,
        "dimension": info.dimension,
        "origin": [info.origin.x, info.origin.y, info.origin.z],
        "trees": grid.tree_count(),
        "nodes": grid.forest().node_count(),
        "leaves": grid.number_of_leaves(),
        "levels": grid.number_of_levels(),
        "blanked": data.blanked_count(),
        "coordinates": [grid.coordinates(0), grid.coordinates(1), grid.coordinates(2)],
        "trees_detail": grid.forest().trees().iter().enumerate().map(|(i, tree)| {
            json!({"tree": i, "leaves": tree.leaf_count(), "levels": tree.number_of_levels()})
        }).collect::<Vec<_>>(),
    });

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    println!("Report: {}", path.display());
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_u32_triple_arg(args: &[String], flag: &str) -> Option<[u32; 3]> {
    let values: Vec<u32> = parse_str_arg(args, flag)?
        .split(',')
        .map(|s| s.trim().parse().ok())
        .collect::<Option<_>>()?;
    values.try_into().ok()
}

fn parse_f64_triple_arg(args: &[String], flag: &str) -> Option<[f64; 3]> {
    let values: Vec<f64> = parse_str_arg(args, flag)?
        .split(',')
        .map(|s| s.trim().parse().ok())
        .collect::<Option<_>>()?;
    values.try_into().ok()
}
