//! The `pokebench build` command: materialize a generation's benchmark folder.

use std::path::PathBuf;

use clap::Args;
use pokebench_core::{Config, Generation, PokeBench};

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Generation to build (1-9)
    #[arg(short, long = "gen", value_parser = clap::value_parser!(u8).range(1..=9))]
    pub generation: u8,

    /// Benchmarks root; the folder is created as <out>/gen<N>
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Execute the build command.
pub async fn execute(args: BuildArgs, config: Config) -> anyhow::Result<()> {
    let generation = Generation::new(args.generation)?;
    let bench = PokeBench::new(config);
    let root = args.out.unwrap_or_else(|| bench.config().benchmarks_dir());

    let summary = bench.dataset_builder().build(generation, &root).await?;

    println!(
        "Built {} with {} Pokémon in {}",
        summary.generation,
        summary.count,
        summary.paths.dir.display()
    );
    for file in summary.files() {
        println!("  {}", file.display());
    }
    if !summary.fallbacks.is_empty() {
        eprintln!(
            "Warning: {} names could not be fetched and use placeholder labels",
            summary.fallbacks.len()
        );
    }
    Ok(())
}
