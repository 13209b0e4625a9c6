use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{command, Arg, ArgAction};

fn main() -> Result<()> {
    let matches = command!()
        .max_term_width(100)
        .args(&[
            Arg::new("input")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("The input POFF unit (.o1)"),
            Arg::new("output")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf))
                .help("The output POFF unit (.o). Defaults to <input> with its extension replaced"),
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        ])
        .get_matches();

    if matches.get_flag("verbose") {
        env_logger::builder()
            .format_level(false)
            .format_target(false)
            .filter_module("poff_optimize", log::LevelFilter::Debug)
            .init();
    }

    let in_path = matches.get_one::<PathBuf>("input").unwrap();
    let out_path = match matches.get_one::<PathBuf>("output") {
        Some(path) => path.clone(),
        None => in_path.with_extension("o"),
    };

    let in_file = fs::File::open(in_path)
        .with_context(|| format!("Failed to open input file '{}'", in_path.display()))?;
    let in_data = unsafe { memmap2::Mmap::map(&in_file) }
        .with_context(|| format!("Failed to map input file '{}'", in_path.display()))?;
    let in_data = &*in_data;

    let container = poff::poff::read::parse(in_data)
        .with_context(|| format!("Failed to parse input file '{}'", in_path.display()))?;

    let output_bytes = poff_optimize::optimize(&container)
        .with_context(|| format!("Failed to optimize '{}'", in_path.display()))?;

    fs::write(&out_path, output_bytes)
        .with_context(|| format!("Failed to write output file '{}'", out_path.display()))?;

    Ok(())
}
