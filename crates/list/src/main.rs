use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{command, Arg, ArgAction};

use poff_list::Flags;

fn main() -> Result<()> {
    let matches = command!()
        .max_term_width(100)
        .args(&[
            Arg::new("input")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("The POFF unit or executable to list"),
            Arg::new("all")
                .short('a')
                .action(ArgAction::SetTrue)
                .help("Dump every section alongside the disassembly"),
            Arg::new("header")
                .short('h')
                .action(ArgAction::SetTrue)
                .help("Dump the file header"),
            Arg::new("lines")
                .short('l')
                .action(ArgAction::SetTrue)
                .help("Dump the line-number table"),
            Arg::new("symbols")
                .short('S')
                .action(ArgAction::SetTrue)
                .help("Dump the symbol table"),
            Arg::new("sections")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Dump the section summary"),
            Arg::new("relocations")
                .short('r')
                .action(ArgAction::SetTrue)
                .help("Dump the relocation table"),
            Arg::new("debug")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Dump the debug-function-info table"),
            Arg::new("hex")
                .short('H')
                .action(ArgAction::SetTrue)
                .help("Dump the raw program/rodata bytes"),
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
            .filter_module("poff_list", log::LevelFilter::Debug)
            .init();
    }

    let in_path = matches.get_one::<PathBuf>("input").unwrap();
    let in_file = fs::File::open(in_path)
        .with_context(|| format!("Failed to open input file '{}'", in_path.display()))?;
    let in_data = unsafe { memmap2::Mmap::map(&in_file) }
        .with_context(|| format!("Failed to map input file '{}'", in_path.display()))?;

    let container = poff::poff::read::parse(&in_data)
        .with_context(|| format!("Failed to parse input file '{}'", in_path.display()))?;

    let flags = if matches.get_flag("all") {
        Flags::all()
    } else {
        Flags {
            header: matches.get_flag("header"),
            lines: matches.get_flag("lines"),
            symbols: matches.get_flag("symbols"),
            section_summary: matches.get_flag("sections"),
            relocations: matches.get_flag("relocations"),
            debug_functions: matches.get_flag("debug"),
            hex: matches.get_flag("hex"),
        }
    };

    let output = poff_list::list(&container, flags)
        .with_context(|| format!("Failed to list '{}'", in_path.display()))?;
    print!("{}", output);

    Ok(())
}
