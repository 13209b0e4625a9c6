use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{command, Arg, ArgAction};

use poff_interp::host::Host;
use poff_interp::machine::Machine;
use poff_interp::subop::{FloatOp, LibOp, OsOp, SetOp, SysIoOp};
use poff_interp::{Error, Regions};

/// A minimal [`Host`] backing `prun`: `SYSIO` reads/writes go to stdin and
/// stdout regardless of the file number argument, and only the namespaces
/// a typical `WRITELN`/`READLN` program exercises are implemented; `FLOAT`
/// is implemented in full (its stack convention, one value in one value
/// out, is unambiguous). `LIB`/`SETOP` and `SYSIO`'s file/directory
/// sub-opcodes are out of scope for this default host — spec.md only
/// fixes their names, not a stack-argument order, so a real front end
/// supplying its own standard library would need to pick one anyway.
#[derive(Debug, Default)]
struct StdioHost;

impl Host for StdioHost {
    fn sysio(&mut self, op: SysIoOp, machine: &mut Machine<'_>) -> poff_interp::Result<()> {
        match op {
            SysIoOp::WriteLn => {
                println!();
            }
            SysIoOp::WriteInt | SysIoOp::WriteWord => {
                let v = machine.pop_word()?;
                print!("{}", v);
            }
            SysIoOp::WriteLong => {
                let v = machine.pop_long()?;
                print!("{}", v);
            }
            SysIoOp::WriteULong => {
                let v = machine.pop_long()? as u32;
                print!("{}", v);
            }
            SysIoOp::WriteChr => {
                let v = machine.pop_word()?;
                print!("{}", v as u8 as char);
            }
            SysIoOp::WriteStr => {
                let len = machine.pop_word()? as usize;
                let ptr = machine.pop_long()? as usize;
                let bytes = machine.read_bytes(ptr, len)?;
                io::stdout().write_all(bytes).ok();
            }
            SysIoOp::ReadLn => {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line).ok();
            }
            SysIoOp::ReadInt => {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line).ok();
                let v: i16 = line.trim().parse().unwrap_or(0);
                machine.push_word(v)?;
            }
            SysIoOp::ReadChr => {
                let mut buf = [0u8; 1];
                io::stdin().lock().read_exact(&mut buf).ok();
                machine.push_word(buf[0] as i16)?;
            }
            _ => {
                return Err(unsupported("SYSIO", op.mnemonic()));
            }
        }
        Ok(())
    }

    fn lib(&mut self, op: LibOp, _machine: &mut Machine<'_>) -> poff_interp::Result<()> {
        Err(unsupported("LIB", op.mnemonic()))
    }

    fn setop(&mut self, op: SetOp, _machine: &mut Machine<'_>) -> poff_interp::Result<()> {
        Err(unsupported("SETOP", op.mnemonic()))
    }

    fn float(&mut self, op: FloatOp, machine: &mut Machine<'_>) -> poff_interp::Result<()> {
        use FloatOp::*;
        match op {
            Float => {
                let v = machine.pop_word()?;
                machine.push_double(v as f64)?;
            }
            Trunc => {
                let v = machine.pop_double()?;
                machine.push_long(v.trunc() as i32)?;
            }
            Round => {
                let v = machine.pop_double()?;
                machine.push_long(v.round() as i32)?;
            }
            Add => binary_float(machine, |a, b| a + b)?,
            Sub => binary_float(machine, |a, b| a - b)?,
            Mul => binary_float(machine, |a, b| a * b)?,
            Div => binary_float(machine, |a, b| a / b)?,
            Mod => binary_float(machine, |a, b| a % b)?,
            Equ => compare_float(machine, |a, b| a == b)?,
            Neq => compare_float(machine, |a, b| a != b)?,
            Lt => compare_float(machine, |a, b| a < b)?,
            Gte => compare_float(machine, |a, b| a >= b)?,
            Gt => compare_float(machine, |a, b| a > b)?,
            Lte => compare_float(machine, |a, b| a <= b)?,
            Neg => unary_float(machine, |v| -v)?,
            Abs => unary_float(machine, |v| v.abs())?,
            Sqr => unary_float(machine, |v| v * v)?,
            Sqrt => unary_float(machine, |v| v.sqrt())?,
            Sin => unary_float(machine, |v| v.sin())?,
            Cos => unary_float(machine, |v| v.cos())?,
            Atan => unary_float(machine, |v| v.atan())?,
            Ln => unary_float(machine, |v| v.ln())?,
            Exp => unary_float(machine, |v| v.exp())?,
        }
        Ok(())
    }

    fn getenv(&mut self, machine: &mut Machine<'_>) -> poff_interp::Result<()> {
        let len = machine.pop_word()? as usize;
        let ptr = machine.pop_long()? as usize;
        let name = std::str::from_utf8(machine.read_bytes(ptr, len)?)
            .map_err(|_| unsupported("OSOP", OsOp::GetEnv.mnemonic()))?
            .to_owned();
        let value = std::env::var(&name).unwrap_or_default();
        let addr = machine.string_stack_allocate(value.len())?;
        machine.write_bytes(addr, value.as_bytes())?;
        machine.push_long(addr as i32)?;
        machine.push_word(value.len() as i16)?;
        Ok(())
    }
}

/// `TOS(0)` is the right-hand operand, `TOS(1)` the left, matching the
/// `LONGOP` arithmetic convention already established for 32-bit values.
fn binary_float(machine: &mut Machine<'_>, f: impl Fn(f64, f64) -> f64) -> poff_interp::Result<()> {
    let b = machine.pop_double()?;
    let a = machine.pop_double()?;
    machine.push_double(f(a, b))
}

fn compare_float(machine: &mut Machine<'_>, f: impl Fn(f64, f64) -> bool) -> poff_interp::Result<()> {
    let b = machine.pop_double()?;
    let a = machine.pop_double()?;
    machine.push_word(if f(a, b) { -1 } else { 0 })
}

fn unary_float(machine: &mut Machine<'_>, f: impl Fn(f64) -> f64) -> poff_interp::Result<()> {
    let v = machine.pop_double()?;
    machine.push_double(f(v))
}

fn unsupported(namespace: &str, mnemonic: &str) -> poff_interp::Error {
    Error::runtime(format!("{} {}: not implemented by this host", namespace, mnemonic))
}

fn main() -> Result<()> {
    let matches = command!()
        .max_term_width(100)
        .args(&[
            Arg::new("input")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("The linked POFF executable image to run"),
            Arg::new("alloc")
                .short('a')
                .long("alloc")
                .value_parser(clap::value_parser!(usize))
                .help("Globals region size, in bytes"),
            Arg::new("stack")
                .short('s')
                .long("stack")
                .value_parser(clap::value_parser!(usize))
                .help("Data stack size, in bytes"),
            Arg::new("strstack")
                .short('t')
                .long("strstack")
                .value_parser(clap::value_parser!(usize))
                .help("String stack size, in bytes"),
            Arg::new("heap")
                .short('n')
                .long("heap")
                .value_parser(clap::value_parser!(usize))
                .help("Heap size, in bytes"),
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        ])
        .get_matches();

    if matches.get_flag("debug") {
        env_logger::builder()
            .format_level(false)
            .format_target(false)
            .filter_module("poff_interp", log::LevelFilter::Debug)
            .init();
    }

    let in_path = matches.get_one::<PathBuf>("input").unwrap();
    let in_file = fs_open(in_path)?;
    let in_data = unsafe { memmap2::Mmap::map(&in_file) }
        .with_context(|| format!("Failed to map input file '{}'", in_path.display()))?;

    let mut regions = Regions::default();
    if let Some(v) = matches.get_one::<usize>("alloc") {
        regions.globals = *v;
    }
    if let Some(v) = matches.get_one::<usize>("stack") {
        regions.stack = *v;
    }
    if let Some(v) = matches.get_one::<usize>("strstack") {
        regions.string_stack = *v;
    }
    if let Some(v) = matches.get_one::<usize>("heap") {
        regions.heap = *v;
    }

    let mut host = StdioHost;
    let exit_code = match poff_interp::run(&in_data, regions, &mut host) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("prun: {}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn fs_open(path: &PathBuf) -> Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("Failed to open input file '{}'", path.display()))
}
