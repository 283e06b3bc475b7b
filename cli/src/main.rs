mod attack;
mod generate;
mod list;
mod search;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{value_parser, ArgAction, Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use unhash_core::{
    DEFAULT_ALGORITHM, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH, MAX_LENGTH_ALLOWED,
};

use attack::{brute, dict, rainbow};
use generate::generate;
use list::list;

/// Finds the plaintext behind a hash digest.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The hash algorithm, case insensitive. Run `unhash list` to see them all.
    #[arg(short = 't', long = "type", global = true, default_value = DEFAULT_ALGORITHM)]
    algorithm: String,

    /// Log more. Can be repeated.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Brute(Brute),
    Dict(Dict),
    Rainbow(Rainbow),
    Generate(Generate),
    List,
}

/// Try every string made of a charset, shortest first.
#[derive(Args)]
pub struct Brute {
    /// The digest to find, in hexadecimal.
    #[arg(value_parser = check_hex)]
    digest: String,

    /// The charset to use, replacing the preset.
    #[arg(short, long)]
    charset: Option<String>,

    /// The charset presets: a (lowercase), A (uppercase), 0 (digits), ! (punctuation).
    #[arg(short = 'p', long, value_parser = check_preset, default_value = "a0")]
    charset_preset: String,

    /// The minimum length of a candidate.
    #[arg(long = "min", value_parser = value_parser!(u16).range(1..=MAX_LENGTH_ALLOWED as i64), default_value_t = DEFAULT_MIN_LENGTH as u16)]
    min_length: u16,

    /// The maximum length of a candidate.
    #[arg(long = "max", value_parser = value_parser!(u16).range(1..=MAX_LENGTH_ALLOWED as i64), default_value_t = DEFAULT_MAX_LENGTH as u16)]
    max_length: u16,
}

/// Try every line of a word list.
#[derive(Args)]
pub struct Dict {
    /// The digest to find, in hexadecimal.
    #[arg(value_parser = check_hex)]
    digest: String,

    /// The word list, one candidate per line.
    wordlist: PathBuf,
}

/// Look a digest up in a rainbow table made of `digest:plaintext` lines.
#[derive(Args)]
pub struct Rainbow {
    /// The digest to find, in hexadecimal.
    #[arg(value_parser = check_hex)]
    digest: String,

    /// The rainbow table.
    table: PathBuf,
}

/// Generate a rainbow table from a word list.
#[derive(Args)]
pub struct Generate {
    /// The word list, one plaintext per line.
    wordlist: PathBuf,

    /// Where to write the rainbow table.
    out: PathBuf,

    /// Overwrite the rainbow table if it already exists.
    #[arg(short, long)]
    force: bool,
}

/// Checks if the digest is valid hexadecimal.
fn check_hex(hex: &str) -> Result<String> {
    let hex = hex.trim();
    hex::decode(hex).context("The digest is not valid hexadecimal")?;

    Ok(hex.to_owned())
}

/// Checks if the preset is only made of known flags.
fn check_preset(preset: &str) -> Result<String> {
    if let Some(flag) = preset.chars().find(|c| !"aA0!".contains(*c)) {
        bail!("Unknown charset preset '{flag}', expected a combination of a, A, 0 and !");
    }

    Ok(preset.to_owned())
}

/// Logs to stderr, so the output of the commands stays clean.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.commands {
        Commands::Brute(args) => brute(&cli.algorithm, args)?,
        Commands::Dict(args) => dict(&cli.algorithm, args)?,
        Commands::Rainbow(args) => rainbow(&cli.algorithm, args)?,
        Commands::Generate(args) => generate(&cli.algorithm, args)?,
        Commands::List => list(),
    }

    Ok(())
}
