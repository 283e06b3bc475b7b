use anyhow::{Context, Result};
use unhash_core::{charset_from_preset, CharsetSpec, HashRegistry, JobBuilder};

use crate::{search::watch, Brute, Dict, Rainbow};

/// Builds the charset from the arguments: an explicit charset wins over the presets.
fn charset(args: &Brute) -> String {
    match &args.charset {
        Some(charset) => charset.clone(),
        None => charset_from_preset(&args.charset_preset, ""),
    }
}

pub fn brute(algorithm: &str, args: Brute) -> Result<()> {
    let spec = CharsetSpec::new(
        &charset(&args),
        args.min_length.into(),
        args.max_length.into(),
    )
    .context("Invalid charset")?;

    eprintln!("Charset: {}", spec.charset().iter().collect::<String>());
    eprintln!(
        "Length: {}-{} ({} candidates)",
        spec.min_length(),
        spec.max_length(),
        spec.total()
    );

    let job = JobBuilder::charset(args.digest, spec)
        .algorithm(algorithm)
        .build(&HashRegistry::with_builtins())?;

    watch(job)
}

pub fn dict(algorithm: &str, args: Dict) -> Result<()> {
    eprintln!("Word list: {}", args.wordlist.display());

    let job = JobBuilder::dictionary(args.digest, args.wordlist)
        .algorithm(algorithm)
        .build(&HashRegistry::with_builtins())?;

    watch(job)
}

pub fn rainbow(algorithm: &str, args: Rainbow) -> Result<()> {
    eprintln!("Rainbow table: {}", args.table.display());

    let job = JobBuilder::rainbow(args.digest, args.table)
        .algorithm(algorithm)
        .build(&HashRegistry::with_builtins())?;

    watch(job)
}
