use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use human_repr::HumanDuration;
use indicatif::ProgressBar;
use unhash_core::{DictionaryScanner, HashRegistry, RainbowLookup};

use crate::Generate;

pub fn generate(algorithm: &str, args: Generate) -> Result<()> {
    ensure!(
        args.force || !args.out.exists(),
        "{} already exists, use --force to overwrite it",
        args.out.display()
    );

    let registry = HashRegistry::with_builtins();
    let provider = registry.resolve(algorithm)?;
    let dictionary = DictionaryScanner::open(&args.wordlist)?;

    let pb = ProgressBar::new_spinner().with_message(format!(
        "Hashing {} with {}",
        args.wordlist.display(),
        algorithm.to_uppercase()
    ));
    pb.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let table = RainbowLookup::generate(&dictionary, provider.as_ref(), args.out)
        .context("Unable to store the generated rainbow table to the disk")?;

    pb.finish_and_clear();

    let entries = table.entries()?.count();
    eprintln!(
        "{entries} entries written to {} in {}",
        table.path().display(),
        start.elapsed().as_secs_f64().human_duration()
    );

    Ok(())
}
