use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::RecvTimeoutError;
use crossterm::{
    event::{self, KeyCode, KeyEventKind, KeyModifiers},
    style::{Color, Stylize},
    terminal,
};
use human_repr::HumanDuration;
use indicatif::{ProgressBar, ProgressStyle};
use unhash_core::{Event, Outcome, SearchJob, SearchReport};

/// How long to wait for an event before looking at the keyboard again.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Raw mode lets single key presses through. It is left when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Unable to read the keyboard")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Runs a search in the background, drawing its progress until it ends or the user stops it.
pub fn watch(job: SearchJob) -> Result<()> {
    let pb = ProgressBar::new(100).with_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("#>-"),
    );

    eprintln!("Press {} or {} to stop", "q".bold(), "Esc".bold());

    let handle = job.spawn()?;

    // without a terminal, the search can only be stopped by a signal
    let keyboard = RawMode::enable().ok();
    pb.enable_steady_tick(Duration::from_millis(100));

    loop {
        match handle.recv_timeout(POLL_INTERVAL) {
            Ok(event) => handle_search_event(&pb, event),
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if keyboard.is_some() && stop_requested()? {
            handle.cancel();
        }
    }

    drop(keyboard);
    pb.finish_and_clear();

    let report = handle.join().context("The search failed")?;
    print_report(&report);

    Ok(())
}

fn handle_search_event(pb: &ProgressBar, event: Event) {
    match event {
        Event::Progress(progress) => {
            pb.set_position(progress.percent.into());
            pb.set_message(progress.candidate);
        }
        Event::Match(found) => pb.set_message(format!("found {}", found.plaintext)),
        Event::Finished(_) => (),
    }
}

/// Returns true if `q`, `Esc` or `Ctrl+C` was pressed.
fn stop_requested() -> Result<bool> {
    if !event::poll(Duration::ZERO)? {
        return Ok(false);
    }

    let event::Event::Key(key_event) = event::read()? else {
        return Ok(false);
    };

    if key_event.kind != KeyEventKind::Press {
        return Ok(false);
    }

    Ok(match key_event.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key_event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    })
}

fn print_report(report: &SearchReport) {
    match &report.outcome {
        Outcome::Matched(found) => {
            println!("{}", "Match found!".with(Color::Green).bold());
            println!("{:<10} {}", "Plaintext", found.plaintext);
            println!("{:<10} {}", "Digest", found.digest);
        }
        Outcome::Exhausted => println!("{}", "No match found.".with(Color::Yellow)),
        Outcome::Cancelled => println!("{}", "Stopped.".with(Color::Red)),
    }

    eprintln!("{}", summary(report));
}

fn summary(report: &SearchReport) -> String {
    format!(
        "{} of {} tried in {}",
        report.tried,
        report.total,
        report.elapsed.as_secs_f64().human_duration()
    )
}
