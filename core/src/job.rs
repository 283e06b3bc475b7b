use std::{mem, path::PathBuf, sync::Arc, thread, time::Instant};

use crossbeam_channel::unbounded;
use tracing::{debug, info};

use crate::{
    charset::CharsetSpec,
    dictionary::DictionaryScanner,
    error::{UnhashError, UnhashResult},
    event::{Event, MatchResult, Outcome, SearchHandle, SearchReport},
    hash::{HashProvider, TargetDigest},
    progress::{CancellationToken, ProgressReporter},
    rainbow_table::{RainbowEntry, RainbowLookup},
    registry::{AlgorithmId, HashRegistry},
    CHARSET_REPORT_INTERVAL, DEFAULT_ALGORITHM, STREAM_REPORT_INTERVAL,
};

/// The way candidates are produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Exhaustive enumeration of a charset.
    Charset(CharsetSpec),
    /// Every line of a word list.
    Dictionary(DictionaryScanner),
    /// Lookup in a precomputed `digest:plaintext` table.
    Rainbow(RainbowLookup),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Charset(_) => "charset",
            Self::Dictionary(_) => "dictionary",
            Self::Rainbow(_) => "rainbow",
        }
    }

    /// Progress is reported every this many candidates (or lines).
    pub fn report_interval(&self) -> u64 {
        match self {
            Self::Charset(_) => CHARSET_REPORT_INTERVAL,
            Self::Dictionary(_) | Self::Rainbow(_) => STREAM_REPORT_INTERVAL,
        }
    }
}

/// The lifecycle of a search job. Terminal states are final.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JobState {
    Created,
    Running,
    Matched,
    Exhausted,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched | Self::Exhausted | Self::Cancelled)
    }
}

/// A builder for a search job.
pub struct JobBuilder {
    algorithm: AlgorithmId,
    target: String,
    strategy: Strategy,
    token: CancellationToken,
}

impl JobBuilder {
    /// Creates a new JobBuilder, using MD5 unless told otherwise.
    pub fn new(target: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            algorithm: AlgorithmId::new(DEFAULT_ALGORITHM),
            target: target.into(),
            strategy,
            token: CancellationToken::new(),
        }
    }

    /// Shorthand for an exhaustive search over a charset.
    pub fn charset(target: impl Into<String>, spec: CharsetSpec) -> Self {
        Self::new(target, Strategy::Charset(spec))
    }

    /// Shorthand for a dictionary search.
    pub fn dictionary(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(target, Strategy::Dictionary(DictionaryScanner::new(path)))
    }

    /// Shorthand for a rainbow table lookup.
    pub fn rainbow(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(target, Strategy::Rainbow(RainbowLookup::new(path)))
    }

    /// Sets the hash algorithm.
    pub fn algorithm(mut self, algorithm: impl Into<AlgorithmId>) -> Self {
        self.algorithm = algorithm.into();

        self
    }

    /// Uses an existing cancellation token instead of a new one.
    pub fn token(mut self, token: CancellationToken) -> Self {
        self.token = token;

        self
    }

    /// Builds a SearchJob.
    /// Every configuration error is reported here, before the job can start.
    pub fn build(self, registry: &HashRegistry) -> UnhashResult<SearchJob> {
        let target = TargetDigest::new(&self.target)?;
        let provider = registry.resolve(self.algorithm.clone())?;

        match &self.strategy {
            Strategy::Charset(_) => (),
            Strategy::Dictionary(scanner) => {
                DictionaryScanner::open(scanner.path())?;
            }
            Strategy::Rainbow(table) => {
                RainbowLookup::open(table.path())?;
            }
        }

        Ok(SearchJob {
            algorithm: self.algorithm,
            target,
            provider,
            strategy: self.strategy,
            token: self.token,
            state: JobState::Created,
            tried: 0,
            total: None,
        })
    }
}

/// A candidate that went through the comparison.
struct Trial {
    /// The tried count once this candidate is tried.
    position: u64,
    candidate: String,
    found: Option<MatchResult>,
}

type Trials = Box<dyn Iterator<Item = Trial> + Send>;

/// A job that just left the `Created` state.
struct Started {
    start: Instant,
    total: u64,
    trials: Trials,
}

/// A search for a preimage of a target digest.
pub struct SearchJob {
    algorithm: AlgorithmId,
    target: TargetDigest,
    provider: Arc<dyn HashProvider>,
    strategy: Strategy,
    token: CancellationToken,
    state: JobState,
    tried: u64,
    total: Option<u64>,
}

impl SearchJob {
    pub fn builder(target: impl Into<String>, strategy: Strategy) -> JobBuilder {
        JobBuilder::new(target, strategy)
    }

    pub fn algorithm(&self) -> &AlgorithmId {
        &self.algorithm
    }

    pub fn target(&self) -> &TargetDigest {
        &self.target
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// The number of candidates (or lines) tried so far.
    pub fn tried(&self) -> u64 {
        self.tried
    }

    /// The number of candidates (or lines) to try, known once the job started.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// The token cancelling this job.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Counts the candidates and prepares their comparison.
    /// The streaming strategies open their resource twice here, so both passes are checked before running.
    fn trials(&self) -> UnhashResult<(u64, Trials)> {
        let provider = Arc::clone(&self.provider);
        let target = self.target.clone();

        let prepared: (u64, Trials) = match &self.strategy {
            Strategy::Charset(spec) => {
                let trials = spec.candidates().zip(1..).map(move |(candidate, position)| {
                    let digest = provider.digest(candidate.as_bytes());
                    let found = target.matches(&digest).then(|| MatchResult {
                        plaintext: candidate.clone(),
                        digest,
                    });

                    Trial {
                        position,
                        candidate,
                        found,
                    }
                });

                (spec.total(), Box::new(trials) as Trials)
            }

            Strategy::Dictionary(scanner) => {
                let total = scanner.count_lines()?;
                let trials = scanner.lines()?.map(move |line| {
                    let found = if line.text.is_empty() {
                        None
                    } else {
                        let digest = provider.digest(line.text.as_bytes());
                        target.matches(&digest).then(|| MatchResult {
                            plaintext: line.text.clone(),
                            digest,
                        })
                    };

                    Trial {
                        position: line.number,
                        candidate: line.text,
                        found,
                    }
                });

                (total, Box::new(trials) as Trials)
            }

            // the stored digests are compared directly, nothing is hashed
            Strategy::Rainbow(table) => {
                let total = table.count_lines()?;
                let trials = table.lines()?.map(move |line| {
                    let found = RainbowEntry::parse(&line.text)
                        .filter(|entry| target.matches(&entry.digest))
                        .map(|entry| MatchResult {
                            plaintext: entry.plaintext,
                            digest: entry.digest,
                        });

                    Trial {
                        position: line.number,
                        candidate: line.text,
                        found,
                    }
                });

                (total, Box::new(trials) as Trials)
            }
        };

        Ok(prepared)
    }

    /// Moves the job to `Running` once every pass over its resource is ready.
    fn start(&mut self) -> UnhashResult<Started> {
        if self.state != JobState::Created {
            return Err(UnhashError::AlreadyStarted);
        }

        let start = Instant::now();
        let (total, trials) = self.trials()?;

        self.total = Some(total);
        self.state = JobState::Running;
        debug!(
            algorithm = %self.algorithm,
            strategy = self.strategy.name(),
            total,
            "search started"
        );

        Ok(Started {
            start,
            total,
            trials,
        })
    }

    /// Tries the candidates until a match, their exhaustion or a cancellation.
    fn drive(&mut self, started: Started, mut on_event: impl FnMut(Event)) -> SearchReport {
        let Started {
            start,
            total,
            mut trials,
        } = started;
        let mut reporter = ProgressReporter::new(total, self.strategy.report_interval());

        let outcome = loop {
            if self.token.is_cancelled() {
                break Outcome::Cancelled;
            }

            let Some(trial) = trials.next() else {
                on_event(Event::Progress(reporter.complete("")));
                break Outcome::Exhausted;
            };

            let previous = mem::replace(&mut self.tried, trial.position);
            if let Some(progress) = reporter.observe(previous, self.tried, &trial.candidate) {
                on_event(Event::Progress(progress));
            }

            if let Some(found) = trial.found {
                on_event(Event::Match(found.clone()));
                on_event(Event::Progress(reporter.complete(&found.plaintext)));
                break Outcome::Matched(found);
            }
        };

        self.state = outcome.state();
        info!(
            state = ?self.state,
            tried = self.tried,
            total,
            "search finished"
        );
        on_event(Event::Finished(self.state));

        SearchReport {
            outcome,
            tried: self.tried,
            total,
            elapsed: start.elapsed(),
        }
    }

    /// Runs the search on the current thread, passing every event to `on_event`.
    ///
    /// Configuration errors are returned before the job leaves the `Created` state.
    /// Once running, the search always ends with a report.
    pub fn run(&mut self, on_event: impl FnMut(Event)) -> UnhashResult<SearchReport> {
        let started = self.start()?;

        Ok(self.drive(started, on_event))
    }

    /// Runs the search on a dedicated thread.
    ///
    /// The resource is counted and opened again for scanning before the thread
    /// is spawned, so every configuration error is returned here and never
    /// through the handle.
    /// Returns a handle to receive the events of the search, cancel it and get its report.
    pub fn spawn(mut self) -> UnhashResult<SearchHandle> {
        let started = self.start()?;
        let (sender, receiver) = unbounded();
        let token = self.token.clone();

        let thread_handle = thread::spawn(move || {
            self.drive(started, |event| {
                // nobody listens anymore, the search goes on until cancelled
                let _ = sender.send(event);
            })
        });

        Ok(SearchHandle {
            thread_handle,
            receiver,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use tempfile::NamedTempFile;

    use super::{JobBuilder, JobState, SearchJob, Strategy};
    use crate::{
        charset::{CharsetSpec, DIGITS, LOWERCASE},
        custom::CustomHash,
        error::UnhashError,
        event::{Event, Outcome},
        hash::{HashFunction, HashProvider},
        progress::CancellationToken,
        registry::HashRegistry,
    };

    fn resource(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn run_collecting(job: &mut SearchJob) -> (Outcome, Vec<Event>) {
        let mut events = Vec::new();
        let report = job.run(|event| events.push(event)).unwrap();
        (report.outcome, events)
    }

    fn progress_percents(events: &[Event]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Progress(progress) => Some(progress.percent),
                _ => None,
            })
            .collect()
    }

    /// Counts how many times it is asked for a digest.
    #[derive(Default)]
    struct CountingProvider(AtomicUsize);

    impl HashProvider for CountingProvider {
        fn digest(&self, input: &[u8]) -> String {
            self.0.fetch_add(1, Ordering::Relaxed);
            HashFunction::Md5.digest(input)
        }
    }

    #[test]
    fn test_charset_match() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new(DIGITS, 1, 4).unwrap();
        let target = HashFunction::Md5.digest(b"42");

        let mut job = JobBuilder::charset(&*target, spec)
            .algorithm("md5")
            .build(&registry)
            .unwrap();
        let (outcome, events) = run_collecting(&mut job);

        let found = outcome.found().unwrap();
        assert_eq!("42", found.plaintext);
        assert_eq!(target, found.digest);
        assert_eq!(JobState::Matched, job.state());
        assert_eq!(10 + 43, job.tried());
        assert_eq!(Some(11_110), job.total());

        // the match is followed by a final 100% progress, then the end of the job
        let n = events.len();
        assert!(matches!(&events[n - 3], Event::Match(m) if m.plaintext == "42"));
        assert!(
            matches!(&events[n - 2], Event::Progress(p) if p.percent == 100 && p.candidate == "42")
        );
        assert_eq!(Event::Finished(JobState::Matched), events[n - 1]);
        assert_eq!(
            1,
            events
                .iter()
                .filter(|event| matches!(event, Event::Match(_)))
                .count()
        );
    }

    #[test]
    fn test_charset_exhausted() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new("ab", 1, 2).unwrap();

        let mut job = JobBuilder::charset(HashFunction::Md5.digest(b"zzz"), spec)
            .build(&registry)
            .unwrap();
        let (outcome, events) = run_collecting(&mut job);

        assert_eq!(Outcome::Exhausted, outcome);
        assert_eq!(6, job.tried());

        // one event for the last candidate, then the forced final one
        assert_eq!(
            vec![
                Event::Progress(crate::ProgressEvent {
                    percent: 100,
                    candidate: "bb".to_owned()
                }),
                Event::Progress(crate::ProgressEvent {
                    percent: 100,
                    candidate: String::new()
                }),
                Event::Finished(JobState::Exhausted),
            ],
            events
        );
    }

    #[test]
    fn test_progress_is_monotonic() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new(DIGITS, 1, 5).unwrap();

        let mut job = JobBuilder::charset(HashFunction::Md5.digest(b"99999"), spec)
            .build(&registry)
            .unwrap();
        let (outcome, events) = run_collecting(&mut job);
        assert!(outcome.found().is_some());

        let percents = progress_percents(&events);
        assert!(percents.len() > 10);
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(Some(&100), percents.last());
    }

    #[test]
    fn test_dictionary_match() {
        let registry = HashRegistry::with_builtins();
        let file = resource(b"letmein\n\nhunter2\nqwerty\n");
        let target = HashFunction::Sha2_256.digest(b"hunter2").to_uppercase();

        let mut job = JobBuilder::dictionary(target, file.path())
            .algorithm("SHA256")
            .build(&registry)
            .unwrap();
        let (outcome, _) = run_collecting(&mut job);

        assert_eq!("hunter2", outcome.found().unwrap().plaintext);
        assert_eq!(3, job.tried());
        assert_eq!(Some(4), job.total());
    }

    #[test]
    fn test_dictionary_exhausted_counts_blank_lines() {
        let registry = HashRegistry::with_builtins();
        let file = resource(b"password\n\n123456\n");

        let mut job = JobBuilder::dictionary("00000000000000000000000000000000", file.path())
            .build(&registry)
            .unwrap();
        let (outcome, events) = run_collecting(&mut job);

        assert_eq!(Outcome::Exhausted, outcome);
        assert_eq!(3, job.tried());
        assert_eq!(vec![100, 100], progress_percents(&events));
    }

    #[test]
    fn test_rainbow_match() {
        let registry = HashRegistry::with_builtins();
        let file = resource(b"junk\n5f4dcc3b5aa765d61d8327deb882cf99:password\n");

        let mut job = JobBuilder::rainbow("5F4DCC3B5AA765D61D8327DEB882CF99", file.path())
            .build(&registry)
            .unwrap();
        let (outcome, events) = run_collecting(&mut job);

        let found = outcome.found().unwrap();
        assert_eq!("password", found.plaintext);
        assert_eq!("5f4dcc3b5aa765d61d8327deb882cf99", found.digest);
        assert_eq!(Some(&100), progress_percents(&events).last());
    }

    #[test]
    fn test_rainbow_never_hashes() {
        let mut registry = HashRegistry::with_builtins();
        let counting = Arc::new(CountingProvider::default());
        registry.register("COUNTING", counting.clone()).unwrap();

        let file = resource(b"827ccb0eea8a706c4c34a16891f84e7b:12345\nab:cd:ef\n");
        let mut job = JobBuilder::rainbow("ab", file.path())
            .algorithm("counting")
            .build(&registry)
            .unwrap();
        let (outcome, _) = run_collecting(&mut job);

        assert_eq!("cd:ef", outcome.found().unwrap().plaintext);
        assert_eq!(0, counting.0.load(Ordering::Relaxed));
    }

    #[test]
    fn test_cancellation_mid_run() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new(LOWERCASE, 1, 5).unwrap();
        let token = CancellationToken::new();

        let mut job = JobBuilder::charset("ffffffffffffffffffffffffffffffff", spec)
            .token(token.clone())
            .build(&registry)
            .unwrap();

        let mut events = Vec::new();
        let report = job
            .run(|event| {
                if matches!(event, Event::Progress(_)) {
                    token.cancel();
                }
                events.push(event);
            })
            .unwrap();

        assert_eq!(Outcome::Cancelled, report.outcome);
        assert_eq!(JobState::Cancelled, job.state());
        assert_eq!(10_000, report.tried);
        assert!(report.tried < report.total);
        assert_eq!(vec![0], progress_percents(&events));
        assert_eq!(Some(&Event::Finished(JobState::Cancelled)), events.last());
    }

    #[test]
    fn test_cancelled_before_start() {
        let registry = HashRegistry::with_builtins();
        let file = resource(b"a\nb\nc\n");

        let mut job = JobBuilder::dictionary("00", file.path())
            .build(&registry)
            .unwrap();
        job.token().cancel();

        let (outcome, events) = run_collecting(&mut job);
        assert_eq!(Outcome::Cancelled, outcome);
        assert_eq!(0, job.tried());
        assert_eq!(vec![Event::Finished(JobState::Cancelled)], events);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new("a", 1, 1).unwrap();

        let mut job = JobBuilder::charset("00", spec).build(&registry).unwrap();
        assert_eq!(JobState::Created, job.state());
        assert_eq!(None, job.total());

        job.run(|_| ()).unwrap();
        assert!(job.state().is_terminal());
        assert!(matches!(job.run(|_| ()), Err(UnhashError::AlreadyStarted)));
    }

    #[test]
    fn test_configuration_errors() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new("ab", 1, 2).unwrap();

        assert!(matches!(
            JobBuilder::charset("00", spec.clone())
                .algorithm("rot13")
                .build(&registry),
            Err(UnhashError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            JobBuilder::charset("  ", spec).build(&registry),
            Err(UnhashError::InvalidDigest(_))
        ));
        assert!(matches!(
            JobBuilder::dictionary("00", "/definitely/not/here.txt").build(&registry),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
        assert!(matches!(
            JobBuilder::rainbow("00", "/definitely/not/here.txt").build(&registry),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_directories_are_rejected_before_start() {
        let registry = HashRegistry::with_builtins();
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            JobBuilder::dictionary("00", dir.path()).build(&registry),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
        assert!(matches!(
            JobBuilder::rainbow("00", dir.path()).build(&registry),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_spawn_reports_unavailable_resources() {
        let registry = HashRegistry::with_builtins();
        let file = resource(b"alpha\nbravo\n");

        let job = JobBuilder::dictionary("00", file.path())
            .build(&registry)
            .unwrap();

        // the word list disappears between the build and the start
        drop(file);

        assert!(matches!(
            job.spawn(),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_spawn_after_run() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new("a", 1, 1).unwrap();

        let mut job = JobBuilder::charset("00", spec).build(&registry).unwrap();
        job.run(|_| ()).unwrap();

        assert!(matches!(job.spawn(), Err(UnhashError::AlreadyStarted)));
    }

    #[test]
    fn test_word_list_progress_every_thousand_lines() {
        let registry = HashRegistry::with_builtins();

        // every third line is blank, blank lines still count as tried
        let words: String = (1..=2500)
            .map(|i| {
                if i % 3 == 0 {
                    "\n".to_owned()
                } else {
                    format!("word{i}\n")
                }
            })
            .collect();
        let file = resource(words.as_bytes());

        let mut job = JobBuilder::dictionary("00000000000000000000000000000000", file.path())
            .build(&registry)
            .unwrap();
        let (outcome, events) = run_collecting(&mut job);

        assert_eq!(Outcome::Exhausted, outcome);
        assert_eq!(2500, job.tried());
        assert_eq!(Some(2500), job.total());

        let progress: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::Progress(progress) => {
                    Some((progress.percent, progress.candidate.as_str()))
                }
                _ => None,
            })
            .collect();

        assert_eq!(
            vec![
                (40, "word1000"),
                (80, "word2000"),
                (100, "word2500"),
                (100, ""),
            ],
            progress
        );
    }

    #[test]
    fn test_failing_custom_hash_does_not_stop_the_search() {
        let mut registry = HashRegistry::with_builtins();
        registry
            .register_custom(CustomHash::new(|_| Err("not implemented")))
            .unwrap();
        let spec = CharsetSpec::new("abc", 1, 2).unwrap();

        let mut job = JobBuilder::charset(HashFunction::Md5.digest(b"ca"), spec)
            .algorithm("custom")
            .build(&registry)
            .unwrap();
        let (outcome, _) = run_collecting(&mut job);

        assert_eq!("ca", outcome.found().unwrap().plaintext);
    }

    #[test]
    fn test_spawned_jobs_run_concurrently() {
        let registry = Arc::new(HashRegistry::with_builtins());
        let file = resource(b"alpha\nbravo\ncharlie\n");

        let handles: Vec<_> = [
            JobBuilder::charset(
                HashFunction::Sha1.digest(b"zz"),
                CharsetSpec::new(LOWERCASE, 1, 3).unwrap(),
            )
            .algorithm("sha1"),
            JobBuilder::dictionary(HashFunction::Md5.digest(b"charlie"), file.path()),
        ]
        .into_iter()
        .map(|builder| builder.build(&registry).unwrap().spawn().unwrap())
        .collect();

        for (handle, expected) in handles.into_iter().zip(["zz", "charlie"]) {
            let mut events = Vec::new();
            while let Some(event) = handle.recv() {
                events.push(event);
            }

            assert_eq!(Some(&Event::Finished(JobState::Matched)), events.last());
            let report = handle.join().unwrap();
            assert_eq!(expected, report.outcome.found().unwrap().plaintext);
        }
    }

    #[test]
    fn test_spawned_job_can_be_cancelled() {
        let registry = HashRegistry::with_builtins();
        let spec = CharsetSpec::new(LOWERCASE, 1, 8).unwrap();

        let handle = SearchJob::builder("00", Strategy::Charset(spec))
            .build(&registry)
            .unwrap()
            .spawn()
            .unwrap();
        handle.cancel();

        let report = handle.join().unwrap();
        assert_eq!(Outcome::Cancelled, report.outcome);
        assert!(report.tried < report.total);
    }
}
