//! Running the load-then-construct check over a registry.
//!
//! Each registry entry is checked on its own: the accessor is called, an empty
//! handle is a load failure, and a non-empty handle must yield a parser through
//! the [`RuntimeAdapter`]. A failing or panicking entry never stops the run.

use crate::language::LanguageHandle;
use crate::parser::{PackratRuntime, RuntimeAdapter};
use crate::registry::{GrammarDescriptor, GrammarRegistry};
use crate::report::VerificationReport;
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// Progress of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    /// Nothing has happened yet.
    #[default]
    NotStarted,
    /// The accessor is being called.
    Loading,
    /// The accessor returned a non-empty handle.
    Loaded,
    /// A parser is being built from the handle.
    Constructing,
    /// A parser was built.
    Passed,
    /// The accessor returned the empty handle or panicked.
    LoadFailed,
    /// Parser construction failed or panicked.
    ConstructFailed,
}

/// A state change [`CheckState::advance`] refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal check transition {from:?} -> {to:?}")]
pub struct TransitionError {
    /// State before the attempted change.
    pub from: CheckState,
    /// Requested state.
    pub to: CheckState,
}

impl CheckState {
    /// Moves to `next` if the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] for any transition outside
    /// `NotStarted -> Loading -> (Loaded -> Constructing -> (Passed | ConstructFailed) | LoadFailed)`.
    pub fn advance(&mut self, next: CheckState) -> Result<(), TransitionError> {
        use CheckState::{
            ConstructFailed, Constructing, LoadFailed, Loaded, Loading, NotStarted, Passed,
        };
        let legal = matches!(
            (*self, next),
            (NotStarted, Loading)
                | (Loading, Loaded | LoadFailed)
                | (Loaded, Constructing)
                | (Constructing, Passed | ConstructFailed)
        );
        if !legal {
            return Err(TransitionError {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    /// Returns `true` once the check has an outcome.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckState::Passed | CheckState::LoadFailed | CheckState::ConstructFailed
        )
    }
}

/// The stage a check failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The accessor produced no usable grammar.
    LoadFailure,
    /// No parser could be built from a loaded grammar.
    ConstructionFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::LoadFailure => "grammar failed to load",
            FailureKind::ConstructionFailure => "parser construction failed",
        })
    }
}

/// A failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Where the check failed.
    pub kind: FailureKind,
    /// Underlying cause, when one is known.
    pub detail: Option<String>,
}

impl Failure {
    fn new(kind: FailureKind, detail: impl Into<Option<String>>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// The verdict of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The grammar loaded and a parser was built.
    Pass,
    /// The check failed.
    Fail(Failure),
}

/// The result of checking one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Language id of the entry.
    pub id: String,
    /// Source label of the entry.
    pub source: String,
    /// Verdict.
    pub outcome: Outcome,
}

impl VerificationResult {
    /// Returns `true` if the check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// The failure, if the check failed.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Pass => None,
            Outcome::Fail(failure) => Some(failure),
        }
    }
}

/// Checks every entry of a registry.
///
/// ```
/// use grammar_check::{GrammarRegistry, Runner};
///
/// let report = Runner::new().parallel(true).run(&GrammarRegistry::bundled());
/// assert!(report.all_passed());
/// ```
#[derive(Debug, Clone)]
pub struct Runner<A = PackratRuntime> {
    adapter: A,
    parallel: bool,
    check_idempotence: bool,
}

impl Runner {
    /// A sequential runner on the built-in runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_adapter(PackratRuntime)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: RuntimeAdapter> Runner<A> {
    /// A sequential runner constructing parsers through `adapter`.
    pub fn with_adapter(adapter: A) -> Self {
        Self {
            adapter,
            parallel: false,
            check_idempotence: false,
        }
    }

    /// Runs checks on one thread per entry. Result order is unaffected.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Calls each accessor twice and fails entries whose two calls disagree.
    #[must_use]
    pub fn check_idempotence(mut self, check: bool) -> Self {
        self.check_idempotence = check;
        self
    }

    /// Checks every entry of `registry`, one result per entry in registry
    /// order.
    pub fn run(&self, registry: &GrammarRegistry) -> VerificationReport {
        for id in registry.duplicate_ids() {
            tracing::warn!(language = id, "language registered more than once");
        }

        let results = if self.parallel {
            let mut slots: Vec<Option<VerificationResult>> =
                registry.iter().map(|_| None).collect();
            std::thread::scope(|s| {
                for (slot, descriptor) in slots.iter_mut().zip(registry) {
                    s.spawn(move || *slot = Some(self.verify_one(descriptor)));
                }
            });
            slots.into_iter().flatten().collect()
        } else {
            registry.iter().map(|d| self.verify_one(d)).collect()
        };

        let report = VerificationReport::new(results);
        tracing::info!(
            passed = report.passed().count(),
            failed = report.failed().count(),
            "verification finished"
        );
        report
    }

    /// Checks a single entry.
    pub fn verify_one(&self, descriptor: &GrammarDescriptor) -> VerificationResult {
        let mut check = Check::new(descriptor);
        let outcome = self.check(&mut check);
        match &outcome {
            Outcome::Pass => tracing::info!(
                language = %descriptor.id,
                source = %descriptor.source,
                "grammar verified"
            ),
            Outcome::Fail(failure) => tracing::warn!(
                language = %descriptor.id,
                source = %descriptor.source,
                %failure,
                "grammar check failed"
            ),
        }
        VerificationResult {
            id: descriptor.id.clone(),
            source: descriptor.source.clone(),
            outcome,
        }
    }

    fn check(&self, check: &mut Check<'_>) -> Outcome {
        check.enter(CheckState::Loading);
        let handle = match self.load(check.descriptor) {
            Ok(handle) => handle,
            Err(detail) => {
                check.enter(CheckState::LoadFailed);
                return Outcome::Fail(Failure::new(FailureKind::LoadFailure, detail));
            }
        };
        check.enter(CheckState::Loaded);

        check.enter(CheckState::Constructing);
        match contain(|| self.adapter.construct(&handle)) {
            Ok(Ok(_parser)) => {
                check.enter(CheckState::Passed);
                Outcome::Pass
            }
            Ok(Err(e)) => {
                check.enter(CheckState::ConstructFailed);
                Outcome::Fail(Failure::new(
                    FailureKind::ConstructionFailure,
                    e.to_string(),
                ))
            }
            Err(detail) => {
                check.enter(CheckState::ConstructFailed);
                Outcome::Fail(Failure::new(FailureKind::ConstructionFailure, detail))
            }
        }
    }

    /// Calls the accessor, returning the handle or why it is unusable.
    fn load(&self, descriptor: &GrammarDescriptor) -> Result<LanguageHandle, Option<String>> {
        let handle = contain(descriptor.accessor).map_err(Some)?;
        if self.check_idempotence {
            let again = contain(descriptor.accessor).map_err(Some)?;
            if again.is_empty() != handle.is_empty() {
                return Err(Some("accessor results differ between calls".to_string()));
            }
        }
        if handle.is_empty() {
            return Err(None);
        }
        Ok(handle)
    }
}

thread_local! {
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

/// Runs `f`, turning a panic into its message.
///
/// Panics raised inside are logged at debug level instead of reaching the
/// previously installed panic hook.
fn contain<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINED.with(Cell::get) {
                tracing::debug!(%info, "contained panic");
            } else {
                previous(info);
            }
        }));
    });

    CONTAINED.with(|c| c.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CONTAINED.with(|c| c.set(false));
    result.map_err(|payload| panic_detail(payload.as_ref()))
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    format!("panicked: {message}")
}

/// One check's state, with each transition logged.
struct Check<'d> {
    descriptor: &'d GrammarDescriptor,
    state: CheckState,
}

impl<'d> Check<'d> {
    fn new(descriptor: &'d GrammarDescriptor) -> Self {
        Self {
            descriptor,
            state: CheckState::NotStarted,
        }
    }

    fn enter(&mut self, next: CheckState) {
        match self.state.advance(next) {
            Ok(()) => tracing::debug!(language = %self.descriptor.id, state = ?next, "check state"),
            Err(e) => tracing::error!(language = %self.descriptor.id, error = %e, "check state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::GrammarArtifact;
    use crate::language::LanguageFn;
    use crate::languages;
    use crate::registry::BUNDLED;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const STALE_TLB: &str = r#"{"abi_version": 9, "start": "source_file", "grammar": {"name": "tlb", "rules": {
        "source_file": {"type": "BLANK"}
    }}}"#;

    fn stale_tlb() -> LanguageHandle {
        GrammarArtifact::new("tlb", STALE_TLB).load()
    }

    const STALE_FIFT: &str = r#"{"abi_version": 9, "start": "source_file", "grammar": {"name": "fift", "rules": {
        "source_file": {"type": "BLANK"}
    }}}"#;

    fn stale_fift() -> LanguageHandle {
        GrammarArtifact::new("fift", STALE_FIFT).load()
    }

    const DIFFERING: &str = "accessor results differ between calls";

    fn exploding() -> LanguageHandle {
        panic!("accessor exploded")
    }

    static FLAKY_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn flaky() -> LanguageHandle {
        if FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            languages::fift::language()
        } else {
            LanguageHandle::empty()
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("rejected by test runtime")]
    struct Rejected;

    struct Rejecting;

    impl RuntimeAdapter for Rejecting {
        type Parser = ();
        type Error = Rejected;

        fn construct(&self, _: &LanguageHandle) -> Result<(), Rejected> {
            Err(Rejected)
        }
    }

    struct Panicking;

    impl RuntimeAdapter for Panicking {
        type Parser = ();
        type Error = Rejected;

        fn construct(&self, _: &LanguageHandle) -> Result<(), Rejected> {
            panic!("runtime exploded")
        }
    }

    fn with_stale_tlb() -> GrammarRegistry {
        languages::ALL
            .iter()
            .fold(GrammarRegistry::new(), |registry, (id, accessor)| {
                let accessor: LanguageFn = if *id == "tlb" { stale_tlb } else { *accessor };
                registry.register(GrammarDescriptor::new(*id, BUNDLED, accessor))
            })
    }

    #[test]
    fn test_state_machine() {
        let mut state = CheckState::default();
        for next in [
            CheckState::Loading,
            CheckState::Loaded,
            CheckState::Constructing,
            CheckState::Passed,
        ] {
            assert!(!state.is_terminal());
            state.advance(next).unwrap();
        }
        assert!(state.is_terminal());

        let mut state = CheckState::Loading;
        state.advance(CheckState::LoadFailed).unwrap();
        assert!(state.is_terminal());

        let mut state = CheckState::NotStarted;
        let err = state.advance(CheckState::Passed).unwrap_err();
        assert_eq!(err.from, CheckState::NotStarted);
        assert_eq!(state, CheckState::NotStarted);
        assert!(CheckState::Loaded.advance(CheckState::Passed).is_err());
    }

    #[test]
    fn test_all_bundled_pass() {
        let report = Runner::new().run(&GrammarRegistry::bundled());
        assert_eq!(report.results().len(), 4);
        assert!(report.all_passed(), "{report}");
    }

    #[test]
    fn test_stale_artifact_fails_alone() {
        let report = Runner::new().run(&with_stale_tlb());
        let ids: Vec<&str> = report.results().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["fift", "func", "tlb", "tolk"]);
        for result in report.results() {
            if result.id == "tlb" {
                let failure = result.failure().unwrap();
                assert_eq!(failure.kind, FailureKind::LoadFailure);
                assert_eq!(failure.to_string(), "grammar failed to load");
            } else {
                assert!(result.passed(), "{} failed", result.id);
            }
        }
        assert!(!report.all_passed());
    }

    #[test]
    fn test_duplicate_ids_checked_independently() {
        let fresh = GrammarDescriptor::new("fift", "a", languages::fift::language);
        let registry = GrammarRegistry::new()
            .register(fresh)
            .register(GrammarDescriptor::new("fift", "b", stale_fift));
        for runner in [Runner::new(), Runner::new().parallel(true)] {
            let report = runner.run(&registry);
            let results = report.results();
            assert_eq!(results.len(), 2);
            assert_eq!(results[0].source, "a");
            assert!(results[0].passed());
            assert_eq!(results[1].source, "b");
            let failure = results[1].failure().unwrap();
            assert_eq!(failure.kind, FailureKind::LoadFailure);
            assert!(!report.all_passed());
        }
    }

    #[test]
    fn test_empty_registry_passes_vacuously() {
        let report = Runner::new().parallel(true).run(&GrammarRegistry::new());
        assert!(report.results().is_empty());
        assert!(report.all_passed());
    }

    #[test]
    fn test_construction_failure() {
        let descriptor = GrammarDescriptor::new("func", BUNDLED, languages::func::language);
        let result = Runner::with_adapter(Rejecting).verify_one(&descriptor);
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::ConstructionFailure);
        assert_eq!(failure.detail.as_deref(), Some("rejected by test runtime"));
    }

    #[test]
    fn test_empty_handle_never_reaches_runtime() {
        // The panicking runtime would turn this into a construction failure.
        let descriptor = GrammarDescriptor::new("tlb", BUNDLED, stale_tlb);
        let result = Runner::with_adapter(Panicking).verify_one(&descriptor);
        assert_eq!(result.failure().unwrap().kind, FailureKind::LoadFailure);
    }

    #[test]
    fn test_panics_are_contained() {
        let fift = GrammarDescriptor::new("fift", BUNDLED, languages::fift::language);
        let registry = GrammarRegistry::new()
            .register(GrammarDescriptor::new("boom", "test", exploding))
            .register(fift);

        let report = Runner::new().parallel(true).run(&registry);
        let failure = report.results()[0].failure().unwrap();
        assert_eq!(failure.kind, FailureKind::LoadFailure);
        assert_eq!(
            failure.detail.as_deref(),
            Some("panicked: accessor exploded")
        );
        assert!(report.results()[1].passed());

        let report = Runner::with_adapter(Panicking).run(&registry);
        let failure = report.results()[1].failure().unwrap();
        assert_eq!(failure.kind, FailureKind::ConstructionFailure);
        assert_eq!(
            failure.detail.as_deref(),
            Some("panicked: runtime exploded")
        );
    }

    #[test]
    fn test_contained_panics_skip_previous_hook() {
        let err = contain(|| -> u8 { panic!("quiet") }).unwrap_err();
        assert_eq!(err, "panicked: quiet");
        assert!(!CONTAINED.with(Cell::get));

        assert_eq!(contain(|| 7).unwrap(), 7);
        assert!(!CONTAINED.with(Cell::get));

        // Panics outside a contained call still reach the previous hook and unwind.
        assert!(panic::catch_unwind(|| -> u8 { panic!("loud") }).is_err());
        assert!(!CONTAINED.with(Cell::get));
    }

    #[test]
    fn test_idempotence_check() {
        let descriptor = GrammarDescriptor::new("fift", "flaky", flaky);
        let idempotent = Runner::new().check_idempotence(true);

        FLAKY_CALLS.store(0, Ordering::SeqCst);
        assert!(Runner::new().verify_one(&descriptor).passed());

        // Loaded first, empty second.
        FLAKY_CALLS.store(0, Ordering::SeqCst);
        let result = idempotent.verify_one(&descriptor);
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::LoadFailure);
        assert_eq!(failure.detail.as_deref(), Some(DIFFERING));

        // Empty first, loaded second.
        FLAKY_CALLS.store(1, Ordering::SeqCst);
        let result = idempotent.verify_one(&descriptor);
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::LoadFailure);
        assert_eq!(failure.detail.as_deref(), Some(DIFFERING));

        // Consistently empty is a plain load failure.
        let stale = GrammarDescriptor::new("tlb", BUNDLED, stale_tlb);
        let failure = idempotent.verify_one(&stale).failure().cloned().unwrap();
        assert_eq!(failure.kind, FailureKind::LoadFailure);
        assert_eq!(failure.detail, None);

        assert!(idempotent.run(&GrammarRegistry::bundled()).all_passed());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let registry = with_stale_tlb();
        let sequential = Runner::new().run(&registry);
        let parallel = Runner::new().parallel(true).run(&registry);
        assert_eq!(sequential.results(), parallel.results());
        assert_eq!(
            Runner::new().run(&registry).results(),
            sequential.results()
        );
    }
}
