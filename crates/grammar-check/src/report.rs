//! Aggregated results of a verification run.

use crate::verify::{Outcome, VerificationResult};
use facet::Facet;
use std::fmt;

/// Process exit status when every language passed.
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status when at least one language failed.
pub const EXIT_FAILURE: u8 = 1;

/// The ordered results of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationReport {
    results: Vec<VerificationResult>,
}

#[derive(Facet)]
struct ReportDocument {
    summary: ReportSummary,
    results: Vec<ReportEntry>,
}

#[derive(Facet)]
struct ReportSummary {
    total: usize,
    passed: usize,
    failed: usize,
}

#[derive(Facet)]
struct ReportEntry {
    id: String,
    source: String,
    status: String,
    failure: Option<String>,
    detail: Option<String>,
}

impl VerificationReport {
    /// Wraps results already in registry order.
    #[must_use]
    pub fn new(results: Vec<VerificationResult>) -> Self {
        Self { results }
    }

    /// All results, in registry order.
    #[must_use]
    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    /// Results that passed.
    pub fn passed(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| r.passed())
    }

    /// Results that failed.
    pub fn failed(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// Returns `true` if no result failed, including when there are none.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(VerificationResult::passed)
    }

    /// [`EXIT_SUCCESS`] if everything passed, otherwise [`EXIT_FAILURE`].
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Renders the report as a JSON document with a `summary` and one
    /// `results` entry per language.
    #[must_use]
    pub fn to_json(&self) -> String {
        let results: Vec<ReportEntry> = self
            .results
            .iter()
            .map(|r| {
                let failure = r.failure();
                ReportEntry {
                    id: r.id.clone(),
                    source: r.source.clone(),
                    status: if r.passed() { "pass" } else { "fail" }.to_string(),
                    failure: failure.map(|f| f.kind.to_string()),
                    detail: failure.and_then(|f| f.detail.clone()),
                }
            })
            .collect();
        let passed = self.passed().count();
        let document = ReportDocument {
            summary: ReportSummary {
                total: results.len(),
                passed,
                failed: results.len() - passed,
            },
            results,
        };
        facet_json::to_string(&document)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            match &result.outcome {
                Outcome::Pass => writeln!(f, "{} ({}) ... ok", result.id, result.source)?,
                Outcome::Fail(failure) => {
                    writeln!(f, "{} ({}): {failure}", result.id, result.source)?;
                }
            }
        }
        let failed = self.failed().count();
        write!(
            f,
            "{} of {} grammars verified",
            self.results.len() - failed,
            self.results.len()
        )?;
        if failed > 0 {
            write!(f, ", {failed} failed")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{Failure, FailureKind};

    fn result(id: &str, outcome: Outcome) -> VerificationResult {
        VerificationResult {
            id: id.to_string(),
            source: "bundled".to_string(),
            outcome,
        }
    }

    fn mixed() -> VerificationReport {
        VerificationReport::new(vec![
            result("fift", Outcome::Pass),
            result(
                "tlb",
                Outcome::Fail(Failure {
                    kind: FailureKind::LoadFailure,
                    detail: None,
                }),
            ),
            result(
                "tolk",
                Outcome::Fail(Failure {
                    kind: FailureKind::ConstructionFailure,
                    detail: Some("grammar needs an external scanner for 2 token(s)".to_string()),
                }),
            ),
        ])
    }

    #[test]
    fn test_display() {
        assert_eq!(
            mixed().to_string(),
            "fift (bundled) ... ok\n\
             tlb (bundled): grammar failed to load\n\
             tolk (bundled): parser construction failed (grammar needs an external scanner for 2 token(s))\n\
             1 of 3 grammars verified, 2 failed"
        );
    }

    #[test]
    fn test_exit_code() {
        let report = mixed();
        assert!(!report.all_passed());
        assert_eq!(report.exit_code(), EXIT_FAILURE);
        assert_eq!(report.passed().count(), 1);

        let empty = VerificationReport::default();
        assert!(empty.all_passed());
        assert_eq!(empty.exit_code(), EXIT_SUCCESS);
        assert_eq!(empty.to_string(), "0 of 0 grammars verified");
    }

    #[test]
    fn test_json() {
        let json = mixed().to_json();
        let document: ReportDocument = facet_json::from_str(&json).unwrap();
        assert_eq!(document.summary.total, 3);
        assert_eq!(document.summary.passed, 1);
        assert_eq!(document.summary.failed, 2);

        let tlb = &document.results[1];
        assert_eq!(tlb.id, "tlb");
        assert_eq!(tlb.status, "fail");
        assert_eq!(tlb.failure.as_deref(), Some("grammar failed to load"));
        assert_eq!(tlb.detail, None);
        assert_eq!(document.results[0].status, "pass");
    }
}
