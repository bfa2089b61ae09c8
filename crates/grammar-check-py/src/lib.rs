//! Python bindings: the `_grammar_check` extension module.

use grammar_check::{languages, GrammarRegistry, Runner};
use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;

/// Ids of the bundled languages, in registry order.
#[pyfunction]
fn language_ids() -> Vec<&'static str> {
    languages::ALL.iter().map(|(id, _)| *id).collect()
}

/// Whether the bundled grammar `id` loads.
#[pyfunction]
fn can_load(id: &str) -> PyResult<bool> {
    languages::ALL
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, accessor)| !accessor().is_empty())
        .ok_or_else(|| PyKeyError::new_err(format!("unknown language id '{id}'")))
}

/// Verifies every bundled grammar.
///
/// Returns one `(id, source, passed, failure)` tuple per language, where
/// `failure` is the failure message or `None`.
#[pyfunction]
#[pyo3(signature = (parallel = false))]
fn verify(py: Python<'_>, parallel: bool) -> Vec<(String, String, bool, Option<String>)> {
    let registry = GrammarRegistry::bundled();
    let report = py.allow_threads(|| Runner::new().parallel(parallel).run(&registry));
    report
        .results()
        .iter()
        .map(|r| {
            (
                r.id.clone(),
                r.source.clone(),
                r.passed(),
                r.failure().map(ToString::to_string),
            )
        })
        .collect()
}

#[pymodule]
fn _grammar_check(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(language_ids, m)?)?;
    m.add_function(wrap_pyfunction!(can_load, m)?)?;
    m.add_function(wrap_pyfunction!(verify, m)?)?;
    Ok(())
}
