//! Tolk grammar.
//!
//! Generated for ABI 15; the other bundled tables still use ABI 14.

use crate::artifact::GrammarArtifact;
use crate::language::LanguageHandle;
use std::sync::OnceLock;

/// The precompiled Tolk table.
pub const ARTIFACT: GrammarArtifact =
    GrammarArtifact::new("tolk", include_str!("../../grammars/tolk.json"));

/// Returns the Tolk language, or the empty handle if its table is unusable.
#[must_use]
pub fn language() -> LanguageHandle {
    static HANDLE: OnceLock<LanguageHandle> = OnceLock::new();
    HANDLE.get_or_init(|| ARTIFACT.load()).clone()
}
