//! `FunC` grammar.

use crate::artifact::GrammarArtifact;
use crate::language::LanguageHandle;
use std::sync::OnceLock;

/// The precompiled `FunC` table.
pub const ARTIFACT: GrammarArtifact =
    GrammarArtifact::new("func", include_str!("../../grammars/func.json"));

/// Returns the `FunC` language.
///
/// The handle is empty when the embedded table fails to load.
#[must_use]
pub fn language() -> LanguageHandle {
    static HANDLE: OnceLock<LanguageHandle> = OnceLock::new();
    HANDLE.get_or_init(|| ARTIFACT.load()).clone()
}
