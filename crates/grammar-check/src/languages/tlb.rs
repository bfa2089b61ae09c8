//! TL-B grammar, for the `.tlb` schemas describing cell layouts.

use crate::artifact::GrammarArtifact;
use crate::language::LanguageHandle;
use std::sync::OnceLock;

/// The precompiled TL-B table.
pub const ARTIFACT: GrammarArtifact =
    GrammarArtifact::new("tlb", include_str!("../../grammars/tlb.json"));

/// Returns the TL-B language, or the empty handle if its table is unusable.
#[must_use]
pub fn language() -> LanguageHandle {
    static HANDLE: OnceLock<LanguageHandle> = OnceLock::new();
    HANDLE.get_or_init(|| ARTIFACT.load()).clone()
}
