//! Fift assembler grammar.
//!
//! Covers the `PROGRAM{ ... END>c` listings the `FunC` compiler emits, not the
//! full Fift language.

use crate::artifact::GrammarArtifact;
use crate::language::LanguageHandle;
use std::sync::OnceLock;

/// The precompiled Fift assembler table.
pub const ARTIFACT: GrammarArtifact =
    GrammarArtifact::new("fift", include_str!("../../grammars/fift.json"));

/// Returns the Fift assembler language, or the empty handle if its table is unusable.
#[must_use]
pub fn language() -> LanguageHandle {
    static HANDLE: OnceLock<LanguageHandle> = OnceLock::new();
    HANDLE.get_or_init(|| ARTIFACT.load()).clone()
}
