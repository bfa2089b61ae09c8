//! The grammars shipped with the language server.
//!
//! Each submodule exposes one zero-argument [`language`](fift::language)
//! accessor. The first call decodes the embedded table; later calls hand out
//! the same cached handle.

pub mod fift;
pub mod func;
pub mod tlb;
pub mod tolk;

use crate::language::LanguageFn;

/// Every bundled language as `(id, accessor)`, in registration order.
pub const ALL: [(&str, LanguageFn); 4] = [
    ("fift", fift::language),
    ("func", func::language),
    ("tlb", tlb::language),
    ("tolk", tolk::language),
];
