// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A hybrid DFA/NFA regular expression engine for byte haystacks.
//!
//! Patterns are classified at compile time (see [`analyzer`]) into SIMPLE,
//! MEDIUM, or COMPLEX. SIMPLE and MEDIUM patterns — no capturing groups,
//! bounded nesting, no backreferences (backreferences aren't part of this
//! pattern language at all) — get a dense table-driven DFA with O(n)
//! worst-case search time. Everything else, including every pattern with a
//! capturing group, runs on a backtracking NFA that walks the AST directly,
//! bounded by a step budget so a pathological pattern fails fast rather
//! than hanging.
//!
//! ```
//! let re = hybrex::compile(r"(\w+)@(\w+\.\w+)").unwrap();
//! let m = re.match_first(b"contact: jane@example.com today", 0).unwrap().unwrap();
//! assert_eq!(m.group(1).map(|(s, e)| &b"contact: jane@example.com today"[s..e]), Some(&b"jane"[..]));
//! ```
//!
//! See `SPEC_FULL.md` in the repository root for the full specification
//! this crate implements.

mod analyzer;
mod ast;
mod byteclass;
mod cache;
mod dfa;
mod error;
mod hybrid;
mod lexer;
mod literal;
mod nfa;
mod parser;
mod prefilter;

pub use byteclass::PredefinedClass;
pub use error::Error;
pub use hybrid::{CompiledRegex, FindIter, Match};

/// Compiles `pattern`, bypassing the process-wide cache. Most callers want
/// [`compile`] instead; this is for callers who know they'll use a pattern
/// exactly once and don't want it to evict something else from the cache.
pub fn compile_uncached(pattern: &str) -> Result<CompiledRegex, Error> {
    CompiledRegex::compile(pattern)
}

/// Compiles `pattern`, reusing a cached compilation when one exists.
pub fn compile(pattern: &str) -> Result<std::sync::Arc<CompiledRegex>, Error> {
    cache::compile_cached(pattern)
}

/// Convenience: compiles `pattern` and reports whether it matches anywhere
/// in `haystack`.
pub fn search(pattern: &str, haystack: &[u8]) -> Result<bool, Error> {
    compile(pattern)?.test(haystack, 0)
}

/// Convenience: compiles `pattern` and returns the leftmost match in
/// `haystack`, if any.
pub fn match_first(pattern: &str, haystack: &[u8]) -> Result<Option<Match>, Error> {
    compile(pattern)?.match_first(haystack, 0)
}

/// Convenience: compiles `pattern` and returns every non-overlapping match
/// in `haystack`, left to right.
pub fn find_all(pattern: &str, haystack: &[u8]) -> Result<Vec<Match>, Error> {
    compile(pattern)?.find_all(haystack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_functions_route_through_the_cache() {
        assert!(search("wor.d", b"hello world").unwrap());
        let m = match_first("wor.d", b"hello world").unwrap().unwrap();
        assert_eq!(m.range(), 6..11);
        assert_eq!(find_all("o", b"hello world").unwrap().len(), 2);
    }
}
