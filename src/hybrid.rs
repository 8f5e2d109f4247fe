// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `CompiledRegex`: the public compiled-pattern type, wiring together the
//! prefilter, the optional DFA fast path, and the NFA fallback behind a
//! single search loop. The DFA/NFA choice is made once at compile time
//! from `PatternProperties` rather than re-decided per search.

use crate::analyzer::{self, PatternProperties};
use crate::ast::{self, RegexAst};
use crate::dfa::{self, Dfa};
use crate::error::Error;
use crate::nfa::{Captures, NfaEngine};
use crate::parser;
use crate::prefilter::Prefilter;

/// The bounds of a single match, including any capturing groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    start: usize,
    end: usize,
    groups: Vec<Option<(usize, usize)>>,
}

impl Match {
    /// The start offset of the whole match (group 0).
    pub fn start(&self) -> usize {
        self.start
    }

    /// The end offset of the whole match (group 0).
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// The bounds of capturing group `i`. Group 0 is always the whole
    /// match; `None` for a group that didn't participate (e.g. the
    /// untaken branch of an alternation).
    pub fn group(&self, i: usize) -> Option<(usize, usize)> {
        if i == 0 {
            Some((self.start, self.end))
        } else {
            self.groups.get(i - 1).copied().flatten()
        }
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    fn from_captures(caps: &Captures) -> Match {
        let start = caps[0].expect("group 0 start always set on a successful match");
        let end = caps[1].expect("group 0 end always set on a successful match");
        let mut groups = Vec::with_capacity(caps.len() / 2 - 1);
        let mut i = 2;
        while i + 1 < caps.len() {
            groups.push(match (caps[i], caps[i + 1]) {
                (Some(s), Some(e)) => Some((s, e)),
                _ => None,
            });
            i += 2;
        }
        Match { start, end, groups }
    }

    fn dfa_only(start: usize, end: usize) -> Match {
        Match { start, end, groups: Vec::new() }
    }
}

pub struct CompiledRegex {
    pattern: String,
    ast: RegexAst,
    props: PatternProperties,
    dfa: Option<Dfa>,
    prefilter: Prefilter,
    num_groups: u32,
}

impl CompiledRegex {
    pub fn compile(pattern: &str) -> Result<CompiledRegex, Error> {
        let ast = parser::parse(pattern)?;
        let props = analyzer::analyze(&ast);
        let dfa = dfa::compile(&ast, &props).ok();
        let prefilter = Prefilter::from_properties(&props);
        let num_groups = ast::num_capturing_groups(&ast);
        Ok(CompiledRegex { pattern: pattern.to_string(), ast, props, dfa, prefilter, num_groups })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn properties(&self) -> &PatternProperties {
        &self.props
    }

    /// Whether the pattern matches anywhere in `haystack` at or after `start`.
    pub fn test(&self, haystack: &[u8], start: usize) -> Result<bool, Error> {
        Ok(self.match_first(haystack, start)?.is_some())
    }

    /// The leftmost match starting at or after `start`.
    pub fn match_first(&self, haystack: &[u8], start: usize) -> Result<Option<Match>, Error> {
        if start > haystack.len() {
            return Err(Error::InvalidStart { start, len: haystack.len() });
        }
        let mut pos = start;
        loop {
            let candidate = match self.prefilter.next_candidate(haystack, pos) {
                Some(c) => c,
                None => return Ok(None),
            };
            if let Some(m) = self.try_at(haystack, candidate)? {
                return Ok(Some(m));
            }
            if candidate >= haystack.len() {
                return Ok(None);
            }
            pos = candidate + 1;
        }
    }

    /// Identical to [`match_first`](Self::match_first); kept as a separate
    /// name for call sites that iterate, where "next" reads more naturally
    /// than "first" at each step.
    pub fn match_next(&self, haystack: &[u8], start: usize) -> Result<Option<Match>, Error> {
        self.match_first(haystack, start)
    }

    /// All non-overlapping matches in `haystack`, left to right. An empty
    /// match advances the search cursor by one byte so the search always
    /// makes progress.
    pub fn find_all(&self, haystack: &[u8]) -> Result<Vec<Match>, Error> {
        let mut out = Vec::new();
        for m in self.find_iter(haystack) {
            out.push(m?);
        }
        Ok(out)
    }

    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h [u8]) -> FindIter<'r, 'h> {
        FindIter { re: self, haystack, pos: Some(0) }
    }

    fn try_at(&self, haystack: &[u8], pos: usize) -> Result<Option<Match>, Error> {
        // The whole pattern is a fixed literal: the literal searcher is
        // authoritative and the DFA/NFA engines are never consulted.
        if let Some(lit) = self.prefilter.exact_literal() {
            return Ok(crate::literal::find(lit, haystack, pos)
                .filter(|&start| start == pos)
                .map(|start| Match::dfa_only(start, start + lit.len())));
        }
        if let Some(dfa) = &self.dfa {
            return Ok(dfa.run(haystack, pos).map(|end| Match::dfa_only(pos, end)));
        }
        let mut engine = NfaEngine::new(&self.ast);
        let caps = engine.try_match(haystack, pos, self.num_groups)?;
        Ok(caps.as_ref().map(Match::from_captures))
    }
}

pub struct FindIter<'r, 'h> {
    re: &'r CompiledRegex,
    haystack: &'h [u8],
    pos: Option<usize>,
}

impl<'r, 'h> Iterator for FindIter<'r, 'h> {
    type Item = Result<Match, Error>;

    fn next(&mut self) -> Option<Result<Match, Error>> {
        let pos = self.pos?;
        match self.re.match_first(self.haystack, pos) {
            Ok(Some(m)) => {
                let next = if m.end == m.start { m.end + 1 } else { m.end };
                self.pos = if next <= self.haystack.len() { Some(next) } else { None };
                Some(Ok(m))
            }
            Ok(None) => {
                self.pos = None;
                None
            }
            Err(e) => {
                self.pos = None;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_round_trip() {
        let re = CompiledRegex::compile("hello").unwrap();
        assert!(re.test(b"say hello there", 0).unwrap());
        let m = re.match_first(b"say hello there", 0).unwrap().unwrap();
        assert_eq!((m.start(), m.end()), (4, 9));
    }

    #[test]
    fn find_all_non_overlapping_and_empty_match_progress() {
        let re = CompiledRegex::compile("a*").unwrap();
        let matches = re.find_all(b"baab").unwrap();
        let ranges: Vec<_> = matches.iter().map(|m| m.range()).collect();
        assert_eq!(ranges, vec![0..0, 1..3, 3..3, 4..4]);
    }

    #[test]
    fn capturing_groups_via_nfa() {
        let re = CompiledRegex::compile("(a+)(b+)").unwrap();
        let m = re.match_first(b"xxaaabbx", 0).unwrap().unwrap();
        assert_eq!(m.group(0), Some((2, 7)));
        assert_eq!(m.group(1), Some((2, 5)));
        assert_eq!(m.group(2), Some((5, 7)));
    }

    #[test]
    fn invalid_start_is_an_error() {
        let re = CompiledRegex::compile("a").unwrap();
        assert_eq!(re.match_first(b"abc", 10), Err(Error::InvalidStart { start: 10, len: 3 }));
    }

    #[test]
    fn dfa_and_nfa_agree_on_dfa_eligible_pattern() {
        let re = CompiledRegex::compile("[a-z]+[0-9]+").unwrap();
        assert!(re.dfa.is_some());
        let m = re.match_first(b"abc123!", 0).unwrap().unwrap();
        assert_eq!(m.range(), 0..6);
    }

    #[test]
    fn match_next_is_match_first_under_another_name() {
        let re = CompiledRegex::compile("[0-9]+").unwrap();
        assert_eq!(re.match_next(b"ab12cd34", 0), re.match_first(b"ab12cd34", 0));
        assert_eq!(re.match_next(b"ab12cd34", 4), re.match_first(b"ab12cd34", 4));
    }
}
