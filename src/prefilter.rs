// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Required-literal / prefix scan that gates full engine invocation.
//!
//! The prefilter is sound (it never proposes to skip a real match) but may
//! skip ahead over positions where no match can begin. See `SPEC_FULL.md`
//! §4.8.

use crate::analyzer::PatternProperties;
use crate::byteclass::ByteClassMatcher;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum Prefilter {
    /// No prefix/required literal could be extracted; every position is a
    /// candidate.
    None,
    /// The entire pattern is this fixed literal: the literal searcher is
    /// authoritative and the DFA/NFA engines are bypassed entirely.
    Exact(Vec<u8>),
    /// Every match begins with this literal.
    Prefix(Vec<u8>),
    /// Every match contains this literal somewhere, but not necessarily at
    /// its start.
    Required(Vec<u8>),
    /// No literal prefix exists, but every match begins with a byte from
    /// this class (e.g. `\d+...`); the vectorized class scan narrows
    /// candidate start positions the same way a literal prefix would.
    Class(Arc<ByteClassMatcher>),
}

impl Prefilter {
    pub fn from_properties(props: &PatternProperties) -> Prefilter {
        if let Some(lit) = &props.exact_literal {
            Prefilter::Exact(lit.clone())
        } else if !props.literal_prefix.is_empty() {
            Prefilter::Prefix(props.literal_prefix.clone())
        } else if !props.required_literal.is_empty() {
            Prefilter::Required(props.required_literal.clone())
        } else if let Some(matcher) = &props.required_class {
            Prefilter::Class(matcher.clone())
        } else {
            Prefilter::None
        }
    }

    /// Returns the next position at or after `pos` at which the full
    /// engine should be attempted, or `None` if no further match can
    /// begin in `haystack`.
    pub fn next_candidate(&self, haystack: &[u8], pos: usize) -> Option<usize> {
        if pos > haystack.len() {
            return None;
        }
        match self {
            Prefilter::None => Some(pos),
            Prefilter::Exact(lit) | Prefilter::Prefix(lit) => {
                crate::literal::find(lit, haystack, pos)
            }
            Prefilter::Required(lit) => {
                // Every match contains `lit` somewhere, but not necessarily
                // at its start, so we can't jump the scan cursor to the hit
                // offset without risking skipping a match that starts
                // before it. We still get a real benefit: once no further
                // occurrence of `lit` exists, no match can begin anywhere
                // at or after `pos`.
                crate::literal::find(lit, haystack, pos).map(|_| pos)
            }
            Prefilter::Class(matcher) => matcher.scan(haystack, pos),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Prefilter::Exact(_))
    }

    pub fn exact_literal(&self) -> Option<&[u8]> {
        match self {
            Prefilter::Exact(lit) => Some(lit),
            _ => None,
        }
    }
}
