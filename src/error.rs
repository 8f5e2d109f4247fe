// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;

/// The error type for this crate.
///
/// Compile-time errors (`Syntax`) are returned from [`compile`](crate::compile)
/// and are final: a pattern that fails to parse will never later succeed.
/// Run-time errors are returned from the match operations on
/// [`CompiledRegex`](crate::CompiledRegex).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The pattern text could not be lexed or parsed.
    ///
    /// This covers unterminated classes/groups, bad ranges, bad bounded
    /// quantifiers, and bare quantifiers with no preceding atom.
    Syntax(String),
    /// The DFA builder declined a pattern during construction (e.g. a state
    /// cap or an unroll cap was exceeded). Never returned from `compile`: it
    /// is recovered internally by falling back to the NFA (see
    /// `dfa::compile` and `hybrid::CompiledRegex::compile`), and exists as a
    /// variant of this enum rather than a separate type only so the internal
    /// fallback path can use the same `Result<_, Error>` plumbing as
    /// everything else.
    TooComplex(String),
    /// The NFA engine exhausted its step budget on a single match attempt.
    BudgetExceeded,
    /// `start` was not in `[0, haystack.len()]`.
    InvalidStart { start: usize, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Syntax(ref msg) => write!(f, "regex syntax error: {}", msg),
            Error::TooComplex(ref reason) => write!(f, "pattern too complex for the DFA: {}", reason),
            Error::BudgetExceeded => {
                write!(f, "exceeded the matching engine's step budget")
            }
            Error::InvalidStart { start, len } => write!(
                f,
                "start position {} is out of bounds for haystack of length {}",
                start, len
            ),
        }
    }
}

impl error::Error for Error {}
