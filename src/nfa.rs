// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The backtracking NFA engine: ordered recursive descent directly over the
//! AST, with greedy quantifiers and a step budget rather than an explicit
//! job stack over flattened bytecode. All per-match state — the step
//! counter, capture slots, and the implicit continuation chain built on the
//! Rust call stack — is local to a single `try_match` call, never stored on
//! `NfaEngine` itself.

use crate::ast::{AstNode, NodeIdx, NodeKind, RegexAst};
use crate::error::Error;

/// Default per-attempt step budget.
pub const DEFAULT_STEP_BUDGET: u64 = 10_000_000;

pub type Captures = Vec<Option<usize>>;

/// A cons-list continuation: "what remains to match after the current node
/// succeeds". Built on the call stack for the duration of one `try_match`,
/// never heap-allocated.
enum Cont<'a> {
    /// The whole pattern has matched; record the end offset of group 0.
    Done,
    /// Continue with the remaining siblings in a concatenation.
    Seq(&'a [NodeIdx], &'a Cont<'a>),
    /// A repeated atom just matched once; fold that back into the
    /// quantifier loop.
    Repeat { idx: NodeIdx, count: u32, min: u32, max: u32, prev_pos: usize, outer: &'a Cont<'a> },
    /// A group body just matched; close its capture slot.
    GroupEnd { slot: Option<(usize, usize)>, outer: &'a Cont<'a> },
}

pub struct NfaEngine<'r> {
    ast: &'r RegexAst,
    budget: u64,
    steps: u64,
}

impl<'r> NfaEngine<'r> {
    pub fn new(ast: &'r RegexAst) -> NfaEngine<'r> {
        NfaEngine { ast, budget: DEFAULT_STEP_BUDGET, steps: 0 }
    }

    pub fn with_budget(ast: &'r RegexAst, budget: u64) -> NfaEngine<'r> {
        NfaEngine { ast, budget, steps: 0 }
    }

    /// Attempts a leftmost match starting exactly at `start`. Ordered
    /// alternation and greedy quantifiers mean the first successful
    /// continuation found is returned; there is no further search for a
    /// "better" match once one is found.
    pub fn try_match(
        &mut self,
        haystack: &[u8],
        start: usize,
        num_groups: u32,
    ) -> Result<Option<Captures>, Error> {
        self.steps = 0;
        let mut caps: Captures = vec![None; 2 * (num_groups as usize + 1)];
        caps[0] = Some(start);
        let root = self.ast.get(self.ast.root).children.clone();
        let matched = self.run_seq(&root, start, haystack, &mut caps, &Cont::Done)?;
        Ok(if matched { Some(caps) } else { None })
    }

    #[inline]
    fn step(&mut self) -> Result<(), Error> {
        self.steps += 1;
        if self.steps > self.budget {
            Err(Error::BudgetExceeded)
        } else {
            Ok(())
        }
    }

    fn run_seq(
        &mut self,
        seq: &[NodeIdx],
        pos: usize,
        hay: &[u8],
        caps: &mut Captures,
        cont: &Cont,
    ) -> Result<bool, Error> {
        match seq.split_first() {
            None => self.run_cont(cont, pos, hay, caps),
            Some((&first, rest)) => {
                let next = Cont::Seq(rest, cont);
                self.match_node(first, pos, hay, caps, &next)
            }
        }
    }

    fn run_cont(&mut self, cont: &Cont, pos: usize, hay: &[u8], caps: &mut Captures) -> Result<bool, Error> {
        self.step()?;
        match cont {
            Cont::Done => {
                caps[1] = Some(pos);
                Ok(true)
            }
            Cont::Seq(seq, outer) => self.run_seq(seq, pos, hay, caps, outer),
            Cont::Repeat { idx, count, min, max, prev_pos, outer } => {
                let stalled = pos == *prev_pos;
                self.match_quant(*idx, *count, *min, *max, pos, stalled, hay, caps, outer)
            }
            Cont::GroupEnd { slot, outer } => {
                let old_end = slot.map(|(_, e)| caps[e]);
                if let Some((_, e)) = slot {
                    caps[*e] = Some(pos);
                }
                let ok = self.run_cont(outer, pos, hay, caps)?;
                if !ok {
                    if let (Some((_, e)), Some(old)) = (slot, old_end) {
                        caps[*e] = old;
                    }
                }
                Ok(ok)
            }
        }
    }

    fn match_node(
        &mut self,
        idx: NodeIdx,
        pos: usize,
        hay: &[u8],
        caps: &mut Captures,
        cont: &Cont,
    ) -> Result<bool, Error> {
        self.step()?;
        let repeat = self.ast.get(idx).repeat;
        if !repeat.is_exactly_one() {
            return self.match_quant(idx, 0, repeat.min, repeat.max, pos, false, hay, caps, cont);
        }
        self.match_once(idx, pos, hay, caps, cont)
    }

    /// Matches `idx` exactly once, then continues with `cont`.
    fn match_once(
        &mut self,
        idx: NodeIdx,
        pos: usize,
        hay: &[u8],
        caps: &mut Captures,
        cont: &Cont,
    ) -> Result<bool, Error> {
        let node: &AstNode = self.ast.get(idx);
        match &node.kind {
            NodeKind::Element(b) => {
                if hay.get(pos) == Some(b) {
                    self.run_cont(cont, pos + 1, hay, caps)
                } else {
                    Ok(false)
                }
            }
            NodeKind::Wildcard => {
                if matches!(hay.get(pos), Some(&b) if b != b'\n') {
                    self.run_cont(cont, pos + 1, hay, caps)
                } else {
                    Ok(false)
                }
            }
            NodeKind::Class { matcher, .. } => match hay.get(pos) {
                Some(&b) if matcher.test_byte(b) => self.run_cont(cont, pos + 1, hay, caps),
                _ => Ok(false),
            },
            NodeKind::Anchor(crate::ast::AnchorKind::Start) => {
                if pos == 0 {
                    self.run_cont(cont, pos, hay, caps)
                } else {
                    Ok(false)
                }
            }
            NodeKind::Anchor(crate::ast::AnchorKind::End) => {
                if pos == hay.len() {
                    self.run_cont(cont, pos, hay, caps)
                } else {
                    Ok(false)
                }
            }
            NodeKind::Group { capturing, index } => {
                let slot = if *capturing {
                    index.map(|i| (2 * i as usize, 2 * i as usize + 1))
                } else {
                    None
                };
                let old_start = slot.map(|(s, _)| caps[s]);
                if let Some((s, _)) = slot {
                    caps[s] = Some(pos);
                }
                let group_cont = Cont::GroupEnd { slot, outer: cont };
                let children = node.children.clone();
                let ok = self.run_seq(&children, pos, hay, caps, &group_cont)?;
                if !ok {
                    if let (Some((s, _)), Some(old)) = (slot, old_start) {
                        caps[s] = old;
                    }
                }
                Ok(ok)
            }
            NodeKind::Alternation => {
                let branches = node.children.clone();
                for branch in branches {
                    let branch_children = self.ast.get(branch).children.clone();
                    if self.run_seq(&branch_children, pos, hay, caps, cont)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            NodeKind::Concat | NodeKind::Root => {
                let children = node.children.clone();
                self.run_seq(&children, pos, hay, caps, cont)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn match_quant(
        &mut self,
        idx: NodeIdx,
        count: u32,
        min: u32,
        max: u32,
        pos: usize,
        stalled: bool,
        hay: &[u8],
        caps: &mut Captures,
        cont: &Cont,
    ) -> Result<bool, Error> {
        self.step()?;
        if count < max && !stalled {
            let rep_cont = Cont::Repeat { idx, count: count + 1, min, max, prev_pos: pos, outer: cont };
            if self.match_once(idx, pos, hay, caps, &rep_cont)? {
                return Ok(true);
            }
        }
        if count >= min {
            return self.run_cont(cont, pos, hay, caps);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::num_capturing_groups;
    use crate::parser::parse;

    fn run(pattern: &str, hay: &[u8], start: usize) -> Option<Captures> {
        let ast = parse(pattern).unwrap();
        let n = num_capturing_groups(&ast);
        NfaEngine::new(&ast).try_match(hay, start, n).unwrap()
    }

    #[test]
    fn literal_match() {
        let caps = run("hello", b"hello world", 0).unwrap();
        assert_eq!((caps[0], caps[1]), (Some(0), Some(5)));
    }

    #[test]
    fn greedy_star_matches_as_much_as_possible() {
        let caps = run("a*", b"aaab", 0).unwrap();
        assert_eq!((caps[0], caps[1]), (Some(0), Some(3)));
    }

    #[test]
    fn empty_match_progress_does_not_infinite_loop() {
        // (a*)* is a classic catastrophic-backtracking shape; it must
        // terminate (and not run away the step budget) on a short input.
        let caps = run("(?:a*)*", b"aaa", 0).unwrap();
        assert_eq!((caps[0], caps[1]), (Some(0), Some(3)));
    }

    #[test]
    fn bounded_quantifier() {
        assert!(run("a{2,3}", b"a", 0).is_none());
        let caps = run("a{2,3}", b"aaaa", 0).unwrap();
        assert_eq!(caps[1], Some(3));
    }

    #[test]
    fn alternation_prefers_leftmost_branch() {
        let caps = run("a|ab", b"ab", 0).unwrap();
        assert_eq!(caps[1], Some(1));
    }

    #[test]
    fn capturing_group_bounds_are_recorded() {
        let caps = run("(a)(b+)", b"abbb", 0).unwrap();
        assert_eq!((caps[2], caps[3]), (Some(0), Some(1)));
        assert_eq!((caps[4], caps[5]), (Some(1), Some(4)));
    }

    #[test]
    fn anchors() {
        assert!(run("^abc", b"abcdef", 0).is_some());
        assert!(run("^abc", b"xabc", 0).is_none());
        assert!(run("abc$", b"xabc", 1).is_some());
        assert!(run("abc$", b"abcx", 0).is_none());
    }

    #[test]
    fn budget_exceeded_on_pathological_backtracking() {
        // A capturing group makes this COMPLEX (NFA-routed); nested
        // quantifiers over a run of 'a's with a failing tail is the textbook
        // catastrophic-backtracking shape.
        let ast = parse("(a+)+b").unwrap();
        let hay = vec![b'a'; 35];
        let n = num_capturing_groups(&ast);
        let mut engine = NfaEngine::with_budget(&ast, 10_000);
        assert_eq!(engine.try_match(&hay, 0, n), Err(Error::BudgetExceeded));
    }
}
