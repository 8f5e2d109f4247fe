// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Thompson construction over the AST followed by subset construction into
//! a dense, table-driven DFA.
//!
//! The intermediate representation is a byte-range Thompson program
//! (`TInst`), but the thing actually executed at match time is a
//! pre-computed dense transition table rather than a program walked
//! instruction-by-instruction. Construction only ever runs
//! for SIMPLE/MEDIUM patterns (see `analyzer::Classification`); anything
//! that doesn't fit falls back to the NFA engine by returning
//! `Error::TooComplex`.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::analyzer::PatternProperties;
use crate::ast::{AnchorKind, NodeIdx, NodeKind, RegexAst};
use crate::error::Error;

/// Hard ceiling on subset-construction states. A pattern that would need
/// more is rejected in favor of the NFA engine rather than built partway.
pub const MAX_STATES: usize = 65_535;
/// Hard ceiling on how many times a single bounded quantifier is unrolled
/// during Thompson construction.
pub const MAX_UNROLL: u32 = 1024;

type Pc = usize;
const HOLE: Pc = usize::MAX;

#[derive(Clone, Copy, Debug)]
enum TInst {
    /// Consumes one byte in `[lo, hi]`. `lo > hi` never matches anything
    /// (used to compile a negated class that covers the whole byte range).
    Byte { lo: u8, hi: u8, next: Pc },
    /// Epsilon split; `a` is preferred (goto1-has-precedence convention).
    Split { a: Pc, b: Pc },
    /// Epsilon jump, used for empty sequences and stripped anchors.
    Jmp { next: Pc },
    Match,
}

#[derive(Clone, Copy)]
enum HoleField {
    Next,
    A,
    B,
}

type Hole = (Pc, HoleField);

fn push(insts: &mut Vec<TInst>, inst: TInst) -> Pc {
    insts.push(inst);
    insts.len() - 1
}

fn patch(insts: &mut [TInst], holes: &[Hole], target: Pc) {
    for &(pc, field) in holes {
        match (&mut insts[pc], field) {
            (TInst::Byte { next, .. }, HoleField::Next) => *next = target,
            (TInst::Jmp { next }, HoleField::Next) => *next = target,
            (TInst::Split { a, .. }, HoleField::A) => *a = target,
            (TInst::Split { b, .. }, HoleField::B) => *b = target,
            _ => unreachable!("hole field does not match instruction kind"),
        }
    }
}

/// A dense, table-driven DFA state: one transition per possible byte.
pub struct DfaState {
    pub trans: [u32; 256],
    pub accepting: bool,
}

/// Sentinel transition meaning "no further match can proceed".
pub const DEAD: u32 = u32::MAX;

pub struct Dfa {
    states: Vec<DfaState>,
    start_state: u32,
    has_start_anchor: bool,
    has_end_anchor: bool,
}

impl Dfa {
    /// Runs a leftmost-longest match anchored exactly at `start`. Returns
    /// the end offset of the longest match found, or `None`.
    pub fn run(&self, haystack: &[u8], start: usize) -> Option<usize> {
        if self.has_start_anchor && start != 0 {
            return None;
        }
        let mut state = self.start_state;
        let mut pos = start;
        let mut last_accept = self.accept_at(state, pos, haystack.len());
        while pos < haystack.len() {
            let next = self.states[state as usize].trans[haystack[pos] as usize];
            if next == DEAD {
                break;
            }
            state = next;
            pos += 1;
            if let Some(end) = self.accept_at(state, pos, haystack.len()) {
                last_accept = Some(end);
            }
        }
        last_accept
    }

    fn accept_at(&self, state: u32, pos: usize, hay_len: usize) -> Option<usize> {
        if self.states[state as usize].accepting && (!self.has_end_anchor || pos == hay_len) {
            Some(pos)
        } else {
            None
        }
    }
}

/// Builds a `Dfa` for `ast`, or declines with `Error::TooComplex` if the
/// pattern isn't DFA-eligible or construction would exceed the size caps.
pub fn compile(ast: &RegexAst, props: &PatternProperties) -> Result<Dfa, Error> {
    if !props.dfa_eligible() {
        return Err(Error::TooComplex("pattern classified COMPLEX".into()));
    }
    if !anchors_are_boundary_only(ast) {
        return Err(Error::TooComplex("anchor is not at the pattern boundary".into()));
    }
    let mut insts = Vec::new();
    let root = ast.get(ast.root);
    let (entry, holes) = compile_seq(ast, &root.children, &mut insts)?;
    let match_pc = push(&mut insts, TInst::Match);
    patch(&mut insts, &holes, match_pc);
    subset_construct(&insts, entry, props.start_anchored, props.end_anchored)
}

/// A `^`/`$` anchor is only meaningful as a DFA transition flag when it sits
/// at the very start/end of the whole pattern; anything nested (e.g. inside
/// one branch of an alternation) can't be captured by a position-independent
/// table, so such patterns are declined here and handled by the NFA engine.
fn anchors_are_boundary_only(ast: &RegexAst) -> bool {
    let root = ast.get(ast.root);
    let mut allowed = BTreeSet::new();
    if let Some(&first) = root.children.first() {
        if matches!(ast.get(first).kind, NodeKind::Anchor(AnchorKind::Start)) {
            allowed.insert(first);
        }
    }
    if let Some(&last) = root.children.last() {
        if matches!(ast.get(last).kind, NodeKind::Anchor(AnchorKind::End)) {
            allowed.insert(last);
        }
    }
    fn walk(ast: &RegexAst, idx: NodeIdx, allowed: &BTreeSet<NodeIdx>) -> bool {
        let node = ast.get(idx);
        if matches!(node.kind, NodeKind::Anchor(_)) && !allowed.contains(&idx) {
            return false;
        }
        node.children.iter().all(|&c| walk(ast, c, allowed))
    }
    walk(ast, ast.root, &allowed)
}

fn compile_seq(ast: &RegexAst, children: &[NodeIdx], insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    if children.is_empty() {
        let pc = push(insts, TInst::Jmp { next: HOLE });
        return Ok((pc, vec![(pc, HoleField::Next)]));
    }
    let mut entry = None;
    let mut prev_holes: Vec<Hole> = Vec::new();
    for (i, &child) in children.iter().enumerate() {
        let (e, h) = compile_node(ast, child, insts)?;
        if i == 0 {
            entry = Some(e);
        } else {
            patch(insts, &prev_holes, e);
        }
        prev_holes = h;
    }
    Ok((entry.unwrap(), prev_holes))
}

fn compile_node(ast: &RegexAst, idx: NodeIdx, insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    let repeat = ast.get(idx).repeat;
    if repeat.is_exactly_one() {
        compile_atom_once(ast, idx, insts)
    } else {
        compile_repeat(ast, idx, repeat.min, repeat.max, insts)
    }
}

fn compile_atom_once(ast: &RegexAst, idx: NodeIdx, insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    let node = ast.get(idx);
    match &node.kind {
        NodeKind::Element(b) => {
            let pc = push(insts, TInst::Byte { lo: *b, hi: *b, next: HOLE });
            Ok((pc, vec![(pc, HoleField::Next)]))
        }
        NodeKind::Wildcard => compile_ranges(&[(0, 9), (11, 255)], insts),
        NodeKind::Class { set, negated, .. } => {
            let ranges = dense_ranges(&set.to_dense(*negated));
            compile_ranges(&ranges, insts)
        }
        NodeKind::Anchor(_) => {
            // Boundary placement already validated by `anchors_are_boundary_only`;
            // the anchor itself contributes no byte transitions.
            let pc = push(insts, TInst::Jmp { next: HOLE });
            Ok((pc, vec![(pc, HoleField::Next)]))
        }
        NodeKind::Group { .. } | NodeKind::Concat | NodeKind::Root => {
            compile_seq(ast, &node.children.clone(), insts)
        }
        NodeKind::Alternation => {
            let mut frags = Vec::new();
            for &branch in &node.children {
                let branch_children = ast.get(branch).children.clone();
                frags.push(compile_seq(ast, &branch_children, insts)?);
            }
            combine_alternatives(frags, insts)
        }
    }
}

/// Collapses a dense 256-entry membership table into minimal contiguous
/// ranges.
fn dense_ranges(dense: &[bool; 256]) -> Vec<(u8, u8)> {
    let mut ranges = Vec::new();
    let mut start: Option<u8> = None;
    for b in 0..=255u16 {
        if dense[b as usize] {
            if start.is_none() {
                start = Some(b as u8);
            }
        } else if let Some(s) = start.take() {
            ranges.push((s, (b - 1) as u8));
        }
    }
    if let Some(s) = start {
        ranges.push((s, 255));
    }
    ranges
}

fn compile_ranges(ranges: &[(u8, u8)], insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    if ranges.is_empty() {
        // Never matches any byte: a class that (after negation) is empty.
        let pc = push(insts, TInst::Byte { lo: 1, hi: 0, next: HOLE });
        return Ok((pc, vec![(pc, HoleField::Next)]));
    }
    let frags: Vec<(Pc, Vec<Hole>)> = ranges
        .iter()
        .map(|&(lo, hi)| {
            let pc = push(insts, TInst::Byte { lo, hi, next: HOLE });
            (pc, vec![(pc, HoleField::Next)])
        })
        .collect();
    combine_alternatives(frags, insts)
}

/// Chains fragments together with `Split` instructions, left-preferred.
fn combine_alternatives(mut frags: Vec<(Pc, Vec<Hole>)>, insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    let mut acc = frags.pop().expect("at least one alternative");
    while let Some((entry, holes)) = frags.pop() {
        let split = push(insts, TInst::Split { a: entry, b: acc.0 });
        let mut combined = holes;
        combined.extend(acc.1);
        acc = (split, combined);
    }
    Ok(acc)
}

fn compile_repeat(ast: &RegexAst, base: NodeIdx, min: u32, max: u32, insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    if max != crate::ast::UNBOUNDED && max > MAX_UNROLL {
        return Err(Error::TooComplex("bounded quantifier exceeds unroll cap".into()));
    }
    if min == 0 && max == 0 {
        let pc = push(insts, TInst::Jmp { next: HOLE });
        return Ok((pc, vec![(pc, HoleField::Next)]));
    }
    if max == crate::ast::UNBOUNDED {
        if min == 0 {
            return compile_star(ast, base, insts);
        }
        let mut entry = None;
        let mut prev_holes: Vec<Hole> = Vec::new();
        for i in 0..min {
            let (e, h) = compile_atom_once(ast, base, insts)?;
            if i == 0 {
                entry = Some(e);
            } else {
                patch(insts, &prev_holes, e);
            }
            prev_holes = h;
        }
        let (star_entry, star_holes) = compile_star(ast, base, insts)?;
        patch(insts, &prev_holes, star_entry);
        return Ok((entry.unwrap(), star_holes));
    }
    // Finite max: `min` mandatory copies, then `max - min` copies each
    // individually skippable straight to the shared exit.
    let mut entry = None;
    let mut prev_holes: Vec<Hole> = Vec::new();
    let mut out_holes: Vec<Hole> = Vec::new();
    for i in 0..max {
        let (e, h) = compile_atom_once(ast, base, insts)?;
        if i < min {
            if i == 0 {
                entry = Some(e);
            } else {
                patch(insts, &prev_holes, e);
            }
            prev_holes = h;
        } else {
            let split = push(insts, TInst::Split { a: e, b: HOLE });
            if i == 0 {
                entry = Some(split);
            } else {
                patch(insts, &prev_holes, split);
            }
            out_holes.push((split, HoleField::B));
            prev_holes = h;
        }
    }
    out_holes.extend(prev_holes);
    Ok((entry.unwrap(), out_holes))
}

fn compile_star(ast: &RegexAst, base: NodeIdx, insts: &mut Vec<TInst>) -> Result<(Pc, Vec<Hole>), Error> {
    let (child_entry, child_holes) = compile_atom_once(ast, base, insts)?;
    let split = push(insts, TInst::Split { a: child_entry, b: HOLE });
    patch(insts, &child_holes, split);
    Ok((split, vec![(split, HoleField::B)]))
}

fn epsilon_closure(insts: &[TInst], starts: &[Pc]) -> (BTreeSet<Pc>, bool) {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<Pc> = starts.to_vec();
    let mut out = BTreeSet::new();
    let mut has_match = false;
    while let Some(pc) = stack.pop() {
        if !seen.insert(pc) {
            continue;
        }
        match insts[pc] {
            TInst::Split { a, b } => {
                stack.push(a);
                stack.push(b);
            }
            TInst::Jmp { next } => stack.push(next),
            TInst::Byte { .. } => {
                out.insert(pc);
            }
            TInst::Match => {
                out.insert(pc);
                has_match = true;
            }
        }
    }
    (out, has_match)
}

fn subset_construct(insts: &[TInst], start: Pc, start_anchored: bool, end_anchored: bool) -> Result<Dfa, Error> {
    let (start_set, start_accept) = epsilon_closure(insts, &[start]);
    let mut states: Vec<DfaState> = Vec::new();
    let mut index_of: HashMap<BTreeSet<Pc>, u32> = HashMap::new();
    let mut queue: VecDeque<BTreeSet<Pc>> = VecDeque::new();

    index_of.insert(start_set.clone(), 0);
    states.push(DfaState { trans: [DEAD; 256], accepting: start_accept });
    queue.push_back(start_set);

    while let Some(set) = queue.pop_front() {
        let id = index_of[&set];
        let mut by_byte_sources: [Vec<Pc>; 256] = std::array::from_fn(|_| Vec::new());
        for &pc in &set {
            if let TInst::Byte { lo, hi, next } = insts[pc] {
                for b in lo..=hi {
                    by_byte_sources[b as usize].push(next);
                }
            }
        }
        for b in 0..256usize {
            if by_byte_sources[b].is_empty() {
                continue;
            }
            let (closure, accept) = epsilon_closure(insts, &by_byte_sources[b]);
            if closure.is_empty() {
                continue;
            }
            let next_id = match index_of.get(&closure) {
                Some(&id) => id,
                None => {
                    if states.len() >= MAX_STATES {
                        return Err(Error::TooComplex("dfa exceeds the maximum state count".into()));
                    }
                    let id = states.len() as u32;
                    index_of.insert(closure.clone(), id);
                    states.push(DfaState { trans: [DEAD; 256], accepting: accept });
                    queue.push_back(closure);
                    id
                }
            };
            states[id as usize].trans[b] = next_id;
        }
    }

    Ok(Dfa { states, start_state: 0, has_start_anchor: start_anchored, has_end_anchor: end_anchored })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::parser::parse;

    fn build(pattern: &str) -> Dfa {
        let ast = parse(pattern).unwrap();
        let props = analyze(&ast);
        compile(&ast, &props).unwrap()
    }

    #[test]
    fn literal_match() {
        let dfa = build("hello");
        assert_eq!(dfa.run(b"hello world", 0), Some(5));
        assert_eq!(dfa.run(b"goodbye", 0), None);
    }

    #[test]
    fn class_with_star_is_longest_match() {
        let dfa = build("[0-9]+");
        assert_eq!(dfa.run(b"42 apples", 0), Some(2));
    }

    #[test]
    fn alternation_of_literals() {
        let dfa = build("cat|dog");
        assert_eq!(dfa.run(b"dog house", 0), Some(3));
        assert_eq!(dfa.run(b"cat nap", 0), Some(3));
        assert_eq!(dfa.run(b"fish", 0), None);
    }

    #[test]
    fn bounded_quantifier() {
        let dfa = build("a{2,3}");
        assert_eq!(dfa.run(b"a", 0), None);
        assert_eq!(dfa.run(b"aaaa", 0), Some(3));
    }

    #[test]
    fn boundary_anchors() {
        let dfa = build("^abc$");
        assert_eq!(dfa.run(b"abc", 0), Some(3));
        assert_eq!(dfa.run(b"abcd", 0), None);
        assert_eq!(dfa.run(b"xabc", 0), None);
    }

    #[test]
    fn mid_pattern_anchor_falls_back_to_nfa() {
        let ast = parse("^a|b").unwrap();
        let props = analyze(&ast);
        assert!(props.dfa_eligible());
        assert!(compile(&ast, &props).is_err());
    }

    #[test]
    fn capturing_group_is_never_dfa_eligible() {
        let ast = parse("(a)(b)").unwrap();
        let props = analyze(&ast);
        assert!(compile(&ast, &props).is_err());
    }

    #[test]
    fn nested_star_of_star_terminates() {
        let dfa = build("(?:a*)*");
        assert_eq!(dfa.run(b"aaa", 0), Some(3));
        assert_eq!(dfa.run(b"", 0), Some(0));
    }
}
