// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Single post-order traversal of the AST producing `PatternProperties`:
//! classification into SIMPLE/MEDIUM/COMPLEX, anchoring, and literal
//! extraction used by the prefilter.

use crate::ast::{AstNode, NodeIdx, NodeKind, RegexAst};
use crate::byteclass::ByteClassMatcher;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Classification {
    Simple,
    Medium,
    Complex,
}

/// A non-capturing group nested more than this many levels deep inside a
/// SIMPLE/MEDIUM subtree forces COMPLEX classification (and thus NFA-only
/// routing). See `SPEC_FULL.md` §4.3.
const GROUP_DEPTH_CAP: u32 = 4;
/// Branch-count cap for a top-level alternation to remain MEDIUM-eligible.
const ALT_BRANCH_CAP: usize = 64;
/// A bounded quantifier with a finite `max` above this is COMPLEX (and the
/// DFA builder's own unroll cap, `dfa::MAX_UNROLL`, independently enforces
/// the hard ceiling during construction).
const QUANTIFIER_MAX_CAP: u32 = 1024;

#[derive(Clone, Debug)]
pub struct PatternProperties {
    pub classification: Classification,
    pub start_anchored: bool,
    pub end_anchored: bool,
    pub has_alternation: bool,
    pub has_group: bool,
    pub literal_prefix: Vec<u8>,
    pub required_literal: Vec<u8>,
    pub exact_literal: Option<Vec<u8>>,
    /// When no literal prefix could be extracted but every match must begin
    /// with a byte from this class (the pattern's first mandatory atom is a
    /// `[...]` class, not anchored to the start), the vectorized scan over
    /// this class can still narrow candidate start positions.
    pub required_class: Option<Arc<ByteClassMatcher>>,
    pub byte_class_count: usize,
    pub approx_state_count: usize,
}

impl PatternProperties {
    pub fn dfa_eligible(&self) -> bool {
        matches!(self.classification, Classification::Simple | Classification::Medium)
    }
}

pub fn analyze(ast: &RegexAst) -> PatternProperties {
    let root = ast.get(ast.root);
    let classification = classify_children(ast, &root.children, 0, 0);
    let (start_anchored, end_anchored) = anchoring(ast, &root.children);
    let has_alternation = contains_alternation(ast, ast.root);
    let has_group = contains_group(ast, ast.root);
    let byte_class_count = count_byte_classes(ast, ast.root);
    let approx_state_count = approx_state_count(ast, ast.root);
    let exact_literal = extract_exact_literal(ast, &root.children);
    let literal_prefix = extract_literal_prefix(ast, &root.children);
    let required_literal = if !literal_prefix.is_empty() {
        literal_prefix.clone()
    } else {
        extract_required_literal(ast, &root.children)
    };
    let required_class = if exact_literal.is_none() && literal_prefix.is_empty() && !start_anchored {
        extract_required_class(ast, &root.children)
    } else {
        None
    };
    PatternProperties {
        classification,
        start_anchored,
        end_anchored,
        has_alternation,
        has_group,
        literal_prefix,
        required_literal,
        exact_literal,
        required_class,
        byte_class_count,
        approx_state_count,
    }
}

fn classify_node(ast: &RegexAst, idx: NodeIdx, alt_depth: u32, group_depth: u32) -> Classification {
    let node = ast.get(idx);
    match &node.kind {
        NodeKind::Element(_) | NodeKind::Wildcard | NodeKind::Class { .. } | NodeKind::Anchor(_) => {
            if node.repeat.max != crate::ast::UNBOUNDED && node.repeat.max > QUANTIFIER_MAX_CAP {
                Classification::Complex
            } else {
                Classification::Simple
            }
        }
        NodeKind::Concat | NodeKind::Root => {
            classify_children(ast, &node.children, alt_depth, group_depth)
        }
        NodeKind::Group { capturing: true, .. } => Classification::Complex,
        NodeKind::Group { capturing: false, .. } => {
            if group_depth + 1 > GROUP_DEPTH_CAP {
                return Classification::Complex;
            }
            let body = classify_children(ast, &node.children, alt_depth, group_depth + 1);
            match (body, node.repeat.is_exactly_one()) {
                (Classification::Complex, _) => Classification::Complex,
                (Classification::Medium, false) => Classification::Complex,
                _ => Classification::Medium,
            }
        }
        NodeKind::Alternation => {
            if alt_depth > 0 {
                return Classification::Complex;
            }
            if node.children.len() > ALT_BRANCH_CAP {
                return Classification::Complex;
            }
            let worst = node
                .children
                .iter()
                .map(|&b| classify_node(ast, b, alt_depth + 1, 0))
                .max()
                .unwrap_or(Classification::Simple);
            if worst == Classification::Complex { Classification::Complex } else { Classification::Medium }
        }
    }
}

fn classify_children(ast: &RegexAst, children: &[NodeIdx], alt_depth: u32, group_depth: u32) -> Classification {
    children
        .iter()
        .map(|&c| classify_node(ast, c, alt_depth, group_depth))
        .max()
        .unwrap_or(Classification::Simple)
}

/// Returns the single flat branch list for a root/group body: either the
/// children themselves (no top-level alternation) or the per-branch
/// `Concat` child lists if the body is a single `Alternation` node.
fn flat_branches<'a>(ast: &'a RegexAst, children: &'a [NodeIdx]) -> Vec<&'a [NodeIdx]> {
    if children.len() == 1 {
        if let NodeKind::Alternation = ast.get(children[0]).kind {
            return ast
                .get(children[0])
                .children
                .iter()
                .map(|&b| ast.get(b).children.as_slice())
                .collect();
        }
    }
    vec![children]
}

fn anchoring(ast: &RegexAst, children: &[NodeIdx]) -> (bool, bool) {
    let branches = flat_branches(ast, children);
    if branches.is_empty() {
        return (false, false);
    }
    let start = branches.iter().all(|b| {
        b.first().is_some_and(|&n| matches!(ast.get(n).kind, NodeKind::Anchor(crate::ast::AnchorKind::Start)))
    });
    let end = branches.iter().all(|b| {
        b.last().is_some_and(|&n| matches!(ast.get(n).kind, NodeKind::Anchor(crate::ast::AnchorKind::End)))
    });
    (start, end)
}

fn contains_alternation(ast: &RegexAst, idx: NodeIdx) -> bool {
    let node = ast.get(idx);
    matches!(node.kind, NodeKind::Alternation) || node.children.iter().any(|&c| contains_alternation(ast, c))
}

fn contains_group(ast: &RegexAst, idx: NodeIdx) -> bool {
    let node = ast.get(idx);
    matches!(node.kind, NodeKind::Group { .. }) || node.children.iter().any(|&c| contains_group(ast, c))
}

fn count_byte_classes(ast: &RegexAst, idx: NodeIdx) -> usize {
    let node = ast.get(idx);
    let here = usize::from(matches!(node.kind, NodeKind::Class { .. }));
    here + node.children.iter().map(|&c| count_byte_classes(ast, c)).sum::<usize>()
}

/// A rough estimate of the number of automaton states this subtree would
/// contribute, used only as a heuristic signal (the DFA builder's own
/// state cap is authoritative; see `dfa::MAX_STATES`).
fn approx_state_count(ast: &RegexAst, idx: NodeIdx) -> usize {
    let node = ast.get(idx);
    let multiplier = if node.repeat.max == crate::ast::UNBOUNDED {
        node.repeat.min.max(1) as usize + 1
    } else {
        node.repeat.max.max(1) as usize
    };
    let here = match node.kind {
        NodeKind::Element(_) | NodeKind::Wildcard | NodeKind::Class { .. } | NodeKind::Anchor(_) => 1,
        _ => 0,
    };
    let children_total: usize = node.children.iter().map(|&c| approx_state_count(ast, c)).sum();
    (here + children_total).saturating_mul(multiplier.max(1))
}

fn node_is_fixed_byte(node: &AstNode) -> Option<u8> {
    match node.kind {
        NodeKind::Element(b) if node.repeat.is_exactly_one() => Some(b),
        _ => None,
    }
}

fn extract_exact_literal(ast: &RegexAst, children: &[NodeIdx]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    for &c in children {
        match node_is_fixed_byte(ast.get(c)) {
            Some(b) => out.push(b),
            None => return None,
        }
    }
    Some(out)
}

fn extract_literal_prefix(ast: &RegexAst, children: &[NodeIdx]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = children.iter().peekable();
    // A leading `^` doesn't consume bytes, so it doesn't break a prefix.
    if let Some(&&first) = iter.peek() {
        if matches!(ast.get(first).kind, NodeKind::Anchor(crate::ast::AnchorKind::Start)) {
            iter.next();
        }
    }
    for &c in iter {
        match node_is_fixed_byte(ast.get(c)) {
            Some(b) => out.push(b),
            None => break,
        }
    }
    out
}

/// If the first (mandatory) atom in `children` is a `[...]` class, returns
/// its matcher: every match must begin with a byte from it. A branch
/// alternation or an optional (min == 0) leading atom defeats this, since
/// the requirement wouldn't hold for every match.
fn extract_required_class(ast: &RegexAst, children: &[NodeIdx]) -> Option<Arc<ByteClassMatcher>> {
    let &first = children.first()?;
    let node = ast.get(first);
    if node.repeat.min == 0 {
        return None;
    }
    match &node.kind {
        NodeKind::Class { matcher, .. } => Some(matcher.clone()),
        _ => None,
    }
}

fn extract_required_literal(ast: &RegexAst, children: &[NodeIdx]) -> Vec<u8> {
    let mut best = Vec::new();
    let mut current = Vec::new();
    for &c in children {
        match node_is_fixed_byte(ast.get(c)) {
            Some(b) => current.push(b),
            None => {
                if current.len() > best.len() {
                    best = std::mem::take(&mut current);
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() > best.len() {
        best = current;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn props(pattern: &str) -> PatternProperties {
        analyze(&parse(pattern).unwrap())
    }

    #[test]
    fn literal_is_simple_with_exact_literal() {
        let p = props("hello");
        assert_eq!(p.classification, Classification::Simple);
        assert_eq!(p.exact_literal, Some(b"hello".to_vec()));
    }

    #[test]
    fn class_with_quantifier_is_simple() {
        let p = props("[0-9]+");
        assert_eq!(p.classification, Classification::Simple);
        assert_eq!(p.exact_literal, None);
    }

    #[test]
    fn alternation_of_literals_is_medium() {
        let p = props("cat|dog");
        assert_eq!(p.classification, Classification::Medium);
        assert!(p.has_alternation);
    }

    #[test]
    fn capturing_group_is_complex() {
        let p = props("(a)(b)");
        assert_eq!(p.classification, Classification::Complex);
        assert!(p.has_group);
    }

    #[test]
    fn non_capturing_group_of_simple_is_medium() {
        let p = props("(?:ab)+");
        assert_eq!(p.classification, Classification::Medium);
    }

    #[test]
    fn anchors_detected() {
        let p = props("^abc$");
        assert!(p.start_anchored);
        assert!(p.end_anchored);
        assert_eq!(p.literal_prefix, b"abc");
    }

    #[test]
    fn required_literal_mid_pattern() {
        let p = props("[0-9]+abc[0-9]+");
        assert_eq!(p.required_literal, b"abc");
        assert!(p.literal_prefix.is_empty());
    }
}
