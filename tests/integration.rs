//! End-to-end tests against the public API, plus property tests for the
//! universally-quantified invariants (non-overlapping, strictly increasing
//! match starts; `test`/`match_first` agreement; `find_all` equal to
//! repeated `match_first`; DFA/NFA cross-engine agreement on the
//! DFA-eligible subset).

use proptest::prelude::*;

#[test]
fn literal_pattern() {
    let re = hybrex::compile("cargo").unwrap();
    assert!(re.test(b"run cargo build", 0).unwrap());
    let m = re.match_first(b"run cargo build", 0).unwrap().unwrap();
    assert_eq!(m.range(), 4..9);
}

#[test]
fn character_class_with_quantifier() {
    let re = hybrex::compile(r"[0-9]+").unwrap();
    let m = re.match_first(b"port 8080 is open", 0).unwrap().unwrap();
    assert_eq!(m.range(), 5..9);
}

#[test]
fn anchored_pattern() {
    let re = hybrex::compile("^GET ").unwrap();
    assert!(re.test(b"GET /index.html", 0).unwrap());
    assert!(!re.test(b"POST /index.html", 0).unwrap());
}

#[test]
fn alternation_of_literals() {
    let re = hybrex::compile("cat|dog|bird").unwrap();
    let haystack = b"I have a dog and a cat";
    let matches = re.find_all(haystack).unwrap();
    let words: Vec<&[u8]> = matches.iter().map(|m| &haystack[m.range()]).collect();
    assert_eq!(words, vec![&b"dog"[..], &b"cat"[..]]);
}

#[test]
fn bounded_quantifier_with_classes() {
    let re = hybrex::compile(r"[a-z]{2,4}[0-9]").unwrap();
    assert!(re.test(b"ab3", 0).unwrap());
    assert!(!re.test(b"a3", 0).unwrap());
}

#[test]
fn empty_match_progress_on_nullable_pattern() {
    let re = hybrex::compile(r"\d*").unwrap();
    let matches = re.find_all(b"a1b22c").unwrap();
    assert_eq!(matches.len(), 6);
    assert!(matches.windows(2).all(|w| w[0].start() < w[1].start()));
}

#[test]
fn capturing_groups_and_alternation_together() {
    let re = hybrex::compile(r"(foo|bar)=(\d+)").unwrap();
    let m = re.match_first(b"key: bar=42", 0).unwrap().unwrap();
    assert_eq!(m.group(1), Some((5, 8)));
    assert_eq!(m.group(2), Some((9, 11)));
}

#[test]
fn budget_exceeded_surfaces_as_an_error() {
    // `^(a+)+$` has no extractable required literal (only anchors), so the
    // prefilter can't short-circuit the search the way it would for a
    // pattern like `(a+)+c` against a haystack with no `c` at all. A
    // trailing non-`a` byte makes the match fail only after exhausting the
    // classic catastrophic-backtracking search space.
    let re = hybrex::compile(r"^(a+)+$").unwrap();
    let mut haystack = vec![b'a'; 24];
    haystack.push(b'b');
    assert_eq!(re.match_first(&haystack, 0), Err(hybrex::Error::BudgetExceeded));
}

fn ascii_haystack() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(&b"abc01 .@"[..]), 0..40)
}

proptest! {
    #[test]
    fn find_all_matches_are_non_overlapping_and_increasing(hay in ascii_haystack()) {
        let re = hybrex::compile(r"[a-z]+|[0-9]+").unwrap();
        let matches = re.find_all(&hay).unwrap();
        for w in matches.windows(2) {
            prop_assert!(w[0].end() <= w[1].start());
            prop_assert!(w[0].start() < w[1].start());
        }
    }

    #[test]
    fn test_and_match_first_agree_at_every_offset(hay in ascii_haystack()) {
        let re = hybrex::compile(r"[a-z]+\.[a-z]+").unwrap();
        for k in 0..=hay.len() {
            prop_assert_eq!(re.test(&hay, k).unwrap(), re.match_first(&hay, k).unwrap().is_some());
        }
    }

    #[test]
    fn find_all_equals_repeated_match_first(hay in ascii_haystack()) {
        let re = hybrex::compile(r"[a-z0-9]+").unwrap();
        let all = re.find_all(&hay).unwrap();

        let mut expected = Vec::new();
        let mut pos = 0;
        while pos <= hay.len() {
            match re.match_first(&hay, pos).unwrap() {
                None => break,
                Some(m) => {
                    let next = if m.end() == m.start() { m.end() + 1 } else { m.end() };
                    expected.push(m);
                    pos = next;
                }
            }
        }
        prop_assert_eq!(all.len(), expected.len());
        for (a, b) in all.iter().zip(expected.iter()) {
            prop_assert_eq!(a.range(), b.range());
        }
    }

    #[test]
    fn required_literal_prefilter_never_skips_a_real_match(hay in ascii_haystack()) {
        // A pattern with a required literal mid-pattern ("@") exercises the
        // prefilter's soundness contract against a pattern with no literal
        // extraction at all, which must agree on whether a match exists.
        let with_prefilter = hybrex::compile(r"[a-z]+@[a-z]+").unwrap();
        let without_prefilter = hybrex::compile(r"[a-z]+[@][a-z]+").unwrap();
        prop_assert_eq!(
            with_prefilter.test(&hay, 0).unwrap(),
            without_prefilter.test(&hay, 0).unwrap()
        );
    }
}

