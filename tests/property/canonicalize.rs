//! Property-based tests for the reposition rule.
//!
//! Parameter lists are generated from a small pool of types, some of them
//! handles, and passed straight through to a variadic call so that the
//! declaration and the call site exercise the same list.

use ctxfirst::canonicalize_source;
use ctxfirst::handles::HandleTypeSet;
use proptest::prelude::*;

const TYPES: [&str; 7] = ["int", "string", "bool", "error", "[]byte", "context.Context", "*context.Context"];

fn is_handle(ty: &str) -> bool {
    ty == "context.Context" || ty == "*context.Context"
}

fn arb_types() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(TYPES.to_vec()), 1..7)
}

/// Source with `f`'s parameters (and the matching call arguments) laid out
/// in `order`; `order[k]` is the original index of the entry at position `k`.
fn source(types: &[&str], order: &[usize]) -> String {
    let params: Vec<String> = order.iter().map(|&i| format!("p{i} {}", types[i])).collect();
    let args: Vec<String> = order.iter().map(|&i| format!("p{i}")).collect();
    format!(
        "package p\n\nimport \"context\"\n\nfunc sink(xs ...any) {{}}\n\nfunc f({}) {{\n\tsink({})\n}}\n",
        params.join(", "),
        args.join(", ")
    )
}

fn canon(src: &str) -> (String, bool) {
    canonicalize_source(src, &HandleTypeSet::default()).unwrap()
}

proptest! {
    /// Property: the first handle swaps with entry 0 and nothing else moves.
    #[test]
    fn first_handle_swaps_with_front(types in arb_types()) {
        let identity: Vec<usize> = (0..types.len()).collect();
        let mut expected = identity.clone();
        let first = types.iter().position(|t| is_handle(t)).unwrap_or(0);
        expected.swap(0, first);

        let (out, changed) = canon(&source(&types, &identity));
        prop_assert_eq!(changed, first > 0);
        prop_assert_eq!(out, source(&types, &expected));
    }

    /// Property: canonicalizing twice is the same as canonicalizing once.
    #[test]
    fn canonicalize_is_idempotent(types in arb_types()) {
        let identity: Vec<usize> = (0..types.len()).collect();
        let (once, _) = canon(&source(&types, &identity));
        let (twice, changed) = canon(&once);
        prop_assert!(!changed);
        prop_assert_eq!(once, twice);
    }

    /// Property: lists without handles come back byte-identical.
    #[test]
    fn handle_free_lists_are_untouched(types in arb_types()) {
        let plain: Vec<&str> = types.into_iter().filter(|t| !is_handle(t)).collect();
        prop_assume!(!plain.is_empty());
        let identity: Vec<usize> = (0..plain.len()).collect();
        let src = source(&plain, &identity);
        let (out, changed) = canon(&src);
        prop_assert!(!changed);
        prop_assert_eq!(out, src);
    }
}
