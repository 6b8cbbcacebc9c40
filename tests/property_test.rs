//! Property-based tests using proptest.
//!
//! These tests verify invariants of the permission parser and scope ordering
//! that should hold for any input.

use proptest::prelude::*;

use request_authz::domain::{has_permission, scope_match, scope_rank, Permission, Scope};

// ============================================================================
// Custom Strategies
// ============================================================================

/// A single colon-free segment
fn arb_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_ -]{0,12}"
}

/// A known scope
fn arb_scope() -> impl Strategy<Value = Scope> {
    prop_oneof![
        Just(Scope::Own),
        Just(Scope::Department),
        Just(Scope::Tenant),
        Just(Scope::Global),
    ]
}

/// Any scope string, known or not
fn arb_scope_string() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_scope().prop_map(|s| s.to_string()),
        Just(String::new()),
        "[a-z]{1,10}",
    ]
}

// ============================================================================
// Parser Properties
// ============================================================================

proptest! {
    /// Property: parsing never panics on arbitrary input
    #[test]
    fn parse_is_total(s in ".*") {
        let _ = Permission::parse(&s);
    }

    /// Property: n <= 3 segments fill exactly the first n fields
    #[test]
    fn parse_fills_fields_left_to_right(segments in prop::collection::vec(arb_segment(), 1..=3)) {
        let raw = segments.join(":");
        let p = Permission::parse(&raw);
        let fields = [p.resource.clone(), p.action.clone(), p.scope.clone()];

        for (i, field) in fields.iter().enumerate() {
            let expected = segments.get(i).cloned().unwrap_or_default();
            prop_assert_eq!(field, &expected);
        }
    }

    /// Property: segments after the third are discarded
    #[test]
    fn parse_truncates_extra_segments(
        segments in prop::collection::vec(arb_segment(), 3..=3),
        extra in prop::collection::vec(arb_segment(), 1..4),
    ) {
        let base = segments.join(":");
        let with_extra = format!("{}:{}", base, extra.join(":"));
        prop_assert_eq!(Permission::parse(&with_extra), Permission::parse(&base));
    }

    /// Property: formatting a parsed permission and parsing again is stable
    #[test]
    fn parse_format_is_idempotent(s in ".*") {
        let once = Permission::parse(&s);
        let twice = Permission::parse(&once.to_string());
        prop_assert_eq!(once, twice);
    }
}

// ============================================================================
// Scope Properties
// ============================================================================

proptest! {
    /// Property: known scopes match themselves
    #[test]
    fn scope_match_is_reflexive(scope in arb_scope()) {
        prop_assert!(scope_match(scope.as_str(), scope.as_str()));
    }

    /// Property: a broader grant satisfies anything a narrower grant satisfies
    #[test]
    fn broader_scope_dominates(
        narrow in arb_scope_string(),
        broad in arb_scope_string(),
        required in arb_scope_string(),
    ) {
        prop_assume!(scope_rank(&broad) >= scope_rank(&narrow));
        if scope_match(&narrow, &required) {
            prop_assert!(scope_match(&broad, &required));
        }
    }

    /// Property: scope_match agrees with the enum ordering for known scopes
    #[test]
    fn scope_match_agrees_with_ordering(user in arb_scope(), required in arb_scope()) {
        prop_assert_eq!(scope_match(user.as_str(), required.as_str()), user >= required);
        prop_assert_eq!(user.dominates(required), user >= required);
    }
}

// ============================================================================
// Matcher Properties
// ============================================================================

proptest! {
    /// Property: an empty grant list never authorizes anything
    #[test]
    fn empty_grants_never_match(resource in arb_segment(), action in arb_segment(), scope in arb_scope_string()) {
        let required = Permission::new(resource, action, scope);
        prop_assert!(!has_permission(Vec::<String>::new(), &required));
    }

    /// Property: a grant identical to the requirement always matches
    #[test]
    fn identical_grant_matches(resource in "[a-z]{1,8}", action in "[a-z]{1,8}", scope in arb_scope()) {
        let required = Permission::scoped(resource, action, scope);
        prop_assert!(has_permission([required.to_string()], &required));
    }

    /// Property: adding grants never revokes access
    #[test]
    fn adding_grants_is_monotonic(
        grants in prop::collection::vec("[a-z]{1,4}:[a-z]{1,4}:(self|tenant|global|x)", 0..6),
        extra in "[a-z]{1,4}:[a-z]{1,4}:(self|tenant|global|x)",
        required in "[a-z]{1,4}:[a-z]{1,4}:(self|tenant|global|x)",
    ) {
        let required = Permission::parse(&required);
        let before = has_permission(&grants, &required);

        let mut more = grants.clone();
        more.push(extra);
        if before {
            prop_assert!(has_permission(&more, &required));
        }
    }

    /// Property: surrounding whitespace on a grant does not change the decision
    #[test]
    fn whitespace_is_ignored(grant in "[a-z]{1,4}:[a-z]{1,4}:(self|tenant|global)", pad in "[ \t]{0,3}") {
        let required = Permission::parse(&grant);
        let padded = format!("{pad}{grant}{pad}");
        prop_assert!(has_permission([padded], &required));
    }
}
