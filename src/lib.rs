//! regexgate: a policy-enforcing regular expression front end.
//!
//! Different regex-consuming environments support different syntax subsets
//! and have different denial-of-service exposure. This crate compiles a
//! pattern string into an immutable syntax tree while rejecting every
//! construct a [`FeatureSet`] disallows and flagging pattern shapes that are
//! prone to catastrophic backtracking, with precise offset-carrying
//! diagnostics. The resulting tree is meant to feed a separate
//! match-execution engine; this crate only gates what reaches it.
//!
//! Pick one of the named profiles ([`FeatureSet::java_default`],
//! [`FeatureSet::all_disabled`], [`FeatureSet::ecma_script_regexp`],
//! [`FeatureSet::boost_xpressive`]) or derive a custom policy:
//!
//! ```
//! use regexgate::{compile, FeatureSet, RegexFeature};
//!
//! let policy = FeatureSet::copy_of(FeatureSet::java_default());
//! policy.set_enabled(RegexFeature::CompoundQuantifiers, false);
//!
//! // a catastrophic backtracking shape is rejected before execution
//! let error = compile("(A+)*", &policy).unwrap_err();
//! assert_eq!(error.feature(), Some(RegexFeature::CompoundQuantifiers));
//!
//! // the tree of an accepted pattern is ready for a match engine
//! let tree = compile("(red|white) king", &policy).unwrap();
//! assert_eq!(tree.capture_count(), 1);
//! ```
//!
//! The number parsing helpers ([`parse_positive_int`], [`parse_double`],
//! [`parse_float`]) are exposed for standalone reuse; they signal malformed
//! input with `None` / `NaN` instead of errors.

mod features;
mod numbers;
mod syntax;

pub use features::{FeatureSet, RegexFeature};
pub use numbers::{parse_double, parse_float, parse_positive_int};
pub use syntax::{
    compile, AnchorKind, BoundaryKind, CharClass, ClassItem, CompileError, FeatureViolation,
    FlagChange, GroupKind, MatchFlags, Node, NodeId, PosixClass, PredefClass, PropertyClass,
    QuantMode, SyntaxError, SyntaxTree, UNKNOWN_INDEX,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// The policy the complexity scenarios run under: permissive syntax,
    /// every complexity heuristic enforced, zero tolerated overlaps.
    fn strict_complexity() -> FeatureSet {
        let set = FeatureSet::copy_of(FeatureSet::java_default());
        set.set_enabled(RegexFeature::CompoundQuantifiers, false);
        set.set_enabled(RegexFeature::OverlappingQuantifiedTokens, false);
        set.set_enabled(RegexFeature::UnrestrictedNestedGroups, false);
        set.set_enabled(RegexFeature::UnrestrictedLength, false);
        set.set_ignored_overlapping_quantifiers(0);
        set
    }

    fn verify_violation(features: &FeatureSet, expected: RegexFeature, pattern: &str) {
        match compile(pattern, features) {
            Err(CompileError::Feature(violation)) => assert_eq!(
                violation.feature(),
                expected,
                "pattern: {pattern}"
            ),
            Err(CompileError::Syntax(error)) => {
                panic!("pattern {pattern}: expected {expected:?}, got syntax error: {error}")
            }
            Ok(_) => panic!("pattern {pattern}: expected {expected:?}, but it compiled"),
        }
    }

    fn verify_ok(features: &FeatureSet, pattern: &str) {
        if let Err(error) = compile(pattern, features) {
            panic!("pattern {pattern} should compile, got: {error}");
        }
    }

    #[test]
    fn test_compound_quantifiers() {
        let features = strict_complexity();

        // *, + and {m,n} quantifiers within a group are not allowed when
        // the group also has a *, + or {m,n} quantifier. Possessive
        // variants and groups within an independent group are exempt.
        verify_violation(&features, RegexFeature::CompoundQuantifiers, "(A+)*");
        verify_ok(&features, "(A+)*+");
        verify_ok(&features, "(?>(A+)*)");

        verify_violation(&features, RegexFeature::CompoundQuantifiers, "^(A+)*B");
        verify_ok(&features, "^(A+)*+B");
        verify_ok(&features, "^(?>(A+)*)B");

        verify_violation(
            &features,
            RegexFeature::CompoundQuantifiers,
            "(?:\\D+|0(?!1))*",
        );
        verify_ok(&features, "(?:\\D+|0(?!1))*+");

        verify_violation(&features, RegexFeature::CompoundQuantifiers, "^(.*?,){11}P");

        // a lazy inner quantifier is still hazardous, only possessive cuts
        // the backtracking
        verify_violation(&features, RegexFeature::CompoundQuantifiers, "(a+?)*");

        let with_nesting = FeatureSet::copy_of(&features);
        with_nesting.set_enabled(RegexFeature::UnrestrictedNestedGroups, true);
        verify_ok(&with_nesting, "(?>(?:\\D+|0(?!1))*)");
    }

    #[test]
    fn test_compound_quantifier_offset() {
        let features = strict_complexity();
        let error = compile("(A+)*", &features).unwrap_err();
        assert_eq!(error.index(), 4);
        let error = compile("^(.*?,){11}P", &features).unwrap_err();
        assert_eq!(error.index(), 7);
    }

    #[test]
    fn test_compound_quantifiers_from_redos_examples() {
        let features = strict_complexity();
        verify_violation(&features, RegexFeature::CompoundQuantifiers, "(a+)+");
        verify_violation(&features, RegexFeature::CompoundQuantifiers, "([a-zA-Z]+)*");
        verify_violation(&features, RegexFeature::CompoundQuantifiers, "(.*a){11}");
        verify_violation(
            &features,
            RegexFeature::CompoundQuantifiers,
            "^([a-zA-Z0-9])(([\\-.]|[_]+)?([a-zA-Z0-9]+))*(@){1}[a-z0-9]+[.]{1}(([a-z]{2,3})|([a-z]{2,3}[.]{1}[a-z]{2,3}))$",
        );
        verify_violation(
            &features,
            RegexFeature::CompoundQuantifiers,
            "^(([a-z])+.)+[A-Z]([a-z])+$",
        );
    }

    #[test]
    fn test_overlapping_quantified_tokens_ignore_first() {
        let features = strict_complexity();
        features.set_ignored_overlapping_quantifiers(1);

        verify_ok(&features, ".*.*");
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "a+.*.*",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "\\d+\\d*\\d+",
        );
    }

    #[test]
    fn test_overlapping_quantified_tokens() {
        let features = strict_complexity();

        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\d+\\w*@",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\d+\\w{1,}@",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\d+\\w{1}@",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\d*\\w+@",
        );

        // only problematic for combinations of +, * and {m,n} where n > 1
        verify_ok(&features, "\\d\\w");
        verify_ok(&features, "\\d\\w*");
        verify_ok(&features, "\\d*\\w");
        verify_ok(&features, "\\d\\w+");
        verify_ok(&features, "\\d?\\w");
        verify_ok(&features, "\\d?\\w{1}");

        // POSIX character classes
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\p{Alpha}+\\p{Lower}*@",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\p{Upper}+\\p{Alpha}*@",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\p{Alnum}+\\d*@",
        );
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^\\p{Graph}+\\p{Punct}*@",
        );

        // the dot overlaps everything
        verify_violation(
            &features,
            RegexFeature::OverlappingQuantifiedTokens,
            "^.*A+.*AB",
        );
        verify_violation(&features, RegexFeature::OverlappingQuantifiedTokens, "^.*\\d+");
        verify_violation(&features, RegexFeature::OverlappingQuantifiedTokens, ".*.+");

        // single characters
        verify_violation(&features, RegexFeature::OverlappingQuantifiedTokens, "a*a+");
        verify_ok(&features, "a*b+");
        verify_ok(&features, "aaa+");
    }

    #[test]
    fn test_overlap_window_resets_at_boundaries() {
        let features = strict_complexity();

        // an alternation bar breaks adjacency
        verify_ok(&features, "\\d+|\\w+");
        // group boundaries break adjacency
        verify_ok(&features, "(\\d+)(\\w+)");
        verify_ok(&features, "a+(b)a+");
        // a bracketed class is not a tracked token and breaks adjacency
        verify_ok(&features, "\\d+[abc]\\w+");
        // but two tracked tokens inside one group still pair up
        verify_violation(&features, RegexFeature::OverlappingQuantifiedTokens, "(\\d+\\w+)");
    }

    #[test]
    fn test_overlap_offset_points_at_second_token() {
        let features = strict_complexity();
        features.set_ignored_overlapping_quantifiers(1);
        let error = compile("a+.*.*", &features).unwrap_err();
        assert_eq!(error.index(), 4);
    }

    #[test]
    fn test_not_allowed_nested_groups() {
        let features = strict_complexity();
        verify_violation(
            &features,
            RegexFeature::UnrestrictedNestedGroups,
            "a(b(c(d(e))))",
        );
        // the nesting violation fires before the unbalanced ')' is noticed
        verify_violation(
            &features,
            RegexFeature::UnrestrictedNestedGroups,
            "a(b(c(d(e)))",
        );
        let error = compile("a(b(c(d(e))))", &features).unwrap_err();
        assert_eq!(error.index(), 7);
    }

    #[test]
    fn test_allowed_nested_groups() {
        let features = strict_complexity();
        verify_ok(&features, "");
        verify_ok(&features, ".*");
        verify_ok(&features, "(a(b(c)))");
        verify_ok(&features, "a(b(c(d)))");
        verify_ok(&features, "the ((red|white) (king|queen))");
    }

    #[test]
    fn test_custom_nested_group_limit() {
        let features = strict_complexity();
        features.set_max_nested_groups(0);
        verify_ok(&features, "(a)");
        verify_violation(&features, RegexFeature::UnrestrictedNestedGroups, "((a))");
    }

    #[test]
    fn test_unrestricted_length() {
        let features = strict_complexity();
        let max_length = features.max_pattern_length() as usize;
        let at_limit = "x".repeat(max_length);

        verify_ok(&features, &at_limit);

        let over_limit = format!("{at_limit}x");
        verify_violation(&features, RegexFeature::UnrestrictedLength, &over_limit);
        let error = compile(&over_limit, &features).unwrap_err();
        assert_eq!(error.index(), max_length as i32);
    }

    #[test]
    fn test_custom_max_length() {
        let features = strict_complexity();
        features.set_max_pattern_length(1);
        verify_violation(&features, RegexFeature::UnrestrictedLength, "ab");
        verify_ok(&features, "a");
        let error = compile("ab", &features).unwrap_err();
        assert_eq!(error.index(), 1);
    }

    #[test]
    fn test_heuristics_are_independent() {
        let only_compound = FeatureSet::copy_of(FeatureSet::java_default());
        only_compound.set_enabled(RegexFeature::CompoundQuantifiers, false);
        only_compound.set_ignored_overlapping_quantifiers(0);
        verify_violation(&only_compound, RegexFeature::CompoundQuantifiers, "(a+)+");
        verify_ok(&only_compound, ".*.*.*");

        let only_overlap = FeatureSet::copy_of(FeatureSet::java_default());
        only_overlap.set_enabled(RegexFeature::OverlappingQuantifiedTokens, false);
        only_overlap.set_ignored_overlapping_quantifiers(0);
        verify_ok(&only_overlap, "(a+)+");
        verify_violation(&only_overlap, RegexFeature::OverlappingQuantifiedTokens, ".*.*");

        let only_nesting = FeatureSet::copy_of(FeatureSet::java_default());
        only_nesting.set_enabled(RegexFeature::UnrestrictedNestedGroups, false);
        verify_ok(&only_nesting, "(a+)+");
        verify_violation(&only_nesting, RegexFeature::UnrestrictedNestedGroups, "((((a))))");
    }

    #[test]
    fn test_ecma_script_profile_scenarios() {
        let ecma = FeatureSet::ecma_script_regexp();

        verify_violation(ecma, RegexFeature::NegativeLookbehind, "(?<!a)b");
        verify_violation(ecma, RegexFeature::PositiveLookbehind, "(?<=a)b");
        verify_violation(ecma, RegexFeature::CharacterClassIntersection, "[a-g&&[def]]");
        verify_violation(ecma, RegexFeature::UnicodeExpressions, "\\p{Lower}");
        verify_violation(ecma, RegexFeature::UnicodeExpressions, "\\p{javaLowerCase}");
        verify_violation(
            ecma,
            RegexFeature::NamedCapturingGroupsAndReferences,
            "(?<name>.*)\\k<name>",
        );
        verify_violation(ecma, RegexFeature::Backreferences, "(\\d\\d)\\1");
        verify_violation(ecma, RegexFeature::PossessiveQuantifiers, "'.*+'x");
        verify_violation(ecma, RegexFeature::PossessiveQuantifiers, "(?>'.*'x)");
        verify_violation(ecma, RegexFeature::OctalEscapeSequences, "\\011");
        verify_violation(ecma, RegexFeature::AlternativeBegin, "\\Atext");
        verify_violation(ecma, RegexFeature::AlternativeEnd, "text\\Z");
        verify_violation(ecma, RegexFeature::AnyUnicodeLinebreakSequence, "\\R");
        verify_violation(ecma, RegexFeature::EndOfPreviousMatch, "\\G");
        verify_violation(ecma, RegexFeature::HorizontalWhitespace, "\\h");
        verify_violation(ecma, RegexFeature::NonVerticalWhitespace, "\\V");
        verify_violation(ecma, RegexFeature::CharacterClassUnion, "[a-d[m-p]]");
        verify_violation(ecma, RegexFeature::InlinedMatchFlags, "(?i)abc");
        verify_violation(ecma, RegexFeature::QuotationSequence, "\\Q[name]\\E");

        // common syntax stays available
        verify_ok(ecma, "Jack(?=Sprat)Sprat");
        verify_ok(ecma, "\\d+(?!\\.)");
        verify_ok(ecma, "x{0}");
        verify_ok(ecma, "x{0,0}");
        verify_ok(ecma, "(?:x)y");
        verify_ok(ecma, "[^a-c]");
        verify_ok(ecma, "\\v");
        verify_ok(ecma, "a|b|$");
    }

    #[test]
    fn test_boost_xpressive_profile_scenarios() {
        let xpressive = FeatureSet::boost_xpressive();

        verify_violation(xpressive, RegexFeature::ExactZeroQuantifierWithZero, "x{0}");
        verify_violation(
            xpressive,
            RegexFeature::ExactZeroQuantifierWithZero,
            "x{0,0}",
        );
        verify_violation(xpressive, RegexFeature::NegativeLookbehind, "(?<!a)b");
        verify_violation(xpressive, RegexFeature::PossessiveQuantifiers, "'.++'x");

        verify_ok(xpressive, "x{0,1}");
        verify_ok(xpressive, "x{1}");
        verify_ok(xpressive, "(?=y)x");
    }

    #[test]
    fn test_java_default_profile_accepts_everything() {
        let java = FeatureSet::java_default();
        for pattern in [
            "(A+)*",
            ".*.*.*",
            "((((((a))))))",
            "'.*+'x",
            "(?>'.++'x)",
            "\\p{Lower}",
            "\\p{IsHiragana}",
            "\\p{javaWhitespace}",
            "[\\p{IsHiragana}\\p{blk=Mongolian}\\p{gc=Lu}]",
            "(\\d\\d)\\1",
            "(?<name>.*)\\k<name>",
            "\\011",
            "\\013",
            "\\0277",
            "\\Atext",
            "text\\z",
            "text\\Z",
            "\\G",
            "\\h",
            "\\H",
            "\\v",
            "\\V",
            "\\R",
            "(?<=a)b",
            "(?<!a)b",
            "(?i)abc",
            "(?m)(^line$\\n){2}",
            "[a-g&&[def]]",
            "[a-g&&def]",
            "[a-z&&[^bc]]",
            "[a-z&&[^m-p]]",
            "[a-d[m-p]]",
            "\\Q[name]\\E",
            "x{0}",
            "x{0,0}",
        ] {
            verify_ok(java, pattern);
        }
    }

    #[test]
    fn test_rendered_violation_message() {
        let features = strict_complexity();
        let error = compile("(a+)*", &features).unwrap_err();
        let expected = format!(
            "Unsupported feature, \"{}\" near index 4\n(a+)*\n    ^",
            RegexFeature::CompoundQuantifiers.description()
        );
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_violation_details_are_retrievable() {
        let error = compile("\\Q[name]\\E", FeatureSet::all_disabled()).unwrap_err();
        let CompileError::Feature(violation) = error else {
            panic!("expected a feature violation");
        };
        assert_eq!(violation.feature(), RegexFeature::QuotationSequence);
        assert_eq!(violation.pattern(), "\\Q[name]\\E");
        assert_eq!(violation.index(), 0);
    }

    #[test]
    fn test_trees_survive_policy_mutation() {
        // a finished tree is not retroactively affected by policy changes
        let policy = FeatureSet::copy_of(FeatureSet::java_default());
        let tree = compile("(a+)*", &policy).unwrap();
        policy.set_enabled(RegexFeature::CompoundQuantifiers, false);
        assert!(matches!(tree.node(tree.root()), Node::Quantified { .. }));
        assert_eq!(tree.pattern(), "(a+)*");
    }

    #[test]
    fn test_concurrent_compilation_against_shared_policy() {
        use std::sync::Arc;

        let policy = Arc::new(FeatureSet::copy_of(FeatureSet::java_default()));
        policy.set_enabled(RegexFeature::Backreferences, false);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let policy = Arc::clone(&policy);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    assert!(compile("(a|b)+c", &policy).is_ok());
                    assert!(compile("(a)\\1", &policy).is_err());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_number_parsing_reexports() {
        assert_eq!(parse_positive_int("42", 10), Some(42));
        assert!(parse_double("not a number").is_nan());
        assert!(parse_float("").is_nan());
    }
}
