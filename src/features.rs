//! Feature catalog and policy for regular expression compilation.
//!
//! [`RegexFeature`] enumerates every optional syntax construct and every
//! complexity heuristic the compiler knows about. [`FeatureSet`] maps each
//! catalog entry to enabled/disabled and carries the numeric limits the
//! complexity heuristics enforce. Four named profiles are built once and
//! shared process-wide.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::LazyLock;

/// Selected regular expression syntax features and complexity heuristics.
///
/// Syntax features gate optional constructs; complexity heuristics gate
/// pattern shapes that are prone to catastrophic backtracking. Constructs
/// not listed here (plain literals, basic quantifiers, basic character
/// classes, capturing and non-capturing groups, alternation, anchors,
/// lookahead) are always legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegexFeature {
    /// Possessive quantifiers (`*+`, `++`, `?+`) and independent,
    /// non-capturing groups (`(?>X)`).
    PossessiveQuantifiers,
    /// Unicode scripts, blocks, categories and binary properties with
    /// `\p` and `\P`, including the POSIX and java* character classes.
    UnicodeExpressions,
    /// Back references to capturing groups (e.g. `\1`, `\2`).
    Backreferences,
    /// Escaped characters with octal values (`\0n`, `\0nn`, `\0mnn`).
    OctalEscapeSequences,
    /// `\A`, the beginning of the input; an alternative to `^`.
    AlternativeBegin,
    /// `\z` and `\Z`, the end of the input and the end of the input but
    /// for the final terminator, if any. Both are alternatives to `$`.
    AlternativeEnd,
    /// `\G`, end of previous match; a special kind of back reference.
    EndOfPreviousMatch,
    /// `\h` and `\H`, horizontal whitespace and non horizontal whitespace.
    HorizontalWhitespace,
    /// `\R`, any Unicode linebreak sequence.
    AnyUnicodeLinebreakSequence,
    /// `\V`, a non vertical whitespace.
    NonVerticalWhitespace,
    /// Named capturing groups (`(?<name>X)`) and references (`\k<name>`).
    NamedCapturingGroupsAndReferences,
    /// `(?<=X)`, zero-width positive lookbehind.
    PositiveLookbehind,
    /// `(?<!X)`, zero-width negative lookbehind.
    NegativeLookbehind,
    /// `(?xxx:)` and `(?xxx)`, inlined match flags (e.g. `(?i)`).
    InlinedMatchFlags,
    /// Intersection within character classes (e.g. `[a-z&&[aeiou]]`).
    CharacterClassIntersection,
    /// Nested character classes forming a union (e.g. `[a-d[m-p]]`).
    CharacterClassUnion,
    /// Quotation sequences (`\Q...\E`).
    QuotationSequence,
    /// Exact quantifiers with zeros only (e.g. `x{0,0}` or `x{0}`).
    ExactZeroQuantifierWithZero,
    /// A quantifier compounds a quantifier, which can lead to an explosion
    /// of matching time, especially with long strings that do not match.
    CompoundQuantifiers,
    /// Contiguous not mutually exclusive quantified tokens. The number of
    /// tolerated occurrences per pattern is configurable through
    /// [`FeatureSet::set_ignored_overlapping_quantifiers`].
    OverlappingQuantifiedTokens,
    /// When disabled, a maximum number of levels of nested groups is
    /// enforced, configurable through [`FeatureSet::set_max_nested_groups`].
    UnrestrictedNestedGroups,
    /// When disabled, a maximum pattern length is enforced, configurable
    /// through [`FeatureSet::set_max_pattern_length`].
    UnrestrictedLength,
}

impl RegexFeature {
    /// Number of catalog entries.
    pub const COUNT: usize = 22;

    /// Every catalog entry, in declaration order.
    pub const ALL: [RegexFeature; RegexFeature::COUNT] = [
        RegexFeature::PossessiveQuantifiers,
        RegexFeature::UnicodeExpressions,
        RegexFeature::Backreferences,
        RegexFeature::OctalEscapeSequences,
        RegexFeature::AlternativeBegin,
        RegexFeature::AlternativeEnd,
        RegexFeature::EndOfPreviousMatch,
        RegexFeature::HorizontalWhitespace,
        RegexFeature::AnyUnicodeLinebreakSequence,
        RegexFeature::NonVerticalWhitespace,
        RegexFeature::NamedCapturingGroupsAndReferences,
        RegexFeature::PositiveLookbehind,
        RegexFeature::NegativeLookbehind,
        RegexFeature::InlinedMatchFlags,
        RegexFeature::CharacterClassIntersection,
        RegexFeature::CharacterClassUnion,
        RegexFeature::QuotationSequence,
        RegexFeature::ExactZeroQuantifierWithZero,
        RegexFeature::CompoundQuantifiers,
        RegexFeature::OverlappingQuantifiedTokens,
        RegexFeature::UnrestrictedNestedGroups,
        RegexFeature::UnrestrictedLength,
    ];

    /// A textual description of the feature, in English.
    pub fn description(self) -> &'static str {
        match self {
            RegexFeature::PossessiveQuantifiers => {
                "Possessive quantifiers (*+, ++, ?+) and independent, non-capturing groups (?>X)"
            }
            RegexFeature::UnicodeExpressions => {
                r"Unicode scripts, blocks, categories and binary properties with \p and \P"
            }
            RegexFeature::Backreferences => r"Back references (e.g. \1, \2)",
            RegexFeature::OctalEscapeSequences => r"Octal escape sequences (e.g. \01)",
            RegexFeature::AlternativeBegin => r"\A, the beginning of the input",
            RegexFeature::AlternativeEnd => {
                r"\z and \Z, the end of the input and the end of the input but for the final terminator, if any"
            }
            RegexFeature::EndOfPreviousMatch => r"\G, end of previous match",
            RegexFeature::HorizontalWhitespace => r"\h and \H, horizontal whitespace",
            RegexFeature::AnyUnicodeLinebreakSequence => r"\R, any Unicode linebreak sequence",
            RegexFeature::NonVerticalWhitespace => r"\V, a non vertical whitespace",
            RegexFeature::NamedCapturingGroupsAndReferences => {
                "Named capturing groups and references"
            }
            RegexFeature::PositiveLookbehind => "(?<=X), zero-width positive lookbehind",
            RegexFeature::NegativeLookbehind => "(?<!X), zero-width negative lookbehind",
            RegexFeature::InlinedMatchFlags => "(?xxx:), inlined match flags",
            RegexFeature::CharacterClassIntersection => {
                "Character class intersection (e.g. [a-z&&[aeiou]])"
            }
            RegexFeature::CharacterClassUnion => "Character class union (e.g. [a-d[m-p]])",
            RegexFeature::QuotationSequence => r"Quotation sequences (\Q...\E)",
            RegexFeature::ExactZeroQuantifierWithZero => {
                "Exact quantifiers with zeros only (e.g. {0,0} x{0})"
            }
            RegexFeature::CompoundQuantifiers => "A quantifier compounds a quantifier",
            RegexFeature::OverlappingQuantifiedTokens => {
                "Contiguous not mutually exclusive quantified tokens"
            }
            RegexFeature::UnrestrictedNestedGroups => "Unrestricted levels of nested groups",
            RegexFeature::UnrestrictedLength => "Unrestricted length of regular expression",
        }
    }

    /// Whether this entry is a complexity heuristic rather than a
    /// syntax-availability feature.
    pub fn is_complexity(self) -> bool {
        matches!(
            self,
            RegexFeature::CompoundQuantifiers
                | RegexFeature::OverlappingQuantifiedTokens
                | RegexFeature::UnrestrictedNestedGroups
                | RegexFeature::UnrestrictedLength
        )
    }
}

const DEFAULT_MAX_NESTED_GROUPS: u32 = 2;
const DEFAULT_MAX_PATTERN_LENGTH: u32 = 10_000;
const DEFAULT_IGNORED_OVERLAPPING_QUANTIFIERS: u32 = 1;

/// A set of enabled regular expression features plus the numeric limits
/// used by the complexity heuristics.
///
/// A `FeatureSet` is safe for multi-threaded use: every feature flag is an
/// independent atomic, as are the three limits. Reads never observe a
/// partially updated entry; concurrent writes to the same entry are
/// last-write-wins. Policies are expected to be configured before use, not
/// mutated mid-compile.
pub struct FeatureSet {
    features: [AtomicBool; RegexFeature::COUNT],
    max_nested_groups: AtomicU32,
    max_pattern_length: AtomicU32,
    ignored_overlapping_quantifiers: AtomicU32,
}

impl FeatureSet {
    /// Constructs a `FeatureSet` with every known feature enabled.
    pub fn new() -> Self {
        FeatureSet {
            features: [const { AtomicBool::new(true) }; RegexFeature::COUNT],
            max_nested_groups: AtomicU32::new(DEFAULT_MAX_NESTED_GROUPS),
            max_pattern_length: AtomicU32::new(DEFAULT_MAX_PATTERN_LENGTH),
            ignored_overlapping_quantifiers: AtomicU32::new(
                DEFAULT_IGNORED_OVERLAPPING_QUANTIFIERS,
            ),
        }
    }

    /// Builds an independent `FeatureSet` with every feature flag copied
    /// from `other`. The numeric limits are not copied; they reset to their
    /// defaults.
    pub fn copy_of(other: &FeatureSet) -> Self {
        let set = FeatureSet::new();
        for feature in RegexFeature::ALL {
            set.set_enabled(feature, other.is_enabled(feature));
        }
        set
    }

    /// Checks whether a given `feature` is enabled.
    pub fn is_enabled(&self, feature: RegexFeature) -> bool {
        self.features[feature as usize].load(Ordering::Relaxed)
    }

    /// Enables or disables a given `feature`.
    pub fn set_enabled(&self, feature: RegexFeature, enabled: bool) {
        self.features[feature as usize].store(enabled, Ordering::Relaxed);
    }

    /// The maximum number of allowed levels of nested groups, enforced only
    /// while [`RegexFeature::UnrestrictedNestedGroups`] is disabled.
    /// Default is 2.
    pub fn max_nested_groups(&self) -> u32 {
        self.max_nested_groups.load(Ordering::Relaxed)
    }

    /// Sets the maximum number of allowed levels of nested groups.
    pub fn set_max_nested_groups(&self, max_nested_groups: u32) {
        self.max_nested_groups
            .store(max_nested_groups, Ordering::Relaxed);
    }

    /// The maximum pattern length in code points, enforced only while
    /// [`RegexFeature::UnrestrictedLength`] is disabled. Default is 10 000.
    pub fn max_pattern_length(&self) -> u32 {
        self.max_pattern_length.load(Ordering::Relaxed)
    }

    /// Sets the maximum pattern length in code points.
    pub fn set_max_pattern_length(&self, max_pattern_length: u32) {
        self.max_pattern_length
            .store(max_pattern_length, Ordering::Relaxed);
    }

    /// The number of overlapping quantified token occurrences tolerated per
    /// pattern, relevant only while
    /// [`RegexFeature::OverlappingQuantifiedTokens`] is disabled.
    /// Default is 1.
    pub fn ignored_overlapping_quantifiers(&self) -> u32 {
        self.ignored_overlapping_quantifiers.load(Ordering::Relaxed)
    }

    /// Sets the number of tolerated overlapping quantified token occurrences.
    pub fn set_ignored_overlapping_quantifiers(&self, ignored: u32) {
        self.ignored_overlapping_quantifiers
            .store(ignored, Ordering::Relaxed);
    }

    /// All features which are supported by default in Java regular
    /// expressions. The permissive baseline: everything enabled.
    pub fn java_default() -> &'static FeatureSet {
        &JAVA_DEFAULT
    }

    /// Every optional feature disabled, including the complexity heuristics.
    pub fn all_disabled() -> &'static FeatureSet {
        &ALL_DISABLED
    }

    /// Only features which are also supported in regular expressions within
    /// ECMA script / JavaScript.
    pub fn ecma_script_regexp() -> &'static FeatureSet {
        &ECMA_SCRIPT_REGEXP
    }

    /// Only features which are also supported in regular expressions
    /// interpreted by the BOOST Xpressive library.
    pub fn boost_xpressive() -> &'static FeatureSet {
        &BOOST_XPRESSIVE
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        FeatureSet::new()
    }
}

impl std::fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let disabled: Vec<RegexFeature> = RegexFeature::ALL
            .into_iter()
            .filter(|&feature| !self.is_enabled(feature))
            .collect();
        f.debug_struct("FeatureSet")
            .field("disabled", &disabled)
            .field("max_nested_groups", &self.max_nested_groups())
            .field("max_pattern_length", &self.max_pattern_length())
            .field(
                "ignored_overlapping_quantifiers",
                &self.ignored_overlapping_quantifiers(),
            )
            .finish()
    }
}

static JAVA_DEFAULT: LazyLock<FeatureSet> = LazyLock::new(FeatureSet::new);

static ALL_DISABLED: LazyLock<FeatureSet> = LazyLock::new(|| {
    let set = FeatureSet::new();
    for feature in RegexFeature::ALL {
        set.set_enabled(feature, false);
    }
    set
});

static ECMA_SCRIPT_REGEXP: LazyLock<FeatureSet> = LazyLock::new(|| {
    let set = FeatureSet::new();
    for feature in [
        RegexFeature::PossessiveQuantifiers,
        RegexFeature::UnicodeExpressions,
        RegexFeature::Backreferences,
        RegexFeature::OctalEscapeSequences,
        RegexFeature::AlternativeBegin,
        RegexFeature::AlternativeEnd,
        RegexFeature::EndOfPreviousMatch,
        RegexFeature::HorizontalWhitespace,
        RegexFeature::AnyUnicodeLinebreakSequence,
        RegexFeature::NonVerticalWhitespace,
        RegexFeature::NamedCapturingGroupsAndReferences,
        RegexFeature::InlinedMatchFlags,
        RegexFeature::CharacterClassIntersection,
        RegexFeature::CharacterClassUnion,
        RegexFeature::QuotationSequence,
        // Lookbehind appears to work in practice, but the documentation
        // does not list it; we follow the documentation and disable it.
        RegexFeature::PositiveLookbehind,
        RegexFeature::NegativeLookbehind,
    ] {
        set.set_enabled(feature, false);
    }
    set
});

static BOOST_XPRESSIVE: LazyLock<FeatureSet> = LazyLock::new(|| {
    let set = FeatureSet::copy_of(FeatureSet::ecma_script_regexp());
    set.set_enabled(RegexFeature::ExactZeroQuantifierWithZero, false);
    set
});
