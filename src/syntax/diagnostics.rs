//! Error values for failed compilations.
//!
//! Two kinds only: a [`FeatureViolation`] names the disabled feature a
//! pattern used, a [`SyntaxError`] reports a pattern that does not parse at
//! all. Both carry the full pattern text and the code-point index of the
//! offending construct and render a message with a caret pointing at it.

use std::fmt;

use crate::features::RegexFeature;

/// Index value meaning "position unknown".
pub const UNKNOWN_INDEX: i32 = -1;

/// A regular expression used a feature that is disabled in the active
/// [`FeatureSet`](crate::FeatureSet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureViolation {
    feature: RegexFeature,
    pattern: String,
    index: i32,
}

impl FeatureViolation {
    pub(crate) fn new(feature: RegexFeature, pattern: &str, index: i32) -> Self {
        FeatureViolation {
            feature,
            pattern: pattern.to_string(),
            index,
        }
    }

    /// The found but disabled feature.
    pub fn feature(&self) -> RegexFeature {
        self.feature
    }

    /// The erroneous pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The approximate code-point index of the error within the pattern, or
    /// [`UNKNOWN_INDEX`] if the index is not known.
    pub fn index(&self) -> i32 {
        self.index
    }
}

impl fmt::Display for FeatureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported feature, \"{}\" near index {}",
            self.feature.description(),
            self.index
        )?;
        write_pattern_with_caret(f, &self.pattern, self.index)
    }
}

impl std::error::Error for FeatureViolation {}

/// A pattern that does not parse under the base grammar, independent of any
/// policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    description: String,
    pattern: String,
    index: i32,
}

impl SyntaxError {
    pub(crate) fn new(description: impl Into<String>, pattern: &str, index: i32) -> Self {
        SyntaxError {
            description: description.into(),
            pattern: pattern.to_string(),
            index,
        }
    }

    /// A description of the error.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The erroneous pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The approximate code-point index of the error within the pattern, or
    /// [`UNKNOWN_INDEX`] if the index is not known.
    pub fn index(&self) -> i32 {
        self.index
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index >= 0 {
            write!(f, "{} near index {}", self.description, self.index)?;
        } else {
            write!(f, "{}", self.description)?;
        }
        write_pattern_with_caret(f, &self.pattern, self.index)
    }
}

impl std::error::Error for SyntaxError {}

/// Why a compilation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A disabled feature was used.
    Feature(FeatureViolation),
    /// The pattern does not parse at all.
    Syntax(SyntaxError),
}

impl CompileError {
    /// The erroneous pattern.
    pub fn pattern(&self) -> &str {
        match self {
            CompileError::Feature(violation) => violation.pattern(),
            CompileError::Syntax(error) => error.pattern(),
        }
    }

    /// The code-point index of the error, or [`UNKNOWN_INDEX`].
    pub fn index(&self) -> i32 {
        match self {
            CompileError::Feature(violation) => violation.index(),
            CompileError::Syntax(error) => error.index(),
        }
    }

    /// The violated feature, if this is a feature violation.
    pub fn feature(&self) -> Option<RegexFeature> {
        match self {
            CompileError::Feature(violation) => Some(violation.feature()),
            CompileError::Syntax(_) => None,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Feature(violation) => violation.fmt(f),
            CompileError::Syntax(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Feature(violation) => Some(violation),
            CompileError::Syntax(error) => Some(error),
        }
    }
}

impl From<FeatureViolation> for CompileError {
    fn from(violation: FeatureViolation) -> Self {
        CompileError::Feature(violation)
    }
}

impl From<SyntaxError> for CompileError {
    fn from(error: SyntaxError) -> Self {
        CompileError::Syntax(error)
    }
}

/// Appends the pattern and a line with a caret marking the error column.
/// Nothing is appended when the index is unknown; the message stays a
/// single line.
fn write_pattern_with_caret(f: &mut fmt::Formatter<'_>, pattern: &str, index: i32) -> fmt::Result {
    if index < 0 {
        return Ok(());
    }
    write!(f, "\n{pattern}\n")?;
    for _ in 0..index {
        write!(f, " ")?;
    }
    write!(f, "^")
}
