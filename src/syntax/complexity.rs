//! Static heuristics for catastrophic backtracking hazards.
//!
//! The parser consults two pieces of state from this module while it runs:
//! a rolling [`OverlapWindow`] that watches directly concatenated quantified
//! single-character tokens, and the [`TokenSet`] model used to decide
//! whether two such tokens are provably disjoint. Overlap is only detected
//! for selected tokens - `.`, the predefined classes, the POSIX classes
//! (US-ASCII) and single characters - because it is impossible to do it for
//! arbitrary tokens in a generic way.

use super::{PosixClass, PredefClass};

/// Everything a token may match outside the ASCII range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonAsciiTail {
    /// Nothing above `\x7F`.
    None,
    /// Exactly one character above `\x7F`.
    Char(char),
    /// An unbounded set above `\x7F`.
    Any,
}

/// Approximate character set of a single-character token: a bitmap over the
/// 128 ASCII code points plus a coarse non-ASCII tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenSet {
    ascii: u128,
    tail: NonAsciiTail,
}

const ASCII_ALL: u128 = u128::MAX;

fn bit(c: char) -> u128 {
    1u128 << (c as u32)
}

fn range_bits(lo: char, hi: char) -> u128 {
    let mut bits = 0u128;
    let mut code = lo as u32;
    while code <= hi as u32 {
        bits |= 1u128 << code;
        code += 1;
    }
    bits
}

fn char_bits(chars: &str) -> u128 {
    chars.chars().map(bit).sum()
}

fn digit_bits() -> u128 {
    range_bits('0', '9')
}

fn word_bits() -> u128 {
    digit_bits() | range_bits('a', 'z') | range_bits('A', 'Z') | bit('_')
}

fn space_bits() -> u128 {
    char_bits(" \t\n\x0B\x0C\r")
}

fn punct_bits() -> u128 {
    char_bits("!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~")
}

impl TokenSet {
    /// The set of a literal character token.
    pub(crate) fn literal(c: char) -> TokenSet {
        if c.is_ascii() {
            TokenSet {
                ascii: bit(c),
                tail: NonAsciiTail::None,
            }
        } else {
            TokenSet {
                ascii: 0,
                tail: NonAsciiTail::Char(c),
            }
        }
    }

    /// The set of `.` - everything but line terminators, which is enough to
    /// overlap every other token.
    pub(crate) fn dot() -> TokenSet {
        TokenSet {
            ascii: ASCII_ALL & !bit('\n') & !bit('\r'),
            tail: NonAsciiTail::Any,
        }
    }

    /// The set of a predefined class token.
    pub(crate) fn predefined(class: PredefClass) -> TokenSet {
        let (ascii, tail) = match class {
            PredefClass::Digit => (digit_bits(), NonAsciiTail::None),
            PredefClass::NonDigit => (ASCII_ALL & !digit_bits(), NonAsciiTail::Any),
            PredefClass::Word => (word_bits(), NonAsciiTail::None),
            PredefClass::NonWord => (ASCII_ALL & !word_bits(), NonAsciiTail::Any),
            PredefClass::Space => (space_bits(), NonAsciiTail::None),
            PredefClass::NonSpace => (ASCII_ALL & !space_bits(), NonAsciiTail::Any),
            PredefClass::HorizontalSpace => (char_bits(" \t"), NonAsciiTail::Any),
            PredefClass::NonHorizontalSpace => {
                (ASCII_ALL & !char_bits(" \t"), NonAsciiTail::Any)
            }
            PredefClass::VerticalSpace => (char_bits("\n\x0B\x0C\r"), NonAsciiTail::Any),
            PredefClass::NonVerticalSpace => {
                (ASCII_ALL & !char_bits("\n\x0B\x0C\r"), NonAsciiTail::Any)
            }
        };
        TokenSet { ascii, tail }
    }

    /// The set of a POSIX class token (US-ASCII only).
    pub(crate) fn posix(class: PosixClass) -> TokenSet {
        let ascii = match class {
            PosixClass::Lower => range_bits('a', 'z'),
            PosixClass::Upper => range_bits('A', 'Z'),
            PosixClass::Ascii => ASCII_ALL,
            PosixClass::Alpha => range_bits('a', 'z') | range_bits('A', 'Z'),
            PosixClass::Digit => digit_bits(),
            PosixClass::Alnum => range_bits('a', 'z') | range_bits('A', 'Z') | digit_bits(),
            PosixClass::Punct => punct_bits(),
            PosixClass::Graph => {
                range_bits('a', 'z') | range_bits('A', 'Z') | digit_bits() | punct_bits()
            }
            PosixClass::Print => {
                range_bits('a', 'z')
                    | range_bits('A', 'Z')
                    | digit_bits()
                    | punct_bits()
                    | bit(' ')
            }
            PosixClass::Blank => char_bits(" \t"),
            PosixClass::Cntrl => range_bits('\x00', '\x1F') | bit('\x7F'),
            PosixClass::XDigit => digit_bits() | range_bits('a', 'f') | range_bits('A', 'F'),
            PosixClass::Space => space_bits(),
        };
        TokenSet {
            ascii,
            tail: NonAsciiTail::None,
        }
    }

    /// Whether the two sets are not provably disjoint.
    pub(crate) fn overlaps(self, other: TokenSet) -> bool {
        if self.ascii & other.ascii != 0 {
            return true;
        }
        match (self.tail, other.tail) {
            (NonAsciiTail::Any, NonAsciiTail::Any) => true,
            (NonAsciiTail::Any, NonAsciiTail::Char(_)) => true,
            (NonAsciiTail::Char(_), NonAsciiTail::Any) => true,
            (NonAsciiTail::Char(a), NonAsciiTail::Char(b)) => a == b,
            _ => false,
        }
    }
}

/// A single-character token the overlap window tracks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrackedToken {
    /// Approximate character set of the token.
    pub set: TokenSet,
    /// Code-point offset where the token begins.
    pub start: usize,
    /// Whether the token carries an explicit quantifier.
    pub quantified: bool,
    /// Whether the quantifier allows more than one repetition.
    pub repeats: bool,
}

/// Rolling adjacency state over directly concatenated tracked tokens.
///
/// Two adjacent tokens form an overlap occurrence when both are quantified,
/// at least one allows more than one repetition, and their sets overlap.
/// The first `ignored` occurrences per pattern are tolerated; any further
/// one is reported.
#[derive(Debug, Default)]
pub(crate) struct OverlapWindow {
    previous: Option<TrackedToken>,
    occurrences: u32,
}

impl OverlapWindow {
    pub(crate) fn new() -> OverlapWindow {
        OverlapWindow::default()
    }

    /// Clears the adjacency window. Called for any construct that is not a
    /// tracked token (groups, alternation bars, anchors, bracket classes).
    /// The occurrence count is per pattern and survives the reset.
    pub(crate) fn reset(&mut self) {
        self.previous = None;
    }

    /// Observes the next directly concatenated tracked token. Returns the
    /// offset of the token that exhausted the budget, if any.
    pub(crate) fn observe(&mut self, token: TrackedToken, ignored: u32) -> Option<usize> {
        let mut exceeded = None;
        if let Some(previous) = self.previous {
            if previous.quantified
                && token.quantified
                && (previous.repeats || token.repeats)
                && previous.set.overlaps(token.set)
            {
                self.occurrences += 1;
                if self.occurrences > ignored {
                    exceeded = Some(token.start);
                }
            }
        }
        self.previous = Some(token);
        exceeded
    }
}
