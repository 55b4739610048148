//! Recursive-descent compiler for feature-gated regular expressions.
//!
//! The parser walks the pattern once, left to right, over code points. At
//! every construct it recognizes it consults the active
//! [`FeatureSet`](crate::FeatureSet) before emitting a node; the first
//! disallowed construct aborts compilation with a diagnostic carrying the
//! offset where the construct began. The complexity heuristics run in the
//! same pass: nesting depth is checked when a group opens, compound
//! quantifiers when a quantifier closes over a group, and overlapping
//! quantified tokens through a rolling window over adjacent pieces.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::complexity::{OverlapWindow, TokenSet, TrackedToken};
use super::diagnostics::{CompileError, FeatureViolation, SyntaxError};
use super::{
    AnchorKind, BoundaryKind, CharClass, ClassItem, FlagChange, GroupKind, MatchFlags, Node,
    NodeId, PosixClass, PredefClass, PropertyClass, QuantMode, SyntaxTree,
};
use crate::features::{FeatureSet, RegexFeature};
use crate::numbers;

type Result<T> = std::result::Result<T, CompileError>;

/// Compiles `pattern` under the given feature set.
///
/// On success the returned [`SyntaxTree`] is immutable and ready for a
/// downstream match engine. On failure the first offending construct is
/// reported, either as a [`FeatureViolation`] naming the disabled feature
/// or as a [`SyntaxError`]; compilation is all-or-nothing and fail-fast.
pub fn compile(pattern: &str, features: &FeatureSet) -> Result<SyntaxTree> {
    if !features.is_enabled(RegexFeature::UnrestrictedLength) {
        let max = features.max_pattern_length() as usize;
        if pattern.chars().count() > max {
            return Err(CompileError::Feature(FeatureViolation::new(
                RegexFeature::UnrestrictedLength,
                pattern,
                max as i32,
            )));
        }
    }

    let mut parser = Parser::new(pattern, features);
    let root = parser.parse_alternation()?;
    if parser.pos < parser.chars.len() {
        // parse_alternation only ever stops early at a ')'
        return Err(parser.syntax_error("Unmatched closing ')'", parser.pos));
    }
    Ok(SyntaxTree::new(
        pattern,
        parser.nodes,
        root,
        parser.capture_count,
    ))
}

struct Quantifier {
    min: i32,
    max: Option<i32>,
    mode: QuantMode,
}

enum GroupShape {
    Plain(GroupKind),
    Look { behind: bool, negative: bool },
}

enum FlagGroup {
    Toggle(FlagChange),
    Scope(FlagChange),
}

enum ClassEscape {
    Char(char),
    Item(ClassItem),
}

struct Parser<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
    features: &'a FeatureSet,
    nodes: Vec<Node>,
    /// Per-node flag: subtree contains a non-possessive quantifier allowing
    /// more than one repetition, not shielded by an atomic group.
    hazards: Vec<bool>,
    group_depth: u32,
    atomic_depth: u32,
    capture_count: u32,
    group_names: FxHashMap<String, u32>,
    overlap: OverlapWindow,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str, features: &'a FeatureSet) -> Self {
        Parser {
            pattern,
            chars: pattern.chars().collect(),
            pos: 0,
            features,
            nodes: Vec::new(),
            hazards: Vec::new(),
            group_depth: 0,
            atomic_depth: 0,
            capture_count: 0,
            group_names: FxHashMap::default(),
            overlap: OverlapWindow::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, wanted: char) -> bool {
        if self.peek() == Some(wanted) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn push(&mut self, node: Node, hazard: bool) -> NodeId {
        self.nodes.push(node);
        self.hazards.push(hazard);
        NodeId::new(self.nodes.len() - 1)
    }

    fn hazard(&self, id: NodeId) -> bool {
        self.hazards[id.index()]
    }

    fn syntax_error(&self, description: impl Into<String>, index: usize) -> CompileError {
        CompileError::Syntax(SyntaxError::new(description, self.pattern, index as i32))
    }

    fn violation(&self, feature: RegexFeature, index: usize) -> CompileError {
        CompileError::Feature(FeatureViolation::new(feature, self.pattern, index as i32))
    }

    /// Aborts with a violation when `feature` is disabled; `index` is the
    /// offset where the construct began.
    fn gate(&self, feature: RegexFeature, index: usize) -> Result<()> {
        if self.features.is_enabled(feature) {
            Ok(())
        } else {
            Err(self.violation(feature, index))
        }
    }

    fn parse_alternation(&mut self) -> Result<NodeId> {
        let mut branches: SmallVec<[NodeId; 2]> = SmallVec::new();
        loop {
            branches.push(self.parse_branch()?);
            if self.eat('|') {
                self.overlap.reset();
                continue;
            }
            break;
        }
        if branches.len() == 1 {
            return Ok(branches[0]);
        }
        let hazard = branches.iter().any(|&id| self.hazard(id));
        Ok(self.push(Node::Alternation(branches), hazard))
    }

    fn parse_branch(&mut self) -> Result<NodeId> {
        let mut parts: SmallVec<[NodeId; 4]> = SmallVec::new();
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                Some(_) => parts.push(self.parse_piece()?),
            }
        }
        match parts.len() {
            0 => Ok(self.push(Node::Empty, false)),
            1 => Ok(parts[0]),
            _ => {
                let hazard = parts.iter().any(|&id| self.hazard(id));
                Ok(self.push(Node::Concat(parts), hazard))
            }
        }
    }

    fn parse_piece(&mut self) -> Result<NodeId> {
        let atom_start = self.pos;
        let (atom, token_set) = self.parse_atom()?;
        let quant_start = self.pos;

        let Some(quant) = self.parse_quantifier()? else {
            self.observe_token(token_set, atom_start, false, false)?;
            return Ok(atom);
        };

        let repeats = quant.max.map_or(true, |max| max > 1);

        // A quantifier compounding another quantifier risks exponential
        // backtracking. Possessive quantifiers and atomic groups cut the
        // backtracking and are exempt, as is everything inside an
        // independent group.
        if quant.mode != QuantMode::Possessive
            && repeats
            && self.atomic_depth == 0
            && !self.features.is_enabled(RegexFeature::CompoundQuantifiers)
            && self.is_hazardous_group(atom)
        {
            return Err(self.violation(RegexFeature::CompoundQuantifiers, quant_start));
        }

        let hazard = quant.mode != QuantMode::Possessive && (repeats || self.hazard(atom));
        let id = self.push(
            Node::Quantified {
                child: atom,
                min: quant.min,
                max: quant.max,
                mode: quant.mode,
            },
            hazard,
        );
        self.observe_token(token_set, atom_start, true, repeats)?;
        Ok(id)
    }

    fn is_hazardous_group(&self, id: NodeId) -> bool {
        matches!(
            self.nodes[id.index()],
            Node::Group {
                kind: GroupKind::Capturing { .. }
                    | GroupKind::NonCapturing
                    | GroupKind::FlagScope(_),
                ..
            }
        ) && self.hazard(id)
    }

    /// Feeds the overlap window. Tracked single-character tokens extend the
    /// adjacency window; everything else clears it.
    fn observe_token(
        &mut self,
        set: Option<TokenSet>,
        start: usize,
        quantified: bool,
        repeats: bool,
    ) -> Result<()> {
        let Some(set) = set else {
            self.overlap.reset();
            return Ok(());
        };
        let ignored = self.features.ignored_overlapping_quantifiers();
        let token = TrackedToken {
            set,
            start,
            quantified,
            repeats,
        };
        if let Some(offset) = self.overlap.observe(token, ignored) {
            if !self
                .features
                .is_enabled(RegexFeature::OverlappingQuantifiedTokens)
            {
                return Err(self.violation(RegexFeature::OverlappingQuantifiedTokens, offset));
            }
        }
        Ok(())
    }

    fn parse_atom(&mut self) -> Result<(NodeId, Option<TokenSet>)> {
        let start = self.pos;
        let Some(c) = self.next() else {
            return Err(self.syntax_error("Unexpected end of pattern", start));
        };
        match c {
            '(' => Ok((self.parse_group(start)?, None)),
            '[' => {
                let class = self.parse_class()?;
                Ok((self.push(Node::Class(class), false), None))
            }
            '.' => Ok((self.push(Node::Dot, false), Some(TokenSet::dot()))),
            '^' => Ok((self.push(Node::Anchor(AnchorKind::LineStart), false), None)),
            '$' => Ok((self.push(Node::Anchor(AnchorKind::LineEnd), false), None)),
            '\\' => self.parse_escape(start),
            '*' | '+' | '?' => {
                Err(self.syntax_error(format!("Dangling meta character '{c}'"), start))
            }
            '{' => Err(self.syntax_error("Illegal repetition", start)),
            other => Ok((
                self.push(Node::Literal(other), false),
                Some(TokenSet::literal(other)),
            )),
        }
    }

    fn parse_quantifier(&mut self) -> Result<Option<Quantifier>> {
        let start = self.pos;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.bump();
                (0, None)
            }
            Some('+') => {
                self.bump();
                (1, None)
            }
            Some('?') => {
                self.bump();
                (0, Some(1))
            }
            Some('{') => {
                self.bump();
                self.parse_repetition_bounds(start)?
            }
            _ => return Ok(None),
        };

        if max == Some(0) {
            self.gate(RegexFeature::ExactZeroQuantifierWithZero, start)?;
        }

        let mode = match self.peek() {
            Some('?') => {
                self.bump();
                QuantMode::Lazy
            }
            Some('+') => {
                self.bump();
                self.gate(RegexFeature::PossessiveQuantifiers, start)?;
                QuantMode::Possessive
            }
            _ => QuantMode::Greedy,
        };
        Ok(Some(Quantifier { min, max, mode }))
    }

    fn parse_repetition_bounds(&mut self, start: usize) -> Result<(i32, Option<i32>)> {
        let min_digits = self.take_ascii_digits();
        if min_digits.is_empty() {
            return Err(self.syntax_error("Illegal repetition", start));
        }
        let Some(min) = numbers::parse_positive_int(&min_digits, 10) else {
            return Err(self.syntax_error("Illegal repetition range", start));
        };
        match self.next() {
            Some('}') => Ok((min, Some(min))),
            Some(',') => {
                let max_digits = self.take_ascii_digits();
                match self.next() {
                    Some('}') => {
                        if max_digits.is_empty() {
                            return Ok((min, None));
                        }
                        let Some(max) = numbers::parse_positive_int(&max_digits, 10) else {
                            return Err(self.syntax_error("Illegal repetition range", start));
                        };
                        if max < min {
                            return Err(self.syntax_error("Illegal repetition range", start));
                        }
                        Ok((min, Some(max)))
                    }
                    _ => Err(self.syntax_error("Unclosed counted closure", start)),
                }
            }
            _ => Err(self.syntax_error("Unclosed counted closure", start)),
        }
    }

    fn take_ascii_digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.bump();
        }
        digits
    }

    fn parse_group(&mut self, start: usize) -> Result<NodeId> {
        self.overlap.reset();
        self.group_depth += 1;
        if !self
            .features
            .is_enabled(RegexFeature::UnrestrictedNestedGroups)
            && self.group_depth > self.features.max_nested_groups() + 1
        {
            return Err(self.violation(RegexFeature::UnrestrictedNestedGroups, start));
        }
        let depth = self.group_depth;

        let shape = if self.eat('?') {
            match self.peek() {
                Some(':') => {
                    self.bump();
                    GroupShape::Plain(GroupKind::NonCapturing)
                }
                Some('>') => {
                    self.bump();
                    self.gate(RegexFeature::PossessiveQuantifiers, start)?;
                    GroupShape::Plain(GroupKind::Atomic)
                }
                Some('=') => {
                    self.bump();
                    GroupShape::Look {
                        behind: false,
                        negative: false,
                    }
                }
                Some('!') => {
                    self.bump();
                    GroupShape::Look {
                        behind: false,
                        negative: true,
                    }
                }
                Some('<') => {
                    self.bump();
                    match self.peek() {
                        Some('=') => {
                            self.bump();
                            self.gate(RegexFeature::PositiveLookbehind, start)?;
                            GroupShape::Look {
                                behind: true,
                                negative: false,
                            }
                        }
                        Some('!') => {
                            self.bump();
                            self.gate(RegexFeature::NegativeLookbehind, start)?;
                            GroupShape::Look {
                                behind: true,
                                negative: true,
                            }
                        }
                        Some(c) if c.is_ascii_alphabetic() => {
                            self.gate(RegexFeature::NamedCapturingGroupsAndReferences, start)?;
                            let name = self.parse_group_name()?;
                            if self.group_names.contains_key(&name) {
                                return Err(self.syntax_error(
                                    format!("Named capturing group <{name}> is already defined"),
                                    start,
                                ));
                            }
                            self.capture_count += 1;
                            self.group_names.insert(name.clone(), self.capture_count);
                            GroupShape::Plain(GroupKind::Capturing {
                                index: self.capture_count,
                                name: Some(name.into_boxed_str()),
                            })
                        }
                        _ => return Err(self.syntax_error("Unknown look-behind group", start)),
                    }
                }
                Some(c) if MatchFlags::from_flag_char(c).is_some() || c == '-' => {
                    self.gate(RegexFeature::InlinedMatchFlags, start)?;
                    match self.parse_flags()? {
                        FlagGroup::Toggle(change) => {
                            self.group_depth -= 1;
                            return Ok(self.push(Node::FlagToggle(change), false));
                        }
                        FlagGroup::Scope(change) => {
                            GroupShape::Plain(GroupKind::FlagScope(change))
                        }
                    }
                }
                _ => return Err(self.syntax_error("Unknown inline modifier", start)),
            }
        } else {
            self.capture_count += 1;
            GroupShape::Plain(GroupKind::Capturing {
                index: self.capture_count,
                name: None,
            })
        };

        let is_atomic = matches!(shape, GroupShape::Plain(GroupKind::Atomic));
        if is_atomic {
            self.atomic_depth += 1;
        }
        let child = self.parse_alternation()?;
        if is_atomic {
            self.atomic_depth -= 1;
        }
        if !self.eat(')') {
            return Err(self.syntax_error("Unclosed group", self.pos));
        }
        self.group_depth -= 1;
        self.overlap.reset();

        let child_hazard = self.hazard(child);
        Ok(match shape {
            GroupShape::Look { behind, negative } => self.push(
                Node::Lookaround {
                    behind,
                    negative,
                    child,
                },
                child_hazard,
            ),
            GroupShape::Plain(kind) => {
                let hazard = if matches!(kind, GroupKind::Atomic) {
                    false
                } else {
                    child_hazard
                };
                self.push(Node::Group { kind, depth, child }, hazard)
            }
        })
    }

    fn parse_flags(&mut self) -> Result<FlagGroup> {
        let mut enabled = MatchFlags::empty();
        let mut disabled = MatchFlags::empty();
        let mut negated = false;
        loop {
            let at = self.pos;
            match self.next() {
                Some(')') => {
                    return Ok(FlagGroup::Toggle(FlagChange { enabled, disabled }));
                }
                Some(':') => {
                    return Ok(FlagGroup::Scope(FlagChange { enabled, disabled }));
                }
                Some('-') if !negated => negated = true,
                Some(c) => match MatchFlags::from_flag_char(c) {
                    Some(flag) => {
                        if negated {
                            disabled.insert(flag);
                        } else {
                            enabled.insert(flag);
                        }
                    }
                    None => return Err(self.syntax_error("Unknown inline modifier", at)),
                },
                None => return Err(self.syntax_error("Unclosed group", at)),
            }
        }
    }

    fn parse_group_name(&mut self) -> Result<String> {
        let start = self.pos;
        let mut name = String::new();
        match self.next() {
            Some(c) if c.is_ascii_alphabetic() => name.push(c),
            _ => {
                return Err(self.syntax_error(
                    "Capturing group name does not start with a Latin letter",
                    start,
                ))
            }
        }
        loop {
            match self.next() {
                Some('>') => return Ok(name),
                Some(c) if c.is_ascii_alphanumeric() => name.push(c),
                _ => {
                    return Err(self.syntax_error(
                        "Named capturing group is missing trailing '>'",
                        start,
                    ))
                }
            }
        }
    }

    fn parse_escape(&mut self, start: usize) -> Result<(NodeId, Option<TokenSet>)> {
        let Some(c) = self.next() else {
            return Err(self.syntax_error("Trailing backslash", start));
        };
        match c {
            '1'..='9' => {
                self.gate(RegexFeature::Backreferences, start)?;
                let mut n = c as u32 - '0' as u32;
                while let Some(digit) = self.peek().and_then(|d| d.to_digit(10)) {
                    let extended = n * 10 + digit;
                    if extended > self.capture_count {
                        break;
                    }
                    n = extended;
                    self.bump();
                }
                if n > self.capture_count {
                    return Err(self.syntax_error(format!("No group {n}"), start));
                }
                Ok((self.push(Node::Backreference(n), false), None))
            }
            '0' => {
                self.gate(RegexFeature::OctalEscapeSequences, start)?;
                let ch = self.parse_octal(start)?;
                Ok((
                    self.push(Node::Literal(ch), false),
                    Some(TokenSet::literal(ch)),
                ))
            }
            'x' => {
                let ch = self.parse_hex_escape(start)?;
                Ok((
                    self.push(Node::Literal(ch), false),
                    Some(TokenSet::literal(ch)),
                ))
            }
            'u' => {
                let ch = self.parse_unicode_escape(start)?;
                Ok((
                    self.push(Node::Literal(ch), false),
                    Some(TokenSet::literal(ch)),
                ))
            }
            'c' => {
                let ch = self.parse_control_escape(start)?;
                Ok((
                    self.push(Node::Literal(ch), false),
                    Some(TokenSet::literal(ch)),
                ))
            }
            't' => Ok(self.push_literal('\t')),
            'n' => Ok(self.push_literal('\n')),
            'r' => Ok(self.push_literal('\r')),
            'f' => Ok(self.push_literal('\x0C')),
            'a' => Ok(self.push_literal('\x07')),
            'e' => Ok(self.push_literal('\x1B')),
            'd' => Ok(self.push_predefined(PredefClass::Digit)),
            'D' => Ok(self.push_predefined(PredefClass::NonDigit)),
            'w' => Ok(self.push_predefined(PredefClass::Word)),
            'W' => Ok(self.push_predefined(PredefClass::NonWord)),
            's' => Ok(self.push_predefined(PredefClass::Space)),
            'S' => Ok(self.push_predefined(PredefClass::NonSpace)),
            'h' => {
                self.gate(RegexFeature::HorizontalWhitespace, start)?;
                Ok(self.push_predefined(PredefClass::HorizontalSpace))
            }
            'H' => {
                self.gate(RegexFeature::HorizontalWhitespace, start)?;
                Ok(self.push_predefined(PredefClass::NonHorizontalSpace))
            }
            'v' => Ok(self.push_predefined(PredefClass::VerticalSpace)),
            'V' => {
                self.gate(RegexFeature::NonVerticalWhitespace, start)?;
                Ok(self.push_predefined(PredefClass::NonVerticalSpace))
            }
            'R' => {
                self.gate(RegexFeature::AnyUnicodeLinebreakSequence, start)?;
                Ok((self.push(Node::Linebreak, false), None))
            }
            'b' => Ok((self.push(Node::Boundary(BoundaryKind::Word), false), None)),
            'B' => Ok((self.push(Node::Boundary(BoundaryKind::NonWord), false), None)),
            'A' => {
                self.gate(RegexFeature::AlternativeBegin, start)?;
                Ok((self.push(Node::Anchor(AnchorKind::InputStart), false), None))
            }
            'z' => {
                self.gate(RegexFeature::AlternativeEnd, start)?;
                Ok((self.push(Node::Anchor(AnchorKind::InputEnd), false), None))
            }
            'Z' => {
                self.gate(RegexFeature::AlternativeEnd, start)?;
                Ok((
                    self.push(Node::Anchor(AnchorKind::InputEndFinalTerminator), false),
                    None,
                ))
            }
            'G' => {
                self.gate(RegexFeature::EndOfPreviousMatch, start)?;
                Ok((self.push(Node::Anchor(AnchorKind::PrevMatchEnd), false), None))
            }
            'k' => {
                self.gate(RegexFeature::NamedCapturingGroupsAndReferences, start)?;
                if !self.eat('<') {
                    return Err(self.syntax_error(
                        "\\k is not followed by '<' for named capturing group",
                        self.pos,
                    ));
                }
                let name = self.parse_group_name()?;
                if !self.group_names.contains_key(&name) {
                    return Err(self.syntax_error(
                        format!("Named capturing group <{name}> is not defined"),
                        start,
                    ));
                }
                Ok((
                    self.push(Node::NamedBackreference(name.into_boxed_str()), false),
                    None,
                ))
            }
            'p' | 'P' => {
                self.gate(RegexFeature::UnicodeExpressions, start)?;
                let negated = c == 'P';
                let property = self.parse_property(start)?;
                // POSIX classes are single-character tokens with a known
                // US-ASCII set; everything else is not tracked for overlap
                let token = match (&property, negated) {
                    (PropertyClass::Posix(posix), false) => Some(TokenSet::posix(*posix)),
                    _ => None,
                };
                Ok((
                    self.push(Node::Property { property, negated }, false),
                    token,
                ))
            }
            'Q' => {
                self.gate(RegexFeature::QuotationSequence, start)?;
                self.parse_quotation()
            }
            'E' => Err(self.syntax_error("Unmatched closing '\\E'", start)),
            c if c.is_ascii_alphanumeric() => {
                Err(self.syntax_error("Illegal/unsupported escape sequence", start))
            }
            other => Ok(self.push_literal(other)),
        }
    }

    fn push_literal(&mut self, c: char) -> (NodeId, Option<TokenSet>) {
        (
            self.push(Node::Literal(c), false),
            Some(TokenSet::literal(c)),
        )
    }

    fn push_predefined(&mut self, class: PredefClass) -> (NodeId, Option<TokenSet>) {
        (
            self.push(Node::Predefined(class), false),
            Some(TokenSet::predefined(class)),
        )
    }

    /// `\Q...\E`: everything up to `\E` (or the end of the pattern) is
    /// taken literally.
    fn parse_quotation(&mut self) -> Result<(NodeId, Option<TokenSet>)> {
        let mut quoted = Vec::new();
        loop {
            match self.next() {
                None => break,
                Some('\\') if self.peek() == Some('E') => {
                    self.bump();
                    break;
                }
                Some(c) => quoted.push(c),
            }
        }
        match quoted.as_slice() {
            [] => Ok((self.push(Node::Empty, false), None)),
            [c] => Ok(self.push_literal(*c)),
            _ => {
                let parts: SmallVec<[NodeId; 4]> = quoted
                    .into_iter()
                    .map(|c| self.push(Node::Literal(c), false))
                    .collect();
                Ok((self.push(Node::Concat(parts), false), None))
            }
        }
    }

    /// `\0n`, `\0nn` or `\0mnn` with m <= 3.
    fn parse_octal(&mut self, start: usize) -> Result<char> {
        let Some(d1) = self.peek().and_then(|c| c.to_digit(8)) else {
            return Err(self.syntax_error("Illegal octal escape sequence", start));
        };
        self.bump();
        let mut value = d1;
        if let Some(d2) = self.peek().and_then(|c| c.to_digit(8)) {
            self.bump();
            value = value * 8 + d2;
            if d1 <= 3 {
                if let Some(d3) = self.peek().and_then(|c| c.to_digit(8)) {
                    self.bump();
                    value = value * 8 + d3;
                }
            }
        }
        char::from_u32(value)
            .ok_or_else(|| self.syntax_error("Illegal octal escape sequence", start))
    }

    /// `\xhh` or `\x{h...h}`.
    fn parse_hex_escape(&mut self, start: usize) -> Result<char> {
        if self.eat('{') {
            let mut value: u32 = 0;
            let mut digits = 0;
            loop {
                match self.next() {
                    Some('}') => break,
                    Some(c) => match c.to_digit(16) {
                        Some(digit) => {
                            value = value.saturating_mul(16).saturating_add(digit);
                            digits += 1;
                        }
                        None => {
                            return Err(self
                                .syntax_error("Illegal hexadecimal escape sequence", start))
                        }
                    },
                    None => {
                        return Err(
                            self.syntax_error("Unclosed hexadecimal escape sequence", start)
                        )
                    }
                }
            }
            if digits == 0 {
                return Err(self.syntax_error("Illegal hexadecimal escape sequence", start));
            }
            return char::from_u32(value)
                .ok_or_else(|| self.syntax_error("Hexadecimal codepoint is too big", start));
        }
        let mut value = 0;
        for _ in 0..2 {
            match self.next().and_then(|c| c.to_digit(16)) {
                Some(digit) => value = value * 16 + digit,
                None => {
                    return Err(self.syntax_error("Illegal hexadecimal escape sequence", start))
                }
            }
        }
        char::from_u32(value)
            .ok_or_else(|| self.syntax_error("Illegal hexadecimal escape sequence", start))
    }

    /// `\uhhhh`.
    fn parse_unicode_escape(&mut self, start: usize) -> Result<char> {
        let mut value = 0;
        for _ in 0..4 {
            match self.next().and_then(|c| c.to_digit(16)) {
                Some(digit) => value = value * 16 + digit,
                None => return Err(self.syntax_error("Illegal Unicode escape sequence", start)),
            }
        }
        char::from_u32(value)
            .ok_or_else(|| self.syntax_error("Illegal Unicode escape sequence", start))
    }

    /// `\cx`, the control character corresponding to `x`.
    fn parse_control_escape(&mut self, start: usize) -> Result<char> {
        let Some(c) = self.next() else {
            return Err(self.syntax_error("Illegal control escape sequence", start));
        };
        char::from_u32(c as u32 ^ 0x40)
            .ok_or_else(|| self.syntax_error("Illegal control escape sequence", start))
    }

    /// `\p{...}` / `\P{...}` or the single-letter `\pL` form.
    fn parse_property(&mut self, start: usize) -> Result<PropertyClass> {
        let name = if self.eat('{') {
            let mut name = String::new();
            loop {
                match self.next() {
                    Some('}') => break,
                    Some(c) => name.push(c),
                    None => return Err(self.syntax_error("Unclosed character family", start)),
                }
            }
            name
        } else {
            match self.next() {
                Some(c) => c.to_string(),
                None => return Err(self.syntax_error("Unclosed character family", start)),
            }
        };
        if name.is_empty() {
            return Err(self.syntax_error("Empty character family", start));
        }
        classify_property(&name)
            .ok_or_else(|| self.syntax_error(format!("Unknown character property name {{{name}}}"), start))
    }

    /// Parses the body of a `[...]` class; the opening `[` is already
    /// consumed.
    fn parse_class(&mut self) -> Result<CharClass> {
        let negated = self.eat('^');
        let mut items: SmallVec<[ClassItem; 4]> = SmallVec::new();
        loop {
            match self.peek() {
                None => return Err(self.syntax_error("Unclosed character class", self.pos)),
                // a ']' right at the start is a literal, afterwards it closes
                Some(']') if !items.is_empty() => {
                    self.bump();
                    return Ok(CharClass { negated, items });
                }
                Some('[') => {
                    let inner_start = self.pos;
                    self.gate(RegexFeature::CharacterClassUnion, inner_start)?;
                    self.bump();
                    let inner = self.parse_class()?;
                    items.push(ClassItem::Union(Box::new(inner)));
                }
                Some('&') if self.peek_at(1) == Some('&') => {
                    let amp = self.pos;
                    self.gate(RegexFeature::CharacterClassIntersection, amp)?;
                    self.bump();
                    self.bump();
                    let operand = if self.peek() == Some('[') {
                        self.bump();
                        self.parse_class()?
                    } else {
                        self.parse_intersection_operand(amp)?
                    };
                    items.push(ClassItem::Intersection(Box::new(operand)));
                }
                Some(_) => items.push(self.parse_class_item()?),
            }
        }
    }

    /// The right-hand side of `&&` when it is not bracketed: items up to
    /// the closing `]` or the next `&&`.
    fn parse_intersection_operand(&mut self, start: usize) -> Result<CharClass> {
        let mut items: SmallVec<[ClassItem; 4]> = SmallVec::new();
        loop {
            match self.peek() {
                None => return Err(self.syntax_error("Unclosed character class", self.pos)),
                Some(']') => break,
                Some('&') if self.peek_at(1) == Some('&') => break,
                Some('[') => {
                    let inner_start = self.pos;
                    self.gate(RegexFeature::CharacterClassUnion, inner_start)?;
                    self.bump();
                    let inner = self.parse_class()?;
                    items.push(ClassItem::Union(Box::new(inner)));
                }
                Some(_) => items.push(self.parse_class_item()?),
            }
        }
        if items.is_empty() {
            return Err(self.syntax_error("Bad class syntax", start));
        }
        Ok(CharClass {
            negated: false,
            items,
        })
    }

    fn parse_class_item(&mut self) -> Result<ClassItem> {
        let start = self.pos;
        let Some(c) = self.next() else {
            return Err(self.syntax_error("Unclosed character class", self.pos));
        };
        let lo = if c == '\\' {
            match self.parse_class_escape(start)? {
                ClassEscape::Char(ch) => ch,
                ClassEscape::Item(item) => return Ok(item),
            }
        } else {
            c
        };

        if self.peek() == Some('-') {
            match self.peek_at(1) {
                None => return Err(self.syntax_error("Unclosed character class", self.pos + 1)),
                // a trailing '-' before ']' parses as its own literal
                Some(']') => {}
                Some('[') => return Err(self.syntax_error("Illegal character range", self.pos)),
                Some(_) => {
                    self.bump();
                    let hi_start = self.pos;
                    let Some(d) = self.next() else {
                        return Err(self.syntax_error("Unclosed character class", self.pos));
                    };
                    let hi = if d == '\\' {
                        match self.parse_class_escape(hi_start)? {
                            ClassEscape::Char(ch) => ch,
                            ClassEscape::Item(_) => {
                                return Err(
                                    self.syntax_error("Illegal character range", hi_start)
                                )
                            }
                        }
                    } else {
                        d
                    };
                    if hi < lo {
                        return Err(self.syntax_error("Illegal character range", start));
                    }
                    return Ok(ClassItem::Range(lo, hi));
                }
            }
        }
        Ok(ClassItem::Single(lo))
    }

    fn parse_class_escape(&mut self, start: usize) -> Result<ClassEscape> {
        let Some(c) = self.next() else {
            return Err(self.syntax_error("Trailing backslash", start));
        };
        Ok(match c {
            'd' => ClassEscape::Item(ClassItem::Predefined(PredefClass::Digit)),
            'D' => ClassEscape::Item(ClassItem::Predefined(PredefClass::NonDigit)),
            'w' => ClassEscape::Item(ClassItem::Predefined(PredefClass::Word)),
            'W' => ClassEscape::Item(ClassItem::Predefined(PredefClass::NonWord)),
            's' => ClassEscape::Item(ClassItem::Predefined(PredefClass::Space)),
            'S' => ClassEscape::Item(ClassItem::Predefined(PredefClass::NonSpace)),
            'h' => {
                self.gate(RegexFeature::HorizontalWhitespace, start)?;
                ClassEscape::Item(ClassItem::Predefined(PredefClass::HorizontalSpace))
            }
            'H' => {
                self.gate(RegexFeature::HorizontalWhitespace, start)?;
                ClassEscape::Item(ClassItem::Predefined(PredefClass::NonHorizontalSpace))
            }
            'v' => ClassEscape::Item(ClassItem::Predefined(PredefClass::VerticalSpace)),
            'V' => {
                self.gate(RegexFeature::NonVerticalWhitespace, start)?;
                ClassEscape::Item(ClassItem::Predefined(PredefClass::NonVerticalSpace))
            }
            'p' | 'P' => {
                self.gate(RegexFeature::UnicodeExpressions, start)?;
                let property = self.parse_property(start)?;
                ClassEscape::Item(ClassItem::Property {
                    property,
                    negated: c == 'P',
                })
            }
            '0' => {
                self.gate(RegexFeature::OctalEscapeSequences, start)?;
                ClassEscape::Char(self.parse_octal(start)?)
            }
            'x' => ClassEscape::Char(self.parse_hex_escape(start)?),
            'u' => ClassEscape::Char(self.parse_unicode_escape(start)?),
            'c' => ClassEscape::Char(self.parse_control_escape(start)?),
            't' => ClassEscape::Char('\t'),
            'n' => ClassEscape::Char('\n'),
            'r' => ClassEscape::Char('\r'),
            'f' => ClassEscape::Char('\x0C'),
            'a' => ClassEscape::Char('\x07'),
            'e' => ClassEscape::Char('\x1B'),
            c if c.is_ascii_alphanumeric() => {
                return Err(self.syntax_error("Illegal/unsupported escape sequence", start))
            }
            other => ClassEscape::Char(other),
        })
    }
}

/// Resolves a property name to what it refers to. POSIX names, java*
/// methods and general categories are validated against the known sets;
/// script, block and binary property names are accepted as long as they
/// are well-formed.
fn classify_property(name: &str) -> Option<PropertyClass> {
    if let Some((prefix, value)) = name.split_once('=') {
        if value.is_empty() {
            return None;
        }
        return match prefix {
            "sc" | "script" => Some(PropertyClass::Script(value.into())),
            "blk" | "block" => Some(PropertyClass::Block(value.into())),
            "gc" | "general_category" => {
                if is_general_category(value) {
                    Some(PropertyClass::Category(value.into()))
                } else {
                    None
                }
            }
            _ => None,
        };
    }
    if let Some(rest) = name.strip_prefix("In") {
        if !rest.is_empty() {
            return Some(PropertyClass::Block(rest.into()));
        }
    }
    if let Some(rest) = name.strip_prefix("Is") {
        if !rest.is_empty() {
            return Some(if BINARY_PROPERTIES.contains(&rest) {
                PropertyClass::BinaryProperty(rest.into())
            } else {
                PropertyClass::Script(rest.into())
            });
        }
    }
    if name.starts_with("java") && name.len() > 4 {
        return if JAVA_METHODS.contains(&name) {
            Some(PropertyClass::JavaMethod(name.into()))
        } else {
            None
        };
    }
    if let Some(posix) = PosixClass::from_name(name) {
        return Some(PropertyClass::Posix(posix));
    }
    if is_general_category(name) {
        return Some(PropertyClass::Category(name.into()));
    }
    None
}

/// Validates a general category name: an initial letter plus an optional
/// detail letter.
fn is_general_category(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(initial) = chars.next() else {
        return false;
    };
    let details = match initial {
        'L' => "ultmo",
        'M' => "nce",
        'N' => "dlo",
        'P' => "cdseifo",
        'Z' => "slp",
        'S' => "mcko",
        'C' => "cfon",
        _ => return false,
    };
    match chars.next() {
        None => true,
        Some(detail) => details.contains(detail) && chars.next().is_none(),
    }
}

const BINARY_PROPERTIES: &[&str] = &[
    "Alphabetic",
    "Assigned",
    "Control",
    "Digit",
    "HexDigit",
    "Hex_Digit",
    "Ideographic",
    "JoinControl",
    "Join_Control",
    "Letter",
    "Lowercase",
    "NoncharacterCodePoint",
    "Noncharacter_Code_Point",
    "Punctuation",
    "Titlecase",
    "Uppercase",
    "WhiteSpace",
    "White_Space",
];

const JAVA_METHODS: &[&str] = &[
    "javaAlphabetic",
    "javaDefined",
    "javaDigit",
    "javaIdentifierIgnorable",
    "javaISOControl",
    "javaJavaIdentifierPart",
    "javaJavaIdentifierStart",
    "javaLetter",
    "javaLetterOrDigit",
    "javaLowerCase",
    "javaMirrored",
    "javaSpaceChar",
    "javaTitleCase",
    "javaUnicodeIdentifierPart",
    "javaUnicodeIdentifierStart",
    "javaUpperCase",
    "javaWhitespace",
];
