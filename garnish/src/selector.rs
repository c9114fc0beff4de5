//! CSS selectors: parsing and matching against the arena DOM.
//!
//! Supports selector lists, compound selectors made of type, universal, id,
//! class and attribute selectors, and the four combinators. Pseudo-classes,
//! pseudo-elements and namespace prefixes are rejected with a
//! [`SelectorError`].

use crate::dom::Document;
use indextree::NodeId;
use std::fmt;

/// Errors raised while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector in `{selector}`")]
    Empty { selector: String },

    #[error("unexpected `{found}` at position {position} in `{selector}`")]
    Unexpected {
        selector: String,
        position: usize,
        found: char,
    },

    #[error("unexpected end of selector `{selector}`")]
    UnexpectedEnd { selector: String },

    #[error("unsupported {feature} at position {position} in `{selector}`")]
    Unsupported {
        selector: String,
        position: usize,
        feature: &'static str,
    },
}

/// A list of selectors (comma-separated in CSS).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse a selector list such as `p.bar, div > [data-x^="a"]`.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list()
    }

    /// Does `node` match any selector of the list?
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node) && self.selectors.iter().any(|s| s.matches(doc, node))
    }
}

/// A complex selector: compounds joined by combinators, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub components: Vec<SelectorComponent>,
}

/// A component of a selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector `*`
    Universal,
    /// Type selector, stored lowercase
    Type(String),
    /// Class selector (e.g., `.class-name`)
    Class(String),
    /// ID selector (e.g., `#id-name`)
    Id(String),
    /// Attribute selector (e.g., `[attr]`, `[attr=value]`)
    Attribute {
        name: String,
        operator: AttributeOperator,
        value: String,
        case_sensitivity: CaseSensitivity,
    },
    /// Combinator between two compounds
    Combinator(Combinator),
}

/// Attribute selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr]` - has attribute
    Exists,
    /// `[attr=value]` - exact match
    Equals,
    /// `[attr~=value]` - whitespace-separated list contains value
    Includes,
    /// `[attr|=value]` - equals or starts with value followed by hyphen
    DashMatch,
    /// `[attr^=value]` - starts with
    Prefix,
    /// `[attr$=value]` - ends with
    Suffix,
    /// `[attr*=value]` - contains
    Substring,
}

/// Case sensitivity for attribute matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    #[default]
    CaseSensitive,
    AsciiCaseInsensitive,
}

/// Selector combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (space)
    Descendant,
    /// Child combinator `>`
    Child,
    /// Next sibling combinator `+`
    NextSibling,
    /// Subsequent sibling combinator `~`
    SubsequentSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, " > "),
            Combinator::NextSibling => write!(f, " + "),
            Combinator::SubsequentSibling => write!(f, " ~ "),
        }
    }
}

impl Selector {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_until(doc, node, self.components.len())
    }

    /// Match the compound ending right before `end`, then walk the
    /// combinator to its left.
    fn matches_until(&self, doc: &Document, node: NodeId, end: usize) -> bool {
        let start = self.components[..end]
            .iter()
            .rposition(|c| matches!(c, SelectorComponent::Combinator(_)))
            .map_or(0, |i| i + 1);

        if !self.components[start..end]
            .iter()
            .all(|c| c.matches(doc, node))
        {
            return false;
        }
        if start == 0 {
            return true;
        }

        let SelectorComponent::Combinator(combinator) = self.components[start - 1] else {
            return false;
        };
        let next_end = start - 1;

        match combinator {
            Combinator::Descendant => element_ancestors(doc, node)
                .any(|ancestor| self.matches_until(doc, ancestor, next_end)),
            Combinator::Child => element_ancestors(doc, node)
                .next()
                .is_some_and(|parent| self.matches_until(doc, parent, next_end)),
            Combinator::NextSibling => previous_element_siblings(doc, node)
                .next()
                .is_some_and(|sibling| self.matches_until(doc, sibling, next_end)),
            Combinator::SubsequentSibling => previous_element_siblings(doc, node)
                .any(|sibling| self.matches_until(doc, sibling, next_end)),
        }
    }
}

fn element_ancestors(doc: &Document, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    node.ancestors(&doc.arena)
        .skip(1)
        .take_while(move |&id| doc.is_element(id))
}

fn previous_element_siblings(doc: &Document, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    node.preceding_siblings(&doc.arena)
        .skip(1)
        .filter(move |&id| doc.is_element(id))
}

impl SelectorComponent {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(elem) = doc.element(node) else {
            return false;
        };

        match self {
            SelectorComponent::Universal | SelectorComponent::Combinator(_) => true,
            SelectorComponent::Type(tag) => elem.tag.eq_ignore_ascii_case(tag),
            SelectorComponent::Id(id) => elem.attr("id") == Some(id.as_str()),
            SelectorComponent::Class(class) => elem
                .attr("class")
                .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class)),
            SelectorComponent::Attribute {
                name,
                operator,
                value,
                case_sensitivity,
            } => elem
                .attr(name)
                .is_some_and(|actual| operator.matches(actual, value, *case_sensitivity)),
        }
    }
}

impl AttributeOperator {
    fn matches(self, actual: &str, expected: &str, case: CaseSensitivity) -> bool {
        let (actual, expected) = match case {
            CaseSensitivity::CaseSensitive => (actual.to_string(), expected.to_string()),
            CaseSensitivity::AsciiCaseInsensitive => {
                (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
            }
        };

        match self {
            AttributeOperator::Exists => true,
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|word| word == expected)
            }
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.input.len(), |&(offset, _)| offset)
    }

    /// Returns true if any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                selector: self.input.to_string(),
                position: self.offset(),
                found,
            },
            None => SelectorError::UnexpectedEnd {
                selector: self.input.to_string(),
            },
        }
    }

    fn unsupported(&self, feature: &'static str) -> SelectorError {
        SelectorError::Unsupported {
            selector: self.input.to_string(),
            position: self.offset(),
            feature,
        }
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        if self.input.trim().is_empty() {
            return Err(SelectorError::Empty {
                selector: self.input.to_string(),
            });
        }

        let mut selectors = vec![self.parse_selector()?];
        while self.peek() == Some(',') {
            self.bump();
            selectors.push(self.parse_selector()?);
        }

        match self.peek() {
            None => Ok(SelectorList { selectors }),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, SelectorError> {
        self.skip_whitespace();
        let mut components = Vec::new();

        loop {
            self.parse_compound(&mut components)?;

            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => {
                    components.push(SelectorComponent::Combinator(Combinator::Descendant));
                    continue;
                }
                Some(_) => return Err(self.unexpected()),
            };
            self.bump();
            self.skip_whitespace();
            components.push(SelectorComponent::Combinator(combinator));
        }

        Ok(Selector { components })
    }

    fn parse_compound(
        &mut self,
        components: &mut Vec<SelectorComponent>,
    ) -> Result<(), SelectorError> {
        let before = components.len();

        match self.peek() {
            Some('*') => {
                self.bump();
                components.push(SelectorComponent::Universal);
            }
            Some(c) if is_ident_char(c) => {
                let tag = self.parse_ident()?;
                components.push(SelectorComponent::Type(tag.to_ascii_lowercase()));
            }
            _ => {}
        }
        if self.peek() == Some('|') {
            return Err(self.unsupported("namespace prefix"));
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    components.push(SelectorComponent::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    components.push(SelectorComponent::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    components.push(self.parse_attribute()?);
                }
                Some(':') => return Err(self.unsupported("pseudo-class")),
                _ => break,
            }
        }

        if components.len() == before {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err(self.unexpected()),
                }
            } else if is_ident_char(c) {
                self.bump();
                ident.push(c);
            } else {
                break;
            }
        }

        if ident.is_empty() {
            return Err(self.unexpected());
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<SelectorComponent, SelectorError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(SelectorComponent::Attribute {
                    name,
                    operator: AttributeOperator::Exists,
                    value: String::new(),
                    case_sensitivity: CaseSensitivity::CaseSensitive,
                });
            }
            Some('=') => AttributeOperator::Equals,
            Some('~') => AttributeOperator::Includes,
            Some('|') => AttributeOperator::DashMatch,
            Some('^') => AttributeOperator::Prefix,
            Some('$') => AttributeOperator::Suffix,
            Some('*') => AttributeOperator::Substring,
            _ => return Err(self.unexpected()),
        };
        self.bump();
        if operator != AttributeOperator::Equals {
            if self.peek() != Some('=') {
                return Err(self.unexpected());
            }
            self.bump();
        }

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') => match self.bump() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(self.unexpected()),
                        },
                        Some(c) => value.push(c),
                        None => return Err(self.unexpected()),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };

        self.skip_whitespace();
        let case_sensitivity = match self.peek() {
            Some('i' | 'I') => {
                self.bump();
                CaseSensitivity::AsciiCaseInsensitive
            }
            Some('s' | 'S') => {
                self.bump();
                CaseSensitivity::CaseSensitive
            }
            _ => CaseSensitivity::CaseSensitive,
        };
        self.skip_whitespace();

        if self.peek() != Some(']') {
            return Err(self.unexpected());
        }
        self.bump();

        Ok(SelectorComponent::Attribute {
            name,
            operator,
            value,
            case_sensitivity,
        })
    }
}

// =============================================================================
// Queries on Document
// =============================================================================

impl Document {
    /// Every element matching `selectors`, in tree order.
    pub fn select(&self, selectors: &SelectorList) -> Vec<NodeId> {
        let start = self.document_node().unwrap_or(self.root);
        start
            .descendants(&self.arena)
            .filter(|&id| selectors.matches(self, id))
            .collect()
    }

    /// Like `document.querySelectorAll`.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        Ok(self.select(&SelectorList::parse(selector)?))
    }

    /// Like `document.querySelector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selectors = SelectorList::parse(selector)?;
        let start = self.document_node().unwrap_or(self.root);
        Ok(start
            .descendants(&self.arena)
            .find(|&id| selectors.matches(self, id)))
    }

    /// Like `Element.matches`.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        Ok(SelectorList::parse(selector)?.matches(self, node))
    }
}
