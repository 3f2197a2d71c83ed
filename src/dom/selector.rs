//! CSS selectors, parsed with `cssparser` + `selectors`.
//!
//! A [`Selector`] keeps its source text for `querySelectorAll` and the parsed
//! [`SelectorList`] so [`super::memory::MemoryDom`] can evaluate the same
//! selectors the browser sees. Pseudo-classes outside the tree-structural set
//! and pseudo-elements are rejected at parse time.

#[cfg(test)]
#[path = "selector_test.rs"]
mod selector_test;

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use cssparser::{ParserInput, ToCss};
use precomputed_hash::PrecomputedHash;
use selectors::NthIndexCache;
use selectors::matching::{
    IgnoreNthChildForInvalidation, MatchingContext, MatchingMode, NeedsSelectorFlags, QuirksMode, matches_selector,
};
use selectors::parser::{ParseRelative, SelectorList, SelectorParseErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector {selector:?} at column {column}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub column: u32,
    pub reason: String,
}

/// A parsed selector list.
#[derive(Debug, Clone)]
pub struct Selector {
    text: String,
    list: SelectorList<PageSelectors>,
}

impl Selector {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for malformed input or unsupported
    /// pseudo-classes and pseudo-elements.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut source = ParserInput::new(input);
        let mut parser = cssparser::Parser::new(&mut source);
        let list = SelectorList::parse(&SelectorParser, &mut parser, ParseRelative::No).map_err(|err| {
            SelectorError { selector: input.to_owned(), column: err.location.column, reason: format!("{:?}", err.kind) }
        })?;
        Ok(Self { text: input.trim().to_owned(), list })
    }

    /// The selector text, as handed to `querySelectorAll`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of comma-separated selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.0.is_empty()
    }

    /// Whether any selector in the list matches `element`.
    #[must_use]
    pub fn matches<E>(&self, element: &E) -> bool
    where
        E: selectors::Element<Impl = PageSelectors>,
    {
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        self.list.0.iter().any(|selector| matches_selector(selector, 0, None, element, &mut context))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================
// selectors glue
// =============================================================

/// Attribute values in selectors, e.g. the `#` in `a[href^="#"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssString(String);

impl From<&str> for CssString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for CssString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        cssparser::serialize_string(&self.0, dest)
    }
}

/// Tag names, ids, classes and attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssName {
    name: String,
    hash: u32,
}

impl CssName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for CssName {
    fn from(value: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        let hash = u32::try_from(hasher.finish() >> 32).unwrap_or_default();
        Self { name: value.to_owned(), hash }
    }
}

impl PrecomputedHash for CssName {
    fn precomputed_hash(&self) -> u32 {
        self.hash
    }
}

impl ToCss for CssName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        cssparser::serialize_identifier(&self.name, dest)
    }
}

/// Pages are plain HTML; every element lives in the one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HtmlNamespace;

impl PrecomputedHash for HtmlNamespace {
    fn precomputed_hash(&self) -> u32 {
        0
    }
}

/// The [`selectors::SelectorImpl`] for page queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelectors;

impl selectors::SelectorImpl for PageSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssName;
    type LocalName = CssName;
    type NamespacePrefix = CssName;
    type NamespaceUrl = HtmlNamespace;
    type BorrowedNamespaceUrl = HtmlNamespace;
    type BorrowedLocalName = CssName;
    type NonTSPseudoClass = NoPseudoClass;
    type PseudoElement = NoPseudoElement;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NoPseudoClass {
    type Impl = PageSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for NoPseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoPseudoElement {}

impl selectors::parser::PseudoElement for NoPseudoElement {
    type Impl = PageSelectors;
}

impl ToCss for NoPseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = PageSelectors;
    type Error = SelectorParseErrorKind<'i>;
}
