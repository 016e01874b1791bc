//! Template parsing for the weft engine.
//!
//! Parsing is split into a "dumb" event loop over the markup source (via
//! quick-xml) feeding a [`TreeBuilder`] that assembles the owned
//! [`weft_dom::Document`], and a [`ParserPool`] that bounds how many
//! builders exist at once while allowing parallel template processing.
//!
//! Builders come in a validating configuration (strict well-formedness) and
//! a non-validating one (tolerant of mismatched or missing end tags). With
//! the `legacy` feature, a third pool of tag-soup normalizers rewrites
//! non-well-formed HTML into parseable markup before the standard builder
//! runs.

mod builder;
#[cfg(feature = "legacy")]
mod legacy;
mod pool;

pub use builder::TreeBuilder;
#[cfg(feature = "legacy")]
pub use legacy::LegacyMarkupNormalizer;
pub use pool::ParserPool;

use thiserror::Error;

pub(crate) const BAD_ELEMENT_CONTENT_EXPLANATION: &str =
    "The content of elements must consist of well-formed character data or markup. A usual \
     reason for this is that one of your elements contains unescaped special markup symbols \
     like '<' or '&' inside its body, which is forbidden by XML rules. For example, if you \
     have '<' inside a <script> element, you should surround the script body with commented \
     CDATA markers (like '/* <![CDATA[ */' and '/* ]]> */')";

/// Errors raised while turning template source into a markup tree.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("markup parsing error: {0}")]
    Markup(String),

    /// The very common "raw markup-significant character inside element
    /// content" failure, rewritten into an actionable diagnostic.
    #[error("{BAD_ELEMENT_CONTENT_EXPLANATION}")]
    BadElementContent,

    #[error("invalid document structure: {0}")]
    InvalidStructure(String),

    #[error("template source is not valid UTF-8: {0}")]
    Utf8(String),

    #[error("unsupported template character encoding: {0}")]
    UnsupportedEncoding(String),

    #[error(
        "cannot parse legacy (tag-soup) markup: the engine was built without \
         the 'legacy' feature"
    )]
    LegacyUnavailable,
}

impl From<weft_dom::DomError> for ParseError {
    fn from(e: weft_dom::DomError) -> Self {
        ParseError::InvalidStructure(e.to_string())
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(e: std::str::Utf8Error) -> Self {
        ParseError::Utf8(e.to_string())
    }
}
