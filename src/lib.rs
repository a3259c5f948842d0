#![deny(missing_docs)]
// This is an HTML parser. HTML can be untrusted input from the internet.
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod dom;
mod emitter;
mod entities;
mod error;
mod machine;
mod reader;
mod tokenizer;
mod trees;
mod utils;

#[cfg(feature = "integration-tests")]
pub use utils::State;

pub use dom::{Document, Namespace, Node, NodeData, NodeId, QuirksMode};
pub use emitter::{AttrList, Attribute, DefaultEmitter, Doctype, Emitter, EndTag, StartTag, Token};
pub use error::{Error, ParseError};
pub use reader::{Readable, Reader, StringReader};
pub use tokenizer::Tokenizer;

/// Parse a document from a string.
///
/// Parsing never fails: any input produces a document, with recovery per the WHATWG rules.
///
/// ```
/// let document = html5tree::parse("<p>hello");
/// assert!(document.dump().contains("<p>"));
/// ```
pub fn parse(input: &str) -> Document {
    parse_with_errors(input).0
}

/// Parse a document from a string, also returning every parse error encountered, in emission
/// order.
pub fn parse_with_errors(input: &str) -> (Document, Vec<ParseError>) {
    trees::build_document(input, false)
}

/// Parse a document with the scripting flag set.
///
/// No scripts run; the flag only changes the content model of `noscript`, whose contents
/// become raw text.
pub fn parse_with_scripting(input: &str) -> Document {
    trees::build_document(input, true).0
}

/// Parse a fragment of HTML in the context of an element with the given tag name, per the
/// [fragment parsing algorithm](https://html.spec.whatwg.org/#parsing-html-fragments).
///
/// The parsed nodes are the children of the returned document's `html` element. Foreign
/// context elements are written `"svg name"` or `"math name"`.
///
/// ```
/// let document = html5tree::parse_fragment("<td>cell", "tr");
/// assert!(document.dump().contains("<td>"));
/// ```
pub fn parse_fragment(input: &str, context: &str) -> Document {
    trees::build_fragment(input, context, false).0
}

/// Run only the tokenizer over the input, starting in the data state.
///
/// Returns the token sequence (without the error entries, which are collected separately) and
/// the parse errors in emission order. The tree builder's state switches never happen here, so
/// the contents of elements like `script` are tokenized as markup.
pub fn tokenize(input: &str) -> (Vec<Token>, Vec<ParseError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for token in Tokenizer::new(input) {
        match token {
            Token::Error(error) => errors.push(error),
            token => tokens.push(token),
        }
    }
    (tokens, errors)
}
