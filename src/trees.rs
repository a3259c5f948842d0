//! Tree construction: turning the tokenizer's output into a [`Document`].

pub(crate) mod adoption;
pub(crate) mod construction_dispatcher;
pub(crate) mod foreign;
pub(crate) mod scopes;

use crate::dom::{Document, Namespace, NodeId};
use crate::emitter::DefaultEmitter;
use crate::error::ParseError;
use crate::trees::construction_dispatcher::{
    synthetic_tag, InsertionMode, TreeConstructionDispatcher,
};
use crate::utils::State;
use crate::{Readable, Reader, Tokenizer};

/// Parse a complete document.
pub(crate) fn build_document<'a, R, S>(input: S, scripting: bool) -> (Document, Vec<ParseError>)
where
    R: Reader + 'a,
    S: Readable<'a, Reader = R>,
{
    let tokenizer = Tokenizer::new_with_emitter(input, DefaultEmitter::default());
    let mut dispatcher = TreeConstructionDispatcher::new(tokenizer, scripting);
    dispatcher.run();
    (dispatcher.document, dispatcher.errors)
}

/// Parse with the [fragment parsing
/// algorithm](https://html.spec.whatwg.org/#parsing-html-fragments).
///
/// `context` is the context element's tag name; foreign context elements are written
/// `"svg name"` or `"math name"`. The parsed fragment ends up as the children of the
/// document's `html` element.
pub(crate) fn build_fragment<'a, R, S>(
    input: S,
    context: &str,
    scripting: bool,
) -> (Document, Vec<ParseError>)
where
    R: Reader + 'a,
    S: Readable<'a, Reader = R>,
{
    let mut tokenizer = Tokenizer::new_with_emitter(input, DefaultEmitter::default());

    let (context_namespace, context_name) = match context.split_once(' ') {
        Some(("svg", name)) => (Namespace::Svg, name),
        Some(("math", name)) => (Namespace::MathMl, name),
        _ => (Namespace::Html, context),
    };

    if context_namespace == Namespace::Html {
        match context_name {
            "title" | "textarea" => tokenizer.set_state(State::RcData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                tokenizer.set_state(State::RawText)
            }
            "noscript" if scripting => tokenizer.set_state(State::RawText),
            "script" => tokenizer.set_state(State::ScriptData),
            "plaintext" => tokenizer.set_state(State::PlainText),
            _ => {}
        }
    }
    tokenizer.set_last_start_tag(Some(context_name));

    let mut dispatcher = TreeConstructionDispatcher::new(tokenizer, scripting);

    // the context element exists in the arena but stays detached from the tree
    let context_element: NodeId = dispatcher.create_element_for_token(
        &synthetic_tag(context_name),
        context_namespace,
    );
    dispatcher.context_element = Some(context_element);

    let root = dispatcher.document.root();
    let html = dispatcher.create_element_for_token(&synthetic_tag("html"), Namespace::Html);
    dispatcher.document.append(root, html);
    dispatcher.stack_of_open_elements.push(html);

    if context_namespace == Namespace::Html && context_name == "template" {
        dispatcher
            .stack_of_template_insertion_modes
            .push(InsertionMode::InTemplate);
    }

    dispatcher.reset_the_insertion_mode_appropriately();
    dispatcher.run();
    (dispatcher.document, dispatcher.errors)
}
