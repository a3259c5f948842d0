use crate::dom::{Document, Namespace, NodeId, QuirksMode};
use crate::emitter::{AttrList, DefaultEmitter, Doctype, StartTag, Token};
use crate::error::{Error, ParseError};
use crate::trees::adoption::AdoptionResult;
use crate::trees::{foreign, scopes};
use crate::utils::State;
use crate::{Reader, Tokenizer};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    InTemplate,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

/// An entry in the list of active formatting elements. Element entries remember the start tag
/// they were created from so the reconstruction and adoption algorithms can clone them, and so
/// the Noah's Ark clause can compare attribute sets.
pub(crate) enum FormatEntry {
    Marker,
    Element { node: NodeId, tag: StartTag },
}

/// Strip a leading run of ASCII whitespace off a string token, hand it to `$callback`, and
/// return early if nothing else remains.
macro_rules! handle_whitespace_prefix {
    ($slf:expr, $token:expr, $callback:expr) => {
        if let Some(Token::String(ref mut string)) = $token {
            let index = string
                .find(|c: char| !matches!(c, '\t' | '\n' | '\u{c}' | ' '))
                .unwrap_or(string.len());
            if index > 0 {
                let prefix = string[..index].to_owned();
                string.replace_range(..index, "");
                $callback(&mut *$slf, prefix);
            }
            if string.is_empty() {
                return;
            }
        }
    };
}

macro_rules! skip_over_whitespace {
    ($slf:expr, $token:expr) => {
        handle_whitespace_prefix!($slf, $token, |_slf: &mut Self, _prefix: String| ());
    };
}

pub(crate) struct TreeConstructionDispatcher<R: Reader> {
    pub(crate) tokenizer: Tokenizer<R, DefaultEmitter>,
    pub(crate) document: Document,
    pub(crate) stack_of_open_elements: Vec<NodeId>,
    pub(crate) list_of_active_formatting_elements: Vec<FormatEntry>,
    pub(crate) insertion_mode: InsertionMode,
    pub(crate) original_insertion_mode: Option<InsertionMode>,
    pub(crate) stack_of_template_insertion_modes: Vec<InsertionMode>,
    pub(crate) head_element_pointer: Option<NodeId>,
    pub(crate) form_element_pointer: Option<NodeId>,
    pub(crate) context_element: Option<NodeId>,
    pub(crate) scripting: bool,
    pub(crate) frameset_ok: bool,
    pub(crate) foster_parenting: bool,
    pub(crate) pending_table_character_tokens: String,
    ignore_lf: bool,
    pub(crate) errors: Vec<ParseError>,
    /// Recovery-only errors the WHATWG list assigns no code. Counted, not surfaced.
    pub(crate) uncoded_error_count: usize,
}

impl<R: Reader> TreeConstructionDispatcher<R> {
    pub(crate) fn new(tokenizer: Tokenizer<R, DefaultEmitter>, scripting: bool) -> Self {
        TreeConstructionDispatcher {
            tokenizer,
            document: Document::new(),
            stack_of_open_elements: Vec::new(),
            list_of_active_formatting_elements: Vec::new(),
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: None,
            stack_of_template_insertion_modes: Vec::new(),
            head_element_pointer: None,
            form_element_pointer: None,
            context_element: None,
            scripting,
            frameset_ok: true,
            foster_parenting: false,
            pending_table_character_tokens: String::new(),
            ignore_lf: false,
            errors: Vec::new(),
            uncoded_error_count: 0,
        }
    }

    pub(crate) fn run(&mut self) {
        while let Some(token) = self.tokenizer.next() {
            match token {
                Token::Error(error) => {
                    self.errors.push(error);
                    continue;
                }
                Token::String(mut string) => {
                    if self.ignore_lf {
                        self.ignore_lf = false;
                        if let Some(rest) = string.strip_prefix('\n') {
                            string = rest.to_owned();
                        }
                    }
                    if !string.is_empty() {
                        self.process_token(Some(Token::String(string)));
                    }
                }
                token => {
                    self.ignore_lf = false;
                    self.process_token(Some(token));
                }
            }
            self.update_tokenizer_hooks();
        }
        self.process_token(None);
        self.stop_parsing();
    }

    /// Keep the tokenizer's CDATA hook in sync with the adjusted current node.
    fn update_tokenizer_hooks(&mut self) {
        let in_foreign = self
            .adjusted_current_node()
            .and_then(|node| self.document.element_name(node))
            .map_or(false, |(namespace, _)| namespace != Namespace::Html);
        self.tokenizer
            .emitter_mut()
            .set_in_foreign_content(in_foreign);
    }

    // node accessors

    pub(crate) fn current_node(&self) -> Option<NodeId> {
        self.stack_of_open_elements.last().copied()
    }

    pub(crate) fn adjusted_current_node(&self) -> Option<NodeId> {
        if self.context_element.is_some() && self.stack_of_open_elements.len() == 1 {
            self.context_element
        } else {
            self.current_node()
        }
    }

    pub(crate) fn elem_name(&self, node: NodeId) -> (Namespace, &str) {
        self.document
            .element_name(node)
            .expect("node on the stack of open elements is not an element")
    }

    pub(crate) fn is_html_element(&self, node: NodeId, name: &str) -> bool {
        self.document.is_html_element(node, name)
    }

    fn current_node_is(&self, name: &str) -> bool {
        self.current_node()
            .map_or(false, |node| self.is_html_element(node, name))
    }

    fn stack_has_template(&self) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|&node| self.is_html_element(node, "template"))
    }

    // error reporting

    /// A tree-construction parse error the WHATWG error list assigns no code. Recovery is all
    /// that is observable.
    pub(crate) fn parse_error(&mut self) {
        self.uncoded_error_count += 1;
    }

    fn coded_parse_error(&mut self, kind: Error) {
        self.errors.push(ParseError {
            kind,
            position: None,
        });
    }

    // scope predicates

    fn has_in_scope_by(
        &self,
        boundary: fn(Namespace, &str) -> bool,
        matches: impl Fn(&Self, NodeId) -> bool,
    ) -> bool {
        for &node in self.stack_of_open_elements.iter().rev() {
            if matches(self, node) {
                return true;
            }
            let (namespace, name) = self.elem_name(node);
            if boundary(namespace, name) {
                return false;
            }
        }
        false
    }

    pub(crate) fn has_element_in_scope(&self, name: &str) -> bool {
        self.has_in_scope_by(scopes::default_scope, |slf, node| {
            slf.is_html_element(node, name)
        })
    }

    pub(crate) fn has_node_in_scope(&self, target: NodeId) -> bool {
        self.has_in_scope_by(scopes::default_scope, |_, node| node == target)
    }

    fn has_element_in_button_scope(&self, name: &str) -> bool {
        self.has_in_scope_by(scopes::button_scope, |slf, node| {
            slf.is_html_element(node, name)
        })
    }

    fn has_element_in_list_item_scope(&self, name: &str) -> bool {
        self.has_in_scope_by(scopes::list_item_scope, |slf, node| {
            slf.is_html_element(node, name)
        })
    }

    fn has_element_in_table_scope(&self, name: &str) -> bool {
        self.has_in_scope_by(scopes::table_scope, |slf, node| {
            slf.is_html_element(node, name)
        })
    }

    fn has_element_in_select_scope(&self, name: &str) -> bool {
        self.has_in_scope_by(scopes::select_scope, |slf, node| {
            slf.is_html_element(node, name)
        })
    }

    fn has_heading_in_scope(&self) -> bool {
        self.has_in_scope_by(scopes::default_scope, |slf, node| {
            matches!(
                slf.elem_name(node),
                (Namespace::Html, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
            )
        })
    }

    // stack manipulation

    fn pop(&mut self) -> NodeId {
        self.stack_of_open_elements
            .pop()
            .expect("no current node")
    }

    fn pop_until_html_element(&mut self, name: &str) {
        while let Some(node) = self.stack_of_open_elements.pop() {
            if self.is_html_element(node, name) {
                break;
            }
        }
    }

    fn pop_until_one_of(&mut self, names: &[&str]) {
        while let Some(node) = self.stack_of_open_elements.pop() {
            let (namespace, node_name) = self.elem_name(node);
            if namespace == Namespace::Html && names.contains(&node_name) {
                break;
            }
        }
    }

    fn pop_until_node(&mut self, target: NodeId) {
        while let Some(node) = self.stack_of_open_elements.pop() {
            if node == target {
                break;
            }
        }
    }

    pub(crate) fn remove_from_stack(&mut self, target: NodeId) {
        self.stack_of_open_elements.retain(|&node| node != target);
    }

    fn clear_stack_back_to_table_context(&mut self) {
        while let Some(&node) = self.stack_of_open_elements.last() {
            if matches!(self.elem_name(node), (Namespace::Html, "table" | "template" | "html")) {
                break;
            }
            self.stack_of_open_elements.pop();
        }
    }

    fn clear_stack_back_to_table_body_context(&mut self) {
        while let Some(&node) = self.stack_of_open_elements.last() {
            if matches!(
                self.elem_name(node),
                (
                    Namespace::Html,
                    "tbody" | "tfoot" | "thead" | "template" | "html"
                )
            ) {
                break;
            }
            self.stack_of_open_elements.pop();
        }
    }

    fn clear_stack_back_to_table_row_context(&mut self) {
        while let Some(&node) = self.stack_of_open_elements.last() {
            if matches!(self.elem_name(node), (Namespace::Html, "tr" | "template" | "html")) {
                break;
            }
            self.stack_of_open_elements.pop();
        }
    }

    // insertion

    /// The appropriate place for inserting a node: `(parent, insert before this sibling)`.
    fn appropriate_place_for_inserting_a_node(
        &self,
        override_target: Option<NodeId>,
    ) -> (NodeId, Option<NodeId>) {
        let target = override_target
            .or_else(|| self.current_node())
            .expect("no insertion target");

        if self.foster_parenting
            && matches!(
                self.elem_name(target),
                (Namespace::Html, "table" | "tbody" | "tfoot" | "thead" | "tr")
            )
        {
            let last_template = self
                .stack_of_open_elements
                .iter()
                .rposition(|&node| self.is_html_element(node, "template"));
            let last_table = self
                .stack_of_open_elements
                .iter()
                .rposition(|&node| self.is_html_element(node, "table"));

            match (last_template, last_table) {
                (Some(template_idx), table_idx)
                    if table_idx.map_or(true, |t| template_idx > t) =>
                {
                    (self.stack_of_open_elements[template_idx], None)
                }
                (_, None) => (self.stack_of_open_elements[0], None),
                (_, Some(table_idx)) => {
                    let table = self.stack_of_open_elements[table_idx];
                    match self.document.node(table).parent {
                        Some(parent) => (parent, Some(table)),
                        None => (self.stack_of_open_elements[table_idx - 1], None),
                    }
                }
            }
        } else {
            (target, None)
        }
    }

    pub(crate) fn create_element_for_token(
        &mut self,
        tag: &StartTag,
        namespace: Namespace,
    ) -> NodeId {
        self.document
            .create_element(namespace, tag.name.clone(), tag.attributes.clone())
    }

    pub(crate) fn insert_element(&mut self, node: NodeId, override_target: Option<NodeId>) {
        let (parent, before) = self.appropriate_place_for_inserting_a_node(override_target);
        match before {
            Some(reference) => self.document.insert_before(parent, node, reference),
            None => self.document.append(parent, node),
        }
    }

    pub(crate) fn insert_an_element_for_a_token(&mut self, tag: &StartTag) -> NodeId {
        self.insert_a_foreign_element(tag, Namespace::Html)
    }

    pub(crate) fn insert_a_foreign_element(
        &mut self,
        tag: &StartTag,
        namespace: Namespace,
    ) -> NodeId {
        let node = self.create_element_for_token(tag, namespace);
        self.insert_element(node, None);
        self.stack_of_open_elements.push(node);
        node
    }

    pub(crate) fn insert_a_character(&mut self, s: &str) {
        let (parent, before) = self.appropriate_place_for_inserting_a_node(None);
        match before {
            Some(reference) => self.document.insert_text_before(parent, s, reference),
            None => self.document.append_text(parent, s),
        }
    }

    fn insert_a_comment(&mut self, data: String, parent_override: Option<NodeId>) {
        let comment = self.document.create_comment(data);
        match parent_override {
            Some(parent) => self.document.append(parent, comment),
            None => self.insert_element(comment, None),
        }
    }

    // implied end tags

    fn generate_implied_end_tags(&mut self, except: Option<&str>) {
        while let Some(node) = self.current_node() {
            let (namespace, name) = self.elem_name(node);
            if namespace != Namespace::Html {
                break;
            }
            if except == Some(name) {
                break;
            }
            if matches!(
                name,
                "dd" | "dt" | "li" | "optgroup" | "option" | "p" | "rb" | "rp" | "rt" | "rtc"
            ) {
                self.stack_of_open_elements.pop();
            } else {
                break;
            }
        }
    }

    fn generate_all_implied_end_tags_thoroughly(&mut self) {
        while let Some(node) = self.current_node() {
            let (namespace, name) = self.elem_name(node);
            if namespace != Namespace::Html {
                break;
            }
            if matches!(
                name,
                "caption" | "colgroup" | "dd" | "dt" | "li" | "optgroup" | "option" | "p"
                    | "rb" | "rp" | "rt" | "rtc" | "tbody" | "td" | "tfoot" | "th" | "thead"
                    | "tr"
            ) {
                self.stack_of_open_elements.pop();
            } else {
                break;
            }
        }
    }

    fn close_a_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        if !self.current_node_is("p") {
            self.parse_error();
        }
        self.pop_until_html_element("p");
    }

    fn close_the_cell(&mut self) {
        self.generate_implied_end_tags(None);
        if !self.current_node_is("td") && !self.current_node_is("th") {
            self.parse_error();
        }
        self.pop_until_one_of(&["td", "th"]);
        self.clear_list_of_active_formatting_elements_up_to_the_last_marker();
        self.insertion_mode = InsertionMode::InRow;
    }

    // active formatting elements

    pub(crate) fn push_marker(&mut self) {
        self.list_of_active_formatting_elements
            .push(FormatEntry::Marker);
    }

    pub(crate) fn clear_list_of_active_formatting_elements_up_to_the_last_marker(&mut self) {
        while let Some(entry) = self.list_of_active_formatting_elements.pop() {
            if matches!(entry, FormatEntry::Marker) {
                break;
            }
        }
    }

    /// Push an element entry, applying the Noah's Ark clause: no more than three entries with
    /// the same name and attribute set above the last marker.
    fn push_onto_list_of_active_formatting_elements(&mut self, node: NodeId, tag: StartTag) {
        let mut matching = Vec::new();
        for (i, entry) in self.list_of_active_formatting_elements.iter().enumerate().rev() {
            match entry {
                FormatEntry::Marker => break,
                FormatEntry::Element {
                    tag: existing_tag, ..
                } => {
                    if existing_tag.name == tag.name
                        && attribute_lists_equal(&existing_tag.attributes, &tag.attributes)
                    {
                        matching.push(i);
                    }
                }
            }
        }
        if matching.len() >= 3 {
            // matching is collected in reverse order, so the last element is the earliest entry
            self.list_of_active_formatting_elements
                .remove(*matching.last().unwrap());
        }
        self.list_of_active_formatting_elements
            .push(FormatEntry::Element { node, tag });
    }

    pub(crate) fn active_formatting_position(&self, node: NodeId) -> Option<usize> {
        self.list_of_active_formatting_elements
            .iter()
            .position(|entry| matches!(entry, FormatEntry::Element { node: n, .. } if *n == node))
    }

    pub(crate) fn reconstruct_the_active_formatting_elements(&mut self) {
        let last = match self.list_of_active_formatting_elements.last() {
            None => return,
            Some(FormatEntry::Marker) => return,
            Some(FormatEntry::Element { node, .. }) => *node,
        };
        if self.stack_of_open_elements.contains(&last) {
            return;
        }

        // rewind to the first entry that is a marker or still open
        let mut entry_index = self.list_of_active_formatting_elements.len() - 1;
        loop {
            if entry_index == 0 {
                break;
            }
            match self.list_of_active_formatting_elements[entry_index - 1] {
                FormatEntry::Marker => break,
                FormatEntry::Element { node, .. } => {
                    if self.stack_of_open_elements.contains(&node) {
                        break;
                    }
                }
            }
            entry_index -= 1;
        }

        while entry_index < self.list_of_active_formatting_elements.len() {
            let tag = match &self.list_of_active_formatting_elements[entry_index] {
                FormatEntry::Element { tag, .. } => tag.clone(),
                FormatEntry::Marker => unreachable!("rewind stopped at a marker"),
            };
            let new_node = self.insert_an_element_for_a_token(&tag);
            self.list_of_active_formatting_elements[entry_index] = FormatEntry::Element {
                node: new_node,
                tag,
            };
            entry_index += 1;
        }
    }

    // mode plumbing

    fn reprocess_token(&mut self, token: Option<Token>) {
        self.process_token_via_insertion_mode(self.insertion_mode, token);
    }

    fn process_token_using_the_rules_for(&mut self, mode: InsertionMode, token: Option<Token>) {
        self.process_token_via_insertion_mode(mode, token);
    }

    pub(crate) fn reset_the_insertion_mode_appropriately(&mut self) {
        for (i, &node) in self.stack_of_open_elements.iter().enumerate().rev() {
            let last = i == 0;
            let node = if last {
                self.context_element.unwrap_or(node)
            } else {
                node
            };
            let (namespace, name) = self.elem_name(node);
            if namespace != Namespace::Html {
                if last {
                    self.insertion_mode = InsertionMode::InBody;
                    return;
                }
                continue;
            }
            match name {
                "select" => {
                    if !last {
                        for &ancestor in self.stack_of_open_elements[..i].iter().rev() {
                            if self.is_html_element(ancestor, "template") {
                                break;
                            }
                            if self.is_html_element(ancestor, "table") {
                                self.insertion_mode = InsertionMode::InSelectInTable;
                                return;
                            }
                        }
                    }
                    self.insertion_mode = InsertionMode::InSelect;
                    return;
                }
                "td" | "th" if !last => {
                    self.insertion_mode = InsertionMode::InCell;
                    return;
                }
                "tr" => {
                    self.insertion_mode = InsertionMode::InRow;
                    return;
                }
                "tbody" | "thead" | "tfoot" => {
                    self.insertion_mode = InsertionMode::InTableBody;
                    return;
                }
                "caption" => {
                    self.insertion_mode = InsertionMode::InCaption;
                    return;
                }
                "colgroup" => {
                    self.insertion_mode = InsertionMode::InColumnGroup;
                    return;
                }
                "table" => {
                    self.insertion_mode = InsertionMode::InTable;
                    return;
                }
                "template" => {
                    self.insertion_mode = *self
                        .stack_of_template_insertion_modes
                        .last()
                        .expect("template on stack without template insertion mode");
                    return;
                }
                "head" if !last => {
                    self.insertion_mode = InsertionMode::InHead;
                    return;
                }
                "body" => {
                    self.insertion_mode = InsertionMode::InBody;
                    return;
                }
                "frameset" => {
                    self.insertion_mode = InsertionMode::InFrameset;
                    return;
                }
                "html" => {
                    self.insertion_mode = if self.head_element_pointer.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    };
                    return;
                }
                _ => {
                    if last {
                        self.insertion_mode = InsertionMode::InBody;
                        return;
                    }
                }
            }
        }
        self.insertion_mode = InsertionMode::InBody;
    }

    fn stop_parsing(&mut self) {
        self.stack_of_open_elements.clear();
    }

    // raw text / RCDATA

    fn generic_rawtext_element_parsing_algorithm(&mut self, tag: &StartTag) {
        self.insert_an_element_for_a_token(tag);
        self.tokenizer.set_state(State::RawText);
        self.original_insertion_mode = Some(self.insertion_mode);
        self.insertion_mode = InsertionMode::Text;
    }

    fn generic_rcdata_element_parsing_algorithm(&mut self, tag: &StartTag) {
        self.insert_an_element_for_a_token(tag);
        self.tokenizer.set_state(State::RcData);
        self.original_insertion_mode = Some(self.insertion_mode);
        self.insertion_mode = InsertionMode::Text;
    }

    // dispatch

    fn process_token(&mut self, token: Option<Token>) {
        let self_closing_tag_name = match token {
            Some(Token::StartTag(ref tag)) if tag.self_closing => Some(tag.name.clone()),
            _ => None,
        };

        let use_html_rules = match self.adjusted_current_node() {
            None => true,
            Some(node) => {
                let (namespace, name) = {
                    let (ns, n) = self.elem_name(node);
                    (ns, n.to_owned())
                };
                namespace == Namespace::Html
                    || token.is_none()
                    || (scopes::mathml_text_integration_point(namespace, &name)
                        && matches!(
                            token,
                            Some(Token::StartTag(ref tag))
                                if !matches!(tag.name.as_str(), "mglyph" | "malignmark")
                        ))
                    || (scopes::mathml_text_integration_point(namespace, &name)
                        && matches!(token, Some(Token::String(_))))
                    || (namespace == Namespace::MathMl
                        && name == "annotation-xml"
                        && matches!(token, Some(Token::StartTag(ref tag)) if tag.name == "svg"))
                    || (scopes::svg_html_integration_point(namespace, &name)
                        && matches!(token, Some(Token::StartTag(_) | Token::String(_))))
            }
        };

        if use_html_rules {
            self.process_token_via_insertion_mode(self.insertion_mode, token);
            // a self-closing flag the in-html handlers leave unacknowledged is an error
            if let Some(name) = self_closing_tag_name {
                if !html_handlers_acknowledge_self_closing(&name) {
                    self.coded_parse_error(Error::NonVoidHtmlElementStartTagWithTrailingSolidus);
                }
            }
        } else {
            // foreign-content insertion always honors the self-closing flag
            self.process_token_via_foreign_content(token);
        }
    }

    fn process_token_via_insertion_mode(
        &mut self,
        insertion_mode: InsertionMode,
        mut token: Option<Token>,
    ) {
        match insertion_mode {
            InsertionMode::Initial => {
                skip_over_whitespace!(self, token);
                match token {
                    Some(Token::Comment(data)) => {
                        let root = self.document.root();
                        self.insert_a_comment(data, Some(root));
                    }
                    Some(Token::Doctype(doctype)) => {
                        if doctype.name != "html"
                            || doctype.public_identifier.is_some()
                            || matches!(doctype.system_identifier, Some(ref x) if x != "about:legacy-compat")
                        {
                            self.parse_error();
                        }

                        if doctype_is_quirky(&doctype) {
                            self.document.quirks_mode = QuirksMode::Quirks;
                        } else if doctype_is_limited_quirky(&doctype) {
                            self.document.quirks_mode = QuirksMode::LimitedQuirks;
                        }

                        let node = self.document.create_doctype(
                            doctype.name,
                            doctype.public_identifier.unwrap_or_default(),
                            doctype.system_identifier.unwrap_or_default(),
                        );
                        let root = self.document.root();
                        self.document.append(root, node);
                        self.insertion_mode = InsertionMode::BeforeHtml;
                    }
                    token => {
                        self.parse_error();
                        self.document.quirks_mode = QuirksMode::Quirks;
                        self.insertion_mode = InsertionMode::BeforeHtml;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::BeforeHtml => {
                skip_over_whitespace!(self, token);
                match token {
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::Comment(data)) => {
                        let root = self.document.root();
                        self.insert_a_comment(data, Some(root));
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        let node = self.create_element_for_token(tag, Namespace::Html);
                        let root = self.document.root();
                        self.document.append(root, node);
                        self.stack_of_open_elements.push(node);
                        self.insertion_mode = InsertionMode::BeforeHead;
                    }
                    Some(Token::EndTag(ref tag))
                        if !matches!(tag.name.as_str(), "head" | "body" | "html" | "br") =>
                    {
                        self.parse_error();
                    }
                    token => {
                        let tag = synthetic_tag("html");
                        let node = self.create_element_for_token(&tag, Namespace::Html);
                        let root = self.document.root();
                        self.document.append(root, node);
                        self.stack_of_open_elements.push(node);
                        self.insertion_mode = InsertionMode::BeforeHead;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::BeforeHead => {
                skip_over_whitespace!(self, token);
                match token {
                    Some(Token::Comment(data)) => {
                        self.insert_a_comment(data, None);
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "head" => {
                        let node = self.insert_an_element_for_a_token(tag);
                        self.head_element_pointer = Some(node);
                        self.insertion_mode = InsertionMode::InHead;
                    }
                    Some(Token::EndTag(ref tag))
                        if !matches!(tag.name.as_str(), "head" | "body" | "html" | "br") =>
                    {
                        self.parse_error();
                    }
                    token => {
                        let node = self.insert_an_element_for_a_token(&synthetic_tag("head"));
                        self.head_element_pointer = Some(node);
                        self.insertion_mode = InsertionMode::InHead;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::InHead => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.insert_a_character(&prefix);
                });
                match token {
                    Some(Token::Comment(data)) => {
                        self.insert_a_comment(data, None);
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::StartTag(ref tag))
                        if matches!(tag.name.as_str(), "base" | "basefont" | "bgsound" | "link" | "meta") =>
                    {
                        self.insert_an_element_for_a_token(tag);
                        self.pop();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "title" => {
                        self.generic_rcdata_element_parsing_algorithm(tag);
                    }
                    Some(Token::StartTag(ref tag))
                        if matches!(tag.name.as_str(), "noframes" | "style")
                            || (tag.name == "noscript" && self.scripting) =>
                    {
                        self.generic_rawtext_element_parsing_algorithm(tag);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "noscript" => {
                        self.insert_an_element_for_a_token(tag);
                        self.insertion_mode = InsertionMode::InHeadNoscript;
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "script" => {
                        self.insert_an_element_for_a_token(tag);
                        self.tokenizer.set_state(State::ScriptData);
                        self.original_insertion_mode = Some(self.insertion_mode);
                        self.insertion_mode = InsertionMode::Text;
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "head" => {
                        let head = self.pop();
                        debug_assert!(self.is_html_element(head, "head"));
                        self.insertion_mode = InsertionMode::AfterHead;
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "template" => {
                        self.insert_an_element_for_a_token(tag);
                        self.push_marker();
                        self.frameset_ok = false;
                        self.insertion_mode = InsertionMode::InTemplate;
                        self.stack_of_template_insertion_modes
                            .push(InsertionMode::InTemplate);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                        if !self.stack_has_template() {
                            self.parse_error();
                            return;
                        }
                        self.generate_all_implied_end_tags_thoroughly();
                        if !self.current_node_is("template") {
                            self.parse_error();
                        }
                        self.pop_until_html_element("template");
                        self.clear_list_of_active_formatting_elements_up_to_the_last_marker();
                        self.stack_of_template_insertion_modes.pop();
                        self.reset_the_insertion_mode_appropriately();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "head" => {
                        self.parse_error();
                    }
                    Some(Token::EndTag(ref tag))
                        if !matches!(tag.name.as_str(), "body" | "html" | "br") =>
                    {
                        self.parse_error();
                    }
                    token => {
                        let head = self.pop();
                        debug_assert!(self.is_html_element(head, "head"));
                        self.insertion_mode = InsertionMode::AfterHead;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::InHeadNoscript => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.process_token_using_the_rules_for(
                        InsertionMode::InHead,
                        Some(Token::String(prefix)),
                    );
                });
                match token {
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "noscript" => {
                        let node = self.pop();
                        debug_assert!(self.is_html_element(node, "noscript"));
                        debug_assert!(self.current_node_is("head"));
                        self.insertion_mode = InsertionMode::InHead;
                    }
                    Some(Token::Comment(_)) => {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    Some(Token::StartTag(ref tag))
                        if matches!(
                            tag.name.as_str(),
                            "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style"
                        ) =>
                    {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    Some(Token::StartTag(ref tag))
                        if matches!(tag.name.as_str(), "head" | "noscript") =>
                    {
                        self.parse_error();
                    }
                    Some(Token::EndTag(ref tag)) if tag.name != "br" => {
                        self.parse_error();
                    }
                    token => {
                        self.parse_error();
                        self.pop();
                        debug_assert!(self.current_node_is("head"));
                        self.insertion_mode = InsertionMode::InHead;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::AfterHead => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.insert_a_character(&prefix);
                });
                match token {
                    Some(Token::Comment(data)) => {
                        self.insert_a_comment(data, None);
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "body" => {
                        self.insert_an_element_for_a_token(tag);
                        self.frameset_ok = false;
                        self.insertion_mode = InsertionMode::InBody;
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "frameset" => {
                        self.insert_an_element_for_a_token(tag);
                        self.insertion_mode = InsertionMode::InFrameset;
                    }
                    Some(Token::StartTag(ref tag))
                        if matches!(
                            tag.name.as_str(),
                            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes"
                                | "script" | "style" | "template" | "title"
                        ) =>
                    {
                        self.parse_error();
                        let head = self
                            .head_element_pointer
                            .expect("after head without head element");
                        self.stack_of_open_elements.push(head);
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                        self.remove_from_stack(head);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "head" => {
                        self.parse_error();
                    }
                    Some(Token::EndTag(ref tag))
                        if !matches!(tag.name.as_str(), "body" | "html" | "br") =>
                    {
                        self.parse_error();
                    }
                    token => {
                        self.insert_an_element_for_a_token(&synthetic_tag("body"));
                        self.insertion_mode = InsertionMode::InBody;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::InBody => self.process_token_in_body(token),
            InsertionMode::Text => match token {
                Some(Token::String(s)) => {
                    self.insert_a_character(&s);
                }
                None => {
                    self.parse_error();
                    self.pop();
                    self.insertion_mode = self
                        .original_insertion_mode
                        .take()
                        .expect("text mode without original insertion mode");
                    self.reprocess_token(token);
                }
                Some(Token::EndTag(_)) => {
                    self.pop();
                    self.insertion_mode = self
                        .original_insertion_mode
                        .take()
                        .expect("text mode without original insertion mode");
                }
                _ => unreachable!("only characters and end tags can be tokenized in text mode"),
            },
            InsertionMode::InTable => match token {
                Some(Token::String(_))
                    if self.current_node().map_or(false, |node| {
                        matches!(
                            self.elem_name(node),
                            (
                                Namespace::Html,
                                "table" | "tbody" | "template" | "tfoot" | "thead" | "tr"
                            )
                        )
                    }) =>
                {
                    self.pending_table_character_tokens.clear();
                    self.original_insertion_mode = Some(self.insertion_mode);
                    self.insertion_mode = InsertionMode::InTableText;
                    self.reprocess_token(token);
                }
                Some(Token::Comment(data)) => {
                    self.insert_a_comment(data, None);
                }
                Some(Token::Doctype(_)) => {
                    self.parse_error();
                }
                Some(Token::StartTag(ref tag)) if tag.name == "caption" => {
                    self.clear_stack_back_to_table_context();
                    self.push_marker();
                    self.insert_an_element_for_a_token(tag);
                    self.insertion_mode = InsertionMode::InCaption;
                }
                Some(Token::StartTag(ref tag)) if tag.name == "colgroup" => {
                    self.clear_stack_back_to_table_context();
                    self.insert_an_element_for_a_token(tag);
                    self.insertion_mode = InsertionMode::InColumnGroup;
                }
                Some(Token::StartTag(ref tag)) if tag.name == "col" => {
                    self.clear_stack_back_to_table_context();
                    self.insert_an_element_for_a_token(&synthetic_tag("colgroup"));
                    self.insertion_mode = InsertionMode::InColumnGroup;
                    self.reprocess_token(token);
                }
                Some(Token::StartTag(ref tag))
                    if matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
                {
                    self.clear_stack_back_to_table_context();
                    self.insert_an_element_for_a_token(tag);
                    self.insertion_mode = InsertionMode::InTableBody;
                }
                Some(Token::StartTag(ref tag))
                    if matches!(tag.name.as_str(), "td" | "th" | "tr") =>
                {
                    self.clear_stack_back_to_table_context();
                    self.insert_an_element_for_a_token(&synthetic_tag("tbody"));
                    self.insertion_mode = InsertionMode::InTableBody;
                    self.reprocess_token(token);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "table" => {
                    self.parse_error();
                    if self.has_element_in_table_scope("table") {
                        self.pop_until_html_element("table");
                        self.reset_the_insertion_mode_appropriately();
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag)) if tag.name == "table" => {
                    if !self.has_element_in_table_scope("table") {
                        self.parse_error();
                    } else {
                        self.pop_until_html_element("table");
                        self.reset_the_insertion_mode_appropriately();
                    }
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td"
                            | "tfoot" | "th" | "thead" | "tr"
                    ) =>
                {
                    self.parse_error();
                }
                Some(Token::StartTag(ref tag))
                    if matches!(tag.name.as_str(), "style" | "script" | "template") =>
                {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                Some(Token::StartTag(ref tag))
                    if tag.name == "input"
                        && tag
                            .attributes
                            .get("type")
                            .map_or(false, |v| v.eq_ignore_ascii_case("hidden")) =>
                {
                    self.parse_error();
                    self.insert_an_element_for_a_token(tag);
                    self.pop();
                }
                Some(Token::StartTag(ref tag)) if tag.name == "form" => {
                    self.parse_error();
                    if !self.stack_has_template() && self.form_element_pointer.is_none() {
                        let node = self.insert_an_element_for_a_token(tag);
                        self.pop();
                        self.form_element_pointer = Some(node);
                    }
                }
                None => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                token => {
                    self.parse_error();
                    self.foster_parenting = true;
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    self.foster_parenting = false;
                }
            },
            InsertionMode::InTableText => match token {
                Some(Token::String(s)) => {
                    for c in s.chars() {
                        if c == '\0' {
                            self.parse_error();
                        } else {
                            self.pending_table_character_tokens.push(c);
                        }
                    }
                }
                token => {
                    let pending = std::mem::take(&mut self.pending_table_character_tokens);
                    if pending
                        .chars()
                        .any(|c| !matches!(c, '\t' | '\n' | '\u{c}' | '\r' | ' '))
                    {
                        self.parse_error();
                        self.foster_parenting = true;
                        self.process_token_using_the_rules_for(
                            InsertionMode::InBody,
                            Some(Token::String(pending)),
                        );
                        self.foster_parenting = false;
                    } else if !pending.is_empty() {
                        self.insert_a_character(&pending);
                    }
                    self.insertion_mode = self
                        .original_insertion_mode
                        .take()
                        .expect("in table text without original insertion mode");
                    self.reprocess_token(token);
                }
            },
            InsertionMode::InCaption => match token {
                Some(Token::EndTag(ref tag)) if tag.name == "caption" => {
                    self.close_the_caption();
                }
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th"
                            | "thead" | "tr"
                    ) =>
                {
                    if self.close_the_caption() {
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag)) if tag.name == "table" => {
                    if self.close_the_caption() {
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th"
                            | "thead" | "tr"
                    ) =>
                {
                    self.parse_error();
                }
                _ => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
            },
            InsertionMode::InColumnGroup => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.insert_a_character(&prefix);
                });
                match token {
                    Some(Token::Comment(data)) => {
                        self.insert_a_comment(data, None);
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "col" => {
                        self.insert_an_element_for_a_token(tag);
                        self.pop();
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "colgroup" => {
                        if !self.current_node_is("colgroup") {
                            self.parse_error();
                        } else {
                            self.pop();
                            self.insertion_mode = InsertionMode::InTable;
                        }
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "col" => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "template" => {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    None => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    token => {
                        if !self.current_node_is("colgroup") {
                            self.parse_error();
                        } else {
                            self.pop();
                            self.insertion_mode = InsertionMode::InTable;
                            self.reprocess_token(token);
                        }
                    }
                }
            }
            InsertionMode::InTableBody => match token {
                Some(Token::StartTag(ref tag)) if tag.name == "tr" => {
                    self.clear_stack_back_to_table_body_context();
                    self.insert_an_element_for_a_token(tag);
                    self.insertion_mode = InsertionMode::InRow;
                }
                Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "th" | "td") => {
                    self.parse_error();
                    self.clear_stack_back_to_table_body_context();
                    self.insert_an_element_for_a_token(&synthetic_tag("tr"));
                    self.insertion_mode = InsertionMode::InRow;
                    self.reprocess_token(token);
                }
                Some(Token::EndTag(ref tag))
                    if matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
                {
                    if !self.has_element_in_table_scope(&tag.name) {
                        self.parse_error();
                    } else {
                        self.clear_stack_back_to_table_body_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTable;
                    }
                }
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead"
                    ) =>
                {
                    if !self.has_element_in_table_scope("tbody")
                        && !self.has_element_in_table_scope("thead")
                        && !self.has_element_in_table_scope("tfoot")
                    {
                        self.parse_error();
                    } else {
                        self.clear_stack_back_to_table_body_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTable;
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag)) if tag.name == "table" => {
                    if !self.has_element_in_table_scope("tbody")
                        && !self.has_element_in_table_scope("thead")
                        && !self.has_element_in_table_scope("tfoot")
                    {
                        self.parse_error();
                    } else {
                        self.clear_stack_back_to_table_body_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTable;
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr"
                    ) =>
                {
                    self.parse_error();
                }
                _ => {
                    self.process_token_using_the_rules_for(InsertionMode::InTable, token);
                }
            },
            InsertionMode::InRow => match token {
                Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "th" | "td") => {
                    self.clear_stack_back_to_table_row_context();
                    self.insert_an_element_for_a_token(tag);
                    self.insertion_mode = InsertionMode::InCell;
                    self.push_marker();
                }
                Some(Token::EndTag(ref tag)) if tag.name == "tr" => {
                    if !self.has_element_in_table_scope("tr") {
                        self.parse_error();
                    } else {
                        self.clear_stack_back_to_table_row_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTableBody;
                    }
                }
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr"
                    ) =>
                {
                    if !self.has_element_in_table_scope("tr") {
                        self.parse_error();
                    } else {
                        self.clear_stack_back_to_table_row_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTableBody;
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag)) if tag.name == "table" => {
                    if !self.has_element_in_table_scope("tr") {
                        self.parse_error();
                    } else {
                        self.clear_stack_back_to_table_row_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTableBody;
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag))
                    if matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
                {
                    if !self.has_element_in_table_scope(&tag.name) {
                        self.parse_error();
                    } else if !self.has_element_in_table_scope("tr") {
                        // ignore the token
                    } else {
                        self.clear_stack_back_to_table_row_context();
                        self.pop();
                        self.insertion_mode = InsertionMode::InTableBody;
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th"
                    ) =>
                {
                    self.parse_error();
                }
                _ => {
                    self.process_token_using_the_rules_for(InsertionMode::InTable, token);
                }
            },
            InsertionMode::InCell => match token {
                Some(Token::EndTag(ref tag)) if matches!(tag.name.as_str(), "td" | "th") => {
                    if !self.has_element_in_table_scope(&tag.name) {
                        self.parse_error();
                    } else {
                        self.generate_implied_end_tags(None);
                        if !self.current_node_is(&tag.name) {
                            self.parse_error();
                        }
                        self.pop_until_html_element(&tag.name);
                        self.clear_list_of_active_formatting_elements_up_to_the_last_marker();
                        self.insertion_mode = InsertionMode::InRow;
                    }
                }
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th"
                            | "thead" | "tr"
                    ) =>
                {
                    if !self.has_element_in_table_scope("td")
                        && !self.has_element_in_table_scope("th")
                    {
                        self.parse_error();
                    } else {
                        self.close_the_cell();
                        self.reprocess_token(token);
                    }
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "body" | "caption" | "col" | "colgroup" | "html"
                    ) =>
                {
                    self.parse_error();
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "table" | "tbody" | "tfoot" | "thead" | "tr"
                    ) =>
                {
                    if !self.has_element_in_table_scope(&tag.name) {
                        self.parse_error();
                    } else {
                        self.close_the_cell();
                        self.reprocess_token(token);
                    }
                }
                _ => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
            },
            InsertionMode::InSelect => match token {
                Some(Token::String(s)) => {
                    let mut filtered = String::with_capacity(s.len());
                    for c in s.chars() {
                        if c == '\0' {
                            self.parse_error();
                        } else {
                            filtered.push(c);
                        }
                    }
                    if !filtered.is_empty() {
                        self.insert_a_character(&filtered);
                    }
                }
                Some(Token::Comment(data)) => {
                    self.insert_a_comment(data, None);
                }
                Some(Token::Doctype(_)) => {
                    self.parse_error();
                }
                Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "option" => {
                    if self.current_node_is("option") {
                        self.pop();
                    }
                    self.insert_an_element_for_a_token(tag);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "optgroup" => {
                    if self.current_node_is("option") {
                        self.pop();
                    }
                    if self.current_node_is("optgroup") {
                        self.pop();
                    }
                    self.insert_an_element_for_a_token(tag);
                }
                Some(Token::EndTag(ref tag)) if tag.name == "optgroup" => {
                    if self.current_node_is("option")
                        && self
                            .stack_of_open_elements
                            .len()
                            .checked_sub(2)
                            .and_then(|i| self.stack_of_open_elements.get(i))
                            .map_or(false, |&node| self.is_html_element(node, "optgroup"))
                    {
                        self.pop();
                    }
                    if self.current_node_is("optgroup") {
                        self.pop();
                    } else {
                        self.parse_error();
                    }
                }
                Some(Token::EndTag(ref tag)) if tag.name == "option" => {
                    if self.current_node_is("option") {
                        self.pop();
                    } else {
                        self.parse_error();
                    }
                }
                Some(Token::EndTag(ref tag)) if tag.name == "select" => {
                    if !self.has_element_in_select_scope("select") {
                        self.parse_error();
                    } else {
                        self.pop_until_html_element("select");
                        self.reset_the_insertion_mode_appropriately();
                    }
                }
                Some(Token::StartTag(ref tag)) if tag.name == "select" => {
                    self.parse_error();
                    if self.has_element_in_select_scope("select") {
                        self.pop_until_html_element("select");
                        self.reset_the_insertion_mode_appropriately();
                    }
                }
                Some(Token::StartTag(ref tag))
                    if matches!(tag.name.as_str(), "input" | "keygen" | "textarea") =>
                {
                    self.parse_error();
                    if self.has_element_in_select_scope("select") {
                        self.pop_until_html_element("select");
                        self.reset_the_insertion_mode_appropriately();
                        self.reprocess_token(token);
                    }
                }
                Some(Token::StartTag(ref tag))
                    if matches!(tag.name.as_str(), "script" | "template") =>
                {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                None => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                _ => {
                    self.parse_error();
                }
            },
            InsertionMode::InSelectInTable => match token {
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th"
                    ) =>
                {
                    self.parse_error();
                    self.pop_until_html_element("select");
                    self.reset_the_insertion_mode_appropriately();
                    self.reprocess_token(token);
                }
                Some(Token::EndTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th"
                    ) =>
                {
                    self.parse_error();
                    if self.has_element_in_table_scope(&tag.name) {
                        self.pop_until_html_element("select");
                        self.reset_the_insertion_mode_appropriately();
                        self.reprocess_token(token);
                    }
                }
                _ => {
                    self.process_token_using_the_rules_for(InsertionMode::InSelect, token);
                }
            },
            InsertionMode::InTemplate => match token {
                Some(Token::String(_)) | Some(Token::Comment(_)) | Some(Token::Doctype(_)) => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes"
                            | "script" | "style" | "template" | "title"
                    ) =>
                {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                Some(Token::StartTag(ref tag))
                    if matches!(
                        tag.name.as_str(),
                        "caption" | "colgroup" | "tbody" | "tfoot" | "thead"
                    ) =>
                {
                    self.stack_of_template_insertion_modes.pop();
                    self.stack_of_template_insertion_modes
                        .push(InsertionMode::InTable);
                    self.insertion_mode = InsertionMode::InTable;
                    self.reprocess_token(token);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "col" => {
                    self.stack_of_template_insertion_modes.pop();
                    self.stack_of_template_insertion_modes
                        .push(InsertionMode::InColumnGroup);
                    self.insertion_mode = InsertionMode::InColumnGroup;
                    self.reprocess_token(token);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "tr" => {
                    self.stack_of_template_insertion_modes.pop();
                    self.stack_of_template_insertion_modes
                        .push(InsertionMode::InTableBody);
                    self.insertion_mode = InsertionMode::InTableBody;
                    self.reprocess_token(token);
                }
                Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "td" | "th") => {
                    self.stack_of_template_insertion_modes.pop();
                    self.stack_of_template_insertion_modes
                        .push(InsertionMode::InRow);
                    self.insertion_mode = InsertionMode::InRow;
                    self.reprocess_token(token);
                }
                Some(Token::StartTag(_)) => {
                    self.stack_of_template_insertion_modes.pop();
                    self.stack_of_template_insertion_modes
                        .push(InsertionMode::InBody);
                    self.insertion_mode = InsertionMode::InBody;
                    self.reprocess_token(token);
                }
                Some(Token::EndTag(_)) => {
                    self.parse_error();
                }
                Some(Token::Error(_)) => unreachable!("errors are filtered out in run()"),
                None => {
                    if !self.stack_has_template() {
                        self.stop_parsing();
                        return;
                    }
                    self.parse_error();
                    self.pop_until_html_element("template");
                    self.clear_list_of_active_formatting_elements_up_to_the_last_marker();
                    self.stack_of_template_insertion_modes.pop();
                    self.reset_the_insertion_mode_appropriately();
                    self.reprocess_token(token);
                }
            },
            InsertionMode::AfterBody => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.process_token_using_the_rules_for(
                        InsertionMode::InBody,
                        Some(Token::String(prefix)),
                    );
                });
                match token {
                    Some(Token::Comment(data)) => {
                        let html = self.stack_of_open_elements[0];
                        self.insert_a_comment(data, Some(html));
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "html" => {
                        if self.context_element.is_some() {
                            self.parse_error();
                        } else {
                            self.insertion_mode = InsertionMode::AfterAfterBody;
                        }
                    }
                    None => {
                        self.stop_parsing();
                    }
                    token => {
                        self.parse_error();
                        self.insertion_mode = InsertionMode::InBody;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::InFrameset => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.insert_a_character(&prefix);
                });
                match token {
                    Some(Token::Comment(data)) => {
                        self.insert_a_comment(data, None);
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "frameset" => {
                        self.insert_an_element_for_a_token(tag);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "frameset" => {
                        if self.current_node_is("html") {
                            self.parse_error();
                        } else {
                            self.pop();
                            if self.context_element.is_none()
                                && !self.current_node_is("frameset")
                            {
                                self.insertion_mode = InsertionMode::AfterFrameset;
                            }
                        }
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "frame" => {
                        self.insert_an_element_for_a_token(tag);
                        self.pop();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "noframes" => {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    None => {
                        if !self.current_node_is("html") {
                            self.parse_error();
                        }
                        self.stop_parsing();
                    }
                    _ => {
                        self.parse_error();
                    }
                }
            }
            InsertionMode::AfterFrameset => {
                handle_whitespace_prefix!(self, token, |slf: &mut Self, prefix: String| {
                    slf.insert_a_character(&prefix);
                });
                match token {
                    Some(Token::Comment(data)) => {
                        self.insert_a_comment(data, None);
                    }
                    Some(Token::Doctype(_)) => {
                        self.parse_error();
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::EndTag(ref tag)) if tag.name == "html" => {
                        self.insertion_mode = InsertionMode::AfterAfterFrameset;
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "noframes" => {
                        self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                    }
                    None => {
                        self.stop_parsing();
                    }
                    _ => {
                        self.parse_error();
                    }
                }
            }
            InsertionMode::AfterAfterBody => {
                match token {
                    Some(Token::Comment(data)) => {
                        let root = self.document.root();
                        self.insert_a_comment(data, Some(root));
                    }
                    Some(Token::Doctype(_)) => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::String(ref s))
                        if s.chars().all(|c| matches!(c, '\t' | '\n' | '\u{c}' | ' ')) =>
                    {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                        self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                    }
                    None => {
                        self.stop_parsing();
                    }
                    token => {
                        self.parse_error();
                        self.insertion_mode = InsertionMode::InBody;
                        self.reprocess_token(token);
                    }
                }
            }
            InsertionMode::AfterAfterFrameset => match token {
                Some(Token::Comment(data)) => {
                    let root = self.document.root();
                    self.insert_a_comment(data, Some(root));
                }
                Some(Token::Doctype(_)) => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                Some(Token::String(ref s))
                    if s.chars().all(|c| matches!(c, '\t' | '\n' | '\u{c}' | ' ')) =>
                {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                    self.process_token_using_the_rules_for(InsertionMode::InBody, token);
                }
                Some(Token::StartTag(ref tag)) if tag.name == "noframes" => {
                    self.process_token_using_the_rules_for(InsertionMode::InHead, token);
                }
                None => {
                    self.stop_parsing();
                }
                _ => {
                    self.parse_error();
                }
            },
        }
    }

    fn close_the_caption(&mut self) -> bool {
        if !self.has_element_in_table_scope("caption") {
            self.parse_error();
            false
        } else {
            self.generate_implied_end_tags(None);
            if !self.current_node_is("caption") {
                self.parse_error();
            }
            self.pop_until_html_element("caption");
            self.clear_list_of_active_formatting_elements_up_to_the_last_marker();
            self.insertion_mode = InsertionMode::InTable;
            true
        }
    }

    // the "in body" insertion mode is by far the largest; it gets its own function

    fn process_token_in_body(&mut self, token: Option<Token>) {
        match token {
            Some(Token::String(s)) => {
                let mut filtered = String::with_capacity(s.len());
                for c in s.chars() {
                    if c == '\0' {
                        self.parse_error();
                    } else {
                        filtered.push(c);
                    }
                }
                if filtered.is_empty() {
                    return;
                }
                self.reconstruct_the_active_formatting_elements();
                self.insert_a_character(&filtered);
                if filtered
                    .chars()
                    .any(|c| !matches!(c, '\t' | '\n' | '\u{c}' | '\r' | ' '))
                {
                    self.frameset_ok = false;
                }
            }
            Some(Token::Comment(data)) => {
                self.insert_a_comment(data, None);
            }
            Some(Token::Doctype(_)) => {
                self.parse_error();
            }
            Some(Token::StartTag(ref tag)) if tag.name == "html" => {
                self.parse_error();
                if !self.stack_has_template() {
                    let html = self.stack_of_open_elements[0];
                    self.merge_attributes_into(tag, html);
                }
            }
            Some(Token::StartTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                        | "style" | "template" | "title"
                ) =>
            {
                self.process_token_using_the_rules_for(InsertionMode::InHead, token);
            }
            Some(Token::EndTag(ref tag)) if tag.name == "template" => {
                self.process_token_using_the_rules_for(InsertionMode::InHead, token);
            }
            Some(Token::StartTag(ref tag)) if tag.name == "body" => {
                self.parse_error();
                if self.stack_of_open_elements.len() > 1
                    && self
                        .stack_of_open_elements
                        .get(1)
                        .map_or(false, |&node| self.is_html_element(node, "body"))
                    && !self.stack_has_template()
                {
                    self.frameset_ok = false;
                    let body = self.stack_of_open_elements[1];
                    self.merge_attributes_into(tag, body);
                }
            }
            Some(Token::StartTag(ref tag)) if tag.name == "frameset" => {
                self.parse_error();
                let second_is_body = self
                    .stack_of_open_elements
                    .get(1)
                    .map_or(false, |&node| self.is_html_element(node, "body"));
                if self.stack_of_open_elements.len() > 1 && second_is_body && self.frameset_ok {
                    let body = self.stack_of_open_elements[1];
                    self.document.remove_from_parent(body);
                    self.stack_of_open_elements.truncate(1);
                    self.insert_an_element_for_a_token(tag);
                    self.insertion_mode = InsertionMode::InFrameset;
                }
            }
            None => {
                if !self.stack_of_template_insertion_modes.is_empty() {
                    self.process_token_using_the_rules_for(InsertionMode::InTemplate, token);
                } else {
                    self.report_unclosed_elements();
                    self.stop_parsing();
                }
            }
            Some(Token::EndTag(ref tag)) if tag.name == "body" => {
                if !self.has_element_in_scope("body") {
                    self.parse_error();
                } else {
                    self.report_unclosed_elements();
                    self.insertion_mode = InsertionMode::AfterBody;
                }
            }
            Some(Token::EndTag(ref tag)) if tag.name == "html" => {
                if !self.has_element_in_scope("body") {
                    self.parse_error();
                } else {
                    self.report_unclosed_elements();
                    self.insertion_mode = InsertionMode::AfterBody;
                    self.reprocess_token(token);
                }
            }
            Some(Token::StartTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "address" | "article" | "aside" | "blockquote" | "center" | "details"
                        | "dialog" | "dir" | "div" | "dl" | "fieldset" | "figcaption"
                        | "figure" | "footer" | "header" | "hgroup" | "main" | "menu" | "nav"
                        | "ol" | "p" | "section" | "summary" | "ul"
                ) =>
            {
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(ref tag))
                if matches!(tag.name.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6") =>
            {
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                if self.current_node().map_or(false, |node| {
                    matches!(
                        self.elem_name(node),
                        (Namespace::Html, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                    )
                }) {
                    self.parse_error();
                    self.pop();
                }
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "pre" | "listing") => {
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
                self.ignore_lf = true;
                self.frameset_ok = false;
            }
            Some(Token::StartTag(ref tag)) if tag.name == "form" => {
                if self.form_element_pointer.is_some() && !self.stack_has_template() {
                    self.parse_error();
                } else {
                    if self.has_element_in_button_scope("p") {
                        self.close_a_p_element();
                    }
                    let node = self.insert_an_element_for_a_token(tag);
                    if !self.stack_has_template() {
                        self.form_element_pointer = Some(node);
                    }
                }
            }
            Some(Token::StartTag(ref tag)) if tag.name == "li" => {
                self.frameset_ok = false;
                for i in (0..self.stack_of_open_elements.len()).rev() {
                    let node = self.stack_of_open_elements[i];
                    if self.is_html_element(node, "li") {
                        self.generate_implied_end_tags(Some("li"));
                        if !self.current_node_is("li") {
                            self.parse_error();
                        }
                        self.pop_until_html_element("li");
                        break;
                    }
                    let (namespace, name) = {
                        let (ns, n) = self.elem_name(node);
                        (ns, n.to_owned())
                    };
                    if scopes::special(namespace, &name)
                        && !matches!(name.as_str(), "address" | "div" | "p")
                    {
                        break;
                    }
                }
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "dd" | "dt") => {
                self.frameset_ok = false;
                for i in (0..self.stack_of_open_elements.len()).rev() {
                    let node = self.stack_of_open_elements[i];
                    if self.is_html_element(node, "dd") {
                        self.generate_implied_end_tags(Some("dd"));
                        if !self.current_node_is("dd") {
                            self.parse_error();
                        }
                        self.pop_until_html_element("dd");
                        break;
                    }
                    if self.is_html_element(node, "dt") {
                        self.generate_implied_end_tags(Some("dt"));
                        if !self.current_node_is("dt") {
                            self.parse_error();
                        }
                        self.pop_until_html_element("dt");
                        break;
                    }
                    let (namespace, name) = {
                        let (ns, n) = self.elem_name(node);
                        (ns, n.to_owned())
                    };
                    if scopes::special(namespace, &name)
                        && !matches!(name.as_str(), "address" | "div" | "p")
                    {
                        break;
                    }
                }
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(ref tag)) if tag.name == "plaintext" => {
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
                self.tokenizer.set_plaintext_state();
            }
            Some(Token::StartTag(ref tag)) if tag.name == "button" => {
                if self.has_element_in_scope("button") {
                    self.parse_error();
                    self.generate_implied_end_tags(None);
                    self.pop_until_html_element("button");
                }
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
                self.frameset_ok = false;
            }
            Some(Token::EndTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "address" | "article" | "aside" | "blockquote" | "button" | "center"
                        | "details" | "dialog" | "dir" | "div" | "dl" | "fieldset"
                        | "figcaption" | "figure" | "footer" | "header" | "hgroup" | "listing"
                        | "main" | "menu" | "nav" | "ol" | "pre" | "section" | "summary" | "ul"
                ) =>
            {
                if !self.has_element_in_scope(&tag.name) {
                    self.parse_error();
                } else {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is(&tag.name) {
                        self.parse_error();
                    }
                    self.pop_until_html_element(&tag.name);
                }
            }
            Some(Token::EndTag(ref tag)) if tag.name == "form" => {
                if !self.stack_has_template() {
                    let node = self.form_element_pointer.take();
                    match node {
                        Some(node) if self.has_node_in_scope(node) => {
                            self.generate_implied_end_tags(None);
                            if self.current_node() != Some(node) {
                                self.parse_error();
                            }
                            self.remove_from_stack(node);
                        }
                        _ => {
                            self.parse_error();
                        }
                    }
                } else if !self.has_element_in_scope("form") {
                    self.parse_error();
                } else {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is("form") {
                        self.parse_error();
                    }
                    self.pop_until_html_element("form");
                }
            }
            Some(Token::EndTag(ref tag)) if tag.name == "p" => {
                if !self.has_element_in_button_scope("p") {
                    self.parse_error();
                    self.insert_an_element_for_a_token(&synthetic_tag("p"));
                }
                self.close_a_p_element();
            }
            Some(Token::EndTag(ref tag)) if tag.name == "li" => {
                if !self.has_element_in_list_item_scope("li") {
                    self.parse_error();
                } else {
                    self.generate_implied_end_tags(Some("li"));
                    if !self.current_node_is("li") {
                        self.parse_error();
                    }
                    self.pop_until_html_element("li");
                }
            }
            Some(Token::EndTag(ref tag)) if matches!(tag.name.as_str(), "dd" | "dt") => {
                if !self.has_element_in_scope(&tag.name) {
                    self.parse_error();
                } else {
                    self.generate_implied_end_tags(Some(&tag.name));
                    if !self.current_node_is(&tag.name) {
                        self.parse_error();
                    }
                    self.pop_until_html_element(&tag.name);
                }
            }
            Some(Token::EndTag(ref tag))
                if matches!(tag.name.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6") =>
            {
                if !self.has_heading_in_scope() {
                    self.parse_error();
                } else {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is(&tag.name) {
                        self.parse_error();
                    }
                    self.pop_until_one_of(&["h1", "h2", "h3", "h4", "h5", "h6"]);
                }
            }
            // > An end tag whose tag name is "sarcasm": Take a deep breath, then act as
            // > described in the "any other end tag" entry below.
            Some(Token::StartTag(ref tag)) if tag.name == "a" => {
                let mut found = None;
                for (i, entry) in self
                    .list_of_active_formatting_elements
                    .iter()
                    .enumerate()
                    .rev()
                {
                    match entry {
                        FormatEntry::Marker => break,
                        FormatEntry::Element { node, tag } => {
                            if tag.name == "a" {
                                found = Some((i, *node));
                                break;
                            }
                        }
                    }
                }
                if let Some((_, element)) = found {
                    self.parse_error();
                    self.run_adoption_agency_algorithm("a");
                    if let Some(i) = self.active_formatting_position(element) {
                        self.list_of_active_formatting_elements.remove(i);
                    }
                    self.remove_from_stack(element);
                }
                self.reconstruct_the_active_formatting_elements();
                let node = self.insert_an_element_for_a_token(tag);
                self.push_onto_list_of_active_formatting_elements(node, tag.clone());
            }
            Some(Token::StartTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike"
                        | "strong" | "tt" | "u"
                ) =>
            {
                self.reconstruct_the_active_formatting_elements();
                let node = self.insert_an_element_for_a_token(tag);
                self.push_onto_list_of_active_formatting_elements(node, tag.clone());
            }
            Some(Token::StartTag(ref tag)) if tag.name == "nobr" => {
                self.reconstruct_the_active_formatting_elements();
                if self.has_element_in_scope("nobr") {
                    self.parse_error();
                    self.run_adoption_agency_algorithm("nobr");
                    self.reconstruct_the_active_formatting_elements();
                }
                let node = self.insert_an_element_for_a_token(tag);
                self.push_onto_list_of_active_formatting_elements(node, tag.clone());
            }
            Some(Token::EndTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small"
                        | "strike" | "strong" | "tt" | "u"
                ) =>
            {
                if let AdoptionResult::AnyOtherEndTag =
                    self.run_adoption_agency_algorithm(&tag.name)
                {
                    self.any_other_end_tag_in_body(&tag.name);
                }
            }
            Some(Token::StartTag(ref tag))
                if matches!(tag.name.as_str(), "applet" | "marquee" | "object") =>
            {
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
                self.push_marker();
                self.frameset_ok = false;
            }
            Some(Token::EndTag(ref tag))
                if matches!(tag.name.as_str(), "applet" | "marquee" | "object") =>
            {
                if !self.has_element_in_scope(&tag.name) {
                    self.parse_error();
                } else {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is(&tag.name) {
                        self.parse_error();
                    }
                    self.pop_until_html_element(&tag.name);
                    self.clear_list_of_active_formatting_elements_up_to_the_last_marker();
                }
            }
            Some(Token::StartTag(ref tag)) if tag.name == "table" => {
                if self.document.quirks_mode != QuirksMode::Quirks
                    && self.has_element_in_button_scope("p")
                {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::InTable;
            }
            Some(Token::EndTag(ref tag)) if tag.name == "br" => {
                self.parse_error();
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(&synthetic_tag("br"));
                self.pop();
                self.frameset_ok = false;
            }
            Some(Token::StartTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "area" | "br" | "embed" | "img" | "keygen" | "wbr"
                ) =>
            {
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
                self.pop();
                self.frameset_ok = false;
            }
            Some(Token::StartTag(ref tag)) if tag.name == "input" => {
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
                self.pop();
                let type_is_hidden = tag
                    .attributes
                    .get("type")
                    .map_or(false, |v| v.eq_ignore_ascii_case("hidden"));
                if !type_is_hidden {
                    self.frameset_ok = false;
                }
            }
            Some(Token::StartTag(ref tag))
                if matches!(tag.name.as_str(), "param" | "source" | "track") =>
            {
                self.insert_an_element_for_a_token(tag);
                self.pop();
            }
            Some(Token::StartTag(ref tag)) if tag.name == "hr" => {
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.insert_an_element_for_a_token(tag);
                self.pop();
                self.frameset_ok = false;
            }
            Some(Token::StartTag(tag)) if tag.name == "image" => {
                // "Change the token's tag name to img and reprocess it. (Don't ask.)"
                self.parse_error();
                let mut tag = tag;
                tag.name = "img".to_owned();
                self.reprocess_token(Some(Token::StartTag(tag)));
            }
            Some(Token::StartTag(ref tag)) if tag.name == "textarea" => {
                self.insert_an_element_for_a_token(tag);
                self.ignore_lf = true;
                self.tokenizer.set_state(State::RcData);
                self.original_insertion_mode = Some(self.insertion_mode);
                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::Text;
            }
            Some(Token::StartTag(ref tag)) if tag.name == "xmp" => {
                if self.has_element_in_button_scope("p") {
                    self.close_a_p_element();
                }
                self.reconstruct_the_active_formatting_elements();
                self.frameset_ok = false;
                self.generic_rawtext_element_parsing_algorithm(tag);
            }
            Some(Token::StartTag(ref tag)) if tag.name == "iframe" => {
                self.frameset_ok = false;
                self.generic_rawtext_element_parsing_algorithm(tag);
            }
            Some(Token::StartTag(ref tag)) if tag.name == "noembed" => {
                self.generic_rawtext_element_parsing_algorithm(tag);
            }
            Some(Token::StartTag(ref tag)) if tag.name == "noscript" && self.scripting => {
                self.generic_rawtext_element_parsing_algorithm(tag);
            }
            Some(Token::StartTag(ref tag)) if tag.name == "select" => {
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
                self.frameset_ok = false;
                if matches!(
                    self.insertion_mode,
                    InsertionMode::InTable
                        | InsertionMode::InCaption
                        | InsertionMode::InTableBody
                        | InsertionMode::InRow
                        | InsertionMode::InCell
                ) {
                    self.insertion_mode = InsertionMode::InSelectInTable;
                } else {
                    self.insertion_mode = InsertionMode::InSelect;
                }
            }
            Some(Token::StartTag(ref tag))
                if matches!(tag.name.as_str(), "optgroup" | "option") =>
            {
                if self.current_node_is("option") {
                    self.pop();
                }
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "rb" | "rtc") => {
                if self.has_element_in_scope("ruby") {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is("ruby") {
                        self.parse_error();
                    }
                }
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(ref tag)) if matches!(tag.name.as_str(), "rp" | "rt") => {
                if self.has_element_in_scope("ruby") {
                    self.generate_implied_end_tags(Some("rtc"));
                    if !self.current_node_is("ruby") && !self.current_node_is("rtc") {
                        self.parse_error();
                    }
                }
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::StartTag(tag)) if tag.name == "math" => {
                self.reconstruct_the_active_formatting_elements();
                let mut tag = tag;
                foreign::adjust_mathml_attributes(&mut tag);
                self.insert_a_foreign_element(&tag, Namespace::MathMl);
                if tag.self_closing {
                    self.pop();
                }
            }
            Some(Token::StartTag(tag)) if tag.name == "svg" => {
                self.reconstruct_the_active_formatting_elements();
                let mut tag = tag;
                foreign::adjust_svg_attributes(&mut tag);
                self.insert_a_foreign_element(&tag, Namespace::Svg);
                if tag.self_closing {
                    self.pop();
                }
            }
            Some(Token::StartTag(ref tag))
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td"
                        | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                self.parse_error();
            }
            Some(Token::StartTag(ref tag)) => {
                self.reconstruct_the_active_formatting_elements();
                self.insert_an_element_for_a_token(tag);
            }
            Some(Token::EndTag(ref tag)) => {
                self.any_other_end_tag_in_body(&tag.name);
            }
            Some(Token::Error(_)) => unreachable!("errors are filtered out in run()"),
        }
    }

    pub(crate) fn any_other_end_tag_in_body(&mut self, name: &str) {
        for i in (0..self.stack_of_open_elements.len()).rev() {
            let node = self.stack_of_open_elements[i];
            if self.is_html_element(node, name) {
                self.generate_implied_end_tags(Some(name));
                if self.current_node() != Some(node) {
                    self.parse_error();
                }
                self.pop_until_node(node);
                return;
            }
            let (namespace, node_name) = {
                let (ns, n) = self.elem_name(node);
                (ns, n.to_owned())
            };
            if scopes::special(namespace, &node_name) {
                self.parse_error();
                return;
            }
        }
    }

    fn report_unclosed_elements(&mut self) {
        let any_unclosed = self.stack_of_open_elements.iter().any(|&node| {
            !matches!(
                self.elem_name(node),
                (
                    Namespace::Html,
                    "dd" | "dt" | "li" | "optgroup" | "option" | "p" | "rb" | "rp" | "rt"
                        | "rtc" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr" | "body"
                        | "html"
                )
            )
        });
        if any_unclosed {
            self.parse_error();
        }
    }

    fn merge_attributes_into(&mut self, tag: &StartTag, node: NodeId) {
        if let Some(attributes) = self.document.attributes_mut(node) {
            for attr in tag.attributes.iter() {
                attributes.insert(attr.name.clone(), attr.value.clone());
            }
        }
    }

    // foreign content

    fn process_token_via_foreign_content(&mut self, token: Option<Token>) {
        match token {
            Some(Token::String(s)) => {
                let mut replaced = String::with_capacity(s.len());
                for c in s.chars() {
                    if c == '\0' {
                        self.parse_error();
                        replaced.push('\u{fffd}');
                    } else {
                        replaced.push(c);
                    }
                }
                self.insert_a_character(&replaced);
                if replaced
                    .chars()
                    .any(|c| !matches!(c, '\t' | '\n' | '\u{c}' | '\r' | ' '))
                {
                    self.frameset_ok = false;
                }
            }
            Some(Token::Comment(data)) => {
                self.insert_a_comment(data, None);
            }
            Some(Token::Doctype(_)) => {
                self.parse_error();
            }
            Some(Token::StartTag(ref tag)) if foreign::is_breakout_tag(tag) => {
                self.parse_error();
                while let Some(node) = self.current_node() {
                    let (namespace, name) = {
                        let (ns, n) = self.elem_name(node);
                        (ns, n.to_owned())
                    };
                    if namespace == Namespace::Html
                        || scopes::mathml_text_integration_point(namespace, &name)
                        || scopes::svg_html_integration_point(namespace, &name)
                    {
                        break;
                    }
                    self.pop();
                }
                self.process_token(token);
            }
            Some(Token::StartTag(tag)) => {
                let mut tag = tag;
                let adjusted_namespace = self
                    .adjusted_current_node()
                    .map(|node| self.elem_name(node).0)
                    .unwrap_or(Namespace::Html);
                match adjusted_namespace {
                    Namespace::MathMl => {
                        foreign::adjust_mathml_attributes(&mut tag);
                    }
                    Namespace::Svg => {
                        tag.name = foreign::adjust_svg_tag_name(&tag.name).to_owned();
                        foreign::adjust_svg_attributes(&mut tag);
                    }
                    Namespace::Html => {}
                }
                self.insert_a_foreign_element(&tag, adjusted_namespace);
                if tag.self_closing {
                    self.pop();
                }
            }
            Some(Token::EndTag(ref tag)) if tag.name == "br" || tag.name == "p" => {
                self.parse_error();
                while let Some(node) = self.current_node() {
                    let (namespace, name) = {
                        let (ns, n) = self.elem_name(node);
                        (ns, n.to_owned())
                    };
                    if namespace == Namespace::Html
                        || scopes::mathml_text_integration_point(namespace, &name)
                        || scopes::svg_html_integration_point(namespace, &name)
                    {
                        break;
                    }
                    self.pop();
                }
                self.process_token(token);
            }
            Some(Token::EndTag(ref tag)) => {
                let mut index = self.stack_of_open_elements.len() - 1;
                let node = self.stack_of_open_elements[index];
                if !self.elem_name(node).1.eq_ignore_ascii_case(&tag.name) {
                    self.parse_error();
                }
                loop {
                    if index == 0 {
                        return;
                    }
                    let node = self.stack_of_open_elements[index];
                    if self.elem_name(node).1.eq_ignore_ascii_case(&tag.name) {
                        self.pop_until_node(node);
                        return;
                    }
                    index -= 1;
                    let node = self.stack_of_open_elements[index];
                    if self.elem_name(node).0 == Namespace::Html {
                        self.process_token_via_insertion_mode(self.insertion_mode, token);
                        return;
                    }
                }
            }
            Some(Token::Error(_)) => unreachable!("errors are filtered out in run()"),
            None => unreachable!("EOF always dispatches to the insertion modes"),
        }
    }
}

fn html_handlers_acknowledge_self_closing(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "basefont" | "bgsound" | "br" | "col" | "embed" | "frame" | "hr"
            | "image" | "img" | "input" | "keygen" | "link" | "math" | "meta" | "param"
            | "source" | "svg" | "track" | "wbr"
    )
}

pub(crate) fn synthetic_tag(name: &str) -> StartTag {
    StartTag {
        name: name.to_owned(),
        self_closing: false,
        attributes: AttrList::default(),
    }
}

fn attribute_lists_equal(a: &AttrList, b: &AttrList) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|attr| b.get(&attr.name) == Some(attr.value.as_str()))
}

fn starts_with_ignore_ascii_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .map_or(false, |candidate| candidate.eq_ignore_ascii_case(prefix))
}

fn doctype_is_limited_quirky(doctype: &Doctype) -> bool {
    let public = doctype.public_identifier.as_deref().unwrap_or_default();
    starts_with_ignore_ascii_case(public, "-//W3C//DTD XHTML 1.0 Frameset//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD XHTML 1.0 Transitional//")
        || (doctype.system_identifier.is_some()
            && starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 4.01 Frameset//"))
        || (doctype.system_identifier.is_some()
            && starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 4.01 Transitional//"))
}

fn doctype_is_quirky(doctype: &Doctype) -> bool {
    let public = doctype.public_identifier.as_deref().unwrap_or_default();
    let system = doctype.system_identifier.as_deref().unwrap_or_default();

    doctype.force_quirks
        || doctype.name != "html"
        || public.eq_ignore_ascii_case("-//W3O//DTD W3 HTML Strict 3.0//EN//")
        || public.eq_ignore_ascii_case("-/W3C/DTD HTML 4.0 Transitional/EN")
        || public.eq_ignore_ascii_case("HTML")
        || system.eq_ignore_ascii_case("http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd")
        || starts_with_ignore_ascii_case(public, "+//Silmaril//dtd html Pro v0r11 19970101//")
        || starts_with_ignore_ascii_case(public, "-//AS//DTD HTML 3.0 asWedit + extensions//")
        || starts_with_ignore_ascii_case(public, "-//AdvaSoft Ltd//DTD HTML 3.0 asWedit + extensions//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.0 Level 1//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.0 Level 2//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.0 Strict Level 1//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.0 Strict Level 2//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.0 Strict//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.0//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 2.1E//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 3.0//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 3.2 Final//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 3.2//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML 3//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Level 0//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Level 1//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Level 2//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Level 3//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Strict Level 0//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Strict Level 1//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Strict Level 2//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Strict Level 3//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML Strict//")
        || starts_with_ignore_ascii_case(public, "-//IETF//DTD HTML//")
        || starts_with_ignore_ascii_case(public, "-//Metrius//DTD Metrius Presentational//")
        || starts_with_ignore_ascii_case(public, "-//Microsoft//DTD Internet Explorer 2.0 HTML Strict//")
        || starts_with_ignore_ascii_case(public, "-//Microsoft//DTD Internet Explorer 2.0 HTML//")
        || starts_with_ignore_ascii_case(public, "-//Microsoft//DTD Internet Explorer 2.0 Tables//")
        || starts_with_ignore_ascii_case(public, "-//Microsoft//DTD Internet Explorer 3.0 HTML Strict//")
        || starts_with_ignore_ascii_case(public, "-//Microsoft//DTD Internet Explorer 3.0 HTML//")
        || starts_with_ignore_ascii_case(public, "-//Microsoft//DTD Internet Explorer 3.0 Tables//")
        || starts_with_ignore_ascii_case(public, "-//Netscape Comm. Corp.//DTD HTML//")
        || starts_with_ignore_ascii_case(public, "-//Netscape Comm. Corp.//DTD Strict HTML//")
        || starts_with_ignore_ascii_case(public, "-//O'Reilly and Associates//DTD HTML 2.0//")
        || starts_with_ignore_ascii_case(public, "-//O'Reilly and Associates//DTD HTML Extended 1.0//")
        || starts_with_ignore_ascii_case(public, "-//O'Reilly and Associates//DTD HTML Extended Relaxed 1.0//")
        || starts_with_ignore_ascii_case(public, "-//SQ//DTD HTML 2.0 HoTMetaL + extensions//")
        || starts_with_ignore_ascii_case(public, "-//SoftQuad Software//DTD HoTMetaL PRO 6.0::19990601::extensions to HTML 4.0//")
        || starts_with_ignore_ascii_case(public, "-//SoftQuad//DTD HoTMetaL PRO 4.0::19971010::extensions to HTML 4.0//")
        || starts_with_ignore_ascii_case(public, "-//Spyglass//DTD HTML 2.0 Extended//")
        || starts_with_ignore_ascii_case(public, "-//Sun Microsystems Corp.//DTD HotJava HTML//")
        || starts_with_ignore_ascii_case(public, "-//Sun Microsystems Corp.//DTD HotJava Strict HTML//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 3 1995-03-24//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 3.2 Draft//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 3.2 Final//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 3.2//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 3.2S Draft//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 4.0 Frameset//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 4.0 Transitional//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML Experimental 19960712//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML Experimental 970421//")
        || starts_with_ignore_ascii_case(public, "-//W3C//DTD W3 HTML//")
        || starts_with_ignore_ascii_case(public, "-//W3O//DTD W3 HTML 3.0//")
        || starts_with_ignore_ascii_case(public, "-//WebTechs//DTD Mozilla HTML 2.0//")
        || starts_with_ignore_ascii_case(public, "-//WebTechs//DTD Mozilla HTML//")
        || (doctype.system_identifier.is_none()
            && starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 4.01 Frameset//"))
        || (doctype.system_identifier.is_none()
            && starts_with_ignore_ascii_case(public, "-//W3C//DTD HTML 4.01 Transitional//"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(input: &str) -> TreeConstructionDispatcher<crate::StringReader<'_>> {
        let tokenizer = Tokenizer::new_with_emitter(input, DefaultEmitter::default());
        let mut dispatcher = TreeConstructionDispatcher::new(tokenizer, false);
        dispatcher.run();
        dispatcher
    }

    #[test]
    fn recovery_only_errors_are_counted_but_not_surfaced() {
        let dispatcher = build("<p></div>");
        assert!(dispatcher.uncoded_error_count > 0);
        assert!(dispatcher.errors.is_empty());
    }

    #[test]
    fn whitespace_only_text_does_not_spoil_frameset_ok() {
        // whitespace and a p element leave frameset-ok alone, so the frameset replaces the body
        let dispatcher = build("<p> <frameset></frameset>");
        assert!(dispatcher.document.dump().contains("<frameset>"));
        assert!(!dispatcher.document.dump().contains("<body>"));

        // any other character flips it and the frameset is ignored
        let dispatcher = build("<p>x<frameset></frameset>");
        assert!(!dispatcher.document.dump().contains("<frameset>"));
        assert!(dispatcher.document.dump().contains("<body>"));
    }
}
