use std::fmt::Write;

use crate::emitter::AttrList;

/// Identifies a node in a [`Document`]. Ids are stable for the lifetime of the document; node 0
/// is always the document itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The namespace an element lives in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Namespace {
    /// The HTML namespace, `http://www.w3.org/1999/xhtml`.
    Html,
    /// The SVG namespace, `http://www.w3.org/2000/svg`.
    Svg,
    /// The MathML namespace, `http://www.w3.org/1998/Math/MathML`.
    MathMl,
}

/// Which rendering mode the doctype put the document into.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum QuirksMode {
    /// Standards mode.
    NoQuirks,
    /// Almost standards mode.
    LimitedQuirks,
    /// Quirks mode.
    Quirks,
}

/// What kind of node this is, plus its payload.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NodeData {
    /// The document root. Exactly one per tree, at id 0.
    Document,
    /// A `<!DOCTYPE ...>` node.
    Doctype {
        /// The doctype name, usually `html`.
        name: String,
        /// The public identifier, empty if absent.
        public_id: String,
        /// The system identifier, empty if absent.
        system_id: String,
    },
    /// An element.
    Element {
        /// Which namespace the element is in.
        namespace: Namespace,
        /// The element's local name.
        name: String,
        /// The element's attributes, in source order.
        attributes: AttrList,
    },
    /// A text node.
    Text {
        /// The character data.
        data: String,
    },
    /// A comment node.
    Comment {
        /// The comment data, without the `<!--`/`-->` delimiters.
        data: String,
    },
}

/// A node in the arena: payload plus tree edges.
#[derive(Debug, Clone)]
pub struct Node {
    /// The parent, if the node is currently attached.
    pub parent: Option<NodeId>,
    /// Child ids in tree order.
    pub children: Vec<NodeId>,
    /// The node payload.
    pub data: NodeData,
}

/// An HTML document as an append-only node arena.
///
/// Nodes are created by the tree builder and never freed; re-parenting (foster parenting, the
/// adoption agency) only rewires edges.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// The quirks mode the doctype selected.
    pub quirks_mode: QuirksMode,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    /// Create a document containing only the document node.
    pub fn new() -> Self {
        Document {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            quirks_mode: QuirksMode::NoQuirks,
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Number of nodes ever created, including the document node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always contains at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub(crate) fn create_element(
        &mut self,
        namespace: Namespace,
        name: String,
        attributes: AttrList,
    ) -> NodeId {
        self.push_node(NodeData::Element {
            namespace,
            name,
            attributes,
        })
    }

    pub(crate) fn create_text(&mut self, data: String) -> NodeId {
        self.push_node(NodeData::Text { data })
    }

    pub(crate) fn create_comment(&mut self, data: String) -> NodeId {
        self.push_node(NodeData::Comment { data })
    }

    pub(crate) fn create_doctype(
        &mut self,
        name: String,
        public_id: String,
        system_id: String,
    ) -> NodeId {
        self.push_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        })
    }

    /// Detach `child` from its parent, if any.
    pub(crate) fn remove_from_parent(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.index()].parent.take() {
            let siblings = &mut self.nodes[parent.index()].children;
            siblings.retain(|&c| c != child);
        }
    }

    /// Append `child` as the last child of `parent`, detaching it from any previous parent.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.remove_from_parent(child);
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Insert `child` into `parent` immediately before `reference`, detaching it from any
    /// previous parent. `reference` must be a child of `parent`.
    pub(crate) fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.remove_from_parent(child);
        let siblings = &mut self.nodes[parent.index()].children;
        let idx = siblings
            .iter()
            .position(|&c| c == reference)
            .expect("reference is not a child of parent");
        siblings.insert(idx, child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Append character data at the end of `parent`, merging into an existing trailing text node
    /// so that text nodes never end up adjacent.
    pub(crate) fn append_text(&mut self, parent: NodeId, s: &str) {
        if let Some(&last) = self.nodes[parent.index()].children.last() {
            if let NodeData::Text { ref mut data } = self.nodes[last.index()].data {
                data.push_str(s);
                return;
            }
        }
        let text = self.create_text(s.to_owned());
        self.append(parent, text);
    }

    /// Insert character data into `parent` just before `reference`, merging into the previous
    /// sibling when it is a text node.
    pub(crate) fn insert_text_before(&mut self, parent: NodeId, s: &str, reference: NodeId) {
        let siblings = &self.nodes[parent.index()].children;
        let idx = siblings
            .iter()
            .position(|&c| c == reference)
            .expect("reference is not a child of parent");
        if idx > 0 {
            let prev = siblings[idx - 1];
            if let NodeData::Text { ref mut data } = self.nodes[prev.index()].data {
                data.push_str(s);
                return;
            }
        }
        let text = self.create_text(s.to_owned());
        self.insert_before(parent, text, reference);
    }

    /// The element's (namespace, local name), or `None` for non-elements.
    pub fn element_name(&self, id: NodeId) -> Option<(Namespace, &str)> {
        match self.nodes[id.index()].data {
            NodeData::Element {
                namespace,
                ref name,
                ..
            } => Some((namespace, name)),
            _ => None,
        }
    }

    /// Whether `id` is an HTML-namespace element with the given local name.
    pub fn is_html_element(&self, id: NodeId, name: &str) -> bool {
        matches!(self.element_name(id), Some((Namespace::Html, n)) if n == name)
    }

    pub(crate) fn attributes_mut(&mut self, id: NodeId) -> Option<&mut AttrList> {
        match self.nodes[id.index()].data {
            NodeData::Element {
                ref mut attributes, ..
            } => Some(attributes),
            _ => None,
        }
    }

    /// Serialize the tree in the html5lib tree-construction test format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for &child in &self.nodes[0].children {
            self.dump_node(child, 0, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self.nodes[id.index()].data {
            NodeData::Document => {}
            NodeData::Doctype {
                ref name,
                ref public_id,
                ref system_id,
            } => {
                if public_id.is_empty() && system_id.is_empty() {
                    if name.is_empty() {
                        let _ = writeln!(out, "| {}<!DOCTYPE >", indent);
                    } else {
                        let _ = writeln!(out, "| {}<!DOCTYPE {}>", indent, name);
                    }
                } else {
                    let _ = writeln!(
                        out,
                        "| {}<!DOCTYPE {} \"{}\" \"{}\">",
                        indent, name, public_id, system_id
                    );
                }
            }
            NodeData::Element {
                namespace,
                ref name,
                ref attributes,
            } => {
                let qualified = match namespace {
                    Namespace::Html => name.clone(),
                    Namespace::Svg => format!("svg {}", name),
                    Namespace::MathMl => format!("math {}", name),
                };
                let _ = writeln!(out, "| {}<{}>", indent, qualified);
                let mut attrs: Vec<_> = attributes.iter().collect();
                attrs.sort_by(|a, b| a.name.cmp(&b.name));
                for attr in attrs {
                    // the html5lib format spells namespaced attributes "xlink href"
                    let name = if crate::trees::foreign::is_adjusted_foreign_attribute(&attr.name) {
                        attr.name.replacen(':', " ", 1)
                    } else {
                        attr.name.clone()
                    };
                    let _ = writeln!(out, "| {}  {}=\"{}\"", indent, name, attr.value);
                }
                let mut child_depth = depth + 1;
                if namespace == Namespace::Html && name == "template" {
                    // the html5lib format wraps template children in a "content" node
                    let _ = writeln!(out, "| {}  content", indent);
                    child_depth += 1;
                }
                for &child in &self.nodes[id.index()].children {
                    self.dump_node(child, child_depth, out);
                }
            }
            NodeData::Text { ref data } => {
                let _ = writeln!(out, "| {}\"{}\"", indent, data);
            }
            NodeData::Comment { ref data } => {
                let _ = writeln!(out, "| {}<!-- {} -->", indent, data);
            }
        }
    }

    /// Serialize back to HTML source.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in &self.nodes[0].children {
            self.serialize_node(child, &mut out);
        }
        out
    }

    fn serialize_node(&self, id: NodeId, out: &mut String) {
        match self.nodes[id.index()].data {
            NodeData::Document => {}
            NodeData::Doctype { ref name, .. } => {
                let _ = write!(out, "<!DOCTYPE {}>", name);
            }
            NodeData::Element {
                namespace,
                ref name,
                ref attributes,
            } => {
                let _ = write!(out, "<{}", name);
                for attr in attributes {
                    let _ = write!(out, " {}=\"", attr.name);
                    escape_attribute_value(&attr.value, out);
                    out.push('"');
                }
                out.push('>');
                if namespace == Namespace::Html && is_void_element(name) {
                    return;
                }
                let raw_text = namespace == Namespace::Html && is_raw_text_element(name);
                for &child in &self.nodes[id.index()].children {
                    if raw_text {
                        if let NodeData::Text { ref data } = self.nodes[child.index()].data {
                            out.push_str(data);
                            continue;
                        }
                    }
                    self.serialize_node(child, out);
                }
                let _ = write!(out, "</{}>", name);
            }
            NodeData::Text { ref data } => {
                escape_text(data, out);
            }
            NodeData::Comment { ref data } => {
                let _ = write!(out, "<!--{}-->", data);
            }
        }
    }
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "basefont"
            | "bgsound"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_element(name: &str) -> bool {
    matches!(
        name,
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext"
    )
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute_value(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_nodes_merge_on_append() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element(Namespace::Html, "div".into(), AttrList::default());
        doc.append(root, div);
        doc.append_text(div, "a");
        doc.append_text(div, "b");
        assert_eq!(doc.node(div).children.len(), 1);
        let text = doc.node(div).children[0];
        assert_eq!(
            doc.node(text).data,
            NodeData::Text {
                data: "ab".to_owned()
            }
        );
    }

    #[test]
    fn reparenting_keeps_edges_consistent() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(Namespace::Html, "a".into(), AttrList::default());
        let b = doc.create_element(Namespace::Html, "b".into(), AttrList::default());
        doc.append(root, a);
        doc.append(root, b);
        doc.append(b, a);
        assert_eq!(doc.node(root).children, vec![b]);
        assert_eq!(doc.node(b).children, vec![a]);
        assert_eq!(doc.node(a).parent, Some(b));
    }

    #[test]
    fn insert_text_before_merges_into_previous_sibling() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element(Namespace::Html, "div".into(), AttrList::default());
        doc.append(root, div);
        doc.append_text(div, "x");
        let table = doc.create_element(Namespace::Html, "table".into(), AttrList::default());
        doc.append(div, table);
        doc.insert_text_before(div, "y", table);
        assert_eq!(doc.node(div).children.len(), 2);
        let text = doc.node(div).children[0];
        assert_eq!(
            doc.node(text).data,
            NodeData::Text {
                data: "xy".to_owned()
            }
        );
    }
}
