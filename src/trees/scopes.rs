use crate::dom::Namespace;

pub(crate) fn html_default_scope(namespace: Namespace, name: &str) -> bool {
    namespace == Namespace::Html
        && matches!(
            name,
            "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object"
                | "template"
        )
}

pub(crate) fn default_scope(namespace: Namespace, name: &str) -> bool {
    html_default_scope(namespace, name)
        || (namespace == Namespace::MathMl && name == "annotation-xml")
        || mathml_text_integration_point(namespace, name)
        || svg_html_integration_point(namespace, name)
}

pub(crate) fn mathml_text_integration_point(namespace: Namespace, name: &str) -> bool {
    namespace == Namespace::MathMl && matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext")
}

pub(crate) fn svg_html_integration_point(namespace: Namespace, name: &str) -> bool {
    namespace == Namespace::Svg && matches!(name, "foreignObject" | "desc" | "title")
}

pub(crate) fn list_item_scope(namespace: Namespace, name: &str) -> bool {
    default_scope(namespace, name)
        || (namespace == Namespace::Html && matches!(name, "ol" | "ul"))
}

pub(crate) fn button_scope(namespace: Namespace, name: &str) -> bool {
    default_scope(namespace, name) || (namespace == Namespace::Html && name == "button")
}

pub(crate) fn table_scope(namespace: Namespace, name: &str) -> bool {
    namespace == Namespace::Html && matches!(name, "html" | "table" | "template")
}

pub(crate) fn select_scope(namespace: Namespace, name: &str) -> bool {
    !(namespace == Namespace::Html && matches!(name, "optgroup" | "option"))
}

/// The "special" element category used by the generic end-tag rule and the adoption agency's
/// furthest-block search.
pub(crate) fn special(namespace: Namespace, name: &str) -> bool {
    match namespace {
        Namespace::Html => matches!(
            name,
            "address" | "applet" | "area" | "article" | "aside" | "base" | "basefont"
                | "bgsound" | "blockquote" | "body" | "br" | "button" | "caption" | "center"
                | "col" | "colgroup" | "dd" | "details" | "dir" | "div" | "dl" | "dt" | "embed"
                | "fieldset" | "figcaption" | "figure" | "footer" | "form" | "frame"
                | "frameset" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "header"
                | "hgroup" | "hr" | "html" | "iframe" | "img" | "input" | "keygen" | "li"
                | "link" | "listing" | "main" | "marquee" | "menu" | "meta" | "nav" | "noembed"
                | "noframes" | "noscript" | "object" | "ol" | "p" | "param" | "plaintext"
                | "pre" | "script" | "section" | "select" | "source" | "style" | "summary"
                | "table" | "tbody" | "td" | "template" | "textarea" | "tfoot" | "th" | "thead"
                | "title" | "tr" | "track" | "ul" | "wbr" | "xmp"
        ),
        Namespace::MathMl => matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"),
        Namespace::Svg => matches!(name, "foreignObject" | "desc" | "title"),
    }
}
