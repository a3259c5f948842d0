use html5tree::{
    parse, parse_fragment, parse_with_errors, parse_with_scripting, Document, Error, NodeData,
    NodeId,
};
use pretty_assertions::assert_eq;

fn dump(input: &str) -> String {
    parse(input).dump()
}

#[test]
fn well_formed_document() {
    assert_eq!(
        dump("<html><head><title>Hello</title></head><body><p>World</p></body></html>"),
        "\
| <html>
|   <head>
|     <title>
|       \"Hello\"
|   <body>
|     <p>
|       \"World\"
"
    );
}

#[test]
fn unclosed_paragraphs_become_siblings() {
    assert_eq!(
        dump("<p>First<p>Second<p>Third"),
        "\
| <html>
|   <head>
|   <body>
|     <p>
|       \"First\"
|     <p>
|       \"Second\"
|     <p>
|       \"Third\"
"
    );
}

#[test]
fn adoption_agency_clones_misnested_italic() {
    assert_eq!(
        dump("<b><i>Bold and Italic</b> Just Italic</i>"),
        "\
| <html>
|   <head>
|   <body>
|     <b>
|       <i>
|         \"Bold and Italic\"
|     <i>
|       \" Just Italic\"
"
    );
}

#[test]
fn character_references_decode() {
    assert_eq!(
        dump("<p>&amp; &lt; &gt; &copy; &#169; &#x00A9;</p>"),
        "\
| <html>
|   <head>
|   <body>
|     <p>
|       \"& < > \u{a9} \u{a9} \u{a9}\"
"
    );
}

#[test]
fn svg_subtree_keeps_namespace_and_attributes() {
    assert_eq!(
        dump("<div><svg><circle cx=\"50\" cy=\"50\" r=\"40\"/></svg></div>"),
        "\
| <html>
|   <head>
|   <body>
|     <div>
|       <svg svg>
|         <svg circle>
|           cx=\"50\"
|           cy=\"50\"
|           r=\"40\"
"
    );
}

#[test]
fn table_grows_an_implicit_tbody() {
    assert_eq!(
        dump("<!DOCTYPE html><table><tr><td>x</td></tr></table>"),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             \"x\"
"
    );
}

#[test]
fn end_tag_with_attributes_is_reported_but_honored() {
    let (document, errors) = parse_with_errors("<p>Test</p attr>");
    assert!(errors
        .iter()
        .any(|error| error.kind == Error::EndTagWithAttributes));
    assert_eq!(
        document.dump(),
        "\
| <html>
|   <head>
|   <body>
|     <p>
|       \"Test\"
"
    );
}

#[test]
fn empty_input_yields_the_empty_document() {
    assert_eq!(dump(""), "| <html>\n|   <head>\n|   <body>\n");
}

#[test]
fn character_reference_only_input() {
    assert_eq!(
        dump("&copy;&hellip;"),
        "| <html>\n|   <head>\n|   <body>\n|     \"\u{a9}\u{2026}\"\n"
    );
}

#[test]
fn misnested_formatting_terminates_and_balances() {
    // more opening than closing tags and vice versa; must terminate and stay well-formed
    let lopsided = format!("{}text{}", "<b>".repeat(12), "</b>".repeat(5));
    check_universal_invariants(&parse(&lopsided));
    let lopsided = format!("{}text{}", "<b>".repeat(3), "</b>".repeat(9));
    check_universal_invariants(&parse(&lopsided));
}

#[test]
fn leading_newline_after_pre_is_dropped() {
    assert_eq!(
        dump("<pre>\nkeep\nthis</pre>"),
        "\
| <html>
|   <head>
|   <body>
|     <pre>
|       \"keep\nthis\"
"
    );
}

#[test]
fn foster_parenting_moves_stray_table_text() {
    assert_eq!(
        dump("<table><tr>oops<td>x</td></tr></table>"),
        "\
| <html>
|   <head>
|   <body>
|     \"oops\"
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             \"x\"
"
    );
}

#[test]
fn quirks_mode_is_derived_from_the_doctype() {
    use html5tree::QuirksMode;
    assert_eq!(parse("<!DOCTYPE html><p>x").quirks_mode, QuirksMode::NoQuirks);
    assert_eq!(parse("<p>x").quirks_mode, QuirksMode::Quirks);
    assert_eq!(
        parse("<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\">").quirks_mode,
        QuirksMode::Quirks
    );
    assert_eq!(
        parse("<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"x\">")
            .quirks_mode,
        QuirksMode::LimitedQuirks
    );
}

#[test]
fn noscript_content_model_follows_the_scripting_flag() {
    // scripting off: noscript children parse as elements
    let document = parse("<head><noscript><link></noscript></head>");
    assert!(document.dump().contains("<link>"));

    // scripting on: noscript content is raw text
    let document = parse_with_scripting("<head><noscript><link></noscript></head>");
    assert!(document.dump().contains("\"<link>\""));
}

#[test]
fn template_contents_are_grouped() {
    assert_eq!(
        dump("<template><b>x</b></template>"),
        "\
| <html>
|   <head>
|     <template>
|       content
|         <b>
|           \"x\"
|   <body>
"
    );
}

#[test]
fn fragment_parsing_honors_the_context_element() {
    let document = parse_fragment("<td>cell</td>", "tr");
    assert_eq!(
        document.dump(),
        "| <html>\n|   <td>\n|     \"cell\"\n"
    );

    // the same input in a body context treats td as a stray tag
    let document = parse_fragment("<td>cell</td>", "div");
    assert_eq!(document.dump(), "| <html>\n|   \"cell\"\n");
}

#[test]
fn comments_stay_where_they_appear() {
    assert_eq!(
        dump("<!--early--><html><body><p>x</p><!--late-->"),
        "\
| <!-- early -->
| <html>
|   <head>
|   <body>
|     <p>
|       \"x\"
|     <!-- late -->
"
    );
}

#[test]
fn round_trip_is_stable() {
    for input in [
        "<p>hello<b>bold</b></p>",
        "<table><tr><td>x</td></tr></table>",
        "<b><i>a</b>b</i>",
        "<ul><li>one<li>two</ul>",
        "<div><svg><circle r=\"1\"/></svg></div>",
        "text &amp; more",
    ] {
        let once = parse(input);
        let twice = parse(&once.to_html());
        assert_eq!(once.dump(), twice.dump(), "round trip diverged for {input:?}");
    }
}

#[test]
fn arbitrary_garbage_keeps_the_invariants() {
    for input in [
        "",
        "</p attr>",
        "<table><table><table>",
        "<b><table><tr><b></b></table></b>",
        "<select><option><optgroup></select>",
        "<math><mi><p>x",
        "<!doctype html><frameset><frame></frameset>",
        "a\0b\r\nc",
        "<a href='x'><a href='x'>",
        "&notin&notin;&#xD800;&#x110000;",
        "<template><td>x</td></template>",
    ] {
        check_universal_invariants(&parse(input));
    }
}

/// The invariants that must hold for the output of any parse whatsoever.
fn check_universal_invariants(document: &Document) {
    let root = document.root();

    // one html element child, at most one doctype, both directly under the document
    let mut html_count = 0;
    let mut doctype_count = 0;
    for &child in &document.node(root).children {
        match document.node(child).data {
            NodeData::Element { ref name, .. } if name == "html" => html_count += 1,
            NodeData::Doctype { .. } => doctype_count += 1,
            _ => {}
        }
    }
    assert_eq!(html_count, 1, "expected exactly one html element");
    assert!(doctype_count <= 1, "expected at most one doctype");

    walk(document, root);
}

fn walk(document: &Document, node: NodeId) {
    let mut previous_was_text = false;
    for &child in &document.node(node).children {
        // parent link consistency
        assert_eq!(document.node(child).parent, Some(node));

        let is_text = matches!(document.node(child).data, NodeData::Text { .. });
        assert!(
            !(is_text && previous_was_text),
            "adjacent text nodes under {node:?}"
        );
        previous_was_text = is_text;

        // attribute names are unique
        if let NodeData::Element { ref attributes, .. } = document.node(child).data {
            for attr in attributes.iter() {
                assert_eq!(
                    attributes.iter().filter(|a| a.name == attr.name).count(),
                    1,
                    "duplicate attribute {}",
                    attr.name
                );
            }
        }

        walk(document, child);
    }
}
