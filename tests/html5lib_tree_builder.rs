//! Runs the html5lib tree-construction suite when a checkout is present under
//! `tests/html5lib-tests/`. Without a checkout this harness runs zero tests.

use std::fs;

use glob::glob;
use libtest_mimic::{Arguments, Failed, Trial};
use pretty_assertions::assert_eq;

#[derive(Clone, Default)]
struct TestCase {
    data: String,
    document: String,
    fragment_context: Option<String>,
    script_on: bool,
    script_off: bool,
}

/// Parse the `.dat` format: `#data`, `#errors`, `#new-errors`, `#document-fragment`,
/// `#script-on`, `#script-off` and `#document` sections, blank-line separated cases.
fn parse_dat(content: &str) -> Vec<TestCase> {
    let mut cases = Vec::new();
    let mut case = TestCase::default();
    let mut section = "";
    let mut data_lines: Vec<&str> = Vec::new();
    let mut document_lines: Vec<&str> = Vec::new();

    let mut flush =
        |case: &mut TestCase, data_lines: &mut Vec<&str>, document_lines: &mut Vec<&str>| {
            if !document_lines.is_empty() || !data_lines.is_empty() {
                case.data = data_lines.join("\n");
                case.document = document_lines
                    .iter()
                    .map(|line| format!("{}\n", line))
                    .collect();
                cases.push(std::mem::take(case));
            }
            data_lines.clear();
            document_lines.clear();
        };

    for line in content.lines() {
        match line {
            "#data" => {
                flush(&mut case, &mut data_lines, &mut document_lines);
                section = "data";
            }
            "#errors" => section = "errors",
            "#new-errors" => section = "new-errors",
            "#document" => section = "document",
            "#document-fragment" => section = "fragment",
            "#script-on" => case.script_on = true,
            "#script-off" => case.script_off = true,
            line => match section {
                "data" => data_lines.push(line),
                "document" => document_lines.push(line),
                "fragment" => case.fragment_context = Some(line.to_owned()),
                _ => {}
            },
        }
    }
    flush(&mut case, &mut data_lines, &mut document_lines);
    cases
}

fn run_test(case: TestCase) -> Result<(), Failed> {
    let document = match (&case.fragment_context, case.script_on) {
        (Some(context), _) => html5tree::parse_fragment(&case.data, context),
        (None, true) => html5tree::parse_with_scripting(&case.data),
        (None, false) => html5tree::parse(&case.data),
    };

    let dump = if case.fragment_context.is_some() {
        // the fragment fixtures list only the fragment's nodes, which end up as the children
        // of the synthetic html root: strip the root line and one level of indentation
        document
            .dump()
            .lines()
            .skip(1)
            .map(|line| format!("| {}\n", &line[4..]))
            .collect::<String>()
    } else {
        document.dump()
    };

    assert_eq!(dump, case.document);
    Ok(())
}

fn main() {
    let args = Arguments::from_args();
    let mut trials = Vec::new();

    for entry in glob("tests/html5lib-tests/tree-construction/*.dat")
        .unwrap()
        .flatten()
    {
        let content = match fs::read_to_string(&entry) {
            Ok(content) => content,
            Err(_) => continue,
        };
        let file_stem = entry.file_stem().unwrap().to_string_lossy().into_owned();

        for (i, case) in parse_dat(&content).into_iter().enumerate() {
            if case.script_on && case.script_off {
                continue;
            }
            let name = format!("{}:{}", file_stem, i);
            trials.push(Trial::test(name, move || run_test(case)));
        }
    }

    libtest_mimic::run(&args, trials).exit();
}
