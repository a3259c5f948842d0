//! Runs the html5lib tokenizer suite when a checkout is present under
//! `tests/html5lib-tests/`. Without a checkout this harness runs zero tests.

use std::fs::File;
use std::io::BufReader;
use std::str::FromStr;

use glob::glob;
use html5tree::{Doctype, EndTag, Error, StartTag, State, Token, Tokenizer};
use libtest_mimic::{Arguments, Failed, Trial};
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Deserialize)]
struct TestFile {
    tests: Option<Vec<TestCase>>,
}

#[derive(Deserialize, Clone)]
struct TestCase {
    description: String,
    input: String,
    output: Vec<serde_json::Value>,
    #[serde(default, rename = "initialStates")]
    initial_states: Option<Vec<String>>,
    #[serde(default, rename = "lastStartTag")]
    last_start_tag: Option<String>,
    #[serde(default, rename = "doubleEscaped")]
    double_escaped: bool,
    #[serde(default)]
    errors: Vec<TestError>,
}

#[derive(Deserialize, Clone)]
struct TestError {
    code: String,
}

fn parse_state(name: &str) -> State {
    match name {
        "Data state" => State::Data,
        "PLAINTEXT state" => State::PlainText,
        "RCDATA state" => State::RcData,
        "RAWTEXT state" => State::RawText,
        "Script data state" => State::ScriptData,
        "CDATA section state" => State::CdataSection,
        other => panic!("unknown initial state: {}", other),
    }
}

fn unescape(input: &str) -> Option<String> {
    // double-escaped tests contain \uXXXX sequences that have to be decoded a second time;
    // tests with lone surrogates cannot be represented in a Rust string and are skipped
    serde_json::from_str(&format!("\"{}\"", input)).ok()
}

fn expected_tokens(case: &TestCase) -> Option<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    for value in &case.output {
        let parts = value.as_array()?;
        let kind = parts[0].as_str()?;
        let decode = |v: &serde_json::Value| -> Option<String> {
            let s = v.as_str()?.to_owned();
            if case.double_escaped {
                unescape(&s)
            } else {
                Some(s)
            }
        };
        match kind {
            "Character" => {
                let data = decode(&parts[1])?;
                match tokens.last_mut() {
                    Some(Token::String(ref mut existing)) => existing.push_str(&data),
                    _ => tokens.push(Token::String(data)),
                }
            }
            "Comment" => tokens.push(Token::Comment(decode(&parts[1])?)),
            "StartTag" => {
                let name = decode(&parts[1])?;
                let mut attributes = Vec::new();
                for (attr_name, attr_value) in parts[2].as_object()? {
                    let attr_name = if case.double_escaped {
                        unescape(attr_name)?
                    } else {
                        attr_name.clone()
                    };
                    attributes.push((attr_name, decode(attr_value)?));
                }
                // json objects are unordered; match the emitter's first-seen order by name
                let mut tag = StartTag {
                    name,
                    self_closing: parts.get(3).and_then(|v| v.as_bool()).unwrap_or(false),
                    attributes: attributes.into_iter().collect(),
                };
                tag.attributes = sorted_attributes(&tag);
                tokens.push(Token::StartTag(tag));
            }
            "EndTag" => tokens.push(Token::EndTag(EndTag {
                name: decode(&parts[1])?,
                self_closing: false,
            })),
            "DOCTYPE" => {
                let nullable = |v: Option<&serde_json::Value>| -> Option<Option<String>> {
                    match v {
                        None | Some(serde_json::Value::Null) => Some(None),
                        Some(v) => Some(Some(decode(v)?)),
                    }
                };
                tokens.push(Token::Doctype(Doctype {
                    name: nullable(parts.get(1))?.unwrap_or_default(),
                    public_identifier: nullable(parts.get(2))?,
                    system_identifier: nullable(parts.get(3))?,
                    force_quirks: !parts.get(4).and_then(|v| v.as_bool()).unwrap_or(true),
                }));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn sorted_attributes(tag: &StartTag) -> html5tree::AttrList {
    let mut attributes: Vec<(String, String)> = tag
        .attributes
        .iter()
        .map(|attr| (attr.name.clone(), attr.value.clone()))
        .collect();
    attributes.sort();
    attributes.into_iter().collect()
}

fn run_test(case: TestCase, state: State) -> Result<(), Failed> {
    let input = if case.double_escaped {
        match unescape(&case.input) {
            Some(input) => input,
            None => return Ok(()), // unrepresentable (lone surrogates)
        }
    } else {
        case.input.clone()
    };

    let expected = match expected_tokens(&case) {
        Some(expected) => expected,
        None => return Ok(()), // unrepresentable output
    };

    let mut tokenizer = Tokenizer::new(&input);
    tokenizer.set_state(state);
    if let Some(ref last_start_tag) = case.last_start_tag {
        tokenizer.set_last_start_tag(Some(last_start_tag));
    }

    let mut actual: Vec<Token> = Vec::new();
    let mut actual_errors: Vec<Error> = Vec::new();
    for token in tokenizer {
        match token {
            Token::Error(error) => actual_errors.push(error.kind),
            Token::String(data) => match actual.last_mut() {
                Some(Token::String(ref mut existing)) => existing.push_str(&data),
                _ => actual.push(Token::String(data)),
            },
            Token::StartTag(tag) => {
                let mut tag = tag;
                tag.attributes = sorted_attributes(&tag);
                actual.push(Token::StartTag(tag));
            }
            Token::EndTag(mut tag) => {
                // the fixture format does not carry the end tag's solidus
                tag.self_closing = false;
                actual.push(Token::EndTag(tag));
            }
            token => actual.push(token),
        }
    }

    assert_eq!(actual, expected);

    let expected_errors: Vec<Error> = case
        .errors
        .iter()
        .filter_map(|error| Error::from_str(&error.code).ok())
        .collect();
    let mut actual_codes = actual_errors;
    actual_codes.retain(|code| expected_errors.contains(code));
    actual_codes.sort_by_key(|code| code.as_str());
    let mut expected_codes = expected_errors;
    expected_codes.sort_by_key(|code| code.as_str());
    expected_codes.dedup();
    actual_codes.dedup();
    assert_eq!(actual_codes, expected_codes);

    Ok(())
}

fn main() {
    let args = Arguments::from_args();
    let mut trials = Vec::new();

    for entry in glob("tests/html5lib-tests/tokenizer/*.test")
        .unwrap()
        .flatten()
    {
        let file = File::open(&entry).unwrap();
        let test_file: TestFile = match serde_json::from_reader(BufReader::new(file)) {
            Ok(test_file) => test_file,
            Err(_) => continue, // xmlViolation and other non-standard files
        };
        let file_stem = entry.file_stem().unwrap().to_string_lossy().into_owned();

        for (i, case) in test_file.tests.unwrap_or_default().into_iter().enumerate() {
            let states: Vec<State> = case
                .initial_states
                .clone()
                .map(|names| names.iter().map(|name| parse_state(name)).collect())
                .unwrap_or_else(|| vec![State::Data]);

            for (j, state) in states.into_iter().enumerate() {
                let case = case.clone();
                let name = format!("{}:{}:{}:{}", file_stem, i, j, case.description);
                trials.push(Trial::test(name, move || run_test(case, state)));
            }
        }
    }

    libtest_mimic::run(&args, trials).exit();
}
