use crate::entities;
use crate::utils::{ascii_digit_pat, control_pat, ctostr, noncharacter_pat, surrogate_pat, whitespace_pat, ControlToken, State};
use crate::{Emitter, Error, Reader, Tokenizer};

macro_rules! mutate_character_reference {
    ($slf:expr, * $mul:literal + $x:ident - $sub:literal) => {
        match $slf
            .character_reference_code
            .checked_mul($mul)
            .and_then(|cr| cr.checked_add($x as u32 - $sub))
        {
            Some(cr) => $slf.character_reference_code = cr,
            None => {
                // provoke err
                $slf.character_reference_code = 0x110000;
            }
        };
    };
}

/// Run the state machine for one current input character (or lookahead sequence) and tell the
/// caller whether to keep going.
pub(crate) fn consume<R: Reader, E: Emitter>(slf: &mut Tokenizer<R, E>) -> ControlToken {
    match slf.state {
        State::Data => match slf.read_char() {
            Some('&') => {
                slf.return_state = Some(slf.state);
                slf.state = State::CharacterReference;
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::TagOpen;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\0");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            None => ControlToken::Eof,
        },
        State::RcData => match slf.read_char() {
            Some('&') => {
                slf.return_state = Some(State::RcData);
                slf.state = State::CharacterReference;
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::RcDataLessThanSign;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            None => ControlToken::Eof,
        },
        State::RawText => match slf.read_char() {
            Some('<') => {
                slf.state = State::RawTextLessThanSign;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            None => ControlToken::Eof,
        },
        State::ScriptData => match slf.read_char() {
            Some('<') => {
                slf.state = State::ScriptDataLessThanSign;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            None => ControlToken::Eof,
        },
        State::PlainText => match slf.read_char() {
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            None => ControlToken::Eof,
        },
        State::TagOpen => match slf.read_char() {
            Some('!') => {
                slf.state = State::MarkupDeclarationOpen;
                ControlToken::Continue
            }
            Some('/') => {
                slf.state = State::EndTagOpen;
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.init_start_tag();
                slf.state = State::TagName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            c @ Some('?') => {
                slf.emit_error(Error::UnexpectedQuestionMarkInsteadOfTagName);
                slf.emitter.init_comment();
                slf.state = State::BogusComment;
                slf.unread_char(c);
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofBeforeTagName);
                slf.emitter.emit_string("<");
                ControlToken::Eof
            }
            c @ Some(_) => {
                slf.emit_error(Error::InvalidFirstCharacterOfTagName);
                slf.state = State::Data;
                slf.emitter.emit_string("<");
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::EndTagOpen => match slf.read_char() {
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.init_end_tag();
                slf.state = State::TagName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingEndTagName);
                slf.state = State::Data;
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofBeforeTagName);
                slf.emitter.emit_string("</");
                ControlToken::Eof
            }
            Some(x) => {
                slf.emit_error(Error::InvalidFirstCharacterOfTagName);
                slf.emitter.init_comment();
                slf.state = State::BogusComment;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
        },
        State::TagName => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('/') => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_tag_name("\u{fffd}");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.push_tag_name(ctostr!(x.to_ascii_lowercase()));
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
        },
        State::RcDataLessThanSign => match slf.read_char() {
            Some('/') => {
                slf.temporary_buffer.clear();
                slf.state = State::RcDataEndTagOpen;
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("<");
                slf.state = State::RcData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::RcDataEndTagOpen => match slf.read_char() {
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.init_end_tag();
                slf.state = State::RcDataEndTagName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.state = State::RcData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::RcDataEndTagName => match slf.read_char() {
            Some(whitespace_pat!()) if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('/') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('>') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.push_tag_name(ctostr!(x.to_ascii_lowercase()));
                slf.temporary_buffer.push(x);
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.flush_buffer_characters();

                slf.state = State::RcData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::RawTextLessThanSign => match slf.read_char() {
            Some('/') => {
                slf.temporary_buffer.clear();
                slf.state = State::RawTextEndTagOpen;
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("<");
                slf.state = State::RawText;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::RawTextEndTagOpen => match slf.read_char() {
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.init_end_tag();
                slf.state = State::RawTextEndTagName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.state = State::RawText;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::RawTextEndTagName => match slf.read_char() {
            Some(whitespace_pat!()) if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('/') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('>') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.push_tag_name(ctostr!(x.to_ascii_lowercase()));
                slf.temporary_buffer.push(x);
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.flush_buffer_characters();

                slf.state = State::RawText;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataLessThanSign => match slf.read_char() {
            Some('/') => {
                slf.temporary_buffer.clear();
                slf.state = State::ScriptDataEndTagOpen;
                ControlToken::Continue
            }
            Some('!') => {
                slf.state = State::ScriptDataEscapeStart;
                slf.emitter.emit_string("<!");
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("<");
                slf.state = State::ScriptData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataEndTagOpen => match slf.read_char() {
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.init_end_tag();
                slf.state = State::ScriptDataEndTagName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.state = State::ScriptData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataEndTagName => match slf.read_char() {
            Some(whitespace_pat!()) if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('/') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('>') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.push_tag_name(ctostr!(x.to_ascii_lowercase()));
                slf.temporary_buffer.push(x);
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.flush_buffer_characters();
                slf.state = State::ScriptData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapeStart => match slf.read_char() {
            Some('-') => {
                slf.state = State::ScriptDataEscapeStartDash;
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            c => {
                slf.state = State::ScriptData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapeStartDash => match slf.read_char() {
            Some('-') => {
                slf.state = State::ScriptDataEscapedDashDash;
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            c => {
                slf.state = State::ScriptData;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataEscaped => match slf.read_char() {
            Some('-') => {
                slf.state = State::ScriptDataEscapedDash;
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::ScriptDataEscapedLessThanSign;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInScriptHtmlCommentLikeText);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapedDash => match slf.read_char() {
            Some('-') => {
                slf.state = State::ScriptDataEscapedDashDash;
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::ScriptDataEscapedLessThanSign;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.state = State::ScriptDataEscaped;
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInScriptHtmlCommentLikeText);
                ControlToken::Eof
            }
            Some(x) => {
                slf.state = State::ScriptDataEscaped;
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapedDashDash => match slf.read_char() {
            Some('-') => {
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::ScriptDataEscapedLessThanSign;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::ScriptData;
                slf.emitter.emit_string(">");
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.state = State::ScriptDataEscaped;
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInScriptHtmlCommentLikeText);
                ControlToken::Eof
            }
            Some(x) => {
                slf.state = State::ScriptDataEscaped;
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapedLessThanSign => match slf.read_char() {
            Some('/') => {
                slf.temporary_buffer.clear();
                slf.state = State::ScriptDataEscapedEndTagOpen;
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.temporary_buffer.clear();
                slf.emitter.emit_string("<");
                slf.state = State::ScriptDataDoubleEscapeStart;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("<");
                slf.state = State::ScriptDataEscaped;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapedEndTagOpen => match slf.read_char() {
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.init_end_tag();
                slf.state = State::ScriptDataEscapedEndTagName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.unread_char(c);
                slf.state = State::ScriptDataEscaped;
                ControlToken::Continue
            }
        },
        State::ScriptDataEscapedEndTagName => match slf.read_char() {
            Some(whitespace_pat!()) if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('/') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('>') if slf.emitter.current_is_appropriate_end_tag_token() => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.emitter.push_tag_name(ctostr!(x.to_ascii_lowercase()));
                slf.temporary_buffer.push(x);
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("</");
                slf.flush_buffer_characters();
                slf.state = State::ScriptDataEscaped;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataDoubleEscapeStart => match slf.read_char() {
            Some(x @ whitespace_pat!() | x @ '/' | x @ '>') => {
                if slf.temporary_buffer == "script" {
                    slf.state = State::ScriptDataDoubleEscaped;
                } else {
                    slf.state = State::ScriptDataEscaped;
                }
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.temporary_buffer.push(x.to_ascii_lowercase());
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            c => {
                slf.state = State::ScriptDataEscaped;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataDoubleEscaped => match slf.read_char() {
            Some('-') => {
                slf.state = State::ScriptDataDoubleEscapedDash;
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::ScriptDataDoubleEscapedLessThanSign;
                slf.emitter.emit_string("<");
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInScriptHtmlCommentLikeText);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::ScriptDataDoubleEscapedDash => match slf.read_char() {
            Some('-') => {
                slf.state = State::ScriptDataDoubleEscapedDashDash;
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            Some('<') => {
                slf.state = State::ScriptDataDoubleEscapedLessThanSign;
                slf.emitter.emit_string("<");
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.state = State::ScriptDataDoubleEscaped;
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInScriptHtmlCommentLikeText);
                ControlToken::Eof
            }
            Some(x) => {
                slf.state = State::ScriptDataDoubleEscaped;
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::ScriptDataDoubleEscapedDashDash => match slf.read_char() {
            Some('-') => {
                slf.emitter.emit_string("-");
                ControlToken::Continue
            }
            Some('<') => {
                slf.emitter.emit_string("<");
                slf.state = State::ScriptDataDoubleEscapedLessThanSign;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emitter.emit_string(">");
                slf.state = State::ScriptData;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.state = State::ScriptDataDoubleEscaped;
                slf.emitter.emit_string("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInScriptHtmlCommentLikeText);
                ControlToken::Eof
            }
            Some(x) => {
                slf.state = State::ScriptDataDoubleEscaped;
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::ScriptDataDoubleEscapedLessThanSign => match slf.read_char() {
            Some('/') => {
                slf.temporary_buffer.clear();
                slf.state = State::ScriptDataDoubleEscapeEnd;
                slf.emitter.emit_string("/");
                ControlToken::Continue
            }
            c => {
                slf.state = State::ScriptDataDoubleEscaped;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::ScriptDataDoubleEscapeEnd => match slf.read_char() {
            Some(x @ whitespace_pat!() | x @ '/' | x @ '>') => {
                if slf.temporary_buffer == "script" {
                    slf.state = State::ScriptDataEscaped;
                } else {
                    slf.state = State::ScriptDataDoubleEscaped;
                }

                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            Some(x) if x.is_ascii_alphabetic() => {
                slf.temporary_buffer.push(x.to_ascii_lowercase());
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
            c => {
                slf.state = State::ScriptDataDoubleEscaped;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BeforeAttributeName => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            c @ (Some('/' | '>') | None) => {
                slf.state = State::AfterAttributeName;
                slf.unread_char(c);
                ControlToken::Continue
            }
            Some('=') => {
                slf.emit_error(Error::UnexpectedEqualsSignBeforeAttributeName);
                slf.emitter.init_attribute();
                slf.emitter.push_attribute_name("=");
                slf.state = State::AttributeName;
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.init_attribute();
                slf.state = State::AttributeName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
        },
        State::AttributeName => match slf.read_char() {
            c @ (Some(whitespace_pat!() | '/' | '>') | None) => {
                slf.state = State::AfterAttributeName;
                slf.unread_char(c);
                ControlToken::Continue
            }
            Some('=') => {
                slf.state = State::BeforeAttributeValue;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_attribute_name("\u{fffd}");
                ControlToken::Continue
            }
            Some(x @ ('"' | '\'' | '<')) => {
                slf.emit_error(Error::UnexpectedCharacterInAttributeName);
                slf.emitter.push_attribute_name(ctostr!(x));
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter
                    .push_attribute_name(ctostr!(x.to_ascii_lowercase()));
                ControlToken::Continue
            }
        },
        State::AfterAttributeName => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('/') => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('=') => {
                slf.state = State::BeforeAttributeValue;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.init_attribute();
                slf.state = State::AttributeName;
                slf.unread_char(Some(x));
                ControlToken::Continue
            }
        },
        State::BeforeAttributeValue => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('"') => {
                slf.state = State::AttributeValueDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.state = State::AttributeValueSingleQuoted;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingAttributeValue);
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            c => {
                slf.state = State::AttributeValueUnquoted;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::AttributeValueDoubleQuoted => match slf.read_char() {
            Some('"') => {
                slf.state = State::AfterAttributeValueQuoted;
                ControlToken::Continue
            }
            Some('&') => {
                slf.return_state = Some(State::AttributeValueDoubleQuoted);
                slf.state = State::CharacterReference;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_attribute_value("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_attribute_value(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::AttributeValueSingleQuoted => match slf.read_char() {
            Some('\'') => {
                slf.state = State::AfterAttributeValueQuoted;
                ControlToken::Continue
            }
            Some('&') => {
                slf.return_state = Some(State::AttributeValueSingleQuoted);
                slf.state = State::CharacterReference;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_attribute_value("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_attribute_value(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::AttributeValueUnquoted => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('&') => {
                slf.return_state = Some(State::AttributeValueUnquoted);
                slf.state = State::CharacterReference;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_attribute_value("\u{fffd}");
                ControlToken::Continue
            }
            Some(x @ ('"' | '\'' | '<' | '=' | '`')) => {
                slf.emit_error(Error::UnexpectedCharacterInUnquotedAttributeValue);
                slf.emitter.push_attribute_value(ctostr!(x));
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_attribute_value(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::AfterAttributeValueQuoted => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BeforeAttributeName;
                ControlToken::Continue
            }
            Some('/') => {
                slf.state = State::SelfClosingStartTag;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingWhitespaceBetweenAttributes);
                slf.state = State::BeforeAttributeName;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::SelfClosingStartTag => match slf.read_char() {
            Some('>') => {
                slf.emitter.set_self_closing();
                slf.state = State::Data;
                slf.emitter.emit_current_tag();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInTag);
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::UnexpectedSolidusInTag);
                slf.state = State::BeforeAttributeName;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BogusComment => match slf.read_char() {
            Some('>') => {
                slf.emitter.emit_current_comment();
                slf.state = State::Data;
                ControlToken::Continue
            }
            None => {
                slf.emitter.emit_current_comment();
                ControlToken::Eof
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_comment("\u{fffd}");
                ControlToken::Continue
            }
            Some(x) => {
                slf.emitter.push_comment(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::MarkupDeclarationOpen => match slf.read_char() {
            Some('-') if slf.try_read_string("-", true) => {
                slf.emitter.init_comment();
                slf.state = State::CommentStart;
                ControlToken::Continue
            }
            Some('d' | 'D') if slf.try_read_string("octype", false) => {
                slf.state = State::Doctype;
                ControlToken::Continue
            }
            Some('[') if slf.try_read_string("CDATA[", true) => {
                if slf
                    .emitter
                    .adjusted_current_node_present_but_not_in_html_namespace()
                {
                    slf.state = State::CdataSection;
                } else {
                    slf.emit_error(Error::CdataInHtmlContent);
                    slf.emitter.init_comment();
                    slf.emitter.push_comment("[CDATA[");
                    slf.state = State::BogusComment;
                }
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::IncorrectlyOpenedComment);
                slf.emitter.init_comment();
                slf.state = State::BogusComment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentStart => match slf.read_char() {
            Some('-') => {
                slf.state = State::CommentStartDash;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::AbruptClosingOfEmptyComment);
                slf.state = State::Data;
                slf.emitter.emit_current_comment();
                ControlToken::Continue
            }
            c => {
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentStartDash => match slf.read_char() {
            Some('-') => {
                slf.state = State::CommentEnd;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::AbruptClosingOfEmptyComment);
                slf.state = State::Data;
                slf.emitter.emit_current_comment();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInComment);
                slf.emitter.emit_current_comment();
                ControlToken::Eof
            }
            c => {
                slf.emitter.push_comment("-");
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::Comment => match slf.read_char() {
            Some('<') => {
                slf.emitter.push_comment("<");
                slf.state = State::CommentLessThanSign;
                ControlToken::Continue
            }
            Some('-') => {
                slf.state = State::CommentEndDash;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_comment("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInComment);
                slf.emitter.emit_current_comment();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_comment(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::CommentLessThanSign => match slf.read_char() {
            Some('!') => {
                slf.emitter.push_comment("!");
                slf.state = State::CommentLessThanSignBang;
                ControlToken::Continue
            }
            Some('<') => {
                slf.emitter.push_comment("<");
                ControlToken::Continue
            }
            c => {
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentLessThanSignBang => match slf.read_char() {
            Some('-') => {
                slf.state = State::CommentLessThanSignBangDash;
                ControlToken::Continue
            }
            c => {
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentLessThanSignBangDash => match slf.read_char() {
            Some('-') => {
                slf.state = State::CommentLessThanSignBangDashDash;
                ControlToken::Continue
            }
            c => {
                slf.state = State::CommentEndDash;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentLessThanSignBangDashDash => match slf.read_char() {
            c @ (Some('>') | None) => {
                slf.state = State::CommentEnd;
                slf.unread_char(c);
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::NestedComment);
                slf.state = State::CommentEnd;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentEndDash => match slf.read_char() {
            Some('-') => {
                slf.state = State::CommentEnd;
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInComment);
                slf.emitter.emit_current_comment();
                ControlToken::Eof
            }
            c => {
                slf.emitter.push_comment("-");
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentEnd => match slf.read_char() {
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_comment();
                ControlToken::Continue
            }
            Some('!') => {
                slf.state = State::CommentEndBang;
                ControlToken::Continue
            }
            Some('-') => {
                slf.emitter.push_comment("-");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInComment);
                slf.emitter.emit_current_comment();
                ControlToken::Eof
            }
            c => {
                slf.emitter.push_comment("--");
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CommentEndBang => match slf.read_char() {
            Some('-') => {
                slf.emitter.push_comment("--!");
                slf.state = State::CommentEndDash;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::IncorrectlyClosedComment);
                slf.state = State::Data;
                slf.emitter.emit_current_comment();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInComment);
                slf.emitter.emit_current_comment();
                ControlToken::Eof
            }
            c => {
                slf.emitter.push_comment("--!");
                slf.state = State::Comment;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::Doctype => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BeforeDoctypeName;
                ControlToken::Continue
            }
            c @ Some('>') => {
                slf.state = State::BeforeDoctypeName;
                slf.unread_char(c);
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.init_doctype();
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingWhitespaceBeforeDoctypeName);
                slf.state = State::BeforeDoctypeName;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BeforeDoctypeName => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.init_doctype();
                slf.emitter.push_doctype_name("\u{fffd}");
                slf.state = State::DoctypeName;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingDoctypeName);
                slf.emitter.init_doctype();
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.init_doctype();
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.init_doctype();
                slf.emitter
                    .push_doctype_name(ctostr!(x.to_ascii_lowercase()));
                slf.state = State::DoctypeName;
                ControlToken::Continue
            }
        },
        State::DoctypeName => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::AfterDoctypeName;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_doctype_name("\u{fffd}");
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter
                    .push_doctype_name(ctostr!(x.to_ascii_lowercase()));
                ControlToken::Continue
            }
        },
        State::AfterDoctypeName => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some('p' | 'P') if slf.try_read_string("ublic", false) => {
                slf.state = State::AfterDoctypePublicKeyword;
                ControlToken::Continue
            }
            Some('s' | 'S') if slf.try_read_string("ystem", false) => {
                slf.state = State::AfterDoctypeSystemKeyword;
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::InvalidCharacterSequenceAfterDoctypeName);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::AfterDoctypePublicKeyword => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BeforeDoctypePublicIdentifier;
                ControlToken::Continue
            }
            Some('"') => {
                slf.emit_error(Error::MissingWhitespaceAfterDoctypePublicKeyword);
                slf.emitter.set_doctype_public_identifier("");
                slf.state = State::DoctypePublicIdentifierDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.emit_error(Error::MissingWhitespaceAfterDoctypePublicKeyword);
                slf.emitter.set_doctype_public_identifier("");
                slf.state = State::DoctypePublicIdentifierSingleQuoted;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingDoctypePublicIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingQuoteBeforeDoctypePublicIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BeforeDoctypePublicIdentifier => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('"') => {
                slf.emitter.set_doctype_public_identifier("");
                slf.state = State::DoctypePublicIdentifierDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.emitter.set_doctype_public_identifier("");
                slf.state = State::DoctypePublicIdentifierSingleQuoted;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingDoctypePublicIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingQuoteBeforeDoctypePublicIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::DoctypePublicIdentifierDoubleQuoted => match slf.read_char() {
            Some('"') => {
                slf.state = State::AfterDoctypePublicIdentifier;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_doctype_public_identifier("\u{fffd}");
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::AbruptDoctypePublicIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_doctype_public_identifier(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::DoctypePublicIdentifierSingleQuoted => match slf.read_char() {
            Some('\'') => {
                slf.state = State::AfterDoctypePublicIdentifier;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_doctype_public_identifier("\u{fffd}");
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::AbruptDoctypePublicIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_doctype_public_identifier(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::AfterDoctypePublicIdentifier => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BetweenDoctypePublicAndSystemIdentifiers;
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            Some('"') => {
                slf.emit_error(Error::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.emit_error(Error::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierSingleQuoted;
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BetweenDoctypePublicAndSystemIdentifiers => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            Some('"') => {
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierSingleQuoted;
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::AfterDoctypeSystemKeyword => match slf.read_char() {
            Some(whitespace_pat!()) => {
                slf.state = State::BeforeDoctypeSystemIdentifier;
                ControlToken::Continue
            }
            Some('"') => {
                slf.emit_error(Error::MissingWhitespaceAfterDoctypeSystemKeyword);
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.emit_error(Error::MissingWhitespaceAfterDoctypeSystemKeyword);
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierSingleQuoted;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BeforeDoctypeSystemIdentifier => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('"') => {
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierDoubleQuoted;
                ControlToken::Continue
            }
            Some('\'') => {
                slf.emitter.set_doctype_system_identifier("");
                slf.state = State::DoctypeSystemIdentifierSingleQuoted;
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::MissingDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::DoctypeSystemIdentifierDoubleQuoted => match slf.read_char() {
            Some('"') => {
                slf.state = State::AfterDoctypeSystemIdentifier;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_doctype_system_identifier("\u{fffd}");
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::AbruptDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_doctype_system_identifier(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::DoctypeSystemIdentifierSingleQuoted => match slf.read_char() {
            Some('\'') => {
                slf.state = State::AfterDoctypeSystemIdentifier;
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                slf.emitter.push_doctype_system_identifier("\u{fffd}");
                ControlToken::Continue
            }
            Some('>') => {
                slf.emit_error(Error::AbruptDoctypeSystemIdentifier);
                slf.emitter.set_force_quirks();
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.push_doctype_system_identifier(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::AfterDoctypeSystemIdentifier => match slf.read_char() {
            Some(whitespace_pat!()) => ControlToken::Continue,
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInDoctype);
                slf.emitter.set_force_quirks();
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            c => {
                slf.emit_error(Error::UnexpectedCharacterAfterDoctypeSystemIdentifier);
                slf.state = State::BogusDoctype;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::BogusDoctype => match slf.read_char() {
            Some('>') => {
                slf.state = State::Data;
                slf.emitter.emit_current_doctype();
                ControlToken::Continue
            }
            Some('\0') => {
                slf.emit_error(Error::UnexpectedNullCharacter);
                ControlToken::Continue
            }
            None => {
                slf.emitter.emit_current_doctype();
                ControlToken::Eof
            }
            Some(_) => ControlToken::Continue,
        },
        State::CdataSection => match slf.read_char() {
            Some(']') => {
                slf.state = State::CdataSectionBracket;
                ControlToken::Continue
            }
            None => {
                slf.emit_error(Error::EofInCdata);
                ControlToken::Eof
            }
            Some(x) => {
                slf.emitter.emit_string(ctostr!(x));
                ControlToken::Continue
            }
        },
        State::CdataSectionBracket => match slf.read_char() {
            Some(']') => {
                slf.state = State::CdataSectionEnd;
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("]");
                slf.state = State::CdataSection;
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::CdataSectionEnd => match slf.read_char() {
            Some(']') => {
                slf.emitter.emit_string("]");
                ControlToken::Continue
            }
            Some('>') => {
                slf.state = State::Data;
                ControlToken::Continue
            }
            c => {
                slf.emitter.emit_string("]]");
                slf.unread_char(c);
                slf.state = State::CdataSection;
                ControlToken::Continue
            }
        },
        State::CharacterReference => {
            slf.temporary_buffer.clear();
            slf.temporary_buffer.push('&');
            match slf.read_char() {
                Some(x) if x.is_ascii_alphanumeric() => {
                    slf.unread_char(Some(x));
                    slf.state = State::NamedCharacterReference;
                    ControlToken::Continue
                }
                Some('#') => {
                    slf.temporary_buffer.push('#');
                    slf.state = State::NumericCharacterReference;
                    ControlToken::Continue
                }
                c => {
                    slf.flush_code_points_consumed_as_character_reference();
                    slf.state = slf.return_state.take().unwrap();
                    slf.unread_char(c);
                    ControlToken::Continue
                }
            }
        }
        State::NamedCharacterReference => {
            let c = slf.read_char();

            let char_ref = match c {
                Some(x) => entities::try_read_character_reference(x, |name| {
                    slf.reader.try_read_string(name, true)
                })
                .map(|char_ref| (x, char_ref)),
                None => None,
            };

            if let Some((x, char_ref)) = char_ref {
                slf.temporary_buffer.push(x);
                slf.temporary_buffer.push_str(char_ref.name);
                let char_ref_name_last_character = char_ref.name.chars().last();
                let next_character = slf.next_input_character();
                if slf.is_consumed_as_part_of_an_attribute()
                    && char_ref_name_last_character != Some(';')
                    && matches!(next_character, Some(x) if x == '=' || x.is_ascii_alphanumeric())
                {
                    slf.flush_code_points_consumed_as_character_reference();
                    slf.state = slf.return_state.take().unwrap();
                    ControlToken::Continue
                } else {
                    if char_ref_name_last_character != Some(';') {
                        slf.emit_error(Error::MissingSemicolonAfterCharacterReference);
                    }

                    slf.temporary_buffer.clear();
                    slf.temporary_buffer.push_str(char_ref.characters);
                    slf.flush_code_points_consumed_as_character_reference();
                    slf.state = slf.return_state.take().unwrap();
                    ControlToken::Continue
                }
            } else {
                slf.unread_char(c);
                slf.flush_code_points_consumed_as_character_reference();
                slf.state = State::AmbiguousAmpersand;
                ControlToken::Continue
            }
        }
        State::AmbiguousAmpersand => match slf.read_char() {
            Some(x) if x.is_ascii_alphanumeric() => {
                if slf.is_consumed_as_part_of_an_attribute() {
                    slf.emitter.push_attribute_value(ctostr!(x));
                } else {
                    slf.emitter.emit_string(ctostr!(x));
                }

                ControlToken::Continue
            }
            c @ Some(';') => {
                slf.emit_error(Error::UnknownNamedCharacterReference);
                slf.unread_char(c);
                slf.state = slf.return_state.take().unwrap();
                ControlToken::Continue
            }
            c => {
                slf.unread_char(c);
                slf.state = slf.return_state.take().unwrap();
                ControlToken::Continue
            }
        },
        State::NumericCharacterReference => {
            slf.character_reference_code = 0;
            match slf.read_char() {
                Some(x @ ('x' | 'X')) => {
                    slf.temporary_buffer.push(x);
                    slf.state = State::HexadecimalCharacterReferenceStart;
                    ControlToken::Continue
                }
                c => {
                    slf.unread_char(c);
                    slf.state = State::DecimalCharacterReferenceStart;
                    ControlToken::Continue
                }
            }
        }
        State::HexadecimalCharacterReferenceStart => match slf.read_char() {
            c @ Some('0'..='9' | 'A'..='F' | 'a'..='f') => {
                slf.unread_char(c);
                slf.state = State::HexadecimalCharacterReference;
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::AbsenceOfDigitsInNumericCharacterReference);
                slf.flush_code_points_consumed_as_character_reference();
                slf.state = slf.return_state.take().unwrap();
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::DecimalCharacterReferenceStart => match slf.read_char() {
            Some(x @ ascii_digit_pat!()) => {
                slf.unread_char(Some(x));
                slf.state = State::DecimalCharacterReference;
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::AbsenceOfDigitsInNumericCharacterReference);
                slf.flush_code_points_consumed_as_character_reference();
                slf.state = slf.return_state.take().unwrap();
                slf.unread_char(c);
                ControlToken::Continue
            }
        },
        State::HexadecimalCharacterReference => match slf.read_char() {
            Some(x @ ascii_digit_pat!()) => {
                mutate_character_reference!(slf, *16 + x - 0x0030);
                ControlToken::Continue
            }
            Some(x @ 'A'..='F') => {
                mutate_character_reference!(slf, *16 + x - 0x0037);
                ControlToken::Continue
            }
            Some(x @ 'a'..='f') => {
                mutate_character_reference!(slf, *16 + x - 0x0057);
                ControlToken::Continue
            }
            Some(';') => {
                slf.state = State::NumericCharacterReferenceEnd;
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::MissingSemicolonAfterCharacterReference);
                slf.unread_char(c);
                slf.state = State::NumericCharacterReferenceEnd;
                ControlToken::Continue
            }
        },
        State::DecimalCharacterReference => match slf.read_char() {
            Some(x @ ascii_digit_pat!()) => {
                mutate_character_reference!(slf, *10 + x - 0x0030);
                ControlToken::Continue
            }
            Some(';') => {
                slf.state = State::NumericCharacterReferenceEnd;
                ControlToken::Continue
            }
            c => {
                slf.emit_error(Error::MissingSemicolonAfterCharacterReference);
                slf.unread_char(c);
                slf.state = State::NumericCharacterReferenceEnd;
                ControlToken::Continue
            }
        },
        State::NumericCharacterReferenceEnd => {
            match slf.character_reference_code {
                0x00 => {
                    slf.emit_error(Error::NullCharacterReference);
                    slf.character_reference_code = 0xfffd;
                }
                0x110000.. => {
                    slf.emit_error(Error::CharacterReferenceOutsideUnicodeRange);
                    slf.character_reference_code = 0xfffd;
                }
                surrogate_pat!() => {
                    slf.emit_error(Error::SurrogateCharacterReference);
                    slf.character_reference_code = 0xfffd;
                }
                // noncharacter
                noncharacter_pat!() => {
                    slf.emit_error(Error::NoncharacterCharacterReference);
                }
                // 0x000d, or a control that is not whitespace
                x @ (0x000d | control_pat!())
                    if !matches!(x, 0x0009 | 0x000a | 0x000c | 0x0020) =>
                {
                    slf.emit_error(Error::ControlCharacterReference);
                    slf.character_reference_code = match x {
                        0x80 => 0x20AC, // EURO SIGN (€)
                        0x82 => 0x201A, // SINGLE LOW-9 QUOTATION MARK (‚)
                        0x83 => 0x0192, // LATIN SMALL LETTER F WITH HOOK (ƒ)
                        0x84 => 0x201E, // DOUBLE LOW-9 QUOTATION MARK („)
                        0x85 => 0x2026, // HORIZONTAL ELLIPSIS (…)
                        0x86 => 0x2020, // DAGGER (†)
                        0x87 => 0x2021, // DOUBLE DAGGER (‡)
                        0x88 => 0x02C6, // MODIFIER LETTER CIRCUMFLEX ACCENT (ˆ)
                        0x89 => 0x2030, // PER MILLE SIGN (‰)
                        0x8A => 0x0160, // LATIN CAPITAL LETTER S WITH CARON (Š)
                        0x8B => 0x2039, // SINGLE LEFT-POINTING ANGLE QUOTATION MARK (‹)
                        0x8C => 0x0152, // LATIN CAPITAL LIGATURE OE (Œ)
                        0x8E => 0x017D, // LATIN CAPITAL LETTER Z WITH CARON (Ž)
                        0x91 => 0x2018, // LEFT SINGLE QUOTATION MARK (‘)
                        0x92 => 0x2019, // RIGHT SINGLE QUOTATION MARK (’)
                        0x93 => 0x201C, // LEFT DOUBLE QUOTATION MARK (“)
                        0x94 => 0x201D, // RIGHT DOUBLE QUOTATION MARK (”)
                        0x95 => 0x2022, // BULLET (•)
                        0x96 => 0x2013, // EN DASH (–)
                        0x97 => 0x2014, // EM DASH (—)
                        0x98 => 0x02DC, // SMALL TILDE (˜)
                        0x99 => 0x2122, // TRADE MARK SIGN (™)
                        0x9A => 0x0161, // LATIN SMALL LETTER S WITH CARON (š)
                        0x9B => 0x203A, // SINGLE RIGHT-POINTING ANGLE QUOTATION MARK (›)
                        0x9C => 0x0153, // LATIN SMALL LIGATURE OE (œ)
                        0x9E => 0x017E, // LATIN SMALL LETTER Z WITH CARON (ž)
                        0x9F => 0x0178, // LATIN CAPITAL LETTER Y WITH DIAERESIS (Ÿ)
                        _ => slf.character_reference_code,
                    };
                }
                _ => (),
            }

            slf.temporary_buffer.clear();
            slf.temporary_buffer
                .push(std::char::from_u32(slf.character_reference_code).unwrap());
            slf.flush_code_points_consumed_as_character_reference();
            slf.state = slf.return_state.take().unwrap();
            ControlToken::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{tokenize, Error, Token};

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).0
    }

    fn errors(input: &str) -> Vec<Error> {
        tokenize(input).1.into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn plain_text_is_one_string_run() {
        assert_eq!(tokens("hello world"), [Token::String("hello world".into())]);
    }

    #[test]
    fn tag_names_and_attribute_names_are_lowercased() {
        let tokens = tokens("<DIV CLASS=a Data-X='b'>");
        match &tokens[0] {
            Token::StartTag(tag) => {
                assert_eq!(tag.name, "div");
                assert_eq!(tag.attributes.get("class"), Some("a"));
                assert_eq!(tag.attributes.get("data-x"), Some("b"));
            }
            other => panic!("expected a start tag, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_attributes_keep_the_first_value() {
        let tokens = tokens("<a href='1' href='2'>");
        match &tokens[0] {
            Token::StartTag(tag) => {
                assert_eq!(tag.attributes.get("href"), Some("1"));
                assert_eq!(tag.attributes.len(), 1);
            }
            other => panic!("expected a start tag, got {:?}", other),
        }
        assert_eq!(errors("<a href='1' href='2'>"), [Error::DuplicateAttribute]);
    }

    #[test]
    fn ambiguous_ampersand_in_attribute_values_stays_literal() {
        // a legacy reference followed by an alphanumeric is left alone inside attributes
        let tokens = tokens("<a href='?a=b&copy=1'>");
        match &tokens[0] {
            Token::StartTag(tag) => {
                assert_eq!(tag.attributes.get("href"), Some("?a=b&copy=1"));
            }
            other => panic!("expected a start tag, got {:?}", other),
        }
        assert!(errors("<a href='?a=b&copy=1'>").is_empty());
    }

    #[test]
    fn legacy_reference_in_text_decodes_with_error() {
        assert_eq!(tokens("&copy=1"), [Token::String("\u{a9}=1".into())]);
        assert!(errors("&copy=1").contains(&Error::MissingSemicolonAfterCharacterReference));
    }

    #[test]
    fn numeric_references_clamp_and_substitute() {
        assert_eq!(tokens("&#x110000;"), [Token::String("\u{fffd}".into())]);
        assert_eq!(tokens("&#x80;"), [Token::String("\u{20ac}".into())]);
        assert_eq!(
            errors("&#x80;"),
            [Error::ControlCharacterReference]
        );
    }

    #[test]
    fn comment_state_quirks() {
        assert_eq!(tokens("<!---->"), [Token::Comment("".into())]);
        assert_eq!(tokens("<!--x--!>"), [Token::Comment("x".into())]);
        assert!(errors("<!--x--!>").contains(&Error::IncorrectlyClosedComment));
        assert!(errors("<!-->").contains(&Error::AbruptClosingOfEmptyComment));
        assert!(errors("<!--<!--x-->").contains(&Error::NestedComment));
    }

    #[test]
    fn doctype_identifiers_round_trip() {
        let tokens = tokens("<!DOCTYPE html PUBLIC \"pub\" 'sys'>");
        match &tokens[0] {
            Token::Doctype(doctype) => {
                assert_eq!(doctype.name, "html");
                assert_eq!(doctype.public_identifier.as_deref(), Some("pub"));
                assert_eq!(doctype.system_identifier.as_deref(), Some("sys"));
                assert!(!doctype.force_quirks);
            }
            other => panic!("expected a doctype, got {:?}", other),
        }
    }

    #[test]
    fn eof_in_tag_is_reported() {
        assert_eq!(errors("<div foo"), [Error::EofInTag]);
        assert!(tokens("<div foo").is_empty());
    }

    #[test]
    fn stray_lt_is_text() {
        assert_eq!(tokens("1 < 2"), [Token::String("1 < 2".into())]);
        assert!(errors("1 < 2").contains(&Error::InvalidFirstCharacterOfTagName));
    }
}
