/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! TI BASIC tokenizer and detokenizer: the compact on-disk/in-memory form a
//! `SAVE`d BASIC program takes, and the textual form a programmer edits.
//!
//! A tokenised program is a header, a table mapping line numbers to byte
//! offsets, and the tokenised lines themselves. Keywords, operators and
//! punctuation each collapse to a single byte (`>80`-`>FE`); everything else
//! is either a quoted string, an unquoted string (numeric literals and
//! identifiers), or a two-byte big-endian line number reference.

use thiserror::Error;

/// Where a freshly-tokenised program's line-number table ends and the
/// program text begins, counting down from the top of low memory.
pub const PROGRAM_TOP: u16 = 0x37D7;

const TOKEN_QUOTED_STRING: u8 = 0xC7;
const TOKEN_UNQUOTED_STRING: u8 = 0xC8;
const TOKEN_LINE_NUMBER: u8 = 0xC9;
const TOKEN_COLON: u8 = 0xB5;

/// One keyword/operator/punctuation token and the text it stands for, plus
/// whether the detokenizer should pad it with a trailing space (every
/// keyword does; operators and punctuation mostly don't).
struct Token {
    byte: u8,
    text: &'static str,
    space: bool,
}

macro_rules! tok {
    ($byte:expr, $text:expr) => {
        Token { byte: $byte, text: $text, space: true }
    };
    ($byte:expr, $text:expr, nospace) => {
        Token { byte: $byte, text: $text, space: false }
    };
}

/// The full keyword/operator/punctuation table, byte value to source text.
/// Grounded on the original's `tokens[]` table (`tibasic_tokens.h`).
const TOKENS: &[Token] = &[
    tok!(0x81, "ELSE"),
    tok!(0x82, "::"),
    tok!(0x83, "!"),
    tok!(0x84, "IF"),
    tok!(0x85, "GO"),
    tok!(0x86, "GOTO"),
    tok!(0x87, "GOSUB"),
    tok!(0x88, "RETURN"),
    tok!(0x89, "DEF"),
    tok!(0x8A, "DIM"),
    tok!(0x8B, "END"),
    tok!(0x8C, "FOR"),
    tok!(0x8D, "LET"),
    tok!(0x8E, "BREAK"),
    tok!(0x8F, "UNBREAK"),
    tok!(0x90, "TRACE"),
    tok!(0x91, "UNTRACE"),
    tok!(0x92, "INPUT"),
    tok!(0x93, "DATA"),
    tok!(0x94, "RESTORE"),
    tok!(0x95, "RANDOMIZE"),
    tok!(0x96, "NEXT"),
    tok!(0x97, "READ"),
    tok!(0x98, "STOP"),
    tok!(0x99, "DELETE"),
    tok!(0x9A, "REM"),
    tok!(0x9B, "ON"),
    tok!(0x9C, "PRINT"),
    tok!(0x9D, "CALL"),
    tok!(0x9E, "OPTION"),
    tok!(0x9F, "OPEN"),
    tok!(0xA0, "CLOSE"),
    tok!(0xA1, "SUB"),
    tok!(0xA2, "DISPLAY"),
    tok!(0xA4, "ACCEPT"),
    tok!(0xA6, "WARNING"),
    tok!(0xA7, "SUBEXIT"),
    tok!(0xA8, "SUBEND"),
    tok!(0xA9, "RUN"),
    tok!(0xB0, "THEN"),
    tok!(0xB1, "TO"),
    tok!(0xB2, "STEP"),
    tok!(0xB3, ",", nospace),
    tok!(0xB4, ";", nospace),
    tok!(TOKEN_COLON, ":", nospace),
    tok!(0xB6, ")", nospace),
    tok!(0xB7, "(", nospace),
    tok!(0xB8, "&", nospace),
    tok!(0xBA, "OR"),
    tok!(0xBB, "AND"),
    tok!(0xBD, "NOT"),
    tok!(0xBE, "=", nospace),
    tok!(0xBF, "<", nospace),
    tok!(0xC0, ">", nospace),
    tok!(0xC1, "+", nospace),
    tok!(0xC2, "-", nospace),
    tok!(0xC3, "*", nospace),
    tok!(0xC4, "/", nospace),
    tok!(0xC5, "^", nospace),
    tok!(0xCA, "EOF"),
    tok!(0xCB, "ABS"),
    tok!(0xCC, "ATN"),
    tok!(0xCD, "COS"),
    tok!(0xCE, "EXP"),
    tok!(0xCF, "INT"),
    tok!(0xD0, "LOG"),
    tok!(0xD1, "SGN"),
    tok!(0xD2, "SIN"),
    tok!(0xD3, "SQR"),
    tok!(0xD4, "TAN"),
    tok!(0xD5, "LEN"),
    tok!(0xD6, "CHR$"),
    tok!(0xD7, "RND"),
    tok!(0xD8, "SEG$"),
    tok!(0xD9, "POS"),
    tok!(0xDA, "VAL"),
    tok!(0xDB, "STR$"),
    tok!(0xDC, "ASC"),
    tok!(0xDE, "REC"),
    tok!(0xE0, "MIN"),
    tok!(0xE1, "RPT$"),
    tok!(0xE8, "NUMERIC"),
    tok!(0xE9, "DIGIT"),
    tok!(0xEB, "SIZE"),
    tok!(0xEC, "ALL"),
    tok!(0xED, "USING"),
    tok!(0xEE, "BEEP"),
    tok!(0xEF, "ERASE"),
    tok!(0xF0, "AT"),
    tok!(0xF1, "BASE"),
    tok!(0xF3, "VARIABLE"),
    tok!(0xF4, "RELATIVE"),
    tok!(0xF5, "INTERNAL"),
    tok!(0xF6, "SEQUENTIAL"),
    tok!(0xF7, "OUTPUT"),
    tok!(0xF8, "UPDATE"),
    tok!(0xF9, "APPEND"),
    tok!(0xFA, "FIXED"),
    tok!(0xFB, "PERMANENT"),
    tok!(0xFC, "TAB"),
    tok!(0xFD, "#", nospace),
    tok!(0xFE, "VALIDATE"),
];

fn token_by_byte(byte: u8) -> Option<&'static Token> {
    TOKENS.iter().find(|t| t.byte == byte)
}

fn token_by_text(text: &str) -> Option<&'static Token> {
    TOKENS.iter().find(|t| t.text == text)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BasicError {
    #[error("line {0} continues past the end of the program")]
    TruncatedLine(u32),
    #[error("unknown token byte >{0:02X}")]
    UnknownToken(u8),
}

/// One tokenised program line: its line number and the byte-coded body
/// (without the leading length byte or the trailing zero terminator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: u16,
    pub body: Vec<u8>,
}

/// Encodes a single line of BASIC source text (no leading line number, no
/// trailing newline) into its tokenised byte form.
///
/// This is a direct, simplified port of the original's single-pass
/// `processLine`: it does not type-check expressions, it only recognises
/// the keyword/operator table, quoted strings, and bare words/numbers.
pub fn encode_line(source: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chars = source.chars().peekable();
    let mut prev_was_call = false;

    while let Some(&c) = chars.peek() {
        if c == ' ' {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c == '"' {
                    chars.next();
                    break;
                }
                s.push(c);
                chars.next();
            }
            out.push(TOKEN_QUOTED_STRING);
            out.push(s.len() as u8);
            out.extend(s.bytes());
            prev_was_call = false;
            continue;
        }
        if c.is_ascii_digit() {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || c == '.' || c == 'E' {
                    s.push(c);
                    chars.next();
                    if c == 'E' {
                        if let Some(&sign) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                s.push(sign);
                                chars.next();
                            }
                        }
                    }
                } else {
                    break;
                }
            }
            out.push(TOKEN_UNQUOTED_STRING);
            out.push(s.len() as u8);
            out.extend(s.bytes());
            prev_was_call = false;
            continue;
        }

        // An identifier: letters (optionally ending in `$`), or a single
        // punctuation/operator character.
        let mut s = String::new();
        if c.is_ascii_alphabetic() {
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphabetic() {
                    s.push(c);
                    chars.next();
                } else if c == '$' {
                    s.push(c);
                    chars.next();
                    break;
                } else {
                    break;
                }
            }
        } else {
            s.push(c);
            chars.next();
        }

        match token_by_text(&s.to_ascii_uppercase()) {
            Some(token) if prev_was_call => {
                // A literal after CALL is emitted as an unquoted string,
                // not looked up in the keyword table (it names a subprogram).
                let _ = token;
                out.push(TOKEN_UNQUOTED_STRING);
                out.push(s.len() as u8);
                out.extend(s.bytes());
            }
            Some(token) => {
                out.push(token.byte);
                prev_was_call = token.byte == 0x9D; // CALL
            }
            None => {
                out.push(TOKEN_UNQUOTED_STRING);
                out.push(s.len() as u8);
                out.extend(s.bytes());
                prev_was_call = false;
            }
        }
    }

    out
}

/// Encodes a full program (one `"line_number source"` pair per entry) into
/// the tokenised byte stream: a 2-byte length-prefixed record per line, each
/// terminated by a zero byte, in ascending line-number order.
pub fn encode_program(lines: &[(u16, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (_, source) in lines {
        let body = encode_line(source);
        let len_pos = out.len();
        out.push(0); // placeholder for the line's tokenised length
        out.extend_from_slice(&body);
        out.push(0); // end-of-line marker
        let line_len = out.len() - len_pos - 2; // exclude the length byte and the terminator
        out[len_pos] = line_len as u8;
    }
    out
}

/// Decodes one tokenised line's bytes (as encoded by [`encode_line`], i.e.
/// starting right after the line's length byte, and not including the
/// trailing zero) back into readable BASIC source text.
pub fn decode_line(data: &[u8]) -> Result<String, BasicError> {
    let mut out = String::new();
    let mut i = 0;
    let mut prev_was_printable_or_close = false;

    while i < data.len() {
        let byte = data[i];
        if byte < 0x80 {
            out.push(byte as char);
            i += 1;
            prev_was_printable_or_close = true;
            continue;
        }

        match byte {
            TOKEN_QUOTED_STRING | TOKEN_UNQUOTED_STRING => {
                let len = *data.get(i + 1).ok_or(BasicError::TruncatedLine(0))? as usize;
                let start = i + 2;
                let end = start + len;
                let text = data.get(start..end).ok_or(BasicError::TruncatedLine(0))?;
                let text = String::from_utf8_lossy(text);
                if byte == TOKEN_QUOTED_STRING {
                    out.push('"');
                    out.push_str(&text);
                    out.push('"');
                } else {
                    out.push_str(&text);
                }
                i = end;
                prev_was_printable_or_close = true;
            }
            TOKEN_LINE_NUMBER => {
                let hi = *data.get(i + 1).ok_or(BasicError::TruncatedLine(0))? as u16;
                let lo = *data.get(i + 2).ok_or(BasicError::TruncatedLine(0))? as u16;
                out.push_str(&((hi << 8) | lo).to_string());
                i += 3;
                prev_was_printable_or_close = true;
            }
            _ => {
                let token = token_by_byte(byte).ok_or(BasicError::UnknownToken(byte))?;
                if prev_was_printable_or_close && (token.space || byte == TOKEN_COLON) {
                    out.push(' ');
                }
                out.push_str(token.text);
                if token.space {
                    out.push(' ');
                    prev_was_printable_or_close = false;
                } else {
                    prev_was_printable_or_close = true;
                }
                i += 1;
            }
        }
    }

    Ok(out.trim_end().to_string())
}

/// Decodes a program built by [`encode_program`]: reads each
/// length-prefixed, zero-terminated record in turn, returning the decoded
/// source lines in their on-disk order (ascending line number is a
/// convention, not something this function enforces).
pub fn decode_program(data: &[u8]) -> Result<Vec<String>, BasicError> {
    let mut lines = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let len = data[i] as usize;
        if len == 0 {
            break;
        }
        let body_end = i + 1 + len;
        let body = data.get(i + 1..body_end).ok_or(BasicError::TruncatedLine(0))?;
        lines.push(decode_line(body)?);
        i = body_end + 1; // skip the line's trailing zero terminator
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_keyword_and_quoted_string() {
        let bytes = encode_line(r#"PRINT "HELLO""#);
        assert_eq!(bytes[0], 0x9C); // PRINT
        assert_eq!(bytes[1], TOKEN_QUOTED_STRING);
        assert_eq!(bytes[2], 5);
        assert_eq!(&bytes[3..8], b"HELLO");
    }

    #[test]
    fn encodes_call_argument_as_unquoted_string() {
        let bytes = encode_line("CALL SOUND");
        assert_eq!(bytes[0], 0x9D); // CALL
        assert_eq!(bytes[1], TOKEN_UNQUOTED_STRING);
        assert_eq!(&bytes[3..8], b"SOUND");
    }

    #[test]
    fn round_trips_a_simple_line() {
        let source = r#"PRINT "HELLO""#;
        let bytes = encode_line(source);
        let decoded = decode_line(&bytes).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn round_trips_a_program_with_multiple_lines() {
        let program = [(10u16, "A=1"), (20u16, "PRINT A")];
        let bytes = encode_program(&program);
        let decoded = decode_program(&bytes).unwrap();
        assert_eq!(decoded, vec!["A=1".to_string(), "PRINT A".to_string()]);
    }

    #[test]
    fn unknown_token_byte_is_an_error() {
        let err = decode_line(&[0xFF]).unwrap_err();
        assert_eq!(err, BasicError::UnknownToken(0xFF));
    }

    #[test]
    fn random_quoted_strings_round_trip() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(0xBA51C);
        for _ in 0..50 {
            let len = rng.gen_range(0..=20);
            let text: String = (0..len).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect();
            let source = format!(r#"PRINT "{text}""#);
            let bytes = encode_line(&source);
            assert_eq!(decode_line(&bytes).unwrap(), source);
        }
    }
}
