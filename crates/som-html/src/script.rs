//! Comment-aware lexing of special-tag content.
//!
//! The content of a special tag (by default `<script>`) is not markup. It is
//! split into code runs and comments so the comments can become nodes of
//! their own. String, template and regex literals are skipped so that a
//! `//` inside `"http://..."` or `/\/\*/` is not taken for a comment.
//!
//! Whether a `/` starts a regex is guessed from the last significant byte
//! before it: after an operator or opening punctuation it is a regex, after
//! anything else it is division. `return /x/` is read as division.

/// One piece of special-tag content. Slices borrow from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptToken<'a> {
    /// Everything between comments, verbatim.
    Code(&'a str),
    /// `// ...` without the slashes and without the line break.
    LineComment(&'a str),
    /// `/* ... */` without the delimiters.
    BlockComment {
        /// Text between the delimiters.
        content: &'a str,
        /// `false` when the comment ran to the end of input.
        terminated: bool,
    },
}

/// Bytes after which a `/` begins a regex literal.
const REGEX_CONTEXT: &[u8] = b"(,=:[!&|?{};+-*%<>~^";

/// Split `source` into code and comments.
///
/// Concatenating the tokens with their delimiters restored gives back
/// `source`, except that an unterminated block comment gains its `*/`.
#[must_use]
pub fn tokenize(source: &str) -> Vec<ScriptToken<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut code_start = 0;
    let mut previous: Option<u8> = None;
    let mut i = 0;

    while let Some(&b) = bytes.get(i) {
        match b {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i);
                previous = Some(b);
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                push_code(&mut tokens, &source[code_start..i]);
                let end = source[i..].find('\n').map_or(source.len(), |n| i + n);
                tokens.push(ScriptToken::LineComment(&source[i + 2..end]));
                i = end;
                code_start = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                push_code(&mut tokens, &source[code_start..i]);
                let body = i + 2;
                let close = source[body..].find("*/");
                let (content, end) = close.map_or((&source[body..], source.len()), |n| {
                    (&source[body..body + n], body + n + 2)
                });
                tokens.push(ScriptToken::BlockComment {
                    content,
                    terminated: close.is_some(),
                });
                i = end;
                code_start = i;
            }
            b'/' if previous.is_none_or(|p| REGEX_CONTEXT.contains(&p)) => {
                i = skip_regex(bytes, i);
                previous = Some(b'/');
            }
            _ => {
                if !b.is_ascii_whitespace() {
                    previous = Some(b);
                }
                i += 1;
            }
        }
    }
    push_code(&mut tokens, &source[code_start..]);
    tokens
}

fn push_code<'a>(tokens: &mut Vec<ScriptToken<'a>>, code: &'a str) {
    if !code.is_empty() {
        tokens.push(ScriptToken::Code(code));
    }
}

/// Index just past the literal opening at `start`. Plain strings stop at a
/// line break; template literals may span lines.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return i,
            _ if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index just past the regex literal (and its flags) opening at `start`.
/// A `/` inside a `[...]` class does not end it; a line break does.
fn skip_regex(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    let mut in_class = false;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'\n' => return i,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => {
                i += 1;
                while bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
                    i += 1;
                }
                return i;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}
