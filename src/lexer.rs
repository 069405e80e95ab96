//! Tokenizer for access log format strings.
//!
//! A format string is literal text mixed with `$name` fields and
//! `$header.Name` header fields. Identifier characters are `[A-Za-z0-9_-]`.
//! A `$` not followed by an identifier character is literal text.
//!
//! The scanner is a small state machine. [`step`] is the transition function
//! for one character, [`State::finish`] decides the token at end of input,
//! and [`lex`] runs both over the input to produce the next token.
//!
//! Lengths are byte offsets into the input. Every character that can end a
//! token is ASCII, so token boundaries always fall on `char` boundaries.

/// Classification of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Literal text, copied to the output unchanged.
    Text,
    /// A `$name` field, resolved against the field table.
    Field,
    /// A `$header.Name` field.
    Header,
}

/// Scanner state while consuming one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Start,
    Text,
    /// Just consumed a `$`.
    Dollar,
    Field,
    /// Consumed `$header.`, the header name comes next.
    Dot,
    Header,
}

/// Outcome of feeding one character to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The character belongs to the current token.
    Next(State),
    /// The current token ends before the character.
    Emit(TokenKind),
}

/// The field name that switches the scanner into header mode on a `.`.
pub const HEADER_PREFIX: &str = "$header";

#[inline]
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Feeds character `c` to the scanner in `state`.
///
/// `consumed` is the part of the current token scanned so far; it decides
/// whether a `.` starts a header name.
pub fn step(state: State, consumed: &str, c: char) -> Step {
    match state {
        State::Start if c == '$' => Step::Next(State::Dollar),
        State::Start => Step::Next(State::Text),
        State::Text if c == '$' => Step::Emit(TokenKind::Text),
        State::Text => Step::Next(State::Text),
        State::Dollar if is_ident_char(c) => Step::Next(State::Field),
        State::Dollar => Step::Next(State::Text),
        State::Field if c == '.' && consumed == HEADER_PREFIX => Step::Next(State::Dot),
        State::Field if is_ident_char(c) => Step::Next(State::Field),
        State::Field => Step::Emit(TokenKind::Field),
        State::Dot if is_ident_char(c) => Step::Next(State::Header),
        State::Dot => Step::Emit(TokenKind::Field),
        State::Header if is_ident_char(c) => Step::Next(State::Header),
        State::Header => Step::Emit(TokenKind::Header),
    }
}

impl State {
    /// Token emitted when the input runs out after `len` bytes.
    ///
    /// A trailing `$header.` yields a `Field` token one byte short, i.e.
    /// `$header`, leaving the `.` to be scanned as text. `$header` is not a
    /// field, so such a format fails to compile.
    pub fn finish(self, len: usize) -> (TokenKind, usize) {
        match self {
            State::Dot => (TokenKind::Field, len.saturating_sub(1)),
            State::Field => (TokenKind::Field, len),
            State::Header => (TokenKind::Header, len),
            State::Start | State::Text | State::Dollar => (TokenKind::Text, len),
        }
    }
}

/// Scans the next token at the start of `input`.
///
/// Returns the token kind and its length in bytes. The length is non-zero
/// whenever `input` is non-empty.
///
/// # Examples
///
/// ```
/// # use access_logger::lexer::{lex, TokenKind};
/// assert_eq!(lex("$remote_addr - x"), (TokenKind::Field, 12));
/// assert_eq!(lex("$header.Referer\""), (TokenKind::Header, 15));
/// assert_eq!(lex("GET $request"), (TokenKind::Text, 4));
/// ```
pub fn lex(input: &str) -> (TokenKind, usize) {
    let mut state = State::Start;
    for (i, c) in input.char_indices() {
        match step(state, &input[..i], c) {
            Step::Next(next) => state = next,
            Step::Emit(kind) => return (kind, i),
        }
    }
    state.finish(input.len())
}

/// One token borrowed from the format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Iterator over all tokens of a format string.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

/// Splits `format` into tokens.
pub fn tokens(format: &str) -> Tokens<'_> {
    Tokens { rest: format }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.rest.is_empty() {
            return None;
        }
        let (kind, len) = lex(self.rest);
        let (text, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(Token { kind, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(format: &str) -> Vec<(TokenKind, &str)> {
        tokens(format).map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_start_transitions() {
        assert_eq!(step(State::Start, "", '$'), Step::Next(State::Dollar));
        assert_eq!(step(State::Start, "", 'a'), Step::Next(State::Text));
        assert_eq!(step(State::Start, "", '.'), Step::Next(State::Text));
    }

    #[test]
    fn test_text_transitions() {
        assert_eq!(step(State::Text, "ab", 'c'), Step::Next(State::Text));
        assert_eq!(step(State::Text, "ab", '$'), Step::Emit(TokenKind::Text));
    }

    #[test]
    fn test_dollar_transitions() {
        assert_eq!(step(State::Dollar, "$", 'a'), Step::Next(State::Field));
        assert_eq!(step(State::Dollar, "$", '-'), Step::Next(State::Field));
        assert_eq!(step(State::Dollar, "$", ' '), Step::Next(State::Text));
        assert_eq!(step(State::Dollar, "$", '$'), Step::Next(State::Text));
    }

    #[test]
    fn test_field_transitions() {
        assert_eq!(step(State::Field, "$a", 'b'), Step::Next(State::Field));
        assert_eq!(step(State::Field, "$a", ' '), Step::Emit(TokenKind::Field));
        assert_eq!(step(State::Field, "$a", '.'), Step::Emit(TokenKind::Field));
        assert_eq!(step(State::Field, "$header", '.'), Step::Next(State::Dot));
        assert_eq!(step(State::Field, "$Header", '.'), Step::Emit(TokenKind::Field));
    }

    #[test]
    fn test_dot_and_header_transitions() {
        assert_eq!(step(State::Dot, "$header.", 'X'), Step::Next(State::Header));
        assert_eq!(step(State::Dot, "$header.", ' '), Step::Emit(TokenKind::Field));
        assert_eq!(step(State::Header, "$header.X", '-'), Step::Next(State::Header));
        assert_eq!(step(State::Header, "$header.X", '.'), Step::Emit(TokenKind::Header));
    }

    #[test]
    fn test_finish() {
        assert_eq!(State::Start.finish(0), (TokenKind::Text, 0));
        assert_eq!(State::Dollar.finish(1), (TokenKind::Text, 1));
        assert_eq!(State::Field.finish(4), (TokenKind::Field, 4));
        assert_eq!(State::Dot.finish(8), (TokenKind::Field, 7));
        assert_eq!(State::Header.finish(9), (TokenKind::Header, 9));
    }

    #[test]
    fn test_mixed_format() {
        assert_eq!(
            scan("$remote_addr \"$request\" $response_status"),
            vec![
                (TokenKind::Field, "$remote_addr"),
                (TokenKind::Text, " \""),
                (TokenKind::Field, "$request"),
                (TokenKind::Text, "\" "),
                (TokenKind::Field, "$response_status"),
            ]
        );
    }

    #[test]
    fn test_header_tokens() {
        assert_eq!(
            scan("$a \"$header.User-Agent\""),
            vec![
                (TokenKind::Field, "$a"),
                (TokenKind::Text, " \""),
                (TokenKind::Header, "$header.User-Agent"),
                (TokenKind::Text, "\""),
            ]
        );
        assert_eq!(
            scan("$header.a.b"),
            vec![(TokenKind::Header, "$header.a"), (TokenKind::Text, ".b")]
        );
    }

    #[test]
    fn test_lone_dollar_is_text() {
        assert_eq!(scan("$"), vec![(TokenKind::Text, "$")]);
        assert_eq!(scan("cost: $ 5"), vec![(TokenKind::Text, "cost: "), (TokenKind::Text, "$ 5")]);
        assert_eq!(scan("$$a"), vec![(TokenKind::Text, "$$a")]);
    }

    #[test]
    fn test_dot_ends_plain_field() {
        assert_eq!(scan("$a.b"), vec![(TokenKind::Field, "$a"), (TokenKind::Text, ".b")]);
    }

    #[test]
    fn test_trailing_header_dot() {
        assert_eq!(scan("$header."), vec![(TokenKind::Field, "$header"), (TokenKind::Text, ".")]);
        assert_eq!(scan("$header. "), vec![(TokenKind::Field, "$header."), (TokenKind::Text, " ")]);
    }

    #[test]
    fn test_non_ascii_text() {
        assert_eq!(
            scan("żółw $a"),
            vec![(TokenKind::Text, "żółw "), (TokenKind::Field, "$a")]
        );
        assert_eq!(scan("$a→"), vec![(TokenKind::Field, "$a"), (TokenKind::Text, "→")]);
    }
}
