//! Lexer for Shell Source Text
//!
//! Tokenizes input into the stream the parser consumes. Handles:
//! - The fixed operator vocabulary: `| && || ! ; & ( ) { }`
//! - Words, with single-quote, double-quote, and backslash rules
//! - `#` comments
//! - Bridged blocks: `{#tag raw text}` lexes to a tag token, a raw text
//!   token, and the closing brace

use log::trace;

use crate::parser::types::LexerError;

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Eof,
    Newline,
    Semi,    // ;
    Amp,     // &
    Pipe,    // |
    AndAnd,  // &&
    OrOr,    // ||
    Bang,    // !
    LParen,  // (
    RParen,  // )
    LBrace,  // {
    RBrace,  // }
    /// Interpreter tag following `{#`.
    BridgeTag,
    /// Raw text of a bridged block, up to its closing brace.
    BridgeText,
    Word,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Newline => "NEWLINE",
            Self::Semi => ";",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::BridgeTag => "BRIDGE_TAG",
            Self::BridgeText => "BRIDGE_TEXT",
            Self::Word => "WORD",
        }
    }
}

/// A token produced by the lexer.
///
/// For `Word` tokens `value` has quote delimiters stripped while `raw`
/// keeps the original lexeme, so the AST can reproduce source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub raw: String,
    pub line: usize,
    pub column: usize,
    pub quoted: bool,
    pub single_quoted: bool,
}

impl Token {
    fn new(
        token_type: TokenType,
        value: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        let value = value.into();
        Self {
            token_type,
            raw: value.clone(),
            value,
            line,
            column,
            quoted: false,
            single_quoted: false,
        }
    }
}

/// Characters that terminate an unquoted word.
fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')')
}

/// The lexer walks the input once and produces a flat token list.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Tokenize the whole input. The final token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                ' ' | '\t' => {
                    self.bump();
                }
                '#' => {
                    // Comment runs to end of line; the newline stays.
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '\n' => {
                    self.bump();
                    tokens.push(Token::new(TokenType::Newline, "\n", line, column));
                }
                ';' => {
                    self.bump();
                    tokens.push(Token::new(TokenType::Semi, ";", line, column));
                }
                '&' => {
                    self.bump();
                    if self.peek() == Some('&') {
                        self.bump();
                        tokens.push(Token::new(TokenType::AndAnd, "&&", line, column));
                    } else {
                        tokens.push(Token::new(TokenType::Amp, "&", line, column));
                    }
                }
                '|' => {
                    self.bump();
                    if self.peek() == Some('|') {
                        self.bump();
                        tokens.push(Token::new(TokenType::OrOr, "||", line, column));
                    } else {
                        tokens.push(Token::new(TokenType::Pipe, "|", line, column));
                    }
                }
                '!' => {
                    self.bump();
                    tokens.push(Token::new(TokenType::Bang, "!", line, column));
                }
                '(' => {
                    self.bump();
                    tokens.push(Token::new(TokenType::LParen, "(", line, column));
                }
                ')' => {
                    self.bump();
                    tokens.push(Token::new(TokenType::RParen, ")", line, column));
                }
                '{' => {
                    self.bump();
                    if self.peek() == Some('#') {
                        self.bump();
                        self.bridge_block(&mut tokens, line, column)?;
                    } else {
                        tokens.push(Token::new(TokenType::LBrace, "{", line, column));
                    }
                }
                '}' => {
                    self.bump();
                    tokens.push(Token::new(TokenType::RBrace, "}", line, column));
                }
                _ => {
                    let token = self.word(line, column)?;
                    tokens.push(token);
                }
            }
        }

        tokens.push(Token::new(TokenType::Eof, "", self.line, self.column));
        trace!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Lex one word, stripping quotes and recording quoting flags.
    fn word(&mut self, line: usize, column: usize) -> Result<Token, LexerError> {
        let mut value = String::new();
        let mut raw = String::new();
        let mut quoted = false;
        let mut single_quoted = false;

        while let Some(c) = self.peek() {
            match c {
                '\'' => {
                    quoted = true;
                    single_quoted = true;
                    raw.push(c);
                    self.bump();
                    loop {
                        match self.bump() {
                            None => {
                                return Err(LexerError::new(
                                    "unterminated single quote",
                                    line,
                                    column,
                                ))
                            }
                            Some('\'') => {
                                raw.push('\'');
                                break;
                            }
                            Some(ch) => {
                                value.push(ch);
                                raw.push(ch);
                            }
                        }
                    }
                }
                '"' => {
                    quoted = true;
                    raw.push(c);
                    self.bump();
                    loop {
                        match self.bump() {
                            None => {
                                return Err(LexerError::new(
                                    "unterminated double quote",
                                    line,
                                    column,
                                ))
                            }
                            Some('"') => {
                                raw.push('"');
                                break;
                            }
                            Some('\\') => {
                                raw.push('\\');
                                match self.bump() {
                                    // Only these escapes are special inside
                                    // double quotes.
                                    Some(ch @ ('"' | '\\' | '$' | '`')) => {
                                        value.push(ch);
                                        raw.push(ch);
                                    }
                                    Some(ch) => {
                                        value.push('\\');
                                        value.push(ch);
                                        raw.push(ch);
                                    }
                                    None => {
                                        return Err(LexerError::new(
                                            "unterminated double quote",
                                            line,
                                            column,
                                        ))
                                    }
                                }
                            }
                            Some(ch) => {
                                value.push(ch);
                                raw.push(ch);
                            }
                        }
                    }
                }
                '\\' => {
                    self.bump();
                    match self.bump() {
                        // Line continuation.
                        Some('\n') => {}
                        Some(ch) => {
                            quoted = true;
                            value.push(ch);
                            raw.push('\\');
                            raw.push(ch);
                        }
                        None => {
                            value.push('\\');
                            raw.push('\\');
                        }
                    }
                }
                c if is_word_boundary(c) => break,
                c => {
                    value.push(c);
                    raw.push(c);
                    self.bump();
                }
            }
        }

        let mut token = Token::new(TokenType::Word, value, line, column);
        token.raw = raw;
        token.quoted = quoted;
        token.single_quoted = single_quoted;
        Ok(token)
    }

    /// Lex the inside of a `{#tag ...}` block: tag, raw text, close brace.
    ///
    /// The text is taken verbatim up to the brace that balances the
    /// opening one, so bridged programs may themselves contain braces.
    fn bridge_block(
        &mut self,
        tokens: &mut Vec<Token>,
        line: usize,
        column: usize,
    ) -> Result<(), LexerError> {
        let mut tag = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '}' {
                break;
            }
            tag.push(c);
            self.bump();
        }
        if tag.is_empty() {
            return Err(LexerError::new("missing bridge interpreter tag", line, column));
        }
        tokens.push(Token::new(TokenType::BridgeTag, tag, line, column));

        // Skip the single separator between tag and text.
        if matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }

        let (text_line, text_column) = (self.line, self.column);
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => {
                    return Err(LexerError::new("unterminated bridged block", line, column))
                }
                Some('{') => {
                    depth += 1;
                    text.push('{');
                    self.bump();
                }
                Some('}') if depth == 0 => break,
                Some('}') => {
                    depth -= 1;
                    text.push('}');
                    self.bump();
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        tokens.push(Token::new(
            TokenType::BridgeText,
            text,
            text_line,
            text_column,
        ));

        let (rb_line, rb_column) = (self.line, self.column);
        self.bump(); // the balancing '}'
        tokens.push(Token::new(TokenType::RBrace, "}", rb_line, rb_column));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn test_simple_command() {
        let tokens = lex("echo hello");
        assert_eq!(tokens.len(), 3); // echo, hello, EOF
        assert_eq!(tokens[0].token_type, TokenType::Word);
        assert_eq!(tokens[0].value, "echo");
        assert_eq!(tokens[1].value, "hello");
        assert_eq!(tokens[2].token_type, TokenType::Eof);
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a && b || c ; d & e | f");
        let types: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Word,
                TokenType::AndAnd,
                TokenType::Word,
                TokenType::OrOr,
                TokenType::Word,
                TokenType::Semi,
                TokenType::Word,
                TokenType::Amp,
                TokenType::Word,
                TokenType::Pipe,
                TokenType::Word,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_grouping() {
        let tokens = lex("( a ) { b ; }");
        assert_eq!(tokens[0].token_type, TokenType::LParen);
        assert_eq!(tokens[2].token_type, TokenType::RParen);
        assert_eq!(tokens[3].token_type, TokenType::LBrace);
        assert_eq!(tokens[6].token_type, TokenType::RBrace);
    }

    #[test]
    fn test_single_quotes() {
        let tokens = lex("echo 'hello world'");
        assert_eq!(tokens[1].value, "hello world");
        assert_eq!(tokens[1].raw, "'hello world'");
        assert!(tokens[1].quoted);
        assert!(tokens[1].single_quoted);
    }

    #[test]
    fn test_double_quotes() {
        let tokens = lex("echo \"hello world\"");
        assert_eq!(tokens[1].value, "hello world");
        assert!(tokens[1].quoted);
        assert!(!tokens[1].single_quoted);
    }

    #[test]
    fn test_mixed_quote_word_flags_are_per_word() {
        let tokens = lex("echo 'a'\"b\"c");
        assert_eq!(tokens[1].value, "abc");
        assert_eq!(tokens[1].raw, "'a'\"b\"c");
        assert!(tokens[1].quoted);
        // The single-quote flag covers the whole token once any span
        // used single quotes.
        assert!(tokens[1].single_quoted);
    }

    #[test]
    fn test_quotes_suppress_operators() {
        let tokens = lex("echo 'a && b'");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].value, "a && b");
    }

    #[test]
    fn test_escape() {
        let tokens = lex(r"echo a\ b");
        assert_eq!(tokens[1].value, "a b");
        assert!(tokens[1].quoted);
    }

    #[test]
    fn test_comment() {
        let tokens = lex("echo hi # trailing words\n");
        let types: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Word,
                TokenType::Word,
                TokenType::Newline,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_bang() {
        let tokens = lex("! false");
        assert_eq!(tokens[0].token_type, TokenType::Bang);
        assert_eq!(tokens[1].value, "false");
    }

    #[test]
    fn test_bridge_block() {
        let tokens = lex("{#python print(40 + 2)}");
        assert_eq!(tokens[0].token_type, TokenType::BridgeTag);
        assert_eq!(tokens[0].value, "python");
        assert_eq!(tokens[1].token_type, TokenType::BridgeText);
        assert_eq!(tokens[1].value, "print(40 + 2)");
        assert_eq!(tokens[2].token_type, TokenType::RBrace);
    }

    #[test]
    fn test_bridge_block_nested_braces() {
        let tokens = lex("{#node if (x) { y() }}");
        assert_eq!(tokens[1].value, "if (x) { y() }");
        assert_eq!(tokens[2].token_type, TokenType::RBrace);
    }

    #[test]
    fn test_unterminated_quote_errors() {
        assert!(Lexer::new("echo 'oops").tokenize().is_err());
        assert!(Lexer::new("echo \"oops").tokenize().is_err());
    }

    #[test]
    fn test_unterminated_bridge_errors() {
        assert!(Lexer::new("{#ruby puts 1").tokenize().is_err());
    }

    #[test]
    fn test_positions() {
        let tokens = lex("a\nbb ccc");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 4));
    }
}
