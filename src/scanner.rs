use super::token::{Token, TokenType};

/// Turns a source buffer into a stream of tokens. Mirrors the reference
/// scanner one-for-one: byte-at-a-time, no backtracking, one token of
/// lookahead is never needed because every multi-char lexeme is resolved
/// by peeking a single extra byte.
pub struct Scanner<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    line: u32,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn byte_at(&self, idx: usize) -> u8 {
        self.source.as_bytes()[idx]
    }

    fn peek(&self) -> u8 {
        if self.at_end() {
            0
        } else {
            self.byte_at(self.current)
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.byte_at(self.current + 1)
        }
    }

    fn advance(&mut self) -> u8 {
        let c = self.byte_at(self.current);
        self.current += 1;
        c
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.at_end() || self.byte_at(self.current) != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> &'src str {
        &self.source[self.start..self.current]
    }

    fn make_token(&self, typ: TokenType) -> Token<'src> {
        Token::new(typ, self.lexeme(), self.line)
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token::new(TokenType::Error, message, self.line)
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && !self.at_end() {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn identifier_type(&self) -> TokenType {
        let text = self.lexeme();
        match text {
            "and" => TokenType::And,
            "class" => TokenType::Class,
            "else" => TokenType::Else,
            "false" => TokenType::False,
            "for" => TokenType::For,
            "fun" => TokenType::Fun,
            "if" => TokenType::If,
            "nil" => TokenType::Nil,
            "or" => TokenType::Or,
            "print" => TokenType::Print,
            "return" => TokenType::Return,
            "super" => TokenType::Super,
            "this" => TokenType::This,
            "true" => TokenType::True,
            "var" => TokenType::Var,
            "while" => TokenType::While,
            _ => TokenType::Identifier,
        }
    }

    fn identifier(&mut self) -> Token<'src> {
        while is_alpha(self.peek()) || is_digit(self.peek()) {
            self.advance();
        }
        self.make_token(self.identifier_type())
    }

    fn number(&mut self) -> Token<'src> {
        while is_digit(self.peek()) {
            self.advance();
        }
        if self.peek() == b'.' && is_digit(self.peek_next()) {
            self.advance();
            while is_digit(self.peek()) {
                self.advance();
            }
        }
        self.make_token(TokenType::Number)
    }

    fn string(&mut self) -> Token<'src> {
        while self.peek() != b'"' && !self.at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.at_end() {
            return self.error_token("Unterminated string.");
        }
        self.advance();
        self.make_token(TokenType::String)
    }

    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.at_end() {
            return self.make_token(TokenType::Eof);
        }

        let c = self.advance();

        if is_alpha(c) {
            return self.identifier();
        }
        if is_digit(c) {
            return self.number();
        }

        match c {
            b'(' => self.make_token(TokenType::LeftParen),
            b')' => self.make_token(TokenType::RightParen),
            b'{' => self.make_token(TokenType::LeftBrace),
            b'}' => self.make_token(TokenType::RightBrace),
            b';' => self.make_token(TokenType::Semicolon),
            b',' => self.make_token(TokenType::Comma),
            b'.' => self.make_token(TokenType::Dot),
            b'-' => self.make_token(TokenType::Minus),
            b'+' => self.make_token(TokenType::Plus),
            b'/' => self.make_token(TokenType::Slash),
            b'*' => self.make_token(TokenType::Star),
            b'!' => {
                let typ = if self.matches(b'=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.make_token(typ)
            }
            b'=' => {
                let typ = if self.matches(b'=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.make_token(typ)
            }
            b'<' => {
                let typ = if self.matches(b'=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.make_token(typ)
            }
            b'>' => {
                let typ = if self.matches(b'=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.make_token(typ)
            }
            b'"' => self.string(),
            _ => self.error_token("Unexpected character."),
        }
    }
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(source: &str) -> Vec<TokenType> {
        let mut scanner = Scanner::new(source);
        let mut types = Vec::new();
        loop {
            let token = scanner.scan_token();
            types.push(token.typ);
            if token.typ == TokenType::Eof {
                break;
            }
        }
        types
    }

    #[test]
    fn scans_punctuation_and_operators() {
        use TokenType::*;
        assert_eq!(
            scan_all("(){};,.+-*/! != = == < <= > >="),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Semicolon, Comma, Dot, Plus, Minus,
                Star, Slash, Bang, BangEqual, Equal, EqualEqual, Less, LessEqual, Greater,
                GreaterEqual, Eof
            ]
        );
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let mut scanner = Scanner::new("// hello\nvar");
        let token = scanner.scan_token();
        assert_eq!(token.typ, TokenType::Var);
        assert_eq!(token.line, 2);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let mut scanner = Scanner::new("\"abc");
        let token = scanner.scan_token();
        assert_eq!(token.typ, TokenType::Error);
        assert_eq!(token.lexeme, "Unterminated string.");
    }

    #[test]
    fn numbers_with_fraction() {
        let mut scanner = Scanner::new("1.5 2");
        assert_eq!(scanner.scan_token().lexeme, "1.5");
        assert_eq!(scanner.scan_token().lexeme, "2");
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(scan_all("and class orchard"), vec![
            TokenType::And,
            TokenType::Class,
            TokenType::Identifier,
            TokenType::Eof
        ]);
    }
}
