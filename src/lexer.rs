//! Lexer for note-sheet text.
//!
//! Splits notation into whitespace-separated lexemes. Bracketed chord groups
//! and chord symbols may contain whitespace, so they are read as a unit up to
//! the closing glyph. The lexer never fails; malformed groups come out as
//! [`Token::Unterminated`] and the parser decides what to skip.

/// Token types for note-sheet notation
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `|`
    Bar,
    /// A pitch or rest lexeme such as `C#4/` or `-p`
    Word(String),
    /// `[C4 E4 G4]p`: member text between the brackets plus the rhythm suffix
    ChordGroup { inner: String, suffix: String },
    /// `{Am7}/`: chord symbol plus the rhythm suffix
    ChordSymbol { symbol: String, suffix: String },
    /// An opening `[` or `{` with no matching close before the end of input
    Unterminated(String),
}

/// A token with its position in the source
#[derive(Debug, Clone)]
pub struct LocatedToken {
    pub token: Token,
    /// Source text with internal whitespace collapsed to single spaces
    pub text: String,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    /// Closing glyphs a failed group scan proved absent from the rest of the input
    exhausted: Vec<char>,
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == '|' || c == '[' || c == '{'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::starting_at_line(input, 1)
    }

    /// Lex `input` reporting positions as if it began on `line` (used after frontmatter).
    pub fn starting_at_line(input: &'a str, line: usize) -> Self {
        Self {
            chars: input.chars().peekable(),
            line,
            column: 1,
            exhausted: Vec::new(),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&c) = self.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    /// Read up to `close`, consuming it. Returns `None` when input ends first.
    ///
    /// A miss is remembered, so later openers of the same kind fail without
    /// rescanning the remaining input.
    fn read_group(&mut self, close: char) -> Option<String> {
        if self.exhausted.contains(&close) {
            return None;
        }
        let mut inner = String::new();
        loop {
            match self.advance() {
                Some(c) if c == close => return Some(inner),
                Some(c) => inner.push(c),
                None => {
                    self.exhausted.push(close);
                    return None;
                }
            }
        }
    }

    pub fn tokenize(&mut self) -> Vec<LocatedToken> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.peek() {
            let line = self.line;
            let column = self.column;

            if c.is_whitespace() {
                self.advance();
                continue;
            }

            let (token, text) = match c {
                '|' => {
                    self.advance();
                    (Token::Bar, "|".to_string())
                }
                '[' | '{' => {
                    self.advance();
                    let close = if c == '[' { ']' } else { '}' };
                    let checkpoint = (self.chars.clone(), self.line, self.column);
                    match self.read_group(close) {
                        Some(inner) => {
                            let inner = collapse_whitespace(&inner);
                            let suffix = self.read_while(|c| !is_boundary(c));
                            let text = format!("{}{}{}{}", c, inner, close, suffix);
                            let token = if c == '[' {
                                Token::ChordGroup { inner, suffix }
                            } else {
                                Token::ChordSymbol {
                                    symbol: inner,
                                    suffix,
                                }
                            };
                            (token, text)
                        }
                        None => {
                            // Only the opening glyph is bad; lex what follows it normally
                            (self.chars, self.line, self.column) = checkpoint;
                            (Token::Unterminated(c.to_string()), c.to_string())
                        }
                    }
                }
                _ => {
                    let word = self.read_while(|c| !is_boundary(c));
                    (Token::Word(word.clone()), word)
                }
            };

            tokens.push(LocatedToken {
                token,
                text,
                line,
                column,
            });
        }

        tokens
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
