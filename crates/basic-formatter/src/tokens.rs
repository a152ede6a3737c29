use srcfmt_core::formatter::FormatDiagnostic;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
  /// Identifiers, keywords and numeric literals.
  Word,
  /// String and character literals.
  String,
  TextBlock,
  LineComment,
  BlockComment,
  DocComment,
  Operator,
}

/// How an operator that may be unary is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorRole {
  Binary,
  Prefix,
  Postfix,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
  pub kind: TokenKind,
  pub text: &'a str,
  /// 0-based line the token starts on.
  pub line: usize,
  /// 0-based line the token ends on.
  pub end_line: usize,
  /// 1-based character column the token starts on.
  pub column: usize,
  /// If whitespace separated this token from the previous one.
  pub space_before: bool,
  pub start: usize,
  pub end: usize,
  pub role: OperatorRole,
}

impl<'a> Token<'a> {
  pub fn is_op(&self, text: &str) -> bool {
    self.kind == TokenKind::Operator && self.text == text
  }

  pub fn is_comment(&self) -> bool {
    matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment)
  }

  pub fn is_multi_line(&self) -> bool {
    self.line != self.end_line
  }

  pub fn is_closer(&self) -> bool {
    self.kind == TokenKind::Operator && matches!(self.text, ")" | "]" | "}")
  }
}

pub const OPERATORS: [&str; 25] = [
  ">>>=", "<<=", ">>=", ">>>", "...", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>",
];

/// Keywords after which `+` and `-` start an operand.
const UNARY_KEYWORDS: [&str; 8] = ["return", "case", "throw", "yield", "assert", "else", "do", "default"];

struct Scanner<'a> {
  text: &'a str,
  pos: usize,
  line: usize,
  line_start: usize,
}

impl<'a> Scanner<'a> {
  fn rest(&self) -> &'a str {
    &self.text[self.pos..]
  }

  fn peek(&self) -> Option<char> {
    self.rest().chars().next()
  }

  fn peek_nth(&self, n: usize) -> Option<char> {
    self.rest().chars().nth(n)
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    if c == '\n' {
      self.line += 1;
      self.line_start = self.pos;
    }
    Some(c)
  }

  fn bump_str(&mut self, text: &str) {
    for _ in text.chars() {
      self.bump();
    }
  }

  fn column(&self) -> usize {
    self.text[self.line_start..self.pos].chars().count() + 1
  }
}

/// Splits the text into tokens, verifying that brackets are balanced.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, FormatDiagnostic> {
  let mut scanner = Scanner {
    text,
    pos: 0,
    line: 0,
    line_start: 0,
  };
  let mut tokens = Vec::new();
  let mut space_before = false;

  while let Some(c) = scanner.peek() {
    if c.is_whitespace() || c == '\u{feff}' {
      scanner.bump();
      space_before = true;
      continue;
    }

    let start = scanner.pos;
    let line = scanner.line;
    let column = scanner.column();
    let kind = scan_token(&mut scanner, c).map_err(|message| FormatDiagnostic::at(line + 1, column, message))?;
    tokens.push(Token {
      kind,
      text: &text[start..scanner.pos],
      line,
      end_line: scanner.line,
      column,
      space_before,
      start,
      end: scanner.pos,
      role: OperatorRole::Binary,
    });
    space_before = false;
  }

  check_brackets(&tokens)?;
  assign_roles(&mut tokens);
  Ok(tokens)
}

fn scan_token(scanner: &mut Scanner, c: char) -> Result<TokenKind, &'static str> {
  let rest = scanner.rest();
  if rest.starts_with("//") {
    while let Some(c) = scanner.peek() {
      if c == '\n' {
        break;
      }
      scanner.bump();
    }
    return Ok(TokenKind::LineComment);
  }
  if rest.starts_with("/*") {
    let kind = if rest.starts_with("/**") && !rest.starts_with("/**/") {
      TokenKind::DocComment
    } else {
      TokenKind::BlockComment
    };
    scanner.bump_str("/*");
    loop {
      if scanner.rest().starts_with("*/") {
        scanner.bump_str("*/");
        return Ok(kind);
      }
      if scanner.bump().is_none() {
        return Err("Unterminated comment.");
      }
    }
  }
  if rest.starts_with("\"\"\"") {
    scanner.bump_str("\"\"\"");
    loop {
      if scanner.rest().starts_with("\"\"\"") {
        scanner.bump_str("\"\"\"");
        return Ok(TokenKind::TextBlock);
      }
      match scanner.bump() {
        Some('\\') => {
          scanner.bump();
        }
        Some(_) => {}
        None => return Err("Unterminated text block."),
      }
    }
  }
  if c == '"' || c == '\'' {
    let message = if c == '"' {
      "Unterminated string literal."
    } else {
      "Unterminated character literal."
    };
    scanner.bump();
    loop {
      match scanner.bump() {
        Some('\\') => match scanner.bump() {
          Some('\n') | None => return Err(message),
          Some(_) => {}
        },
        Some('\n') | None => return Err(message),
        Some(found) if found == c => return Ok(TokenKind::String),
        Some(_) => {}
      }
    }
  }
  if c.is_ascii_digit() || (c == '.' && scanner.peek_nth(1).is_some_and(|next| next.is_ascii_digit())) {
    scan_number(scanner);
    return Ok(TokenKind::Word);
  }
  if is_word_char(c) {
    while scanner.peek().is_some_and(is_word_char) {
      scanner.bump();
    }
    return Ok(TokenKind::Word);
  }

  match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
    Some(op) => scanner.bump_str(op),
    None => {
      scanner.bump();
    }
  }
  Ok(TokenKind::Operator)
}

fn scan_number(scanner: &mut Scanner) {
  let rest = scanner.rest();
  let is_hex = rest.starts_with("0x") || rest.starts_with("0X");
  let mut prev = None;
  while let Some(c) = scanner.peek() {
    let is_exponent_sign = (c == '+' || c == '-')
      && match prev {
        Some('e' | 'E') => !is_hex,
        Some('p' | 'P') => is_hex,
        _ => false,
      };
    if !is_word_char(c) && c != '.' && !is_exponent_sign {
      break;
    }
    prev = Some(c);
    scanner.bump();
  }
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}

fn check_brackets(tokens: &[Token]) -> Result<(), FormatDiagnostic> {
  let mut stack: Vec<&Token> = Vec::new();
  for token in tokens.iter().filter(|t| t.kind == TokenKind::Operator) {
    match token.text {
      "(" | "[" | "{" => stack.push(token),
      ")" | "]" | "}" => {
        let expected_open = match token.text {
          ")" => "(",
          "]" => "[",
          _ => "{",
        };
        match stack.pop() {
          Some(open) if open.text == expected_open => {}
          Some(open) => {
            return Err(FormatDiagnostic::at(
              token.line + 1,
              token.column,
              format!(
                "Expected '{}' to close '{}' from line {}, but found '{}'.",
                closer_for(open.text),
                open.text,
                open.line + 1,
                token.text
              ),
            ));
          }
          None => {
            return Err(FormatDiagnostic::at(token.line + 1, token.column, format!("Unexpected '{}'.", token.text)));
          }
        }
      }
      _ => {}
    }
  }

  match stack.pop() {
    Some(open) => Err(FormatDiagnostic::at(open.line + 1, open.column, format!("Unclosed '{}'.", open.text))),
    None => Ok(()),
  }
}

fn closer_for(open: &str) -> &'static str {
  match open {
    "(" => ")",
    "[" => "]",
    _ => "}",
  }
}

fn assign_roles(tokens: &mut [Token]) {
  let significant = tokens.iter().enumerate().filter(|(_, t)| !t.is_comment()).map(|(i, _)| i).collect::<Vec<_>>();

  for (position, index) in significant.iter().enumerate() {
    let token = &tokens[*index];
    if token.kind != TokenKind::Operator {
      continue;
    }
    let prev = position.checked_sub(1).map(|p| &tokens[significant[p]]);
    let next = significant.get(position + 1).map(|i| &tokens[*i]);
    let role = match token.text {
      "!" | "~" => OperatorRole::Prefix,
      "+" | "-" => {
        if prev.is_some_and(is_operand_end) {
          OperatorRole::Binary
        } else {
          OperatorRole::Prefix
        }
      }
      "++" | "--" => {
        if prev.is_some_and(is_operand_end) && !next.is_some_and(is_operand_start) {
          OperatorRole::Postfix
        } else {
          OperatorRole::Prefix
        }
      }
      _ => OperatorRole::Binary,
    };
    tokens[*index].role = role;
  }
}

fn is_operand_end(token: &Token) -> bool {
  match token.kind {
    TokenKind::Word => !UNARY_KEYWORDS.contains(&token.text),
    TokenKind::String | TokenKind::TextBlock => true,
    TokenKind::Operator => matches!(token.text, ")" | "]"),
    TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => false,
  }
}

fn is_operand_start(token: &Token) -> bool {
  match token.kind {
    TokenKind::Word | TokenKind::String | TokenKind::TextBlock => true,
    TokenKind::Operator => token.text == "(",
    TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => false,
  }
}
