use std::ops::Range;

use srcfmt_core::options::FormatOptions;
use srcfmt_core::options::JavadocMode;

use crate::tokens::OperatorRole;
use crate::tokens::Token;
use crate::tokens::TokenKind;
use crate::tokens::OPERATORS;

/// Keywords that are followed by a space when an open paren comes next.
const CONTROL_KEYWORDS: [&str; 13] = [
  "if",
  "for",
  "while",
  "switch",
  "catch",
  "synchronized",
  "try",
  "return",
  "throw",
  "assert",
  "else",
  "case",
  "do",
];

/// Operators whose surrounding whitespace depends on context the
/// tokens alone don't reveal (ex. generics vs comparisons), so the
/// whitespace found in the source is kept.
const PRESERVED_OPERATORS: [&str; 8] = ["<", ">", "<<", ">>", ">>>", "?", ":", "&"];

/// Operators that continue the previous line when they start a line.
const CONTINUATION_OPERATORS: [&str; 5] = [".", "?", ":", "&&", "||"];

#[derive(Clone, Debug)]
struct IndentState {
  brace_depth: usize,
  /// Open paren and bracket count per brace level.
  paren_stack: Vec<usize>,
}

impl IndentState {
  fn new() -> Self {
    IndentState {
      brace_depth: 0,
      paren_stack: vec![0],
    }
  }

  fn paren_depth(&self) -> usize {
    self.paren_stack.last().copied().unwrap_or(0)
  }

  fn line_indent(&self, first: &Token, indent_width: usize) -> usize {
    let depth = if first.is_op("}") {
      self.brace_depth.saturating_sub(1)
    } else {
      self.brace_depth
    };
    let is_continuation = (self.paren_depth() > 0 && !first.is_closer())
      || (first.kind == TokenKind::Operator && CONTINUATION_OPERATORS.contains(&first.text));
    if is_continuation {
      (depth + 2) * indent_width
    } else {
      depth * indent_width
    }
  }

  fn advance(&mut self, token: &Token) {
    if token.kind != TokenKind::Operator {
      return;
    }
    match token.text {
      "{" => {
        self.brace_depth += 1;
        self.paren_stack.push(0);
      }
      "}" => {
        self.brace_depth = self.brace_depth.saturating_sub(1);
        if self.paren_stack.len() > 1 {
          self.paren_stack.pop();
        }
      }
      "(" | "[" => {
        if let Some(depth) = self.paren_stack.last_mut() {
          *depth += 1;
        }
      }
      ")" | "]" => {
        if let Some(depth) = self.paren_stack.last_mut() {
          *depth = depth.saturating_sub(1);
        }
      }
      _ => {}
    }
  }
}

struct RenderedLine {
  text: String,
  /// The byte length of the text after each token.
  byte_ends: Vec<usize>,
  /// The character width of the text after each token.
  widths: Vec<usize>,
}

/// Prints the tokens as formatted text.
pub fn print(tokens: &[Token], options: &FormatOptions) -> String {
  let mut output = String::new();
  let mut state = IndentState::new();
  let mut previous_end_line = None;

  for range in get_logical_lines(tokens) {
    let line_tokens = &tokens[range];
    let first = &line_tokens[0];
    if let Some(previous_end_line) = previous_end_line {
      output.push('\n');
      if first.line > previous_end_line + 1 {
        output.push('\n');
      }
    }
    previous_end_line = Some(line_tokens[line_tokens.len() - 1].end_line);
    print_logical_line(line_tokens, &mut state, options, &mut output);
  }

  if !output.is_empty() {
    output.push('\n');
  }
  output
}

/// Groups the tokens by the source line they start on. A token that
/// begins on the line another token ends on belongs to that line.
fn get_logical_lines(tokens: &[Token]) -> Vec<Range<usize>> {
  let mut lines = Vec::new();
  let mut start = 0;
  for index in 1..tokens.len() {
    if tokens[index].line > tokens[index - 1].end_line {
      lines.push(start..index);
      start = index;
    }
  }
  if start < tokens.len() {
    lines.push(start..tokens.len());
  }
  lines
}

fn print_logical_line(tokens: &[Token], state: &mut IndentState, options: &FormatOptions, output: &mut String) {
  let indent_width = options.style.indent_width();
  let mut tokens = tokens;
  loop {
    let indent = state.line_indent(&tokens[0], indent_width);
    let rendered = render_tokens(tokens, indent, options);
    match find_wrap_index(tokens, &rendered, state, options.max_line_length as usize) {
      Some(wrap_index) => {
        output.push_str(&rendered.text[..rendered.byte_ends[wrap_index]]);
        output.push('\n');
        for token in &tokens[..=wrap_index] {
          state.advance(token);
        }
        tokens = &tokens[wrap_index + 1..];
      }
      None => {
        output.push_str(&rendered.text);
        for token in tokens {
          state.advance(token);
        }
        return;
      }
    }
  }
}

fn render_tokens(tokens: &[Token], indent: usize, options: &FormatOptions) -> RenderedLine {
  let mut text = " ".repeat(indent);
  let mut byte_ends = Vec::with_capacity(tokens.len());
  let mut widths = Vec::with_capacity(tokens.len());
  let mut width = indent;

  for (index, token) in tokens.iter().enumerate() {
    if index > 0 && space_between(&tokens[index - 1], token) {
      text.push(' ');
      width += 1;
    }
    let token_text = get_token_text(token, indent, options);
    width += token_text.chars().count();
    text.push_str(&token_text);
    byte_ends.push(text.len());
    widths.push(width);
  }

  RenderedLine { text, byte_ends, widths }
}

/// Finds the comma to break the line after when it exceeds the maximum width.
fn find_wrap_index(tokens: &[Token], rendered: &RenderedLine, state: &IndentState, max_line_length: usize) -> Option<usize> {
  let line_width = rendered.widths.last().copied().unwrap_or(0);
  if line_width <= max_line_length || tokens.iter().any(|t| t.is_multi_line()) {
    return None;
  }

  let mut state = state.clone();
  let mut candidates = Vec::new();
  for (index, token) in tokens.iter().enumerate() {
    state.advance(token);
    let Some(next) = tokens.get(index + 1) else {
      break;
    };
    if token.is_op(",") && state.paren_depth() > 0 && !next.is_closer() && !next.is_comment() {
      candidates.push(index);
    }
  }

  candidates
    .iter()
    .rev()
    .find(|index| rendered.widths[**index] <= max_line_length)
    .or_else(|| candidates.first())
    .copied()
}

fn get_token_text(token: &Token, indent: usize, options: &FormatOptions) -> String {
  match token.kind {
    TokenKind::LineComment => token.text.trim_end().to_string(),
    TokenKind::DocComment if options.javadoc_mode == JavadocMode::Format && token.is_multi_line() => format_doc_comment(token.text, indent),
    TokenKind::BlockComment | TokenKind::DocComment => token.text.split('\n').map(|line| line.trim_end()).collect::<Vec<_>>().join("\n"),
    TokenKind::Word | TokenKind::String | TokenKind::TextBlock | TokenKind::Operator => token.text.to_string(),
  }
}

/// Aligns every line after the first one on a leading asterisk.
fn format_doc_comment(text: &str, indent: usize) -> String {
  let indent_text = " ".repeat(indent);
  let mut lines = text.split('\n');
  let mut result = lines.next().unwrap_or_default().trim_end().to_string();
  for line in lines {
    let trimmed = line.trim();
    result.push('\n');
    result.push_str(&indent_text);
    if trimmed.starts_with("*/") {
      result.push(' ');
      result.push_str(trimmed);
      continue;
    }
    let without_star = trimmed.strip_prefix('*').unwrap_or(trimmed);
    let content = without_star.strip_prefix(' ').unwrap_or(without_star);
    result.push_str(" *");
    if !content.is_empty() {
      result.push(' ');
      result.push_str(content);
    }
  }
  result
}

fn space_between(prev: &Token, next: &Token) -> bool {
  if would_merge(prev, next) {
    return true;
  }
  if next.kind == TokenKind::Operator && (matches!(next.text, "," | ";" | ")" | "]" | "." | "::" | "...") || next.role == OperatorRole::Postfix) {
    return false;
  }
  if prev.kind == TokenKind::Operator && (matches!(prev.text, "(" | "[" | "." | "::" | "@") || prev.role == OperatorRole::Prefix) {
    return false;
  }
  if is_preserved(next) {
    return prev.is_op(",") || prev.is_op(";") || next.space_before;
  }
  if is_preserved(prev) {
    return next.space_before;
  }
  if prev.is_comment() || next.is_comment() {
    return true;
  }
  if next.is_op("(") {
    return match prev.kind {
      TokenKind::Word => CONTROL_KEYWORDS.contains(&prev.text),
      TokenKind::Operator if matches!(prev.text, ")" | "]") => next.space_before,
      TokenKind::Operator => true,
      TokenKind::String | TokenKind::TextBlock => false,
      TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => true,
    };
  }
  if next.is_op("[") {
    return !(matches!(prev.kind, TokenKind::Word | TokenKind::String) || prev.is_op(")") || prev.is_op("]"));
  }
  if next.is_op("}") {
    return !prev.is_op("{");
  }
  true
}

fn is_preserved(token: &Token) -> bool {
  token.kind == TokenKind::Operator && PRESERVED_OPERATORS.contains(&token.text)
}

/// Gets if printing the two tokens side by side would scan as a different token.
fn would_merge(prev: &Token, next: &Token) -> bool {
  if prev.kind != TokenKind::Operator || next.kind != TokenKind::Operator {
    return false;
  }
  let (Some(last), Some(first)) = (prev.text.chars().last(), next.text.chars().next()) else {
    return false;
  };
  let joined = format!("{}{}", last, first);
  joined == "//" || joined == "/*" || OPERATORS.iter().any(|op| op.starts_with(&joined))
}
