use std::collections::HashSet;

use srcfmt_core::formatter::FormatDiagnostic;
use srcfmt_core::options::ImportSortMode;

use crate::tokens::Token;
use crate::tokens::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportStatement {
  is_static: bool,
  name: String,
  start: usize,
  end: usize,
}

impl ImportStatement {
  fn is_wildcard(&self) -> bool {
    self.name.ends_with(".*")
  }

  fn simple_name(&self) -> &str {
    self.name.rsplit('.').next().unwrap_or(&self.name)
  }

  fn to_line(&self) -> String {
    if self.is_static {
      format!("import static {};", self.name)
    } else {
      format!("import {};", self.name)
    }
  }
}

/// Removes unused and duplicate imports and sorts the rest.
///
/// Returns `None` when the file has no imports or when something other than
/// an import statement appears between them.
pub fn fix_imports(text: &str, tokens: &[Token], sort_mode: ImportSortMode) -> Result<Option<String>, FormatDiagnostic> {
  let Some((first_index, last_index, imports)) = collect_imports(tokens)? else {
    return Ok(None);
  };

  let used_names = collect_used_names(tokens, first_index, last_index);
  let mut seen = HashSet::new();
  let mut kept = imports
    .into_iter()
    .filter(|import| import.is_wildcard() || used_names.contains(import.simple_name()))
    .filter(|import| seen.insert((import.is_static, import.name.clone())))
    .collect::<Vec<_>>();
  kept.sort_by(|a, b| a.name.cmp(&b.name).then(a.is_static.cmp(&b.is_static)));

  let (statics, others): (Vec<_>, Vec<_>) = kept.iter().partition(|import| import.is_static);
  let groups = match sort_mode {
    ImportSortMode::StaticFirst => vec![statics, others],
    ImportSortMode::StaticLast => vec![others, statics],
    ImportSortMode::Lexicographic => vec![kept.iter().collect()],
  };
  let replacement = groups
    .into_iter()
    .filter(|group| !group.is_empty())
    .map(|group| group.iter().map(|import| import.to_line()).collect::<Vec<_>>().join("\n"))
    .collect::<Vec<_>>()
    .join("\n\n");

  let region_start = tokens[first_index].start;
  let region_end = tokens[last_index].end;
  let mut result = String::with_capacity(text.len());
  result.push_str(&text[..region_start]);
  result.push_str(&replacement);
  result.push_str(&text[region_end..]);
  Ok(Some(result))
}

type ImportRegion = (usize, usize, Vec<ImportStatement>);

/// Finds the top level import statements along with the token range they span.
fn collect_imports(tokens: &[Token]) -> Result<Option<ImportRegion>, FormatDiagnostic> {
  let mut imports = Vec::new();
  let mut first_index = None;
  let mut last_index = 0;
  let mut depth = 0usize;
  let mut index = 0;

  while index < tokens.len() {
    let token = &tokens[index];
    if token.kind == TokenKind::Operator {
      match token.text {
        "(" | "[" | "{" => depth += 1,
        ")" | "]" | "}" => depth = depth.saturating_sub(1),
        _ => {}
      }
    }
    if depth == 0 && token.kind == TokenKind::Word && token.text == "import" {
      let Some((statement, end_index)) = parse_import(tokens, index)? else {
        return Ok(None);
      };
      first_index.get_or_insert(index);
      last_index = end_index;
      imports.push(statement);
      index = end_index + 1;
      continue;
    }
    index += 1;
  }

  let Some(first_index) = first_index else {
    return Ok(None);
  };

  // only fix when the imports form one contiguous run
  let import_token_count = imports.iter().map(|import| count_tokens(tokens, import)).sum::<usize>();
  if import_token_count != last_index - first_index + 1 {
    return Ok(None);
  }

  Ok(Some((first_index, last_index, imports)))
}

fn count_tokens(tokens: &[Token], import: &ImportStatement) -> usize {
  tokens.iter().filter(|t| t.start >= import.start && t.end <= import.end).count()
}

/// Parses the import statement starting at `index`, returning the statement and the index of its semicolon.
/// Returns `None` when a comment appears inside the statement.
fn parse_import(tokens: &[Token], index: usize) -> Result<Option<(ImportStatement, usize)>, FormatDiagnostic> {
  let import_token = &tokens[index];
  let malformed = || FormatDiagnostic::at(import_token.line + 1, import_token.column, "Malformed import statement.");
  let mut position = index + 1;
  let mut is_static = false;
  let mut name = String::new();
  let mut expect_segment = true;

  loop {
    let Some(token) = tokens.get(position) else {
      return Err(malformed());
    };
    if token.is_comment() {
      return Ok(None);
    }
    if position == index + 1 && token.kind == TokenKind::Word && token.text == "static" {
      is_static = true;
    } else if expect_segment {
      if token.kind == TokenKind::Word || (token.is_op("*") && !name.is_empty()) {
        name.push_str(token.text);
        expect_segment = false;
      } else {
        return Err(malformed());
      }
    } else if token.is_op(".") && !name.ends_with('*') {
      name.push('.');
      expect_segment = true;
    } else if token.is_op(";") {
      let statement = ImportStatement {
        is_static,
        name,
        start: import_token.start,
        end: token.end,
      };
      return Ok(Some((statement, position)));
    } else {
      return Err(malformed());
    }
    position += 1;
  }
}

/// Gets every identifier that appears outside the import region, including
/// identifiers mentioned in comments such as `{@link Name}`.
fn collect_used_names<'a>(tokens: &[Token<'a>], first_index: usize, last_index: usize) -> HashSet<&'a str> {
  let mut names = HashSet::new();
  for (index, token) in tokens.iter().enumerate() {
    if index >= first_index && index <= last_index {
      continue;
    }
    match token.kind {
      TokenKind::Word => {
        names.insert(token.text);
      }
      TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => {
        names.extend(token.text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$')).filter(|word| !word.is_empty()));
      }
      TokenKind::String | TokenKind::TextBlock | TokenKind::Operator => {}
    }
  }
  names
}
