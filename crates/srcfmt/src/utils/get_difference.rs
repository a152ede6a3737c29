use crossterm::style::Stylize;
use dissimilar::Chunk;

/// Changed rows separated by at most this many unchanged rows are shown together.
const GROUPED_ROW_DISTANCE: usize = 2;
const NEWLINE_MARKER: &str = "\u{21B5}";

#[derive(Debug)]
struct DiffRow {
  /// Line number in the original text or `None` for a row the change introduced.
  line_number: Option<usize>,
  text: String,
  has_change: bool,
}

impl DiffRow {
  fn new(line_number: Option<usize>, has_change: bool) -> Self {
    DiffRow {
      line_number,
      text: String::new(),
      has_change,
    }
  }
}

/// Gets a string showing the difference between two strings.
pub fn get_difference(text1: &str, text2: &str) -> String {
  // normalize newlines
  let text1 = text1.replace("\r\n", "\n");
  let text2 = text2.replace("\r\n", "\n");

  if text1 == text2 {
    return String::from(" | Text differed by line endings.");
  }

  render_rows(&get_rows(&text1, &text2))
}

fn get_rows(text1: &str, text2: &str) -> Vec<DiffRow> {
  let mut rows = vec![DiffRow::new(Some(1), false)];
  let mut line_number = 1;

  for chunk in dissimilar::diff(text1, text2) {
    let text = match chunk {
      Chunk::Equal(text) | Chunk::Insert(text) | Chunk::Delete(text) => text,
    };
    for (index, segment) in text.split('\n').enumerate() {
      if index > 0 {
        match chunk {
          Chunk::Equal(_) => {
            line_number += 1;
            rows.push(DiffRow::new(Some(line_number), false));
          }
          Chunk::Delete(_) => {
            push_change(&mut rows, get_removal_text(NEWLINE_MARKER));
            line_number += 1;
            rows.push(DiffRow::new(Some(line_number), false));
          }
          Chunk::Insert(_) => {
            push_change(&mut rows, get_addition_text(NEWLINE_MARKER));
            rows.push(DiffRow::new(None, true));
          }
        }
      }
      if segment.is_empty() {
        continue;
      }
      match chunk {
        Chunk::Equal(_) => {
          if let Some(row) = rows.last_mut() {
            row.text.push_str(&annotate_whitespace(segment));
          }
        }
        Chunk::Delete(_) => push_change(&mut rows, get_removal_text(&annotate_whitespace(segment))),
        Chunk::Insert(_) => push_change(&mut rows, get_addition_text(&annotate_whitespace(segment))),
      }
    }
  }

  // an inserted trailing newline leaves an empty row behind
  if rows.last().map(|row| row.line_number.is_none() && row.text.is_empty()).unwrap_or(false) {
    rows.pop();
  }
  rows
}

fn push_change(rows: &mut [DiffRow], text: String) {
  if let Some(row) = rows.last_mut() {
    row.text.push_str(&text);
    row.has_change = true;
  }
}

fn render_rows(rows: &[DiffRow]) -> String {
  let changed_indexes = rows.iter().enumerate().filter(|(_, row)| row.has_change).map(|(index, _)| index).collect::<Vec<_>>();
  let mut groups: Vec<(usize, usize)> = Vec::new();
  for index in changed_indexes {
    match groups.last_mut() {
      Some((_, end)) if index - *end <= GROUPED_ROW_DISTANCE => *end = index,
      _ => groups.push((index, index)),
    }
  }

  let max_line_number = groups
    .iter()
    .flat_map(|(start, end)| rows[*start..=*end].iter().filter_map(|row| row.line_number))
    .max()
    .unwrap_or(1);
  let width = max_line_number.to_string().chars().count();

  let mut text = String::new();
  for (group_index, (start, end)) in groups.into_iter().enumerate() {
    if group_index > 0 {
      text.push_str("\n...\n");
    }
    for (row_index, row) in rows[start..=end].iter().enumerate() {
      if row_index > 0 {
        text.push('\n');
      }
      match row.line_number {
        Some(line_number) if row_index == 0 => text.push_str(&format!("{:width$}| ", line_number, width = width)),
        _ => text.push_str(&format!("{}| ", " ".repeat(width))),
      }
      text.push_str(&row.text);
    }
  }
  text
}

fn get_addition_text(text: &str) -> String {
  text.white().on_green().to_string()
}

fn get_removal_text(text: &str) -> String {
  text.white().on_red().to_string()
}

fn annotate_whitespace(text: &str) -> String {
  text.replace('\t', "\u{2192}").replace(' ', "\u{00B7}")
}
