use crate::csv::split_record;

/// How the cells of a text line are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Tab,
    /// `| a | b |` boxes.
    Pipe,
    /// Console tables padded with runs of spaces. Single spaces belong to the cell (`Pages Served`).
    Aligned,
    Comma,
    Whitespace,
}

impl Layout {
    pub fn detect(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.contains('\t') {
            Layout::Tab
        } else if trimmed.contains('|') {
            Layout::Pipe
        } else if trimmed.contains("  ") {
            Layout::Aligned
        } else if trimmed.contains(',') {
            Layout::Comma
        } else {
            Layout::Whitespace
        }
    }

    pub fn split(self, line: &str) -> Vec<String> {
        let trimmed = line.trim();
        match self {
            Layout::Tab => trimmed.split('\t').map(|cell| cell.trim().to_string()).collect(),
            Layout::Pipe => trimmed
                .trim_matches('|')
                .split('|')
                .map(|cell| cell.trim().to_string())
                .collect(),
            Layout::Aligned => split_aligned(trimmed),
            Layout::Comma => split_record(trimmed, ','),
            Layout::Whitespace => trimmed.split_whitespace().map(str::to_string).collect(),
        }
    }
}

fn split_aligned(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut spaces = 0;
    for c in line.chars() {
        if c.is_whitespace() {
            spaces += 1;
            continue;
        }
        if spaces >= 2 && !cell.is_empty() {
            cells.push(std::mem::take(&mut cell));
        } else if spaces == 1 && !cell.is_empty() {
            cell.push(' ');
        }
        spaces = 0;
        cell.push(c);
    }
    if !cell.is_empty() {
        cells.push(cell);
    }
    cells
}

/// Blank lines, table rules (`-----  ----`, `+---+`), and terminus' `[notice]` / `[warning]` messages.
pub fn is_decoration(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('[')
        || trimmed
            .chars()
            .all(|c| matches!(c, '-' | '=' | '+' | '|' | ':' | '─' | '━' | '┼' | '│') || c.is_whitespace())
}

/// A terminus log line such as `[notice] Fetching metrics` or ` [warning] Datapoints capped`.
pub fn is_message(line: &str) -> bool {
    line.trim()
        .strip_prefix('[')
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_alphabetic()) && rest.contains(']'))
}
