//! SQL text shared by both clients so they speak the same dialect.

use std::path::Path;
use std::str::Chars;

use searchd_harness_config::LoadCommand;

use super::BulkLoad;

pub(crate) const SHOW_DATABASES: &str = "SHOW DATABASES";

/// Splits a schema file into individual statements.
///
/// Statements end at `;` outside quoted text. `-- `, `#` and `/* */`
/// comments are dropped, so a fragment holding only comments never reaches
/// the server; MySQL executable comments (`/*! ... */`) are kept as SQL.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars();

    while let Some(character) = chars.next() {
        match character {
            ';' => push_statement(&mut statements, &mut current),
            '\'' | '"' | '`' => copy_quoted(character, &mut chars, &mut current),
            '#' => skip_line(&mut chars, &mut current),
            '-' if starts_line_comment(chars.as_str()) => skip_line(&mut chars, &mut current),
            '/' if chars.as_str().starts_with('*') => {
                chars.next();
                take_block_comment(&mut chars, &mut current);
            }
            _ => current.push(character),
        }
    }
    push_statement(&mut statements, &mut current);
    statements
}

/// `rest` follows a `-`; MySQL needs a second dash plus whitespace or EOF.
fn starts_line_comment(rest: &str) -> bool {
    rest.strip_prefix('-')
        .is_some_and(|after| after.chars().next().is_none_or(char::is_whitespace))
}

fn copy_quoted(open: char, chars: &mut Chars<'_>, current: &mut String) {
    current.push(open);
    let mut escaped = false;
    for character in chars.by_ref() {
        current.push(character);
        if escaped {
            escaped = false;
        } else if character == '\\' && open != '`' {
            escaped = true;
        } else if character == open {
            return;
        }
    }
}

fn skip_line(chars: &mut Chars<'_>, current: &mut String) {
    let rest = chars.as_str();
    *chars = rest.split_once('\n').map_or("", |(_, after)| after).chars();
    current.push('\n');
}

/// `chars` sits just past the opening `/*`.
fn take_block_comment(chars: &mut Chars<'_>, current: &mut String) {
    let rest = chars.as_str();
    let (body, after) = rest.split_once("*/").unwrap_or((rest, ""));
    if body.starts_with('!') {
        current.push_str("/*");
        current.push_str(body);
        current.push_str("*/");
    } else {
        current.push(' ');
    }
    *chars = after.chars();
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_owned());
    }
    current.clear();
}

/// Quotes an identifier with backticks.
pub(crate) fn identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a string literal with single quotes.
pub(crate) fn literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for character in value.chars() {
        match character {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

pub(crate) fn create_database(name: &str) -> String {
    format!("CREATE DATABASE {}", identifier(name))
}

pub(crate) fn use_database(name: &str) -> String {
    format!("USE {}", identifier(name))
}

pub(crate) fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", identifier(table))
}

/// Builds the bulk-load statement for a staged file.
pub(crate) fn load_data(command: LoadCommand, path: &Path, request: &BulkLoad<'_>) -> String {
    let columns = request
        .columns
        .iter()
        .map(|column| identifier(column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} {} INTO TABLE {} FIELDS TERMINATED BY {} ENCLOSED BY {} ({columns})",
        command.keyword(),
        literal(&path.to_string_lossy()),
        identifier(request.table),
        literal(&request.delimiter.to_string()),
        literal(&request.quote.to_string()),
    )
}
