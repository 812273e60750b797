//! SQL summarising: operation keyword and primary table, for span names.

use once_cell::sync::Lazy;
use regex::Regex;

/// SQL operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    Create,
    Drop,
    Alter,
    Truncate,
    Begin,
    Commit,
    Rollback,
    Set,
    Other,
}

impl SqlOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlOperation::Select => "SELECT",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
            SqlOperation::Replace => "REPLACE",
            SqlOperation::Create => "CREATE",
            SqlOperation::Drop => "DROP",
            SqlOperation::Alter => "ALTER",
            SqlOperation::Truncate => "TRUNCATE",
            SqlOperation::Begin => "BEGIN",
            SqlOperation::Commit => "COMMIT",
            SqlOperation::Rollback => "ROLLBACK",
            SqlOperation::Set => "SET",
            SqlOperation::Other => "QUERY",
        }
    }

    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" | "WITH" => SqlOperation::Select,
            "INSERT" => SqlOperation::Insert,
            "UPDATE" => SqlOperation::Update,
            "DELETE" => SqlOperation::Delete,
            "REPLACE" => SqlOperation::Replace,
            "CREATE" => SqlOperation::Create,
            "DROP" => SqlOperation::Drop,
            "ALTER" => SqlOperation::Alter,
            "TRUNCATE" => SqlOperation::Truncate,
            "BEGIN" | "START" => SqlOperation::Begin,
            "COMMIT" => SqlOperation::Commit,
            "ROLLBACK" => SqlOperation::Rollback,
            "SET" => SqlOperation::Set,
            _ => SqlOperation::Other,
        }
    }

    /// Pattern capturing the primary table for this kind of statement.
    fn table_pattern(&self) -> Option<&'static Regex> {
        let pattern = match self {
            SqlOperation::Select | SqlOperation::Delete => &*FROM_TABLE,
            SqlOperation::Insert | SqlOperation::Replace => &*INTO_TABLE,
            SqlOperation::Update => &*UPDATE_TABLE,
            SqlOperation::Create
            | SqlOperation::Drop
            | SqlOperation::Alter
            | SqlOperation::Truncate => &*DDL_TABLE,
            _ => return None,
        };
        Some(pattern)
    }
}

impl std::fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Identifiers may be quoted with backticks, double quotes or brackets, and may be
// schema-qualified; the last segment is the table.
const IDENT: &str = r#"[`"\[]?(?:\w+[`"\]]?\.[`"\[]?)?(\w+)[`"\]]?"#;

static FROM_TABLE: Lazy<Regex> = Lazy::new(|| table_regex(r"\bFROM\s+"));

static INTO_TABLE: Lazy<Regex> = Lazy::new(|| table_regex(r"\bINTO\s+"));

static UPDATE_TABLE: Lazy<Regex> = Lazy::new(|| table_regex(r"^\s*UPDATE\s+(?:LOW_PRIORITY\s+|IGNORE\s+)*"));

static DDL_TABLE: Lazy<Regex> = Lazy::new(|| {
    table_regex(
        r"\b(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+(?:NOT\s+)?EXISTS\s+)?|^\s*TRUNCATE\s+(?:TABLE\s+)?",
    )
});

fn table_regex(prefix: &str) -> Regex {
    // The patterns are static; a failure here is a programming error caught by the tests.
    Regex::new(&format!("(?i)(?:{prefix}){IDENT}")).expect("table pattern is valid")
}

/// Parse the SQL operation type from a query string.
pub fn parse_operation(sql: &str) -> SqlOperation {
    sql.split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .find(|token| !token.is_empty())
        .map(SqlOperation::from_keyword)
        .unwrap_or(SqlOperation::Other)
}

/// Extract the primary table name from a SQL query, lower-cased.
///
/// Only clauses at the statement's own nesting level count, so
/// `EXTRACT(YEAR FROM created_at)` or a subquery never names the table.
pub fn extract_table(sql: &str) -> Option<String> {
    let pattern = parse_operation(sql).table_pattern()?;
    let statement_depth = sql
        .chars()
        .take_while(|c| c.is_whitespace() || *c == '(')
        .filter(|c| *c == '(')
        .count();

    pattern
        .captures_iter(sql)
        .find(|caps| caps.get(0).is_some_and(|m| paren_depth(&sql[..m.start()]) <= statement_depth))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

fn paren_depth(prefix: &str) -> usize {
    prefix.chars().fold(0, |depth: usize, c| match c {
        '(' => depth + 1,
        ')' => depth.saturating_sub(1),
        _ => depth,
    })
}

/// Operation and table of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    pub operation: SqlOperation,
    pub table: Option<String>,
}

impl ParsedSql {
    pub fn parse(sql: &str) -> Self {
        Self {
            operation: parse_operation(sql),
            table: extract_table(sql),
        }
    }

    /// `"{OPERATION} {table}"`, or just the operation when no table was found.
    pub fn span_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{} {}", self.operation, table),
            None => self.operation.as_str().to_string(),
        }
    }
}
