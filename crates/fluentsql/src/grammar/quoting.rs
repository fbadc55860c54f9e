//! Identifier quoting and literal escaping.
//!
//! - Identifiers are quoted segment by segment (`table.column` → `"table"."column"`)
//! - A `*` segment is never quoted
//! - The escape character inside an identifier is replaced (`"` → `""`, `` ` `` → ``` `` ```, `]` → `]]`)
//!
//! Literal escaping without a live connection follows the classic MySQL
//! escape table and exists so that compiled SQL can be inspected without a
//! database at hand.

use crate::value::Value;
use serde::Deserialize;

/// How a dialect quotes identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quoting {
    pub prefix: String,
    pub suffix: String,
    /// Character sequence that must be escaped inside an identifier.
    pub escape: String,
    /// What `escape` is replaced with.
    pub replacement: String,
}

impl Quoting {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        escape: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            escape: escape.into(),
            replacement: replacement.into(),
        }
    }

    /// ANSI double quotes, `"` doubled.
    pub fn ansi() -> Self {
        Self::new("\"", "\"", "\"", "\"\"")
    }

    /// MySQL backticks, `` ` `` doubled.
    pub fn backtick() -> Self {
        Self::new("`", "`", "`", "``")
    }

    /// SQL Server brackets, `]` doubled.
    pub fn bracket() -> Self {
        Self::new("[", "]", "]", "]]")
    }

    /// Quote a single identifier segment. `*` is left alone.
    pub fn quote_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return segment.to_string();
        }
        let mut out = String::with_capacity(segment.len() + self.prefix.len() + self.suffix.len());
        self.write_segment(segment, &mut out);
        out
    }

    pub(crate) fn write_segment(&self, segment: &str, out: &mut String) {
        if segment == "*" {
            out.push('*');
            return;
        }
        out.push_str(&self.prefix);
        if self.escape.is_empty() {
            out.push_str(segment);
        } else {
            out.push_str(&segment.replace(&self.escape, &self.replacement));
        }
        out.push_str(&self.suffix);
    }

    /// Quote a dotted identifier segment by segment.
    pub fn quote_identifier(&self, ident: &str) -> String {
        let mut out = String::with_capacity(ident.len() + 4);
        for (i, segment) in ident.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            self.write_segment(segment, &mut out);
        }
        out
    }
}

impl Default for Quoting {
    fn default() -> Self {
        Self::ansi()
    }
}

/// Settings handed from the connection layer to a grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GrammarConfig {
    /// Overrides the dialect's default quoting.
    #[serde(default)]
    pub quoting: Option<Quoting>,
    /// Prepended to every wrapped table name.
    #[serde(default)]
    pub table_prefix: String,
}

impl GrammarConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = Some(quoting);
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

/// Escape a string literal body without a live connection.
///
/// Replaces `\`, NUL, `\n`, `\r`, `'`, `"` and Ctrl-Z with their backslash forms.
pub fn escape_with_no_connection(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// Something that can turn a value into an SQL literal.
///
/// Live connections implement this with the driver's own quoting; the
/// [`NoConnectionQuoter`] fallback is used otherwise.
pub trait Quoter {
    fn quote(&self, value: &Value) -> String;
}

/// Literal quoting based on [`escape_with_no_connection`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConnectionQuoter;

impl Quoter for NoConnectionQuoter {
    fn quote(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(n) => n.to_string(),
            Value::UInt(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", escape_with_no_connection(s)),
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("x'");
                for b in bytes {
                    out.push_str(&format!("{b:02x}"));
                }
                out.push('\'');
                out
            }
            Value::Json(json) => format!("'{}'", escape_with_no_connection(&json.to_string())),
            Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Uuid(u) => format!("'{u}'"),
        }
    }
}

/// Substitute each `?` placeholder outside of quoted literals with a quoted value.
///
/// Placeholders beyond the number of values are left untouched.
pub fn interpolate(sql: &str, bindings: &[Value], quoter: &dyn Quoter) -> String {
    let mut out = String::with_capacity(sql.len() + bindings.len() * 8);
    let mut values = bindings.iter();
    let mut in_literal = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => match values.next() {
                Some(value) => out.push_str(&quoter.quote(value)),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

/// Count the `?` placeholders outside of quoted literals.
pub fn count_placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for ch in sql.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}
