//! 2-Way SQL templates.
//!
//! A block comment holding only a parameter name marks a bind site: `/* id */1`. The literal
//! after the marker is a dummy that keeps the template executable as plain SQL; binding
//! replaces it with a placeholder. A parenthesized dummy `/* ids */(1, 2)` marks a list that
//! expands to one placeholder per element. All other comments pass through unchanged.

use super::dialect::Dialect;
use super::params::{BindValue, Params};
use crate::error::ClioneError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn parameter_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex"))
}

fn number_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Bind { name: String, list: bool },
}

/// A parsed template, reusable across bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlTemplate {
    nodes: Vec<Node>,
}

/// Executable SQL with positional values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub values: Vec<BindValue>,
}

impl SqlTemplate {
    pub fn parse(sql: &str) -> Result<Self, ClioneError> {
        Parser::new(sql).parse()
    }

    pub fn bind(&self, params: &Params, dialect: Dialect, depth_limit: usize) -> Result<BoundSql, ClioneError> {
        let mut sql = String::new();
        let mut values = Vec::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => sql.push_str(text),
                Node::Bind { name, list } => {
                    let value = params
                        .lookup(name, depth_limit)?
                        .ok_or_else(|| ClioneError::ParameterNotFound(name.clone()))?;
                    match (value, list) {
                        (Value::Array(items), true) => {
                            if items.is_empty() {
                                sql.push_str("(NULL)");
                                continue;
                            }
                            let mut placeholders = Vec::with_capacity(items.len());
                            for item in items {
                                values.push(BindValue::from_json(item));
                                placeholders.push(dialect.placeholder(values.len()));
                            }
                            sql.push('(');
                            sql.push_str(&placeholders.join(", "));
                            sql.push(')');
                        }
                        (v, true) => {
                            values.push(BindValue::from_json(v));
                            sql.push('(');
                            sql.push_str(&dialect.placeholder(values.len()));
                            sql.push(')');
                        }
                        (Value::Array(_), false) => {
                            return Err(ClioneError::Format(format!(
                                "parameter '{}' is a list but its dummy literal is not parenthesized",
                                name
                            )));
                        }
                        (v, false) => {
                            values.push(BindValue::from_json(v));
                            sql.push_str(&dialect.placeholder(values.len()));
                        }
                    }
                }
            }
        }
        Ok(BoundSql { sql, values })
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    text_start: usize,
    nodes: Vec<Node>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            text_start: 0,
            nodes: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<SqlTemplate, ClioneError> {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\'' => self.pos = self.skip_quoted(self.pos, b'\'')?,
                b'"' => self.pos = self.skip_quoted(self.pos, b'"')?,
                b'-' if self.peek(1) == Some(b'-') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment()?,
                _ => self.pos += 1,
            }
        }
        self.flush_text(self.bytes.len());
        Ok(SqlTemplate { nodes: self.nodes })
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            let text = &self.src[self.text_start..end];
            match self.nodes.last_mut() {
                Some(Node::Text(prev)) => prev.push_str(text),
                _ => self.nodes.push(Node::Text(text.to_string())),
            }
        }
    }

    /// Returns the position just past the closing quote. A doubled quote is an escape.
    fn skip_quoted(&self, start: usize, quote: u8) -> Result<usize, ClioneError> {
        let mut i = start + 1;
        while i < self.bytes.len() {
            if self.bytes[i] == quote {
                if self.bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                    continue;
                }
                return Ok(i + 1);
            }
            i += 1;
        }
        Err(ClioneError::Format(format!("unterminated quoted literal at offset {}", start)))
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn block_comment(&mut self) -> Result<(), ClioneError> {
        let start = self.pos;
        let body_start = start + 2;
        let close = self.src[body_start..]
            .find("*/")
            .map(|i| body_start + i)
            .ok_or_else(|| ClioneError::Format(format!("unterminated comment at offset {}", start)))?;
        let end = close + 2;
        let body = self.src[body_start..close].trim();
        if !parameter_name().is_match(body) {
            self.pos = end;
            return Ok(());
        }

        let mut literal_start = end;
        while literal_start < self.bytes.len() && self.bytes[literal_start].is_ascii_whitespace() {
            literal_start += 1;
        }
        let (literal_end, list) = self.dummy_literal(literal_start).ok_or_else(|| {
            ClioneError::Format(format!(
                "bind marker /* {} */ at offset {} must be followed by a dummy literal",
                body, start
            ))
        })??;

        self.flush_text(start);
        self.nodes.push(Node::Bind {
            name: body.to_string(),
            list,
        });
        self.pos = literal_end;
        self.text_start = literal_end;
        Ok(())
    }

    /// End of the dummy literal at `start` and whether it is a list. `None` when no literal is there.
    fn dummy_literal(&self, start: usize) -> Option<Result<(usize, bool), ClioneError>> {
        let first = *self.bytes.get(start)?;
        if first == b'\'' {
            return Some(self.skip_quoted(start, b'\'').map(|end| (end, false)));
        }
        if first == b'(' {
            return Some(self.skip_parenthesized(start).map(|end| (end, true)));
        }
        let rest = &self.src[start..];
        if let Some(m) = number_literal().find(rest) {
            return Some(Ok((start + m.end(), false)));
        }
        for keyword in ["NULL", "TRUE", "FALSE"] {
            if rest.len() >= keyword.len()
                && rest.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
                && !rest
                    .as_bytes()
                    .get(keyword.len())
                    .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
            {
                return Some(Ok((start + keyword.len(), false)));
            }
        }
        None
    }

    fn skip_parenthesized(&self, start: usize) -> Result<usize, ClioneError> {
        let mut depth = 0usize;
        let mut i = start;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\'' => {
                    i = self.skip_quoted(i, b'\'')?;
                    continue;
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(ClioneError::Format(format!("unterminated list literal at offset {}", start)))
    }
}
