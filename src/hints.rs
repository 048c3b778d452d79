//! Query hints embedded as `--+` comments.
//!
//! YDB reads optimizer hints from comment lines of the form
//! `--+ name(arg arg ...)` placed before a statement. Hints apply
//! positionally, so [`render`] emits directives strictly in declaration
//! order. Arguments of generic directives are quoted only when they would
//! otherwise break the micro-syntax: an empty argument, or one containing
//! whitespace, a single quote, or a parenthesis, is wrapped in single quotes
//! with inner quotes doubled (`C'D` becomes `'C''D'`). Control characters,
//! line breaks included, cannot be carried inside a comment line and are
//! rejected.

use std::borrow::Cow;

use thiserror::Error;

use crate::sql::identifier::{validate_identifier, validate_word, IdentifierError};

/// Prefix that marks a comment line as a hint.
pub const HINT_PREFIX: &str = "--+";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HintError {
    #[error("invalid hint name '{name}': {source}")]
    InvalidName {
        name: String,
        source: IdentifierError,
    },

    #[error("hint '{name}' needs at least one column")]
    EmptyColumnList { name: String },

    #[error("invalid column '{column}' in hint '{name}': {source}")]
    InvalidColumn {
        name: String,
        column: String,
        source: IdentifierError,
    },

    #[error("argument {argument:?} of hint '{name}' contains a control character")]
    ControlCharacter { name: String, argument: String },

    #[error("malformed hint line '{line}': {reason}")]
    Malformed { line: String, reason: String },
}

/// How a directive's arguments are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    /// Arguments are column identifiers, emitted bare.
    Columns,
    /// Arguments are free-form values, quoted when needed.
    Generic,
}

/// One hint directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintDirective {
    name: String,
    arguments: Vec<String>,
    kind: HintKind,
}

impl HintDirective {
    /// `unique(col ...)`: the listed columns form a unique key.
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::columns("unique", columns)
    }

    /// `distinct(col ...)`: rows are distinct over the listed columns.
    pub fn distinct<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::columns("distinct", columns)
    }

    /// A column-list directive with an arbitrary name.
    pub fn columns<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            arguments: columns.into_iter().map(Into::into).collect(),
            kind: HintKind::Columns,
        }
    }

    /// A directive whose arguments are free-form values.
    pub fn generic<I, S>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
            kind: HintKind::Generic,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn kind(&self) -> HintKind {
        self.kind
    }

    /// Render the `name(args)` fragment without the comment prefix.
    pub fn fragment(&self) -> Result<String, HintError> {
        validate_word(&self.name).map_err(|source| HintError::InvalidName {
            name: self.name.clone(),
            source,
        })?;

        let arguments = match self.kind {
            HintKind::Columns => {
                if self.arguments.is_empty() {
                    return Err(HintError::EmptyColumnList {
                        name: self.name.clone(),
                    });
                }
                for column in &self.arguments {
                    validate_identifier(column).map_err(|source| HintError::InvalidColumn {
                        name: self.name.clone(),
                        column: column.clone(),
                        source,
                    })?;
                }
                self.arguments.join(" ")
            }
            HintKind::Generic => {
                // A hint is a single comment line; a line break would end it.
                if let Some(argument) = self
                    .arguments
                    .iter()
                    .find(|argument| argument.chars().any(char::is_control))
                {
                    return Err(HintError::ControlCharacter {
                        name: self.name.clone(),
                        argument: argument.clone(),
                    });
                }
                self.arguments
                    .iter()
                    .map(|argument| quote_argument(argument))
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        };

        Ok(format!("{}({})", self.name, arguments))
    }
}

/// Quote a generic hint argument if it would not survive unquoted.
pub fn quote_argument(argument: &str) -> Cow<'_, str> {
    let needs_quotes = argument.is_empty()
        || argument
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '(' | ')'));

    if needs_quotes {
        Cow::Owned(format!("'{}'", argument.replace('\'', "''")))
    } else {
        Cow::Borrowed(argument)
    }
}

/// Render directives as hint comment lines, one per directive, each ending in
/// a newline. An empty slice renders as an empty string.
pub fn render(directives: &[HintDirective]) -> Result<String, HintError> {
    let mut out = String::new();
    for directive in directives {
        out.push_str(HINT_PREFIX);
        out.push(' ');
        out.push_str(&directive.fragment()?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse hint comment lines back into directives.
///
/// Lines that are not hint comments are ignored. `unique` and `distinct`
/// come back as column-list directives, everything else as generic ones.
pub fn parse(text: &str) -> Result<Vec<HintDirective>, HintError> {
    text.lines()
        .filter_map(|line| line.trim_start().strip_prefix(HINT_PREFIX))
        .map(parse_fragment)
        .collect()
}

fn parse_fragment(line: &str) -> Result<HintDirective, HintError> {
    let malformed = |reason: &str| HintError::Malformed {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let body = line.trim();
    let (name, rest) = body.split_once('(').ok_or_else(|| malformed("missing '('"))?;
    let inner = rest
        .strip_suffix(')')
        .ok_or_else(|| malformed("missing ')'"))?;

    let mut arguments = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            break;
        };

        let mut argument = String::new();
        if first == '\'' {
            chars.next();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        argument.push('\'');
                    }
                    Some('\'') => break,
                    Some(c) => argument.push(c),
                    None => return Err(malformed("unterminated quote")),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                if matches!(c, '\'' | '(' | ')') {
                    return Err(malformed("unexpected delimiter in bare argument"));
                }
                argument.push(c);
            }
        }
        arguments.push(argument);
    }

    let name = name.trim();
    Ok(match name {
        "unique" | "distinct" => HintDirective::columns(name, arguments),
        _ => HintDirective::generic(name, arguments),
    })
}
