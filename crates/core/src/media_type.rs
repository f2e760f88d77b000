//! Media type parsing and normalization.
//!
//! Media types are compared by their *essence*: `type/subtype`, lowercased,
//! with parameters stripped. Parameters are kept only for display.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced while parsing a media type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("media type must not be empty")]
    Empty,

    #[error("media type '{0}' does not contain '/'")]
    MissingSubtype(String),

    #[error("invalid token '{token}' in media type '{input}'")]
    InvalidToken { input: String, token: String },

    #[error("wildcard type is only allowed with wildcard subtype: '{0}'")]
    WildcardType(String),

    #[error("invalid parameter '{param}' in media type '{input}'")]
    InvalidParameter { input: String, param: String },
}

/// A validated media type such as `text/html` or `text/plain;charset=utf-8`.
#[derive(Debug, Clone)]
pub struct MediaType {
    type_: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parse and validate a media type string.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MediaTypeError::Empty);
        }

        let mut segments = split_parameters(trimmed).into_iter();
        // always yields at least one segment
        let full_type = segments.next().unwrap_or_default().trim();

        let (type_, subtype) = full_type
            .split_once('/')
            .ok_or_else(|| MediaTypeError::MissingSubtype(trimmed.to_string()))?;

        for token in [type_, subtype] {
            if !is_token(token) {
                return Err(MediaTypeError::InvalidToken {
                    input: trimmed.to_string(),
                    token: token.to_string(),
                });
            }
        }

        if type_ == "*" && subtype != "*" {
            return Err(MediaTypeError::WildcardType(trimmed.to_string()));
        }

        let mut params = Vec::new();
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let invalid = || MediaTypeError::InvalidParameter {
                input: trimmed.to_string(),
                param: segment.to_string(),
            };
            let (name, value) = segment.split_once('=').ok_or_else(invalid)?;
            let (name, value) = (name.trim(), value.trim());
            if !is_token(name) || !(is_token(value) || is_quoted(value)) {
                return Err(invalid());
            }
            params.push((name.to_ascii_lowercase(), value.to_string()));
        }

        Ok(Self {
            type_: type_.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
        })
    }

    /// Primary type, e.g. `text`.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns a copy without parameters. Idempotent.
    pub fn normalized(&self) -> Self {
        Self {
            type_: self.type_.clone(),
            subtype: self.subtype.clone(),
            params: Vec::new(),
        }
    }

    /// The normalized `type/subtype` string.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    pub fn is_wildcard(&self) -> bool {
        self.type_ == "*" || self.subtype == "*"
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

/// Split on `;` outside of quoted strings.
///
/// An unterminated quote keeps the rest of the input in the last segment,
/// which then fails parameter validation.
fn split_parameters(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, b) in s.bytes().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_quotes => escaped = true,
            b'"' => in_quotes = !in_quotes,
            b';' if !in_quotes => {
                segments.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&s[start..]);
    segments
}

/// RFC 7230 quoted-string: no bare `"` inside, escapes consume one character.
fn is_quoted(s: &str) -> bool {
    let Some(body) = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' => return false,
            _ => {}
        }
    }
    true
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.type_ == other.type_ && self.subtype == other.subtype
    }
}

impl Eq for MediaType {}

impl Hash for MediaType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_.hash(state);
        self.subtype.hash(state);
    }
}

impl PartialOrd for MediaType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaType {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.type_, &self.subtype).cmp(&(&other.type_, &other.subtype))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
