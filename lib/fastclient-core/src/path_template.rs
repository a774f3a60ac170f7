//! URL path templates.
//!
//! A template such as `/posts/{post_id}/comments` is parsed once, when the
//! endpoint is registered, into literal and placeholder segments. Rendering
//! substitutes percent-encoded values for the placeholders.

use std::fmt;

use derive_more::{Display, Error};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Encodes everything that cannot appear verbatim inside one path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// A template string that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("malformed path template `{template}`: {message}")]
pub struct TemplateError {
    template: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed URL path template.
///
/// ```
/// use fastclient_core::PathTemplate;
///
/// let template = PathTemplate::parse("/posts/{post_id}/comments").expect("valid");
/// assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["post_id"]);
///
/// let path = template.render(|name| (name == "post_id").then(|| "123".to_string()));
/// assert_eq!(path.expect("rendered"), "/posts/123/comments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns an error on unbalanced braces, empty placeholder names or a
    /// placeholder that is not a valid identifier.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let fail = |message: &str| TemplateError {
            template: template.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(start) = rest.find(['{', '}']) {
            if rest[start..].starts_with('}') {
                return Err(fail("unmatched `}`"));
            }
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| fail("unclosed `{`"))?;
            let name = &after[..end];
            if name.is_empty() {
                return Err(fail("empty placeholder"));
            }
            if !is_identifier(name) {
                return Err(fail(&format!("invalid placeholder name `{name}`")));
            }
            segments.push(Segment::Placeholder(name.to_string()));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template string as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns `true` if the template contains `{name}`.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().any(|placeholder| placeholder == name)
    }

    /// Substitute every placeholder with the percent-encoded value returned by
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnresolvedPlaceholder`] when `lookup` has no
    /// value for a placeholder, and [`crate::Error::InvalidRequest`] when the
    /// value is `.` or `..`.
    pub fn render<F>(&self, lookup: F) -> crate::Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup(name).ok_or_else(|| crate::Error::UnresolvedPlaceholder {
                        name: name.clone(),
                        template: self.raw.clone(),
                    })?;
                    if is_dot_segment(&value) {
                        return Err(crate::Error::invalid_request(format!(
                            "`{value}` cannot fill the `{{{name}}}` placeholder of `{}`",
                            self.raw
                        )));
                    }
                    path.extend(utf8_percent_encode(&value, PATH_SEGMENT_ENCODE_SET));
                }
            }
        }
        Ok(path)
    }
}

/// Returns `true` for the `.` and `..` segments that URL normalization
/// removes.
pub(crate) fn is_dot_segment(value: &str) -> bool {
    matches!(value, "." | "..")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
