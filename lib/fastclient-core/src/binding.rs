//! Parameter bindings.
//!
//! A [`Binding`] is the marker an application author attaches to a parameter
//! to say where its value goes on the wire. The scanner turns each declared
//! parameter into an immutable [`BindingDescriptor`].

use std::borrow::Cow;
use std::fmt;

use derive_more::Display;

use crate::schema::{Constraint, FieldType};

/// Where a parameter value is placed in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BindingKind {
    /// Substituted into a `{placeholder}` of the URL template.
    #[display("path")]
    Path,
    /// Appended to the query string.
    #[display("query")]
    Query,
    /// Sent as a request header.
    #[display("header")]
    Header,
    /// Part of the JSON request body.
    #[display("body")]
    Body,
}

/// Explicit binding marker for a parameter.
///
/// ```
/// use fastclient_core::Binding;
///
/// let binding = Binding::query().alias("testID").gt(0.0);
/// assert_eq!(binding.alias_name(), Some("testID"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    kind: BindingKind,
    alias: Option<String>,
    constraints: Vec<Constraint>,
    embed: bool,
}

impl Binding {
    /// A binding of the given kind, without alias or constraints.
    #[must_use]
    pub const fn new(kind: BindingKind) -> Self {
        Self {
            kind,
            alias: None,
            constraints: Vec::new(),
            embed: true,
        }
    }

    /// Path binding.
    #[must_use]
    pub const fn path() -> Self {
        Self::new(BindingKind::Path)
    }

    /// Query binding.
    #[must_use]
    pub const fn query() -> Self {
        Self::new(BindingKind::Query)
    }

    /// Header binding.
    #[must_use]
    pub const fn header() -> Self {
        Self::new(BindingKind::Header)
    }

    /// Body binding.
    #[must_use]
    pub const fn body() -> Self {
        Self::new(BindingKind::Body)
    }

    /// Wire name used instead of the parameter name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add a validation constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Value must be strictly greater than `bound`.
    #[must_use]
    pub fn gt(self, bound: f64) -> Self {
        self.constraint(Constraint::Gt(bound))
    }

    /// Value must be greater than or equal to `bound`.
    #[must_use]
    pub fn ge(self, bound: f64) -> Self {
        self.constraint(Constraint::Ge(bound))
    }

    /// Value must be strictly less than `bound`.
    #[must_use]
    pub fn lt(self, bound: f64) -> Self {
        self.constraint(Constraint::Lt(bound))
    }

    /// Value must be less than or equal to `bound`.
    #[must_use]
    pub fn le(self, bound: f64) -> Self {
        self.constraint(Constraint::Le(bound))
    }

    /// Minimum length (characters or items).
    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.constraint(Constraint::MinLength(min))
    }

    /// Maximum length (characters or items).
    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.constraint(Constraint::MaxLength(max))
    }

    /// For a body parameter: `false` sends the value as the whole body instead
    /// of under its wire name. Only valid when it is the sole body parameter.
    #[must_use]
    pub const fn embed(mut self, embed: bool) -> Self {
        self.embed = embed;
        self
    }

    /// The binding kind.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.kind
    }

    /// The alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The constraints.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether a body value is embedded under its wire name.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.embed
    }
}

/// Fully resolved binding of one declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingDescriptor {
    name: String,
    field_type: FieldType,
    binding: Binding,
}

impl BindingDescriptor {
    pub(crate) fn new(name: impl Into<String>, field_type: FieldType, binding: Binding) -> Self {
        Self {
            name: name.into(),
            field_type,
            binding,
        }
    }

    /// Parameter name, as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub const fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Where the value goes.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.binding.kind
    }

    /// Alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.binding.alias_name()
    }

    /// Constraints checked on validation.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        self.binding.constraints()
    }

    /// Whether a body value is embedded under its wire name.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.binding.embed
    }

    /// Name used on the wire.
    ///
    /// The alias when `use_alias` is set and one is declared. Otherwise the
    /// parameter name, with `_` turned into `-` for headers.
    #[must_use]
    pub fn wire_name(&self, use_alias: bool) -> Cow<'_, str> {
        match (self.alias(), self.kind()) {
            (Some(alias), _) if use_alias => Cow::Borrowed(alias),
            (_, BindingKind::Header) => Cow::Owned(self.name.replace('_', "-")),
            _ => Cow::Borrowed(&self.name),
        }
    }
}

impl fmt::Display for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({}", self.name, self.field_type, self.kind())?;
        if let Some(alias) = self.alias() {
            write!(f, ", alias {alias:?}")?;
        }
        for constraint in self.constraints() {
            write!(f, ", {constraint}")?;
        }
        if !self.is_embedded() {
            f.write_str(", not embedded")?;
        }
        f.write_str(")")
    }
}
