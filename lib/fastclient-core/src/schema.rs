//! Field types and constraints.
//!
//! A [`FieldType`] is the structural description of a parameter value. The
//! engine checks call-time values (as [`serde_json::Value`]) against it; typed
//! records are checked by round-tripping through their own `Deserialize`
//! implementation, so serde stays the single source of truth for their shape.
//!
//! Rust types get a field type through the [`Schema`] trait.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FieldError;

/// Structural type of a parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Any JSON value.
    Any,
    /// `true` / `false`.
    Bool,
    /// Signed or unsigned integer.
    Integer,
    /// Any JSON number.
    Float,
    /// Text.
    String,
    /// Homogeneous list.
    List(Box<FieldType>),
    /// Value that may be absent or `null`.
    Optional(Box<FieldType>),
    /// Generic key-value mapping (JSON object).
    Map,
    /// Typed record with named fields.
    Record(RecordSchema),
}

impl FieldType {
    /// `List` of the given item type.
    #[must_use]
    pub fn list(item: Self) -> Self {
        Self::List(Box::new(item))
    }

    /// `Optional` of the given type.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Returns `true` for values made of named fields (records and mappings).
    #[must_use]
    pub fn is_structured(&self) -> bool {
        match self {
            Self::Map | Self::Record(_) => true,
            Self::Optional(inner) => inner.is_structured(),
            _ => false,
        }
    }

    /// Returns `true` if a record, a mapping or an untyped value appears
    /// anywhere in this type. Such values have no flat text form.
    #[must_use]
    pub fn contains_structure(&self) -> bool {
        match self {
            Self::Any | Self::Map | Self::Record(_) => true,
            Self::List(inner) | Self::Optional(inner) => inner.contains_structure(),
            Self::Bool | Self::Integer | Self::Float | Self::String => false,
        }
    }

    /// Returns `true` if a list appears anywhere in this type.
    #[must_use]
    pub fn contains_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::Optional(inner) => inner.contains_list(),
            _ => false,
        }
    }

    /// Returns `true` if the value may be missing.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Any)
    }

    /// Check `value` against this type, appending failures to `errors`.
    pub fn check(&self, loc: &str, value: &Value, errors: &mut Vec<FieldError>) {
        match (self, value) {
            (Self::Any, _)
            | (Self::Bool, Value::Bool(_))
            | (Self::String, Value::String(_))
            | (Self::Float, Value::Number(_))
            | (Self::Map, Value::Object(_))
            | (Self::Optional(_), Value::Null) => {}
            (Self::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {}
            (Self::Optional(inner), value) => inner.check(loc, value, errors),
            (Self::List(item), Value::Array(items)) => {
                for (index, item_value) in items.iter().enumerate() {
                    item.check(&format!("{loc}[{index}]"), item_value, errors);
                }
            }
            (Self::Record(record), value) => {
                if let Err(error) = record.check(value) {
                    errors.push(error.nested_in(loc));
                }
            }
            (expected, _) => errors.push(FieldError::new(loc, expected.mismatch())),
        }
    }

    fn mismatch(&self) -> &'static str {
        match self {
            Self::Bool => "input should be a valid boolean",
            Self::Integer => "input should be a valid integer",
            Self::Float => "input should be a valid number",
            Self::String => "input should be a valid string",
            Self::List(_) => "input should be a valid list",
            Self::Map => "input should be a valid mapping",
            Self::Any | Self::Optional(_) | Self::Record(_) => "input has an unexpected shape",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::List(item) => write!(f, "list[{item}]"),
            Self::Optional(inner) => write!(f, "optional[{inner}]"),
            Self::Map => f.write_str("mapping"),
            Self::Record(record) => write!(f, "record {}", record.name()),
        }
    }
}

// ============================================================================
// Record Schema
// ============================================================================

/// Location-relative failure reported by a record check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    path: Option<String>,
    message: String,
}

impl RecordError {
    fn nested_in(self, loc: &str) -> FieldError {
        match self.path {
            Some(path) if path.starts_with('[') => FieldError::new(format!("{loc}{path}"), self.message),
            Some(path) => FieldError::new(format!("{loc}.{path}"), self.message),
            None => FieldError::new(loc, self.message),
        }
    }
}

/// A typed record: a Rust type whose `Deserialize` implementation validates
/// the JSON shape.
#[derive(Clone)]
pub struct RecordSchema {
    name: &'static str,
    check: fn(&Value) -> Result<(), RecordError>,
}

impl RecordSchema {
    /// Record schema of `T`, named after its type name.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let full = std::any::type_name::<T>();
        let name = full
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(full);
        Self::named::<T>(name)
    }

    /// Record schema of `T` with an explicit display name.
    #[must_use]
    pub fn named<T>(name: &'static str) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self {
            name,
            check: check_record::<T>,
        }
    }

    /// Display name of the record type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Check that `value` deserializes into the record type.
    pub fn check(&self, value: &Value) -> Result<(), RecordError> {
        (self.check)(value)
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

fn check_record<T: DeserializeOwned>(value: &Value) -> Result<(), RecordError> {
    if !value.is_object() {
        return Err(RecordError {
            path: None,
            message: "input should be a valid record".to_string(),
        });
    }
    serde_path_to_error::deserialize::<_, T>(value)
        .map(drop)
        .map_err(|error| {
            let path = error.path().to_string();
            RecordError {
                path: (path != ".").then_some(path),
                message: error.inner().to_string(),
            }
        })
}

// ============================================================================
// Constraints
// ============================================================================

/// Per-parameter validation constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Strictly greater than.
    Gt(f64),
    /// Greater than or equal.
    Ge(f64),
    /// Strictly less than.
    Lt(f64),
    /// Less than or equal.
    Le(f64),
    /// Minimum number of characters (strings) or items (lists).
    MinLength(usize),
    /// Maximum number of characters (strings) or items (lists).
    MaxLength(usize),
}

impl Constraint {
    /// Check a value, returning the failure reason.
    ///
    /// Values of a kind the constraint does not apply to pass; the type check
    /// reports those.
    #[must_use]
    pub fn check(&self, value: &Value) -> Option<String> {
        match *self {
            Self::Gt(bound) => value
                .as_f64()
                .filter(|n| !(*n > bound))
                .map(|_| format!("input should be greater than {bound}")),
            Self::Ge(bound) => value
                .as_f64()
                .filter(|n| !(*n >= bound))
                .map(|_| format!("input should be greater than or equal to {bound}")),
            Self::Lt(bound) => value
                .as_f64()
                .filter(|n| !(*n < bound))
                .map(|_| format!("input should be less than {bound}")),
            Self::Le(bound) => value
                .as_f64()
                .filter(|n| !(*n <= bound))
                .map(|_| format!("input should be less than or equal to {bound}")),
            Self::MinLength(min) => measure(value)
                .filter(|(len, _)| *len < min)
                .map(|(_, unit)| format!("input should have at least {min} {unit}")),
            Self::MaxLength(max) => measure(value)
                .filter(|(len, _)| *len > max)
                .map(|(_, unit)| format!("input should have at most {max} {unit}")),
        }
    }
}

fn measure(value: &Value) -> Option<(usize, &'static str)> {
    match value {
        Value::String(s) => Some((s.chars().count(), "characters")),
        Value::Array(items) => Some((items.len(), "items")),
        _ => None,
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gt(bound) => write!(f, "gt {bound}"),
            Self::Ge(bound) => write!(f, "ge {bound}"),
            Self::Lt(bound) => write!(f, "lt {bound}"),
            Self::Le(bound) => write!(f, "le {bound}"),
            Self::MinLength(min) => write!(f, "min_length {min}"),
            Self::MaxLength(max) => write!(f, "max_length {max}"),
        }
    }
}

// ============================================================================
// Schema Trait
// ============================================================================

/// Types that can describe their own [`FieldType`].
///
/// Implemented for primitives, strings, collections, `serde_json` values and
/// references. Records get an implementation from `#[derive(Model)]`.
pub trait Schema {
    /// The structural type of values of this type.
    fn field_type() -> FieldType;
}

macro_rules! impl_schema {
    ($field_type:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Schema for $ty {
                fn field_type() -> FieldType {
                    $field_type
                }
            }
        )+
    };
}

impl_schema!(FieldType::Bool => bool);
impl_schema!(
    FieldType::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);
impl_schema!(FieldType::Float => f32, f64);
impl_schema!(FieldType::String => str, String, char);
impl_schema!(FieldType::Any => Value);
impl_schema!(FieldType::Map => serde_json::Map<String, Value>);

impl<T: Schema> Schema for Option<T> {
    fn field_type() -> FieldType {
        FieldType::optional(T::field_type())
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }
}

impl<T: Schema> Schema for [T] {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }
}

impl<K, V, S> Schema for HashMap<K, V, S> {
    fn field_type() -> FieldType {
        FieldType::Map
    }
}

impl<K, V> Schema for BTreeMap<K, V> {
    fn field_type() -> FieldType {
        FieldType::Map
    }
}

impl<T: Schema + ?Sized> Schema for &T {
    fn field_type() -> FieldType {
        T::field_type()
    }
}

impl<T: Schema + ?Sized> Schema for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }
}

/// Types with a flat text form, accepted by path, query and header parameters.
///
/// Records and mappings do not implement it, so the endpoint macros reject
/// them as non-body parameters at compile time. Whether a list or an optional
/// value fits a given binding is checked when the endpoint is built.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be sent as a path, query or header parameter",
    label = "records and mappings only go in the request body"
)]
pub trait ScalarValue {}

macro_rules! impl_scalar_value {
    ($($ty:ty),+ $(,)?) => {
        $(impl ScalarValue for $ty {})+
    };
}

impl_scalar_value!(
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char, str,
    String
);

impl<T: ScalarValue> ScalarValue for Option<T> {}
impl<T: ScalarValue> ScalarValue for Vec<T> {}
impl<T: ScalarValue> ScalarValue for [T] {}
impl<T: ScalarValue + ?Sized> ScalarValue for &T {}
impl<T: ScalarValue + ?Sized> ScalarValue for Box<T> {}
