//! Type adapters: validation and serialization of binding groups.
//!
//! [`CompiledPlan::compile`] builds one [`TypeAdapter`] per non-empty binding
//! group, plus the merged adapter that validates path, query and body
//! parameters together. Compilation happens once per endpoint; adapters are
//! immutable and shared by every call.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::args::Arguments;
use crate::binding::{BindingDescriptor, BindingKind};
use crate::error::{FieldError, ValidationError};
use crate::path_template::is_dot_segment;
use crate::plan::ParameterPlan;

/// Arguments that passed validation, keyed by parameter name.
///
/// Missing optional parameters are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validated {
    values: Map<String, Value>,
}

impl Validated {
    /// Validated value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of validated values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was validated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }
}

/// Validator and serializer for a set of bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAdapter {
    fields: Vec<BindingDescriptor>,
}

impl TypeAdapter {
    /// Adapter over `fields`, or `None` when there are none.
    #[must_use]
    pub fn new(fields: Vec<BindingDescriptor>) -> Option<Self> {
        (!fields.is_empty()).then_some(Self { fields })
    }

    /// The parameters this adapter covers.
    #[must_use]
    pub fn fields(&self) -> &[BindingDescriptor] {
        &self.fields
    }

    /// Validate the arguments this adapter covers.
    ///
    /// Checks presence, type and constraints of every field and reports all
    /// failures together. A path value may not be `.` or `..`. Arguments for other parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns every failing field; no partial result is produced.
    pub fn validate(&self, arguments: &Arguments) -> Result<Validated, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut values = Map::new();

        for field in &self.fields {
            let Some(value) = arguments.get(field.name()) else {
                if !field.field_type().is_optional() {
                    errors.push(FieldError::new(field.name(), "field required"));
                }
                continue;
            };

            let before = errors.len();
            field.field_type().check(field.name(), value, &mut errors);
            if errors.len() == before && !value.is_null() {
                errors.extend(
                    field
                        .constraints()
                        .iter()
                        .filter_map(|constraint| constraint.check(value))
                        .map(|message| FieldError::new(field.name(), message)),
                );
                if field.kind() == BindingKind::Path && value.as_str().is_some_and(is_dot_segment) {
                    errors.push(FieldError::new(field.name(), "input should not be `.` or `..`"));
                }
            }
            values.insert(field.name().to_string(), value.clone());
        }

        if errors.is_empty() {
            Ok(Validated { values })
        } else {
            Err(errors)
        }
    }

    /// Flat string pairs for the path, query string or headers.
    ///
    /// Lists become repeated pairs; `null` values are skipped.
    #[must_use]
    pub fn to_pairs(&self, validated: &Validated, use_alias: bool) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let Some(value) = validated.get(field.name()) else {
                continue;
            };
            let name = field.wire_name(use_alias);
            match value {
                Value::Null => {}
                Value::Array(items) => pairs.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (name.to_string(), scalar_text(item))),
                ),
                value => pairs.push((name.into_owned(), scalar_text(value))),
            }
        }
        pairs
    }

    /// JSON payload: an object keyed by wire name, or the bare value of a
    /// single unembedded parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json(&self, validated: &Validated, use_alias: bool) -> crate::Result<Bytes> {
        if let [field] = self.fields.as_slice()
            && !field.is_embedded()
        {
            static NULL: Value = Value::Null;
            return crate::to_json(validated.get(field.name()).unwrap_or(&NULL));
        }

        let object: Map<String, Value> = self
            .fields
            .iter()
            .filter_map(|field| {
                validated
                    .get(field.name())
                    .map(|value| (field.wire_name(use_alias).into_owned(), value.clone()))
            })
            .collect();
        crate::to_json(&object)
    }
}

/// Textual rendering of a value in a path, query string or header.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// A scanned plan with its adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    plan: ParameterPlan,
    path: Option<TypeAdapter>,
    query: Option<TypeAdapter>,
    header: Option<TypeAdapter>,
    body: Option<TypeAdapter>,
    all: Option<TypeAdapter>,
}

impl CompiledPlan {
    /// Build the adapters of `plan`.
    #[must_use]
    pub fn compile(plan: ParameterPlan) -> Self {
        let group = |kind| TypeAdapter::new(plan.group(kind).cloned().collect());
        Self {
            path: group(BindingKind::Path),
            query: group(BindingKind::Query),
            header: group(BindingKind::Header),
            body: group(BindingKind::Body),
            all: TypeAdapter::new(plan.all().cloned().collect()),
            plan,
        }
    }

    /// The scanned plan.
    #[must_use]
    pub const fn plan(&self) -> &ParameterPlan {
        &self.plan
    }

    /// Adapter of one group, if the group is non-empty.
    #[must_use]
    pub const fn adapter(&self, kind: BindingKind) -> Option<&TypeAdapter> {
        match kind {
            BindingKind::Path => self.path.as_ref(),
            BindingKind::Query => self.query.as_ref(),
            BindingKind::Header => self.header.as_ref(),
            BindingKind::Body => self.body.as_ref(),
        }
    }

    /// The merged path, query and body adapter.
    #[must_use]
    pub const fn all(&self) -> Option<&TypeAdapter> {
        self.all.as_ref()
    }

    /// Validate call-time arguments: merged adapter, header adapter, then
    /// arguments that match no parameter.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every failing field.
    pub fn validate(&self, arguments: &Arguments) -> Result<Validated, ValidationError> {
        let mut validated = Validated::default();
        let mut errors = Vec::new();

        for adapter in [self.all.as_ref(), self.header.as_ref()].into_iter().flatten() {
            match adapter.validate(arguments) {
                Ok(values) => validated.merge(values),
                Err(field_errors) => errors.extend(field_errors),
            }
        }

        errors.extend(
            arguments
                .names()
                .filter(|name| !self.plan.params().iter().any(|param| param.name() == *name))
                .map(|name| FieldError::new(name, "unexpected argument")),
        );

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(ValidationError::new(self.plan.endpoint(), errors))
        }
    }

    /// Pairs of one group, empty when the group has no adapter.
    #[must_use]
    pub fn pairs(&self, kind: BindingKind, validated: &Validated) -> Vec<(String, String)> {
        self.adapter(kind)
            .map(|adapter| adapter.to_pairs(validated, true))
            .unwrap_or_default()
    }

    /// JSON body, `None` when the body group is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn body(&self, validated: &Validated) -> crate::Result<Option<Bytes>> {
        self.body
            .as_ref()
            .map(|adapter| adapter.to_json(validated, true))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::binding::Binding;
    use crate::path_template::PathTemplate;
    use crate::plan::{Param, Signature};
    use crate::response::ReturnShape;
    use crate::schema::{FieldType, RecordSchema};

    #[derive(Debug, Serialize, Deserialize)]
    struct NewPost {
        title: String,
        body: String,
        #[serde(rename = "userId")]
        user_id: u32,
    }

    fn compile(signature: Signature, template: &str) -> CompiledPlan {
        let template = PathTemplate::parse(template).expect("valid template");
        let plan = ParameterPlan::scan(&signature.returns(ReturnShape::Json), &template)
            .expect("valid signature");
        CompiledPlan::compile(plan)
    }

    fn arguments(value: Value) -> Arguments {
        let_assert!(Value::Object(map) = value);
        Arguments::from(map)
    }

    fn comments() -> CompiledPlan {
        compile(
            Signature::new("get_comments")
                .param(Param::new::<i64>("post_id").bind(Binding::path().gt(0.0)))
                .param(Param::new::<Option<i64>>("qs_test_id").bind(Binding::query().alias("testID")))
                .param(Param::new::<Vec<String>>("tag").bind(Binding::query()))
                .param(Param::new::<String>("x_trace").bind(Binding::header())),
            "/posts/{post_id}/comments",
        )
    }

    #[test]
    fn empty_groups_have_no_adapter() {
        let compiled = compile(Signature::new("ping"), "/ping");
        check!(compiled.all().is_none());
        check!(compiled.adapter(BindingKind::Body).is_none());
        let_assert!(Ok(validated) = compiled.validate(&Arguments::new()));
        check!(validated.is_empty());
        check!(compiled.pairs(BindingKind::Query, &validated).is_empty());
        let_assert!(Ok(None) = compiled.body(&validated));
    }

    #[test]
    fn merged_adapter_excludes_headers() {
        let compiled = comments();
        let_assert!(Some(all) = compiled.all());
        let names: Vec<_> = all.fields().iter().map(BindingDescriptor::name).collect();
        check!(names == vec!["post_id", "qs_test_id", "tag"]);
        check!(compiled.adapter(BindingKind::Header).is_some());
    }

    #[test]
    fn validate_and_render_pairs() {
        let compiled = comments();
        let args = arguments(json!({
            "post_id": 123,
            "qs_test_id": 42,
            "tag": ["a", "b"],
            "x_trace": "abc",
        }));

        let_assert!(Ok(validated) = compiled.validate(&args));
        check!(
            compiled.pairs(BindingKind::Path, &validated)
                == vec![("post_id".to_string(), "123".to_string())]
        );
        check!(
            compiled.pairs(BindingKind::Query, &validated)
                == vec![
                    ("testID".to_string(), "42".to_string()),
                    ("tag".to_string(), "a".to_string()),
                    ("tag".to_string(), "b".to_string()),
                ]
        );
        check!(
            compiled.pairs(BindingKind::Header, &validated)
                == vec![("x-trace".to_string(), "abc".to_string())]
        );
    }

    #[test]
    fn to_pairs_without_alias_uses_names() {
        let compiled = comments();
        let args = arguments(json!({"post_id": 1, "qs_test_id": 7, "tag": [], "x_trace": "t"}));
        let_assert!(Ok(validated) = compiled.validate(&args));
        let_assert!(Some(query) = compiled.adapter(BindingKind::Query));
        check!(query.to_pairs(&validated, false) == vec![("qs_test_id".to_string(), "7".to_string())]);
    }

    #[test]
    fn optional_fields_may_be_missing_or_null() {
        let compiled = comments();
        let args = arguments(json!({"post_id": 1, "qs_test_id": null, "tag": [], "x_trace": "t"}));
        let_assert!(Ok(validated) = compiled.validate(&args));
        check!(compiled.pairs(BindingKind::Query, &validated).is_empty());

        let args = arguments(json!({"post_id": 1, "tag": [], "x_trace": "t"}));
        let_assert!(Ok(validated) = compiled.validate(&args));
        check!(validated.get("qs_test_id").is_none());
    }

    #[test]
    fn validate_collects_every_failure() {
        let compiled = comments();
        let args = arguments(json!({
            "post_id": -1,
            "qs_test_id": "42",
            "tag": ["ok", 3],
            "surprise": true,
        }));

        let_assert!(Err(err) = compiled.validate(&args));
        check!(err.endpoint() == "get_comments");
        let errors: Vec<_> = err.errors().iter().map(ToString::to_string).collect();
        check!(
            errors
                == vec![
                    "post_id: input should be greater than 0",
                    "qs_test_id: input should be a valid integer",
                    "tag[1]: input should be a valid string",
                    "x_trace: field required",
                    "surprise: unexpected argument",
                ]
        );
    }

    #[test]
    fn dot_segments_are_not_path_values() {
        let compiled = compile(
            Signature::new("profile")
                .param(Param::new::<String>("name").bind(Binding::path()))
                .param(Param::new::<String>("q").bind(Binding::query())),
            "/users/{name}/profile",
        );

        for name in [".", ".."] {
            let_assert!(Err(err) = compiled.validate(&arguments(json!({"name": name, "q": ".."}))));
            let errors: Vec<_> = err.errors().iter().map(ToString::to_string).collect();
            check!(errors == vec!["name: input should not be `.` or `..`"]);
        }

        let_assert!(Ok(_) = compiled.validate(&arguments(json!({"name": "...", "q": "."}))));
    }

    #[test]
    fn body_is_keyed_by_wire_name() {
        let compiled = compile(
            Signature::new("create_post")
                .param(Param::typed("post", FieldType::Record(RecordSchema::of::<NewPost>())))
                .param(Param::new::<bool>("notify").bind(Binding::body().alias("sendNotification"))),
            "/posts",
        );
        let args = arguments(json!({
            "post": {"title": "t", "body": "b", "userId": 1},
            "notify": false,
        }));

        let_assert!(Ok(validated) = compiled.validate(&args));
        let_assert!(Ok(Some(body)) = compiled.body(&validated));
        check!(
            &body[..]
                == br#"{"post":{"title":"t","body":"b","userId":1},"sendNotification":false}"#.as_slice()
        );

        let reparsed: Value = serde_json::from_slice(&body).expect("valid JSON");
        let reencoded = serde_json::to_vec(&reparsed).expect("serializable");
        check!(reencoded == body.to_vec());
    }

    #[test]
    fn unembedded_body_is_the_bare_value() {
        let compiled = compile(
            Signature::new("create_post").param(
                Param::typed("post", FieldType::Record(RecordSchema::of::<NewPost>()))
                    .bind(Binding::body().embed(false)),
            ),
            "/posts",
        );
        let args = arguments(json!({"post": {"title": "t", "body": "b", "userId": 1}}));
        let_assert!(Ok(validated) = compiled.validate(&args));
        let_assert!(Ok(Some(body)) = compiled.body(&validated));
        check!(&body[..] == br#"{"title":"t","body":"b","userId":1}"#.as_slice());
    }

    #[test]
    fn record_errors_are_located() {
        let compiled = compile(
            Signature::new("create_post")
                .param(Param::typed("post", FieldType::Record(RecordSchema::of::<NewPost>()))),
            "/posts",
        );
        let args = arguments(json!({"post": {"title": "t", "body": "b", "userId": "x"}}));
        let_assert!(Err(err) = compiled.validate(&args));
        let_assert!([error] = err.errors());
        check!(error.loc == "post.userId");
    }
}
