//! Method signature scanning.
//!
//! A [`Signature`] is the descriptor table of one declared endpoint: its
//! parameters, each with a type and an optional explicit [`Binding`], and its
//! return shape. [`ParameterPlan::scan`] resolves every parameter to a binding
//! group and rejects declarations that could never produce a valid request.

use std::collections::HashSet;
use std::fmt;

use crate::binding::{Binding, BindingDescriptor, BindingKind};
use crate::error::ConfigurationError;
use crate::path_template::PathTemplate;
use crate::response::ReturnShape;
use crate::schema::{FieldType, Schema};

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    field_type: FieldType,
    binding: Option<Binding>,
}

impl Param {
    /// Parameter of Rust type `T`.
    #[must_use]
    pub fn new<T: Schema + ?Sized>(name: impl Into<String>) -> Self {
        Self::typed(name, T::field_type())
    }

    /// Parameter with an explicit field type.
    #[must_use]
    pub fn typed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            binding: None,
        }
    }

    /// Attach an explicit binding marker.
    #[must_use]
    pub fn bind(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Declared parameters and return shape of an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<Param>,
    returns: Option<ReturnShape>,
}

impl Signature {
    /// Empty signature for the endpoint `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Declare the return shape.
    #[must_use]
    pub const fn returns(mut self, shape: ReturnShape) -> Self {
        self.returns = Some(shape);
        self
    }

    /// Endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters, in order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn push(&mut self, param: Param) {
        self.params.push(param);
    }

    pub(crate) fn set_returns(&mut self, shape: ReturnShape) {
        self.returns = Some(shape);
    }
}

/// Parameters of an endpoint grouped by where they go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPlan {
    endpoint: String,
    params: Vec<BindingDescriptor>,
    returns: ReturnShape,
}

impl ParameterPlan {
    /// Scan a signature against its URL template.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when the return shape is missing, a
    /// parameter has no usable binding, names collide, or path parameters and
    /// template placeholders do not match one to one.
    pub fn scan(signature: &Signature, template: &PathTemplate) -> Result<Self, ConfigurationError> {
        let fail = |message: String| ConfigurationError::new(signature.name(), message);

        let returns = signature.returns.ok_or_else(|| {
            let expected: Vec<_> = ReturnShape::ALL.iter().map(ToString::to_string).collect();
            fail(format!(
                "missing return type: expected one of {}, found none",
                expected.join(", ")
            ))
        })?;

        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(signature.params.len());
        for param in &signature.params {
            if !seen.insert(param.name.as_str()) {
                return Err(fail(format!("duplicate parameter `{}`", param.name)));
            }
            let binding = resolve(param, template).map_err(&fail)?;
            params.push(BindingDescriptor::new(
                param.name.clone(),
                param.field_type.clone(),
                binding,
            ));
        }

        let plan = Self {
            endpoint: signature.name.clone(),
            params,
            returns,
        };
        plan.check_wire_names().map_err(&fail)?;
        plan.check_placeholders(template).map_err(&fail)?;
        plan.check_body().map_err(&fail)?;
        Ok(plan)
    }

    /// Name of the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Declared return shape.
    #[must_use]
    pub const fn returns(&self) -> ReturnShape {
        self.returns
    }

    /// Every parameter, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[BindingDescriptor] {
        &self.params
    }

    /// Parameters of one group, in declaration order.
    pub fn group(&self, kind: BindingKind) -> impl Iterator<Item = &BindingDescriptor> {
        self.params.iter().filter(move |param| param.kind() == kind)
    }

    /// Merged view used for validation: path, query and body parameters.
    pub fn all(&self) -> impl Iterator<Item = &BindingDescriptor> {
        self.params
            .iter()
            .filter(|param| param.kind() != BindingKind::Header)
    }

    fn check_wire_names(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for param in &self.params {
            let mut wire = param.wire_name(true).into_owned();
            if param.kind() == BindingKind::Header {
                wire.make_ascii_lowercase();
            }
            if !seen.insert((param.kind(), wire)) {
                return Err(format!(
                    "duplicate {} name `{}`",
                    param.kind(),
                    param.wire_name(true)
                ));
            }
        }
        Ok(())
    }

    fn check_placeholders(&self, template: &PathTemplate) -> Result<(), String> {
        for placeholder in template.placeholders() {
            let covered = self
                .group(BindingKind::Path)
                .any(|param| param.wire_name(true) == placeholder);
            if !covered {
                return Err(format!(
                    "placeholder `{{{placeholder}}}` in `{template}` has no path parameter"
                ));
            }
        }
        Ok(())
    }

    fn check_body(&self) -> Result<(), String> {
        let body: Vec<_> = self.group(BindingKind::Body).collect();
        match body.iter().find(|param| !param.is_embedded()) {
            Some(param) if body.len() > 1 => Err(format!(
                "body parameter `{}` is not embedded but the body has {} parameters",
                param.name(),
                body.len()
            )),
            _ => Ok(()),
        }
    }
}

fn resolve(param: &Param, template: &PathTemplate) -> Result<Binding, String> {
    let name = &param.name;
    let structured = param.field_type.is_structured();
    let binding = match &param.binding {
        Some(binding) => binding.clone(),
        None if structured => Binding::body(),
        None if template.has_placeholder(name) => Binding::path(),
        None => {
            return Err(format!(
                "parameter `{name}` has no binding: mark it as path, query, header or body"
            ));
        }
    };

    let field_type = &param.field_type;
    let unsupported = |kind: BindingKind| {
        format!("parameter `{name}`: {field_type} values are not supported as {kind} parameters")
    };
    match binding.kind() {
        BindingKind::Body => {}
        kind if field_type.contains_structure() => return Err(unsupported(kind)),
        _ if !binding.is_embedded() => {
            return Err(format!(
                "parameter `{name}`: only body parameters can be sent unembedded"
            ));
        }
        // one path segment or header line holds exactly one value
        kind @ (BindingKind::Path | BindingKind::Header) if field_type.contains_list() => {
            return Err(unsupported(kind));
        }
        BindingKind::Path if field_type.is_optional() => return Err(unsupported(BindingKind::Path)),
        BindingKind::Path => {
            let placeholder = binding.alias_name().unwrap_or(name);
            if !template.has_placeholder(placeholder) {
                return Err(format!(
                    "path parameter `{name}` has no `{{{placeholder}}}` placeholder in `{template}`"
                ));
            }
        }
        BindingKind::Query | BindingKind::Header => {}
    }
    Ok(binding)
}

impl fmt::Display for ParameterPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.endpoint, self.returns)?;
        for kind in [
            BindingKind::Path,
            BindingKind::Query,
            BindingKind::Header,
            BindingKind::Body,
        ] {
            let mut group = self.group(kind).peekable();
            if group.peek().is_none() {
                continue;
            }
            write!(f, "\n  {kind}")?;
            for param in group {
                write!(f, "\n    {param}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::schema::RecordSchema;

    #[derive(Debug, Serialize, Deserialize)]
    struct NewPost {
        title: String,
    }

    fn template(raw: &str) -> PathTemplate {
        PathTemplate::parse(raw).expect("valid template")
    }

    fn scan(signature: &Signature, raw: &str) -> Result<ParameterPlan, ConfigurationError> {
        ParameterPlan::scan(signature, &template(raw))
    }

    fn post_param() -> Param {
        Param::typed("post", FieldType::Record(RecordSchema::of::<NewPost>()))
    }

    #[test]
    fn scan_groups_parameters() {
        let signature = Signature::new("get_comments")
            .param(Param::new::<i64>("post_id").bind(Binding::path()))
            .param(
                Param::new::<i64>("qs_test_id")
                    .bind(Binding::query().alias("testID").gt(0.0)),
            )
            .param(Param::new::<str>("x_request_id").bind(Binding::header()))
            .param(post_param())
            .returns(ReturnShape::Model);

        let_assert!(Ok(plan) = scan(&signature, "/posts/{post_id}/comments"));
        check!(plan.returns() == ReturnShape::Model);
        check!(plan.group(BindingKind::Path).count() == 1);
        check!(plan.group(BindingKind::Body).map(BindingDescriptor::name).collect::<Vec<_>>() == vec!["post"]);
        check!(
            plan.all().map(BindingDescriptor::name).collect::<Vec<_>>()
                == vec!["post_id", "qs_test_id", "post"]
        );

        insta::assert_snapshot!(plan, @r#"
        get_comments -> model
          path
            post_id: integer (path)
          query
            qs_test_id: integer (query, alias "testID", gt 0)
          header
            x_request_id: string (header)
          body
            post: record NewPost (body)
        "#);
    }

    #[test]
    fn unbound_parameters_get_defaults() {
        let signature = Signature::new("update_post")
            .param(Param::new::<u32>("post_id"))
            .param(post_param())
            .param(Param::new::<serde_json::Map<String, serde_json::Value>>("extra"))
            .returns(ReturnShape::Json);

        let_assert!(Ok(plan) = scan(&signature, "/posts/{post_id}"));
        let kinds: Vec<_> = plan.params().iter().map(BindingDescriptor::kind).collect();
        check!(kinds == vec![BindingKind::Path, BindingKind::Body, BindingKind::Body]);
    }

    #[test]
    fn missing_return_shape_is_rejected() {
        let signature = Signature::new("list_posts");
        let_assert!(Err(err) = scan(&signature, "/posts"));
        check!(
            err.to_string()
                == "invalid endpoint `list_posts`: missing return type: expected one of model, JSON mapping, raw response, found none"
        );
    }

    #[test]
    fn unbound_scalar_is_rejected() {
        let signature = Signature::new("list_posts")
            .param(Param::new::<u32>("page"))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/posts"));
        check!(err.message.contains("parameter `page` has no binding"));
    }

    #[test]
    fn structured_query_is_not_supported() {
        let signature = Signature::new("search")
            .param(post_param().bind(Binding::query()))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/search"));
        check!(
            err.message
                == "parameter `post`: record NewPost values are not supported as query parameters"
        );
    }

    #[test]
    fn nested_structure_is_not_flat_text() {
        for (field_type, kind) in [
            (FieldType::list(post_param().field_type), Binding::query()),
            (FieldType::list(FieldType::Map), Binding::query()),
            (FieldType::optional(FieldType::list(FieldType::Map)), Binding::header()),
            (FieldType::Any, Binding::query()),
            (FieldType::Any, Binding::path()),
        ] {
            let expected = format!(
                "parameter `tags`: {field_type} values are not supported as {} parameters",
                kind.kind()
            );
            let signature = Signature::new("search")
                .param(Param::typed("tags", field_type).bind(kind))
                .returns(ReturnShape::Json);
            let_assert!(Err(err) = scan(&signature, "/search/{tags}"));
            check!(err.message == expected);
        }
    }

    #[test]
    fn lists_are_query_only() {
        let signature = Signature::new("search")
            .param(Param::new::<Vec<String>>("tags").bind(Binding::header().alias("X-Tag")))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/search"));
        check!(err.message == "parameter `tags`: list[string] values are not supported as header parameters");

        let signature = Signature::new("search")
            .param(Param::new::<Option<Vec<String>>>("tags").bind(Binding::header()))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/search"));
        check!(
            err.message
                == "parameter `tags`: optional[list[string]] values are not supported as header parameters"
        );

        let signature = Signature::new("by_tags")
            .param(Param::new::<Vec<String>>("tags").bind(Binding::path()))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/tags/{tags}"));
        check!(err.message == "parameter `tags`: list[string] values are not supported as path parameters");

        let signature = Signature::new("search")
            .param(Param::new::<Vec<String>>("tags").bind(Binding::query()))
            .param(Param::new::<Option<Vec<u32>>>("ids").bind(Binding::query()))
            .returns(ReturnShape::Json);
        check!(scan(&signature, "/search").is_ok());
    }

    #[test]
    fn optional_path_parameter_is_rejected() {
        let signature = Signature::new("get_post")
            .param(Param::new::<Option<u32>>("id").bind(Binding::path()))
            .returns(ReturnShape::Model);
        let_assert!(Err(err) = scan(&signature, "/posts/{id}"));
        check!(err.message == "parameter `id`: optional[integer] values are not supported as path parameters");

        let signature = Signature::new("get_post")
            .param(Param::new::<Option<u32>>("id"))
            .returns(ReturnShape::Model);
        let_assert!(Err(err) = scan(&signature, "/posts/{id}"));
        check!(err.message == "parameter `id`: optional[integer] values are not supported as path parameters");

        let signature = Signature::new("get_post")
            .param(Param::new::<Option<&str>>("trace").bind(Binding::header()))
            .param(Param::new::<u32>("id"))
            .returns(ReturnShape::Model);
        check!(scan(&signature, "/posts/{id}").is_ok());
    }

    #[test]
    fn path_parameters_must_match_placeholders() {
        let signature = Signature::new("get_post")
            .param(Param::new::<u32>("id").bind(Binding::path()))
            .returns(ReturnShape::Model);
        let_assert!(Err(err) = scan(&signature, "/posts/{post_id}"));
        check!(err.message == "path parameter `id` has no `{id}` placeholder in `/posts/{post_id}`");

        let signature = Signature::new("get_post").returns(ReturnShape::Model);
        let_assert!(Err(err) = scan(&signature, "/posts/{post_id}"));
        check!(err.message == "placeholder `{post_id}` in `/posts/{post_id}` has no path parameter");

        let signature = Signature::new("get_post")
            .param(Param::new::<u32>("id").bind(Binding::path().alias("post_id")))
            .returns(ReturnShape::Model);
        check!(scan(&signature, "/posts/{post_id}").is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let signature = Signature::new("dup")
            .param(Param::new::<u32>("a").bind(Binding::query()))
            .param(Param::new::<u32>("a").bind(Binding::query()))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/"));
        check!(err.message == "duplicate parameter `a`");

        let signature = Signature::new("dup")
            .param(Param::new::<u32>("a").bind(Binding::query().alias("q")))
            .param(Param::new::<u32>("b").bind(Binding::query().alias("q")))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/"));
        check!(err.message == "duplicate query name `q`");

        let signature = Signature::new("dup")
            .param(Param::new::<str>("x_id").bind(Binding::header()))
            .param(Param::new::<str>("other").bind(Binding::header().alias("X-ID")))
            .returns(ReturnShape::Json);
        let_assert!(Err(err) = scan(&signature, "/"));
        check!(err.message == "duplicate header name `X-ID`");
    }

    #[test]
    fn unembedded_body_must_be_alone() {
        let signature = Signature::new("create")
            .param(post_param().bind(Binding::body().embed(false)))
            .returns(ReturnShape::Model);
        check!(scan(&signature, "/posts").is_ok());

        let signature = Signature::new("create")
            .param(post_param().bind(Binding::body().embed(false)))
            .param(Param::new::<u32>("user_id").bind(Binding::body()))
            .returns(ReturnShape::Model);
        let_assert!(Err(err) = scan(&signature, "/posts"));
        check!(err.message == "body parameter `post` is not embedded but the body has 2 parameters");

        let signature = Signature::new("create")
            .param(Param::new::<u32>("page").bind(Binding::query().embed(false)))
            .returns(ReturnShape::Model);
        let_assert!(Err(err) = scan(&signature, "/posts"));
        check!(err.message == "parameter `page`: only body parameters can be sent unembedded");
    }
}
