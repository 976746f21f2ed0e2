//! Schema summarization
//!
//! Raw introspection JSON is far too large to hand to a model wholesale, so
//! it is compressed into one block per object type with a handful of fields
//! each. Lossy on purpose: input objects, enums and interfaces are dropped,
//! and every field type collapses to its base name.

use serde::Deserialize;

use crate::core::error::PipelineError;
use crate::core::graphql_client::IntrospectionResult;

/// Placeholder for a type reference whose wrapper chain never reaches a name.
pub const UNRESOLVED_TYPE_NAME: &str = "Unknown";

/// Introspection meta-types carry this prefix and never appear in summaries.
const RESERVED_TYPE_PREFIX: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One entry of `data.__schema.types`.
#[derive(Debug, Deserialize)]
pub struct TypeDescriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Option<Vec<FieldDescriptor>>,
}

impl TypeDescriptor {
    /// Only named, non-reserved object types make it into the summary.
    fn is_summarizable(&self) -> bool {
        self.kind == TypeKind::Object
            && self
                .name
                .as_deref()
                .is_some_and(|name| !name.starts_with(RESERVED_TYPE_PREFIX))
    }
}

#[derive(Debug, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ArgumentDescriptor>,
    #[serde(rename = "type", default)]
    pub type_ref: TypeRef,
}

#[derive(Debug, Deserialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_ref: TypeRef,
}

/// A possibly-wrapped type reference: a chain of NON_NULL/LIST wrapper nodes
/// terminating in a named base type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeRef {
    pub name: Option<String>,
    #[serde(rename = "ofType", default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Unwrap wrapper nodes until a named base type is found.
    ///
    /// An already-named reference resolves to its own name; a chain that
    /// ends without a name degrades to [`UNRESOLVED_TYPE_NAME`] rather than
    /// erroring.
    pub fn base_name(&self) -> &str {
        let mut current = self;
        loop {
            if let Some(name) = current.name.as_deref() {
                return name;
            }
            match current.of_type.as_deref() {
                Some(inner) => current = inner,
                None => return UNRESOLVED_TYPE_NAME,
            }
        }
    }
}

/// Compress an introspection result into a model-sized schema description.
///
/// One block per object type, at most `field_limit` fields each:
///
/// ```text
/// User {
///   id: ID
///   name: String
///   posts(limit: Int): Post
/// }
/// ```
pub fn summarize(
    introspection: &IntrospectionResult,
    field_limit: usize,
) -> Result<String, PipelineError> {
    let types = introspection.types().ok_or_else(|| {
        PipelineError::MalformedIntrospection(
            "response is missing data.__schema.types".to_string(),
        )
    })?;

    let descriptors: Vec<TypeDescriptor> = serde_json::from_value(types.clone()).map_err(|e| {
        PipelineError::MalformedIntrospection(format!("could not decode type list: {e}"))
    })?;

    Ok(descriptors
        .iter()
        .filter(|descriptor| descriptor.is_summarizable())
        .map(|descriptor| render_type(descriptor, field_limit))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn render_type(descriptor: &TypeDescriptor, field_limit: usize) -> String {
    let name = descriptor.name.as_deref().unwrap_or_default();
    let mut block = format!("{name} {{\n");

    for field in descriptor.fields.iter().flatten().take(field_limit) {
        block.push_str("  ");
        block.push_str(&render_field(field));
        block.push('\n');
    }

    block.push('}');
    block
}

fn render_field(field: &FieldDescriptor) -> String {
    let return_type = field.type_ref.base_name();

    if field.args.is_empty() {
        format!("{}: {return_type}", field.name)
    } else {
        let args = field
            .args
            .iter()
            .map(|arg| format!("{}: {}", arg.name, arg.type_ref.base_name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({args}): {return_type}", field.name)
    }
}
