//! Attribute schema descriptors
//!
//! A single declarative tree describes both the configuration surface
//! (snake_case attribute names, required/optional/computed flags, validators)
//! and the JSON wire binding (camelCase keys, omit-when-unset). Every kind
//! registered with the provider carries one of these trees instead of a
//! hand-written struct.

use serde::Serialize;

use crate::validate::Validator;

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum AttrType {
    String,
    Bool,
    Int64,
    Number,
    /// Ordered list of elements
    List(Box<AttrType>),
    /// Unordered string to string map
    Map,
    /// Nested block with its own attributes
    Object(Vec<Attribute>),
}

impl AttrType {
    /// Human readable type name used in errors and schema output
    pub fn name(&self) -> String {
        match self {
            AttrType::String => "string".to_string(),
            AttrType::Bool => "bool".to_string(),
            AttrType::Int64 => "int64".to_string(),
            AttrType::Number => "number".to_string(),
            AttrType::List(inner) => format!("list({})", inner.name()),
            AttrType::Map => "map(string)".to_string(),
            AttrType::Object(_) => "object".to_string(),
        }
    }

    /// Nested attributes of an object, or of the element type of a list of objects
    pub fn nested(&self) -> Option<&[Attribute]> {
        match self {
            AttrType::Object(attrs) => Some(attrs),
            AttrType::List(inner) => inner.nested(),
            _ => None,
        }
    }
}

/// A single attribute in a resource schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Configuration name (snake_case)
    pub name: String,
    /// Key in the Kubernetes JSON representation
    pub json_name: String,
    #[serde(rename = "type")]
    pub attr_type: AttrType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Always present, possibly empty
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
}

impl Attribute {
    /// Create an optional attribute whose JSON key is derived from its camelCase name
    pub fn new(json_name: impl Into<String>, attr_type: AttrType) -> Self {
        let json_name = json_name.into();
        Self {
            name: to_snake_case(&json_name),
            json_name,
            attr_type,
            required: false,
            optional: true,
            computed: false,
            description: String::new(),
            validators: Vec::new(),
            sensitive: false,
        }
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self.computed = false;
        self
    }

    /// Mark as computed (filled by the server, read-only in configuration)
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Whether the JSON encoding drops this attribute when it is unset
    pub fn omit_empty(&self) -> bool {
        !self.required
    }
}

/// Find an attribute by configuration name
pub fn find<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|a| a.name == name)
}

/// The `spec` schema of one kind
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResourceSchema {
    pub description: String,
    pub spec: Vec<Attribute>,
    /// Whether `spec` itself is required on the object
    pub spec_required: bool,
}

impl ResourceSchema {
    /// Check that required-ness, omit-when-unset and computed flags agree for
    /// every attribute. Returns the dotted paths of inconsistent attributes.
    pub fn check_consistency(&self) -> Vec<String> {
        let mut problems = Vec::new();
        check_attrs(&self.spec, "spec", &mut problems);
        problems
    }
}

fn check_attrs(attrs: &[Attribute], prefix: &str, problems: &mut Vec<String>) {
    for attr in attrs {
        let path = format!("{}.{}", prefix, attr.name);
        let flags_ok = attr.required == !attr.omit_empty()
            && !(attr.required && (attr.optional || attr.computed))
            && (attr.required || attr.optional || attr.computed);
        if !flags_ok {
            problems.push(path.clone());
        }
        if let Some(nested) = attr.attr_type.nested() {
            check_attrs(nested, &path, problems);
        }
    }
}

/// Convert a camelCase JSON key to a snake_case attribute name
///
/// Runs of capitals are treated as one word (`CPULimit` -> `cpu_limit`,
/// `identityProviderURL` -> `identity_provider_url`).
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '.' || c == ' ' {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
