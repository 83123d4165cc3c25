//! Field descriptors: how a sample field maps onto an attribute name.

use crate::core::Variability;

/// Namespace separator in attribute names.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Namespace holding all primvar attributes.
pub const PRIMVARS_NAMESPACE: &str = "primvars";

/// Suffix of the sibling attribute holding primvar indices.
pub const INDICES_SUFFIX: &str = "indices";

/// Suffix of the relationship holding an attribute's connection.
pub const CONNECT_SUFFIX: &str = "connect";

/// Static description of one sample field.
///
/// Declared as associated constants on the sample type:
///
/// ```ignore
/// const POINTS: FieldSpec = FieldSpec::new("points");
/// const UV: FieldSpec = FieldSpec::new("uv").rename("st");
/// const SCHEME: FieldSpec = FieldSpec::new("scheme").uniform();
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name in the sample type.
    pub name: &'static str,
    /// Attribute name override.
    pub rename: Option<&'static str>,
    /// Extra namespace inserted before the attribute name.
    pub namespace: Option<&'static str>,
    pub variability: Variability,
    /// Store a plain array field as a vertex primvar of this element size.
    pub vertex_data: Option<usize>,
}

impl FieldSpec {
    /// Varying field stored under its own name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            rename: None,
            namespace: None,
            variability: Variability::Varying,
            vertex_data: None,
        }
    }

    /// Store under a different attribute name.
    pub const fn rename(mut self, attr: &'static str) -> Self {
        self.rename = Some(attr);
        self
    }

    /// Prefix the attribute with a namespace.
    pub const fn namespace(mut self, ns: &'static str) -> Self {
        self.namespace = Some(ns);
        self
    }

    /// Mark as uniform (never time-sampled).
    pub const fn uniform(mut self) -> Self {
        self.variability = Variability::Uniform;
        self
    }

    /// Store as a vertex-interpolated primvar.
    ///
    /// Element sizes below 1 are clamped to 1.
    pub const fn vertex_data(mut self, element_size: usize) -> Self {
        self.vertex_data = Some(if element_size == 0 { 1 } else { element_size });
        self
    }

    /// Attribute base name (override or field name).
    #[inline]
    pub const fn attr_name(&self) -> &'static str {
        match self.rename {
            Some(name) => name,
            None => self.name,
        }
    }

    /// Check if the field ignores the time cursor.
    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.variability == Variability::Uniform
    }

    /// Fully qualified attribute name inside `namespace`.
    pub fn qualified(&self, namespace: &str) -> String {
        join_namespace(&join_namespace(namespace, self.namespace.unwrap_or("")), self.attr_name())
    }

    /// Namespace a nested sample or dictionary field recurses into.
    ///
    /// The field's explicit namespace wins, otherwise its attribute name.
    pub fn child_namespace(&self, namespace: &str) -> String {
        join_namespace(namespace, self.namespace.unwrap_or(self.attr_name()))
    }
}

/// Join two namespace parts with `:`, skipping empty parts.
///
/// `join_namespace("foo", "bar") == "foo:bar"`, `join_namespace("", "bar") == "bar"`.
pub fn join_namespace(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (false, true) => first.to_string(),
        (false, false) => format!("{}{}{}", first, NAMESPACE_SEPARATOR, second),
    }
}

/// Attribute name for a primvar field.
pub fn primvar_name(field: &FieldSpec, namespace: &str) -> String {
    join_namespace(PRIMVARS_NAMESPACE, &field.qualified(namespace))
}

/// Attribute name holding the indices of primvar `name`.
pub fn indices_name(primvar: &str) -> String {
    join_namespace(primvar, INDICES_SUFFIX)
}

/// Relationship name holding the connection of attribute `name`.
pub fn connection_name(attribute: &str) -> String {
    format!("{}.{}", attribute, CONNECT_SUFFIX)
}
