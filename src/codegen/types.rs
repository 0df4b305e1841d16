//! Descriptor types for entity metadata.
//!
//! These types describe the entities of a data-access layer as produced by a
//! metadata loader (see [`crate::codegen::yaml_loader`]). The generator only
//! consumes them; it never inspects compiled code itself.

use serde::{Deserialize, Serialize};

/// Wrapper for a descriptor document (`entities:` at the top level)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DescriptorDocument {
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

/// Field descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    /// Declared field name (e.g. "customer_id")
    pub name: String,
    /// Storage type name of the field; for nullable fields this is the
    /// wrapped (underlying) type, e.g. "Int32"
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the field is a nullable value wrapper
    #[serde(default)]
    pub nullable: bool,
    /// Whether the declared type is parameterized (collections, nullable wrappers).
    /// Defaults to `nullable` when omitted.
    #[serde(default)]
    pub generic: Option<bool>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: false,
            generic: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn generic(mut self) -> Self {
        self.generic = Some(true);
        self
    }

    /// Whether the declared type is parameterized
    pub fn is_generic(&self) -> bool {
        self.generic.unwrap_or(self.nullable)
    }

    /// Name of the type the field is declared with.
    ///
    /// A nullable field is declared through its wrapper, so its declared name
    /// never equals the underlying type name.
    pub fn declared_type_name(&self) -> String {
        if self.nullable {
            format!("Nullable<{}>", self.type_name)
        } else {
            self.type_name.clone()
        }
    }
}

/// Entity descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDescriptor {
    /// Entity type name
    pub name: String,
    /// Name of the direct base type, if any
    #[serde(default)]
    pub base_type: Option<String>,
    /// Whether the entity type itself is parameterized
    #[serde(default)]
    pub generic: bool,
    /// Fields in declaration order; the first one is the key
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// The key field: always the first declared field
    pub fn key_field(&self) -> Option<&FieldDescriptor> {
        self.fields.first()
    }

    /// Check if this entity directly extends the given base type
    pub fn extends(&self, base_type: &str) -> bool {
        self.base_type.as_deref() == Some(base_type)
    }
}
