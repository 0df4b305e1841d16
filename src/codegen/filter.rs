//! Entity filtering: decides which descriptors are generatable.

use std::collections::{HashMap, HashSet};

use crate::codegen::types::EntityDescriptor;
use crate::codegen::utils::to_pascal_case;
use crate::error::{CodegenError, Result};

/// Base type of the storage context in the target framework
pub const DEFAULT_CONTEXT_BASE_TYPE: &str = "DbContext";

/// Check whether a descriptor should get a model and a controller.
///
/// Parameterized types, compiler-synthesized names (containing `<` or `=`)
/// and the storage context itself are skipped.
pub fn is_generatable(entity: &EntityDescriptor, context_base_type: &str) -> bool {
    !entity.generic
        && !entity.name.contains('<')
        && !entity.name.contains('=')
        && !entity.extends(context_base_type)
}

/// Lazily filter descriptors down to the generatable ones, keeping input order.
pub fn filter_entities<'a>(
    entities: &'a [EntityDescriptor],
    context_base_type: &'a str,
) -> impl Iterator<Item = &'a EntityDescriptor> + Clone + 'a {
    entities
        .iter()
        .filter(move |entity| is_generatable(entity, context_base_type))
}

/// Names of all generatable entities.
///
/// Fields whose declared type is one of these names are navigation
/// properties and never appear on models or controllers.
#[derive(Debug, Clone, Default)]
pub struct KnownEntities {
    names: HashSet<String>,
}

impl KnownEntities {
    pub fn from_entities(entities: &[EntityDescriptor], context_base_type: &str) -> Self {
        Self {
            names: filter_entities(entities, context_base_type)
                .map(|entity| entity.name.clone())
                .collect(),
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.names.contains(type_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for KnownEntities {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Generated type names of a set of entities.
///
/// Every generated file is named after the PascalCase entity name, so two
/// entities mapping to the same name (`order_line` and `OrderLine`) or an
/// entity mapping to no name at all (`x`) cannot be generated.
#[derive(Debug, Clone, Default)]
pub struct OutputNames {
    owners: HashMap<String, Vec<String>>,
}

impl OutputNames {
    pub fn from_entities<'a, I>(entities: I) -> Self
    where
        I: IntoIterator<Item = &'a EntityDescriptor>,
    {
        let mut owners: HashMap<String, Vec<String>> = HashMap::new();
        for entity in entities {
            owners
                .entry(to_pascal_case(&entity.name))
                .or_default()
                .push(entity.name.clone());
        }
        Self { owners }
    }

    /// Check that `entity` owns its generated type name alone.
    pub fn check(&self, entity: &EntityDescriptor) -> Result<()> {
        let type_name = to_pascal_case(&entity.name);

        if type_name.is_empty() {
            return Err(CodegenError::EmptyTypeName {
                entity: entity.name.clone(),
            });
        }

        match self.owners.get(&type_name) {
            Some(owners) if owners.len() > 1 => Err(CodegenError::NameCollision {
                type_name,
                entities: owners.clone(),
            }),
            _ => Ok(()),
        }
    }
}
