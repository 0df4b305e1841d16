//! Mapping between an entity's physical fields and its model fields.

use indexmap::IndexMap;

use crate::codegen::filter::KnownEntities;
use crate::codegen::types::{EntityDescriptor, FieldDescriptor};
use crate::codegen::utils::{friendly_type_name, to_pascal_case};
use crate::error::{CodegenError, Result};

/// Concurrency-token field that is never exposed
pub const ROW_VERSION_FIELD: &str = "RowVersion";

/// One entry of a field map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    /// Name on the entity
    pub physical_name: String,
    /// Name on the model
    pub model_name: String,
    /// Type spelling in generated source, including the nullable marker
    pub type_name: String,
}

impl MappedField {
    fn from_descriptor(field: &FieldDescriptor) -> Self {
        Self {
            physical_name: field.name.clone(),
            model_name: to_pascal_case(&field.name),
            type_name: friendly_type_name(&field.type_name, field.nullable),
        }
    }
}

/// Ordered field map keyed by physical field name (declaration order)
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: IndexMap<String, MappedField>,
}

impl FieldMap {
    /// Build the field map for one entity.
    ///
    /// Skips non-nullable parameterized fields (collections), fields typed as
    /// another generatable entity, and the row-version field.
    pub fn build(entity: &EntityDescriptor, known: &KnownEntities) -> Self {
        let mut fields = IndexMap::new();

        for field in &entity.fields {
            if field.is_generic() && !field.nullable {
                continue;
            }

            if known.contains(&field.declared_type_name()) {
                continue;
            }

            let mapped = MappedField::from_descriptor(field);
            if mapped.model_name == ROW_VERSION_FIELD {
                continue;
            }

            fields.insert(mapped.physical_name.clone(), mapped);
        }

        Self { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappedField> {
        self.fields.values()
    }

    pub fn get(&self, physical_name: &str) -> Option<&MappedField> {
        self.fields.get(physical_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Resolve the key field of an entity.
///
/// The key is the first declared field whether or not it survives
/// [`FieldMap::build`].
pub fn key_field(entity: &EntityDescriptor) -> Result<MappedField> {
    entity
        .key_field()
        .map(MappedField::from_descriptor)
        .ok_or_else(|| CodegenError::EmptyEntity {
            entity: entity.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> EntityDescriptor {
        EntityDescriptor::new("Customer")
            .with_field(FieldDescriptor::new("customer_id", "Int32"))
            .with_field(FieldDescriptor::new("Name", "String"))
            .with_field(FieldDescriptor::new("RowVersion", "Byte[]"))
            .with_field(FieldDescriptor::new("LastOrderOn", "DateTime").nullable())
            .with_field(FieldDescriptor::new("Orders", "ICollection<Order>").generic())
            .with_field(FieldDescriptor::new("Region", "Region"))
    }

    fn known() -> KnownEntities {
        ["Customer", "Order", "Region"].into_iter().map(String::from).collect()
    }

    #[test]
    fn test_mapping_keeps_declaration_order() {
        let map = FieldMap::build(&customer(), &known());
        let names: Vec<_> = map.iter().map(|f| f.model_name.as_str()).collect();
        assert_eq!(names, vec!["CustomerId", "Name", "LastOrderOn"]);
    }

    #[test]
    fn test_row_version_is_excluded_regardless_of_type() {
        let entity = EntityDescriptor::new("Invoice")
            .with_field(FieldDescriptor::new("invoice_id", "Int64"))
            .with_field(FieldDescriptor::new("row_version", "Int64"));
        let map = FieldMap::build(&entity, &KnownEntities::default());
        assert_eq!(map.len(), 1);
        assert!(map.get("row_version").is_none());
    }

    #[test]
    fn test_navigation_fields_are_excluded() {
        let map = FieldMap::build(&customer(), &known());
        assert!(map.get("Region").is_none());
        assert!(map.get("Orders").is_none());

        // Without Region in the known set it is an opaque scalar
        let map = FieldMap::build(&customer(), &KnownEntities::default());
        assert_eq!(map.get("Region").unwrap().type_name, "Region");
    }

    #[test]
    fn test_nullable_wrapper_is_kept_with_marker() {
        let map = FieldMap::build(&customer(), &known());
        let field = map.get("LastOrderOn").unwrap();
        assert_eq!(field.type_name, "DateTime?");
    }

    #[test]
    fn test_key_field_is_first_field() {
        let key = key_field(&customer()).unwrap();
        assert_eq!(key.physical_name, "customer_id");
        assert_eq!(key.model_name, "CustomerId");
        assert_eq!(key.type_name, "int");
    }

    #[test]
    fn test_key_field_survives_filtering() {
        let entity = EntityDescriptor::new("Audit")
            .with_field(FieldDescriptor::new("RowVersion", "Int64"))
            .with_field(FieldDescriptor::new("Note", "String"));
        assert!(FieldMap::build(&entity, &KnownEntities::default()).get("RowVersion").is_none());
        assert_eq!(key_field(&entity).unwrap().type_name, "long");
    }

    #[test]
    fn test_empty_entity_has_no_key() {
        let err = key_field(&EntityDescriptor::new("Empty")).unwrap_err();
        assert!(matches!(err, CodegenError::EmptyEntity { ref entity } if entity == "Empty"));
    }
}
