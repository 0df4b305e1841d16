//! Model class emission.
//!
//! A model is a plain data holder exposing the mapped fields of one entity,
//! each preceded by a comment naming the physical field it came from.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::codegen::field_map::FieldMap;
use crate::codegen::filter::KnownEntities;
use crate::codegen::fs_utils;
use crate::codegen::log::LogLine;
use crate::codegen::types::EntityDescriptor;
use crate::codegen::utils::to_pascal_case;
use crate::error::{CodegenError, Result};

/// Settings shared by every model job of a run
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Directory the model files are written to
    pub output_dir: PathBuf,
    /// Namespace of the generated model classes
    pub namespace: String,
    /// Suffix appended to the entity name, e.g. "Model"
    pub suffix: String,
    /// File extension without the dot
    pub extension: String,
}

/// Name of the model class generated for an entity
pub fn model_type_name(entity_name: &str, suffix: &str) -> String {
    format!("{}{}", to_pascal_case(entity_name), suffix)
}

/// Render a model class.
pub fn write_model<W: Write>(
    out: &mut W,
    type_name: &str,
    fields: &FieldMap,
    namespace: &str,
) -> io::Result<()> {
    writeln!(out, "using System;")?;
    writeln!(out)?;
    writeln!(out, "namespace {}", namespace)?;
    writeln!(out, "{{")?;
    writeln!(out, "    public class {}", type_name)?;
    writeln!(out, "    {{")?;

    for field in fields.iter() {
        writeln!(out)?;
        writeln!(out, "        // {}", field.physical_name)?;
        writeln!(
            out,
            "        public {} {} {{ get; set; }}",
            field.type_name, field.model_name
        )?;
    }

    writeln!(out, "    }}")?;
    write!(out, "}}")
}

/// Generate the model file for one entity and return its log line.
pub fn generate_model(
    entity: &EntityDescriptor,
    known: &KnownEntities,
    config: &ModelConfig,
) -> Result<LogLine> {
    let type_name = model_type_name(&entity.name, &config.suffix);
    let file_name = format!("{}.{}", type_name, config.extension);
    let path = config.output_dir.join(&file_name);

    let fields = FieldMap::build(entity, known);

    let file = fs_utils::create_file(&path).map_err(|e| CodegenError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    write_model(&mut writer, &type_name, &fields, &config.namespace)
        .and_then(|_| writer.flush())
        .map_err(|e| CodegenError::io(&path, e))?;

    tracing::debug!("Generated model {} ({} fields)", file_name, fields.len());
    Ok(LogLine::now(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::FieldDescriptor;

    fn customer() -> EntityDescriptor {
        EntityDescriptor::new("customer")
            .with_field(FieldDescriptor::new("customer_id", "Int32"))
            .with_field(FieldDescriptor::new("Name", "String"))
            .with_field(FieldDescriptor::new("RowVersion", "Byte[]"))
    }

    #[test]
    fn test_model_type_name() {
        assert_eq!(model_type_name("order_line", "Model"), "OrderLineModel");
        assert_eq!(model_type_name("Customer", "Dto"), "CustomerDto");
    }

    #[test]
    fn test_write_model() {
        let fields = FieldMap::build(&customer(), &KnownEntities::default());
        let mut out = Vec::new();
        write_model(&mut out, "CustomerModel", &fields, "Shop.Models").unwrap();
        let code = String::from_utf8(out).unwrap();

        let expected = "using System;\n\
            \n\
            namespace Shop.Models\n\
            {\n\
            \x20   public class CustomerModel\n\
            \x20   {\n\
            \n\
            \x20       // customer_id\n\
            \x20       public int CustomerId { get; set; }\n\
            \n\
            \x20       // Name\n\
            \x20       public string Name { get; set; }\n\
            \x20   }\n\
            }";
        assert_eq!(code, expected);
        assert!(!code.contains("RowVersion"));
    }

    #[test]
    fn test_generate_model_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            output_dir: dir.path().join("Models"),
            namespace: "Shop.Models".to_string(),
            suffix: "Model".to_string(),
            extension: "cs".to_string(),
        };

        let line = generate_model(&customer(), &KnownEntities::default(), &config).unwrap();
        assert_eq!(line.file_name, "CustomerModel.cs");

        let code = std::fs::read_to_string(dir.path().join("Models/CustomerModel.cs")).unwrap();
        assert!(code.contains("public class CustomerModel"));
    }
}
