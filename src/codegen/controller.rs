//! CRUD controller emission.
//!
//! Each controller owns a storage context, converts between entity and model
//! through two lambdas derived from the [`FieldMap`], and exposes list, get,
//! update, create and delete actions keyed by the entity's first field.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::codegen::field_map::{key_field, FieldMap, MappedField};
use crate::codegen::filter::KnownEntities;
use crate::codegen::fs_utils;
use crate::codegen::log::LogLine;
use crate::codegen::model::model_type_name;
use crate::codegen::types::EntityDescriptor;
use crate::codegen::utils::to_pascal_case;
use crate::error::{CodegenError, Result};

/// Settings shared by every controller job of a run
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Directory the controller files are written to
    pub output_dir: PathBuf,
    /// Root namespace; controllers live in `<namespace>.Controllers`
    pub project_namespace: String,
    /// Storage-context class instantiated by each controller
    pub db_context: String,
    /// Import lines written verbatim at the top of each file
    pub imports: Vec<String>,
    /// Suffix of the model classes the controller converts to
    pub model_suffix: String,
    /// File extension without the dot
    pub extension: String,
}

/// Everything needed to render one controller
#[derive(Debug, Clone)]
pub struct ControllerPlan<'a> {
    pub entity_name: &'a str,
    pub type_name: String,
    pub model_name: String,
    pub controller_name: String,
    pub key: MappedField,
    pub fields: FieldMap,
}

impl<'a> ControllerPlan<'a> {
    /// Fails for an entity without fields, since it has no key.
    pub fn new(
        entity: &'a EntityDescriptor,
        known: &KnownEntities,
        model_suffix: &str,
    ) -> Result<Self> {
        let key = key_field(entity)?;
        let type_name = to_pascal_case(&entity.name);

        Ok(Self {
            entity_name: &entity.name,
            model_name: model_type_name(&entity.name, model_suffix),
            controller_name: format!("{}Controller", type_name),
            type_name,
            key,
            fields: FieldMap::build(entity, known),
        })
    }
}

/// Render a controller class.
pub fn write_controller<W: Write>(
    out: &mut W,
    plan: &ControllerPlan<'_>,
    config: &ControllerConfig,
) -> io::Result<()> {
    for line in &config.imports {
        writeln!(out, "{}", line)?;
    }

    writeln!(out)?;
    writeln!(out, "namespace {}.Controllers", config.project_namespace)?;
    writeln!(out, "{{")?;
    writeln!(out, "    public class {} : ApiController", plan.controller_name)?;
    writeln!(out, "    {{")?;
    writeln!(out, "        private readonly DbContext _db = new {}();", config.db_context)?;
    writeln!(out)?;

    write_converters(out, plan)?;
    write_list(out, plan)?;
    write_get(out, plan)?;
    write_update(out, plan)?;
    write_create(out, plan)?;
    write_delete(out, plan)?;
    write_dispose(out)?;
    write_exists(out, plan)?;

    writeln!(out, "    }}")?;
    write!(out, "}}")
}

fn write_converters<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    let entity = plan.entity_name;
    let model = &plan.model_name;

    writeln!(out, "        private readonly Func<{}, {}> _toBusinessModel = x =>", entity, model)?;
    writeln!(out, "           new {}", model)?;
    writeln!(out, "           {{")?;
    for field in plan.fields.iter() {
        writeln!(out, "               {} = x.{},", field.model_name, field.physical_name)?;
    }
    writeln!(out, "           }};")?;
    writeln!(out)?;

    writeln!(out, "        private readonly Func<{}, {}> _toDatabaseModel = x =>", model, entity)?;
    writeln!(out, "           new {}", entity)?;
    writeln!(out, "           {{")?;
    for field in plan.fields.iter() {
        writeln!(out, "               {} = x.{},", field.physical_name, field.model_name)?;
    }
    writeln!(out, "           }};")?;
    writeln!(out)
}

fn write_list<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    let name = &plan.type_name;

    writeln!(out, "        // GET api/{}", name)?;
    writeln!(out, "        public IQueryable<{}> Get{}s()", plan.model_name, name)?;
    writeln!(out, "        {{")?;
    writeln!(out, "            var modelList = new List<{}>();", plan.model_name)?;
    writeln!(out)?;
    writeln!(out, "            foreach (var obj in this._db.Set<{}>())", plan.entity_name)?;
    writeln!(out, "            {{")?;
    writeln!(out, "                modelList.Add(this._toBusinessModel(obj));")?;
    writeln!(out, "            }}")?;
    writeln!(out)?;
    writeln!(out, "            return modelList.AsQueryable();")?;
    writeln!(out, "        }}")?;
    writeln!(out)
}

fn write_find<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    writeln!(
        out,
        "            {0} dataModel = this._db.Set<{0}>().Find(id);",
        plan.entity_name
    )?;
    writeln!(out)?;
    writeln!(out, "            if (dataModel == null)")?;
    writeln!(out, "            {{")?;
    writeln!(out, "                return NotFound();")?;
    writeln!(out, "            }}")?;
    writeln!(out)
}

fn write_model_state_check<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "            if (!ModelState.IsValid)")?;
    writeln!(out, "            {{")?;
    writeln!(out, "                return BadRequest(ModelState);")?;
    writeln!(out, "            }}")?;
    writeln!(out)
}

fn write_get<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    let name = &plan.type_name;

    writeln!(out, "        // GET api/{}/5", name)?;
    writeln!(out, "        [ResponseType(typeof({}))]", plan.model_name)?;
    writeln!(out, "        public IHttpActionResult Get{}({} id)", name, plan.key.type_name)?;
    writeln!(out, "        {{")?;
    write_find(out, plan)?;
    writeln!(out, "            return Ok(this._toBusinessModel(dataModel));")?;
    writeln!(out, "        }}")?;
    writeln!(out)
}

fn write_update<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    let name = &plan.type_name;

    writeln!(out, "        // PUT api/{}/5", name)?;
    writeln!(
        out,
        "        public IHttpActionResult Put{}({} id, {} model)",
        name, plan.key.type_name, plan.model_name
    )?;
    writeln!(out, "        {{")?;
    write_model_state_check(out)?;
    writeln!(out, "            if (id != model.{})", plan.key.model_name)?;
    writeln!(out, "            {{")?;
    writeln!(out, "                return BadRequest();")?;
    writeln!(out, "            }}")?;
    writeln!(out)?;
    writeln!(out, "            this._db.Entry(this._toDatabaseModel(model)).State = EntityState.Modified;")?;
    writeln!(out)?;
    writeln!(out, "            try")?;
    writeln!(out, "            {{")?;
    writeln!(out, "                this._db.SaveChanges();")?;
    writeln!(out, "            }}")?;
    writeln!(out, "            catch (DbUpdateConcurrencyException)")?;
    writeln!(out, "            {{")?;
    writeln!(out, "                if (!{}Exists(id))", name)?;
    writeln!(out, "                {{")?;
    writeln!(out, "                    return NotFound();")?;
    writeln!(out, "                }}")?;
    writeln!(out, "                else")?;
    writeln!(out, "                {{")?;
    writeln!(out, "                    throw;")?;
    writeln!(out, "                }}")?;
    writeln!(out, "            }}")?;
    writeln!(out)?;
    writeln!(out, "            return StatusCode(HttpStatusCode.NoContent);")?;
    writeln!(out, "        }}")?;
    writeln!(out)
}

fn write_create<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    let name = &plan.type_name;

    writeln!(out, "        // POST api/{}", name)?;
    writeln!(out, "        [ResponseType(typeof({}))]", plan.model_name)?;
    writeln!(out, "        public IHttpActionResult Post{}({} model)", name, plan.model_name)?;
    writeln!(out, "        {{")?;
    write_model_state_check(out)?;
    writeln!(out, "            var dataModel = this._toDatabaseModel(model);")?;
    writeln!(out)?;
    writeln!(out, "            this._db.Set<{}>().Add(dataModel);", plan.entity_name)?;
    writeln!(out, "            this._db.SaveChanges();")?;
    writeln!(out)?;
    writeln!(
        out,
        "            return CreatedAtRoute(\"DefaultApi\", new {{ id = dataModel.{} }}, model);",
        plan.key.physical_name
    )?;
    writeln!(out, "        }}")?;
    writeln!(out)
}

fn write_delete<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    let name = &plan.type_name;

    writeln!(out, "        // DELETE api/{}/5", name)?;
    writeln!(out, "        [ResponseType(typeof({}))]", plan.model_name)?;
    writeln!(out, "        public IHttpActionResult Delete{}({} id)", name, plan.key.type_name)?;
    writeln!(out, "        {{")?;
    write_find(out, plan)?;
    writeln!(out, "            this._db.Set<{}>().Remove(dataModel);", plan.entity_name)?;
    writeln!(out, "            this._db.SaveChanges();")?;
    writeln!(out)?;
    writeln!(out, "            return Ok(this._toBusinessModel(dataModel));")?;
    writeln!(out, "        }}")?;
    writeln!(out)
}

fn write_dispose<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "        protected override void Dispose(bool disposing)")?;
    writeln!(out, "        {{")?;
    writeln!(out, "            if (disposing)")?;
    writeln!(out, "            {{")?;
    writeln!(out, "                this._db.Dispose();")?;
    writeln!(out, "            }}")?;
    writeln!(out, "            base.Dispose(disposing);")?;
    writeln!(out, "        }}")?;
    writeln!(out)
}

fn write_exists<W: Write>(out: &mut W, plan: &ControllerPlan<'_>) -> io::Result<()> {
    writeln!(
        out,
        "        private bool {}Exists({} id)",
        plan.type_name, plan.key.type_name
    )?;
    writeln!(out, "        {{")?;
    writeln!(
        out,
        "            return this._db.Set<{}>().Count(e => e.{} == id) > 0;",
        plan.entity_name, plan.key.physical_name
    )?;
    writeln!(out, "        }}")
}

/// Generate the controller file for one entity and return its log line.
pub fn generate_controller(
    entity: &EntityDescriptor,
    known: &KnownEntities,
    config: &ControllerConfig,
) -> Result<LogLine> {
    let plan = ControllerPlan::new(entity, known, &config.model_suffix)?;
    let file_name = format!("{}.{}", plan.controller_name, config.extension);
    let path = config.output_dir.join(&file_name);

    let file = fs_utils::create_file(&path).map_err(|e| CodegenError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    write_controller(&mut writer, &plan, config)
        .and_then(|_| writer.flush())
        .map_err(|e| CodegenError::io(&path, e))?;

    tracing::debug!("Generated controller {} (key {})", file_name, plan.key.type_name);
    Ok(LogLine::now(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::FieldDescriptor;

    fn config(output_dir: PathBuf) -> ControllerConfig {
        ControllerConfig {
            output_dir,
            project_namespace: "Shop".to_string(),
            db_context: "ShopEntities".to_string(),
            imports: vec!["using Shop.Entities;".to_string(), "using System;".to_string()],
            model_suffix: "Model".to_string(),
            extension: "cs".to_string(),
        }
    }

    fn order() -> EntityDescriptor {
        EntityDescriptor::new("Order")
            .with_field(FieldDescriptor::new("order_id", "Int64").nullable())
            .with_field(FieldDescriptor::new("total", "Decimal"))
            .with_field(FieldDescriptor::new("Customer", "Customer"))
            .with_field(FieldDescriptor::new("RowVersion", "Byte[]"))
    }

    fn render(entity: &EntityDescriptor, known: &KnownEntities) -> String {
        let plan = ControllerPlan::new(entity, known, "Model").unwrap();
        let mut out = Vec::new();
        write_controller(&mut out, &plan, &config(PathBuf::from("."))).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_controller_header_and_imports() {
        let code = render(&order(), &KnownEntities::default());
        assert!(code.starts_with("using Shop.Entities;\nusing System;\n\nnamespace Shop.Controllers\n{\n"));
        assert!(code.contains("    public class OrderController : ApiController"));
        assert!(code.contains("private readonly DbContext _db = new ShopEntities();"));
        assert!(code.ends_with("        }\n    }\n}"));
    }

    #[test]
    fn test_converters_mirror_field_map() {
        let known: KnownEntities = ["Order", "Customer"].into_iter().map(String::from).collect();
        let code = render(&order(), &known);

        assert!(code.contains("private readonly Func<Order, OrderModel> _toBusinessModel = x =>"));
        assert!(code.contains("               OrderId = x.order_id,\n               Total = x.total,\n"));
        assert!(code.contains("private readonly Func<OrderModel, Order> _toDatabaseModel = x =>"));
        assert!(code.contains("               order_id = x.OrderId,\n               total = x.Total,\n"));
        assert!(!code.contains("Customer = x."));
        assert!(!code.contains("RowVersion"));
    }

    #[test]
    fn test_crud_actions_use_key_type() {
        let code = render(&order(), &KnownEntities::default());

        assert!(code.contains("public IQueryable<OrderModel> GetOrders()"));
        assert!(code.contains("public IHttpActionResult GetOrder(long? id)"));
        assert!(code.contains("public IHttpActionResult PutOrder(long? id, OrderModel model)"));
        assert!(code.contains("if (id != model.OrderId)"));
        assert!(code.contains("return StatusCode(HttpStatusCode.NoContent);"));
        assert!(code.contains("public IHttpActionResult PostOrder(OrderModel model)"));
        assert!(code.contains("return CreatedAtRoute(\"DefaultApi\", new { id = dataModel.order_id }, model);"));
        assert!(code.contains("public IHttpActionResult DeleteOrder(long? id)"));
        assert!(code.contains("protected override void Dispose(bool disposing)"));
        assert!(code.contains("private bool OrderExists(long? id)"));
        assert!(code.contains("return this._db.Set<Order>().Count(e => e.order_id == id) > 0;"));
    }

    #[test]
    fn test_action_order() {
        let code = render(&order(), &KnownEntities::default());
        let positions: Vec<_> = [
            "_toBusinessModel =",
            "_toDatabaseModel =",
            "// GET api/Order\n",
            "// GET api/Order/5",
            "// PUT api/Order/5",
            "// POST api/Order",
            "// DELETE api/Order/5",
            "Dispose(bool disposing)",
            "OrderExists(long? id)\n",
        ]
        .iter()
        .map(|marker| code.find(marker).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_entity_without_fields_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_controller(
            &EntityDescriptor::new("Empty"),
            &KnownEntities::default(),
            &config(dir.path().to_path_buf()),
        );
        assert!(matches!(result, Err(CodegenError::EmptyEntity { .. })));
        assert!(!dir.path().join("EmptyController.cs").exists());
    }

    #[test]
    fn test_generate_controller_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let line = generate_controller(
            &order(),
            &KnownEntities::default(),
            &config(dir.path().join("Controllers")),
        )
        .unwrap();

        assert_eq!(line.file_name, "OrderController.cs");
        assert!(dir.path().join("Controllers/OrderController.cs").exists());
    }
}
