//! # Crudcraft: CRUD Scaffolding from Entity Metadata
//!
//! Crudcraft reads descriptors of data-access entities and generates, for
//! each entity, a model class and a CRUD API controller that converts between
//! entity and model.
//!
//! ## Example descriptor
//!
//! ```yaml
//! entities:
//!   - name: Customer
//!     fields:
//!       - name: customer_id
//!         type: Int32
//!       - name: name
//!         type: String
//!       - name: last_order_on
//!         type: DateTime
//!         nullable: true
//!       - name: Orders
//!         type: ICollection<Order>
//!         generic: true
//!   - name: ShopEntities
//!     base_type: DbContext
//! ```
//!
//! `ShopEntities` is the storage context and is skipped. `Customer` gets a
//! `CustomerModel` with `CustomerId`, `Name` and `LastOrderOn`, and a
//! `CustomerController` keyed by an `int`.

pub mod error;

// Code generation framework
pub mod codegen;

pub use error::{CodegenError, Result};

pub use codegen::{
    generate_all, generate_from_config, load_descriptors, EntityDescriptor, FieldDescriptor,
    GenerationConfig, GenerationReport, ProjectConfig,
};
