//! Code generation framework for models and CRUD controllers.
//!
//! Entity descriptors go in; one model class and one controller class per
//! generatable entity come out.

pub mod types;
pub mod utils;
pub mod filter;
pub mod field_map;
pub mod model;
pub mod controller;
pub mod log;
pub mod orchestration;
pub mod yaml_loader;
pub mod project_config;
pub mod fs_utils;

// Re-export key types
pub use types::{DescriptorDocument, EntityDescriptor, FieldDescriptor};
pub use utils::{friendly_type_name, to_display_name, to_pascal_case};
pub use filter::{filter_entities, is_generatable, KnownEntities};
pub use field_map::{key_field, FieldMap, MappedField};
pub use model::{generate_model, ModelConfig};
pub use controller::{generate_controller, ControllerConfig};
pub use log::LogLine;
pub use orchestration::{
    generate_all, GenerationConfig, GenerationReport, JobOutcome, Phase, PhaseReport,
    SkippedEntity,
};
pub use yaml_loader::load_descriptors;
pub use project_config::{ConfigOverrides, ProjectConfig};

/// Load configuration and descriptors, then generate everything.
///
/// This is the main entry point when driving generation from a config file.
pub async fn generate_from_config(config: &ProjectConfig) -> crate::Result<GenerationReport> {
    let generation_config = config.to_generation_config()?;

    let entities = load_descriptors(&config.source)?;
    tracing::info!(
        "Loaded {} entities from {}",
        entities.len(),
        config.source.display()
    );

    generate_all(&entities, &generation_config).await
}
