//! Project configuration schema for crudcraft.yaml
//!
//! Values are resolved with the precedence CLI flag > environment variable >
//! config file > default. Relative paths read from a config file are relative
//! to that file's directory; paths from the environment or the command line
//! are relative to the working directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codegen::controller::ControllerConfig;
use crate::codegen::filter::DEFAULT_CONTEXT_BASE_TYPE;
use crate::codegen::model::ModelConfig;
use crate::codegen::orchestration::GenerationConfig;
use crate::error::{CodegenError, Result};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "crudcraft.yaml";

/// Framework imports every controller needs, after the two project imports
pub const FRAMEWORK_IMPORTS: &[&str] = &[
    "using System;",
    "using System.Collections.Generic;",
    "using System.Data.Entity;",
    "using System.Data.Entity.Infrastructure;",
    "using System.Linq;",
    "using System.Net;",
    "using System.Threading.Tasks;",
    "using System.Web.Http;",
    "using System.Web.Http.Description;",
];

/// Top-level project configuration from crudcraft.yaml
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Descriptor file or directory
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Root namespace of the generated project
    #[serde(default)]
    pub project_namespace: String,
    /// Namespace of the entity classes (defaults to `<project>.Entities`)
    #[serde(default)]
    pub entities_namespace: Option<String>,
    /// Storage-context class instantiated by controllers
    #[serde(default)]
    pub db_context: String,
    #[serde(default = "default_context_base_type")]
    pub context_base_type: String,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_model_suffix")]
    pub model_suffix: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// Additional import lines appended after the framework imports
    #[serde(default)]
    pub extra_imports: Vec<String>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Defaults to the available parallelism
    #[serde(default)]
    pub max_workers: Option<usize>,
}

fn default_source() -> PathBuf {
    PathBuf::from("entities.yaml")
}

fn default_context_base_type() -> String {
    DEFAULT_CONTEXT_BASE_TYPE.to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_model_suffix() -> String {
    "Model".to_string()
}

fn default_file_extension() -> String {
    "cs".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            project_namespace: String::new(),
            entities_namespace: None,
            db_context: String::new(),
            context_base_type: default_context_base_type(),
            output_root: default_output_root(),
            model_suffix: default_model_suffix(),
            file_extension: default_file_extension(),
            extra_imports: Vec::new(),
            log_dir: default_log_dir(),
            max_workers: None,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub project_namespace: Option<String>,
    pub db_context: Option<String>,
    pub output_root: Option<PathBuf>,
    pub max_workers: Option<usize>,
}

impl ProjectConfig {
    /// Load project configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;

        let mut config: Self = serde_yaml::from_str(&contents).map_err(|e| CodegenError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make relative paths relative to `base`
    fn resolve_paths(&mut self, base: &Path) {
        for dir in [&mut self.source, &mut self.output_root, &mut self.log_dir] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Load from `path` if it exists, otherwise start from defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Apply `CRUDCRAFT_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup("CRUDCRAFT_SOURCE") {
            self.source = PathBuf::from(source);
        }
        if let Some(namespace) = lookup("CRUDCRAFT_NAMESPACE") {
            self.project_namespace = namespace;
        }
        if let Some(db_context) = lookup("CRUDCRAFT_DB_CONTEXT") {
            self.db_context = db_context;
        }
        if let Some(output) = lookup("CRUDCRAFT_OUTPUT") {
            self.output_root = PathBuf::from(output);
        }
        if let Some(workers) = lookup("CRUDCRAFT_MAX_WORKERS") {
            let workers = workers.trim().parse().map_err(|_| {
                CodegenError::Config(format!("CRUDCRAFT_MAX_WORKERS is not a number: '{}'", workers))
            })?;
            self.max_workers = Some(workers);
        }
        Ok(())
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(namespace) = overrides.project_namespace {
            self.project_namespace = namespace;
        }
        if let Some(db_context) = overrides.db_context {
            self.db_context = db_context;
        }
        if let Some(output) = overrides.output_root {
            self.output_root = output;
        }
        if let Some(workers) = overrides.max_workers {
            self.max_workers = Some(workers);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !namespace_regex().is_match(&self.project_namespace) {
            return Err(CodegenError::Config(format!(
                "project_namespace must be a dotted identifier, got '{}'",
                self.project_namespace
            )));
        }

        if let Some(ref namespace) = self.entities_namespace {
            if !namespace_regex().is_match(namespace) {
                return Err(CodegenError::Config(format!(
                    "entities_namespace must be a dotted identifier, got '{}'",
                    namespace
                )));
            }
        }

        if !identifier_regex().is_match(&self.db_context) {
            return Err(CodegenError::Config(format!(
                "db_context must be a class name, got '{}'",
                self.db_context
            )));
        }

        if self.model_suffix.is_empty() {
            return Err(CodegenError::Config("model_suffix cannot be empty".to_string()));
        }

        if self.max_workers == Some(0) {
            return Err(CodegenError::Config("max_workers must be at least 1".to_string()));
        }

        Ok(())
    }

    pub fn entities_namespace(&self) -> String {
        self.entities_namespace
            .clone()
            .unwrap_or_else(|| format!("{}.Entities", self.project_namespace))
    }

    pub fn models_namespace(&self) -> String {
        format!("{}.Models", self.project_namespace)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.output_root.join(&self.project_namespace).join("Models")
    }

    pub fn controllers_dir(&self) -> PathBuf {
        self.output_root.join(&self.project_namespace).join("Controllers")
    }

    /// Import lines written at the top of each controller
    pub fn controller_imports(&self) -> Vec<String> {
        let mut imports = vec![
            format!("using {};", self.entities_namespace()),
            format!("using {};", self.models_namespace()),
        ];
        imports.extend(FRAMEWORK_IMPORTS.iter().map(|line| line.to_string()));
        imports.extend(self.extra_imports.iter().cloned());
        imports
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Convert to the driver configuration
    pub fn to_generation_config(&self) -> Result<GenerationConfig> {
        self.validate()?;

        Ok(GenerationConfig {
            model: ModelConfig {
                output_dir: self.models_dir(),
                namespace: self.models_namespace(),
                suffix: self.model_suffix.clone(),
                extension: self.file_extension.clone(),
            },
            controller: ControllerConfig {
                output_dir: self.controllers_dir(),
                project_namespace: self.project_namespace.clone(),
                db_context: self.db_context.clone(),
                imports: self.controller_imports(),
                model_suffix: self.model_suffix.clone(),
                extension: self.file_extension.clone(),
            },
            context_base_type: self.context_base_type.clone(),
            log_dir: self.log_dir.clone(),
            max_workers: self.max_workers(),
        })
    }
}

fn namespace_regex() -> &'static Regex {
    static NAMESPACE: OnceLock<Regex> = OnceLock::new();
    NAMESPACE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("namespace pattern is valid")
    })
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn shop() -> ProjectConfig {
        ProjectConfig {
            project_namespace: "MyShop".to_string(),
            db_context: "MyShopEntities".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_with_defaults() {
        let config: ProjectConfig = serde_yaml::from_str(
            "project_namespace: MyShop\ndb_context: MyShopEntities\nmax_workers: 3\n",
        )
        .unwrap();

        assert_eq!(config.model_suffix, "Model");
        assert_eq!(config.context_base_type, "DbContext");
        assert_eq!(config.source, PathBuf::from("entities.yaml"));
        assert_eq!(config.max_workers(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_file_paths_are_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let config_path = project.join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &config_path,
            "source: descriptors/entities.yaml\noutput_root: out\nlog_dir: /var/log/crudcraft\n",
        )
        .unwrap();

        let mut config = ProjectConfig::from_file(&config_path).unwrap();
        assert_eq!(config.source, project.join("descriptors/entities.yaml"));
        assert_eq!(config.output_root, project.join("out"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/crudcraft"));

        // Command-line paths are taken as given
        config.apply_overrides(ConfigOverrides {
            output_root: Some(PathBuf::from("elsewhere")),
            ..Default::default()
        });
        assert_eq!(config.output_root, PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = serde_yaml::from_str::<ProjectConfig>("project_namespce: Typo\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_derived_paths_and_imports() {
        let config = shop();
        assert_eq!(config.models_namespace(), "MyShop.Models");
        assert_eq!(config.models_dir(), PathBuf::from("./MyShop/Models"));
        assert_eq!(config.controllers_dir(), PathBuf::from("./MyShop/Controllers"));

        let imports = config.controller_imports();
        assert_eq!(imports[0], "using MyShop.Entities;");
        assert_eq!(imports[1], "using MyShop.Models;");
        assert_eq!(imports.last().unwrap(), "using System.Web.Http.Description;");
        assert_eq!(imports.len(), 2 + FRAMEWORK_IMPORTS.len());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut config = shop();
        let env: HashMap<&str, &str> = [
            ("CRUDCRAFT_NAMESPACE", "FromEnv"),
            ("CRUDCRAFT_MAX_WORKERS", "2"),
        ]
        .into_iter()
        .collect();

        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.project_namespace, "FromEnv");
        assert_eq!(config.db_context, "MyShopEntities");

        config.apply_overrides(ConfigOverrides {
            project_namespace: Some("FromCli".to_string()),
            ..Default::default()
        });
        assert_eq!(config.project_namespace, "FromCli");
        assert_eq!(config.max_workers(), 2);
    }

    #[test]
    fn test_bad_worker_env_is_rejected() {
        let mut config = shop();
        let result = config.apply_env_from(|key| {
            (key == "CRUDCRAFT_MAX_WORKERS").then(|| "many".to_string())
        });
        assert!(matches!(result, Err(CodegenError::Config(_))));
    }

    #[test]
    fn test_validate() {
        assert!(shop().validate().is_ok());

        let mut config = shop();
        config.project_namespace = "My Shop".to_string();
        assert!(config.validate().is_err());

        let mut config = shop();
        config.db_context = String::new();
        assert!(config.validate().is_err());

        let mut config = shop();
        config.max_workers = Some(0);
        assert!(config.validate().is_err());

        let mut config = shop();
        config.model_suffix = String::new();
        assert!(config.to_generation_config().is_err());
    }

    #[test]
    fn test_to_generation_config() {
        let generation = shop().to_generation_config().unwrap();
        assert_eq!(generation.model.namespace, "MyShop.Models");
        assert_eq!(generation.controller.project_namespace, "MyShop");
        assert_eq!(generation.controller.db_context, "MyShopEntities");
        assert!(generation.max_workers >= 1);
    }
}
