//! Generation driver.
//!
//! Runs the model phase and the controller phase concurrently. Each phase
//! spawns one task per generatable entity, bounded by a worker limit, and
//! writes its log once every task of the phase has finished.
//!
//! The phases differ in how they treat a failing entity: a model that cannot
//! be generated is skipped and reported, while the first controller failure
//! halts the controller phase and is returned to the caller together with
//! the model phase report.
//!
//! Entities whose generated type name is empty or shared with another entity
//! fail in both phases, so no two jobs ever write the same file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::codegen::controller::{generate_controller, ControllerConfig};
use crate::codegen::filter::{filter_entities, KnownEntities, OutputNames};
use crate::codegen::fs_utils;
use crate::codegen::log::{self, LogCollector, LogLine};
use crate::codegen::model::{generate_model, ModelConfig};
use crate::codegen::types::EntityDescriptor;
use crate::error::{CodegenError, Result};

/// Configuration for a full generation run
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: ModelConfig,
    pub controller: ControllerConfig,
    /// Base type marking the storage context, which is never generated
    pub context_base_type: String,
    /// Directory the phase logs are written to
    pub log_dir: PathBuf,
    /// Upper bound on concurrently running jobs per phase
    pub max_workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Model,
    Controller,
}

impl Phase {
    fn log_prefix(self) -> &'static str {
        match self {
            Phase::Model => "ModelLog",
            Phase::Controller => "ControllerLog",
        }
    }

    /// Whether the first failing job stops the remaining jobs of the phase
    fn halts_on_failure(self) -> bool {
        matches!(self, Phase::Controller)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Model => write!(f, "model"),
            Phase::Controller => write!(f, "controller"),
        }
    }
}

/// Result of one job
#[derive(Debug)]
pub enum JobOutcome {
    Emitted { entity: String, file_name: String },
    Failed { entity: String, cause: CodegenError },
    /// Not started because an earlier job halted the phase
    Cancelled { entity: String },
}

/// An entity whose model could not be generated
#[derive(Debug)]
pub struct SkippedEntity {
    pub entity: String,
    pub cause: CodegenError,
}

/// Summary of a completed phase
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Log lines in arrival order, one per emitted file
    pub lines: Vec<LogLine>,
    pub skipped: Vec<SkippedEntity>,
    pub log_path: PathBuf,
}

impl PhaseReport {
    pub fn emitted_files(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.file_name.as_str())
    }
}

/// Summary of a full run
#[derive(Debug)]
pub struct GenerationReport {
    pub models: PhaseReport,
    pub controllers: PhaseReport,
}

type Job = dyn Fn(&EntityDescriptor) -> Result<LogLine> + Send + Sync;

/// Read-only state shared by every task of a run
struct SharedInput {
    entities: Vec<EntityDescriptor>,
    known: KnownEntities,
    names: OutputNames,
}

impl SharedInput {
    fn new(entities: Vec<EntityDescriptor>, known: KnownEntities) -> Self {
        let names = OutputNames::from_entities(&entities);
        Self {
            entities,
            known,
            names,
        }
    }
}

/// Generate models and controllers for every generatable entity.
pub async fn generate_all(
    entities: &[EntityDescriptor],
    config: &GenerationConfig,
) -> Result<GenerationReport> {
    let shared = Arc::new(SharedInput::new(
        filter_entities(entities, &config.context_base_type)
            .cloned()
            .collect(),
        KnownEntities::from_entities(entities, &config.context_base_type),
    ));

    tracing::info!(
        "Generating code for {} of {} entities",
        shared.entities.len(),
        entities.len()
    );

    let (models, controllers) = tokio::join!(
        run_model_phase(Arc::clone(&shared), config.model.clone(), config),
        run_controller_phase(Arc::clone(&shared), config.controller.clone(), config),
    );

    match (models, controllers) {
        (Ok(models), Ok(controllers)) => Ok(GenerationReport {
            models,
            controllers,
        }),
        (Ok(models), Err(cause)) => Err(CodegenError::ControllerPhase {
            cause: Box::new(cause),
            models: Box::new(models),
        }),
        (Err(e), controllers) => {
            if let Err(cause) = controllers {
                tracing::error!("Controller phase also failed: {}", cause);
            }
            Err(e)
        }
    }
}

async fn run_model_phase(
    shared: Arc<SharedInput>,
    model: ModelConfig,
    config: &GenerationConfig,
) -> Result<PhaseReport> {
    ensure_dir(&model.output_dir)?;

    let known = Arc::clone(&shared);
    let job: Arc<Job> = Arc::new(move |entity: &EntityDescriptor| {
        generate_model(entity, &known.known, &model)
    });
    let (outcomes, lines) = run_phase(Phase::Model, shared, job, config.max_workers).await;
    let log_path = flush_log(Phase::Model, &config.log_dir, lines.clone()).await?;

    let mut skipped = Vec::new();
    for outcome in outcomes {
        if let JobOutcome::Failed { entity, cause } = outcome {
            tracing::warn!("Skipped model for {}: {}", entity, cause);
            skipped.push(SkippedEntity { entity, cause });
        }
    }

    tracing::info!(
        "Model phase complete: {} generated, {} skipped",
        lines.len(),
        skipped.len()
    );

    Ok(PhaseReport {
        phase: Phase::Model,
        lines,
        skipped,
        log_path,
    })
}

async fn run_controller_phase(
    shared: Arc<SharedInput>,
    controller: ControllerConfig,
    config: &GenerationConfig,
) -> Result<PhaseReport> {
    ensure_dir(&controller.output_dir)?;

    let known = Arc::clone(&shared);
    let job: Arc<Job> = Arc::new(move |entity: &EntityDescriptor| {
        generate_controller(entity, &known.known, &controller)
    });
    let (outcomes, lines) = run_phase(Phase::Controller, shared, job, config.max_workers).await;
    let log_path = flush_log(Phase::Controller, &config.log_dir, lines.clone()).await?;

    let mut failure = None;
    for outcome in outcomes {
        match outcome {
            JobOutcome::Failed { entity, cause } => {
                tracing::error!("Controller generation failed for {}: {}", entity, cause);
                failure.get_or_insert(cause);
            }
            JobOutcome::Cancelled { entity } => {
                tracing::debug!("Controller for {} not generated", entity);
            }
            JobOutcome::Emitted { .. } => {}
        }
    }

    if let Some(cause) = failure {
        return Err(cause);
    }

    tracing::info!("Controller phase complete: {} generated", lines.len());

    Ok(PhaseReport {
        phase: Phase::Controller,
        lines,
        skipped: Vec::new(),
        log_path,
    })
}

/// Fan one job per entity out over a bounded pool and wait for all of them.
///
/// Returns every job outcome plus the drained log lines.
async fn run_phase(
    phase: Phase,
    shared: Arc<SharedInput>,
    job: Arc<Job>,
    max_workers: usize,
) -> (Vec<JobOutcome>, Vec<LogLine>) {
    tracing::info!("Starting {} phase ({} entities)", phase, shared.entities.len());

    let limiter = Arc::new(Semaphore::new(max_workers.max(1)));
    let halted = Arc::new(AtomicBool::new(false));
    let (collector, mut drain) = log::collector();
    let mut tasks = JoinSet::new();

    for index in 0..shared.entities.len() {
        let shared = Arc::clone(&shared);
        let job = Arc::clone(&job);
        let limiter = Arc::clone(&limiter);
        let halted = Arc::clone(&halted);
        let collector = collector.clone();

        tasks.spawn(async move {
            let entity = shared.entities[index].name.clone();

            let _permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return JobOutcome::Failed {
                        entity,
                        cause: CodegenError::Task(e.to_string()),
                    }
                }
            };

            let job_halted = Arc::clone(&halted);
            let result = tokio::task::spawn_blocking(move || {
                let entity = &shared.entities[index];
                run_job(phase, entity, &shared.names, job.as_ref(), &job_halted, &collector)
            })
            .await;

            match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    // A panicking job halts its phase like any other failure
                    if phase.halts_on_failure() {
                        halted.store(true, Ordering::SeqCst);
                    }
                    JobOutcome::Failed {
                        entity,
                        cause: CodegenError::Task(e.to_string()),
                    }
                }
            }
        });
    }

    // Only task clones of the collector remain
    drop(collector);

    let mut outcomes = Vec::with_capacity(shared.entities.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => tracing::error!("{} task did not complete: {}", phase, e),
        }
    }

    (outcomes, drain.drain())
}

fn run_job(
    phase: Phase,
    entity: &EntityDescriptor,
    names: &OutputNames,
    job: &Job,
    halted: &AtomicBool,
    collector: &LogCollector,
) -> JobOutcome {
    let name = entity.name.clone();

    if halted.load(Ordering::SeqCst) {
        return JobOutcome::Cancelled { entity: name };
    }

    match names.check(entity).and_then(|_| job(entity)) {
        Ok(line) => {
            let file_name = line.file_name.clone();
            collector.push(line);
            JobOutcome::Emitted {
                entity: name,
                file_name,
            }
        }
        Err(cause) => {
            if phase.halts_on_failure() {
                halted.store(true, Ordering::SeqCst);
            }
            JobOutcome::Failed { entity: name, cause }
        }
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs_utils::ensure_dir(path).map_err(|e| CodegenError::io(path, e))
}

async fn flush_log(phase: Phase, log_dir: &Path, lines: Vec<LogLine>) -> Result<PathBuf> {
    let path = log_dir.join(log::log_file_name(phase.log_prefix(), Local::now()));
    let log_path = path.clone();

    tokio::task::spawn_blocking(move || log::write_log(&path, &lines))
        .await
        .map_err(|e| CodegenError::Task(e.to_string()))??;

    Ok(log_path)
}
