//! The in-process job queue and background task runner.
//!
//! Generation is slow and unreliable, so HTTP handlers never compute it
//! inline: they enqueue a job and return its id immediately. A single
//! detached tokio task drains the queue and walks each job through
//! prompt → generate → validate → persist, bounded per attempt by a
//! wall-clock budget.
//!
//! Retry policy: transient failures (unreachable generation service,
//! storage errors, timeouts) are retried with exponential backoff up to
//! `GenerationSettings::max_attempts`. Validation failures and malformed
//! model output are terminal — retrying an unchanged prompt against a
//! non-deterministic model is not a fix, it is a prompt problem that needs
//! a human. Job state is held in memory and queryable by id; there is no
//! cancellation, a queued job runs to a terminal state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use rocket::fairing::AdHoc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time;
use ts_rs::TS;
use uuid::Uuid;

use crate::generation::client::{clean_fenced_json, parse_shift_payload};
use crate::generation::prompt::{DEFAULT_PROMPT_TEMPLATE, build_prompt};
use crate::generation::validator::validate_shift_batch;
use crate::generation::{GenerationError, GenerationSettings, Generator, PipelineContext};
use crate::models::ShiftCandidate;
use crate::orm::shift::insert_shift_batch;

/// The two units of work the runner understands, mirroring the two async
/// entry points: full generation, and persistence of already-generated
/// output.
#[derive(Debug)]
pub enum JobKind {
    GenerateAndPersist { roster: Value, availability: Value },
    PersistShifts { records: Vec<Value> },
}

impl JobKind {
    fn label(&self) -> &'static str {
        match self {
            JobKind::GenerateAndPersist { .. } => "generate-and-persist",
            JobKind::PersistShifts { .. } => "persist-shifts",
        }
    }
}

/// Observable lifecycle of one job.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "state", rename_all = "camelCase")]
#[ts(export)]
pub enum JobState {
    Queued,
    Running,
    Succeeded {
        #[serde(rename = "shiftsPersisted")]
        shifts_persisted: usize,
    },
    Failed {
        error: String,
        terminal: bool,
    },
}

impl JobState {
    /// Succeeded and Failed are final; a retried job passes back through
    /// Queued between attempts.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }
}

/// Status record returned by the job status endpoint.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct JobRecord {
    #[ts(type = "string")]
    pub id: Uuid,
    pub kind: String,
    pub attempts: u32,
    #[serde(flatten)]
    #[ts(skip)]
    pub state: JobState,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

/// Failure classification inside the runner.
enum JobError {
    Retryable(String),
    Terminal(String),
}

impl From<GenerationError> for JobError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Unavailable(_) => JobError::Retryable(e.to_string()),
            GenerationError::MalformedOutput { detail, raw } => JobError::Terminal(format!(
                "malformed generation output: {}; raw output: {}",
                detail, raw
            )),
        }
    }
}

/// Handle to the queue: enqueue jobs, look up their status.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<(Uuid, JobKind)>,
    registry: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobQueue {
    /// Spawns the runner task and returns the queue handle. The runner owns
    /// its own database connection string; Diesel work happens inside
    /// `spawn_blocking`.
    pub fn start(
        generator: Arc<dyn Generator>,
        settings: GenerationSettings,
        template: String,
        database_url: String,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry: Arc<RwLock<HashMap<Uuid, JobRecord>>> = Arc::new(RwLock::new(HashMap::new()));

        let runner = Runner {
            generator,
            settings,
            template,
            database_url,
            registry: registry.clone(),
        };

        tokio::spawn(async move {
            while let Some((job_id, kind)) = rx.recv().await {
                runner.run_job(job_id, kind).await;
            }
        });

        JobQueue { tx, registry }
    }

    /// Registers a job and hands it to the runner. Returns immediately with
    /// the job id; the caller polls status separately.
    pub fn enqueue(&self, kind: JobKind) -> Uuid {
        let job_id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let record = JobRecord {
            id: job_id,
            kind: kind.label().to_string(),
            attempts: 0,
            state: JobState::Queued,
            created_at: now,
            updated_at: now,
        };

        self.registry
            .write()
            .expect("job registry lock")
            .insert(job_id, record);

        if self.tx.send((job_id, kind)).is_err() {
            error!("[jobs] Runner channel closed; marking job {} failed", job_id);
            update_record(&self.registry, job_id, |record| {
                record.state = JobState::Failed {
                    error: "job runner is not running".to_string(),
                    terminal: true,
                };
            });
        }

        job_id
    }

    pub fn status(&self, job_id: &Uuid) -> Option<JobRecord> {
        self.registry
            .read()
            .expect("job registry lock")
            .get(job_id)
            .cloned()
    }
}

fn update_record<F>(registry: &Arc<RwLock<HashMap<Uuid, JobRecord>>>, job_id: Uuid, f: F)
where
    F: FnOnce(&mut JobRecord),
{
    let mut registry = registry.write().expect("job registry lock");
    if let Some(record) = registry.get_mut(&job_id) {
        f(record);
        record.updated_at = Utc::now().naive_utc();
    }
}

struct Runner {
    generator: Arc<dyn Generator>,
    settings: GenerationSettings,
    template: String,
    database_url: String,
    registry: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl Runner {
    async fn run_job(&self, job_id: Uuid, kind: JobKind) {
        let max_attempts = self.settings.max_attempts.max(1);
        let budget = Duration::from_secs(self.settings.job_timeout_secs);

        for attempt in 1..=max_attempts {
            update_record(&self.registry, job_id, |record| {
                record.attempts = attempt;
                record.state = JobState::Running;
            });

            let outcome = match time::timeout(budget, self.execute(&kind)).await {
                Ok(result) => result,
                Err(_) => Err(JobError::Retryable(
                    "attempt exceeded the execution budget".to_string(),
                )),
            };

            match outcome {
                Ok(persisted) => {
                    info!(
                        "[jobs] Job {} succeeded on attempt {}: {} shifts persisted",
                        job_id, attempt, persisted
                    );
                    update_record(&self.registry, job_id, |record| {
                        record.state = JobState::Succeeded {
                            shifts_persisted: persisted,
                        };
                    });
                    return;
                }
                Err(JobError::Terminal(message)) => {
                    warn!("[jobs] Job {} failed terminally: {}", job_id, message);
                    update_record(&self.registry, job_id, |record| {
                        record.state = JobState::Failed {
                            error: message,
                            terminal: true,
                        };
                    });
                    return;
                }
                Err(JobError::Retryable(message)) => {
                    if attempt == max_attempts {
                        warn!(
                            "[jobs] Job {} exhausted {} attempts: {}",
                            job_id, max_attempts, message
                        );
                        update_record(&self.registry, job_id, |record| {
                            record.state = JobState::Failed {
                                error: format!(
                                    "retries exhausted after {} attempts: {}",
                                    max_attempts, message
                                ),
                                terminal: false,
                            };
                        });
                        return;
                    }

                    let delay = self.settings.backoff_base_secs * (1u64 << (attempt - 1));
                    warn!(
                        "[jobs] Job {} attempt {} failed ({}); retrying in {}s",
                        job_id, attempt, message, delay
                    );
                    update_record(&self.registry, job_id, |record| {
                        record.state = JobState::Queued;
                    });
                    time::sleep(Duration::from_secs(delay)).await;
                }
            }
        }
    }

    /// One attempt: the pipeline steps in strict sequence.
    async fn execute(&self, kind: &JobKind) -> Result<usize, JobError> {
        let candidates = match kind {
            JobKind::GenerateAndPersist {
                roster,
                availability,
            } => {
                let prompt = build_prompt(&self.template, roster, availability);
                let text = self.generator.generate(&prompt).await.map_err(JobError::from)?;
                let cleaned = clean_fenced_json(&text);
                let records = parse_shift_payload(&cleaned).map_err(JobError::from)?;
                validate(&records)?
            }
            JobKind::PersistShifts { records } => validate(records)?,
        };

        self.persist(candidates).await
    }

    async fn persist(&self, batch: Vec<ShiftCandidate>) -> Result<usize, JobError> {
        let database_url = self.database_url.clone();
        task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&database_url)
                .map_err(|e| JobError::Retryable(format!("database connection failed: {}", e)))?;
            conn.batch_execute("PRAGMA foreign_keys = ON")
                .map_err(|e| JobError::Retryable(format!("database setup failed: {}", e)))?;

            insert_shift_batch(&mut conn, &batch)
                .map(|rows| rows.len())
                .map_err(|e| {
                    if e.is_retryable() {
                        JobError::Retryable(e.to_string())
                    } else {
                        JobError::Terminal(e.to_string())
                    }
                })
        })
        .await
        .map_err(|e| JobError::Retryable(format!("worker task failed: {}", e)))?
    }
}

fn validate(records: &[Value]) -> Result<Vec<ShiftCandidate>, JobError> {
    validate_shift_batch(records)
        .map_err(|errors| JobError::Terminal(format!("validation failed: {}", errors.join("; "))))
}

/// Loads the prompt template artifact, falling back to the built-in default
/// when the configured file is missing.
pub fn load_prompt_template(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(template) => template,
        Err(e) => {
            warn!(
                "[jobs] Could not read prompt template '{}' ({}); using built-in default",
                path, e
            );
            DEFAULT_PROMPT_TEMPLATE.to_string()
        }
    }
}

/// Creates the fairing that wires up the generation pipeline: extracts
/// settings and the database URL from the figment, loads the prompt
/// template, spawns the runner, and manages the `JobQueue` and
/// `PipelineContext` state used by the handlers.
pub fn generation_worker_fairing(generator: Arc<dyn Generator>) -> AdHoc {
    AdHoc::on_ignite("Generation Worker", move |rocket| async move {
        let figment = rocket.figment();
        let settings: GenerationSettings = figment
            .extract_inner("generation")
            .unwrap_or_default();
        let database_url: String = figment
            .extract_inner("databases.sqlite_db.url")
            .expect("databases.sqlite_db.url must be configured");

        let template = load_prompt_template(&settings.prompt_path);
        let queue = JobQueue::start(
            generator.clone(),
            settings.clone(),
            template.clone(),
            database_url,
        );

        rocket.manage(queue).manage(PipelineContext {
            generator,
            settings,
            template,
        })
    })
}
