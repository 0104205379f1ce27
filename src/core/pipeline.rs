use crate::core::powers::PowerTable;
use crate::core::transforms;
use crate::domain::model::{Contact, ContactFilter, Operation};
use crate::domain::ports::{ContactStore, TokenProvider};
use crate::utils::error::{ContactError, Result};
use chrono::Datelike;
use std::fmt;

pub const ALIVE_STATUS: &str = "Alive";
pub const DEFAULT_HEIST_LOCATION: &str = "Bank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Authenticating,
    Fetching,
    Transforming,
    Persisting,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Authenticating => "authenticating",
            PipelineState::Fetching => "fetching",
            PipelineState::Transforming => "transforming",
            PipelineState::Persisting => "persisting",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Knobs for the operations that need more than the batch itself.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub heist_status: String,
    pub heist_location: String,
    pub reference_year: i32,
    pub power_table: PowerTable,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            heist_status: ALIVE_STATUS.to_string(),
            heist_location: DEFAULT_HEIST_LOCATION.to_string(),
            reference_year: chrono::Utc::now().year(),
            power_table: PowerTable::default(),
        }
    }
}

impl PipelineSettings {
    /// Server-side filter used when fetching for `operation`.
    pub fn fetch_filter(&self, operation: Operation) -> ContactFilter {
        match operation {
            Operation::Heist => ContactFilter::by_status(&self.heist_status),
            _ => ContactFilter::all(),
        }
    }
}

/// Runs the transform for `operation` over a fetched batch.
pub fn apply_operation(
    operation: Operation,
    contacts: &[Contact],
    settings: &PipelineSettings,
) -> Result<Vec<Contact>> {
    match operation {
        Operation::Connect => Ok(contacts.to_vec()),
        Operation::Heist => {
            let alive = transforms::select_by_status(contacts, &settings.heist_status);
            Ok(transforms::annotate_location(&alive, &settings.heist_location))
        }
        Operation::Powers => {
            let table = &settings.power_table;
            let selected = transforms::select_by_title(contacts, &table.titles());
            Ok(transforms::annotate_powers(&selected, table))
        }
        Operation::Birthdays => {
            let known = transforms::exclude_unknown_age(contacts);
            let dated = transforms::annotate_birth_year(&known, settings.reference_year)?;
            let oldest = transforms::reduce_oldest(&dated).map_err(|e| match e {
                ContactError::EmptyBatch { .. } => ContactError::EmptyBatch {
                    operation: operation.to_string(),
                },
                other => other,
            })?;
            Ok(vec![oldest])
        }
        Operation::Sorting => Ok(transforms::sort_by_title_then_age(contacts)),
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub operation: Operation,
    pub fetched: usize,
    pub persisted: Vec<Contact>,
}

/// Result of one cycle together with the states it went through.
#[derive(Debug)]
pub struct CycleOutcome {
    pub operation: Operation,
    pub history: Vec<PipelineState>,
    pub result: Result<PipelineReport>,
}

impl CycleOutcome {
    pub fn final_state(&self) -> PipelineState {
        self.history.last().copied().unwrap_or(PipelineState::Idle)
    }

    pub fn into_result(self) -> Result<PipelineReport> {
        self.result
    }
}

struct Cycle {
    operation: Operation,
    history: Vec<PipelineState>,
}

impl Cycle {
    fn start(operation: Operation) -> Self {
        Self {
            operation,
            history: vec![PipelineState::Idle],
        }
    }

    fn enter(&mut self, state: PipelineState) {
        if let Some(from) = self.history.last() {
            tracing::debug!("{}: {} -> {}", self.operation, from, state);
        }
        self.history.push(state);
    }

    fn finish(mut self, result: Result<PipelineReport>) -> CycleOutcome {
        match &result {
            Ok(_) => self.enter(PipelineState::Idle),
            Err(e) => {
                let stage = self.history.last().copied().unwrap_or(PipelineState::Idle);
                tracing::error!("❌ {}: failed while {}: {}", self.operation, stage, e);
                self.enter(PipelineState::Failed);
            }
        }
        CycleOutcome {
            operation: self.operation,
            history: self.history,
            result,
        }
    }
}

/// Folds adapter errors into the error kind of the stage that raised them.
fn stage_error(stage: PipelineState, err: ContactError) -> ContactError {
    match (stage, err) {
        (PipelineState::Authenticating, e @ ContactError::Auth { .. }) => e,
        (PipelineState::Authenticating, e) => ContactError::Auth {
            message: e.to_string(),
        },
        (PipelineState::Fetching, e @ ContactError::Fetch { .. }) => e,
        (PipelineState::Fetching, e) => ContactError::Fetch {
            message: e.to_string(),
        },
        (PipelineState::Persisting, e @ ContactError::Persist { .. }) => e,
        (PipelineState::Persisting, e) => ContactError::Persist {
            message: e.to_string(),
        },
        (_, e) => e,
    }
}

/// Fetch → transform → persist, one operation per call.
pub struct ContactPipeline<S: ContactStore, T: TokenProvider> {
    store: S,
    tokens: T,
    settings: PipelineSettings,
}

impl<S: ContactStore, T: TokenProvider> ContactPipeline<S, T> {
    pub fn new(store: S, tokens: T) -> Self {
        Self::with_settings(store, tokens, PipelineSettings::default())
    }

    pub fn with_settings(store: S, tokens: T, settings: PipelineSettings) -> Self {
        Self {
            store,
            tokens,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, operation: Operation) -> Result<PipelineReport> {
        self.execute(operation).await.into_result()
    }

    /// Like `run`, but keeps the state history for inspection.
    pub async fn execute(&self, operation: Operation) -> CycleOutcome {
        let mut cycle = Cycle::start(operation);
        let result = self.drive(&mut cycle).await;
        cycle.finish(result)
    }

    async fn drive(&self, cycle: &mut Cycle) -> Result<PipelineReport> {
        let operation = cycle.operation;
        tracing::info!("🚀 {}: Starting pipeline cycle", operation);

        cycle.enter(PipelineState::Authenticating);
        let auth = self
            .tokens
            .get_token(operation)
            .await
            .map_err(|e| stage_error(PipelineState::Authenticating, e))?;

        cycle.enter(PipelineState::Fetching);
        let filter = self.settings.fetch_filter(operation);
        let contacts = self
            .store
            .list_contacts(&auth, &filter)
            .await
            .map_err(|e| stage_error(PipelineState::Fetching, e))?;
        tracing::info!("📥 {}: Fetched {} contacts", operation, contacts.len());

        cycle.enter(PipelineState::Transforming);
        let transformed = apply_operation(operation, &contacts, &self.settings)?;
        tracing::info!(
            "🔄 {}: Transformed {} -> {} contacts",
            operation,
            contacts.len(),
            transformed.len()
        );

        cycle.enter(PipelineState::Persisting);
        self.store
            .save_contacts(&auth, &transformed)
            .await
            .map_err(|e| stage_error(PipelineState::Persisting, e))?;
        tracing::info!("💾 {}: Saved {} contacts", operation, transformed.len());

        Ok(PipelineReport {
            operation,
            fetched: contacts.len(),
            persisted: transformed,
        })
    }
}
