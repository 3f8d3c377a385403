use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use formwork_api::{ApiError, FieldErrors, RecordManagerRef};
use formwork_types::{Family, Kind, Record, RecordId, RecordMutation, SelectionOption};

use crate::mode::{FormMode, ModeController};
use crate::options::FormOptions;
use crate::projector::{self, ProjectionError};
use crate::registry::{FieldSpec, InputType, KindSchema, SchemaRegistry, UnknownKindError};
use crate::validation::{self, SyncedOptions, ValidationError};
use crate::value::{FieldValue, FieldValues, Toggles};

/// Receives the selection options of the engine's family after every successful refresh.
pub trait RefreshListener: Send + Sync {
    fn options_refreshed(&self, options: Vec<SelectionOption>);
}

impl<F> RefreshListener for F
where F: Fn(Vec<SelectionOption>) + Send + Sync {
    fn options_refreshed(&self, options: Vec<SelectionOption>) {
        self(options)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormState {
    pub kind: Kind,
    pub controller: ModeController,
    pub values: FieldValues,
    pub auxiliary_toggles: Toggles,
    pub field_errors: FieldErrors,
    original: Option<Record>,
    /// Distinguishes this form from forms opened later on the same engine.
    generation: u64,
}

impl FormState {
    fn from_defaults(schema: &KindSchema, controller: ModeController, generation: u64) -> Self {
        let values = schema.fields.iter()
            .map(|field| (String::from(field.id), field.default_value()))
            .collect();
        Self {
            kind: schema.kind,
            controller,
            values,
            auxiliary_toggles: schema.default_toggles(),
            field_errors: FieldErrors::new(),
            original: None,
            generation,
        }
    }

    fn from_record(schema: &KindSchema, record: &Record, list_separator: &str, generation: u64) -> Self {
        let (values, auxiliary_toggles) = projector::unproject(schema, record, list_separator);
        Self {
            kind: record.kind,
            controller: ModeController::new(FormMode::Update { record: record.id }),
            values,
            auxiliary_toggles,
            field_errors: FieldErrors::new(),
            original: Some(Clone::clone(record)),
            generation,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.controller.mode()
    }
}

/// A field as presented to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldView {
    pub field: FieldSpec,
    pub value: FieldValue,
    pub editable: bool,
    pub errors: Vec<String>,
    /// Choices of a select field, as last synced from its source family.
    pub options: Vec<SelectionOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The record was stored and the form closed. `options` is `None` when the follow-up refresh failed.
    Submitted { record: Record, options: Option<Vec<SelectionOption>> },
    /// Another submit of this form is still in flight. Nothing was sent.
    AlreadyInFlight,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("No form is open.")]
    NotOpen,
    #[error("{0}")]
    UnknownKind(#[from] UnknownKindError),
    #[error("Kind '{kind}' does not belong to family '{family}'.")]
    KindNotInFamily { kind: Kind, family: Family },
    #[error("The kind of an existing record cannot be changed.")]
    KindLocked,
    #[error("Unknown field '{field}'.")]
    UnknownField { field: String },
    #[error("Field '{field}' is locked.")]
    FieldLocked { field: String },
    #[error("Value '{value}' does not fit field '{field}'.")]
    ValueMismatch { field: String, value: FieldValue },
    #[error("Unknown toggle '{toggle}'.")]
    UnknownToggle { toggle: String },
    #[error("Toggle '{toggle}' is locked.")]
    ToggleLocked { toggle: String },
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("No form is open.")]
    NotOpen,
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Projection(#[from] ProjectionError),
    #[error("{0}")]
    Api(#[from] ApiError),
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum DeleteError {
    #[error("Record '{name}' <{id}> is in use and cannot be deleted until associated resources are removed.")]
    RecordInUse { id: RecordId, name: String },
    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Resets the in-flight flag when a submit finishes or its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Create-or-edit form for the configuration records of one [`Family`].
///
/// All operations take `&self`. The form state is guarded by a mutex which is
/// never held while waiting on the record manager.
///
/// Select fields list the records of another family. Wire that family's engine
/// to [`FormEngine::sync_options`] via its refresh listener to keep them current.
pub struct FormEngine {
    registry: Arc<SchemaRegistry>,
    records: RecordManagerRef,
    family: Family,
    options: FormOptions,
    listener: Option<Arc<dyn RefreshListener>>,
    state: Mutex<Option<FormState>>,
    synced: Mutex<SyncedOptions>,
    generations: AtomicU64,
    submitting: AtomicBool,
}

impl FormEngine {
    pub fn new(registry: Arc<SchemaRegistry>, records: RecordManagerRef, family: Family, options: FormOptions) -> Self {
        Self {
            registry,
            records,
            family,
            options,
            listener: None,
            state: Mutex::new(None),
            synced: Mutex::new(SyncedOptions::new()),
            generations: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn with_refresh_listener(self, listener: impl RefreshListener + 'static) -> Self {
        Self { listener: Some(Arc::new(listener)), ..self }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<FormState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_synced(&self) -> MutexGuard<'_, SyncedOptions> {
        self.synced.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed)
    }

    /// Replaces the choices of every select field listing records of `family`.
    pub fn sync_options(&self, family: Family, options: Vec<SelectionOption>) {
        debug!("Synced {} selection option(s) of {family} into the {} form.", options.len(), self.family);
        self.lock_synced().insert(family, options);
    }

    fn schema(&self, kind: Kind) -> Result<&KindSchema, FormError> {
        if kind.family() != self.family {
            return Err(FormError::KindNotInFamily { kind, family: self.family });
        }
        Ok(self.registry.lookup(kind)?)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FormState, &KindSchema) -> Result<T, FormError>) -> Result<T, FormError> {
        let mut state = self.lock_state();
        let state = state.as_mut().ok_or(FormError::NotOpen)?;
        let schema = self.registry.lookup(state.kind)?;
        f(state, schema)
    }

    /// Opens a create form with the family's default kind, or an update form for `record`.
    pub fn open(&self, record: Option<&Record>) -> Result<(), FormError> {
        match record {
            Some(record) => self.open_for_update(record),
            None => {
                let kind = self.options.default_kind(self.family);
                let schema = self.schema(kind)?;
                *self.lock_state() = Some(FormState::from_defaults(schema, ModeController::new(FormMode::Create), self.next_generation()));
                debug!("Opened create form for {kind}.");
                Ok(())
            }
        }
    }

    /// Opens a locked update form, pre-populated from `record`.
    pub fn open_for_update(&self, record: &Record) -> Result<(), FormError> {
        let schema = self.schema(record.kind)?;
        *self.lock_state() = Some(FormState::from_record(schema, record, &self.options.list_separator, self.next_generation()));
        debug!("Opened update form for {} record '{}' <{}>.", record.kind, record.name, record.id);
        Ok(())
    }

    /// Switches a create form to another kind, keeping values of fields both kinds share.
    pub fn select_kind(&self, kind: Kind) -> Result<(), FormError> {
        let schema = self.schema(kind)?;
        self.with_state(|state, _| {
            if state.mode().is_update() {
                return Err(FormError::KindLocked);
            }
            let mut next = FormState::from_defaults(schema, Clone::clone(&state.controller), state.generation);
            for field in &schema.fields {
                if let Some(value) = state.values.remove(field.id) {
                    if field.accepts(&value) {
                        next.values.insert(String::from(field.id), value);
                    }
                }
            }
            *state = next;
            Ok(())
        })
    }

    pub fn set_value(&self, field_id: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        let value = value.into();
        self.with_state(|state, schema| {
            let field = schema.find_field(field_id)
                .ok_or_else(|| FormError::UnknownField { field: String::from(field_id) })?;
            if !state.controller.is_field_editable(field) {
                return Err(FormError::FieldLocked { field: String::from(field_id) });
            }
            if !field.accepts(&value) {
                return Err(FormError::ValueMismatch { field: String::from(field_id), value });
            }
            state.values.insert(String::from(field_id), value);
            state.field_errors.remove(field_id);
            Ok(())
        })
    }

    pub fn set_toggle(&self, toggle_id: &str, on: bool) -> Result<(), FormError> {
        self.with_state(|state, schema| {
            let toggle = schema.find_toggle(toggle_id)
                .ok_or_else(|| FormError::UnknownToggle { toggle: String::from(toggle_id) })?;
            if !state.controller.is_toggle_editable() {
                return Err(FormError::ToggleLocked { toggle: String::from(toggle_id) });
            }
            state.auxiliary_toggles.insert(String::from(toggle.id), on);
            Ok(())
        })
    }

    pub fn enter_edit_mode(&self) -> Result<(), FormError> {
        self.with_state(|state, _| {
            state.controller.enter_edit_mode();
            Ok(())
        })
    }

    /// Locks an update form again, discarding edits since it was opened.
    pub fn cancel_edit(&self) -> Result<(), FormError> {
        let list_separator = &self.options.list_separator;
        self.with_state(|state, schema| {
            if let Some(original) = state.original.take() {
                *state = FormState::from_record(schema, &original, list_separator, state.generation);
            }
            state.controller.cancel_edit();
            Ok(())
        })
    }

    /// Closes the form, discarding its state.
    pub fn cancel(&self) {
        if self.lock_state().take().is_some() {
            debug!("Closed form without submitting.");
        }
    }

    /// Validates, projects and stores the form, then refreshes the selection options and closes the form.
    ///
    /// On failure the form stays open with its values intact and per-field errors stored.
    #[tracing::instrument(skip(self), level="trace")]
    pub async fn submit(&self) -> Result<SubmitOutcome, SubmitError> {

        async fn inner(engine: &FormEngine) -> Result<SubmitOutcome, SubmitError> {

            let (mutation, generation) = engine.prepare_mutation()?;
            let kind = mutation.kind();

            let record = match engine.records.submit_record(mutation).await {
                Ok(record) => record,
                Err(cause) => {
                    if let Some(state) = engine.lock_state().as_mut().filter(|state| state.generation == generation) {
                        state.field_errors = cause.field_errors();
                    }
                    return Err(SubmitError::Api(cause));
                }
            };
            info!("Successfully submitted {kind} record '{}' <{}>.", record.name, record.id);

            let options = match engine.refresh().await {
                Ok(options) => Some(options),
                Err(cause) => {
                    warn!("Record <{}> was stored, but refreshing the selection options failed: {cause}", record.id);
                    None
                }
            };

            {
                let mut state = engine.lock_state();
                if state.as_ref().is_some_and(|state| state.generation == generation) {
                    if let Some(mut state) = state.take() {
                        state.controller.submit_succeeded();
                    }
                } else {
                    debug!("Form was replaced while submitting. Keeping the new form open.");
                }
            }

            Ok(SubmitOutcome::Submitted { record, options })
        }

        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            debug!("Ignoring submit while another submit is in flight.");
            return Ok(SubmitOutcome::AlreadyInFlight);
        };

        inner(self).await
            .inspect_err(|err| error!("{err}"))
    }

    fn prepare_mutation(&self) -> Result<(RecordMutation, u64), SubmitError> {
        let mut guard = self.lock_state();
        let state = guard.as_mut().ok_or(SubmitError::NotOpen)?;
        let schema = self.registry.lookup(state.kind)
            .map_err(ProjectionError::from)?;
        let list_separator = &self.options.list_separator;

        let validated = validation::validate(schema, &state.values, &state.auxiliary_toggles, list_separator, &self.lock_synced());
        if let Err(cause) = validated {
            state.field_errors = cause.violations.iter()
                .map(|(field, message)| (Clone::clone(field), vec![Clone::clone(message)]))
                .collect();
            return Err(SubmitError::Validation(cause));
        }

        let payload = projector::project_schema(schema, &state.values, &state.auxiliary_toggles, list_separator)
            .inspect_err(|cause| {
                if let ProjectionError::MissingRequiredField { field } | ProjectionError::InvalidValue { field, .. } = cause {
                    state.field_errors.insert(Clone::clone(field), vec![cause.to_string()]);
                }
            })?;

        let kind = state.kind;
        let mutation = match state.mode() {
            FormMode::Create => RecordMutation::Create { kind, payload },
            FormMode::Update { record } => RecordMutation::Update { id: record, kind, payload },
        };
        Ok((mutation, state.generation))
    }

    /// Deletes `record`, closing the form if it is editing that record, then refreshes the selection options.
    ///
    /// Returns `None` instead of options when the refresh after a successful deletion failed.
    #[tracing::instrument(skip_all, fields(id = %record.id), level="trace")]
    pub async fn delete(&self, record: &Record) -> Result<Option<Vec<SelectionOption>>, DeleteError> {

        async fn inner(engine: &FormEngine, record: &Record) -> Result<Option<Vec<SelectionOption>>, DeleteError> {

            if record.in_use {
                return Err(DeleteError::RecordInUse { id: record.id, name: Clone::clone(&record.name) });
            }

            engine.records.delete_record(record.id).await?;
            info!("Successfully deleted {} record '{}' <{}>.", record.kind, record.name, record.id);

            {
                let mut state = engine.lock_state();
                let is_edited = state.as_ref()
                    .is_some_and(|state| state.mode() == FormMode::Update { record: record.id });
                if is_edited {
                    *state = None;
                }
            }

            let options = engine.refresh().await
                .inspect_err(|cause| warn!("Record <{}> was deleted, but refreshing the selection options failed: {cause}", record.id))
                .ok();
            Ok(options)
        }

        inner(self, record).await
            .inspect_err(|err| error!("{err}"))
    }

    /// Lists the records of the engine's family and hands them to the refresh listener.
    #[tracing::instrument(skip(self), level="trace")]
    pub async fn refresh(&self) -> Result<Vec<SelectionOption>, ApiError> {
        let options = self.records.list_records().await?
            .iter()
            .filter(|record| record.kind.family() == self.family)
            .map(Record::as_option)
            .collect::<Vec<_>>();

        debug!("Refreshed {} selection option(s) of {}.", options.len(), self.family);

        if let Some(listener) = &self.listener {
            listener.options_refreshed(Clone::clone(&options));
        }
        Ok(options)
    }

    pub fn is_open(&self) -> bool {
        self.lock_state().is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn kind(&self) -> Option<Kind> {
        self.lock_state().as_ref().map(|state| state.kind)
    }

    pub fn mode(&self) -> Option<FormMode> {
        self.lock_state().as_ref().map(FormState::mode)
    }

    pub fn state(&self) -> Option<FormState> {
        Clone::clone(&*self.lock_state())
    }

    pub fn value(&self, field_id: &str) -> Option<FieldValue> {
        self.lock_state().as_ref()
            .and_then(|state| state.values.get(field_id).cloned())
    }

    pub fn toggle(&self, toggle_id: &str) -> Option<bool> {
        self.with_state(|state, schema| {
            Ok(schema.find_toggle(toggle_id)
                .map(|_| schema.toggle_state(&state.auxiliary_toggles, toggle_id)))
        })
        .ok()
        .flatten()
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.lock_state().as_ref()
            .map(|state| Clone::clone(&state.field_errors))
            .unwrap_or_default()
    }

    /// Fields currently shown, in schema order.
    pub fn visible_fields(&self) -> Vec<FieldView> {
        self.with_state(|state, schema| {
            let synced = self.lock_synced();
            let views = schema.fields.iter()
                .filter(|field| state.controller.is_field_visible(schema, field, &state.auxiliary_toggles))
                .map(|field| FieldView {
                    field: Clone::clone(field),
                    value: state.values.get(field.id).cloned().unwrap_or_else(|| field.default_value()),
                    editable: state.controller.is_field_editable(field),
                    errors: state.field_errors.get(field.id).cloned().unwrap_or_default(),
                    options: match field.input_type {
                        InputType::Select { source } => synced.get(&source).cloned().unwrap_or_default(),
                        _ => Vec::new(),
                    },
                })
                .collect();
            Ok(views)
        })
        .unwrap_or_default()
    }
}
