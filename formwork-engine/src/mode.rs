use formwork_types::RecordId;

use crate::registry::{FieldSpec, KindSchema};
use crate::value::Toggles;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update { record: RecordId },
}

impl FormMode {
    pub fn is_update(&self) -> bool {
        matches!(self, FormMode::Update { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditLock {
    Locked,
    Unlocked,
}

/// Decides which fields of a form may be edited.
///
/// Create forms are always unlocked. Update forms start locked and are unlocked
/// by [`ModeController::enter_edit_mode`]. Identity fields of an update form stay
/// locked regardless, since changing them would point the record at a different resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeController {
    mode: FormMode,
    lock: EditLock,
}

impl ModeController {
    pub fn new(mode: FormMode) -> Self {
        let lock = match mode {
            FormMode::Create => EditLock::Unlocked,
            FormMode::Update { .. } => EditLock::Locked,
        };
        Self { mode, lock }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn lock(&self) -> EditLock {
        self.lock
    }

    pub fn enter_edit_mode(&mut self) {
        self.lock = EditLock::Unlocked;
    }

    pub fn cancel_edit(&mut self) {
        if self.mode.is_update() {
            self.lock = EditLock::Locked;
        }
    }

    pub fn submit_succeeded(&mut self) {
        self.cancel_edit();
    }

    pub fn is_field_editable(&self, field: &FieldSpec) -> bool {
        match self.mode {
            FormMode::Create => true,
            FormMode::Update { .. } => !field.identity && self.lock == EditLock::Unlocked,
        }
    }

    pub fn is_toggle_editable(&self) -> bool {
        self.lock == EditLock::Unlocked
    }

    pub fn is_field_visible(&self, schema: &KindSchema, field: &FieldSpec, toggles: &Toggles) -> bool {
        schema.is_visible(field, toggles)
    }
}
