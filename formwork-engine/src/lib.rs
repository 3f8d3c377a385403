pub mod engine;
pub mod ior;
pub mod mode;
pub mod options;
pub mod projector;
pub mod registry;
pub mod validation;
pub mod value;

pub use engine::{DeleteError, FieldView, FormEngine, FormError, FormState, RefreshListener, SubmitError, SubmitOutcome};
pub use mode::{EditLock, FormMode, ModeController};
pub use options::{DefaultKinds, FormOptions};
pub use projector::{ProjectionError, Projector};
pub use registry::{KindSchema, RegistryError, SchemaRegistry, UnknownKindError};
pub use validation::{Check, SyncedOptions, ValidationError};
pub use value::{FieldValue, FieldValues, Toggles};
