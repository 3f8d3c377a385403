pub mod kind;
pub mod payload;
pub mod record;

pub use kind::{Family, IllegalFamily, IllegalKind, Kind};
pub use payload::{Params, SubmissionPayload};
pub use record::{IllegalRecordId, Record, RecordId, RecordMutation, SelectionOption};
