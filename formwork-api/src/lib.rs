pub mod error;
pub mod memory;
pub mod records;

pub use error::{ApiError, FieldErrors};
pub use memory::InMemoryRecordManager;
pub use records::{RecordManager, RecordManagerRef};
