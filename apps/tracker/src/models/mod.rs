pub mod record;

pub use record::{ApplicationStatus, Record, RecordId};
