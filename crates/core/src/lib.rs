pub mod error;
pub mod event;
pub mod state;

pub use error::{Result, UpsError};
pub use event::Message;
pub use state::{Channel, Reading, Snapshot, Telemetry};
