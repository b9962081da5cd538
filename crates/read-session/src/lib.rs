//! Read Sessions
//!
//! Turns repeated read calls of one consumer into either a one-sample-per-open
//! ("latest") or an oldest-to-newest drain ("full") protocol, and keeps the
//! table of open sessions that an I/O layer drives.

mod error;
mod session;
mod table;

pub use error::SessionError;
pub use session::{
    DrainState, FullDrainReader, LatestReader, LatestState, ReadSession, SessionKind,
};
pub use table::{RefreshHook, SessionId, SessionTable};
