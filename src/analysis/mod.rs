//! Speed and punctuality analysis over in-memory position data.
//!
//! Everything in here is pure: callers hand over fully loaded observation and schedule tables and
//! get freshly built result structures back. [`speed`] flags vehicles over a speed limit,
//! [`punctuality`] matches live positions against stop timetables. Both build on the interval
//! arithmetic in [`temporal`] and the WGS-84 distances in [`geodesy`].

pub mod error;
pub mod geodesy;
pub mod punctuality;
pub mod speed;
pub mod temporal;

pub use error::AnalysisError;
