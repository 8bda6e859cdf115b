//! Pure analysis algorithms over index data.
//!
//! Nothing in here touches storage; services load the inputs.

pub mod gap;
