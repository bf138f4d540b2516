//! Network availability checks performed before every load attempt.

pub mod connectivity;

pub use connectivity::{ConnectivityGate, ConnectivityOracle, StaticOracle, SysfsOracle, Transport};
