//! Shared primitive types used across the entire simulation.

/// A simulation year. Years are processed strictly in ascending order.
pub type SimYear = i32;

/// A stable, unique identifier for any employee in the simulation.
pub type EmployeeId = String;

/// The canonical run identifier.
pub type RunId = String;
