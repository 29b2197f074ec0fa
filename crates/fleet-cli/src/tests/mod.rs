//! Unit and session tests for the fleet client runtime.

mod support;
