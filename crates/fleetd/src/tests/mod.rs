//! Test suites for the fleet daemon.

mod support;
