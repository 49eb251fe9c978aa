//! The `utils` module provides helper functions shared by the rest of the
//! build system, currently the external command runner that the diagnostics
//! layer reports on.

pub mod command_runner;
