//! Command implementations for svcwrap CLI

pub mod completion;
pub mod config;
pub mod run;
pub mod version;
