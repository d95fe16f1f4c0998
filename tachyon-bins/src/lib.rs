//! Shared plumbing for the tachyon binaries

pub mod common;
