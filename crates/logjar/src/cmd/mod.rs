//! Command implementations for the LogJar CLI

pub mod read;
pub mod write;
