//! Filesystem utilities for cryorun.
//!
//! Provides atomic writes for project state files so that an interrupted
//! run never leaves a half-written registry or config behind.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
