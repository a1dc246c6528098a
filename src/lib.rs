//! # doit - minimal C/C++ build orchestrator
//!
//! Builds one or more targets described in `doit.toml`:
//!
//! 1. locate sources under `src/` (whole tree, or top level plus modules)
//! 2. map each source to `obj/<target>/<path>.o`
//! 3. ask the compiler for header dependencies and recompile stale sources
//! 4. discover libraries and frameworks under `lib/`
//! 5. reset `pub/<target>/` (flat, or an `.app` bundle) and link into it
//! 6. copy module frameworks into the bundle
//!
//! Everything runs sequentially and stops at the first error.
//!
//! ## Module Organization
//!
//! - [`build`] - The pipeline stages and their orchestration
//! - [`config`] - `doit.toml` parsing and the fixed directory layout
//! - [`error`] - Error kinds and exit codes
//! - [`process`] - Toolchain process execution

/// Build pipeline: discovery, compilation, linking, publishing.
pub mod build;

/// Configuration file parsing (`doit.toml`).
pub mod config;

/// Build errors and exit codes.
pub mod error;

/// Subprocess abstraction for compiler and linker calls.
pub mod process;

/// Terminal UI utilities (tables).
pub mod ui;
