//! Error types that cross the boundary between the core and the outside
//! world (ROM loading, CLI argument parsing). Everything else — illegal
//! opcodes, unaligned accesses, writes to ROM — is a recoverable in-core
//! condition reported via `tracing` and `CpuFlags`, not a `Result`.

use thiserror::Error;

/// Errors from loading a ROM image off disk.
#[derive(Error, Debug)]
pub enum RomError {
    #[error("could not read ROM file: {0}")]
    Io(#[from] std::io::Error),

    #[error("ROM image is {0} bytes, which exceeds the 64 KiB address space")]
    TooLarge(usize),
}

/// Top-level error returned by `main`, wrapping both ROM loading and CLI
/// argument parsing failures the way a single binary's `main` would.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] lexopt::Error),

    #[error(transparent)]
    Rom(#[from] RomError),
}
