//! Filesystem primitives for the add-on manager
//!
//! Provides atomic writes and copies, the signature guard that decides
//! whether a file may be overwritten, and the dotenv codec used for
//! project environment files.

pub mod constants;
pub mod dotenv;
pub mod error;
pub mod io;
pub mod signature;

pub use constants::{ConfigPath, SIGNATURE_MARKER};
pub use error::{Error, Result};
pub use signature::{Verdict, may_overwrite};
