//! File actions - sandboxed read, write, list, exists, delete

mod list;
mod read;
#[cfg(test)]
mod tests;
mod workspace;
mod write;

pub use list::FileListAction;
pub use read::{FileExistsAction, FileReadAction};
pub use workspace::Workspace;
pub use write::{FileDeleteAction, FileWriteAction};

use crate::error::Error;
use std::io::ErrorKind;

/// Report a missing path as `missing`, pass every other IO failure through
fn not_found_or_io(err: std::io::Error, missing: impl FnOnce() -> String) -> Error {
    match err.kind() {
        ErrorKind::NotFound => Error::Execution(missing()),
        _ => Error::Io(err),
    }
}
