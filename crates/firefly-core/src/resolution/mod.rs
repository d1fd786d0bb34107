//! Whole-program name resolution
//!
//! Translation tasks register what their unit declares and look up what it
//! references. Lookups for names another unit has not declared yet wait until
//! the declaration shows up or resolution ends.

pub mod signature;
pub mod table;

pub use signature::{MethodSignature, Signature, TypeSignature};
pub use table::{ResolutionTable, ResolvedDeclaration, TableSnapshot, DEFAULT_EVENT_BUFFER};

use crate::declaration::{MethodDeclaration, TypeDeclaration};
use crate::error::ResolutionError;

/// The type and method tables of one compilation
#[derive(Debug, Clone)]
pub struct ResolutionTables {
    /// Types keyed by their own qualified name
    pub types: ResolutionTable<TypeDeclaration>,
    /// Methods keyed by the qualified name of the declaring type
    pub methods: ResolutionTable<MethodDeclaration>,
}

impl ResolutionTables {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_BUFFER)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            types: ResolutionTable::with_capacity("type", capacity),
            methods: ResolutionTable::with_capacity("method", capacity),
        }
    }

    /// End resolution on both tables
    pub async fn end_resolution(&self) -> Result<(), ResolutionError> {
        self.types.end_resolution().await?;
        self.methods.end_resolution().await?;
        Ok(())
    }
}

impl Default for ResolutionTables {
    fn default() -> Self {
        Self::new()
    }
}
