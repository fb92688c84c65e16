//! Domain models persisted in the relational store.

mod collection;
mod digital_file;
mod dip;
mod dublin_core;
mod premis_event;
pub mod validation;

pub use collection::{Collection, NewCollection};
pub use digital_file::DigitalFile;
pub use dip::{Dip, ImportStatus, NewDip, MISSING_TASK_RESULT};
pub use dublin_core::{
    add_if_not_empty, empty_values, DcDisplayConfig, DcField, DcValues, DublinCore,
    ENABLED_FIELDS_SETTING, HIDE_EMPTY_SETTING,
};
pub use premis_event::PremisEvent;
pub use validation::FieldErrors;

use crate::db::{Database, DatabaseError};

/// Basic persistence operations of a stored entity.
///
/// Plain persistence never touches the search index; use
/// [`IndexSynchronizer`](crate::sync::IndexSynchronizer) for that.
pub trait Record: Sized {
    /// What is needed to create a new record.
    type New;

    fn insert(db: &Database, new: Self::New) -> Result<Self, DatabaseError>;

    fn update(&self, db: &Database) -> Result<(), DatabaseError>;

    fn delete(self, db: &Database) -> Result<(), DatabaseError>;
}
