//! Field extraction: provider field mapping, text recovery and record assembly.

pub mod mapping;
mod processor;
pub mod rules;

pub use mapping::{map_fields, table_for, FieldKind, FieldMapping, MappingTable};
pub use processor::{DocumentProcessor, ExtractionResult};
