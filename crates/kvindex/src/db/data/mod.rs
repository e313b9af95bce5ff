//! Module: db::data
//! Responsibility: primary object storage. One Begin marker plus one key per
//! non-null field, contiguous per id, read back as [`Entity`] values.
//! Does not own: index maintenance.
//! Boundary: every index verification and query materialization reads
//! objects through this module.

mod entity;
mod reader;
mod writer;


pub use entity::{Entity, FieldSelection};
pub use reader::{ObjectReader, read_entity, scan_next};
pub use writer::{clear_field, delete_object, object_exists, put_field, put_object};
