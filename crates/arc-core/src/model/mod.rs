// ── Domain model ──
//
// Records, collections, resource names and per-resource field metadata.

mod record;
mod resource_name;
mod schema;

pub use record::{Record, RecordCollection, SERVER_DATE, UNASSIGNED_ID};
pub use resource_name::ResourceName;
pub use schema::{FieldCheck, FieldInfo, FieldKind, ResourceInfo, json_type_name};
