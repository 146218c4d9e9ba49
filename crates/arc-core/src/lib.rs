//! Client-side resource synchronization for ARC App.
//!
//! Keeps an in-memory copy of each server resource (tutors, learners,
//! bookings, matchings, requests, request submissions). Each resource is
//! loaded explicitly at start-up (`initialize` / `initialize_resources`) and
//! reads never fetch. Writes go through to the server, and pushed change
//! notifications are reconciled into the cache.
//!
//! ```text
//! ResourceRegistry ──▶ Resource ──▶ ResourceObservable ──▶ ResourceEndpoint ──▶ arc_api::RpcClient
//!                                        │
//!                                        └──▶ ResourceStream (subscribers)
//! ```

pub mod ask;
pub mod checker;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod notification;
pub mod registry;
pub mod resource;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use ask::{Ask, AskFinished, AskStatus, unwrap_or_fail};
pub use checker::{DataCheckReport, DataProblem, ProblemTag, run_data_checker};
pub use config::{BackendConfig, ClientConfig};
pub use endpoint::{ResourceEndpoint, ResourceOp};
pub use error::CoreError;
pub use model::{
    FieldCheck, FieldInfo, FieldKind, Record, RecordCollection, ResourceInfo, ResourceName,
    SERVER_DATE, UNASSIGNED_ID,
};
pub use notification::{Notification, NotificationOp};
pub use registry::{RegistryBuilder, ResourceRegistry, ResourceSummary};
pub use resource::{Marker, Resource};
pub use store::{ResourceObservable, ResourceState};
pub use stream::{ResourceStream, ResourceWatchStream};
