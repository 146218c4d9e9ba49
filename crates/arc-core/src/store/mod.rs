// ── Per-resource cache ──

mod observable;

pub use observable::{ResourceObservable, ResourceState};
