use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// The six resources stored by the ARC server.
///
/// Declaration order is the initialization order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ResourceName {
    Tutors,
    Learners,
    Bookings,
    Matchings,
    Requests,
    RequestSubmissions,
}

impl ResourceName {
    /// Singular human-readable title, e.g. `"request submission"`.
    pub fn title(self) -> &'static str {
        match self {
            Self::Tutors => "tutor",
            Self::Learners => "learner",
            Self::Bookings => "booking",
            Self::Matchings => "matching",
            Self::Requests => "request",
            Self::RequestSubmissions => "request submission",
        }
    }

    pub fn plural_title(self) -> &'static str {
        match self {
            Self::Tutors => "tutors",
            Self::Learners => "learners",
            Self::Bookings => "bookings",
            Self::Matchings => "matchings",
            Self::Requests => "requests",
            Self::RequestSubmissions => "request submissions",
        }
    }
}
