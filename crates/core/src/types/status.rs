//! Status enums reported by the storefront.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// Maps to the Storefront API's `OrderFulfillmentStatus` values. Values added
/// by newer API versions deserialize to [`FulfillmentStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    Restocked,
    PendingFulfillment,
    Open,
    InProgress,
    OnHold,
    Scheduled,
    #[serde(other)]
    Unknown,
}

impl FulfillmentStatus {
    /// Human-readable label for order lists.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unfulfilled => "Unfulfilled",
            Self::PartiallyFulfilled => "Partially fulfilled",
            Self::Fulfilled => "Fulfilled",
            Self::Restocked => "Restocked",
            Self::PendingFulfillment => "Pending fulfillment",
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::OnHold => "On hold",
            Self::Scheduled => "Scheduled",
            Self::Unknown => "Unknown status",
        }
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
