//! Location and saved-location domain types.

use chrono::{DateTime, Utc};

use beanpass_core::{CustomerId, CustomerLocationId, JoinCode, LocationId, OrgId};

/// A physical venue, externally managed and read-only from the client's
/// perspective.
#[derive(Debug, Clone)]
pub struct Location {
    /// Stable location ID.
    pub id: LocationId,
    /// Display name of the venue.
    pub name: String,
    /// Optional short code shown on signage.
    pub short_code: Option<String>,
    /// The join code customers scan or type to link to this venue.
    pub join_code: JoinCode,
    /// Organization the venue belongs to.
    pub org_id: OrgId,
    /// City, if published.
    pub city: Option<String>,
    /// State/region, if published.
    pub state: Option<String>,
    /// Whether the venue accepts new links.
    pub active: bool,
}

/// A link between one customer profile and one location.
///
/// At most one exists per (customer, location) pair, and at most one per
/// customer carries `is_home = true`.
#[derive(Debug, Clone)]
pub struct SavedLocation {
    /// Stable link ID.
    pub id: CustomerLocationId,
    /// Customer side of the link.
    pub customer_id: CustomerId,
    /// Location side of the link.
    pub location_id: LocationId,
    /// Organization, copied from the location at link time.
    pub org_id: OrgId,
    /// Whether this is the customer's home location.
    pub is_home: bool,
    /// When the customer first connected to this location.
    pub first_visited_at: DateTime<Utc>,
    /// When the customer last visited this location.
    pub last_visited_at: DateTime<Utc>,
    /// Embedded location display fields.
    pub location: Location,
}
