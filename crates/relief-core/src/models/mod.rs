use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::Entity;

pub mod summary;

// Request bodies also accept PascalCase keys; existing clients of the API
// send `Amount`, `DateOccurred` and so on.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", alias = "Type", default)]
    pub donation_type: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    /// Exact on the wire too: written as a JSON number with every digit kept.
    #[serde(alias = "Amount", with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    #[serde(alias = "Date", with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// `received_donations` holds donation ids. They are never checked against
/// the `Donations` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Contact")]
    pub contact: String,
    #[serde(default, alias = "Address")]
    pub address: String,
    #[serde(default, alias = "ReceivedDonations")]
    pub received_donations: Vec<String>,
}

/// `assigned_disasters` holds disaster ids, unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Contact")]
    pub contact: String,
    #[serde(default, alias = "AssignedDisasters")]
    pub assigned_disasters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disaster {
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(rename = "type", alias = "Type", default)]
    pub disaster_type: String,
    #[serde(alias = "DateOccurred", with = "time::serde::rfc3339")]
    pub date_occurred: OffsetDateTime,
    #[serde(default, alias = "Location")]
    pub location: String,
}

macro_rules! impl_entity {
    ($ty:ty, $collection:literal, $route:literal) => {
        impl Entity for $ty {
            const COLLECTION: &'static str = $collection;
            const ROUTE: &'static str = $route;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: Option<String>) {
                self.id = id;
            }
        }
    };
}

impl_entity!(Donation, "Donations", "donations");
impl_entity!(Beneficiary, "Beneficiaries", "beneficiaries");
impl_entity!(Volunteer, "Volunteers", "volunteers");
impl_entity!(Disaster, "Disasters", "disasters");
