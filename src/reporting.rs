use std::sync::Arc;

use relief_core::{Beneficiary, Disaster, DocumentStore, Donation, DonationTypeTotals, StorageError, Summary, Volunteer};
use thiserror::Error;

use crate::repository::Repository;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("donation total for type {donation_type:?} exceeds the representable amount")]
    AmountOverflow { donation_type: String },
}

/// Builds the cross-collection summary report.
///
/// The four reads are independent; writes landing between them show up in
/// some counts and not others.
pub struct Reporting {
    donations: Repository<Donation>,
    beneficiaries: Repository<Beneficiary>,
    volunteers: Repository<Volunteer>,
    disasters: Repository<Disaster>,
}

impl Reporting {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            donations: Repository::new(store.clone()),
            beneficiaries: Repository::new(store.clone()),
            volunteers: Repository::new(store.clone()),
            disasters: Repository::new(store),
        }
    }

    pub fn summarize(&self) -> Result<Summary, ReportError> {
        let donations = self.donations.list_all()?;
        let beneficiaries = self.beneficiaries.list_all()?;
        let volunteers = self.volunteers.list_all()?;
        let disasters = self.disasters.list_all()?;

        summarize_records(&donations, beneficiaries.len(), volunteers.len(), disasters.len())
    }
}

/// Groups donations by exact `type` string and sums amounts without rounding.
///
/// Fails instead of rounding when a sum leaves the `Decimal` range.
pub fn summarize_records(
    donations: &[Donation],
    total_beneficiaries: usize,
    total_volunteers: usize,
    total_disasters: usize,
) -> Result<Summary, ReportError> {
    let mut summary = Summary {
        total_donations: donations.len(),
        total_beneficiaries,
        total_volunteers,
        total_disasters,
        ..Summary::default()
    };

    for donation in donations {
        let group = summary
            .donations_by_type
            .entry(donation.donation_type.clone())
            .or_insert_with(DonationTypeTotals::default);
        let overflow = || ReportError::AmountOverflow {
            donation_type: donation.donation_type.clone(),
        };
        group.count += 1;
        group.total_amount = group.total_amount.checked_add(donation.amount).ok_or_else(overflow)?;
        summary.total_donation_amount = summary
            .total_donation_amount
            .checked_add(donation.amount)
            .ok_or_else(overflow)?;
    }

    Ok(summary)
}
