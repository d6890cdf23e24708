use std::{collections::BTreeMap, fmt::Display};

use prettytable::{row, Table};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationTypeTotals {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_amount: Decimal,
}

/// Counts across all four collections plus donation totals grouped by type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_donations: usize,
    pub total_beneficiaries: usize,
    pub total_volunteers: usize,
    pub total_disasters: usize,
    pub donations_by_type: BTreeMap<String, DonationTypeTotals>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_donation_amount: Decimal,
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts = Table::new();
        counts.add_row(row!["Donations", "Beneficiaries", "Volunteers", "Disasters"]);
        counts.add_row(row![
            self.total_donations,
            self.total_beneficiaries,
            self.total_volunteers,
            self.total_disasters
        ]);

        let mut by_type = Table::new();
        by_type.add_row(row!["Type", "Count", "Amount"]);
        by_type.add_empty_row();
        for (donation_type, totals) in &self.donations_by_type {
            by_type.add_row(row![donation_type, totals.count, totals.total_amount]);
        }
        by_type.add_empty_row();
        by_type.add_row(row!["Total", self.total_donations, self.total_donation_amount]);

        write!(f, "\n{}\n{}\n", counts, by_type)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn sample() -> Summary {
        let mut donations_by_type = BTreeMap::new();
        donations_by_type.insert("Money".to_string(), DonationTypeTotals { count: 2, total_amount: dec!(1500) });
        donations_by_type.insert("Goods".to_string(), DonationTypeTotals { count: 1, total_amount: dec!(750) });
        Summary {
            total_donations: 3,
            total_beneficiaries: 2,
            total_volunteers: 2,
            total_disasters: 1,
            donations_by_type,
            total_donation_amount: dec!(2250),
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["totalDonations"], json!(3));
        assert_eq!(value["totalDisasters"], json!(1));
        assert_eq!(value["donationsByType"]["Money"]["count"], json!(2));
        assert_eq!(value["donationsByType"]["Money"]["totalAmount"], json!(1500));
        assert_eq!(value["totalDonationAmount"], json!(2250));
    }

    #[test]
    fn renders_type_table() {
        let rendered = sample().to_string();
        assert!(rendered.contains("Money"));
        assert!(rendered.contains("Goods"));
        assert!(rendered.contains("2250"));
        assert!(rendered.find("Goods").unwrap() < rendered.find("Money").unwrap());
    }
}
