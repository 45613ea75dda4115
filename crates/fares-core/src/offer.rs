use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::company::Company;

/// One observed one-way fare, in the flat shape handed to the publisher.
///
/// Serializes to
/// `{flight_date, source, destination, price, currency, company, scrape_date}`
/// with ISO dates and `price` as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOffer {
    /// Calendar date of departure.
    pub flight_date: NaiveDate,
    /// IATA code of the departure station.
    pub source: String,
    /// IATA code of the arrival station.
    pub destination: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// ISO 4217 currency code as reported by the backend (e.g. `"EUR"`).
    pub currency: String,
    pub company: Company,
    /// Date the crawl ran.
    pub scrape_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn offer() -> CanonicalOffer {
        CanonicalOffer {
            flight_date: NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            source: "GVA".to_string(),
            destination: "OTP".to_string(),
            price: Decimal::from_str("49.99").unwrap(),
            currency: "EUR".to_string(),
            company: Company::WizzAir,
            scrape_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        }
    }

    #[test]
    fn serializes_to_flat_wire_shape() {
        let value = serde_json::to_value(offer()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "flight_date": "2026-11-03",
                "source": "GVA",
                "destination": "OTP",
                "price": 49.99,
                "currency": "EUR",
                "company": "WizzAir",
                "scrape_date": "2026-10-16"
            })
        );
    }

    #[test]
    fn wire_shape_has_no_nested_values() {
        let value = serde_json::to_value(offer()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 7);
        assert!(object.values().all(|v| !v.is_object() && !v.is_array()));
    }
}
