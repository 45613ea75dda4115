use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Airline backend a fare was collected from.
///
/// The serialized names match the keys of the routes file and the `company`
/// field downstream consumers already receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Company {
    EasyJet,
    RyanAir,
    WizzAir,
}

impl Company {
    pub const ALL: [Company; 3] = [Company::EasyJet, Company::RyanAir, Company::WizzAir];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Company::EasyJet => "EasyJet",
            Company::RyanAir => "RyanAir",
            Company::WizzAir => "WizzAir",
        }
    }
}

impl std::fmt::Display for Company {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Company {
    type Err = String;

    /// Case-insensitive, so `ryanair` on the command line resolves too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Company::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown company '{s}'; expected one of EasyJet, RyanAir, WizzAir")
            })
    }
}
