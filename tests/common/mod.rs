// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tempfile::TempDir;
use tripsplit::application::TripService;
use tripsplit::domain::Ledger;

/// Helper to create a test service backed by a temporary trip file
pub fn test_service() -> Result<(TripService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("trip.json");
    let service = TripService::init(&path, "Test trip", "Rs.")?;
    Ok((service, temp_dir))
}

/// Rupees to cents
pub fn rs(amount: i64) -> i64 {
    amount * 100
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Test fixture: the group used across scenarios
pub struct Group;

impl Group {
    pub const EIGHT: [&'static str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

    pub fn ledger(members: &[&str]) -> Result<Ledger> {
        let mut ledger = Ledger::new("Test trip", "Rs.");
        for name in members {
            ledger.add_member(*name)?;
        }
        Ok(ledger)
    }

    pub fn register(service: &mut TripService, members: &[&str]) -> Result<()> {
        for name in members {
            service.add_member(name)?;
        }
        Ok(())
    }

    /// A and B each hand 3000 to treasurer C, who then spends 10000 on
    /// everyone.
    pub fn eight_member_trip() -> Result<Ledger> {
        let mut ledger = Self::ledger(&Self::EIGHT)?;
        ledger.record_advance("A", "C", rs(3000))?;
        ledger.record_advance("B", "C", rs(3000))?;
        ledger.record_expense("C", rs(10000), names(&Self::EIGHT), "Resort booking")?;
        Ok(ledger)
    }
}
