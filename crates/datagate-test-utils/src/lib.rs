pub mod helpers;
pub mod mock_ledger;

pub use helpers::*;
pub use mock_ledger::MockLedger;
