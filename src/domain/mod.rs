mod balance;
mod error;
mod event;
mod ledger;
mod member;
mod money;
mod settlement;

pub use balance::*;
pub use error::*;
pub use event::*;
pub use ledger::*;
pub use member::*;
pub use money::*;
pub use settlement::*;
