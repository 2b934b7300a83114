pub mod advice;
pub mod ledger;
pub mod prediction;
