pub mod checklist;
pub mod invoices;
pub mod passwords;
pub mod reports;
pub mod sync;
