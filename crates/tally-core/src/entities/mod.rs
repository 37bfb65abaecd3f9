//! Entity structs for the invoice ledger.
//!
//! Each entity maps to a table in the libSQL store: `students`,
//! `invoice_entries`, and `generated_invoices`.

mod entry;
mod invoice;
mod student;

pub use entry::SessionEntry;
pub use invoice::{BillablePeriod, GeneratedInvoice};
pub use student::Student;
