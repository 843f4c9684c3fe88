//! model: registrant entity, editable draft and document number formatting.

mod doc_number;
mod registrant;

pub use doc_number::format_doc_number;
pub use registrant::{Gender, Registrant, RegistrantDraft};
