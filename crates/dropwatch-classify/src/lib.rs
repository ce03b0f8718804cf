//! WHOIS response classification: lifecycle status, registrar extraction,
//! match evaluation, and activity-code inference.

mod registrar;
mod rules;

pub use registrar::extract_registrar;
pub use rules::{activity_code, classify, classify_with_hint, matches};
