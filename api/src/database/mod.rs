/// Default database URL for local development
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./partners.db?mode=rwc";

pub mod core;
pub mod partners;
pub mod types;

// Re-export main types
pub use partners::{
    partner_search_registry, Contact, NewContact, NewPartner, Partner, PartnerDetails,
    PartnerStatus, Partners,
};
pub use types::Database;

#[cfg(test)]
pub mod test_helpers;
