/// Shared test helpers for database tests
use super::partners::{NewContact, NewPartner, PartnerStatus};
use super::Database;

/// Set up a fresh in-memory database with all migrations applied.
/// Every call gets its own database, so tests never see each other's rows.
pub async fn setup_test_db() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to set up in-memory test database")
}

pub async fn insert_contact(db: &Database, name: &str, country: Option<&str>) -> String {
    db.create_contact(NewContact {
        name: name.to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        country: country.map(str::to_string),
    })
    .await
    .expect("Failed to insert contact")
}

/// Insert a partner with the fields most tests filter on
pub async fn insert_partner(
    db: &Database,
    name: &str,
    status: PartnerStatus,
    tier: i64,
    created_at_ns: i64,
) -> String {
    let mut partner = NewPartner::new(name);
    partner.status = status;
    partner.tier = tier;
    partner.created_at_ns = created_at_ns;
    db.create_partner(partner)
        .await
        .expect("Failed to insert partner")
}
