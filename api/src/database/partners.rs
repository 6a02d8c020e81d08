use super::core::bind_sql_values;
use super::types::Database;
use crate::search::{
    build_sql, BooleanStrategy, Entity, EntityDescriptor, EnumStrategy, FieldDescriptor,
    IntegerStrategy, Join, Predicate, RealStrategy, SemanticType, StrategyRegistry, TextStrategy,
    TimestampStrategy, UuidStrategy, ROOT_ALIAS,
};
use anyhow::{bail, Result};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};
use uuid::Uuid;

/// Name of the enum search type backing `Partner::status`
pub const PARTNER_STATUS: &str = "partner_status";

/// Longest attribute name accepted (matches the column width)
pub const MAX_ATTRIBUTE_LEN: usize = 50;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PartnerStatus {
    Prospect,
    Active,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, Object)]
#[oai(skip_serializing_if_is_none)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub status: String,
    pub tier: i64,
    pub rating: Option<f64>,
    pub verified: bool,
    pub website: Option<String>,
    pub contact_id: Option<String>,
    pub created_at_ns: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, Object)]
#[oai(skip_serializing_if_is_none)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub country: Option<String>,
}

/// Partner with its contact and attribute names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Object)]
#[oai(skip_serializing_if_is_none)]
pub struct PartnerDetails {
    pub partner: Partner,
    pub contact: Option<Contact>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewPartner {
    pub name: String,
    pub status: PartnerStatus,
    pub tier: i64,
    pub rating: Option<f64>,
    pub verified: bool,
    pub website: Option<String>,
    pub contact_id: Option<String>,
    pub created_at_ns: i64,
}

impl NewPartner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: PartnerStatus::Prospect,
            tier: 0,
            rating: None,
            verified: false,
            website: None,
            contact_id: None,
            created_at_ns: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub country: Option<String>,
}

// Search field graph. Field names are what clients put in `member` paths.

static CONTACT_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::scalar("id", "id", SemanticType::Uuid),
    FieldDescriptor::scalar("name", "name", SemanticType::Text),
    FieldDescriptor::scalar("email", "email", SemanticType::Text),
    FieldDescriptor::scalar("country", "country", SemanticType::Text),
];

pub static CONTACTS: EntityDescriptor = EntityDescriptor {
    name: "Contact",
    table: "contacts",
    fields: &CONTACT_FIELDS,
};

static PARTNER_FIELDS: [FieldDescriptor; 10] = [
    FieldDescriptor::scalar("id", "id", SemanticType::Uuid),
    FieldDescriptor::scalar("name", "name", SemanticType::Text),
    FieldDescriptor::scalar("status", "status", SemanticType::Enum(PARTNER_STATUS)),
    FieldDescriptor::scalar("tier", "tier", SemanticType::Integer),
    FieldDescriptor::scalar("rating", "rating", SemanticType::Real),
    FieldDescriptor::scalar("verified", "verified", SemanticType::Boolean),
    FieldDescriptor::scalar("website", "website", SemanticType::Text),
    FieldDescriptor::scalar("created_at", "created_at_ns", SemanticType::Timestamp),
    FieldDescriptor::object(
        "contact",
        &CONTACTS,
        Join {
            local: "contact_id",
            remote: "id",
        },
    ),
    FieldDescriptor::collection(
        "attributes",
        &PARTNER_ATTRIBUTES,
        Join {
            local: "id",
            remote: "partner_id",
        },
    ),
];

pub static PARTNERS: EntityDescriptor = EntityDescriptor {
    name: "Partner",
    table: "partners",
    fields: &PARTNER_FIELDS,
};

static PARTNER_ATTRIBUTE_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::scalar("attribute", "attribute", SemanticType::Text),
    FieldDescriptor::object(
        "partner",
        &PARTNERS,
        Join {
            local: "partner_id",
            remote: "id",
        },
    ),
];

pub static PARTNER_ATTRIBUTES: EntityDescriptor = EntityDescriptor {
    name: "PartnerAttribute",
    table: "partner_attributes",
    fields: &PARTNER_ATTRIBUTE_FIELDS,
};

/// Search root marker for the partners table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partners;

impl Entity for Partners {
    fn descriptor() -> &'static EntityDescriptor {
        &PARTNERS
    }
}

/// Strategies for every leaf type reachable from [`Partners`]
pub fn partner_search_registry() -> StrategyRegistry {
    StrategyRegistry::builder()
        .register(TextStrategy)
        .register(IntegerStrategy)
        .register(RealStrategy)
        .register(BooleanStrategy)
        .register(TimestampStrategy)
        .register(UuidStrategy)
        .register(EnumStrategy::new(PARTNER_STATUS, PartnerStatus::VARIANTS))
        .build()
}

const PARTNER_COLUMNS: &str =
    "t0.id, t0.name, t0.status, t0.tier, t0.rating, t0.verified, t0.website, t0.contact_id, t0.created_at_ns";

impl Database {
    /// Partners matching `predicate`, ordered by name then id.
    ///
    /// `limit` of `None` returns every match.
    pub async fn list_partners(
        &self,
        predicate: &Predicate,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Partner>> {
        let fragment = build_sql(predicate);
        let query = format!(
            "SELECT {} FROM partners {} WHERE {} ORDER BY t0.name ASC, t0.id ASC LIMIT ? OFFSET ?",
            PARTNER_COLUMNS, ROOT_ALIAS, fragment.sql
        );
        tracing::debug!(sql = %query, binds = fragment.binds.len(), "listing partners");

        let partners = bind_sql_values(sqlx::query_as::<_, Partner>(&query), &fragment.binds)
            .bind(limit.unwrap_or(-1))
            .bind(offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;

        Ok(partners)
    }

    /// Count partners matching `predicate`, ignoring paging
    pub async fn count_partners(&self, predicate: &Predicate) -> Result<i64> {
        let fragment = build_sql(predicate);
        let query = format!(
            "SELECT COUNT(*) FROM partners {} WHERE {}",
            ROOT_ALIAS, fragment.sql
        );

        let count: (i64,) = bind_sql_values(sqlx::query_as(&query), &fragment.binds)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    pub async fn get_partner(&self, id: &str) -> Result<Option<Partner>> {
        let query = format!(
            "SELECT {} FROM partners {} WHERE t0.id = ?",
            PARTNER_COLUMNS, ROOT_ALIAS
        );
        let partner = sqlx::query_as::<_, Partner>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(partner)
    }

    pub async fn get_partner_details(&self, id: &str) -> Result<Option<PartnerDetails>> {
        let Some(partner) = self.get_partner(id).await? else {
            return Ok(None);
        };

        let contact = match partner.contact_id.as_deref() {
            Some(contact_id) => {
                sqlx::query_as::<_, Contact>(
                    "SELECT id, name, email, country FROM contacts WHERE id = ?",
                )
                .bind(contact_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        let attributes: Vec<(String,)> = sqlx::query_as(
            "SELECT attribute FROM partner_attributes WHERE partner_id = ? ORDER BY attribute ASC",
        )
        .bind(&partner.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(PartnerDetails {
            partner,
            contact,
            attributes: attributes.into_iter().map(|(a,)| a).collect(),
        }))
    }

    pub async fn create_contact(&self, params: NewContact) -> Result<String> {
        if params.name.trim().is_empty() {
            bail!("Contact name is required");
        }

        let id = Uuid::new_v4().hyphenated().to_string();
        sqlx::query("INSERT INTO contacts (id, name, email, country) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&params.name)
            .bind(&params.email)
            .bind(&params.country)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    pub async fn create_partner(&self, params: NewPartner) -> Result<String> {
        if params.name.trim().is_empty() {
            bail!("Partner name is required");
        }
        if let Some(rating) = params.rating {
            if !rating.is_finite() {
                bail!("Partner rating must be a finite number");
            }
        }

        let id = Uuid::new_v4().hyphenated().to_string();
        sqlx::query(
            "INSERT INTO partners (id, name, status, tier, rating, verified, website, contact_id, created_at_ns) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&params.name)
        .bind(params.status.to_string())
        .bind(params.tier)
        .bind(params.rating)
        .bind(params.verified)
        .bind(&params.website)
        .bind(&params.contact_id)
        .bind(params.created_at_ns)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn add_partner_attribute(&self, partner_id: &str, attribute: &str) -> Result<()> {
        let attribute = attribute.trim();
        if attribute.is_empty() {
            bail!("Attribute cannot be empty");
        }
        if attribute.len() > MAX_ATTRIBUTE_LEN {
            bail!(
                "Attribute is too long (max {} characters)",
                MAX_ATTRIBUTE_LEN
            );
        }

        sqlx::query(
            "INSERT INTO partner_attributes (partner_id, attribute) VALUES (?, ?) ON CONFLICT (partner_id, attribute) DO NOTHING",
        )
        .bind(partner_id)
        .bind(attribute)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
