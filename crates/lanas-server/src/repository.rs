//! PostgreSQL lead store.
//!
//! Feature-gated behind `postgres-backend`. Leads live in a `leads` table
//! with one column per answer; catalog-backed answers that may hold free
//! text are JSONB so the fixed/other distinction survives the round trip.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use lanas_core::error::LeadStoreError;
use lanas_core::lead::{Choice, Lead, NewLead};
use lanas_core::store::LeadStore;

const CREATE_LEADS: &str = "CREATE TABLE IF NOT EXISTS leads (\
    id                   UUID        PRIMARY KEY, \
    created_at           TIMESTAMPTZ NOT NULL, \
    name                 TEXT        NOT NULL, \
    email                TEXT        NOT NULL, \
    phone                TEXT        NOT NULL, \
    profession           JSONB       NOT NULL, \
    specialty            TEXT        NOT NULL, \
    monthly_income       TEXT        NOT NULL, \
    has_debts            TEXT        NOT NULL, \
    total_assets         TEXT        NOT NULL, \
    investments          JSONB, \
    financial_challenges JSONB, \
    main_objective       TEXT        NOT NULL, \
    additional_comments  TEXT, \
    urgency_level        TEXT        NOT NULL, \
    contact_preference   TEXT        NOT NULL, \
    availability         TEXT        NOT NULL\
)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads (created_at DESC)";

/// A row of the `leads` table.
#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    name: String,
    email: String,
    phone: String,
    profession: Json<Choice>,
    specialty: String,
    monthly_income: String,
    has_debts: String,
    total_assets: String,
    investments: Option<Json<Vec<Choice>>>,
    financial_challenges: Option<Json<Vec<Choice>>>,
    main_objective: String,
    additional_comments: Option<String>,
    urgency_level: String,
    contact_preference: String,
    availability: String,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            record: NewLead {
                name: row.name,
                email: row.email,
                phone: row.phone,
                profession: row.profession.0,
                specialty: row.specialty,
                monthly_income: row.monthly_income,
                has_debts: row.has_debts,
                total_assets: row.total_assets,
                investments: row.investments.map(|j| j.0),
                financial_challenges: row.financial_challenges.map(|j| j.0),
                main_objective: row.main_objective,
                additional_comments: row.additional_comments,
                urgency_level: row.urgency_level,
                contact_preference: row.contact_preference,
                availability: row.availability,
            },
        }
    }
}

fn db_error(err: &sqlx::Error) -> LeadStoreError {
    LeadStoreError::Database {
        reason: err.to_string(),
    }
}

/// A [`LeadStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgLeadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgLeadStore")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

impl PgLeadStore {
    /// Connect and create the `leads` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LeadStoreError::Database`] if the connection or migration
    /// fails.
    pub async fn connect(database_url: &str) -> Result<Self, LeadStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| db_error(&e))?;

        sqlx::query(CREATE_LEADS)
            .execute(&pool)
            .await
            .map_err(|e| db_error(&e))?;
        sqlx::query(CREATE_CREATED_AT_INDEX)
            .execute(&pool)
            .await
            .map_err(|e| db_error(&e))?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl LeadStore for PgLeadStore {
    async fn insert(&self, record: NewLead) -> Result<Lead, LeadStoreError> {
        let lead = Lead::new(record);
        let r = &lead.record;
        let row = sqlx::query_as::<_, LeadRow>(
            r"INSERT INTO leads (id, created_at, name, email, phone, profession, specialty,
                monthly_income, has_debts, total_assets, investments, financial_challenges,
                main_objective, additional_comments, urgency_level, contact_preference, availability)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
              RETURNING *",
        )
        .bind(lead.id)
        .bind(lead.created_at)
        .bind(&r.name)
        .bind(&r.email)
        .bind(&r.phone)
        .bind(Json(&r.profession))
        .bind(&r.specialty)
        .bind(&r.monthly_income)
        .bind(&r.has_debts)
        .bind(&r.total_assets)
        .bind(r.investments.as_ref().map(Json))
        .bind(r.financial_challenges.as_ref().map(Json))
        .bind(&r.main_objective)
        .bind(r.additional_comments.as_deref())
        .bind(&r.urgency_level)
        .bind(&r.contact_preference)
        .bind(&r.availability)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;

        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<Lead>, LeadStoreError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            "SELECT * FROM leads ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Lead>, LeadStoreError> {
        let row = sqlx::query_as::<_, LeadRow>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        Ok(row.map(Lead::from))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
