use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::models::{
    ConfirmedInsert, ConfirmedPairing, PairingFamily, Slot, TentativePairing,
};
use crate::services::store::{MatchStore, StoreError};

const TENTATIVE_COLUMNS: &str =
    "id, party_one, party_two, party_one_liked, party_two_liked, created_at";
const CONFIRMED_COLUMNS: &str = "id, party_one, party_two, created_at";

/// PostgreSQL pairing store.
///
/// Uniqueness per unordered pair is enforced by a unique index over
/// `(LEAST(party_one, party_two), GREATEST(party_one, party_two))` on each
/// family's table, which makes confirmed insertion conflict-tolerant and
/// lets every write here be a single statement.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run migrations.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        Self::connect(database_url, max_connections, min_connections, 5, 600).await
    }

    /// Create a store from loaded settings.
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("connecting to PostgreSQL");

        Self::connect(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            settings.acquire_timeout_secs.unwrap_or(5),
            settings.idle_timeout_secs.unwrap_or(600),
        )
        .await
    }

    async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Health check for the database connection.
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn tentative_from_row(row: &PgRow) -> TentativePairing {
    TentativePairing {
        id: row.get("id"),
        party_one: row.get("party_one"),
        party_two: row.get("party_two"),
        party_one_liked: row.get("party_one_liked"),
        party_two_liked: row.get("party_two_liked"),
        created_at: row.get("created_at"),
    }
}

fn confirmed_from_row(row: &PgRow) -> ConfirmedPairing {
    ConfirmedPairing {
        id: row.get("id"),
        party_one: row.get("party_one"),
        party_two: row.get("party_two"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn create_tentative(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<TentativePairing, StoreError> {
        if party_a == party_b {
            return Err(StoreError::SelfPair(party_a.to_string()));
        }

        // One statement: the WHERE NOT EXISTS arm covers an existing
        // confirmed record, the ON CONFLICT arm an existing tentative one.
        let query = format!(
            r#"
            INSERT INTO tentative_pairings (party_one, party_two)
            SELECT $1::TEXT, $2::TEXT
            WHERE NOT EXISTS (
                SELECT 1 FROM confirmed_pairings
                WHERE LEAST(party_one, party_two) = LEAST($1::TEXT, $2::TEXT)
                  AND GREATEST(party_one, party_two) = GREATEST($1::TEXT, $2::TEXT)
            )
            ON CONFLICT ((LEAST(party_one, party_two)), (GREATEST(party_one, party_two)))
                DO NOTHING
            RETURNING {TENTATIVE_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(party_a)
            .bind(party_b)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let pairing = tentative_from_row(&row);
                tracing::debug!(
                    "created tentative pairing {} ({party_a}, {party_b})",
                    pairing.id
                );
                Ok(pairing)
            }
            None => Err(StoreError::Conflict {
                party_a: party_a.to_string(),
                party_b: party_b.to_string(),
            }),
        }
    }

    async fn create_confirmed(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<ConfirmedInsert, StoreError> {
        if party_a == party_b {
            return Err(StoreError::SelfPair(party_a.to_string()));
        }

        let insert = format!(
            r#"
            INSERT INTO confirmed_pairings (party_one, party_two)
            VALUES ($1, $2)
            ON CONFLICT ((LEAST(party_one, party_two)), (GREATEST(party_one, party_two)))
                DO NOTHING
            RETURNING {CONFIRMED_COLUMNS}
            "#
        );
        let select_existing = r#"
            SELECT id, party_one, party_two, created_at
            FROM confirmed_pairings
            WHERE LEAST(party_one, party_two) = LEAST($1::TEXT, $2::TEXT)
              AND GREATEST(party_one, party_two) = GREATEST($1::TEXT, $2::TEXT)
            "#;

        loop {
            let inserted = sqlx::query(&insert)
                .bind(party_a)
                .bind(party_b)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = inserted {
                return Ok(ConfirmedInsert::Created(confirmed_from_row(&row)));
            }

            let existing = sqlx::query(select_existing)
                .bind(party_a)
                .bind(party_b)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = existing {
                return Ok(ConfirmedInsert::Existing(confirmed_from_row(&row)));
            }
            // The conflicting record was unmatched between the two
            // statements; retry the insert.
        }
    }

    async fn get_tentative(&self, id: Uuid) -> Result<TentativePairing, StoreError> {
        let query = format!(
            "SELECT {TENTATIVE_COLUMNS} FROM tentative_pairings WHERE id = $1"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| tentative_from_row(&row))
            .ok_or(StoreError::NotFound {
                family: PairingFamily::Tentative,
                id,
            })
    }

    async fn get_confirmed(&self, id: Uuid) -> Result<ConfirmedPairing, StoreError> {
        let query = format!(
            "SELECT {CONFIRMED_COLUMNS} FROM confirmed_pairings WHERE id = $1"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| confirmed_from_row(&row))
            .ok_or(StoreError::NotFound {
                family: PairingFamily::Confirmed,
                id,
            })
    }

    async fn list_tentative_awaiting(
        &self,
        party: &str,
    ) -> Result<Vec<TentativePairing>, StoreError> {
        let query = format!(
            r#"
            SELECT {TENTATIVE_COLUMNS}
            FROM tentative_pairings
            WHERE (party_one = $1 AND NOT party_one_liked)
               OR (party_two = $1 AND NOT party_two_liked)
            ORDER BY created_at
            "#
        );

        let rows = sqlx::query(&query)
            .bind(party)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(tentative_from_row).collect())
    }

    async fn list_confirmed(&self, party: &str) -> Result<Vec<ConfirmedPairing>, StoreError> {
        let query = format!(
            r#"
            SELECT {CONFIRMED_COLUMNS}
            FROM confirmed_pairings
            WHERE party_one = $1 OR party_two = $1
            ORDER BY created_at
            "#
        );

        let rows = sqlx::query(&query)
            .bind(party)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(confirmed_from_row).collect())
    }

    async fn set_liked_and_fetch(
        &self,
        id: Uuid,
        slot: Slot,
    ) -> Result<TentativePairing, StoreError> {
        // Column picked from a closed enum, never from caller input.
        let column = match slot {
            Slot::One => "party_one_liked",
            Slot::Two => "party_two_liked",
        };
        let query = format!(
            "UPDATE tentative_pairings SET {column} = TRUE WHERE id = $1 \
             RETURNING {TENTATIVE_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| tentative_from_row(&row))
            .ok_or(StoreError::NotFound {
                family: PairingFamily::Tentative,
                id,
            })
    }

    async fn delete(&self, id: Uuid, family: PairingFamily) -> Result<(), StoreError> {
        let query = match family {
            PairingFamily::Tentative => {
                "DELETE FROM tentative_pairings WHERE id = $1 RETURNING id"
            }
            PairingFamily::Confirmed => {
                "DELETE FROM confirmed_pairings WHERE id = $1 RETURNING id"
            }
        };

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(_) => {
                tracing::debug!("deleted {family} pairing {id}");
                Ok(())
            }
            None => Err(StoreError::NotFound { family, id }),
        }
    }
}
