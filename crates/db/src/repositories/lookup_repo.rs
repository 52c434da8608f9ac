//! Get-or-create access to the lookup tables.

use roadsim_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::lookup::{DiseaseType, LookupRow, LookupTable};
use crate::DbPool;

pub struct LookupRepo;

impl LookupRepo {
    /// Return the id of the `(name, code)` row in `table`, inserting it first
    /// if no row has that name.
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
        table: LookupTable,
        name: &str,
        code: &str,
    ) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (name, code) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET name = excluded.name
             RETURNING id",
            table.table_name()
        );
        sqlx::query_scalar::<_, DbId>(&query)
            .bind(name)
            .bind(code)
            .fetch_one(conn)
            .await
    }

    /// Return the id of the disease type called `name`, inserting it first if
    /// it does not exist.
    pub async fn get_or_create_disease(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO disease_type (name) VALUES (?1)
             ON CONFLICT (name) DO UPDATE SET name = excluded.name
             RETURNING id",
        )
        .bind(name)
        .fetch_one(conn)
        .await
    }

    /// List every row of `table` ordered by name.
    pub async fn list(pool: &DbPool, table: LookupTable) -> Result<Vec<LookupRow>, sqlx::Error> {
        let query = format!(
            "SELECT id, name, code FROM {} ORDER BY name ASC",
            table.table_name()
        );
        sqlx::query_as::<_, LookupRow>(&query).fetch_all(pool).await
    }

    pub async fn list_diseases(pool: &DbPool) -> Result<Vec<DiseaseType>, sqlx::Error> {
        sqlx::query_as::<_, DiseaseType>(
            "SELECT id, name, description FROM disease_type ORDER BY name ASC",
        )
        .fetch_all(pool)
        .await
    }
}
