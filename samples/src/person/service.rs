//! Person queries. File-based templates for the list/search/update paths, inline 2-Way SQL for
//! lookup and insert.

use clione_sql_boot::{ClioneError, ClioneSqlTemplate, Params, ResultMap};

#[derive(Clone)]
pub struct PersonService {
    sql: ClioneSqlTemplate,
}

impl PersonService {
    pub fn new(sql: ClioneSqlTemplate) -> Self {
        Self { sql }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vec<ResultMap>, ClioneError> {
        self.sql
            .transaction(|| async {
                self.sql
                    .use_file("sql/person/SelectByName.sql")
                    .await?
                    .find_all(&Params::new().with("name", name))
                    .await
            })
            .await
    }

    pub async fn find_all(&self) -> Result<Vec<ResultMap>, ClioneError> {
        self.sql
            .transaction(|| async {
                self.sql
                    .use_file("sql/person/SelectAll.sql")
                    .await?
                    .find_all(&Params::new())
                    .await
            })
            .await
    }

    /// Rows affected.
    pub async fn update_status(&self, id: i64, status: &str) -> Result<u64, ClioneError> {
        self.sql
            .transaction(|| async {
                self.sql
                    .use_file("sql/person/UpdateStatus.sql")
                    .await?
                    .update(&Params::new().with("id", id).with("status", status))
                    .await
            })
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ResultMap>, ClioneError> {
        self.sql
            .transaction(|| async {
                self.sql
                    .use_sql("SELECT id, name, status, created_at FROM person WHERE id = /* id */'1'")
                    .await?
                    .find(&Params::new().with("id", id))
                    .await
            })
            .await
    }

    pub async fn insert(&self, id: i64, name: &str, status: &str) -> Result<u64, ClioneError> {
        self.sql
            .transaction(|| async {
                self.sql
                    .use_sql(
                        "INSERT INTO person (id, name, status) VALUES (/* id */'0', /* name */'dummy', /* status */'ACTIVE')",
                    )
                    .await?
                    .update(&Params::new().with("id", id).with("name", name).with("status", status))
                    .await
            })
            .await
    }
}
