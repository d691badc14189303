use clione_sql_boot::sql::SqlFileLoader;
use clione_sql_boot::{
    ClioneError, ClioneSqlExceptionTranslator, ClioneSqlProperties, ClioneSqlTemplate, Dialect, FailureCategory,
    Params, PersistenceExceptionTranslator, TransactionAwareDataSource, Translation,
};
use serde::Deserialize;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

mod person {
    pub struct PersonRepository;
}

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
    id: i64,
    name: String,
}

async fn memory_pool() -> AnyPool {
    sqlx::any::install_default_drivers();
    AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite")
}

async fn template_with(properties: ClioneSqlProperties) -> ClioneSqlTemplate {
    let template = ClioneSqlTemplate::new(memory_pool().await, properties);
    template
        .use_sql("CREATE TABLE test_person (id INTEGER PRIMARY KEY, name VARCHAR(100))")
        .await
        .unwrap()
        .update(&Params::new())
        .await
        .unwrap();
    template
}

async fn count(template: &ClioneSqlTemplate, id: i64) -> i64 {
    template
        .use_sql("SELECT COUNT(*) AS cnt FROM test_person WHERE id = /* id */0")
        .await
        .unwrap()
        .find(&Params::new().with("id", id))
        .await
        .unwrap()
        .and_then(|r| r.get_i64("cnt"))
        .unwrap()
}

async fn insert(template: &ClioneSqlTemplate, id: i64, name: &str) -> Result<u64, ClioneError> {
    template
        .use_sql("INSERT INTO test_person (id, name) VALUES (/* id */1, /* name */'test')")
        .await?
        .update(&Params::new().with("id", id).with("name", name))
        .await
}

#[tokio::test]
async fn inline_insert_then_count() {
    let template = template_with(ClioneSqlProperties::default()).await;
    assert_eq!(insert(&template, 1, "Alice").await.unwrap(), 1);
    assert_eq!(count(&template, 1).await, 1);

    let people: Vec<Person> = template
        .use_sql("SELECT id, name FROM test_person WHERE name = /* name */'x'")
        .await
        .unwrap()
        .find_all_as(&Params::new().with("name", "Alice"))
        .await
        .unwrap();
    assert_eq!(
        people,
        vec![Person {
            id: 1,
            name: "Alice".into()
        }]
    );
}

#[tokio::test]
async fn wrapping_is_idempotent() {
    let pool = memory_pool().await;
    let source = TransactionAwareDataSource::new(pool.clone());
    assert_eq!(TransactionAwareDataSource::new(pool), source);
    let rewrapped = TransactionAwareDataSource::wrap(source.clone());
    assert_eq!(rewrapped, source);

    let template = ClioneSqlTemplate::new(source.clone(), ClioneSqlProperties::default());
    assert_eq!(template.data_source(), &source);

    let separate = TransactionAwareDataSource::new(memory_pool().await);
    assert_ne!(separate, source);
}

#[tokio::test]
async fn dialect_is_detected_or_configured() {
    let detected = template_with(ClioneSqlProperties::default()).await;
    assert_eq!(detected.use_sql("SELECT 1").await.unwrap().dialect(), Dialect::Sqlite);

    let mut properties = ClioneSqlProperties::default();
    properties.set_product_name(Some("postgres".into()));
    let configured = ClioneSqlTemplate::new(memory_pool().await, properties);
    let executor = configured
        .use_sql("SELECT * FROM test_person WHERE id = /* id */1 AND name = /* name */'a'")
        .await
        .unwrap();
    assert_eq!(executor.dialect(), Dialect::Postgres);
    let bound = executor.render(&Params::new().with("id", 1).with("name", "b")).unwrap();
    assert_eq!(bound.sql, "SELECT * FROM test_person WHERE id = $1 AND name = $2");
}

#[tokio::test]
async fn transaction_commits_on_ok() {
    let template = template_with(ClioneSqlProperties::default()).await;
    let inner = template.clone();
    let seen: Result<i64, ClioneError> = template
        .transaction(|| async move {
            insert(&inner, 7, "Carol").await?;
            let executor = inner.use_sql("SELECT 1").await?;
            assert!(executor.is_transactional());
            Ok(count(&inner, 7).await)
        })
        .await;
    assert_eq!(seen.unwrap(), 1);
    assert_eq!(count(&template, 7).await, 1);
    assert!(!template.use_sql("SELECT 1").await.unwrap().is_transactional());
}

#[tokio::test]
async fn transaction_rolls_back_on_err() {
    let template = template_with(ClioneSqlProperties::default()).await;
    let inner = template.clone();
    let result: Result<(), ClioneError> = template
        .transaction(|| async move {
            insert(&inner, 8, "Dave").await?;
            Err(ClioneError::Format("abort".into()))
        })
        .await;
    assert!(result.is_err());
    assert_eq!(count(&template, 8).await, 0);
}

#[tokio::test]
async fn nested_transactions_join() {
    let template = template_with(ClioneSqlProperties::default()).await;
    let outer = template.clone();
    let result: Result<(), ClioneError> = template
        .transaction(|| async move {
            let nested = outer.clone();
            outer
                .transaction(|| async move {
                    insert(&nested, 9, "Erin").await?;
                    Ok::<_, ClioneError>(())
                })
                .await?;
            Err(ClioneError::Format("abort outer".into()))
        })
        .await;
    assert!(result.is_err());
    assert_eq!(count(&template, 9).await, 0);
}

#[tokio::test]
async fn templates_on_one_pool_share_the_transaction() {
    sqlx::any::install_default_drivers();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("shared.db").display());
    let pool = AnyPoolOptions::new().max_connections(2).connect(&url).await.unwrap();

    let a = ClioneSqlTemplate::new(pool.clone(), ClioneSqlProperties::default());
    let b = ClioneSqlTemplate::new(pool.clone(), ClioneSqlProperties::default());
    assert!(!a.same_instance(&b));
    assert_eq!(a.data_source(), b.data_source());
    a.use_sql("CREATE TABLE test_person (id INTEGER PRIMARY KEY, name VARCHAR(100))")
        .await
        .unwrap()
        .update(&Params::new())
        .await
        .unwrap();

    let other = b.clone();
    let result: Result<(), ClioneError> = a
        .transaction(|| async move {
            assert!(other.use_sql("SELECT 1").await?.is_transactional());
            insert(&other, 11, "Frank").await?;
            Err(ClioneError::Format("abort".into()))
        })
        .await;
    assert!(result.is_err());
    assert_eq!(count(&b, 11).await, 0);
    assert_eq!(count(&a, 11).await, 0);
}

#[tokio::test]
async fn unique_violation_is_duplicate_key() {
    let template = template_with(ClioneSqlProperties::default()).await;
    insert(&template, 1, "Alice").await.unwrap();
    let err = insert(&template, 1, "Again").await.unwrap_err();
    assert!(matches!(err, ClioneError::DuplicateKey { .. }), "{err:?}");
    match ClioneSqlExceptionTranslator::new().translate_if_possible(Box::new(err)) {
        Translation::Translated(e) => assert_eq!(e.category(), FailureCategory::DuplicateKey),
        Translation::Unrecognized(e) => panic!("not translated: {e}"),
    }
}

#[tokio::test]
async fn missing_parameter_and_bad_sql() {
    let template = template_with(ClioneSqlProperties::default()).await;
    let err = template
        .use_sql("SELECT * FROM test_person WHERE id = /* id */1")
        .await
        .unwrap()
        .find(&Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClioneError::ParameterNotFound(name) if name == "id"));

    let err = template
        .use_sql("SELECT * FROM no_such_table")
        .await
        .unwrap()
        .find_all(&Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClioneError::Sql(_)));
    assert!(matches!(
        ClioneSqlExceptionTranslator::classify(&err),
        FailureCategory::SqlStateDerived(_)
    ));

    let err = template.use_sql("SELECT '/* never closed").await.unwrap_err();
    assert!(matches!(err, ClioneError::Format(_)));
}

#[tokio::test]
async fn closed_pool_is_connection_not_found() {
    let pool = memory_pool().await;
    let template = ClioneSqlTemplate::new(pool.clone(), ClioneSqlProperties::default());
    pool.close().await;
    let err = template.use_sql("SELECT 1").await.unwrap_err();
    assert!(matches!(err, ClioneError::ConnectionNotFound { .. }));
    assert_eq!(ClioneSqlExceptionTranslator::classify(&err), FailureCategory::ResourceFailure);
}

#[tokio::test]
async fn sql_files_resolve_against_root_and_types() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("sql/person")).unwrap();
    std::fs::write(
        dir.path().join("sql/person/SelectByName.sql"),
        "SELECT id, name FROM test_person WHERE name = /* name */'dummy' ORDER BY id",
    )
    .unwrap();
    let relative = SqlFileLoader::path_relative_to::<person::PersonRepository>("SelectAll.sql");
    std::fs::create_dir_all(dir.path().join(relative.parent().unwrap())).unwrap();
    std::fs::write(dir.path().join(&relative), "SELECT id, name FROM test_person ORDER BY id").unwrap();

    let mut properties = ClioneSqlProperties::default();
    properties.set_sql_file_root(Some(dir.path().to_string_lossy().into_owned()));
    let template = template_with(properties).await;
    insert(&template, 1, "Alice").await.unwrap();
    insert(&template, 2, "Bob").await.unwrap();

    let rows = template
        .use_file("sql/person/SelectByName.sql")
        .await
        .unwrap()
        .find_all(&Params::new().with("name", "Bob"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_str("name"), Some("Bob"));

    let all = template
        .use_file_for::<person::PersonRepository>("SelectAll.sql")
        .await
        .unwrap()
        .find_all(&Params::new())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let err = template.use_file("sql/person/Missing.sql").await.unwrap_err();
    assert!(matches!(err, ClioneError::SqlFileNotFound { .. }));
    assert_eq!(
        ClioneSqlExceptionTranslator::classify(&err),
        FailureCategory::NonTransientResourceFailure
    );
}
