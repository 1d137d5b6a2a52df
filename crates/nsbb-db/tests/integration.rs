use nsbb_db::{create_user, get_user_by_username, open_pool, run_migrations, DEFAULT_MAX_CONNECTIONS};

#[test]
fn pooled_connections_share_a_file_database() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("nsbb.db");
    let pool = open_pool(path.to_str().unwrap(), DEFAULT_MAX_CONNECTIONS)
        .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        run_migrations(&conn).expect("failed to run migrations");
        create_user(&conn, "alice").expect("failed to create user");
    }

    let conn = pool.get().expect("failed to get connection");
    let user = get_user_by_username(&conn, "alice")
        .expect("query should succeed")
        .expect("user should be visible from another connection");
    assert_eq!(user.username, "alice");

    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .expect("failed to prepare table query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to execute table query")
        .map(|r| r.expect("failed to read table name"))
        .collect();
    assert_eq!(tables, vec!["_nsbb_migrations", "posts", "users"]);
}
