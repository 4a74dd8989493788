pub mod models;

use sqlx::{postgres::PgPoolOptions, PgPool};

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/portfolio".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Mask everything but the URL skeleton so credentials never reach the logs.
fn redact_url(url: &str) -> String {
    url.replace(
        |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
        "*",
    )
}

pub async fn init_pool(config: Option<DbConfig>) -> Result<PgPool, sqlx::Error> {
    let config = config.unwrap_or_default();

    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", redact_url(&config.url));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profile (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL DEFAULT '',
            title TEXT NOT NULL DEFAULT '',
            bio TEXT NOT NULL DEFAULT '',
            avatar_url TEXT,
            email TEXT,
            years_of_experience INTEGER NOT NULL DEFAULT 0,
            companies INTEGER NOT NULL DEFAULT 0,
            core_competencies TEXT[] NOT NULL DEFAULT '{}',
            specialized_skills TEXT[] NOT NULL DEFAULT '{}',
            approach_text TEXT NOT NULL DEFAULT '',
            security_audits_count INTEGER NOT NULL DEFAULT 0,
            vulnerabilities_count INTEGER NOT NULL DEFAULT 0,
            architectures_count INTEGER NOT NULL DEFAULT 0,
            certifications_count INTEGER NOT NULL DEFAULT 0,
            github_url TEXT,
            linkedin_url TEXT,
            twitter_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            github_url TEXT,
            live_url TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            technologies TEXT[] NOT NULL DEFAULT '{}',
            details JSONB NOT NULL DEFAULT '{}'::jsonb,
            color TEXT NOT NULL DEFAULT 'from-cyan-500 to-blue-500',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS experiences (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            company TEXT NOT NULL,
            position TEXT NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE,
            current BOOLEAN NOT NULL DEFAULT false,
            mission TEXT NOT NULL DEFAULT '',
            achievements TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT experiences_current_has_no_end CHECK (NOT current OR end_date IS NULL)
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS skills (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            level INTEGER NOT NULL DEFAULT 0 CHECK (level BETWEEN 0 AND 100),
            icon TEXT NOT NULL DEFAULT '💻',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'unread'
                CHECK (status IN ('unread', 'read', 'replied')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blogs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            excerpt TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            published BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        r#"
        CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_experiences_start_date ON experiences(start_date DESC);
        CREATE INDEX IF NOT EXISTS idx_skills_category ON skills(category);
        CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_blogs_pub_created ON blogs(published, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_blogs_tags ON blogs USING GIN(tags)
        "#,
    )
    .execute(pool)
    .await?;

    // Every row change is announced on the `table_changes` channel as
    // {"table": <name>, "op": "INSERT" | "UPDATE" | "DELETE"}.
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION notify_table_change() RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify(
                'table_changes',
                json_build_object('table', TG_TABLE_NAME, 'op', TG_OP)::text
            );
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(pool)
    .await?;

    for table in crate::store::Table::ALL {
        let name = table.name();
        let sql = format!(
            "DROP TRIGGER IF EXISTS {name}_changes ON {name}; \
             CREATE TRIGGER {name}_changes AFTER INSERT OR UPDATE OR DELETE ON {name} \
             FOR EACH ROW EXECUTE FUNCTION notify_table_change()"
        );
        // Two statements, so this goes over the simple query protocol.
        sqlx::raw_sql(&sql).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
