//! Seed script for development: populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` (reads .env).

use anyhow::Context;
use sqlx::PgPool;

const ADMIN_PASSWORD: &str = "Test123!";

const MENUS: &[&str] = &["ACCOUNTS", "PAYROLL", "STORES", "SALES", "ADMIN"];
const PROGRAMMES: &[&str] = &["AP100", "AR200", "GL300", "PY400", "ST500", "SO600"];
const SEQUENCES: &[&str] = &["01", "02", "03", "10", "20"];
const FIRST_NAMES: &[&str] = &[
    "john", "joanna", "mary", "peter", "sarah", "david", "helen", "mark", "lucy", "tom", "anna",
    "james",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    println!("=== xum Seed Script ===");

    seed_accounts(&pool).await?;
    let usernames = seed_xpert_users(&pool).await?;
    seed_keys(&pool, &usernames).await?;

    println!("\n=== Seed complete! ===");
    println!("Admin login: admin / {ADMIN_PASSWORD}");

    Ok(())
}

async fn seed_accounts(pool: &PgPool) -> anyhow::Result<()> {
    let hash = xum::services::auth::hash_password(ADMIN_PASSWORD)?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM application_users WHERE user_name = 'admin')")
            .fetch_one(pool)
            .await?;

    if exists {
        sqlx::query("UPDATE application_users SET password_hash = $1 WHERE user_name = 'admin'")
            .bind(&hash)
            .execute(pool)
            .await?;
        println!("[done] Updated admin password");
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO application_users (full_name, user_name, password_hash, permission)
         VALUES ('Administrator', 'admin', $1, 'admin')",
    )
    .bind(&hash)
    .execute(pool)
    .await?;

    let viewer_hash = xum::services::auth::hash_password("viewer123")?;
    sqlx::query(
        "INSERT INTO application_users (full_name, user_name, password_hash, permission, date_assigned)
         VALUES ('Read Only Viewer', 'viewer', $1, 'user', NOW() - INTERVAL '12 days')",
    )
    .bind(&viewer_hash)
    .execute(pool)
    .await?;

    println!("[done] Created admin and viewer accounts");
    Ok(())
}

async fn seed_xpert_users(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let mut tx = pool.begin().await?;
    let mut usernames = Vec::new();

    for (i, name) in FIRST_NAMES.iter().cycle().take(48).enumerate() {
        let username = format!("{name}{:02}", i + 1);
        let menu = MENUS[i % MENUS.len()];
        // Every seventh user has no menu or description.
        let (description, menu) = if i % 7 == 6 {
            (None, None)
        } else {
            (Some(format!("{} clerk", capitalize(name))), Some(menu))
        };

        sqlx::query(
            "INSERT INTO xpert_users (username, description, menu) VALUES ($1, $2, $3)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(&username)
        .bind(description)
        .bind(menu)
        .execute(&mut *tx)
        .await?;
        usernames.push(username);
    }

    tx.commit().await?;
    println!("[done] Seeded {} xpert users", usernames.len());
    Ok(usernames)
}

async fn seed_keys(pool: &PgPool, usernames: &[String]) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for (i, username) in usernames.iter().enumerate() {
        for (j, programme) in PROGRAMMES.iter().enumerate().filter(|(j, _)| (i + j) % 3 != 0) {
            let sequence = SEQUENCES[(i + j) % SEQUENCES.len()];
            let flag = |n: usize| if (i + j + n) % 2 == 0 { Some("Y") } else { Some("N") };

            let result = sqlx::query(
                "INSERT INTO xpert_keys
                     (bbbenu, bbprog, bblfn3, bbpa02, bbpa06, bbpa07, bbpa08, bbpa09, bbpa10, bbpa11)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 ON CONFLICT (bbbenu, bbprog, bblfn3) DO NOTHING",
            )
            .bind(username)
            .bind(programme)
            .bind(sequence)
            .bind(flag(2))
            .bind(flag(6))
            .bind(flag(7))
            .bind(flag(8))
            .bind(flag(9))
            .bind(None::<&str>)
            .bind(flag(11))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
    }

    tx.commit().await?;
    println!("[done] Seeded {inserted} keys");
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
