use sqlx::SqlitePool;

use crate::models::{Membership, User};

/// Create a user together with their customer record.
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: Option<&str>,
    is_staff: bool,
) -> Result<User, sqlx::Error> {
    let user = User::new(name.to_string(), email.map(str::to_string), is_staff);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, invite_code, is_staff, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.invite_code)
    .bind(user.is_staff)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO customers (user_id, phone, membership) VALUES (?, '', ?)")
        .bind(&user.id)
        .bind(Membership::default())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    println!("Created user:");
    println!("  ID: {}", user.id);
    println!("  Name: {}", user.name);
    println!("  Staff: {}", user.is_staff);
    println!("  Invite Code: {}", user.invite_code);

    Ok(user)
}
