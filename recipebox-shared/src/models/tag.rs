/// Tag model and database operations
///
/// Every query takes the owning user's ID; a tag belonging to someone else
/// behaves exactly like a tag that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     UNIQUE (user_id, name)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Label owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,

    /// Owning user
    #[serde(skip)]
    pub user_id: i64,

    pub name: String,
}

/// Input for updating a tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
}

impl Tag {
    /// Lists a user's tags in alphabetical order
    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, user_id, name
            FROM tags
            WHERE user_id = $1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Updates a tag owned by `user_id`
    ///
    /// # Returns
    ///
    /// The updated tag, or None if the user owns no tag with this ID
    pub async fn update_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        data: UpdateTag,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET name = COALESCE($3, name)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.name)
        .fetch_optional(pool)
        .await
    }

    /// Returns the user's tag with this name, creating it if needed
    pub async fn get_or_create(
        conn: &mut PgConnection,
        user_id: i64,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        // The no-op update makes RETURNING yield the existing row on conflict
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, user_id, name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(conn)
        .await
    }

    /// Lists the tags attached to each of the given recipes
    ///
    /// Rows come back ordered by recipe, then tag name.
    pub async fn list_for_recipes(
        conn: &mut PgConnection,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, Self)>, sqlx::Error> {
        let rows: Vec<(i64, i64, i64, String)> = sqlx::query_as(
            r#"
            SELECT rt.recipe_id, t.id, t.user_id, t.name
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY rt.recipe_id, t.name
            "#,
        )
        .bind(recipe_ids.to_vec())
        .fetch_all(conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(recipe_id, id, user_id, name)| (recipe_id, Tag { id, user_id, name }))
            .collect())
    }
}
