/// Recipe model and database operations
///
/// Every query is scoped by the owning user's ID. There is no way to read or
/// write a recipe without naming its owner, so a foreign recipe is simply not
/// found.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE recipes (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     time_minutes INTEGER NOT NULL,
///     price NUMERIC(5, 2) NOT NULL,
///     link VARCHAR(255) NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE recipe_tags (
///     recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
///     tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (recipe_id, tag_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use recipebox_shared::models::recipe::{CreateRecipe, Price, Recipe};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let recipe = Recipe::create(&pool, CreateRecipe {
///     user_id,
///     title: "Sample recipe".to_string(),
///     description: String::new(),
///     time_minutes: 22,
///     price: Price::parse("5.25")?,
///     link: String::new(),
///     tags: vec!["Dinner".to_string()],
/// }).await?;
///
/// let mine = Recipe::list_by_user(&pool, user_id).await?;
/// assert_eq!(mine[0].id, recipe.id);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use sqlx::{PgConnection, PgPool};

use super::tag::Tag;

/// Maximum digits before the decimal point (NUMERIC(5, 2))
const PRICE_INTEGER_DIGITS: usize = 3;

/// Digits after the decimal point
const PRICE_DECIMAL_PLACES: usize = 2;

/// Error returned when a price cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("A valid number is required")]
    Invalid,

    #[error("Ensure that there are no more than 2 decimal places")]
    TooManyDecimalPlaces,

    #[error("Ensure that there are no more than 3 digits before the decimal point")]
    TooManyDigits,
}

/// Fixed-point price with two decimal places
///
/// Kept in its canonical text form (`"5.50"`), which is also how PostgreSQL
/// renders a `NUMERIC(5, 2)` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price(String);

impl Price {
    /// Parses and normalizes a decimal price
    ///
    /// # Example
    ///
    /// ```
    /// use recipebox_shared::models::recipe::{Price, PriceError};
    ///
    /// assert_eq!(Price::parse("5.5").unwrap().as_str(), "5.50");
    /// assert_eq!(Price::parse("007").unwrap().as_str(), "7.00");
    /// assert_eq!(Price::parse("1.234"), Err(PriceError::TooManyDecimalPlaces));
    /// assert_eq!(Price::parse("1000"), Err(PriceError::TooManyDigits));
    /// ```
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let input = input.trim();
        let (negative, unsigned) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };

        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if integer.is_empty() && fraction.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Invalid);
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > PRICE_DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces);
        }

        let integer = integer.trim_start_matches('0');
        if integer.len() > PRICE_INTEGER_DIGITS {
            return Err(PriceError::TooManyDigits);
        }

        let integer = if integer.is_empty() { "0" } else { integer };
        let is_zero = integer == "0" && fraction.is_empty();
        let sign = if negative && !is_zero { "-" } else { "" };

        Ok(Price(format!(
            "{}{}.{:0<width$}",
            sign,
            integer,
            fraction,
            width = PRICE_DECIMAL_PLACES
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Recipe owned by a single user, with its tags
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,

    /// Owning user, set server-side on create and never changed
    #[serde(skip)]
    pub user_id: i64,

    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,

    /// Tags in name order
    pub tags: Vec<Tag>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a recipe
#[derive(Debug, Clone)]
pub struct CreateRecipe {
    /// Owner, always the authenticated caller
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,

    /// Tag names, resolved with get-or-create among the owner's tags
    pub tags: Vec<String>,
}

/// Input for updating a recipe
///
/// Only non-None fields are written. `tags: Some(..)` replaces the tag set.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    time_minutes: i32,
    price: String,
    link: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecipeRow {
    fn into_recipe(self, tags: Vec<Tag>) -> Recipe {
        Recipe {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            time_minutes: self.time_minutes,
            price: Price(self.price),
            link: self.link,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const RECIPE_COLUMNS: &str = "id, user_id, title, description, time_minutes, \
     price::TEXT AS price, link, created_at, updated_at";

impl Recipe {
    /// Lists a user's recipes, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM recipes WHERE user_id = $1 ORDER BY id DESC",
            RECIPE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&query)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        attach_tags(&mut conn, rows).await
    }

    /// Finds a recipe owned by `user_id`
    pub async fn find_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        find_row(&mut conn, id, user_id).await
    }

    /// Creates a recipe and attaches its tags in one transaction
    pub async fn create(pool: &PgPool, data: CreateRecipe) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO recipes (user_id, title, description, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5::NUMERIC, $6)
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipeRow>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.time_minutes)
            .bind(data.price.0)
            .bind(data.link)
            .fetch_one(&mut *tx)
            .await?;

        let tags = replace_tags(&mut tx, row.id, row.user_id, &data.tags).await?;
        tx.commit().await?;

        Ok(row.into_recipe(tags))
    }

    /// Updates a recipe owned by `user_id`
    ///
    /// # Returns
    ///
    /// The updated recipe, or None if the user owns no recipe with this ID
    pub async fn update_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        data: UpdateRecipe,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            r#"
            UPDATE recipes SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                time_minutes = COALESCE($5, time_minutes),
                price = COALESCE($6::NUMERIC, price),
                link = COALESCE($7, link),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipeRow>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.time_minutes)
            .bind(data.price.map(|p| p.0))
            .bind(data.link)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = match data.tags {
            Some(names) => replace_tags(&mut tx, row.id, row.user_id, &names).await?,
            None => tags_by_recipe(&mut tx, &[row.id])
                .await?
                .remove(&row.id)
                .unwrap_or_default(),
        };
        tx.commit().await?;

        Ok(Some(row.into_recipe(tags)))
    }

    /// Deletes a recipe owned by `user_id`
    ///
    /// # Returns
    ///
    /// True if a recipe was deleted
    pub async fn delete_for_user(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn find_row(
    conn: &mut PgConnection,
    id: i64,
    user_id: i64,
) -> Result<Option<Recipe>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM recipes WHERE id = $1 AND user_id = $2",
        RECIPE_COLUMNS
    );
    let row = sqlx::query_as::<_, RecipeRow>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(attach_tags(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn tags_by_recipe(
    conn: &mut PgConnection,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, sqlx::Error> {
    let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
    for (recipe_id, tag) in Tag::list_for_recipes(conn, recipe_ids).await? {
        grouped.entry(recipe_id).or_default().push(tag);
    }
    Ok(grouped)
}

async fn attach_tags(
    conn: &mut PgConnection,
    rows: Vec<RecipeRow>,
) -> Result<Vec<Recipe>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut tags = tags_by_recipe(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let recipe_tags = tags.remove(&row.id).unwrap_or_default();
            row.into_recipe(recipe_tags)
        })
        .collect())
}

/// Replaces a recipe's tag set with the owner's tags of the given names
async fn replace_tags(
    conn: &mut PgConnection,
    recipe_id: i64,
    user_id: i64,
    names: &[String],
) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
    for name in names {
        let tag = Tag::get_or_create(conn, user_id, name).await?;
        if tags.iter().any(|t| t.id == tag.id) {
            continue;
        }

        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
        tags.push(tag);
    }

    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_parse_normalizes() {
        assert_eq!(Price::parse("5").unwrap().as_str(), "5.00");
        assert_eq!(Price::parse("5.5").unwrap().as_str(), "5.50");
        assert_eq!(Price::parse("5.25").unwrap().as_str(), "5.25");
        assert_eq!(Price::parse(".5").unwrap().as_str(), "0.50");
        assert_eq!(Price::parse("5.").unwrap().as_str(), "5.00");
        assert_eq!(Price::parse("999.99").unwrap().as_str(), "999.99");
        assert_eq!(Price::parse("1.500").unwrap().as_str(), "1.50");
        assert_eq!(Price::parse(" 12.3 ").unwrap().as_str(), "12.30");
        assert_eq!(Price::parse("-2.1").unwrap().as_str(), "-2.10");
        assert_eq!(Price::parse("-0").unwrap().as_str(), "0.00");
    }

    #[test]
    fn test_price_parse_rejects() {
        assert_eq!(Price::parse(""), Err(PriceError::Invalid));
        assert_eq!(Price::parse("."), Err(PriceError::Invalid));
        assert_eq!(Price::parse("abc"), Err(PriceError::Invalid));
        assert_eq!(Price::parse("1.2.3"), Err(PriceError::Invalid));
        assert_eq!(Price::parse("1e3"), Err(PriceError::Invalid));
        assert_eq!(Price::parse("1.234"), Err(PriceError::TooManyDecimalPlaces));
        assert_eq!(Price::parse("1000"), Err(PriceError::TooManyDigits));
    }

    #[test]
    fn test_price_serializes_as_string() {
        let price = Price::parse("5.5").unwrap();
        assert_eq!(serde_json::to_value(&price).unwrap(), serde_json::json!("5.50"));
        assert_eq!(price.to_string(), "5.50");
    }
}
