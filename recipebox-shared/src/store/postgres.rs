/// PostgreSQL store
///
/// Thin adapter from [`Store`] to the model operations in
/// [`crate::models`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Store, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    auth_token::AuthToken,
    recipe::{CreateRecipe, Recipe, UpdateRecipe},
    tag::{Tag, UpdateTag},
    user::{CreateUser, UpdateUser, User},
};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, id, data).await?)
    }

    async fn create_token(&self, user_id: i64) -> StoreResult<(AuthToken, String)> {
        Ok(AuthToken::create(&self.pool, user_id).await?)
    }

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(AuthToken::find_user(&self.pool, token).await?)
    }

    async fn list_recipes(&self, owner: i64) -> StoreResult<Vec<Recipe>> {
        Ok(Recipe::list_by_user(&self.pool, owner).await?)
    }

    async fn find_recipe(&self, owner: i64, id: i64) -> StoreResult<Option<Recipe>> {
        Ok(Recipe::find_for_user(&self.pool, id, owner).await?)
    }

    async fn create_recipe(&self, data: CreateRecipe) -> StoreResult<Recipe> {
        Ok(Recipe::create(&self.pool, data).await?)
    }

    async fn update_recipe(
        &self,
        owner: i64,
        id: i64,
        data: UpdateRecipe,
    ) -> StoreResult<Option<Recipe>> {
        Ok(Recipe::update_for_user(&self.pool, id, owner, data).await?)
    }

    async fn delete_recipe(&self, owner: i64, id: i64) -> StoreResult<bool> {
        Ok(Recipe::delete_for_user(&self.pool, id, owner).await?)
    }

    async fn list_tags(&self, owner: i64) -> StoreResult<Vec<Tag>> {
        Ok(Tag::list_by_user(&self.pool, owner).await?)
    }

    async fn update_tag(&self, owner: i64, id: i64, data: UpdateTag) -> StoreResult<Option<Tag>> {
        Ok(Tag::update_for_user(&self.pool, id, owner, data).await?)
    }
}
