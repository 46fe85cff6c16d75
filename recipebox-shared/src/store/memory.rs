/// In-memory store
///
/// Same semantics as the PostgreSQL store (owner scoping, ordering,
/// uniqueness rules, tag get-or-create) over in-process tables. Used by the
/// API test suite, which therefore runs without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::auth::token::{constant_time_compare, generate_token, hash_token, token_prefix};
use crate::models::{
    auth_token::AuthToken,
    recipe::{CreateRecipe, Price, Recipe, UpdateRecipe},
    tag::{Tag, UpdateTag},
    user::{normalize_email, CreateUser, UpdateUser, User},
};

struct RecipeRecord {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    time_minutes: i32,
    price: Price,
    link: String,
    tag_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    tokens: Vec<AuthToken>,
    tags: BTreeMap<i64, Tag>,
    recipes: BTreeMap<i64, RecipeRecord>,
}

impl Tables {
    /// Ids are shared across tables and strictly increasing
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn get_or_create_tag(&mut self, user_id: i64, name: &str) -> i64 {
        if let Some(tag) = self
            .tags
            .values()
            .find(|t| t.user_id == user_id && t.name == name)
        {
            return tag.id;
        }

        let id = self.next_id();
        self.tags.insert(
            id,
            Tag {
                id,
                user_id,
                name: name.to_string(),
            },
        );
        id
    }

    fn resolve_tags(&mut self, user_id: i64, names: &[String]) -> Vec<i64> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = self.get_or_create_tag(user_id, name);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    fn to_recipe(&self, record: &RecipeRecord) -> Recipe {
        let mut tags: Vec<Tag> = record
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Recipe {
            id: record.id,
            user_id: record.user_id,
            title: record.title.clone(),
            description: record.description.clone(),
            time_minutes: record.time_minutes,
            price: record.price.clone(),
            link: record.link.clone(),
            tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Store holding all records in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        let email = normalize_email(&data.email);
        if tables.email_taken(&email, None) {
            return Err(StoreError::email_taken());
        }

        let id = tables.next_id();
        let now = Utc::now();
        let user = User {
            id,
            email,
            name: data.name,
            password_hash: data.password_hash,
            is_active: true,
            is_staff: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let tables = self.tables.read().await;

        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        let email = data.email.as_deref().map(normalize_email);
        if let Some(ref email) = email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::email_taken());
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = email {
            user.email = email;
        }
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_active) = data.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn create_token(&self, user_id: i64) -> StoreResult<(AuthToken, String)> {
        let mut tables = self.tables.write().await;

        let (plaintext, digest) = generate_token();
        let token = AuthToken {
            id: tables.next_id(),
            user_id,
            token_hash: digest,
            token_prefix: token_prefix(&plaintext),
            created_at: Utc::now(),
            last_used_at: None,
        };
        tables.tokens.push(token.clone());

        Ok((token, plaintext))
    }

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        let digest = hash_token(token);
        let Some(stored) = tables
            .tokens
            .iter_mut()
            .find(|t| constant_time_compare(&t.token_hash, &digest))
        else {
            return Ok(None);
        };
        stored.last_used_at = Some(Utc::now());
        let user_id = stored.user_id;

        Ok(tables.users.get(&user_id).cloned())
    }

    async fn list_recipes(&self, owner: i64) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables.read().await;

        Ok(tables
            .recipes
            .values()
            .rev()
            .filter(|r| r.user_id == owner)
            .map(|r| tables.to_recipe(r))
            .collect())
    }

    async fn find_recipe(&self, owner: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let tables = self.tables.read().await;

        Ok(tables
            .recipes
            .get(&id)
            .filter(|r| r.user_id == owner)
            .map(|r| tables.to_recipe(r)))
    }

    async fn create_recipe(&self, data: CreateRecipe) -> StoreResult<Recipe> {
        let mut tables = self.tables.write().await;

        let id = tables.next_id();
        let tag_ids = tables.resolve_tags(data.user_id, &data.tags);
        let now = Utc::now();
        let record = RecipeRecord {
            id,
            user_id: data.user_id,
            title: data.title,
            description: data.description,
            time_minutes: data.time_minutes,
            price: data.price,
            link: data.link,
            tag_ids,
            created_at: now,
            updated_at: now,
        };
        let recipe = tables.to_recipe(&record);
        tables.recipes.insert(id, record);

        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        owner: i64,
        id: i64,
        data: UpdateRecipe,
    ) -> StoreResult<Option<Recipe>> {
        let mut tables = self.tables.write().await;

        if !tables.recipes.get(&id).is_some_and(|r| r.user_id == owner) {
            return Ok(None);
        }

        let tag_ids = data.tags.map(|names| tables.resolve_tags(owner, &names));

        let Some(record) = tables.recipes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = data.title {
            record.title = title;
        }
        if let Some(description) = data.description {
            record.description = description;
        }
        if let Some(time_minutes) = data.time_minutes {
            record.time_minutes = time_minutes;
        }
        if let Some(price) = data.price {
            record.price = price;
        }
        if let Some(link) = data.link {
            record.link = link;
        }
        if let Some(tag_ids) = tag_ids {
            record.tag_ids = tag_ids;
        }
        record.updated_at = Utc::now();

        let recipe = tables.recipes.get(&id).map(|r| tables.to_recipe(r));
        Ok(recipe)
    }

    async fn delete_recipe(&self, owner: i64, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.recipes.get(&id).is_some_and(|r| r.user_id == owner) {
            tables.recipes.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn list_tags(&self, owner: i64) -> StoreResult<Vec<Tag>> {
        let tables = self.tables.read().await;

        let mut tags: Vec<Tag> = tables
            .tags
            .values()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(tags)
    }

    async fn update_tag(&self, owner: i64, id: i64, data: UpdateTag) -> StoreResult<Option<Tag>> {
        let mut tables = self.tables.write().await;

        if !tables.tags.get(&id).is_some_and(|t| t.user_id == owner) {
            return Ok(None);
        }

        if let Some(ref name) = data.name {
            let taken = tables
                .tags
                .values()
                .any(|t| t.user_id == owner && t.id != id && &t.name == name);
            if taken {
                return Err(StoreError::tag_name_taken());
            }
        }

        let Some(tag) = tables.tags.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            tag.name = name;
        }

        Ok(Some(tag.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                name: "Cook".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn recipe(user_id: i64, title: &str, tags: &[&str]) -> CreateRecipe {
        CreateRecipe {
            user_id,
            title: title.to_string(),
            description: String::new(),
            time_minutes: 10,
            price: Price::parse("5.00").unwrap(),
            link: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_find_user_by_id() {
        let store = MemoryStore::new();
        let created = user(&store, "cook@example.com").await;

        let found = store.find_user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.email, "cook@example.com");
        assert!(found.is_active);

        assert!(store.find_user_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "dup@example.com").await;

        let err = store
            .create_user(CreateUser {
                email: "dup@EXAMPLE.com".to_string(),
                name: "Other".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict { field: "email", .. }));
    }

    #[tokio::test]
    async fn test_recipes_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;

        let first = store.create_recipe(recipe(alice.id, "First", &[])).await.unwrap();
        let theirs = store.create_recipe(recipe(bob.id, "Bob's", &[])).await.unwrap();
        let second = store.create_recipe(recipe(alice.id, "Second", &[])).await.unwrap();

        let ids: Vec<i64> = store
            .list_recipes(alice.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(store.find_recipe(alice.id, theirs.id).await.unwrap().is_none());
        assert!(store
            .update_recipe(alice.id, theirs.id, UpdateRecipe::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_recipe(alice.id, theirs.id).await.unwrap());
        assert!(store.find_recipe(bob.id, theirs.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recipe_tags_get_or_create() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;

        let r1 = store
            .create_recipe(recipe(alice.id, "Curry", &["Vegan", "Dinner", "Vegan"]))
            .await
            .unwrap();
        let names: Vec<&str> = r1.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Dinner", "Vegan"]);

        store
            .create_recipe(recipe(alice.id, "Salad", &["Vegan"]))
            .await
            .unwrap();
        store
            .create_recipe(recipe(bob.id, "Stew", &["Vegan"]))
            .await
            .unwrap();

        assert_eq!(store.list_tags(alice.id).await.unwrap().len(), 2);
        assert_eq!(store.list_tags(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_recipe_tags_replaced_only_when_given() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let created = store
            .create_recipe(recipe(alice.id, "Curry", &["Dinner"]))
            .await
            .unwrap();

        let updated = store
            .update_recipe(
                alice.id,
                created.id,
                UpdateRecipe {
                    title: Some("Thai curry".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Thai curry");
        assert_eq!(updated.tags.len(), 1);

        let updated = store
            .update_recipe(
                alice.id,
                created.id,
                UpdateRecipe {
                    tags: Some(vec!["Lunch".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].name, "Lunch");
    }

    #[tokio::test]
    async fn test_tags_alphabetical_and_rename_conflict() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        store
            .create_recipe(recipe(alice.id, "Mix", &["Dessert", "Breakfast", "Vegan"]))
            .await
            .unwrap();

        let tags = store.list_tags(alice.id).await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Breakfast", "Dessert", "Vegan"]);

        let err = store
            .update_tag(
                alice.id,
                tags[0].id,
                UpdateTag {
                    name: Some("Vegan".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { field: "name", .. }));
    }

    #[tokio::test]
    async fn test_token_lookup() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;

        let (stored, plaintext) = store.create_token(alice.id).await.unwrap();
        assert_eq!(stored.token_hash, hash_token(&plaintext));

        let found = store.find_user_by_token(&plaintext).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));

        let (_, other) = generate_token();
        assert!(store.find_user_by_token(&other).await.unwrap().is_none());
    }
}
