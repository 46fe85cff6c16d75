/// Recipe endpoints
///
/// Every handler passes the caller's user ID to the store, so a recipe owned
/// by someone else is indistinguishable from a missing one (404).
///
/// # Endpoints
///
/// - `GET /api/recipe/recipes` - List the caller's recipes (summary shape)
/// - `POST /api/recipe/recipes` - Create a recipe
/// - `GET /api/recipe/recipes/:id` - Retrieve a recipe (detail shape)
/// - `PUT /api/recipe/recipes/:id` - Full update
/// - `PATCH /api/recipe/recipes/:id` - Partial update
/// - `DELETE /api/recipe/recipes/:id` - Delete

use super::trim_field;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use recipebox_shared::{
    auth::context::AuthContext,
    models::{
        recipe::{CreateRecipe, Price, Recipe, UpdateRecipe},
        tag::Tag,
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const MAX_TAG_NAME_CHARS: usize = 255;

/// Price as sent by clients, either `"5.50"` or `5.5`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

impl PriceInput {
    fn parse(&self) -> ApiResult<Price> {
        let parsed = match self {
            PriceInput::Text(text) => Price::parse(text),
            PriceInput::Number(number) => Price::parse(&number.to_string()),
        };
        Ok(parsed?)
    }
}

/// Tag reference inside a recipe body
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
}

/// Create recipe request
///
/// Unknown fields, including any owner field, are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0"))]
    pub time_minutes: i32,

    pub price: PriceInput,

    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters"))]
    pub link: String,

    #[serde(default)]
    pub tags: Vec<TagInput>,
}

/// Update recipe request (PUT and PATCH)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecipeRequest {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0"))]
    pub time_minutes: Option<i32>,

    pub price: Option<PriceInput>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters"))]
    pub link: Option<String>,

    pub tags: Option<Vec<TagInput>>,
}

/// Recipe as shown in list responses
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub tags: Vec<Tag>,
}

/// Recipe as shown by every non-list action
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price.to_string(),
            link: recipe.link,
            tags: recipe.tags,
        }
    }
}

impl From<Recipe> for RecipeDetail {
    fn from(mut recipe: Recipe) -> Self {
        let description = std::mem::take(&mut recipe.description);
        Self {
            summary: recipe.into(),
            description,
        }
    }
}

fn tag_names(tags: Vec<TagInput>) -> ApiResult<Vec<String>> {
    tags.into_iter()
        .map(|tag| {
            let name = tag.name.trim().to_string();
            let chars = name.chars().count();
            if chars == 0 || chars > MAX_TAG_NAME_CHARS {
                return Err(ApiError::field(
                    "tags",
                    "Ensure each tag name has 1 to 255 characters",
                ));
            }
            Ok(name)
        })
        .collect()
}

/// List the caller's recipes, newest first
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let recipes = state.store.list_recipes(auth.user_id()).await?;

    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

/// Create a recipe owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/recipe/recipes
/// Content-Type: application/json
///
/// {
///   "title": "Pancakes",
///   "time_minutes": 20,
///   "price": "4.50",
///   "tags": [{ "name": "Breakfast" }]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: no valid token
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(mut req): ApiJson<CreateRecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeDetail>)> {
    trim_field(&mut req.title);
    req.validate()?;

    let price = req.price.parse()?;
    let tags = tag_names(req.tags)?;

    let recipe = state
        .store
        .create_recipe(CreateRecipe {
            user_id: auth.user_id(),
            title: req.title,
            description: req.description,
            time_minutes: req.time_minutes,
            price,
            link: req.link,
            tags,
        })
        .await?;

    tracing::info!(
        user_id = auth.user_id(),
        recipe_id = recipe.id,
        tags = recipe.tags.len(),
        "Recipe created"
    );

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

/// Retrieve one of the caller's recipes
pub async fn retrieve_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe = state
        .store
        .find_recipe(auth.user_id(), id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(recipe.into()))
}

/// Full update; `title`, `time_minutes` and `price` are required
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeDetail>> {
    let missing: Vec<&str> = [
        ("title", req.title.is_none()),
        ("time_minutes", req.time_minutes.is_none()),
        ("price", req.price.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();
    if !missing.is_empty() {
        return Err(ApiError::required(&missing));
    }

    apply_update(&state, &auth, id, req).await
}

/// Partial update
pub async fn partial_update_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeDetail>> {
    apply_update(&state, &auth, id, req).await
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: i64,
    mut req: UpdateRecipeRequest,
) -> ApiResult<Json<RecipeDetail>> {
    if let Some(title) = req.title.as_mut() {
        trim_field(title);
    }
    req.validate()?;

    let price = req.price.as_ref().map(PriceInput::parse).transpose()?;
    let tags = req.tags.map(tag_names).transpose()?;

    let recipe = state
        .store
        .update_recipe(
            auth.user_id(),
            id,
            UpdateRecipe {
                title: req.title,
                description: req.description,
                time_minutes: req.time_minutes,
                price,
                link: req.link,
                tags,
            },
        )
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(user_id = auth.user_id(), recipe_id = recipe.id, "Recipe updated");

    Ok(Json(recipe.into()))
}

/// Delete one of the caller's recipes
pub async fn destroy_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_recipe(auth.user_id(), id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(user_id = auth.user_id(), recipe_id = id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_input_accepts_string_and_number() {
        let text: PriceInput = serde_json::from_str(r#""5.5""#).unwrap();
        assert_eq!(text.parse().unwrap().as_str(), "5.50");

        let number: PriceInput = serde_json::from_str("12.25").unwrap();
        assert_eq!(number.parse().unwrap().as_str(), "12.25");

        let integer: PriceInput = serde_json::from_str("3").unwrap();
        assert_eq!(integer.parse().unwrap().as_str(), "3.00");
    }

    #[test]
    fn test_price_input_rejects_garbage() {
        let text: PriceInput = serde_json::from_str(r#""cheap""#).unwrap();
        assert!(matches!(text.parse(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_tag_names_trimmed_and_checked() {
        let names = tag_names(vec![
            TagInput {
                name: " Vegan ".to_string(),
            },
            TagInput {
                name: "Dessert".to_string(),
            },
        ])
        .unwrap();
        assert_eq!(names, vec!["Vegan", "Dessert"]);

        let err = tag_names(vec![TagInput {
            name: "  ".to_string(),
        }]);
        assert!(err.is_err());
    }
}
