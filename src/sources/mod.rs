mod api;

pub use api::{RecipeApiClient, RecipeApiClientBuilder};

use async_trait::async_trait;

use crate::error::RecipeError;
use crate::model::{RecipeDetail, RecipeSummary};

/// Unified trait for anything that can answer recipe queries
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Get the source name (e.g., "spoonacular")
    fn source_name(&self) -> &str;

    /// Full details for one recipe
    async fn recipe_information(&self, id: u64) -> Result<RecipeDetail, RecipeError>;

    /// A single random recipe
    async fn random_recipe(&self) -> Result<RecipeDetail, RecipeError>;

    /// Free-text search; a blank query lists recipes without filtering
    async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError>;

    /// Recipes that can be made from the given ingredient names
    async fn find_by_ingredients(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeSummary>, RecipeError>;
}

/// Split user input such as `"chicken, tomatoes ,rice"` into ingredient names
///
/// Names are trimmed and blanks dropped.
pub fn parse_ingredient_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join ingredient names into the comma-separated form the API expects
pub fn join_ingredients(ingredients: &[String]) -> String {
    ingredients
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
