pub mod config;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod local;
pub mod model;
pub mod sources;
pub mod uniffi_bindings;

pub use crate::config::{ApiConfig, AppConfig, LocalConfig};
pub use error::{ErrorKind, RecipeError};
pub use favorites::{FavoritesEvent, FavoritesStore, SubscriptionId};
pub use fetch::{DetailFetcher, FetchFailure, FetchState, ListFetcher};
pub use local::{featured_recipes, load_local_recipes, LocalIngredient, LocalRecipe};
pub use model::{Ingredient, InstructionStep, Instructions, RecipeDetail, RecipeSummary};
pub use sources::{
    join_ingredients, parse_ingredient_list, RecipeApiClient, RecipeApiClientBuilder,
    RecipeSource,
};

/// Build an API client from `config.toml` and `RECIPES__*` environment variables
pub fn client_from_env() -> Result<RecipeApiClient, RecipeError> {
    let config = AppConfig::load()?;
    RecipeApiClient::from_config(&config.api)
}

/// Fetch the details of one recipe using the default configuration
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let recipe = recipe_browser::fetch_recipe_detail(715538).await?;
/// println!("{}", recipe.to_text());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_recipe_detail(id: u64) -> Result<RecipeDetail, RecipeError> {
    client_from_env()?.recipe_information(id).await
}

/// Free-text recipe search using the default configuration
pub async fn search_recipes(query: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
    client_from_env()?.search(query).await
}

/// Suggest recipes from a comma-separated ingredient list, e.g. `"chicken, rice"`
pub async fn generate_recipes(ingredients: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
    let ingredients = parse_ingredient_list(ingredients);
    client_from_env()?.find_by_ingredients(&ingredients).await
}

/// Fetch one random recipe using the default configuration
pub async fn random_recipe() -> Result<RecipeDetail, RecipeError> {
    client_from_env()?.random_recipe().await
}
