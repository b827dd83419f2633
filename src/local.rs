use std::path::Path;

use log::{info, warn};
use serde::Deserialize;
use tokio::fs;

use crate::error::RecipeError;

/// A recipe from the bundled JSON list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalRecipe {
    pub name: String,
    /// Image asset name or URL
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub ingredients: Vec<LocalIngredient>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalIngredient {
    pub name: String,
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Text(String),
    Number(f64),
}

fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Amount>::deserialize(deserializer)? {
        Some(Amount::Text(text)) => text,
        Some(Amount::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Parse the bundled recipe list
pub fn parse_local_recipes(json: &str) -> Result<Vec<LocalRecipe>, RecipeError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse the bundled recipe list, reporting failures
pub async fn try_load_local_recipes(
    path: impl AsRef<Path>,
) -> Result<Vec<LocalRecipe>, RecipeError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .await
        .map_err(|e| RecipeError::LocalData(format!("{}: {}", path.display(), e)))?;
    parse_local_recipes(&json)
}

/// Read the bundled recipe list, degrading to an empty list on any failure
pub async fn load_local_recipes(path: impl AsRef<Path>) -> Vec<LocalRecipe> {
    let path = path.as_ref();
    match try_load_local_recipes(path).await {
        Ok(recipes) => {
            info!("Loaded {} local recipes from {}", recipes.len(), path.display());
            recipes
        }
        Err(e) => {
            warn!("Failed to load local recipes, using an empty list: {}", e);
            Vec::new()
        }
    }
}

/// The recipes flagged for the featured carousel, in list order
pub fn featured_recipes(recipes: &[LocalRecipe]) -> Vec<&LocalRecipe> {
    recipes.iter().filter(|r| r.featured).collect()
}
