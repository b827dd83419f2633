use std::fmt;

use html_escape::decode_html_entities;
use serde::Deserialize;

/// Lightweight search result: enough to list a recipe and fetch its details later
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipeSummary {
    pub id: u64,
    #[serde(deserialize_with = "decoded_string")]
    pub title: String,
    #[serde(rename = "image", default)]
    pub image_url: String,
}

impl RecipeSummary {
    pub fn new(id: u64, title: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
        }
    }
}

impl fmt::Display for RecipeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.title)
    }
}

/// Full recipe record, fetched per id
///
/// Two details with the same `id` are the same recipe, whatever the other
/// fields say (a stale copy and a fresh fetch compare equal through
/// [`RecipeDetail::same_recipe`]).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireRecipeDetail")]
pub struct RecipeDetail {
    pub id: u64,
    pub title: String,
    pub image_url: String,
    pub ready_in_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Instructions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ingredient {
    #[serde(default, deserialize_with = "id_or_zero")]
    pub id: u64,
    #[serde(default, deserialize_with = "decoded_string")]
    pub name: String,
    #[serde(rename = "original", default, deserialize_with = "decoded_string")]
    pub original_text: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub unit: String,
}

/// One numbered step; `number` is 1-based and defines display order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstructionStep {
    pub number: u32,
    #[serde(rename = "step", deserialize_with = "decoded_string")]
    pub text: String,
}

/// Recipe instructions, either free text or numbered steps, never both
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Instructions {
    #[default]
    None,
    Text(String),
    Steps(Vec<InstructionStep>),
}

impl RecipeDetail {
    /// Whether `other` refers to the same recipe (identity is the id alone)
    pub fn same_recipe(&self, other: &RecipeDetail) -> bool {
        self.id == other.id
    }

    /// Free-text instructions, empty when the recipe has steps or nothing
    pub fn instruction_text(&self) -> &str {
        match &self.instructions {
            Instructions::Text(text) => text,
            _ => "",
        }
    }

    /// Structured steps in source order, empty unless the recipe has them
    pub fn steps(&self) -> &[InstructionStep] {
        match &self.instructions {
            Instructions::Steps(steps) => steps,
            _ => &[],
        }
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary::new(self.id, self.title.clone(), self.image_url.clone())
    }

    /// Render the recipe the way the detail screen lays it out
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');

        let mut facts = Vec::new();
        if let Some(minutes) = self.ready_in_minutes {
            facts.push(format!("Preparation Time: {} mins", minutes));
        }
        if let Some(servings) = self.servings {
            facts.push(format!("Servings: {}", servings));
        }
        if !facts.is_empty() {
            out.push_str(&facts.join("  "));
            out.push('\n');
        }

        out.push_str("\nIngredients\n");
        for ingredient in &self.ingredients {
            out.push_str(&format!("• {}\n", ingredient.original_text));
        }

        out.push_str("\nInstructions\n");
        match &self.instructions {
            Instructions::Text(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Instructions::Steps(steps) => {
                for step in steps {
                    out.push_str(&format!("{}. {}\n", step.number, step.text));
                }
            }
            Instructions::None => {}
        }

        out
    }
}

// Payload shape of /recipes/{id}/information and each entry of /recipes/random
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecipeDetail {
    id: u64,
    #[serde(deserialize_with = "decoded_string")]
    title: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    ready_in_minutes: Option<u32>,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    extended_ingredients: Option<Vec<Ingredient>>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    analyzed_instructions: Option<Vec<InstructionGroup>>,
}

#[derive(Debug, Deserialize)]
struct InstructionGroup {
    #[serde(default)]
    steps: Vec<InstructionStep>,
}

impl From<WireRecipeDetail> for RecipeDetail {
    fn from(wire: WireRecipeDetail) -> Self {
        let free_text = wire
            .instructions
            .map(|text| decode_html_entities(text.trim()).into_owned())
            .filter(|text| !text.is_empty());

        // Free text wins; otherwise only the first analyzed group counts
        let instructions = match free_text {
            Some(text) => Instructions::Text(text),
            None => match wire
                .analyzed_instructions
                .and_then(|groups| groups.into_iter().next())
            {
                Some(group) => Instructions::Steps(group.steps),
                None => Instructions::None,
            },
        };

        RecipeDetail {
            id: wire.id,
            title: wire.title,
            image_url: wire.image.unwrap_or_default(),
            ready_in_minutes: wire.ready_in_minutes,
            servings: wire.servings,
            ingredients: wire.extended_ingredients.unwrap_or_default(),
            instructions,
        }
    }
}

fn decoded_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| decode_html_entities(&s).into_owned())
        .unwrap_or_default())
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn id_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}
