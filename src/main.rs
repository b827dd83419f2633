use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::debug;

use recipe_browser::{
    featured_recipes, load_local_recipes, parse_ingredient_list, AppConfig, DetailFetcher,
    ListFetcher, RecipeApiClient, RecipeSource, RecipeSummary,
};

#[derive(Parser)]
#[command(name = "recipe-browser", version, about = "Browse, search and generate recipes")]
struct Cli {
    /// API key (overrides config.toml and RECIPES__API__API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search recipes by free text; no query lists recipes unfiltered
    Search { query: Option<String> },
    /// Show the full details of one recipe
    Detail { id: u64 },
    /// Suggest recipes from ingredients, e.g. `generate chicken, rice`
    Generate {
        #[arg(required = true)]
        ingredients: Vec<String>,
    },
    /// Show a random recipe
    Random,
    /// List the bundled recipes
    Local {
        path: Option<PathBuf>,
        /// Only show featured recipes
        #[arg(long)]
        featured: bool,
    },
}

fn print_summaries(recipes: &[RecipeSummary]) {
    if recipes.is_empty() {
        println!("No recipes found. Try different ingredients.");
    }
    for recipe in recipes {
        println!("{}", recipe);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(key) = cli.api_key {
        config.api.api_key = Some(key);
    }

    if let Command::Local { path, featured } = &cli.command {
        let path = path.clone().unwrap_or(config.local.recipes_path);
        let recipes = load_local_recipes(&path).await;
        let shown: Vec<_> = if *featured {
            featured_recipes(&recipes)
        } else {
            recipes.iter().collect()
        };
        for recipe in shown {
            println!("{} ({} servings)", recipe.name, recipe.servings);
        }
        return Ok(());
    }

    let source: Arc<dyn RecipeSource> = Arc::new(RecipeApiClient::from_config(&config.api)?);
    debug!("Using recipe source {}", source.source_name());

    match cli.command {
        Command::Search { query } => {
            let fetcher = ListFetcher::new(source);
            let recipes = fetcher.search(query.as_deref().unwrap_or("")).await?;
            print_summaries(&recipes);
        }
        Command::Detail { id } => {
            let fetcher = DetailFetcher::new(source);
            let recipe = fetcher.fetch(id).await?;
            print!("{}", recipe.to_text());
        }
        Command::Generate { ingredients } => {
            let ingredients = parse_ingredient_list(&ingredients.join(","));
            let fetcher = ListFetcher::new(source);
            let recipes = fetcher.find_by_ingredients(&ingredients).await?;
            print_summaries(&recipes);
        }
        Command::Random => {
            let fetcher = DetailFetcher::new(source);
            let recipe = fetcher.fetch_random().await?;
            print!("{}", recipe.to_text());
        }
        Command::Local { .. } => {}
    }

    Ok(())
}
