use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::RecipeError;
use crate::model::{RecipeDetail, RecipeSummary};
use crate::sources::{join_ingredients, RecipeSource};

const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; RecipeBrowser/1.0)";

/// Client for the Spoonacular-style recipe API
///
/// Every request carries the static key as the `apiKey` query parameter.
pub struct RecipeApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    search_results: u32,
    generated_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<RecipeSummary>,
    #[serde(rename = "totalResults", default)]
    total_results: u32,
}

#[derive(Debug, Deserialize)]
struct RandomResponse {
    recipes: Vec<RecipeDetail>,
}

impl RecipeApiClient {
    /// Creates a new builder for the API client
    ///
    /// # Example
    /// ```
    /// use recipe_browser::RecipeApiClient;
    /// use std::time::Duration;
    ///
    /// let client = RecipeApiClient::builder()
    ///     .api_key("your-api-key")
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> RecipeApiClientBuilder {
        RecipeApiClientBuilder::default()
    }

    /// Create a client from configuration
    ///
    /// The API key is taken from the config first, then from the
    /// `SPOONACULAR_API_KEY` environment variable.
    pub fn from_config(config: &ApiConfig) -> Result<Self, RecipeError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("SPOONACULAR_API_KEY").ok())
            .ok_or_else(|| {
                RecipeError::InvalidRequest(
                    "API key not found in config or SPOONACULAR_API_KEY".to_string(),
                )
            })?;

        Self::builder()
            .base_url(config.base_url.clone())
            .api_key(api_key)
            .timeout(Duration::from_secs(config.timeout))
            .search_results(config.search_results)
            .generated_results(config.generated_results)
            .build()
    }

    fn endpoint(&self, path: &str) -> Result<Url, RecipeError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| RecipeError::InvalidRequest(format!("invalid URL for {}: {}", path, e)))?;
        url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RecipeError> {
        // The query string carries the key, so only the path is logged
        debug!("GET {}", url.path());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Recipe API returned {} ({} bytes)", status, body.len());
            return Err(RecipeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Err(RecipeError::EmptyResponse);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RecipeSource for RecipeApiClient {
    fn source_name(&self) -> &str {
        "spoonacular"
    }

    async fn recipe_information(&self, id: u64) -> Result<RecipeDetail, RecipeError> {
        if id == 0 {
            return Err(RecipeError::InvalidRequest(
                "recipe id must be positive".to_string(),
            ));
        }

        let url = self.endpoint(&format!("recipes/{}/information", id))?;
        let recipe: RecipeDetail = self.get_json(url).await?;
        debug!("Decoded recipe {}: {}", recipe.id, recipe.title);
        Ok(recipe)
    }

    async fn random_recipe(&self) -> Result<RecipeDetail, RecipeError> {
        let mut url = self.endpoint("recipes/random")?;
        url.query_pairs_mut().append_pair("number", "1");

        let response: RandomResponse = self.get_json(url).await?;
        response
            .recipes
            .into_iter()
            .next()
            .ok_or(RecipeError::EmptyResponse)
    }

    async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
        let mut url = self.endpoint("recipes/complexSearch")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("number", &self.search_results.to_string())
                .append_pair("addRecipeInformation", "true");
            let query = query.trim();
            if !query.is_empty() {
                pairs.append_pair("query", query);
            }
        }

        let response: SearchResponse = self.get_json(url).await?;
        debug!(
            "Search returned {} of {} results",
            response.results.len(),
            response.total_results
        );
        Ok(response.results)
    }

    async fn find_by_ingredients(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeSummary>, RecipeError> {
        let joined = join_ingredients(ingredients);
        if joined.is_empty() {
            return Err(RecipeError::InvalidRequest(
                "at least one ingredient is required".to_string(),
            ));
        }

        let mut url = self.endpoint("recipes/findByIngredients")?;
        url.query_pairs_mut()
            .append_pair("ingredients", &joined)
            .append_pair("number", &self.generated_results.to_string());

        self.get_json(url).await
    }
}

/// Builder for configuring a [`RecipeApiClient`]
#[derive(Debug, Default)]
pub struct RecipeApiClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    search_results: Option<u32>,
    generated_results: Option<u32>,
}

impl RecipeApiClientBuilder {
    /// Point the client at another host, e.g. a proxy or a test server
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a timeout for HTTP requests (30 seconds when unset)
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Number of results requested by free-text search (10 when unset)
    pub fn search_results(mut self, number: u32) -> Self {
        self.search_results = Some(number);
        self
    }

    /// Number of results requested by ingredient search (5 when unset)
    pub fn generated_results(mut self, number: u32) -> Self {
        self.generated_results = Some(number);
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// Returns `RecipeError::InvalidRequest` if no API key was given or the
    /// base URL does not parse, and `RecipeError::Network` if the HTTP
    /// client cannot be created.
    pub fn build(self) -> Result<RecipeApiClient, RecipeError> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RecipeError::InvalidRequest("No API key specified".to_string()))?;

        let raw_base = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut base_url = Url::parse(&raw_base)
            .map_err(|e| RecipeError::InvalidRequest(format!("invalid base URL {}: {}", raw_base, e)))?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()?;

        Ok(RecipeApiClient {
            client,
            base_url,
            api_key,
            search_results: self.search_results.unwrap_or(10),
            generated_results: self.generated_results.unwrap_or(5),
        })
    }
}
