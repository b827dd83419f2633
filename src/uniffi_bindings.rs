//! UniFFI bindings for recipe-browser
//!
//! This module provides FFI-compatible types and functions for use with iOS and Android.
//! Network calls are wrapped in synchronous functions that manage their own tokio runtime;
//! the host app is expected to call them off its UI thread and marshal results back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::favorites::{FavoritesEvent, FavoritesStore};
use crate::fetch::FetchFailure;
use crate::local::{self, LocalRecipe};
use crate::model::{Ingredient, InstructionStep, Instructions, RecipeDetail, RecipeSummary};
use crate::sources::{parse_ingredient_list, RecipeApiClient, RecipeSource};
use crate::{ErrorKind, RecipeError};

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

/// FFI-compatible recipe summary
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRecipeSummary {
    pub id: u64,
    pub title: String,
    pub image_url: String,
}

impl From<RecipeSummary> for FfiRecipeSummary {
    fn from(summary: RecipeSummary) -> Self {
        FfiRecipeSummary {
            id: summary.id,
            title: summary.title,
            image_url: summary.image_url,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiIngredient {
    pub id: u64,
    pub name: String,
    pub original_text: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiInstructionStep {
    pub number: u32,
    pub text: String,
}

/// FFI-compatible recipe detail
///
/// Instructions are flattened: at most one of `instruction_text` and `steps`
/// is non-empty.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRecipeDetail {
    pub id: u64,
    pub title: String,
    pub image_url: String,
    pub ready_in_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub ingredients: Vec<FfiIngredient>,
    pub instruction_text: String,
    pub steps: Vec<FfiInstructionStep>,
}

impl From<RecipeDetail> for FfiRecipeDetail {
    fn from(recipe: RecipeDetail) -> Self {
        let (instruction_text, steps) = match recipe.instructions {
            Instructions::Text(text) => (text, Vec::new()),
            Instructions::Steps(steps) => (
                String::new(),
                steps
                    .into_iter()
                    .map(|s| FfiInstructionStep {
                        number: s.number,
                        text: s.text,
                    })
                    .collect(),
            ),
            Instructions::None => (String::new(), Vec::new()),
        };

        FfiRecipeDetail {
            id: recipe.id,
            title: recipe.title,
            image_url: recipe.image_url,
            ready_in_minutes: recipe.ready_in_minutes,
            servings: recipe.servings,
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(|i| FfiIngredient {
                    id: i.id,
                    name: i.name,
                    original_text: i.original_text,
                    amount: i.amount,
                    unit: i.unit,
                })
                .collect(),
            instruction_text,
            steps,
        }
    }
}

impl From<FfiRecipeDetail> for RecipeDetail {
    fn from(ffi: FfiRecipeDetail) -> Self {
        let instructions = if !ffi.steps.is_empty() {
            Instructions::Steps(
                ffi.steps
                    .into_iter()
                    .map(|s| InstructionStep {
                        number: s.number,
                        text: s.text,
                    })
                    .collect(),
            )
        } else if !ffi.instruction_text.is_empty() {
            Instructions::Text(ffi.instruction_text)
        } else {
            Instructions::None
        };

        RecipeDetail {
            id: ffi.id,
            title: ffi.title,
            image_url: ffi.image_url,
            ready_in_minutes: ffi.ready_in_minutes,
            servings: ffi.servings,
            ingredients: ffi
                .ingredients
                .into_iter()
                .map(|i| Ingredient {
                    id: i.id,
                    name: i.name,
                    original_text: i.original_text,
                    amount: i.amount,
                    unit: i.unit,
                })
                .collect(),
            instructions,
        }
    }
}

/// FFI-compatible bundled recipe (ingredients flattened to "amount name" lines)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiLocalRecipe {
    pub name: String,
    pub image: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub featured: bool,
}

impl From<LocalRecipe> for FfiLocalRecipe {
    fn from(recipe: LocalRecipe) -> Self {
        FfiLocalRecipe {
            name: recipe.name,
            image: recipe.image,
            servings: recipe.servings,
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(|i| {
                    if i.amount.is_empty() {
                        i.name
                    } else {
                        format!("{} {}", i.amount, i.name)
                    }
                })
                .collect(),
            featured: recipe.featured,
        }
    }
}

/// FFI-compatible error type
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
pub enum FfiRecipeError {
    /// Malformed input, detected before any request
    InvalidRequest { message: String },
    /// Transport or HTTP status failure
    NetworkError { message: String },
    /// No body, or no recipe where one was expected
    EmptyResponse { message: String },
    /// Payload did not match the expected shape
    DecodeError { message: String },
    /// Runtime error (tokio)
    RuntimeError { message: String },
}

impl fmt::Display for FfiRecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiRecipeError::InvalidRequest { message } => write!(f, "Invalid request: {}", message),
            FfiRecipeError::NetworkError { message } => write!(f, "Network error: {}", message),
            FfiRecipeError::EmptyResponse { message } => write!(f, "Empty response: {}", message),
            FfiRecipeError::DecodeError { message } => write!(f, "Decode error: {}", message),
            FfiRecipeError::RuntimeError { message } => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for FfiRecipeError {}

impl From<FetchFailure> for FfiRecipeError {
    fn from(failure: FetchFailure) -> Self {
        let message = failure.message;
        match failure.kind {
            ErrorKind::InvalidRequest => FfiRecipeError::InvalidRequest { message },
            ErrorKind::NetworkError => FfiRecipeError::NetworkError { message },
            ErrorKind::EmptyResponse => FfiRecipeError::EmptyResponse { message },
            ErrorKind::DecodeError => FfiRecipeError::DecodeError { message },
        }
    }
}

impl From<RecipeError> for FfiRecipeError {
    fn from(err: RecipeError) -> Self {
        FetchFailure::from(err).into()
    }
}

/// Connection settings passed from the host app
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiApiConfig {
    /// API key (falls back to config file / environment if not specified)
    pub api_key: Option<String>,
    /// Alternative base URL (uses the public API if not specified)
    pub base_url: Option<String>,
    /// Optional timeout in seconds
    pub timeout_seconds: Option<u64>,
}

fn create_runtime() -> Result<tokio::runtime::Runtime, FfiRecipeError> {
    tokio::runtime::Runtime::new().map_err(|e| FfiRecipeError::RuntimeError {
        message: format!("Failed to create async runtime: {}", e),
    })
}

fn create_client(config: Option<FfiApiConfig>) -> Result<RecipeApiClient, FfiRecipeError> {
    let config = config.unwrap_or_default();
    let mut api = crate::AppConfig::load().map_err(RecipeError::from)?.api;

    if let Some(api_key) = config.api_key {
        api.api_key = Some(api_key);
    }
    if let Some(base_url) = config.base_url {
        api.base_url = base_url;
    }
    if let Some(timeout) = config.timeout_seconds {
        api.timeout = timeout;
    }

    Ok(RecipeApiClient::from_config(&api)?)
}

/// Fetch the full details of one recipe
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_recipe_detail(
    id: u64,
    config: Option<FfiApiConfig>,
) -> Result<FfiRecipeDetail, FfiRecipeError> {
    let client = create_client(config)?;
    let rt = create_runtime()?;
    let recipe = rt.block_on(client.recipe_information(id))?;
    Ok(recipe.into())
}

/// Free-text search; an empty query lists recipes without filtering
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn search_recipe_list(
    query: String,
    config: Option<FfiApiConfig>,
) -> Result<Vec<FfiRecipeSummary>, FfiRecipeError> {
    let client = create_client(config)?;
    let rt = create_runtime()?;
    let results = rt.block_on(client.search(&query))?;
    Ok(results.into_iter().map(Into::into).collect())
}

/// Suggest recipes from a comma-separated ingredient list
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn generate_recipe_list(
    ingredients: String,
    config: Option<FfiApiConfig>,
) -> Result<Vec<FfiRecipeSummary>, FfiRecipeError> {
    let ingredients = parse_ingredient_list(&ingredients);
    let client = create_client(config)?;
    let rt = create_runtime()?;
    let results = rt.block_on(client.find_by_ingredients(&ingredients))?;
    Ok(results.into_iter().map(Into::into).collect())
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_random_recipe(config: Option<FfiApiConfig>) -> Result<FfiRecipeDetail, FfiRecipeError> {
    let client = create_client(config)?;
    let rt = create_runtime()?;
    let recipe = rt.block_on(client.random_recipe())?;
    Ok(recipe.into())
}

/// Load the bundled recipe list; an unreadable file yields an empty list
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn load_bundled_recipes(path: String) -> Result<Vec<FfiLocalRecipe>, FfiRecipeError> {
    let rt = create_runtime()?;
    let recipes = rt.block_on(local::load_local_recipes(path));
    Ok(recipes.into_iter().map(Into::into).collect())
}

/// Get the library version
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// FFI-compatible favorites change
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum FfiFavoritesEvent {
    Added { id: u64 },
    Removed { id: u64 },
}

impl From<FavoritesEvent> for FfiFavoritesEvent {
    fn from(event: FavoritesEvent) -> Self {
        match event {
            FavoritesEvent::Added { id } => FfiFavoritesEvent::Added { id },
            FavoritesEvent::Removed { id } => FfiFavoritesEvent::Removed { id },
        }
    }
}

/// Implemented by the host app to re-render when favorites change
#[cfg_attr(feature = "uniffi", uniffi::export(callback_interface))]
pub trait FfiFavoritesObserver: Send + Sync {
    fn on_favorites_changed(&self, event: FfiFavoritesEvent);
}

type SharedObserver = Arc<dyn FfiFavoritesObserver>;

/// Shared favorites store handed to the host app
///
/// Observers are called after the store lock is released, so they may read
/// or mutate the store from inside the callback.
#[derive(Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Object))]
pub struct FfiFavoritesStore {
    inner: Mutex<FavoritesStore>,
    observers: Mutex<Vec<(u64, SharedObserver)>>,
    next_handle: AtomicU64,
}

impl FfiFavoritesStore {
    fn with_store<R>(&self, f: impl FnOnce(&mut FavoritesStore) -> R) -> R {
        let mut store = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    /// Run a mutation touching `id`, then notify observers outside the lock
    fn mutate<R>(&self, id: u64, f: impl FnOnce(&mut FavoritesStore) -> R) -> R {
        let (result, event) = self.with_store(|store| {
            let before = store.ids().contains(&id);
            let result = f(store);
            let after = store.ids().contains(&id);
            let event = match (before, after) {
                (false, true) => Some(FavoritesEvent::Added { id }),
                (true, false) => Some(FavoritesEvent::Removed { id }),
                _ => None,
            };
            (result, event)
        });

        if let Some(event) = event {
            self.notify(event);
        }
        result
    }

    fn notify(&self, event: FavoritesEvent) {
        let observers: Vec<SharedObserver> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer.on_favorites_changed(event.into());
        }
    }
}

impl fmt::Debug for FfiFavoritesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("FfiFavoritesStore")
            .field("inner", &self.inner)
            .field("observers", &observers)
            .finish()
    }
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
impl FfiFavoritesStore {
    #[cfg_attr(feature = "uniffi", uniffi::constructor)]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, recipe: FfiRecipeDetail) {
        let id = recipe.id;
        self.mutate(id, |store| store.add(recipe.into()));
    }

    pub fn remove(&self, recipe: FfiRecipeDetail) {
        let recipe: RecipeDetail = recipe.into();
        self.mutate(recipe.id, |store| store.remove(&recipe));
    }

    pub fn is_favorite(&self, recipe: FfiRecipeDetail) -> bool {
        let recipe: RecipeDetail = recipe.into();
        self.with_store(|store| store.is_favorite(&recipe))
    }

    /// Flip the favorite status, returning the new status
    pub fn toggle(&self, recipe: FfiRecipeDetail) -> bool {
        let id = recipe.id;
        self.mutate(id, |store| store.toggle(recipe.into()))
    }

    pub fn recipes(&self) -> Vec<FfiRecipeDetail> {
        self.with_store(|store| store.recipes().iter().cloned().map(Into::into).collect())
    }

    /// Register an observer; the returned handle is passed to `unsubscribe`
    pub fn subscribe(&self, observer: Box<dyn FfiFavoritesObserver>) -> u64 {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, Arc::from(observer)));
        handle
    }

    pub fn unsubscribe(&self, handle: u64) -> bool {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(id, _)| *id != handle);
        observers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{mpsc, Weak};
    use std::thread;
    use std::time::Duration;

    fn ffi_recipe(id: u64, title: &str) -> FfiRecipeDetail {
        FfiRecipeDetail {
            id,
            title: title.to_string(),
            image_url: String::new(),
            ready_in_minutes: Some(10),
            servings: None,
            ingredients: Vec::new(),
            instruction_text: String::new(),
            steps: vec![FfiInstructionStep {
                number: 1,
                text: "Stir.".to_string(),
            }],
        }
    }

    #[test]
    fn test_detail_conversion_keeps_steps() {
        let detail: RecipeDetail = ffi_recipe(3, "Risotto").into();
        assert_eq!(detail.steps().len(), 1);
        assert_eq!(detail.instruction_text(), "");

        let back: FfiRecipeDetail = detail.into();
        assert_eq!(back.steps[0].text, "Stir.");
        assert_eq!(back.ready_in_minutes, Some(10));
    }

    #[test]
    fn test_error_mapping() {
        let err: FfiRecipeError = RecipeError::EmptyResponse.into();
        assert!(matches!(err, FfiRecipeError::EmptyResponse { .. }));
    }

    struct Counter(Arc<AtomicUsize>);

    impl FfiFavoritesObserver for Counter {
        fn on_favorites_changed(&self, _event: FfiFavoritesEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_favorites_store_object() {
        let store = FfiFavoritesStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = store.subscribe(Box::new(Counter(Arc::clone(&count))));

        assert!(store.toggle(ffi_recipe(1, "A")));
        store.add(ffi_recipe(1, "A again"));
        store.add(ffi_recipe(2, "B"));
        assert!(store.is_favorite(ffi_recipe(2, "B")));
        assert_eq!(store.recipes()[0].title, "A");

        assert!(store.unsubscribe(handle));
        store.remove(ffi_recipe(1, "A"));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(store.recipes().len(), 1);
    }

    struct Rerender {
        store: Weak<FfiFavoritesStore>,
        seen: Arc<Mutex<Vec<Vec<u64>>>>,
    }

    impl FfiFavoritesObserver for Rerender {
        fn on_favorites_changed(&self, _event: FfiFavoritesEvent) {
            if let Some(store) = self.store.upgrade() {
                let ids = store.recipes().iter().map(|r| r.id).collect();
                self.seen.lock().unwrap().push(ids);
            }
        }
    }

    #[test]
    fn test_observer_can_read_store_during_notification() {
        let store = FfiFavoritesStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        store.subscribe(Box::new(Rerender {
            store: Arc::downgrade(&store),
            seen: Arc::clone(&seen),
        }));

        let (done_tx, done_rx) = mpsc::channel();
        let worker = Arc::clone(&store);
        thread::spawn(move || {
            worker.add(ffi_recipe(1, "A"));
            worker.add(ffi_recipe(2, "B"));
            worker.toggle(ffi_recipe(1, "A"));
            let _ = done_tx.send(());
        });

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("mutations should return while observers read the store");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec![1], vec![1, 2], vec![2]]
        );
    }

    #[test]
    fn test_observer_can_unsubscribe_itself() {
        struct Once {
            store: Weak<FfiFavoritesStore>,
            handle: Arc<Mutex<Option<u64>>>,
            count: Arc<AtomicUsize>,
        }

        impl FfiFavoritesObserver for Once {
            fn on_favorites_changed(&self, _event: FfiFavoritesEvent) {
                self.count.fetch_add(1, Ordering::SeqCst);
                if let (Some(store), Some(handle)) =
                    (self.store.upgrade(), *self.handle.lock().unwrap())
                {
                    assert!(store.unsubscribe(handle));
                }
            }
        }

        let store = FfiFavoritesStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::new(Mutex::new(None));
        let id = store.subscribe(Box::new(Once {
            store: Arc::downgrade(&store),
            handle: Arc::clone(&handle),
            count: Arc::clone(&count),
        }));
        *handle.lock().unwrap() = Some(id);

        store.add(ffi_recipe(1, "A"));
        store.add(ffi_recipe(2, "B"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_recipe_conversion() {
        let recipe = crate::local::parse_local_recipes(
            r#"[{"name": "Tea", "ingredients": [{"name": "water", "amount": "1 cup"}, {"name": "tea"}]}]"#,
        )
        .unwrap()
        .remove(0);
        let ffi: FfiLocalRecipe = recipe.into();
        assert_eq!(ffi.ingredients, vec!["1 cup water", "tea"]);
    }

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }
}
