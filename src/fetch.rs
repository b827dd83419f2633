use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use thiserror::Error;

use crate::error::{ErrorKind, RecipeError};
use crate::model::{RecipeDetail, RecipeSummary};
use crate::sources::RecipeSource;

/// Observable result of a request: `Idle -> Loading -> Success | Failure`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Failure(FetchFailure),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchState::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A failed request, reduced to its category plus a displayable message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<RecipeError> for FetchFailure {
    fn from(err: RecipeError) -> Self {
        FetchFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

// Never held across an await point
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn settle<T: Clone>(
    label: &str,
    outcome: Result<T, RecipeError>,
) -> (FetchState<T>, Result<T, FetchFailure>) {
    match outcome {
        Ok(value) => {
            debug!("{}: success", label);
            (FetchState::Success(value.clone()), Ok(value))
        }
        Err(err) => {
            let failure = FetchFailure::from(err);
            warn!("{}: {:?} ({})", label, failure.kind, failure.message);
            (FetchState::Failure(failure.clone()), Err(failure))
        }
    }
}

/// Retrieves recipe details, keeping one result slot per recipe id
///
/// Fetches for different ids never overwrite each other. Two fetches for the
/// same id are not deduplicated: whichever completes last owns the slot.
/// Nothing is retried; call [`DetailFetcher::fetch`] again to retry.
pub struct DetailFetcher {
    source: Arc<dyn RecipeSource>,
    slots: Mutex<HashMap<u64, FetchState<RecipeDetail>>>,
    random: Mutex<FetchState<RecipeDetail>>,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn RecipeSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            random: Mutex::new(FetchState::Idle),
        }
    }

    /// Fetch the details of recipe `id` and record the outcome in its slot
    ///
    /// The slot is `Loading` while the request is in flight and holds
    /// `Success` or `Failure` once this future completes. Dropping the future
    /// early leaves the slot in `Loading`.
    ///
    /// Slots are kept until [`DetailFetcher::discard`] is called, so callers
    /// that show many recipes should discard each id when its view goes away.
    pub async fn fetch(&self, id: u64) -> Result<RecipeDetail, FetchFailure> {
        self.set(id, FetchState::Loading);
        debug!("recipe {}: loading from {}", id, self.source.source_name());

        let outcome = self.source.recipe_information(id).await;
        let (state, result) = settle(&format!("recipe {}", id), outcome);
        self.set(id, state);
        result
    }

    /// Fetch one random recipe into the dedicated random slot
    pub async fn fetch_random(&self) -> Result<RecipeDetail, FetchFailure> {
        *lock(&self.random) = FetchState::Loading;
        debug!("random recipe: loading from {}", self.source.source_name());

        let outcome = self.source.random_recipe().await;
        let (state, result) = settle("random recipe", outcome);
        *lock(&self.random) = state;
        result
    }

    /// Current state of the slot for `id` (`Idle` if never fetched)
    pub fn state(&self, id: u64) -> FetchState<RecipeDetail> {
        lock(&self.slots).get(&id).cloned().unwrap_or_default()
    }

    pub fn random_state(&self) -> FetchState<RecipeDetail> {
        lock(&self.random).clone()
    }

    /// Drop the slot for `id`, e.g. when the view showing it goes away
    pub fn discard(&self, id: u64) {
        lock(&self.slots).remove(&id);
    }

    fn set(&self, id: u64, state: FetchState<RecipeDetail>) {
        lock(&self.slots).insert(id, state);
    }
}

/// Runs free-text and ingredient searches into a single result slot
///
/// The last response to arrive wins the slot.
pub struct ListFetcher {
    source: Arc<dyn RecipeSource>,
    state: Mutex<FetchState<Vec<RecipeSummary>>>,
}

impl ListFetcher {
    pub fn new(source: Arc<dyn RecipeSource>) -> Self {
        Self {
            source,
            state: Mutex::new(FetchState::Idle),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, FetchFailure> {
        *lock(&self.state) = FetchState::Loading;
        debug!("search {:?}: loading", query);

        let outcome = self.source.search(query).await;
        self.finish(&format!("search {:?}", query), outcome)
    }

    pub async fn find_by_ingredients(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeSummary>, FetchFailure> {
        *lock(&self.state) = FetchState::Loading;
        debug!("ingredients {:?}: loading", ingredients);

        let outcome = self.source.find_by_ingredients(ingredients).await;
        self.finish(&format!("ingredients {:?}", ingredients), outcome)
    }

    pub fn state(&self) -> FetchState<Vec<RecipeSummary>> {
        lock(&self.state).clone()
    }

    fn finish(
        &self,
        label: &str,
        outcome: Result<Vec<RecipeSummary>, RecipeError>,
    ) -> Result<Vec<RecipeSummary>, FetchFailure> {
        let (state, result) = settle(label, outcome);
        *lock(&self.state) = state;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Instructions;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn recipe(id: u64, title: &str) -> RecipeDetail {
        RecipeDetail {
            id,
            title: title.to_string(),
            image_url: String::new(),
            ready_in_minutes: None,
            servings: None,
            ingredients: Vec::new(),
            instructions: Instructions::None,
        }
    }

    /// Answers after a per-id delay; id 13 always fails at the transport level
    struct FakeSource;

    #[async_trait]
    impl RecipeSource for FakeSource {
        fn source_name(&self) -> &str {
            "fake"
        }

        async fn recipe_information(&self, id: u64) -> Result<RecipeDetail, RecipeError> {
            tokio::time::sleep(Duration::from_millis(if id == 1 { 50 } else { 5 })).await;
            if id == 13 {
                return Err(RecipeError::HttpStatus {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(recipe(id, &format!("Recipe {}", id)))
        }

        async fn random_recipe(&self) -> Result<RecipeDetail, RecipeError> {
            Err(RecipeError::EmptyResponse)
        }

        async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
            Ok(vec![RecipeSummary::new(1, query, "")])
        }

        async fn find_by_ingredients(
            &self,
            ingredients: &[String],
        ) -> Result<Vec<RecipeSummary>, RecipeError> {
            if ingredients.is_empty() {
                return Err(RecipeError::InvalidRequest("no ingredients".to_string()));
            }
            Ok(Vec::new())
        }
    }

    fn detail_fetcher() -> DetailFetcher {
        DetailFetcher::new(Arc::new(FakeSource))
    }

    #[tokio::test]
    async fn test_idle_before_fetch() {
        let fetcher = detail_fetcher();
        assert_eq!(fetcher.state(7), FetchState::Idle);
        assert_eq!(fetcher.random_state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn test_success_fills_slot() {
        let fetcher = detail_fetcher();
        let result = fetcher.fetch(7).await.unwrap();
        assert_eq!(result.title, "Recipe 7");
        assert_eq!(fetcher.state(7).value().map(|r| r.id), Some(7));
    }

    #[tokio::test]
    async fn test_failure_is_not_left_loading() {
        let fetcher = detail_fetcher();
        let failure = fetcher.fetch(13).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::NetworkError);

        let state = fetcher.state(13);
        assert!(!state.is_loading());
        assert_eq!(state.failure().map(|f| f.kind), Some(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_keep_separate_slots() {
        let fetcher = detail_fetcher();
        // id 1 is slower, so it completes after id 2
        let (first, second) = tokio::join!(fetcher.fetch(1), fetcher.fetch(2));
        assert!(first.is_ok() && second.is_ok());

        assert_eq!(fetcher.state(1).value().map(|r| r.id), Some(1));
        assert_eq!(fetcher.state(2).value().map(|r| r.id), Some(2));
    }

    #[tokio::test]
    async fn test_discard_resets_slot() {
        let fetcher = detail_fetcher();
        fetcher.fetch(3).await.unwrap();
        fetcher.discard(3);
        assert_eq!(fetcher.state(3), FetchState::Idle);
    }

    #[tokio::test]
    async fn test_random_failure() {
        let fetcher = detail_fetcher();
        let failure = fetcher.fetch_random().await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::EmptyResponse);
        assert_eq!(failure.to_string(), "No data received");
        assert!(fetcher.random_state().failure().is_some());
    }

    /// Answers each call with the next planned (delay, title), in call order
    struct ScriptedSource {
        plan: Mutex<VecDeque<(u64, &'static str)>>,
    }

    impl ScriptedSource {
        fn new(plan: &[(u64, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                plan: Mutex::new(plan.iter().copied().collect()),
            })
        }

        async fn next(&self) -> &'static str {
            let (delay, title) = lock(&self.plan).pop_front().unwrap_or((0, "unplanned"));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            title
        }
    }

    #[async_trait]
    impl RecipeSource for ScriptedSource {
        fn source_name(&self) -> &str {
            "scripted"
        }

        async fn recipe_information(&self, id: u64) -> Result<RecipeDetail, RecipeError> {
            Ok(recipe(id, self.next().await))
        }

        async fn random_recipe(&self) -> Result<RecipeDetail, RecipeError> {
            Ok(recipe(0, self.next().await))
        }

        async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
            let title = self.next().await;
            Ok(vec![RecipeSummary::new(1, format!("{} {}", query, title), "")])
        }

        async fn find_by_ingredients(
            &self,
            _ingredients: &[String],
        ) -> Result<Vec<RecipeSummary>, RecipeError> {
            Ok(vec![RecipeSummary::new(2, self.next().await, "")])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_id_in_flight_twice_last_completion_wins() {
        let fetcher = DetailFetcher::new(ScriptedSource::new(&[(50, "slow"), (5, "fast")]));

        let (slow, fast) = tokio::join!(fetcher.fetch(5), fetcher.fetch(5));
        assert_eq!(slow.unwrap().title, "slow");
        assert_eq!(fast.unwrap().title, "fast");

        let state = fetcher.state(5);
        assert!(!state.is_loading());
        assert_eq!(state.value().map(|r| r.title.as_str()), Some("slow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_slot_holds_later_completing_search() {
        let fetcher = ListFetcher::new(ScriptedSource::new(&[(50, "slow"), (5, "fast")]));

        let (slow, fast) = tokio::join!(fetcher.search("pasta"), fetcher.search("soup"));
        assert_eq!(slow.unwrap()[0].title, "pasta slow");
        assert_eq!(fast.unwrap()[0].title, "soup fast");

        let state = fetcher.state();
        assert_eq!(state.value().map(|r| r[0].title.as_str()), Some("pasta slow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_and_generate_share_the_list_slot() {
        let fetcher = ListFetcher::new(ScriptedSource::new(&[(5, "fast"), (50, "slow")]));
        let ingredients = vec!["rice".to_string()];

        let (_, generated) = tokio::join!(
            fetcher.search("soup"),
            fetcher.find_by_ingredients(&ingredients)
        );
        assert_eq!(generated.unwrap()[0].title, "slow");
        assert_eq!(fetcher.state().value().map(|r| r[0].id), Some(2));
    }

    #[tokio::test]
    async fn test_list_fetcher_last_response_wins() {
        let fetcher = ListFetcher::new(Arc::new(FakeSource));
        fetcher.search("pasta").await.unwrap();
        fetcher.search("soup").await.unwrap();
        let state = fetcher.state();
        assert_eq!(state.value().unwrap()[0].title, "soup");

        let failure = fetcher.find_by_ingredients(&[]).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::InvalidRequest);
        assert!(fetcher.state().failure().is_some());
    }
}
