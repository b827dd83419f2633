use std::fmt;

use log::debug;

use crate::model::RecipeDetail;

/// Change published by a [`FavoritesStore`] after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesEvent {
    Added { id: u64 },
    Removed { id: u64 },
}

/// Handle returned by [`FavoritesStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw handle, for callers that cannot hold the typed id (FFI)
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }
}

type Observer = Box<dyn Fn(&FavoritesEvent) + Send + Sync>;

/// In-memory favorites, unique by recipe id and kept in insertion order
///
/// Observers are called synchronously, in subscription order, after each
/// mutation that actually changed the collection. Calls that change nothing
/// (adding a recipe already present, removing one that is absent) publish
/// nothing.
#[derive(Default)]
pub struct FavoritesStore {
    recipes: Vec<RecipeDetail>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `recipe` unless a recipe with the same id is already stored
    ///
    /// An existing entry is kept as is, even if `recipe` carries newer data.
    pub fn add(&mut self, recipe: RecipeDetail) {
        if self.position(recipe.id).is_some() {
            debug!("Recipe already in favorites: {}", recipe.id);
            return;
        }

        let id = recipe.id;
        self.recipes.push(recipe);
        debug!("Added recipe to favorites: {}", id);
        self.publish(FavoritesEvent::Added { id });
    }

    /// Remove the entry with the same id as `recipe`, if any
    pub fn remove(&mut self, recipe: &RecipeDetail) {
        match self.position(recipe.id) {
            Some(index) => {
                self.recipes.remove(index);
                debug!("Removed recipe from favorites: {}", recipe.id);
                self.publish(FavoritesEvent::Removed { id: recipe.id });
            }
            None => debug!("Recipe not found in favorites: {}", recipe.id),
        }
    }

    pub fn is_favorite(&self, recipe: &RecipeDetail) -> bool {
        let found = self.position(recipe.id).is_some();
        debug!("Checked if recipe is favorite: {}, result: {}", recipe.id, found);
        found
    }

    /// Flip the favorite status of `recipe`, returning the new status
    pub fn toggle(&mut self, recipe: RecipeDetail) -> bool {
        if self.is_favorite(&recipe) {
            self.remove(&recipe);
            false
        } else {
            self.add(recipe);
            true
        }
    }

    /// Read-only view of the favorites in insertion order
    pub fn recipes(&self) -> &[RecipeDetail] {
        &self.recipes
    }

    pub fn ids(&self) -> Vec<u64> {
        self.recipes.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Register an observer for future changes
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&FavoritesEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Stop notifying an observer; returns false if it was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.recipes.iter().position(|r| r.id == id)
    }

    fn publish(&self, event: FavoritesEvent) {
        for (_, observer) in &self.observers {
            observer(&event);
        }
    }
}

impl fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("recipes", &self.ids())
            .field("observers", &self.observers.len())
            .finish()
    }
}
