// ── Favorites cache ──
//
// Membership set of the signed-in user's favorite ids. Writes go through
// the remote first and touch the local set only once confirmed. The
// owning user id is stored with the set and re-checked against the auth
// manager on every read, so a previous user's ids are never reported for
// the next one.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::auth::{AuthSessionManager, BusyGuard};
use crate::error::CoreError;
use crate::model::{PokemonId, UserId};
use crate::remote::FavoritesRemote;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    pub owner: Option<UserId>,
    pub ids: HashSet<PokemonId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

pub struct FavoritesCache {
    auth: Arc<AuthSessionManager>,
    remote: Arc<dyn FavoritesRemote>,
    state: watch::Sender<FavoriteSet>,
    loading: AtomicUsize,
    /// Present only when toggles are serialized per id.
    toggle_locks: Option<DashMap<PokemonId, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for FavoritesCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesCache")
            .field("state", &*self.state.borrow())
            .field("serialized", &self.toggle_locks.is_some())
            .finish_non_exhaustive()
    }
}

impl FavoritesCache {
    pub fn new(
        auth: Arc<AuthSessionManager>,
        remote: Arc<dyn FavoritesRemote>,
        serialize_toggles: bool,
    ) -> Self {
        let (state, _) = watch::channel(FavoriteSet::default());
        Self {
            auth,
            remote,
            state,
            loading: AtomicUsize::new(0),
            toggle_locks: serialize_toggles.then(DashMap::new),
        }
    }

    /// Replace the local set from the remote. Without a signed-in user
    /// there is nothing to load and this returns `Ok`.
    pub async fn load(&self) -> Result<(), CoreError> {
        let Some(user) = self.auth.current_user_id() else {
            debug!("no signed-in user, skipping favorites load");
            return Ok(());
        };

        let result = {
            let _loading = BusyGuard::enter(&self.loading);
            self.remote.favorite_ids(user).await
        };
        let ids = result.inspect_err(|e| warn!(%user, error = %e, "favorites load failed"))?;

        if self.auth.current_user_id() != Some(user) {
            debug!(%user, "user changed during favorites load, discarding result");
            return Ok(());
        }

        debug!(%user, count = ids.len(), "favorites loaded");
        self.state.send_replace(FavoriteSet {
            owner: Some(user),
            ids: ids.into_iter().collect(),
        });
        Ok(())
    }

    /// Local membership test; never touches the network.
    pub fn is_favorite(&self, id: PokemonId) -> bool {
        let Some(user) = self.auth.current_user_id() else {
            return false;
        };
        let set = self.state.borrow();
        set.owner == Some(user) && set.ids.contains(&id)
    }

    /// Flip membership of `id` on the remote, then mirror the confirmed
    /// result locally. A remote failure leaves the local set untouched.
    ///
    /// Unless toggles are serialized, two in-flight toggles for the same
    /// id race and the last one to resolve decides the local state.
    pub async fn toggle(&self, id: PokemonId) -> Result<ToggleAction, CoreError> {
        let Some(user) = self.auth.current_user_id() else {
            return Err(CoreError::unauthenticated("change favorites"));
        };

        let Some(locks) = &self.toggle_locks else {
            return self.toggle_as(user, id).await;
        };

        let lock = Arc::clone(locks.entry(id).or_default().value());
        let result = {
            let _serial = lock.lock().await;
            self.toggle_as(user, id).await
        };
        // Only the map and this call hold the lock: no toggle for `id` is
        // queued, so the entry can go.
        locks.remove_if(&id, |_, held| Arc::strong_count(held) <= 2);
        result
    }

    async fn toggle_as(&self, user: UserId, id: PokemonId) -> Result<ToggleAction, CoreError> {
        let was_favorite = {
            let set = self.state.borrow();
            set.owner == Some(user) && set.ids.contains(&id)
        };

        let action = if was_favorite {
            self.remote
                .remove_favorite(user, id)
                .await
                .map(|()| ToggleAction::Removed)
        } else {
            self.remote
                .add_favorite(user, id)
                .await
                .map(|()| ToggleAction::Added)
        }
        .inspect_err(|e| warn!(%user, pokemon_id = id, error = %e, "favorite toggle failed"))?;

        if self.auth.current_user_id() != Some(user) {
            debug!(%user, pokemon_id = id, "user changed during toggle, local set untouched");
            return Ok(action);
        }

        self.state.send_modify(|set| {
            if set.owner != Some(user) {
                set.owner = Some(user);
                set.ids.clear();
            }
            match action {
                ToggleAction::Added => {
                    set.ids.insert(id);
                }
                ToggleAction::Removed => {
                    set.ids.remove(&id);
                }
            }
        });
        debug!(%user, pokemon_id = id, %action, "favorite toggled");
        Ok(action)
    }

    /// Drop every cached id and the owner.
    pub fn reset(&self) {
        self.state.send_replace(FavoriteSet::default());
    }

    /// Number of favorites of the current user.
    pub fn count(&self) -> usize {
        let user = self.auth.current_user_id();
        let set = self.state.borrow();
        if user.is_some() && set.owner == user {
            set.ids.len()
        } else {
            0
        }
    }

    /// Current user's favorites, ascending.
    pub fn ids(&self) -> Vec<PokemonId> {
        let user = self.auth.current_user_id();
        let set = self.state.borrow();
        if user.is_none() || set.owner != user {
            return Vec::new();
        }
        let mut ids: Vec<_> = set.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Owner of the cached set, which may lag the signed-in user until
    /// the next load or reset.
    pub fn owner(&self) -> Option<UserId> {
        self.state.borrow().owner
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire) > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoriteSet> {
        self.state.subscribe()
    }
}
