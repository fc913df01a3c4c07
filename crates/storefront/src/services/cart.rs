//! Local mirror of the server-side cart.
//!
//! The server is authoritative. Every mutation is followed by a full
//! `GET /Cart/list`, and the mirror is only ever replaced wholesale by a
//! validated listing. Overlapping operations are ordered by a generation
//! number taken when each listing starts: a response is applied only if it
//! is newer than the last applied one and was requested under the session
//! epoch that is still current.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use styleaura_core::ProductId;

use crate::api::ApiClient;
use crate::config::UnauthorizedPolicy;
use crate::error::{Result, StorefrontError};
use crate::models::Cart;
use crate::session::{Bearer, SessionStore};
use crate::task::ScopedTask;

/// Synchronization state of the cart mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No session; the mirror is empty.
    Unauthenticated,
    /// The mirror reflects the last applied listing.
    Idle,
    /// At least one cart call is in flight.
    Syncing,
    /// The last call failed. Reverts to `Idle` once the call has returned.
    Error,
}

/// What subscribers observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub status: SyncStatus,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
}

impl CartSnapshot {
    const fn unauthenticated() -> Self {
        Self {
            cart: Cart::empty(),
            status: SyncStatus::Unauthenticated,
            last_error: None,
        }
    }
}

struct SyncState {
    snapshot: CartSnapshot,
    next_generation: u64,
    applied_generation: u64,
    in_flight: usize,
}

impl SyncState {
    /// Make every listing started so far stale.
    fn invalidate(&mut self) {
        self.applied_generation = self.next_generation;
    }

    fn settled_status(&self, authenticated: bool) -> SyncStatus {
        if !authenticated {
            SyncStatus::Unauthenticated
        } else if self.in_flight > 0 {
            SyncStatus::Syncing
        } else {
            SyncStatus::Idle
        }
    }
}

// =============================================================================
// CartSynchronizer
// =============================================================================

/// Owner of the cart mirror.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    session: SessionStore,
    on_unauthorized: UnauthorizedPolicy,
    state: Mutex<SyncState>,
    updates: watch::Sender<CartSnapshot>,
}

impl std::fmt::Debug for CartSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSynchronizer")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartSynchronizer {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, on_unauthorized: UnauthorizedPolicy) -> Self {
        let snapshot = if session.is_authenticated() {
            CartSnapshot {
                status: SyncStatus::Idle,
                ..CartSnapshot::unauthenticated()
            }
        } else {
            CartSnapshot::unauthenticated()
        };
        let (updates, _) = watch::channel(snapshot.clone());

        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                on_unauthorized,
                state: Mutex::new(SyncState {
                    snapshot,
                    next_generation: 0,
                    applied_generation: 0,
                    in_flight: 0,
                }),
                updates,
            }),
        }
    }

    /// Current mirror and status.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot.clone()
    }

    /// Current mirror.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock().snapshot.cart.clone()
    }

    /// Receiver notified whenever the mirror or status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.updates.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replace the mirror with the server's cart.
    ///
    /// Without a session this resets the mirror and makes no request.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the previous mirror stays in place (a 401
    /// empties it).
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Cart> {
        let Some(bearer) = self.bearer_or_reset() else {
            return Ok(Cart::empty());
        };
        let _guard = InFlight::start(self);
        let result = self.refresh(&bearer).await;
        self.finish(&bearer, result)
    }

    /// Add `quantity` units of a product, then resynchronize.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` for `quantity == 0` without
    /// touching the network, otherwise the backend error.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(StorefrontError::Validation(
                "Quantity must be at least 1.".to_string(),
            ));
        }
        let Some(bearer) = self.bearer_or_reset() else {
            return Ok(Cart::empty());
        };
        let _guard = InFlight::start(self);
        let result = async {
            self.inner
                .api
                .cart_add(&bearer.token, product_id, quantity)
                .await?;
            self.refresh(&bearer).await
        }
        .await;
        self.finish(&bearer, result)
    }

    /// Remove a product from the cart, then resynchronize.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<Cart> {
        let Some(bearer) = self.bearer_or_reset() else {
            return Ok(Cart::empty());
        };
        let _guard = InFlight::start(self);
        let result = async {
            self.inner.api.cart_remove(&bearer.token, product_id).await?;
            self.refresh(&bearer).await
        }
        .await;
        self.finish(&bearer, result)
    }

    /// Change a line's quantity by `delta`, never going below 1.
    ///
    /// The new quantity is computed from the mirror. A product that is not in
    /// the mirror is left alone and no request is made.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, product_id: ProductId, delta: i64) -> Result<Cart> {
        let Some(bearer) = self.bearer_or_reset() else {
            return Ok(Cart::empty());
        };
        let current = self.cart();
        let Some(line) = current.get(product_id) else {
            debug!(%product_id, "Product not in cart, ignoring quantity change");
            return Ok(current);
        };
        let quantity = next_quantity(line.quantity, delta);

        let _guard = InFlight::start(self);
        let result = async {
            self.inner
                .api
                .cart_update(&bearer.token, product_id, quantity)
                .await?;
            self.refresh(&bearer).await
        }
        .await;
        self.finish(&bearer, result)
    }

    /// Empty the mirror locally and drop any listing still in flight.
    pub fn clear(&self) {
        let authenticated = self.inner.session.is_authenticated();
        let mut state = self.lock();
        state.invalidate();
        state.snapshot.cart = Cart::empty();
        state.snapshot.last_error = None;
        state.snapshot.status = state.settled_status(authenticated);
        self.publish(&state);
    }

    /// Follow session changes: reset on logout, fetch on login.
    ///
    /// The returned task runs until dropped. If a session is already present
    /// the cart is fetched right away.
    pub fn spawn_session_listener(&self) -> ScopedTask<()> {
        let this = self.clone();
        let mut sessions = self.inner.session.subscribe();

        ScopedTask::spawn(async move {
            let (mut epoch, authenticated) = {
                let session = sessions.borrow_and_update();
                (session.epoch(), session.is_authenticated())
            };
            if authenticated {
                this.spawn_refresh();
            }

            while sessions.changed().await.is_ok() {
                let (next_epoch, authenticated) = {
                    let session = sessions.borrow_and_update();
                    (session.epoch(), session.is_authenticated())
                };
                if next_epoch == epoch {
                    continue;
                }
                epoch = next_epoch;

                this.reset(authenticated);
                if authenticated {
                    info!(epoch, "Session established, fetching cart");
                    this.spawn_refresh();
                } else {
                    info!(epoch, "Session cleared, cart reset");
                }
            }
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SyncState) {
        self.inner.updates.send_if_modified(|current| {
            if *current == state.snapshot {
                false
            } else {
                current.clone_from(&state.snapshot);
                true
            }
        });
    }

    fn spawn_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.list().await {
                warn!(error = %e, "Cart fetch after login failed");
            }
        });
    }

    /// Drop the mirror and every in-flight listing.
    fn reset(&self, authenticated: bool) {
        let mut state = self.lock();
        state.invalidate();
        state.snapshot.cart = Cart::empty();
        state.snapshot.last_error = None;
        state.snapshot.status = state.settled_status(authenticated);
        self.publish(&state);
    }

    /// The session token, or `None` after resetting the mirror.
    fn bearer_or_reset(&self) -> Option<Bearer> {
        let bearer = self.inner.session.bearer();
        if bearer.is_none() {
            let needs_reset = {
                let state = self.lock();
                state.snapshot.status != SyncStatus::Unauthenticated
                    || !state.snapshot.cart.is_empty()
            };
            if needs_reset {
                self.reset(false);
            }
            debug!("No session, skipping cart call");
        }
        bearer
    }

    /// Fetch the listing and apply it if it is still the newest.
    async fn refresh(&self, bearer: &Bearer) -> Result<Cart> {
        let generation = {
            let mut state = self.lock();
            state.next_generation += 1;
            state.next_generation
        };

        let items = self.inner.api.cart_list(&bearer.token).await?;
        let cart = Cart::from_server(items)?;

        let mut state = self.lock();
        if generation <= state.applied_generation || !self.inner.session.is_current(bearer.epoch) {
            debug!(
                generation,
                applied = state.applied_generation,
                "Discarding stale cart listing"
            );
            return Ok(state.snapshot.cart.clone());
        }
        state.applied_generation = generation;
        state.snapshot.cart = cart.clone();
        state.snapshot.last_error = None;
        self.publish(&state);
        Ok(cart)
    }

    /// Record the outcome of an operation.
    fn finish(&self, bearer: &Bearer, result: Result<Cart>) -> Result<Cart> {
        let err = match result {
            Ok(cart) => return Ok(cart),
            Err(err) => err,
        };

        warn!(error = %err, "Cart operation failed");

        if !self.inner.session.is_current(bearer.epoch) {
            return Err(err);
        }

        {
            let mut state = self.lock();
            if err.is_unauthorized() {
                state.invalidate();
                state.snapshot.cart = Cart::empty();
            }
            state.snapshot.status = SyncStatus::Error;
            state.snapshot.last_error = Some(err.to_string());
            self.publish(&state);
        }

        if err.is_unauthorized() && self.inner.on_unauthorized == UnauthorizedPolicy::Logout {
            info!("Token rejected by the cart endpoint, logging out");
            self.inner.session.logout_if_current(bearer.epoch);
        }

        Err(err)
    }
}

/// `max(1, current + delta)`, saturating at `u32::MAX`.
fn next_quantity(current: u32, delta: i64) -> u32 {
    let target = i64::from(current).saturating_add(delta).max(1);
    u32::try_from(target).unwrap_or(u32::MAX)
}

/// Marks the mirror as syncing for the lifetime of one operation.
struct InFlight<'a> {
    sync: &'a CartSynchronizer,
}

impl<'a> InFlight<'a> {
    fn start(sync: &'a CartSynchronizer) -> Self {
        let mut state = sync.lock();
        state.in_flight += 1;
        state.snapshot.status = SyncStatus::Syncing;
        sync.publish(&state);
        drop(state);
        Self { sync }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let authenticated = self.sync.inner.session.is_authenticated();
        let mut state = self.sync.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.snapshot.status = state.settled_status(authenticated);
        self.sync.publish(&state);
    }
}
