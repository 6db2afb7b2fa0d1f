//! JSON REST API for civic petitions.
//!
//! Exposes an axum [`Router`] backed by any
//! [`civic_core::store::PetitionStore`]. Auth, TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", civic_api::api_router(store.clone(), directory))
//! ```

pub mod delivery;
pub mod error;
pub mod petitions;
pub mod responses;
pub mod signatures;
pub mod timeline;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use civic_core::{directory::RepresentativeDirectory, store::PetitionStore};

pub use error::ApiError;

/// Shared handler state.
pub struct AppState<S> {
  pub store:     Arc<S>,
  /// Consulted when a petition is created.
  pub directory: Arc<dyn RepresentativeDirectory>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      directory: Arc::clone(&self.directory),
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(
  store: Arc<S>,
  directory: Arc<dyn RepresentativeDirectory>,
) -> Router<()>
where
  S: PetitionStore + 'static,
{
  Router::new()
    // Petitions
    .route(
      "/petitions",
      get(petitions::list::<S>).post(petitions::create::<S>),
    )
    .route(
      "/petitions/{id}",
      get(petitions::get_one::<S>).delete(petitions::delete_one::<S>),
    )
    .route("/petitions/{id}/close", post(petitions::close::<S>))
    // Signatures
    .route("/petitions/{id}/sign", post(signatures::sign::<S>))
    .route("/petitions/{id}/signatures", get(signatures::list::<S>))
    // Timeline
    .route(
      "/petitions/{id}/timeline",
      get(timeline::list::<S>).post(timeline::append::<S>),
    )
    // Delivery gateway
    .route("/petitions/{id}/sent", post(delivery::sent::<S>))
    .route("/petitions/{id}/delivered", post(delivery::delivered::<S>))
    .route("/petitions/{id}/read", post(delivery::read::<S>))
    .route("/delivery/ready", get(delivery::ready::<S>))
    // Responses
    .route(
      "/petitions/{id}/responses",
      get(responses::list::<S>).post(responses::create::<S>),
    )
    .with_state(AppState { store, directory })
}
