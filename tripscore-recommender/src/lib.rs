//! Recommendation orchestration for `TripScore`.
//!
//! [`Recommender`] sequences one request end to end:
//!
//! 1. validate the request and derive request-scoped settings from any
//!    override patch, leaving the shared settings untouched;
//! 2. resolve the preset, component weights, importances, tag weights and
//!    tag filters, and normalise the visit window to a fixed offset;
//! 3. prune the catalogue by required and excluded tags;
//! 4. fetch every transit and weather dataset once, under a deadline,
//!    substituting "unavailable" for anything that fails;
//! 5. score candidates on a bounded pool of threads and rank them with a
//!    stable sort, returning the top results with warnings and the
//!    [`EffectiveQuery`] that produced them.
//!
//! Only a malformed request is an error. Collaborator failures surface as
//! [`Warning`]s and degraded component statuses.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod fetch;
mod filter;
mod pool;
mod query;
mod recommender;
mod response;

pub use error::RecommendError;
pub use query::EffectiveQuery;
pub use recommender::Recommender;
pub use response::{Recommendation, RecommendationItem, Warning, WarningCode};
