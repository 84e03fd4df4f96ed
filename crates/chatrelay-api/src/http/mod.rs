//! HTTP layer: `/chat`, `/health`, and the static landing page.
//!
//! Every error, including unknown routes and handler panics, is answered
//! with a JSON body of the form `{"error": "..."}`.

pub mod error;
pub mod handlers;
pub mod router;
