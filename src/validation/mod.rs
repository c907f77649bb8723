/*!
 * Validation of model replies.
 *
 * The model answers in free-form text that is expected to be a JSON object.
 * Nothing downstream may read a reply before it has passed its operation's
 * schema.
 *
 * # Architecture
 *
 * - `schema`: Declarative per-operation schemas (required keys and rules)
 * - `service`: The generic validator that evaluates a schema
 */

pub mod schema;
pub mod service;

// Re-export main types
pub use schema::{FieldRule, FieldSpec, ResponseSchema, SENTIMENT_LABELS};
pub use service::{validate, validate_required_keys, ValidatedResult};
