pub mod query;

pub use query::{QueryRequest, QueryResponse, NO_QUESTION, NOT_JSON};
