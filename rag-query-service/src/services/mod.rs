pub mod auth;
pub mod pipeline;
pub mod providers;

pub use pipeline::{LazyPipeline, PipelineBuilder, QaPipeline, QueryResult, VertexPipelineBuilder};
