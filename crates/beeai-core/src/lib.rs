//! beeai-core: shared types, configuration, the advisory table and the fallback query matcher.
//!
//! Everything here is synchronous and free of network I/O so the gateway, the skills
//! crate and the client can all answer from the same table.

mod knowledge;
mod shared;

pub use shared::{AnswerSource, ChatAnswer, ChatReply, ChatRequest, CoreConfig};

pub use knowledge::{
    ExampleMessage, ExampleStore, Keyword, KnowledgeTable, PlantAdvisory, QueryMatch, QueryMatcher, TableData,
    TableError, TopicAdvisory, TrainingExample, DEFAULT_GENERIC_RESPONSE, GENERAL_KEY, RELEVANT_EXAMPLE_LIMIT,
};
