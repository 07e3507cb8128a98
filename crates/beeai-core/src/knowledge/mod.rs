//! Advisory knowledge used when the remote model cannot answer.
//!
//! | Piece          | Purpose                                                      |
//! |----------------|--------------------------------------------------------------|
//! | `table`        | country → plant → advisory, `general` → topic → advisory     |
//! | `matcher`      | keyword extraction and precedence over the table             |
//! | `examples`     | question/answer pairs used as prompt context for the model   |

mod examples;
mod matcher;
mod table;

pub use examples::{ExampleMessage, ExampleStore, TrainingExample, RELEVANT_EXAMPLE_LIMIT};
pub use matcher::{QueryMatch, QueryMatcher, DEFAULT_GENERIC_RESPONSE};
pub use table::{Keyword, KnowledgeTable, PlantAdvisory, TableData, TableError, TopicAdvisory, GENERAL_KEY};
