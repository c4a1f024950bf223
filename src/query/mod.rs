pub mod executor;
pub mod parser;
pub mod terms;

pub use executor::{QueryEvaluator, ScoredSet, SearchOptions};
pub use parser::{QueryNode, parse_query};
pub use terms::{QueryToken, query_tokens};
