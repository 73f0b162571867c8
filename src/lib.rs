pub mod config;
pub mod ingest;
pub mod init;
pub mod results;
pub mod suggester;
pub mod tokenizer;
pub mod trie;

pub use results::{Suggestion, SuggestionResultSet};
pub use suggester::Suggester;
pub use trie::{Trie, TrieNode};
