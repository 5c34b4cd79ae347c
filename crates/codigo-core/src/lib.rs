pub mod compare;
pub mod config;
pub mod error;
pub mod highlight;
pub mod messages;
pub mod session;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use compare::{
    ArticleComparator, ComparisonRequest, ComparisonResult, FailureKind, InvalidPair,
};
pub use config::Config;
pub use error::ChatError;
pub use highlight::{annotate_html, highlight_references, segments, ArticleReference, Segment};
pub use session::{ChatSession, ExchangeRequest, ANSWER_PLACEHOLDER};
pub use state::{ChatRole, ChatTurn, ConversationHistory, HISTORY_LIMIT};
pub use transcript::{ChatStats, MessageKind, Speaker, Transcript, TranscriptEntry};
