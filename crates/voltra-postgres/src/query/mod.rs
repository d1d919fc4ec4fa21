//! Repository traits implemented on [`PgConnection`].
//!
//! Each repository is a trait of `impl Future + Send` methods implemented
//! directly on the async connection, so handlers can call query methods on a
//! pooled connection without wrapper types.
//!
//! [`PgConnection`]: crate::PgConnection

mod chat_message;
mod chat_session;
mod data_source;
mod document_chunk;

pub use chat_message::ChatMessageRepository;
pub use chat_session::ChatSessionRepository;
pub use data_source::DataSourceRepository;
pub use document_chunk::DocumentChunkRepository;
