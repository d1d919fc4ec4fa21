//! Diesel models for all Voltra tables.

mod chat_message;
mod chat_session;
mod dashboard;
mod data_source;
mod document_chunk;
mod organization;

pub use chat_message::{ChatMessage, NewChatMessage, UpdateChatMessage};
pub use chat_session::{ChatSession, NewChatSession, UpdateChatSession};
pub use dashboard::{Dashboard, NewDashboard};
pub use data_source::{DataSource, NewDataSource, UpdateDataSource};
pub use document_chunk::{DocumentChunk, NewDocumentChunk, ScoredDocumentChunk};
pub use organization::{NewOrganization, Organization};
