//! Wire and domain types for the sMeNa.Tv backend.
//!
//! Each type lives in its own file. Request/response envelopes mirror the
//! backend's JSON exactly; domain types (notably [`Message`]) are the
//! redesigned client-side shapes.

mod auth;
mod chat;
mod dialog;
mod generation;
mod message;
mod mode;
mod system_status;
mod user;

pub use auth::{LoginRequest, LoginResponse};
pub use chat::{ChatRequest, ChatResponse};
pub use dialog::{DialogEntry, DialogHistoryResponse};
pub use generation::{
    CONTEXT_MAX_CHARS, CONTEXT_MAX_TURNS, ContextEntry, ContextRole, IMAGE_PLACEHOLDER,
    ImageGenRequest, ImageGenResponse, TextGenRequest, TextGenResponse, prepare_context,
};
pub use message::{FALLBACK_API, Message, MessageIdGen, MessageKind};
pub use mode::ChatMode;
pub use system_status::{StatusTier, SystemStatus, SystemStatusResponse};
pub use user::{MeResponse, User};
