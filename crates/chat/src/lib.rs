//! Chat layer for VoltWiz.
//!
//! - **Events** (`events`) - transport-neutral envelopes, dispatcher and handlers
//! - **Commands** (`commands`) - `/start`, `/reset`, `/help` and restart keywords
//! - **Blocks** (`blocks`) - reply templates with quick-reply buttons
//! - **Messages** (`messages`) - localized `tera` templates (`en`, `he`)
//! - **Advisor** (`advisor`) - one conversation turn from inbound text to replies
//!
//! ```text
//! Transport → EventDispatcher → Handlers → AdvisorService → ConversationEngine
//!                                              ↓
//!                                MessageCatalog → MessageTemplate replies
//! ```

pub mod advisor;
pub mod blocks;
pub mod commands;
pub mod events;
pub mod messages;

pub use advisor::{AdvisorError, AdvisorService};
pub use blocks::MessageTemplate;
pub use events::{advisor_dispatcher, ChatEnvelope, ChatEvent, EventContext, EventDispatcher};
pub use messages::MessageCatalog;
