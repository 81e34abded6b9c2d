//! Service layer for code tickets.
//! - Separates ticket rules (validation, ownership, merging) from storage.
//! - Storage is an injected ordered key-value map; caller identity and clock
//!   arrive explicitly through [`context::CallContext`].
//! - Provides clear error types and documented interfaces.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use service::{context::CallContext, ids::UuidGenerator, storage::MemoryMapStore};
//! use service::tickets::{NewTicketInput, Ticket, TicketService};
//!
//! let store = Arc::new(MemoryMapStore::<String, Ticket>::new());
//! let svc = TicketService::new(store, Arc::new(UuidGenerator));
//! let input = NewTicketInput {
//!     title: "Fix crash".into(),
//!     description: "NPE on login".into(),
//!     priority: "high".into(),
//!     assigned_to: "bob".into(),
//!     due_date: "2025-01-01".into(),
//!     ..Default::default()
//! };
//! let ticket = tokio_test::block_on(svc.create(&CallContext::at_now("alice"), input)).unwrap();
//! assert_eq!(ticket.author, "alice");
//! assert!(ticket.updated_at.is_none());
//! ```

pub mod errors;
pub mod context;
pub mod ids;
pub mod pagination;
pub mod runtime;
pub mod storage;
pub mod tickets;
