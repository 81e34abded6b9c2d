//! Code tickets: record model, update payloads and the store service.

pub mod domain;
pub mod service;

pub use domain::{AssigneeUpdate, AuthorUpdate, NewTicketInput, Ticket, TicketPriority, TicketStatus};
pub use service::{TicketService, SharedTicketStore, FIRST_PAGE_LIMIT};
