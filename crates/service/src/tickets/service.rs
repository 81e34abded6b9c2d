use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::domain::{AssigneeUpdate, AuthorUpdate, NewTicketInput, Ticket, TicketPriority, TicketStatus};
use crate::context::CallContext;
use crate::errors::ServiceError;
use crate::ids::IdGenerator;
use crate::pagination::Page;
use crate::storage::KeyValueStore;

/// Number of tickets returned by [`TicketService::list_first`].
pub const FIRST_PAGE_LIMIT: usize = 5;

pub type SharedTicketStore = Arc<dyn KeyValueStore<String, Ticket>>;

/// Application service owning the ticket lifecycle and its access rules.
///
/// Mutations are serialized through a single gate so the read-check-write of
/// one call never interleaves with another.
pub struct TicketService {
    store: SharedTicketStore,
    ids: Arc<dyn IdGenerator>,
    write_gate: Mutex<()>,
}

impl TicketService {
    pub fn new(store: SharedTicketStore, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, ids, write_gate: Mutex::new(()) }
    }

    /// Create a ticket authored by the caller.
    #[instrument(skip(self, ctx, input), fields(caller = %ctx.caller))]
    pub async fn create(&self, ctx: &CallContext, input: NewTicketInput) -> Result<Ticket, ServiceError> {
        let valid = input.validate()?;
        let _guard = self.write_gate.lock().await;

        let id = self.ids.next_id();
        if self.store.contains_key(&id).await? {
            return Err(ServiceError::Conflict(format!("ticket id {} already exists", id)));
        }
        let ticket = Ticket {
            id: id.clone(),
            title: valid.title,
            description: valid.description,
            status: valid.status,
            priority: valid.priority,
            assigned_to: valid.assigned_to,
            author: ctx.caller.clone(),
            created_at: ctx.now,
            updated_at: None,
            comments: valid.comments,
            due_date: valid.due_date,
        };
        self.store.insert(id, ticket.clone()).await?;
        info!(ticket_id = %ticket.id, author = %ticket.author, assigned_to = %ticket.assigned_to, "ticket_created");
        Ok(ticket)
    }

    /// Up to [`FIRST_PAGE_LIMIT`] tickets in store order.
    pub async fn list_first(&self) -> Result<Vec<Ticket>, ServiceError> {
        self.list_page(Page::new(0, FIRST_PAGE_LIMIT)).await
    }

    pub async fn list_all(&self) -> Result<Vec<Ticket>, ServiceError> {
        self.store.values().await
    }

    pub async fn list_page(&self, page: Page) -> Result<Vec<Ticket>, ServiceError> {
        Ok(page.apply(self.store.values().await?))
    }

    /// Fetch one ticket. Visible to its author and its assignee only.
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub async fn get(&self, ctx: &CallContext, id: &str) -> Result<Ticket, ServiceError> {
        let ticket = self.load(id).await?;
        if !(ticket.is_author(&ctx.caller) || ticket.is_assignee(&ctx.caller)) {
            warn!(ticket_id = %id, "ticket_access_denied");
            return Err(ServiceError::unauthorized("only the author or assignee may view this ticket"));
        }
        Ok(ticket)
    }

    /// All tickets whose title or description contains `keyword`, ignoring case.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Ticket>, ServiceError> {
        let needle = keyword.to_lowercase();
        let found: Vec<Ticket> = self
            .store
            .values()
            .await?
            .into_iter()
            .filter(|t| t.matches_keyword(&needle))
            .collect();
        debug!(keyword, matches = found.len(), "ticket_search");
        Ok(found)
    }

    /// First match for `keyword` in store order, if any.
    pub async fn search_first(&self, keyword: &str) -> Result<Option<Ticket>, ServiceError> {
        let needle = keyword.to_lowercase();
        Ok(self.store.values().await?.into_iter().find(|t| t.matches_keyword(&needle)))
    }

    pub async fn filter_by_status(&self, status: &str) -> Result<Vec<Ticket>, ServiceError> {
        let status: TicketStatus = status.parse()?;
        Ok(self
            .store
            .values()
            .await?
            .into_iter()
            .filter(|t| t.status == Some(status))
            .collect())
    }

    pub async fn filter_by_priority(&self, priority: &str) -> Result<Vec<Ticket>, ServiceError> {
        let priority: TicketPriority = priority.parse()?;
        Ok(self
            .store
            .values()
            .await?
            .into_iter()
            .filter(|t| t.priority == priority)
            .collect())
    }

    /// Author-scoped update of title, description, status, priority, comments and due date.
    #[instrument(skip(self, ctx, update), fields(caller = %ctx.caller))]
    pub async fn update_as_author(&self, ctx: &CallContext, id: &str, update: AuthorUpdate) -> Result<Ticket, ServiceError> {
        let _guard = self.write_gate.lock().await;
        let mut ticket = self.load(id).await?;
        if !ticket.is_author(&ctx.caller) {
            warn!(ticket_id = %id, "ticket_access_denied");
            return Err(ServiceError::unauthorized("only the author may update this ticket"));
        }
        update.validate()?;
        update.apply_to(&mut ticket);
        self.commit(ctx, ticket, "author").await
    }

    /// Assignee-scoped update of status and comments.
    #[instrument(skip(self, ctx, update), fields(caller = %ctx.caller))]
    pub async fn update_as_assignee(&self, ctx: &CallContext, id: &str, update: AssigneeUpdate) -> Result<Ticket, ServiceError> {
        let _guard = self.write_gate.lock().await;
        let mut ticket = self.load(id).await?;
        if !ticket.is_assignee(&ctx.caller) {
            warn!(ticket_id = %id, "ticket_access_denied");
            return Err(ServiceError::unauthorized("only the assignee may update this ticket"));
        }
        update.apply_to(&mut ticket);
        self.commit(ctx, ticket, "assignee").await
    }

    /// Remove a ticket; only its author may. Returns the removed record.
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub async fn delete(&self, ctx: &CallContext, id: &str) -> Result<Ticket, ServiceError> {
        let _guard = self.write_gate.lock().await;
        let ticket = self.load(id).await?;
        if !ticket.is_author(&ctx.caller) {
            warn!(ticket_id = %id, "ticket_access_denied");
            return Err(ServiceError::unauthorized("only the author may delete this ticket"));
        }
        let removed = self
            .store
            .remove(&ticket.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("ticket"))?;
        info!(ticket_id = %removed.id, "ticket_deleted");
        Ok(removed)
    }

    async fn load(&self, id: &str) -> Result<Ticket, ServiceError> {
        self.store
            .get(&id.to_string())
            .await?
            .ok_or_else(|| ServiceError::not_found("ticket"))
    }

    async fn commit(&self, ctx: &CallContext, mut ticket: Ticket, role: &'static str) -> Result<Ticket, ServiceError> {
        // a clock behind created_at must not produce updated_at < created_at
        ticket.updated_at = Some(ctx.now.max(ticket.created_at));
        self.store.insert(ticket.id.clone(), ticket.clone()).await?;
        info!(ticket_id = %ticket.id, role, "ticket_updated");
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use crate::storage::MemoryMapStore;
    use chrono::{Duration, TimeZone, Utc};

    fn service() -> TicketService {
        let store: SharedTicketStore = Arc::new(MemoryMapStore::<String, Ticket>::new());
        TicketService::new(store, Arc::new(SequentialIdGenerator::new("T")))
    }

    fn at(caller: &str, minutes: i64) -> CallContext {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        CallContext::new(caller, base + Duration::minutes(minutes))
    }

    fn input(title: &str, description: &str) -> NewTicketInput {
        NewTicketInput {
            title: title.into(),
            description: description.into(),
            priority: "high".into(),
            assigned_to: "bob".into(),
            due_date: "2025-01-01".into(),
            ..Default::default()
        }
    }

    async fn seed(svc: &TicketService, n: usize) -> Vec<Ticket> {
        let mut out = Vec::new();
        for i in 1..=n {
            out.push(svc.create(&at("alice", 0), input(&format!("Ticket {}", i), "desc")).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn create_stamps_author_and_leaves_optionals_absent() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("Fix crash", "NPE on login")).await.unwrap();
        assert_eq!(t.author, "alice");
        assert_eq!(t.created_at, at("alice", 0).now);
        assert_eq!(t.updated_at, None);
        assert_eq!(t.status, None);
        assert_eq!(t.comments, None);
        assert_eq!(t.priority, TicketPriority::High);
        assert_eq!(svc.list_all().await.unwrap(), vec![t]);
    }

    #[tokio::test]
    async fn create_with_missing_field_is_rejected_and_stores_nothing() {
        let svc = service();
        let mut bad = input("Fix crash", "NPE");
        bad.assigned_to.clear();
        assert!(matches!(svc.create(&at("alice", 0), bad).await, Err(ServiceError::Validation(_))));
        let mut bad = input("Fix crash", "NPE");
        bad.due_date = "not-a-date".into();
        assert!(matches!(svc.create(&at("alice", 0), bad).await, Err(ServiceError::Validation(_))));
        assert!(svc.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_ids_are_distinct() {
        let svc = service();
        let tickets = seed(&svc, 10).await;
        let ids: std::collections::HashSet<_> = tickets.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite_existing_id() {
        struct Fixed;
        impl IdGenerator for Fixed {
            fn next_id(&self) -> String { "same".into() }
        }
        let store: SharedTicketStore = Arc::new(MemoryMapStore::<String, Ticket>::new());
        let svc = TicketService::new(store, Arc::new(Fixed));
        svc.create(&at("alice", 0), input("a", "b")).await.unwrap();
        assert!(matches!(svc.create(&at("carol", 0), input("c", "d")).await, Err(ServiceError::Conflict(_))));
        assert_eq!(svc.list_all().await.unwrap()[0].author, "alice");
    }

    #[tokio::test]
    async fn listing_respects_first_limit_and_pages() {
        let svc = service();
        let seeded = seed(&svc, 7).await;
        assert_eq!(svc.list_first().await.unwrap(), seeded[..5].to_vec());
        assert_eq!(svc.list_all().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn pagination_windows() {
        let svc = service();
        let seeded = seed(&svc, 5).await;
        let page = svc.list_page(Page::new(2, 2)).await.unwrap();
        assert_eq!(page, vec![seeded[2].clone(), seeded[3].clone()]);
        assert!(svc.list_page(Page::new(10, 5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_checks_existence_then_visibility() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("a", "b")).await.unwrap();
        assert!(matches!(svc.get(&at("alice", 1), "nope").await, Err(ServiceError::NotFound(_))));
        assert_eq!(svc.get(&at("alice", 1), &t.id).await.unwrap(), t);
        assert_eq!(svc.get(&at("bob", 1), &t.id).await.unwrap(), t);
        assert!(matches!(svc.get(&at("mallory", 1), &t.id).await, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_title_and_description() {
        let svc = service();
        let a = svc.create(&at("alice", 0), input("login bug", "crash")).await.unwrap();
        let _b = svc.create(&at("alice", 0), input("docs", "typo")).await.unwrap();
        let c = svc.create(&at("alice", 0), input("perf", "BUG in cache")).await.unwrap();

        assert_eq!(svc.search("Bug").await.unwrap(), vec![a.clone(), c]);
        assert_eq!(svc.search_first("BUG").await.unwrap(), Some(a));
        assert!(svc.search("missing").await.unwrap().is_empty());
        assert_eq!(svc.search_first("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn filters_by_status_and_priority_tags() {
        let svc = service();
        let mut i = input("a", "b");
        i.status = Some("in_review".into());
        let reviewed = svc.create(&at("alice", 0), i).await.unwrap();
        let mut i = input("c", "d");
        i.priority = "low".into();
        let low = svc.create(&at("alice", 0), i).await.unwrap();

        assert_eq!(svc.filter_by_status("in_review").await.unwrap(), vec![reviewed.clone()]);
        assert!(svc.filter_by_status("completed").await.unwrap().is_empty());
        assert!(matches!(svc.filter_by_status("").await, Err(ServiceError::Validation(_))));

        assert_eq!(svc.filter_by_priority("low").await.unwrap(), vec![low]);
        assert_eq!(svc.filter_by_priority("high").await.unwrap(), vec![reviewed]);
        assert!(matches!(svc.filter_by_priority(" ").await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn author_update_merges_and_stamps() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("a", "b")).await.unwrap();
        let upd = AuthorUpdate { title: Some("renamed".into()), status: Some(Some(TicketStatus::Deferred)), ..Default::default() };
        let u = svc.update_as_author(&at("alice", 5), &t.id, upd).await.unwrap();
        assert_eq!(u.title, "renamed");
        assert_eq!(u.status, Some(TicketStatus::Deferred));
        assert_eq!(u.description, t.description);
        assert_eq!(u.due_date, t.due_date);
        assert_eq!(u.author, t.author);
        assert_eq!(u.created_at, t.created_at);
        assert_eq!(u.updated_at, Some(at("alice", 5).now));
        assert_eq!(svc.get(&at("alice", 6), &t.id).await.unwrap(), u);
    }

    #[tokio::test]
    async fn author_update_by_other_identity_changes_nothing() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("a", "b")).await.unwrap();
        let upd = AuthorUpdate { title: Some("hijack".into()), ..Default::default() };
        for who in ["bob", "mallory"] {
            let res = svc.update_as_author(&at(who, 1), &t.id, upd.clone()).await;
            assert!(matches!(res, Err(ServiceError::Unauthorized(_))));
        }
        assert_eq!(svc.get(&at("alice", 2), &t.id).await.unwrap(), t);
        assert!(matches!(
            svc.update_as_author(&at("alice", 1), "missing", upd).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn author_update_with_invalid_due_date_changes_nothing() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("a", "b")).await.unwrap();
        let upd = AuthorUpdate { title: Some("x".into()), due_date: Some("whenever".into()), ..Default::default() };
        assert!(matches!(svc.update_as_author(&at("alice", 1), &t.id, upd).await, Err(ServiceError::Validation(_))));
        assert_eq!(svc.get(&at("alice", 2), &t.id).await.unwrap(), t);
    }

    #[tokio::test]
    async fn assignee_update_scoped_to_assignee() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("a", "b")).await.unwrap();
        let upd = AssigneeUpdate { status: Some(Some(TicketStatus::Completed)), comments: Some(Some("done".into())) };

        assert!(matches!(
            svc.update_as_assignee(&at("alice", 1), &t.id, upd.clone()).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert_eq!(svc.get(&at("alice", 1), &t.id).await.unwrap(), t);

        let u = svc.update_as_assignee(&at("bob", 2), &t.id, upd).await.unwrap();
        assert_eq!(u.status, Some(TicketStatus::Completed));
        assert_eq!(u.comments.as_deref(), Some("done"));
        assert_eq!(u.title, t.title);
        assert_eq!(u.updated_at, Some(at("bob", 2).now));
    }

    #[tokio::test]
    async fn update_never_moves_updated_at_before_created_at() {
        let svc = service();
        let t = svc.create(&at("alice", 10), input("a", "b")).await.unwrap();
        let u = svc.update_as_author(&at("alice", 0), &t.id, AuthorUpdate::default()).await.unwrap();
        assert_eq!(u.updated_at, Some(t.created_at));
    }

    #[tokio::test]
    async fn delete_is_author_only() {
        let svc = service();
        let t = svc.create(&at("alice", 0), input("a", "b")).await.unwrap();

        assert!(matches!(svc.delete(&at("bob", 1), &t.id).await, Err(ServiceError::Unauthorized(_))));
        assert_eq!(svc.get(&at("bob", 1), &t.id).await.unwrap(), t);

        let removed = svc.delete(&at("alice", 2), &t.id).await.unwrap();
        assert_eq!(removed, t);
        assert!(matches!(svc.get(&at("alice", 3), &t.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(&at("alice", 3), &t.id).await, Err(ServiceError::NotFound(_))));
    }
}
