//! In-memory entity collections kept in sync with the backend.
//!
//! The store never patches a collection in place. Every successful mutation
//! is followed by a full reload of the affected kind, and the reloaded list
//! replaces the previous one wholesale. A reload that fails after a
//! successful mutation is logged and leaves the previous collection in place.
//!
//! Reloads of one collection are ordered by ticket: a result is applied only
//! if no reload issued after it has already been applied, so overlapping
//! reloads settle on the most recently issued one.

mod appointments;
mod clients;
mod dashboard;
mod services;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use crate::store::appointments::AppointmentFilter;
pub use crate::store::dashboard::DashboardSnapshot;

use crate::api::{ApiClient, Method};
use crate::error::ApiError;
use crate::model::{AppointmentRecord, ClientRecord, EntityKind, ServiceRecord};

/// Synchronous yes/no gate shown before destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Result of a gated mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The user declined the confirmation; nothing was sent.
    Declined,
}

/// Screen currently shown. Appointment changes refresh the dashboard only
/// while it is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Dashboard,
    Appointments,
    Clients,
    Services,
}

/// One wholesale-replaced collection plus its reload ordering state.
#[derive(Debug)]
struct Collection<T> {
    items: RwLock<Vec<T>>,
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl<T: Clone> Collection<T> {
    fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    fn snapshot(&self) -> Vec<T> {
        self.items
            .read()
            .map(|items| items.clone())
            .unwrap_or_default()
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.items
            .read()
            .ok()
            .and_then(|items| items.iter().find(|item| pred(item)).cloned())
    }

    fn ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the contents if `ticket` is not older than the last applied
    /// reload. Returns whether the items were applied.
    fn apply(&self, ticket: u64, items: Vec<T>) -> bool {
        let Ok(mut applied) = self.applied.lock() else {
            return false;
        };
        if ticket < *applied {
            return false;
        }
        let Ok(mut slot) = self.items.write() else {
            return false;
        };
        *slot = items;
        *applied = ticket;
        true
    }
}

pub struct EntityStore {
    api: Arc<ApiClient>,
    confirm: Arc<dyn Confirm>,
    clients: Collection<ClientRecord>,
    services: Collection<ServiceRecord>,
    appointments: Collection<AppointmentRecord>,
    dashboard: RwLock<Option<DashboardSnapshot>>,
    page: RwLock<Page>,
}

impl EntityStore {
    pub fn new(api: Arc<ApiClient>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            api,
            confirm,
            clients: Collection::new(),
            services: Collection::new(),
            appointments: Collection::new(),
            dashboard: RwLock::new(None),
            page: RwLock::new(Page::default()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn active_page(&self) -> Page {
        self.page.read().map(|page| *page).unwrap_or_default()
    }

    pub fn set_active_page(&self, page: Page) {
        if let Ok(mut slot) = self.page.write() {
            *slot = page;
        }
    }

    /// Switch screens and load the data the new screen shows.
    pub async fn navigate(&self, page: Page) -> Result<(), ApiError> {
        self.set_active_page(page);
        match page {
            Page::Dashboard => self.load_dashboard().await,
            Page::Appointments => self.load_appointments().await.map(|_| ()),
            Page::Clients => self.load_clients().await.map(|_| ()),
            Page::Services => self.load_services().await.map(|_| ()),
        }
    }

    /// Initial population. Each load is independent; failures are logged and
    /// the remaining loads still run.
    pub async fn initialize(&self) {
        if let Err(e) = self.load_dashboard().await {
            tracing::error!(error = %e, "Failed to load dashboard");
        }
        for kind in [EntityKind::Client, EntityKind::Service, EntityKind::Appointment] {
            if let Err(e) = self.load_kind(kind).await {
                tracing::error!(kind = %kind, error = %e, "Failed to load collection");
            }
        }
    }

    /// Reload one collection from the backend (unfiltered).
    pub async fn load_kind(&self, kind: EntityKind) -> Result<usize, ApiError> {
        match kind {
            EntityKind::Client => self.load_clients().await,
            EntityKind::Service => self.load_services().await,
            EntityKind::Appointment => self.load_appointments().await,
        }
    }

    async fn reload<T>(
        &self,
        kind: EntityKind,
        collection: &Collection<T>,
        query: Vec<(String, String)>,
    ) -> Result<usize, ApiError>
    where
        T: DeserializeOwned + Clone,
    {
        let ticket = collection.ticket();
        let items: Vec<T> = self.api.get_json(kind.resource(), query).await?;
        let count = items.len();
        if collection.apply(ticket, items) {
            tracing::debug!(kind = %kind, count, ticket, "Collection reloaded");
        } else {
            tracing::debug!(kind = %kind, ticket, "Discarding superseded reload");
        }
        Ok(count)
    }

    fn confirmed(&self, prompt: &str) -> bool {
        let approved = self.confirm.confirm(prompt);
        if !approved {
            tracing::info!(prompt, "Action declined at confirmation");
        }
        approved
    }

    /// Send a mutation, then reload the kind and raise `success`.
    async fn mutate<B: Serialize>(
        &self,
        kind: EntityKind,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        success: &str,
    ) -> Result<(), ApiError> {
        if let Err(e) = self.api.send_json(method, endpoint, body).await {
            tracing::warn!(kind = %kind, %method, endpoint, error = %e, "Mutation rejected");
            return Err(e);
        }

        if let Err(e) = self.load_kind(kind).await {
            tracing::error!(kind = %kind, error = %e, "Reload after mutation failed");
        }
        if kind == EntityKind::Appointment && self.active_page() == Page::Dashboard {
            if let Err(e) = self.load_dashboard().await {
                tracing::error!(error = %e, "Dashboard refresh after mutation failed");
            }
        }

        self.api.notifier().success(success);
        Ok(())
    }
}
