//! Snapshot to view-model projections.
//!
//! Everything here is a pure function of the records passed in: rows carry
//! display strings plus the [`Command`]s offered for them. Status-changing
//! actions are only offered for appointments that are still scheduled.
//! Turning the view models into terminal output lives in [`markdown`].

pub mod format;
pub mod markdown;

use chrono::FixedOffset;

use crate::dispatch::{Action, Command};
use crate::model::{
    AppointmentRecord, AppointmentStatus, ClientRecord, EntityKind, ServiceRecord,
};
use crate::store::{DashboardSnapshot, EntityStore};

pub const NO_CLIENTS: &str = "Nenhum cliente cadastrado";
pub const NO_SERVICES: &str = "Nenhum serviço cadastrado";
pub const NO_APPOINTMENTS: &str = "Nenhum agendamento encontrado";
pub const NO_APPOINTMENTS_TODAY: &str = "Nenhum agendamento para hoje";
pub const NO_UPCOMING_APPOINTMENTS: &str = "Nenhum agendamento próximo";

const MISSING: &str = "-";

/// Rows of a listing, or the placeholder shown instead of an empty table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing<R> {
    Rows(Vec<R>),
    Empty(&'static str),
}

impl<R> Listing<R> {
    fn from_rows(rows: Vec<R>, placeholder: &'static str) -> Self {
        if rows.is_empty() {
            Self::Empty(placeholder)
        } else {
            Self::Rows(rows)
        }
    }

    pub fn rows(&self) -> &[R] {
        match self {
            Self::Rows(rows) => rows,
            Self::Empty(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub registered: String,
    pub actions: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub active: bool,
    pub state: &'static str,
    pub actions: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRow {
    pub id: i64,
    pub scheduled: String,
    pub client: String,
    pub service: String,
    pub price: String,
    pub status: AppointmentStatus,
    pub status_label: &'static str,
    pub actions: Vec<Command>,
}

/// Compact appointment entry on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaItem {
    pub id: i64,
    pub client: String,
    pub service: String,
    /// Price for today's entries, date for upcoming ones.
    pub detail: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub cards: Vec<StatCard>,
    pub today: Listing<AgendaItem>,
    pub upcoming: Listing<AgendaItem>,
}

/// Entry of a client or service selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub id: i64,
    pub label: String,
}

pub fn client_actions(client: &ClientRecord) -> Vec<Command> {
    vec![
        Command::new(EntityKind::Client, Action::Edit, client.id),
        Command::new(EntityKind::Client, Action::Delete, client.id),
    ]
}

pub fn service_actions(service: &ServiceRecord) -> Vec<Command> {
    vec![
        Command::new(EntityKind::Service, Action::Edit, service.id),
        Command::new(EntityKind::Service, Action::ToggleActive, service.id),
        Command::new(EntityKind::Service, Action::Delete, service.id),
    ]
}

pub fn appointment_actions(appointment: &AppointmentRecord) -> Vec<Command> {
    let id = appointment.id;
    let mut actions = vec![Command::new(EntityKind::Appointment, Action::Edit, id)];
    if !appointment.status.is_terminal() {
        actions.push(Command::new(EntityKind::Appointment, Action::Complete, id));
        actions.push(Command::new(EntityKind::Appointment, Action::Cancel, id));
    }
    actions.push(Command::new(EntityKind::Appointment, Action::Delete, id));
    actions
}

/// Actions currently offered for one loaded entity; `None` if it is not in
/// the store.
pub fn actions_for(store: &EntityStore, kind: EntityKind, id: i64) -> Option<Vec<Command>> {
    match kind {
        EntityKind::Client => store.client(id).map(|c| client_actions(&c)),
        EntityKind::Service => store.service(id).map(|s| service_actions(&s)),
        EntityKind::Appointment => store.appointment(id).map(|a| appointment_actions(&a)),
    }
}

/// Projection settings.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext {
    pub offset: FixedOffset,
}

impl ViewContext {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn clients(&self, clients: &[ClientRecord]) -> Listing<ClientRow> {
        let rows = clients
            .iter()
            .map(|client| ClientRow {
                id: client.id,
                name: client.name.clone(),
                phone: client.phone.clone(),
                email: non_empty(client.email.as_deref()),
                registered: client
                    .registered_at
                    .map(|at| format::date(at.with_timezone(&self.offset).date_naive()))
                    .unwrap_or_else(|| MISSING.to_string()),
                actions: client_actions(client),
            })
            .collect();
        Listing::from_rows(rows, NO_CLIENTS)
    }

    pub fn services(&self, services: &[ServiceRecord]) -> Listing<ServiceRow> {
        let rows = services
            .iter()
            .map(|service| ServiceRow {
                id: service.id,
                name: service.name.clone(),
                description: non_empty(service.description.as_deref()),
                price: format::currency(service.price),
                duration: format!("{} min", service.duration_minutes),
                active: service.active,
                state: if service.active { "Ativo" } else { "Inativo" },
                actions: service_actions(service),
            })
            .collect();
        Listing::from_rows(rows, NO_SERVICES)
    }

    pub fn appointments(&self, appointments: &[AppointmentRecord]) -> Listing<AppointmentRow> {
        let rows = appointments
            .iter()
            .map(|appointment| AppointmentRow {
                id: appointment.id,
                scheduled: format::date_time(appointment.scheduled_at, self.offset),
                client: non_empty(appointment.client_name.as_deref()),
                service: non_empty(appointment.service_name.as_deref()),
                price: appointment
                    .service_price
                    .map(format::currency)
                    .unwrap_or_else(|| MISSING.to_string()),
                status: appointment.status,
                status_label: appointment.status.label(),
                actions: appointment_actions(appointment),
            })
            .collect();
        Listing::from_rows(rows, NO_APPOINTMENTS)
    }

    pub fn dashboard(&self, snapshot: &DashboardSnapshot) -> DashboardView {
        let stats = &snapshot.stats;
        let cards = vec![
            StatCard {
                label: "Total de Clientes",
                value: stats.total_clients.to_string(),
            },
            StatCard {
                label: "Agendamentos Hoje",
                value: stats.appointments_today.to_string(),
            },
            StatCard {
                label: "Serviços Ativos",
                value: stats.active_services.to_string(),
            },
            StatCard {
                label: "Receita do Mês",
                value: format::currency(stats.revenue_month),
            },
        ];

        let today = snapshot
            .today
            .iter()
            .map(|appointment| {
                self.agenda_item(
                    appointment,
                    appointment
                        .service_price
                        .map(format::currency)
                        .unwrap_or_else(|| MISSING.to_string()),
                )
            })
            .collect();
        let upcoming = snapshot
            .upcoming
            .iter()
            .map(|appointment| {
                let day = appointment.scheduled_at.with_timezone(&self.offset).date_naive();
                self.agenda_item(appointment, format::date(day))
            })
            .collect();

        DashboardView {
            cards,
            today: Listing::from_rows(today, NO_APPOINTMENTS_TODAY),
            upcoming: Listing::from_rows(upcoming, NO_UPCOMING_APPOINTMENTS),
        }
    }

    fn agenda_item(&self, appointment: &AppointmentRecord, detail: String) -> AgendaItem {
        AgendaItem {
            id: appointment.id,
            client: non_empty(appointment.client_name.as_deref()),
            service: non_empty(appointment.service_name.as_deref()),
            detail,
            time: format::time(appointment.scheduled_at, self.offset),
        }
    }
}

/// `Corte - R$ 35,00 (30min)`, active services only.
pub fn service_options(services: &[ServiceRecord]) -> Vec<SelectOption> {
    services
        .iter()
        .filter(|service| service.active)
        .map(|service| SelectOption {
            id: service.id,
            label: format!(
                "{} - {} ({}min)",
                service.name,
                format::currency(service.price),
                service.duration_minutes
            ),
        })
        .collect()
}

/// `Ana - 11999999999`
pub fn client_options(clients: &[ClientRecord]) -> Vec<SelectOption> {
    clients
        .iter()
        .map(|client| SelectOption {
            id: client.id,
            label: format!("{} - {}", client.name, client.phone),
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => MISSING.to_string(),
    }
}
