//! Markdown rendering of view models, printed through `termimad`.

use crate::dispatch::Command;
use crate::model::{DailyRevenue, FrequentClient, PopularService};
use crate::view::format;
use crate::view::{
    AgendaItem, AppointmentRow, ClientRow, DashboardView, Listing, SelectOption, ServiceRow,
};

fn cell(text: &str) -> String {
    text.replace('|', "¦").replace('\n', " ")
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push('|');
    for header in headers {
        out.push_str(&format!("**{header}**|"));
    }
    out.push('\n');
    out.push('|');
    for _ in headers {
        out.push_str(":-|");
    }
    out.push('\n');
    for row in rows {
        out.push('|');
        for value in row {
            out.push_str(&cell(value));
            out.push('|');
        }
        out.push('\n');
    }
    out
}

fn listing<R>(
    title: &str,
    items: &Listing<R>,
    headers: &[&str],
    project: impl Fn(&R) -> Vec<String>,
) -> String {
    let body = match items {
        Listing::Rows(rows) => table(headers, &rows.iter().map(project).collect::<Vec<_>>()),
        Listing::Empty(placeholder) => format!("*{placeholder}*\n"),
    };
    format!("## {title}\n\n{body}")
}

fn keys(actions: &[Command]) -> String {
    actions
        .iter()
        .map(|command| format!("`{}`", command.key()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn clients(rows: &Listing<ClientRow>) -> String {
    listing(
        "Clientes",
        rows,
        &["Nome", "Telefone", "Email", "Cadastro", "Ações"],
        |row| {
            vec![
                row.name.clone(),
                row.phone.clone(),
                row.email.clone(),
                row.registered.clone(),
                keys(&row.actions),
            ]
        },
    )
}

pub fn services(rows: &Listing<ServiceRow>) -> String {
    listing(
        "Serviços",
        rows,
        &["Nome", "Descrição", "Preço", "Duração", "Status", "Ações"],
        |row| {
            vec![
                row.name.clone(),
                row.description.clone(),
                row.price.clone(),
                row.duration.clone(),
                row.state.to_string(),
                keys(&row.actions),
            ]
        },
    )
}

pub fn appointments(rows: &Listing<AppointmentRow>) -> String {
    listing(
        "Agendamentos",
        rows,
        &["Data/Hora", "Cliente", "Serviço", "Valor", "Status", "Ações"],
        |row| {
            vec![
                row.scheduled.clone(),
                row.client.clone(),
                row.service.clone(),
                row.price.clone(),
                row.status_label.to_string(),
                keys(&row.actions),
            ]
        },
    )
}

pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::from("# Dashboard\n\n");
    let cards: Vec<Vec<String>> = view
        .cards
        .iter()
        .map(|card| vec![card.label.to_string(), card.value.clone()])
        .collect();
    out.push_str(&table(&["Indicador", "Valor"], &cards));
    out.push('\n');

    let agenda = |item: &AgendaItem| {
        vec![
            item.time.clone(),
            item.client.clone(),
            item.service.clone(),
            item.detail.clone(),
        ]
    };
    out.push_str(&listing(
        "Agendamentos de Hoje",
        &view.today,
        &["Hora", "Cliente", "Serviço", "Valor"],
        agenda,
    ));
    out.push('\n');
    out.push_str(&listing(
        "Próximos Agendamentos",
        &view.upcoming,
        &["Hora", "Cliente", "Serviço", "Data"],
        agenda,
    ));
    out
}

pub fn options(title: &str, options: &[SelectOption]) -> String {
    let rows: Vec<Vec<String>> = options
        .iter()
        .map(|option| vec![option.id.to_string(), option.label.clone()])
        .collect();
    format!("## {title}\n\n{}", table(&["Id", "Opção"], &rows))
}

pub fn popular_services(services: &[PopularService]) -> String {
    let rows: Vec<Vec<String>> = services
        .iter()
        .map(|service| {
            vec![
                service.name.clone(),
                format::currency(service.price),
                service.appointment_count.to_string(),
                format::currency(service.revenue),
            ]
        })
        .collect();
    format!(
        "## Serviços Populares\n\n{}",
        table(&["Serviço", "Preço", "Agendamentos", "Receita"], &rows)
    )
}

pub fn daily_revenue(days: &[DailyRevenue]) -> String {
    let rows: Vec<Vec<String>> = days
        .iter()
        .map(|day| vec![format::date(day.date), format::currency(day.revenue)])
        .collect();
    format!(
        "## Receita Diária\n\n{}",
        table(&["Data", "Receita"], &rows)
    )
}

pub fn frequent_clients(clients: &[FrequentClient]) -> String {
    let rows: Vec<Vec<String>> = clients
        .iter()
        .map(|client| {
            vec![
                client.name.clone(),
                client.phone.clone(),
                client.appointment_count.to_string(),
                client
                    .last_appointment
                    .map(|at| format::date(at.date_naive()))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    format!(
        "## Clientes Frequentes\n\n{}",
        table(&["Cliente", "Telefone", "Agendamentos", "Último"], &rows)
    )
}
