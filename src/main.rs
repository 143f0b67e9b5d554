//! salonbook command line.
//!
//! ```bash
//! salonbook dashboard
//! salonbook clients add --name Ana --phone 11999999999
//! salonbook appointments list --date 2024-01-05 --status agendado
//! salonbook run appointment:cancel:7
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use termimad::MadSkin;
use tracing_subscriber::EnvFilter;

use salonbook::api::{ApiClient, HttpTransport, Notification, NotificationLevel, Notifier};
use salonbook::config::Config;
use salonbook::dispatch::{self, Action, Command, Dispatched};
use salonbook::error::{ApiError, FormError};
use salonbook::form::{FormField, FormSession};
use salonbook::model::{AppointmentStatus, EntityKind};
use salonbook::settings::Settings;
use salonbook::store::{AppointmentFilter, AutoConfirm, Confirm, EntityStore, Outcome, Page};
use salonbook::view::{self, ViewContext, markdown};

#[derive(Parser)]
#[command(name = "salonbook")]
#[command(version)]
#[command(about = "Manage clients, services and appointments of a salon scheduling backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to ~/.salonbook/settings.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Statistics plus today's and upcoming appointments
    Dashboard,

    /// Manage clients
    #[command(subcommand)]
    Clients(ClientCommand),

    /// Manage services
    #[command(subcommand)]
    Services(ServiceCommand),

    /// Manage appointments
    #[command(subcommand)]
    Appointments(AppointmentCommand),

    /// Check whether a service fits at a given local date and time
    Availability {
        #[arg(long)]
        service: i64,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
    },

    /// Dashboard reports
    Reports {
        #[arg(value_enum)]
        report: Report,
    },

    /// Selector entries used when booking (clients or active services)
    Options {
        #[arg(value_enum)]
        of: OptionsOf,
    },

    /// Run a row action by key, e.g. `appointment:cancel:7`
    Run { key: String },
}

#[derive(Subcommand)]
enum ClientCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
enum ServiceCommand {
    List {
        /// Ask the backend for active services only
        #[arg(long)]
        active: bool,
    },
    Add {
        #[arg(long)]
        name: String,
        /// Accepts `35,50` or `35.50`
        #[arg(long)]
        price: String,
        /// Minutes
        #[arg(long)]
        duration: String,
        #[arg(long)]
        description: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Toggle {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
enum AppointmentCommand {
    List {
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        client: Option<i64>,
    },
    Add {
        #[arg(long)]
        client: String,
        #[arg(long)]
        service: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        notes: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Complete {
        id: i64,
    },
    Cancel {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Agendado,
    Concluido,
    Cancelado,
}

impl From<StatusArg> for AppointmentStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Agendado => Self::Scheduled,
            StatusArg::Concluido => Self::Completed,
            StatusArg::Cancelado => Self::Cancelled,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Report {
    Popular,
    Revenue,
    Frequent,
}

#[derive(Clone, Copy, ValueEnum)]
enum OptionsOf {
    Clients,
    Services,
}

/// Reads `s`/`sim`/`y`/`yes` from stdin.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [s/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(
            line.trim().to_lowercase().as_str(),
            "s" | "sim" | "y" | "yes"
        )
    }
}

struct App {
    store: EntityStore,
    session: FormSession,
    view: ViewContext,
    skin: MadSkin,
}

impl App {
    fn print(&self, markdown: &str) {
        self.skin.print_text(markdown);
    }

    /// Print what is still visible and forget everything raised so far.
    /// Print every pending notification, however old, and return them.
    fn flush_notifications(&self) -> Vec<Notification> {
        let notes = self.store.api().notifier().drain();
        for note in &notes {
            match note.level {
                NotificationLevel::Success => println!("✔ {}", note.message),
                NotificationLevel::Error => eprintln!("✖ {}", note.message),
            }
        }
        notes
    }

    fn fill(&mut self, values: Vec<(FormField, Option<String>)>) -> anyhow::Result<()> {
        for (field, value) in values {
            if let Some(value) = value {
                self.session.set_field(field, value)?;
            }
        }
        Ok(())
    }

    async fn create(
        &mut self,
        kind: EntityKind,
        values: Vec<(FormField, Option<String>)>,
    ) -> anyhow::Result<()> {
        self.store.load_kind(kind).await?;
        self.session.open(kind, None, &self.store)?;
        self.fill(values)?;
        self.session.submit(&self.store).await?;
        Ok(())
    }

    async fn edit(
        &mut self,
        kind: EntityKind,
        id: i64,
        values: Vec<(FormField, Option<String>)>,
    ) -> anyhow::Result<()> {
        self.store.load_kind(kind).await?;
        dispatch::dispatch(&self.store, &mut self.session, Command::new(kind, Action::Edit, id))
            .await?;
        self.fill(values)?;
        self.session.submit(&self.store).await?;
        Ok(())
    }

    async fn act(&mut self, command: Command) -> anyhow::Result<()> {
        self.store.load_kind(command.kind).await?;
        match dispatch::dispatch(&self.store, &mut self.session, command).await? {
            Dispatched::Mutation(Outcome::Declined) => println!("Operação cancelada."),
            Dispatched::Mutation(Outcome::Applied) => {}
            Dispatched::FormOpened => {
                let fields = self
                    .session
                    .kind()
                    .map(FormField::fields_for)
                    .unwrap_or_default();
                let mut md = format!("## {}\n\n", self.session.title().unwrap_or_default());
                for field in fields {
                    let value = self.session.field(*field).unwrap_or_default();
                    md.push_str(&format!("* **{}**: {}\n", field.name(), value));
                }
                self.print(&md);
                self.session.close();
            }
        }
        Ok(())
    }

    async fn run(&mut self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Dashboard => {
                self.store.navigate(Page::Dashboard).await?;
                if let Some(snapshot) = self.store.dashboard() {
                    self.print(&markdown::dashboard(&self.view.dashboard(&snapshot)));
                }
            }
            Commands::Clients(command) => self.clients(command).await?,
            Commands::Services(command) => self.services(command).await?,
            Commands::Appointments(command) => self.appointments(command).await?,
            Commands::Availability {
                service,
                date,
                time,
            } => {
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .with_context(|| format!("invalid date '{date}'"))?;
                let time = NaiveTime::parse_from_str(&time, "%H:%M")
                    .with_context(|| format!("invalid time '{time}'"))?;
                let at = self
                    .view
                    .offset
                    .from_local_datetime(&date.and_time(time))
                    .single()
                    .context("ambiguous local time")?
                    .with_timezone(&Utc);
                let availability = self.store.check_availability(at, service).await?;
                let mark = if availability.available { "✔" } else { "✖" };
                println!("{mark} {}", availability.reason);
            }
            Commands::Reports { report } => {
                let md = match report {
                    Report::Popular => markdown::popular_services(&self.store.popular_services().await?),
                    Report::Revenue => markdown::daily_revenue(&self.store.daily_revenue().await?),
                    Report::Frequent => {
                        markdown::frequent_clients(&self.store.frequent_clients().await?)
                    }
                };
                self.print(&md);
            }
            Commands::Options { of } => {
                let md = match of {
                    OptionsOf::Clients => {
                        self.store.load_clients().await?;
                        markdown::options("Clientes", &view::client_options(&self.store.clients()))
                    }
                    OptionsOf::Services => {
                        self.store.load_services().await?;
                        markdown::options("Serviços", &view::service_options(&self.store.services()))
                    }
                };
                self.print(&md);
            }
            Commands::Run { key } => {
                let command = Command::parse(&key)?;
                self.act(command).await?;
            }
        }
        Ok(())
    }

    async fn clients(&mut self, command: ClientCommand) -> anyhow::Result<()> {
        self.store.set_active_page(Page::Clients);
        match command {
            ClientCommand::List => {
                self.store.load_clients().await?;
                self.print(&markdown::clients(&self.view.clients(&self.store.clients())));
            }
            ClientCommand::Add { name, phone, email } => {
                self.create(
                    EntityKind::Client,
                    vec![
                        (FormField::ClientName, Some(name)),
                        (FormField::ClientPhone, Some(phone)),
                        (FormField::ClientEmail, email),
                    ],
                )
                .await?;
            }
            ClientCommand::Edit {
                id,
                name,
                phone,
                email,
            } => {
                self.edit(
                    EntityKind::Client,
                    id,
                    vec![
                        (FormField::ClientName, name),
                        (FormField::ClientPhone, phone),
                        (FormField::ClientEmail, email),
                    ],
                )
                .await?;
            }
            ClientCommand::Delete { id } => {
                self.act(Command::new(EntityKind::Client, Action::Delete, id))
                    .await?;
            }
        }
        Ok(())
    }

    async fn services(&mut self, command: ServiceCommand) -> anyhow::Result<()> {
        self.store.set_active_page(Page::Services);
        match command {
            ServiceCommand::List { active } => {
                let services = if active {
                    self.store.list_services(true).await?
                } else {
                    self.store.load_services().await?;
                    self.store.services()
                };
                self.print(&markdown::services(&self.view.services(&services)));
            }
            ServiceCommand::Add {
                name,
                price,
                duration,
                description,
            } => {
                self.create(
                    EntityKind::Service,
                    vec![
                        (FormField::ServiceName, Some(name)),
                        (FormField::ServicePrice, Some(price)),
                        (FormField::ServiceDuration, Some(duration)),
                        (FormField::ServiceDescription, description),
                    ],
                )
                .await?;
            }
            ServiceCommand::Edit {
                id,
                name,
                price,
                duration,
                description,
            } => {
                self.edit(
                    EntityKind::Service,
                    id,
                    vec![
                        (FormField::ServiceName, name),
                        (FormField::ServicePrice, price),
                        (FormField::ServiceDuration, duration),
                        (FormField::ServiceDescription, description),
                    ],
                )
                .await?;
            }
            ServiceCommand::Toggle { id } => {
                self.act(Command::new(EntityKind::Service, Action::ToggleActive, id))
                    .await?;
            }
            ServiceCommand::Delete { id } => {
                self.act(Command::new(EntityKind::Service, Action::Delete, id))
                    .await?;
            }
        }
        Ok(())
    }

    async fn appointments(&mut self, command: AppointmentCommand) -> anyhow::Result<()> {
        self.store.set_active_page(Page::Appointments);
        match command {
            AppointmentCommand::List {
                date,
                status,
                client,
            } => {
                let filter = AppointmentFilter {
                    date,
                    status: status.map(AppointmentStatus::from),
                    client_id: client,
                };
                if filter.is_empty() {
                    self.store.load_appointments().await?;
                } else {
                    self.store.filter_appointments(&filter).await?;
                }
                self.print(&markdown::appointments(
                    &self.view.appointments(&self.store.appointments()),
                ));
            }
            AppointmentCommand::Add {
                client,
                service,
                date,
                time,
                notes,
            } => {
                self.create(
                    EntityKind::Appointment,
                    vec![
                        (FormField::AppointmentClient, Some(client)),
                        (FormField::AppointmentService, Some(service)),
                        (FormField::AppointmentDate, Some(date)),
                        (FormField::AppointmentTime, Some(time)),
                        (FormField::AppointmentNotes, notes),
                    ],
                )
                .await?;
            }
            AppointmentCommand::Edit {
                id,
                client,
                service,
                date,
                time,
                notes,
            } => {
                self.edit(
                    EntityKind::Appointment,
                    id,
                    vec![
                        (FormField::AppointmentClient, client),
                        (FormField::AppointmentService, service),
                        (FormField::AppointmentDate, date),
                        (FormField::AppointmentTime, time),
                        (FormField::AppointmentNotes, notes),
                    ],
                )
                .await?;
            }
            AppointmentCommand::Complete { id } => {
                self.act(Command::new(EntityKind::Appointment, Action::Complete, id))
                    .await?;
            }
            AppointmentCommand::Cancel { id } => {
                self.act(Command::new(EntityKind::Appointment, Action::Cancel, id))
                    .await?;
            }
            AppointmentCommand::Delete { id } => {
                self.act(Command::new(EntityKind::Appointment, Action::Delete, id))
                    .await?;
            }
        }
        Ok(())
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let settings = match cli.settings.clone().or_else(Settings::default_path) {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    let mut config = Config::resolve(&settings)?;
    if cli.yes {
        config.display.assume_yes = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("salonbook=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(base_url = %config.api.base_url, "Configuration resolved");

    let transport = HttpTransport::from_config(&config.api)?;
    let api = Arc::new(ApiClient::new(
        Arc::new(transport),
        Notifier::new(config.notifications.ttl),
    ));
    let confirm: Arc<dyn Confirm> = if config.display.assume_yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirm)
    };

    let mut app = App {
        store: EntityStore::new(api, confirm),
        session: FormSession::new(config.display.utc_offset),
        view: ViewContext::new(config.display.utc_offset),
        skin: MadSkin::default(),
    };

    let result = app.run(cli.command).await;
    let notes = app.flush_notifications();
    match result {
        Err(err) if already_notified(&err, &notes) => {
            tracing::debug!(error = %err, "Command failed");
            std::process::exit(1);
        }
        other => other,
    }
}

/// The text a failed command already showed as an error notification.
fn notified_message(err: &anyhow::Error) -> Option<String> {
    if let Some(e) = err.downcast_ref::<ApiError>() {
        return Some(e.user_message());
    }
    if let Some(e) = err.downcast_ref::<FormError>() {
        return Some(e.to_string());
    }
    match err.downcast_ref::<salonbook::Error>()? {
        salonbook::Error::Api(e) => Some(e.user_message()),
        salonbook::Error::Form(e) => Some(e.to_string()),
        _ => None,
    }
}

/// Whether `err` was already printed as one of the flushed `notes`.
fn already_notified(err: &anyhow::Error, notes: &[Notification]) -> bool {
    notified_message(err).is_some_and(|message| {
        notes
            .iter()
            .any(|note| note.level == NotificationLevel::Error && note.message == message)
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use salonbook::api::{Notification, NotificationLevel};
    use salonbook::error::{ApiError, FormError};

    fn error_note(message: &str) -> Notification {
        Notification {
            level: NotificationLevel::Error,
            message: message.to_string(),
            raised_at: Utc::now(),
        }
    }

    #[test]
    fn backend_error_shown_as_notification_is_not_reported_again() {
        let err = anyhow::Error::from(ApiError::Request {
            status: 400,
            message: "Telefone inválido".to_string(),
        });
        assert!(super::already_notified(&err, &[error_note("Telefone inválido")]));

        let wrapped = anyhow::Error::from(salonbook::Error::from(ApiError::Request {
            status: 409,
            message: "Horário ocupado".to_string(),
        }));
        assert!(super::already_notified(&wrapped, &[error_note("Horário ocupado")]));
    }

    #[test]
    fn errors_without_a_matching_notification_are_still_reported() {
        let field = anyhow::Error::from(FormError::MissingField {
            field: "nome",
        });
        assert!(!super::already_notified(&field, &[]));

        let success = Notification {
            level: NotificationLevel::Success,
            ..error_note("Telefone inválido")
        };
        let err = anyhow::Error::from(ApiError::Request {
            status: 400,
            message: "Telefone inválido".to_string(),
        });
        assert!(!super::already_notified(&err, &[success]));

        let config = anyhow::anyhow!("settings file unreadable");
        assert!(!super::already_notified(&config, &[error_note("settings file unreadable")]));
    }
}
