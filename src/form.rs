//! The single active create/edit form.
//!
//! At most one form is open. Its target is the identity being edited, or
//! `None` in create mode. Opening a form replaces whatever was open before;
//! closing (or a successful submit) clears it, so a stale target never
//! outlives its form.
//!
//! Field values are held as the raw text a user typed and are only coerced
//! into typed payloads on submit.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::{Error, FormError};
use crate::model::{
    AppointmentPayload, AppointmentRecord, ClientPayload, ClientRecord, EntityKind,
    ServicePayload, ServiceRecord,
};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    ClientName,
    ClientPhone,
    ClientEmail,
    ServiceName,
    ServiceDescription,
    ServicePrice,
    ServiceDuration,
    AppointmentClient,
    AppointmentService,
    AppointmentDate,
    AppointmentTime,
    AppointmentNotes,
}

const CLIENT_FIELDS: &[FormField] = &[
    FormField::ClientName,
    FormField::ClientPhone,
    FormField::ClientEmail,
];
const SERVICE_FIELDS: &[FormField] = &[
    FormField::ServiceName,
    FormField::ServiceDescription,
    FormField::ServicePrice,
    FormField::ServiceDuration,
];
const APPOINTMENT_FIELDS: &[FormField] = &[
    FormField::AppointmentClient,
    FormField::AppointmentService,
    FormField::AppointmentDate,
    FormField::AppointmentTime,
    FormField::AppointmentNotes,
];

impl FormField {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::ClientName | Self::ClientPhone | Self::ClientEmail => EntityKind::Client,
            Self::ServiceName
            | Self::ServiceDescription
            | Self::ServicePrice
            | Self::ServiceDuration => EntityKind::Service,
            Self::AppointmentClient
            | Self::AppointmentService
            | Self::AppointmentDate
            | Self::AppointmentTime
            | Self::AppointmentNotes => EntityKind::Appointment,
        }
    }

    /// Label shown to users and used in validation messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::ClientName | Self::ServiceName => "nome",
            Self::ClientPhone => "telefone",
            Self::ClientEmail => "email",
            Self::ServiceDescription => "descricao",
            Self::ServicePrice => "preco",
            Self::ServiceDuration => "duracao",
            Self::AppointmentClient => "cliente",
            Self::AppointmentService => "servico",
            Self::AppointmentDate => "data",
            Self::AppointmentTime => "hora",
            Self::AppointmentNotes => "observacoes",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(
            self,
            Self::ClientEmail | Self::ServiceDescription | Self::AppointmentNotes
        )
    }

    pub fn fields_for(kind: EntityKind) -> &'static [FormField] {
        match kind {
            EntityKind::Client => CLIENT_FIELDS,
            EntityKind::Service => SERVICE_FIELDS,
            EntityKind::Appointment => APPOINTMENT_FIELDS,
        }
    }

    pub fn from_name(kind: EntityKind, name: &str) -> Option<Self> {
        Self::fields_for(kind)
            .iter()
            .copied()
            .find(|field| field.name() == name)
    }
}

/// Payload produced by a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Client(ClientPayload),
    Service(ServicePayload),
    Appointment(AppointmentPayload),
}

#[derive(Debug, Clone)]
struct OpenForm {
    kind: EntityKind,
    target: Option<i64>,
    fields: BTreeMap<FormField, String>,
    /// Earliest appointment date accepted in create mode.
    min_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct FormSession {
    offset: FixedOffset,
    open: Option<OpenForm>,
}

impl FormSession {
    /// `offset` is the local offset used to split and compose appointment
    /// date/time fields.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset, open: None }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn kind(&self) -> Option<EntityKind> {
        self.open.as_ref().map(|form| form.kind)
    }

    /// Identity being edited; `None` when closed or in create mode.
    pub fn target(&self) -> Option<i64> {
        self.open.as_ref().and_then(|form| form.target)
    }

    pub fn field(&self, field: FormField) -> Option<&str> {
        self.open
            .as_ref()
            .and_then(|form| form.fields.get(&field))
            .map(String::as_str)
    }

    pub fn title(&self) -> Option<&'static str> {
        let form = self.open.as_ref()?;
        Some(match (form.kind, form.target.is_some()) {
            (EntityKind::Client, true) => "Editar Cliente",
            (EntityKind::Client, false) => "Novo Cliente",
            (EntityKind::Service, true) => "Editar Serviço",
            (EntityKind::Service, false) => "Novo Serviço",
            (EntityKind::Appointment, true) => "Editar Agendamento",
            (EntityKind::Appointment, false) => "Novo Agendamento",
        })
    }

    /// Open the `kind` form. With `id`, fields are populated from the store's
    /// current snapshot; an id that is not loaded leaves the session as it
    /// was. Without `id`, every field starts empty.
    pub fn open(
        &mut self,
        kind: EntityKind,
        id: Option<i64>,
        store: &EntityStore,
    ) -> Result<(), FormError> {
        let fields = match id {
            Some(id) => {
                let missing = FormError::UnknownEntity { kind, id };
                match kind {
                    EntityKind::Client => client_fields(&store.client(id).ok_or(missing)?),
                    EntityKind::Service => service_fields(&store.service(id).ok_or(missing)?),
                    EntityKind::Appointment => {
                        appointment_fields(&store.appointment(id).ok_or(missing)?, self.offset)
                    }
                }
            }
            None => FormField::fields_for(kind)
                .iter()
                .map(|field| (*field, String::new()))
                .collect(),
        };

        let min_date = (kind == EntityKind::Appointment && id.is_none())
            .then(|| Utc::now().with_timezone(&self.offset).date_naive());

        tracing::debug!(kind = %kind, ?id, "Form opened");
        self.open = Some(OpenForm {
            kind,
            target: id,
            fields,
            min_date,
        });
        Ok(())
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> Result<(), FormError> {
        let form = self.open.as_mut().ok_or(FormError::NoActiveSession)?;
        if field.kind() != form.kind {
            return Err(FormError::FieldKindMismatch {
                field: field.name(),
                kind: form.kind,
            });
        }
        form.fields.insert(field, value.into());
        Ok(())
    }

    /// Hide the form and forget its target.
    pub fn close(&mut self) {
        if let Some(form) = self.open.take() {
            tracing::debug!(kind = %form.kind, target = ?form.target, "Form closed");
        }
    }

    /// Coerce the current field values into the open kind's payload.
    pub fn payload(&self) -> Result<FormPayload, FormError> {
        let form = self.open.as_ref().ok_or(FormError::NoActiveSession)?;
        let fields = Fields(&form.fields);
        match form.kind {
            EntityKind::Client => Ok(FormPayload::Client(ClientPayload {
                name: fields.required(FormField::ClientName)?,
                phone: fields.required(FormField::ClientPhone)?,
                email: fields.optional(FormField::ClientEmail),
            })),
            EntityKind::Service => Ok(FormPayload::Service(ServicePayload {
                name: fields.required(FormField::ServiceName)?,
                description: fields.optional(FormField::ServiceDescription).unwrap_or_default(),
                price: parse_price(&fields.required(FormField::ServicePrice)?)?,
                duration_minutes: parse_number(FormField::ServiceDuration, &fields)?,
            })),
            EntityKind::Appointment => {
                let date = parse_date(&fields.required(FormField::AppointmentDate)?)?;
                let time = parse_time(&fields.required(FormField::AppointmentTime)?)?;
                if let Some(min_date) = form.min_date
                    && date < min_date
                {
                    return Err(FormError::InvalidField {
                        field: FormField::AppointmentDate.name(),
                        reason: "Não é possível agendar para datas passadas".to_string(),
                    });
                }
                let scheduled_at = self
                    .offset
                    .from_local_datetime(&date.and_time(time))
                    .single()
                    .ok_or_else(|| FormError::InvalidField {
                        field: FormField::AppointmentTime.name(),
                        reason: "horário inexistente".to_string(),
                    })?
                    .with_timezone(&Utc);

                Ok(FormPayload::Appointment(AppointmentPayload {
                    client_id: parse_number(FormField::AppointmentClient, &fields)?,
                    service_id: parse_number(FormField::AppointmentService, &fields)?,
                    scheduled_at,
                    notes: fields.optional(FormField::AppointmentNotes).unwrap_or_default(),
                }))
            }
        }
    }

    /// Build the payload and send it: update when editing, create otherwise.
    /// The form closes only on success; coercion failures raise an error
    /// notification and leave it open.
    pub async fn submit(&mut self, store: &EntityStore) -> Result<(), Error> {
        let target = self.target();
        let payload = match self.payload() {
            Ok(payload) => payload,
            Err(e) => {
                if e != FormError::NoActiveSession {
                    store.api().notifier().error(e.to_string());
                }
                return Err(e.into());
            }
        };

        match (payload, target) {
            (FormPayload::Client(p), Some(id)) => store.update_client(id, &p).await?,
            (FormPayload::Client(p), None) => store.create_client(&p).await?,
            (FormPayload::Service(p), Some(id)) => store.update_service(id, &p).await?,
            (FormPayload::Service(p), None) => store.create_service(&p).await?,
            (FormPayload::Appointment(p), Some(id)) => store.update_appointment(id, &p).await?,
            (FormPayload::Appointment(p), None) => store.create_appointment(&p).await?,
        }

        self.close();
        Ok(())
    }
}

struct Fields<'a>(&'a BTreeMap<FormField, String>);

impl Fields<'_> {
    fn raw(&self, field: FormField) -> &str {
        self.0.get(&field).map(|v| v.trim()).unwrap_or_default()
    }

    fn required(&self, field: FormField) -> Result<String, FormError> {
        let value = self.raw(field);
        if value.is_empty() {
            return Err(FormError::MissingField {
                field: field.name(),
            });
        }
        Ok(value.to_string())
    }

    fn optional(&self, field: FormField) -> Option<String> {
        let value = self.raw(field);
        (!value.is_empty()).then(|| value.to_string())
    }
}

fn client_fields(client: &ClientRecord) -> BTreeMap<FormField, String> {
    BTreeMap::from([
        (FormField::ClientName, client.name.clone()),
        (FormField::ClientPhone, client.phone.clone()),
        (FormField::ClientEmail, client.email.clone().unwrap_or_default()),
    ])
}

fn service_fields(service: &ServiceRecord) -> BTreeMap<FormField, String> {
    BTreeMap::from([
        (FormField::ServiceName, service.name.clone()),
        (
            FormField::ServiceDescription,
            service.description.clone().unwrap_or_default(),
        ),
        (FormField::ServicePrice, service.price.normalize().to_string()),
        (FormField::ServiceDuration, service.duration_minutes.to_string()),
    ])
}

fn appointment_fields(
    appointment: &AppointmentRecord,
    offset: FixedOffset,
) -> BTreeMap<FormField, String> {
    let local = appointment.scheduled_at.with_timezone(&offset);
    BTreeMap::from([
        (FormField::AppointmentClient, appointment.client_id.to_string()),
        (FormField::AppointmentService, appointment.service_id.to_string()),
        (FormField::AppointmentDate, local.format("%Y-%m-%d").to_string()),
        (FormField::AppointmentTime, local.format("%H:%M").to_string()),
        (
            FormField::AppointmentNotes,
            appointment.notes.clone().unwrap_or_default(),
        ),
    ])
}

/// Accepts `35`, `35.5` and `35,50`.
fn parse_price(raw: &str) -> Result<Decimal, FormError> {
    let normalized = raw.replace(',', ".");
    Decimal::from_str(&normalized).map_err(|e| FormError::InvalidField {
        field: FormField::ServicePrice.name(),
        reason: e.to_string(),
    })
}

fn parse_number<T: FromStr>(field: FormField, fields: &Fields<'_>) -> Result<T, FormError>
where
    T::Err: std::fmt::Display,
{
    fields
        .required(field)?
        .parse()
        .map_err(|e: T::Err| FormError::InvalidField {
            field: field.name(),
            reason: e.to_string(),
        })
}

fn parse_date(raw: &str) -> Result<NaiveDate, FormError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| FormError::InvalidField {
        field: FormField::AppointmentDate.name(),
        reason: e.to_string(),
    })
}

fn parse_time(raw: &str) -> Result<NaiveTime, FormError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| FormError::InvalidField {
            field: FormField::AppointmentTime.name(),
            reason: e.to_string(),
        })
}
