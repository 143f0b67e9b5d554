use chrono::NaiveDate;

use crate::api::Method;
use crate::error::ApiError;
use crate::model::{
    AppointmentPayload, AppointmentRecord, AppointmentStatus, EntityKind, StatusPayload,
};
use crate::store::{EntityStore, Outcome};

/// Server-side filter for the appointment listing. Present constraints are
/// ANDed; an empty filter sends no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    /// Whole day, sent as an inclusive start/end timestamp pair.
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub client_id: Option<i64>,
}

impl AppointmentFilter {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.status.is_none() && self.client_id.is_none()
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(date) = self.date {
            params.push(("data_inicio".to_string(), format!("{date}T00:00:00")));
            params.push(("data_fim".to_string(), format!("{date}T23:59:59")));
        }
        if let Some(status) = self.status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(client_id) = self.client_id {
            params.push(("cliente_id".to_string(), client_id.to_string()));
        }
        params
    }
}

impl EntityStore {
    pub fn appointments(&self) -> Vec<AppointmentRecord> {
        self.appointments.snapshot()
    }

    pub fn appointment(&self, id: i64) -> Option<AppointmentRecord> {
        self.appointments.find(|appointment| appointment.id == id)
    }

    /// Unfiltered reload, used after every appointment mutation.
    pub async fn load_appointments(&self) -> Result<usize, ApiError> {
        self.reload(EntityKind::Appointment, &self.appointments, Vec::new())
            .await
    }

    /// Replace the collection with the backend's filtered listing.
    pub async fn filter_appointments(&self, filter: &AppointmentFilter) -> Result<usize, ApiError> {
        tracing::debug!(?filter, "Filtering appointments");
        self.reload(EntityKind::Appointment, &self.appointments, filter.to_query())
            .await
    }

    pub async fn create_appointment(&self, payload: &AppointmentPayload) -> Result<(), ApiError> {
        self.mutate(
            EntityKind::Appointment,
            Method::Post,
            EntityKind::Appointment.resource(),
            Some(payload),
            "Agendamento criado com sucesso!",
        )
        .await
    }

    pub async fn update_appointment(
        &self,
        id: i64,
        payload: &AppointmentPayload,
    ) -> Result<(), ApiError> {
        self.mutate(
            EntityKind::Appointment,
            Method::Put,
            &format!("/agendamentos/{id}"),
            Some(payload),
            "Agendamento atualizado com sucesso!",
        )
        .await
    }

    /// Cancelling asks for confirmation first.
    pub async fn set_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<Outcome, ApiError> {
        let success = match status {
            AppointmentStatus::Cancelled => {
                if !self.confirmed("Tem certeza que deseja cancelar este agendamento?") {
                    return Ok(Outcome::Declined);
                }
                "Agendamento cancelado!"
            }
            AppointmentStatus::Completed => "Agendamento concluído!",
            AppointmentStatus::Scheduled => "Status do agendamento atualizado!",
        };
        self.mutate(
            EntityKind::Appointment,
            Method::Patch,
            &format!("/agendamentos/{id}/status"),
            Some(&StatusPayload { status }),
            success,
        )
        .await
        .map(|()| Outcome::Applied)
    }

    pub async fn delete_appointment(&self, id: i64) -> Result<Outcome, ApiError> {
        if !self.confirmed("Tem certeza que deseja deletar este agendamento?") {
            return Ok(Outcome::Declined);
        }
        self.mutate::<()>(
            EntityKind::Appointment,
            Method::Delete,
            &format!("/agendamentos/{id}"),
            None,
            "Agendamento deletado com sucesso!",
        )
        .await
        .map(|()| Outcome::Applied)
    }
}
