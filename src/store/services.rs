use crate::api::Method;
use crate::error::ApiError;
use crate::model::{EntityKind, ServicePayload, ServiceRecord};
use crate::store::{EntityStore, Outcome};

fn active_only_query(active_only: bool) -> Vec<(String, String)> {
    vec![("apenas_ativos".to_string(), active_only.to_string())]
}

impl EntityStore {
    pub fn services(&self) -> Vec<ServiceRecord> {
        self.services.snapshot()
    }

    pub fn service(&self, id: i64) -> Option<ServiceRecord> {
        self.services.find(|service| service.id == id)
    }

    /// Active services from the current snapshot, for appointment selectors.
    pub fn active_services(&self) -> Vec<ServiceRecord> {
        self.services
            .snapshot()
            .into_iter()
            .filter(|service| service.active)
            .collect()
    }

    /// The store keeps every service, active or not.
    pub async fn load_services(&self) -> Result<usize, ApiError> {
        self.reload(EntityKind::Service, &self.services, active_only_query(false))
            .await
    }

    /// One-off listing using the backend's active filter; does not touch the
    /// store.
    pub async fn list_services(&self, active_only: bool) -> Result<Vec<ServiceRecord>, ApiError> {
        self.api
            .get_json(EntityKind::Service.resource(), active_only_query(active_only))
            .await
    }

    pub async fn create_service(&self, payload: &ServicePayload) -> Result<(), ApiError> {
        self.mutate(
            EntityKind::Service,
            Method::Post,
            EntityKind::Service.resource(),
            Some(payload),
            "Serviço criado com sucesso!",
        )
        .await
    }

    pub async fn update_service(&self, id: i64, payload: &ServicePayload) -> Result<(), ApiError> {
        self.mutate(
            EntityKind::Service,
            Method::Put,
            &format!("/servicos/{id}"),
            Some(payload),
            "Serviço atualizado com sucesso!",
        )
        .await
    }

    pub async fn toggle_service_active(&self, id: i64) -> Result<(), ApiError> {
        self.mutate::<()>(
            EntityKind::Service,
            Method::Patch,
            &format!("/servicos/{id}/toggle"),
            None,
            "Status do serviço atualizado!",
        )
        .await
    }

    pub async fn delete_service(&self, id: i64) -> Result<Outcome, ApiError> {
        if !self.confirmed("Tem certeza que deseja deletar este serviço?") {
            return Ok(Outcome::Declined);
        }
        self.mutate::<()>(
            EntityKind::Service,
            Method::Delete,
            &format!("/servicos/{id}"),
            None,
            "Serviço deletado com sucesso!",
        )
        .await
        .map(|()| Outcome::Applied)
    }
}
