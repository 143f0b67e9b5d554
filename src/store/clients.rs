use crate::api::Method;
use crate::error::ApiError;
use crate::model::{ClientPayload, ClientRecord, EntityKind};
use crate::store::{EntityStore, Outcome};

impl EntityStore {
    pub fn clients(&self) -> Vec<ClientRecord> {
        self.clients.snapshot()
    }

    pub fn client(&self, id: i64) -> Option<ClientRecord> {
        self.clients.find(|client| client.id == id)
    }

    pub async fn load_clients(&self) -> Result<usize, ApiError> {
        self.reload(EntityKind::Client, &self.clients, Vec::new())
            .await
    }

    pub async fn create_client(&self, payload: &ClientPayload) -> Result<(), ApiError> {
        self.mutate(
            EntityKind::Client,
            Method::Post,
            EntityKind::Client.resource(),
            Some(payload),
            "Cliente criado com sucesso!",
        )
        .await
    }

    pub async fn update_client(&self, id: i64, payload: &ClientPayload) -> Result<(), ApiError> {
        self.mutate(
            EntityKind::Client,
            Method::Put,
            &format!("/clientes/{id}"),
            Some(payload),
            "Cliente atualizado com sucesso!",
        )
        .await
    }

    pub async fn delete_client(&self, id: i64) -> Result<Outcome, ApiError> {
        if !self.confirmed("Tem certeza que deseja deletar este cliente?") {
            return Ok(Outcome::Declined);
        }
        self.mutate::<()>(
            EntityKind::Client,
            Method::Delete,
            &format!("/clientes/{id}"),
            None,
            "Cliente deletado com sucesso!",
        )
        .await
        .map(|()| Outcome::Applied)
    }
}
