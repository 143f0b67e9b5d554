use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::model::{
    AppointmentRecord, Availability, DailyRevenue, DashboardStats, FrequentClient, PopularService,
};
use crate::store::EntityStore;

/// Everything the dashboard screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub today: Vec<AppointmentRecord>,
    pub upcoming: Vec<AppointmentRecord>,
}

impl EntityStore {
    pub fn dashboard(&self) -> Option<DashboardSnapshot> {
        self.dashboard.read().ok().and_then(|slot| slot.clone())
    }

    /// Fetch statistics, today's and upcoming appointments, in that order.
    /// The snapshot is replaced only when all three succeed.
    pub async fn load_dashboard(&self) -> Result<(), ApiError> {
        let stats: DashboardStats = self
            .api
            .get_json("/dashboard/estatisticas", Vec::new())
            .await?;
        let today: Vec<AppointmentRecord> = self
            .api
            .get_json("/dashboard/agendamentos-hoje", Vec::new())
            .await?;
        let upcoming: Vec<AppointmentRecord> = self
            .api
            .get_json("/dashboard/proximos-agendamentos", Vec::new())
            .await?;

        tracing::debug!(
            today = today.len(),
            upcoming = upcoming.len(),
            "Dashboard reloaded"
        );
        if let Ok(mut slot) = self.dashboard.write() {
            *slot = Some(DashboardSnapshot {
                stats,
                today,
                upcoming,
            });
        }
        Ok(())
    }

    /// Top services of the current month.
    pub async fn popular_services(&self) -> Result<Vec<PopularService>, ApiError> {
        self.api
            .get_json("/dashboard/servicos-populares", Vec::new())
            .await
    }

    /// Completed-appointment revenue per day over the last 30 days.
    pub async fn daily_revenue(&self) -> Result<Vec<DailyRevenue>, ApiError> {
        self.api
            .get_json("/dashboard/receita-diaria", Vec::new())
            .await
    }

    pub async fn frequent_clients(&self) -> Result<Vec<FrequentClient>, ApiError> {
        self.api
            .get_json("/dashboard/clientes-frequentes", Vec::new())
            .await
    }

    /// Ask the backend whether `service_id` fits at `at`.
    pub async fn check_availability(
        &self,
        at: DateTime<Utc>,
        service_id: i64,
    ) -> Result<Availability, ApiError> {
        let query = vec![
            (
                "data".to_string(),
                at.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string(),
            ),
            ("servico_id".to_string(), service_id.to_string()),
        ];
        self.api
            .get_json("/agendamentos/disponibilidade", query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::api::Method;
    use crate::api::mock::ScriptedTransport;
    use crate::store::testing::{ScriptedConfirm, store_with};

    fn stats() -> serde_json::Value {
        json!({
            "total_clientes": 12,
            "total_servicos": 4,
            "agendamentos_hoje": 3,
            "agendamentos_semana": 9,
            "agendamentos_mes": 30,
            "receita_mes": 1234.5,
            "agendamentos_por_status": {"agendado": 20, "concluido": 9, "cancelado": 1}
        })
    }

    #[tokio::test]
    async fn dashboard_snapshot_is_kept_when_a_later_fetch_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::Get, "/dashboard/estatisticas", 200, stats());
        transport.respond(Method::Get, "/dashboard/agendamentos-hoje", 200, json!([]));
        transport.respond(Method::Get, "/dashboard/proximos-agendamentos", 200, json!([]));
        transport.respond(
            Method::Get,
            "/dashboard/proximos-agendamentos",
            500,
            json!({"erro": "database is locked"}),
        );
        let store = store_with(transport, Arc::new(ScriptedConfirm::replying(true)));

        store.load_dashboard().await.expect("first load");
        let first = store.dashboard().expect("snapshot");
        assert_eq!(first.stats.revenue_month, dec!(1234.5));
        assert_eq!(first.stats.by_status.get("concluido"), Some(&9));

        store.load_dashboard().await.expect_err("second load fails");
        assert_eq!(store.dashboard(), Some(first));
    }

    #[tokio::test]
    async fn availability_sends_naive_utc_timestamp() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::Get,
            "/agendamentos/disponibilidade",
            200,
            json!({"disponivel": true, "data": "2099-03-01T13:00:00", "servico_id": "2", "motivo": "Disponível"}),
        );
        let store = store_with(transport.clone(), Arc::new(ScriptedConfirm::replying(true)));

        let at = Utc.with_ymd_and_hms(2099, 3, 1, 13, 0, 0).unwrap();
        let availability = store.check_availability(at, 2).await.expect("availability");

        assert!(availability.available);
        let request = &transport.requests()[0];
        assert_eq!(request.query_value("data"), Some("2099-03-01T13:00:00"));
        assert_eq!(request.query_value("servico_id"), Some("2"));
    }
}
