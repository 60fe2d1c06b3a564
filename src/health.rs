use crate::api::Backend;
use crate::state::{AvailableModels, BackendStatus, HealthState};
use leptos::logging::{error, warn};
use leptos::*;
use std::rc::Rc;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Checking,
    Disconnected,
    Degraded,
    Connected,
}

impl Connection {
    pub fn of(status: Option<&BackendStatus>, loading: bool) -> Self {
        if loading {
            return Connection::Checking;
        }
        match status.map(|status| status.status) {
            None | Some(HealthState::Unhealthy) => Connection::Disconnected,
            Some(HealthState::Degraded) => Connection::Degraded,
            Some(HealthState::Healthy) => Connection::Connected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Connection::Checking => "Checking connection...",
            Connection::Disconnected => "Disconnected",
            Connection::Degraded => "Degraded",
            Connection::Connected => "Connected",
        }
    }
}

/// Provider line shown under the connection label, e.g. "OLLAMA Ready".
pub fn provider_summary(status: &BackendStatus) -> String {
    let readiness = if status.backend_health.status == "healthy" {
        "Ready"
    } else {
        "Not Available"
    };
    format!("{} {readiness}", status.model_provider.to_uppercase())
}

pub fn is_available(status: Option<&BackendStatus>) -> bool {
    matches!(status, Some(status) if status.status != HealthState::Unhealthy)
}

#[derive(Clone)]
pub struct HealthMonitor {
    status: RwSignal<Option<BackendStatus>>,
    models: RwSignal<Option<AvailableModels>>,
    loading: RwSignal<bool>,
    backend: Rc<dyn Backend>,
}

impl HealthMonitor {
    pub fn new(backend: Rc<dyn Backend>) -> Self {
        HealthMonitor {
            status: create_rw_signal(None),
            models: create_rw_signal(None),
            loading: create_rw_signal(true),
            backend,
        }
    }

    pub fn status(&self) -> ReadSignal<Option<BackendStatus>> {
        self.status.read_only()
    }

    pub fn models(&self) -> ReadSignal<Option<AvailableModels>> {
        self.models.read_only()
    }

    pub fn is_loading(&self) -> ReadSignal<bool> {
        self.loading.read_only()
    }

    /// Untracked gate used by the send flow.
    pub fn available(&self) -> bool {
        self.status.with_untracked(|status| is_available(status.as_ref()))
    }

    pub async fn mount(&self) {
        self.loading.set(true);
        futures::join!(self.check_status(), self.load_models(None));
        self.loading.set(false);
    }

    pub async fn check_status(&self) {
        let status = match self.backend.health().await {
            Ok(status) => status,
            Err(err) => {
                error!("Failed to check backend status: {err}");
                BackendStatus::unreachable()
            }
        };
        self.status.set(Some(status));
    }

    pub async fn load_models(&self, provider: Option<&str>) {
        let models = match self.backend.models(provider).await {
            Ok(models) => models,
            Err(err) => {
                error!("Failed to load models: {err}");
                AvailableModels::empty(provider)
            }
        };
        self.models.set(Some(models));
    }

    pub async fn refresh_models(&self, provider: &str) {
        self.load_models(Some(provider)).await
    }

    /// Re-checks health every [`POLL_INTERVAL`] until the owning scope is cleaned up.
    pub fn poll(&self) {
        let monitor = self.clone();
        let handle = set_interval_with_handle(
            move || {
                let monitor = monitor.clone();
                spawn_local(async move { monitor.check_status().await });
            },
            POLL_INTERVAL,
        );
        match handle {
            Ok(handle) => on_cleanup(move || handle.clear()),
            Err(err) => warn!("Could not schedule health checks: {err:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBackend;
    use crate::state::BackendHealth;
    use futures::executor::block_on;
    use leptos::create_runtime;

    fn healthy() -> BackendStatus {
        BackendStatus {
            status: HealthState::Healthy,
            model_provider: "ollama".to_string(),
            backend_health: BackendHealth {
                status: "healthy".to_string(),
                provider: "ollama".to_string(),
            },
        }
    }

    #[test]
    fn test_mount_fetches_health_and_models() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.health.borrow_mut() = Some(healthy());
        *backend.models.borrow_mut() = Some(AvailableModels {
            models: vec!["llama3.2".to_string(), "mistral".to_string()],
            provider: "ollama".to_string(),
        });
        let monitor = HealthMonitor::new(backend.clone());
        assert!(monitor.is_loading().get_untracked());
        assert!(!monitor.available());

        block_on(monitor.mount());

        assert!(!monitor.is_loading().get_untracked());
        assert_eq!(monitor.status().get_untracked(), Some(healthy()));
        assert_eq!(
            monitor.models().get_untracked().map(|m| m.models.len()),
            Some(2)
        );
        assert!(monitor.available());
        assert_eq!(backend.count("GET /health"), 1);
        assert_eq!(backend.count("GET /api/models?provider="), 1);
        runtime.dispose();
    }

    #[test]
    fn test_failures_are_synthesized() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::default());
        let monitor = HealthMonitor::new(backend.clone());

        block_on(monitor.mount());
        assert_eq!(
            monitor.status().get_untracked(),
            Some(BackendStatus::unreachable())
        );
        assert_eq!(
            monitor.models().get_untracked(),
            Some(AvailableModels::empty(None))
        );
        assert!(!monitor.available());

        block_on(monitor.refresh_models("lmstudio"));
        let models = monitor.models().get_untracked().unwrap();
        assert!(models.models.is_empty());
        assert_eq!(models.provider, "lmstudio");
        runtime.dispose();
    }

    #[test]
    fn test_status_replaced_wholesale() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.health.borrow_mut() = Some(healthy());
        let monitor = HealthMonitor::new(backend.clone());
        block_on(monitor.check_status());
        assert!(monitor.available());

        *backend.health.borrow_mut() = None;
        block_on(monitor.check_status());
        assert!(!monitor.available());
        runtime.dispose();
    }

    #[test]
    fn test_connection_labels() {
        let mut status = healthy();
        assert_eq!(Connection::of(Some(&status), true), Connection::Checking);
        assert_eq!(Connection::of(None, false), Connection::Disconnected);
        assert_eq!(Connection::of(Some(&status), false), Connection::Connected);
        assert_eq!(provider_summary(&status), "OLLAMA Ready");

        status.status = HealthState::Degraded;
        status.backend_health.status = "unhealthy".to_string();
        assert_eq!(Connection::of(Some(&status), false), Connection::Degraded);
        assert_eq!(provider_summary(&status), "OLLAMA Not Available");
        assert!(is_available(Some(&status)));
    }
}
