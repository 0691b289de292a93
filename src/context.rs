//! Process-wide service object. Built once at startup (or once per test) and
//! passed by reference to everything that needs the session, the notifier or
//! the message resolver. Nothing in the crate reaches for ambient globals.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::ClientConfig;
use crate::domain::{Announcements, Buildings, Dashboard, GlobalSearch, Inspections, Items, Rooms, Students, Users};
use crate::error::ApiResult;
use crate::guard::{LocaleRouting, NavigationGuard};
use crate::i18n::{Catalog, Messages};
use crate::identity::SessionManager;
use crate::notify::Notifier;
use crate::resource::ResourceClient;
use crate::transport::{HttpTransport, Transport};

pub struct ServiceContext {
    config: ClientConfig,
    session: Arc<SessionManager>,
    notifier: Notifier,
    messages: Messages,
}

impl ServiceContext {
    /// HTTP transport against `config.api_base`, plus the message catalog if configured.
    pub fn from_config(config: ClientConfig) -> ApiResult<Self> {
        let transport = HttpTransport::new(&config.api_base, config.http_timeout)?;
        let messages = match config.messages_path.as_deref() {
            Some(p) => {
                let cat = Catalog::load(Path::new(p))?;
                info!(target: "config", path = p, entries = cat.len(), "message catalog loaded");
                Messages::new(Arc::new(cat))
            }
            None => Messages::default(),
        };
        info!(target: "config", api_base = %config.api_base, locale = %config.locale, "service context ready");
        Ok(Self::with_transport(config, Arc::new(transport), messages))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>, messages: Messages) -> Self {
        let session = Arc::new(SessionManager::new(transport, config.auth.clone()));
        let notifier = Notifier::new(config.notify_timeout);
        Self { config, session, notifier, messages }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn session(&self) -> &Arc<SessionManager> { &self.session }
    pub fn notifier(&self) -> &Notifier { &self.notifier }
    pub fn messages(&self) -> &Messages { &self.messages }
    pub fn transport(&self) -> Arc<dyn Transport> { self.session.transport() }

    /// Fresh client with its own request state.
    pub fn resource<T: DeserializeOwned>(&self, endpoint: &str) -> ResourceClient<T> {
        ResourceClient::new(endpoint, self.transport(), self.notifier.clone())
    }

    pub fn guard(&self) -> NavigationGuard {
        let routing = LocaleRouting::new(self.config.locale.clone(), self.config.default_locale.clone());
        NavigationGuard::new(self.session.clone(), routing)
    }

    pub fn students(&self) -> Students { Students::new(self) }
    pub fn rooms(&self) -> Rooms { Rooms::new(self) }
    pub fn buildings(&self) -> Buildings { Buildings::new(self) }
    pub fn inspections(&self) -> Inspections { Inspections::new(self) }
    pub fn items(&self) -> Items { Items::new(self) }
    pub fn users(&self) -> Users { Users::new(self) }
    pub fn announcements(&self) -> Announcements { Announcements::new(self) }
    pub fn search(&self) -> GlobalSearch { GlobalSearch::new(self) }
    pub fn dashboard(&self) -> Dashboard { Dashboard::new(self) }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("api_base", &self.config.api_base)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
