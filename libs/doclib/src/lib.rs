//! The client-side core of the document library: a folder browser over a
//! remote document service.
//!
//! The library keeps one normalized [model::store::State] that every user
//! gesture updates through an [model::store::Action]. Mutations go to the
//! document service and are always followed by a fresh listing, so local state
//! never drifts from the server.
//!
//! - Most integrators will want the functions attached to the [DocLibrary]
//!   struct. See the [service] module for the operations themselves.
//! - The [model] module holds the data structures, the reducer and the pure
//!   rules (sorting, breadcrumbs, drop validation, classification flags).
//! - The [blocking] module wraps [DocLibrary] for consumers without an async
//!   runtime.
//! - The [io] module talks to the network.

#[macro_use]
extern crate tracing;

pub mod blocking;
pub mod io;
pub mod model;
pub mod service;
pub mod subscribers;

#[derive(Clone)]
pub struct DocLibrary<C: Requester = Network> {
    pub config: Config,
    pub client: C,
    pub store: Store,
    pub events: EventSubs,
    pub drag: DragSessions,
    rt: Handle,
}

impl DocLibrary<Network> {
    #[instrument(level = "info", skip_all, err(Debug))]
    pub async fn init(config: Config) -> DocResult<Self> {
        logging::init(&config)?;
        let client = Network::new(&config.api_url);
        Self::with_client(config, client).await
    }
}

impl<C: Requester> DocLibrary<C> {
    /// Builds a library over any [Requester]. Does not install logging.
    pub async fn with_client(config: Config, client: C) -> DocResult<Self> {
        let events = EventSubs::default();
        let store = Store::new(events.clone());
        let drag = DragSessions::default();
        let rt = Handle::current();

        let result = Self { config, client, store, events, drag, rt };

        if result.config.background_work {
            result.setup_listing_observer();
        }

        Ok(result)
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> State {
        self.store.state()
    }
}

pub fn get_code_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub static DEFAULT_API_LOCATION: &str = "http://localhost:8000";

use io::network::{Network, Requester};
pub use model::core_config::Config;
pub use model::entry::{Classification, DocumentEntry};
pub use model::errors::{DocErr, DocErrKind, DocResult};
use model::store::{State, Store};
use service::drag::DragSessions;
use service::events::EventSubs;
use service::logging;
use tokio::runtime::Handle;
