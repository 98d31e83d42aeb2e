use crate::config::AppConfig;
use crate::events::EventBus;
use crate::handlers;
use crate::ledger::Ledger;
use crate::registry::{RegistryError, RoomRegistry};
use crate::room::{RoomContext, RoomHandle};
use blackjack_engine::record::RoundLogger;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::filters::BoxedFilter;
use warp::reply::Reply;
use warp::Filter;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    starting_balance: u64,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16, starting_balance: u64) -> Self {
        Self {
            host: host.into(),
            port,
            starting_balance,
        }
    }

    pub fn from_app(config: &AppConfig) -> Self {
        Self::new(config.host.clone(), config.port, config.starting_balance)
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0, 1_000)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn starting_balance(&self) -> u64 {
        self.starting_balance
    }
}

/// Process-wide shared state handed to the routes.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    event_bus: Arc<EventBus>,
    registry: Arc<RoomRegistry>,
    ledger: Arc<Ledger>,
}

impl AppContext {
    /// Wires the ledger, event bus and registry together and opens the
    /// configured startup rooms. Must run inside a tokio runtime.
    pub fn new(config: &AppConfig) -> Result<Self, ServerError> {
        let event_bus = Arc::new(EventBus::new());
        let ledger = Arc::new(Ledger::new());
        let (sink, _ledger_task) = ledger.spawn();

        let round_log = match &config.round_log {
            Some(path) => {
                let logger = RoundLogger::create(path).map_err(|err| {
                    ServerError::ConfigError(format!(
                        "cannot open round log {}: {err}",
                        path.display()
                    ))
                })?;
                Some(Arc::new(Mutex::new(logger)))
            }
            None => None,
        };

        let ctx = RoomContext {
            events: Arc::clone(&event_bus),
            ledger: sink,
            round_log,
            turn_timeout: config.turn_timeout(),
        };
        let registry = Arc::new(RoomRegistry::new(ctx, config.table_defaults()));
        for room in &config.rooms {
            registry.open_room(&room.code, room.seats)?;
        }

        Ok(Self::new_with_dependencies(
            ServerConfig::from_app(config),
            event_bus,
            registry,
            ledger,
        ))
    }

    pub fn new_with_dependencies(
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        registry: Arc<RoomRegistry>,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self {
            config,
            event_bus,
            registry,
            ledger,
        }
    }

    pub fn new_for_tests() -> Self {
        let config = AppConfig {
            port: 0,
            ..AppConfig::default()
        };
        Self::new(&config).expect("test context")
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    pub fn room(&self, code: &str) -> Result<RoomHandle, RegistryError> {
        self.registry.get(code)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Room error: {0}")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: &AppConfig) -> Result<Self, ServerError> {
        let context = AppContext::new(config)?;
        Ok(Self { context })
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let config = context.config().clone();
        let bind_addr = Self::bind_addr(&config)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        tracing::info!(%addr, "web server listening");

        let task = tokio::spawn(async move {
            server_future.await;
            Ok(())
        });

        Ok(ServerHandle::new(addr, shutdown_tx, task, context))
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }

        ServerError::ConfigError(err.to_string())
    }

    pub fn routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let health = Self::health_route(context);
        let room_routes = Self::room_routes(context);
        let sse_routes = Self::sse_routes(context);

        health
            .or(sse_routes)
            .unify()
            .or(room_routes)
            .unify()
            .boxed()
    }

    fn health_route(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let registry = context.registry();
        warp::path("health")
            .and(warp::get())
            .and(warp::path::end())
            .map(move || handlers::health(registry.len()).into_response())
            .boxed()
    }

    fn room_routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let registry = context.registry();
        let ledger = context.ledger();
        let starting_balance = context.config().starting_balance();

        let list = warp::path!("api" / "rooms")
            .and(warp::get())
            .and(Self::with_registry(registry.clone()))
            .and_then(|registry: Arc<RoomRegistry>| async move {
                Ok::<_, Infallible>(handlers::list_rooms(registry).await)
            });

        let create = warp::path!("api" / "rooms")
            .and(warp::post())
            .and(Self::with_registry(registry.clone()))
            .and(warp::body::json())
            .and_then(
                |registry: Arc<RoomRegistry>, request: handlers::CreateRoomRequest| async move {
                    Ok::<_, Infallible>(handlers::create_room(registry, request).await)
                },
            );

        let info = warp::path!("api" / "rooms" / String)
            .and(warp::get())
            .and(Self::with_registry(registry.clone()))
            .and_then(|code: String, registry: Arc<RoomRegistry>| async move {
                Ok::<_, Infallible>(handlers::get_room(registry, code).await)
            });

        let presence = warp::path!("api" / "rooms" / String / "presence")
            .and(warp::post())
            .and(Self::with_registry(registry.clone()))
            .and(Self::with_ledger(ledger))
            .and(warp::body::json())
            .and_then(
                move |code: String,
                      registry: Arc<RoomRegistry>,
                      ledger: Arc<Ledger>,
                      request: handlers::PresenceRequest| async move {
                    Ok::<_, Infallible>(
                        handlers::presence(registry, ledger, starting_balance, code, request)
                            .await,
                    )
                },
            );

        let commands = warp::path!("api" / "rooms" / String / "commands")
            .and(warp::post())
            .and(Self::with_registry(registry))
            .and(warp::body::json())
            .and_then(
                |code: String,
                 registry: Arc<RoomRegistry>,
                 request: handlers::CommandRequest| async move {
                    Ok::<_, Infallible>(handlers::submit_command(registry, code, request).await)
                },
            );

        list.or(create)
            .unify()
            .or(info)
            .unify()
            .or(presence)
            .unify()
            .or(commands)
            .unify()
            .boxed()
    }

    fn sse_routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let registry = context.registry();
        let event_bus = context.event_bus();

        warp::path!("api" / "rooms" / String / "events")
            .and(warp::get())
            .and(Self::with_registry(registry))
            .and(Self::with_event_bus(event_bus))
            .and_then(
                |code: String, registry: Arc<RoomRegistry>, event_bus: Arc<EventBus>| async move {
                    Ok::<_, Infallible>(handlers::stream_events(code, registry, event_bus).await)
                },
            )
            .boxed()
    }

    fn with_registry(
        registry: Arc<RoomRegistry>,
    ) -> impl Filter<Extract = (Arc<RoomRegistry>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&registry))
    }

    fn with_ledger(
        ledger: Arc<Ledger>,
    ) -> impl Filter<Extract = (Arc<Ledger>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&ledger))
    }

    fn with_event_bus(
        event_bus: Arc<EventBus>,
    ) -> impl Filter<Extract = (Arc<EventBus>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&event_bus))
    }
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Stops accepting requests, then closes every room.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        self.context.registry().shutdown().await;
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
