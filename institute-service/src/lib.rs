pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{get, patch, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{
    AccountProvisioner, Database, FeeLedger, GatewaySmsProvider, NotificationDispatcher,
    RegistrationWorkflow, SequenceAllocator,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub sequences: SequenceAllocator,
    pub ledger: FeeLedger,
    pub registration: RegistrationWorkflow,
    pub notifier: NotificationDispatcher,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    database: mongodb::Database,
    state: AppState,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret()).await?;
        client_options.app_name = Some("institute-service".to_string());

        let client = Client::with_options(client_options)?;
        let database = client.database(&config.database.db_name);

        let db = Database::new(client, database.clone());

        // Unique indexes back the numbering invariants; refuse to start
        // without them.
        db.init_indexes().await?;

        let sequences = SequenceAllocator::new(db.clone());
        let notifier =
            NotificationDispatcher::new(Arc::new(GatewaySmsProvider::new(config.sms.clone())));
        if config.sms.enabled {
            tracing::info!("SMS gateway provider enabled");
        } else {
            tracing::warn!("SMS gateway not configured - notifications will be logged and dropped");
        }

        let ledger = FeeLedger::new(db.clone(), sequences.clone(), notifier.clone());
        let accounts = AccountProvisioner::new(db.clone());
        let registration = RegistrationWorkflow::new(
            db.clone(),
            sequences.clone(),
            ledger.clone(),
            accounts,
            notifier.clone(),
        );

        let state = AppState {
            db,
            config: config.clone(),
            sequences,
            ledger,
            registration,
            notifier,
        };

        // Port 0 binds a random free port, used by the test harness.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        tracing::info!("Institute service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            database,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &mongodb::Database {
        &self.database
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics))
            .route("/branches", post(handlers::branches::create_branch))
            .route("/branches/:id", get(handlers::branches::get_branch))
            .route(
                "/branches/:id/enrollment-number",
                post(handlers::branches::allocate_enrollment_number),
            )
            .route(
                "/branches/:id/students",
                get(handlers::branches::list_students),
            )
            .route("/courses", post(handlers::catalog::create_course))
            .route("/courses/:id", get(handlers::catalog::get_course))
            .route("/batches", post(handlers::catalog::create_batch))
            .route("/students", post(handlers::students::admit_student))
            .route(
                "/students/:id",
                get(handlers::students::get_student).delete(handlers::students::delete_student),
            )
            .route(
                "/students/:id/payments",
                post(handlers::payments::record_payment),
            )
            .route(
                "/students/:id/payments/summary",
                get(handlers::payments::payment_summary),
            )
            .route("/students/:id/ledger", get(handlers::payments::get_ledger))
            .route(
                "/students/:id/registration",
                post(handlers::registration::confirm_registration),
            )
            .route(
                "/receipts/:id",
                patch(handlers::payments::update_receipt)
                    .delete(handlers::payments::delete_receipt),
            )
            .route("/exams/serial", post(handlers::exams::allocate_exam_serial))
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(self.state);

        axum::serve(self.listener, router).await?;

        Ok(())
    }
}
