use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_leave::config::Config;
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::leave::{
    attachment::LocalAttachmentStore,
    clock::SystemClock,
    notify::{LogNotificationSink, NotificationQueue, run_dispatcher},
    service::LeaveService,
};
use hrm_leave::routes;
use hrm_leave::store::MySqlLeaveStore;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let (notifications, outbox) = NotificationQueue::channel();
    actix_web::rt::spawn(run_dispatcher(outbox, Arc::new(LogNotificationSink)));

    let service = Data::new(LeaveService::new(
        Arc::new(MySqlLeaveStore::new(pool)),
        Arc::new(SystemClock),
        Arc::new(LocalAttachmentStore::new(config.attachment_dir.clone())),
        notifications,
    ));

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
