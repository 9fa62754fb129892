/*
 Copyright (c) 2024-2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

pub(crate) mod api;
pub(crate) mod edge;
pub(crate) mod helpers;
pub(crate) mod openapi;
pub(crate) mod worker_api;
pub(crate) mod www;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web,
    web::Data,
    App, HttpServer,
};
use parking_lot::Mutex;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use mujde::analytics::EventLog;
use mujde::email::{EmailSender, EmailSettings, LogOnlySender, SendGridSender};
use mujde::rate_limit::SubmissionLimiter;
use mujde::worker::{ActivateReport, FormOutbox, InstallReport, WorkerHandler};
use mujde::{CacheWorker, HttpNetwork, MemoryCacheStorage, Network, WorkerConfig};

use crate::{EdgeSettings, SiteSettings};

pub const CONNECTION_TIMEOUT: u64 = 75;

/// Shared by every worker thread of the site server
pub(crate) struct SiteState {
    pub(crate) site_root: PathBuf,
    pub(crate) email: EmailSettings,
    pub(crate) email_sender: Box<dyn EmailSender>,
    pub(crate) limiter: SubmissionLimiter,
    pub(crate) analytics: Mutex<EventLog>,
}

impl SiteState {
    pub(crate) fn new(settings: &SiteSettings) -> SiteState {
        let email_sender: Box<dyn EmailSender> = match SendGridSender::from_env() {
            Some(sender) => Box::new(sender),
            None => {
                log::warn!(
                    "{} is not set, contact form email will only be logged",
                    mujde::email::SENDGRID_API_KEY_ENV
                );
                Box::new(LogOnlySender)
            }
        };

        let analytics = match &settings.analytics_log {
            Some(path) => EventLog::open(path),
            None => EventLog::in_memory(),
        };

        SiteState {
            site_root: settings.site_root.clone(),
            email: settings.email.clone(),
            email_sender,
            limiter: SubmissionLimiter::default(),
            analytics: Mutex::new(analytics),
        }
    }
}

/// Shared by every worker thread of the edge server
pub(crate) struct EdgeState {
    pub(crate) worker: CacheWorker,
    /// Used for requests the worker passes through
    pub(crate) network: Arc<dyn Network>,
    pub(crate) outbox: Arc<FormOutbox>,
}

impl EdgeState {
    pub(crate) fn new(config: WorkerConfig, network: Arc<dyn Network>) -> EdgeState {
        let storage = Arc::new(MemoryCacheStorage::new(config.partition_capacity));
        let outbox = Arc::new(FormOutbox::new());
        let worker = CacheWorker::new(config, storage, Arc::clone(&network))
            .with_outbox(Arc::clone(&outbox));
        EdgeState {
            worker,
            network,
            outbox,
        }
    }

    /// Bring the worker up as a browser would when it is first registered
    pub(crate) async fn start_worker(&self) -> (InstallReport, ActivateReport) {
        let installed = self.worker.on_install().await;
        let activated = self.worker.on_activate().await;
        (installed, activated)
    }
}

pub(crate) fn configure_site(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}")
            .url(openapi::JSON_PATH, openapi::SiteApiDoc::openapi()),
    )
    .service(
        web::resource(api::CONTACT_ROUTE)
            .route(web::post().to(api::contact))
            .default_service(web::to(api::method_not_allowed)),
    )
    .service(
        web::resource(api::ANALYTICS_ROUTE)
            .route(web::post().to(api::analytics))
            .default_service(web::to(api::method_not_allowed)),
    )
    .default_service(web::to(www::www_handler));
}

pub(crate) fn configure_edge(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(worker_api::WORKER_API_ROUTE)
            .route("/push", web::post().to(worker_api::push))
            .route(
                "/notification-click",
                web::get().to(worker_api::notification_click),
            )
            .route(
                "/notification-click/{action}",
                web::get().to(worker_api::notification_click),
            )
            .route("/sync/{tag}", web::post().to(worker_api::sync))
            .route("/caches", web::get().to(worker_api::caches)),
    )
    .default_service(web::to(edge::edge_handler));
}

fn cors() -> actix_cors::Cors {
    actix_cors::Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allow_any_method()
        .expose_any_header()
        .send_wildcard()
}

fn trace_request(req: &ServiceRequest) {
    log::debug!("HttpRequest : {} {}", req.head().method, req.path());
}

fn trace_response<B>(res: &ServiceResponse<B>) {
    let reason = res.response().head().reason();
    let reason = if !reason.is_empty() && reason != "OK" {
        format!(" ({reason})")
    } else {
        String::new()
    };
    log::debug!("HttpResponse: {}{reason}", res.status());
}

/// Serve the site's files and APIs until stopped
pub async fn serve_site(settings: &SiteSettings) -> io::Result<()> {
    let state = Data::new(SiteState::new(settings));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .wrap(Logger::default())
            // Log Requests and Responses
            .wrap_fn(|req, srv| {
                trace_request(&req);
                let fut = srv.call(req);
                async {
                    let res = fut.await?;
                    trace_response(&res);
                    Ok(res)
                }
            })
            .app_data(state.clone())
            .configure(configure_site)
    })
    .keep_alive(Duration::from_secs(CONNECTION_TIMEOUT))
    .bind((settings.host.as_str(), settings.port))?
    .run();

    println!(
        "{} site listening on http://{}:{} serving {}",
        mujde::SITE_NAME,
        settings.host,
        settings.port,
        settings.site_root.display()
    );
    server.await
}

/// Install and activate the cache worker then serve every request through it
/// until stopped
pub async fn serve_edge(settings: &EdgeSettings) -> io::Result<()> {
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new());
    let state = Data::new(EdgeState::new(settings.worker.clone(), network));

    let (installed, activated) = state.start_worker().await;
    println!(
        "cache worker ready: {} cached, {} skipped, {} failed, {} old caches deleted",
        installed.cached.len(),
        installed.skipped.len(),
        installed.failed.len(),
        activated.deleted.len()
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                trace_request(&req);
                let fut = srv.call(req);
                async {
                    let res = fut.await?;
                    trace_response(&res);
                    Ok(res)
                }
            })
            .app_data(state.clone())
            .configure(configure_edge)
    })
    .keep_alive(Duration::from_secs(CONNECTION_TIMEOUT))
    .bind((settings.host.as_str(), settings.port))?
    .run();

    println!(
        "{} edge listening on http://{}:{} for {}",
        mujde::SITE_NAME,
        settings.host,
        settings.port,
        settings.worker.scope
    );
    server.await
}
