use crate::{
    api::{balance, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Mounts the protected API under `config.api_prefix`: bearer auth plus
/// per-IP rate limiting.
pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .configure(leave_routes),
    );
}

/// Leave and balance endpoints, relative to the API prefix.
pub fn leave_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            // /leave
            .service(web::resource("").route(web::post().to(leave_request::create_leave)))
            // /leave/{id}
            .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
            // /leave/{id}/audit
            .service(web::resource("/{id}/audit").route(web::get().to(leave_request::leave_audit)))
            // /leave/{id}/cancel
            .service(web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)))
            // /leave/{id}/manager
            .service(
                web::resource("/{id}/manager").route(web::put().to(leave_request::manager_decision)),
            )
            // /leave/{id}/hr
            .service(web::resource("/{id}/hr").route(web::put().to(leave_request::hr_decision))),
    )
    .service(
        web::scope("/balance")
            // /balance?year=
            .service(web::resource("").route(web::get().to(balance::list_balances)))
            // /balance/provision
            .service(web::resource("/provision").route(web::post().to(balance::provision_balances))),
    );
}
