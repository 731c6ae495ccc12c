use crate::{
    api::{employee, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, middleware::Condition, web};
use serde_json::json;

// Extractor failures get the same JSON shape as rule rejections
fn invalid_request<E>(err: E) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let response = HttpResponse::BadRequest().json(json!({
        "error": "invalid_request",
        "message": err.to_string()
    }));
    InternalError::from_response(err, response).into()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build the API limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = 60_000 / requests_per_min as u64;
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms.max(1))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("burst size and period are both non-zero");
        Governor::new(&cfg)
    }

    let limiter = build_limiter(config.rate_per_min);

    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| invalid_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| invalid_request(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| invalid_request(err)));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Condition::new(config.rate_per_min > 0, limiter)) // rate limiting
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    ),
            ),
    );
}
