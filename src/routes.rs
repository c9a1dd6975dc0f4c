use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let device_limiter = Arc::new(build_limiter(config.rate_device_per_min));
    let manual_limiter = Arc::new(build_limiter(config.rate_manual_per_min));
    let query_limiter = Arc::new(build_limiter(config.rate_query_per_min));

    // Terminal feed: lives outside the API prefix because the devices only
    // know the fixed /iclock path.
    cfg.service(
        web::scope("/iclock").service(
            web::resource("/cdata")
                .wrap(device_limiter.clone())
                .route(web::post().to(attendance::device_feed)),
        ),
    );

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance
                .service(
                    web::resource("")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::list_attendance)),
                )
                // /attendance/punch
                .service(
                    web::resource("/punch")
                        .wrap(manual_limiter.clone())
                        .route(web::post().to(attendance::manual_punch)),
                )
                // /attendance/summary
                .service(
                    web::resource("/summary")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::monthly_summary)),
                ),
        ),
    );
}
