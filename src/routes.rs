use std::sync::Arc;

use crate::api::attendance;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};

/// Per-scope limiter, `requests_per_min` refilled evenly over a minute.
pub fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

/// Device queries fan out to every terminal, so the whole scope is limited.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    api_prefix: &str,
    limiter: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(limiter)
            .service(
                web::scope("/attendance")
                    // /attendance/department
                    .service(
                        web::resource("/department")
                            .route(web::post().to(attendance::department_attendance)),
                    )
                    // /attendance/range
                    .service(
                        web::resource("/range").route(web::post().to(attendance::attendance_range)),
                    )
                    // /attendance/rollup
                    .service(web::resource("/rollup").route(web::post().to(attendance::rollup))),
            )
            // /devices/{id}/status
            .service(
                web::resource("/devices/{id}/status")
                    .route(web::get().to(attendance::device_status)),
            ),
    );
}
