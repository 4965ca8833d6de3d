use actix_web::web::{self, ServiceConfig};

use crate::{conf::ServerConfig, store::CacheStore, upstream::Upstream};

pub mod serve;

/// This serves as state for the Actix server.
pub struct RouteSharedData<U: Upstream, S: CacheStore> {
    pub upstream: U,
    pub store: S,
    pub config: ServerConfig,
}

/* -------------------------------------------------------------------------- */
/*                                Registration                                */
/* -------------------------------------------------------------------------- */

/// Register default routes for the server to an Actix configuration.
///
/// One catch-all route for every method; the fronted app's non-GET traffic
/// flows through too. Only GET answers can ever come out of the store.
fn register_routes_to_config<'a, U: Upstream + 'static, S: CacheStore + 'static>(
    config: &'a mut ServiceConfig,
) -> &'a mut ServiceConfig {
    config.route("/{tail:.*}", web::route().to(serve::serve_request::<U, S>))
}

pub fn setup_service_config<'a, U: Upstream + 'static, S: CacheStore + 'static>(
    web_config: &'a mut ServiceConfig,
    server_config: &ServerConfig,
    upstream: U,
    store: S,
) -> &'a mut ServiceConfig {
    web_config.app_data(web::Data::new(RouteSharedData {
        upstream,
        store,
        config: server_config.clone(),
    }));

    web_config.configure(|f| {
        register_routes_to_config::<U, S>(f);
    });

    web_config
}
