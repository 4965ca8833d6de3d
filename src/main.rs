use std::str::FromStr;

use actix_web::{App, HttpServer};
use clap::{Command, arg, crate_authors, crate_description, crate_name, crate_version};
use config::{Config, File};
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, error, info};

use appshelf::{
    conf::ServerConfig,
    install::run_install,
    routes::setup_service_config,
    store::{CacheStore, StoreBackend},
    upstream::http::HttpUpstream,
};

fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let colors = ColoredLevelConfig::new()
                .info(Color::BrightGreen)
                .error(Color::BrightRed)
                .warn(Color::BrightYellow);
            out.finish(format_args!(
                "[{}] {}",
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .chain(fern::log_file("appshelf.log")?)
        .apply()?;
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cmd = Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!(","))
        .about(crate_description!())
        .arg(arg!(-c --config <FILE> "Path to a config file").required(false))
        .arg(arg!(-l --log_level <LEVEL> "Sets the logging level").required(false))
        .get_matches();

    let level = match cmd.get_one::<String>("log_level") {
        Some(v) => LevelFilter::from_str(v).unwrap_or(LevelFilter::Debug),
        None => LevelFilter::Debug,
    };
    let _ = setup_logger(level);

    /* ------------------------------ Configuration ------------------------------ */

    let mut settings_builder = Config::builder()
        // Add in settings from the environment (with a prefix of APPSHELF)
        // Eg. `APPSHELF_GENERAL_PORT=8081 ./target/appshelf` would set the port
        .add_source(config::Environment::with_prefix("APPSHELF").separator("_"));

    if let Some(v) = cmd.get_one::<String>("config") {
        settings_builder = settings_builder.add_source(File::with_name(v));
    }

    let settings = match settings_builder.build() {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    let config = match settings.try_deserialize::<ServerConfig>() {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to deserialize server configuration: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    /* --------------------------------- Warm-up --------------------------------- */

    let store = match StoreBackend::from_config(&config) {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to open the cache store: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let upstream = match HttpUpstream::from_config(&config) {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to set up the upstream: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    // The port does not accept anything until the store is warmed; whoever
    // supervises this process owns the retry policy.
    if let Err(e) = run_install(&upstream, &store, &config.cache.precache).await {
        error!("Cache warm-up failed: {}", e);
        return Err(std::io::Error::other(e.to_string()));
    }

    /* ---------------------------------- Serve ---------------------------------- */

    let bind = (config.general.address.clone(), config.general.port);
    info!(
        "Starting {} on {}:{} (store \"{}\", upstream {})",
        config.general.name, bind.0, bind.1, store.name(), config.upstream.url
    );

    HttpServer::new(move || {
        let upstream = upstream.clone();
        let store = store.clone();
        let config = config.clone();

        App::new().configure(move |f| {
            setup_service_config(f, &config, upstream, store);
        })
    })
    .bind(bind)?
    .run()
    .await
}
