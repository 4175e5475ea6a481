/*
 *  main.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	kiosk entry point: config, collaborators, signals
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use ambient_kiosk::airly::AirlyClient;
use ambient_kiosk::bvg::BvgClient;
use ambient_kiosk::clock::SystemClock;
use ambient_kiosk::config::{self, Cli, Config};
use ambient_kiosk::display::{FrameRenderer, LogRenderer, Renderer};
use ambient_kiosk::engine::{Engine, EngineConfig, EngineHandle};
use ambient_kiosk::geoloc::OpenMeteoGeocoder;
use ambient_kiosk::http::build_client;
use ambient_kiosk::location::resolve_location;
use ambient_kiosk::services::{AirQualityClient, Services};
use ambient_kiosk::weather::OpenMeteoWeather;
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn build_services(cfg: &Config, client: &reqwest::Client) -> Services {
    let transit = match cfg.transit_base_url() {
        Some(url) => BvgClient::with_base_url(client.clone(), url),
        None => BvgClient::new(client.clone()),
    };
    let air_quality = cfg.airly_api_key().map(|key| {
        Arc::new(AirlyClient::new(client.clone(), key, cfg.aq_max_distance_km())) as Arc<dyn AirQualityClient>
    });
    Services {
        weather: Arc::new(OpenMeteoWeather::new(client.clone())),
        air_quality,
        transit: Arc::new(transit),
    }
}

/// Waits for process signals and forwards them to the engine until it
/// is told to shut down.
async fn signal_handler(handle: EngineHandle) -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    let mut sigusr2 = signal(SignalKind::user_defined2())?;

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("SIGINT received. Initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received. Initiating graceful shutdown.");
                break;
            }
            _ = sighup.recv() => {
                info!("SIGHUP received. Initiating graceful shutdown.");
                break;
            }
            _ = sigusr1.recv() => {
                info!("SIGUSR1 received. Toggling debug overlay.");
                handle.toggle_debug();
            }
            _ = sigusr2.recv() => {
                info!("SIGUSR2 received. Starting demo sequence.");
                handle.trigger_demo();
            }
        }
    }
    handle.shutdown();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        println!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("{} - ambient display", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let client = build_client(cfg.fetch_timeout()).context("building HTTP client")?;
    let geocoder = OpenMeteoGeocoder::new(client.clone());
    let location = resolve_location(&cfg.location_request(), &geocoder, cfg.fetch_timeout()).await;
    info!("Location: {}", location);

    let services = build_services(&cfg, &client);

    let renderer: Box<dyn Renderer> = match cfg.snapshot_path() {
        Some(path) => {
            info!("Writing frames to {}", path.display());
            Box::new(FrameRenderer::new(Some(path)))
        }
        None => Box::new(LogRenderer::default()),
    };

    let (engine, handle) = Engine::new(EngineConfig::from(&cfg), services, location, Arc::new(SystemClock), renderer);
    let (width, height) = cfg.surface_size();
    handle.resize(width, height);

    let engine_task = tokio::spawn(engine.run());
    signal_handler(handle.clone()).await?;
    engine_task.await.context("engine task")?;

    let stats = handle.snapshot().stats;
    info!(
        "Done: {} frames, weather {}/{} failed, transit {}/{} failed",
        stats.frames_presented, stats.weather.failures, stats.weather.runs, stats.transit.failures, stats.transit.runs
    );
    Ok(())
}
