#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive terminal explorer for the NYC landmark map.
//!
//! Loads every landmark and both filter catalogs from the Socrata open data
//! portal, then lets the user activate style and historic district filters,
//! select landmarks, and expand their violations and complaints. The map
//! itself is exported as `GeoJSON` on request.
//!
//! Environment:
//!
//! - `RUST_LOG` sets the log filter.
//! - `SOCRATA_BASE_URL` and `SOCRATA_APP_TOKEN` override the portal host
//!   and supply an app token.
//! - `LANDMARK_MAP_RENDER_POLICY` picks how out-of-order responses render
//!   (`discard_stale` or `last_write_wins`).

mod explore;

use std::sync::Arc;

use landmark_map_source::config::SocrataSettings;
use landmark_map_source::socrata::SocrataClient;
use landmark_map_view::{MapSession, SessionOptions, StepOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let client = Arc::new(SocrataClient::new(
        SocrataSettings::nyc().with_env_overrides(),
    ));
    let options = SessionOptions::from_env();
    log::info!(
        "Using {} with {} render policy",
        client.settings().base_url,
        options.policy
    );

    let session = MapSession::with_source(client, options);

    println!("NYC Landmark Map");
    println!();

    let report = session.load().await;
    match &report.landmarks {
        StepOutcome::Rendered { items } => println!("{items} landmarks on the map"),
        StepOutcome::Discarded => {}
        StepOutcome::Failed(e) => println!("Could not load landmarks: {e}"),
    }
    for (field, result) in &report.catalogs {
        match result {
            Ok(count) => println!("{}: {count}", field.label()),
            Err(e) => println!("Could not load {} filters: {e}", field.label()),
        }
    }
    println!();

    explore::run(&session).await
}
