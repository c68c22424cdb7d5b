//! Ridge Runner headless runner
//!
//! Loads level JSON files given on the command line (or the built-in demo
//! level), plays a scripted input sequence through the campaign and logs
//! every event. Set `RUST_LOG=debug` for per-system detail.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use ridge_runner::{Campaign, CampaignStatus, Loadout};

    env_logger::init();
    log::info!("Ridge Runner (headless) starting...");

    let levels: Vec<_> = std::env::args().skip(1).filter_map(|path| load_level(&path)).collect();
    let mut campaign = Campaign::new(levels, Loadout::default());

    let dt = 1.0 / 60.0;
    let max_ticks = 60 * 60;
    for frame in 0..max_ticks {
        let input = scripted_input(frame);
        for event in campaign.update(&input, dt) {
            log::info!(
                "[level {} t={:.2}s] {:?}",
                campaign.current_level() + 1,
                campaign.state().clock,
                event
            );
        }
        if campaign.status() == CampaignStatus::Finished {
            break;
        }
    }

    let state = campaign.state();
    log::info!(
        "Stopped on level {}/{}: phase {:?}, hp {:.0}/{:.0}, currency {}",
        campaign.current_level() + 1,
        campaign.level_count(),
        state.phase,
        state.body.hp,
        state.body.max_hp,
        campaign.currency
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn load_level(path: &str) -> Option<ridge_runner::sim::LevelData> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to read level {}: {}", path, e);
            return None;
        }
    };
    match ridge_runner::sim::LevelData::from_json(&text) {
        Ok(level) => Some(level),
        Err(e) => {
            log::error!("Failed to parse level {}: {}", path, e);
            None
        }
    }
}

/// Run right, hop every second, dash now and then
#[cfg(not(target_arch = "wasm32"))]
fn scripted_input(frame: u32) -> ridge_runner::sim::TickInput {
    ridge_runner::sim::TickInput {
        right: true,
        jump: frame % 60 < 10,
        dash: frame % 150 == 75,
        ..Default::default()
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser builds drive the simulation from the host page
}
