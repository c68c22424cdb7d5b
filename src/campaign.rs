//! Level sequencing
//!
//! Drives a [`SimState`] through an ordered list of levels and reacts to the
//! terminal phases the tick leaves behind.

use crate::settings::Loadout;
use crate::sim::{GameEvent, GamePhase, LevelData, SimState, TickInput, tick};

/// Whether there is still a level to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatus {
    Running,
    /// Exit of the last level reached
    Finished,
}

/// Ordered levels plus the simulation running the current one
#[derive(Debug, Clone)]
pub struct Campaign {
    levels: Vec<LevelData>,
    state: SimState,
    status: CampaignStatus,
    /// Currency earned across the run
    pub currency: u32,
}

impl Campaign {
    /// Build a campaign; an empty list falls back to the demo level
    pub fn new(mut levels: Vec<LevelData>, loadout: Loadout) -> Self {
        if levels.is_empty() {
            log::warn!("Campaign has no levels, using the demo level");
            levels.push(LevelData::demo());
        }
        for level in &mut levels {
            level.prepare();
        }
        let state = SimState::new(levels[0].clone(), loadout);
        let mut campaign = Self {
            levels,
            state,
            status: CampaignStatus::Running,
            currency: 0,
        };
        campaign.start_level(0);
        campaign
    }

    /// Restart the run from the first level
    pub fn start(&mut self) {
        self.status = CampaignStatus::Running;
        self.start_level(0);
    }

    /// Load level `index`, clamped to the last level
    pub fn start_level(&mut self, index: usize) {
        let index = index.min(self.levels.len() - 1);
        self.state.level_index = index;
        self.state.level_count = self.levels.len();
        self.state.load_level(self.levels[index].clone());
        self.state.events.clear();
        log::info!("Starting level {}/{}", index + 1, self.levels.len());
    }

    /// Run one tick and advance the campaign on terminal phases
    ///
    /// Returns the events raised by the tick.
    pub fn update(&mut self, input: &TickInput, dt: f32) -> Vec<GameEvent> {
        if self.status == CampaignStatus::Finished {
            return Vec::new();
        }
        tick(&mut self.state, input, dt);
        let events = self.state.drain_events();
        for event in &events {
            if let GameEvent::CurrencyAwarded { amount } = event {
                self.currency = self.currency.saturating_add(*amount);
            }
        }

        match self.state.phase {
            GamePhase::LevelComplete => match self.state.next_level() {
                Some(next) => self.start_level(next),
                None => {
                    self.status = CampaignStatus::Finished;
                    log::info!("Campaign finished with {} currency", self.currency);
                }
            },
            GamePhase::TimeUp => {
                log::info!("Out of time, restarting level {}", self.state.level_index + 1);
                self.state.reload();
            }
            GamePhase::Dead => {
                log::info!("Player dead, restarting from the first level");
                self.start_level(0);
            }
            GamePhase::Playing | GamePhase::Dying { .. } => {}
        }
        events
    }

    pub fn current_level(&self) -> usize {
        self.state.level_index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    pub fn status(&self) -> CampaignStatus {
        self.status
    }

    /// Swap upgrades between levels or mid-run
    pub fn set_loadout(&mut self, loadout: Loadout) {
        self.state.set_loadout(loadout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLAYER_HEIGHT;
    use crate::sim::{Exit, Hazard, Platform, Spawn};

    const DT: f32 = 1.0 / 60.0;

    /// Floor with the exit right next to the spawn
    fn short_level(name: &str) -> LevelData {
        LevelData {
            name: name.to_string(),
            platforms: vec![Platform::new(0.0, 500.0, 1000.0, 40.0)],
            spawn: Spawn {
                x: 100.0,
                y: 500.0 - PLAYER_HEIGHT,
            },
            exit: Some(Exit {
                x: 160.0,
                y: 440.0,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    const RIGHT: TickInput = TickInput {
        left: false,
        right: true,
        jump: false,
        fast_fall: false,
        dash: false,
        place_platform: false,
    };

    fn run_right(campaign: &mut Campaign, ticks: usize) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| campaign.update(&RIGHT, DT)).collect()
    }

    /// Tick until an exit is reached, returning that tick's events
    fn run_to_exit(campaign: &mut Campaign) -> Vec<GameEvent> {
        for _ in 0..120 {
            let events = campaign.update(&RIGHT, DT);
            if events.iter().any(|e| matches!(e, GameEvent::ExitReached { .. })) {
                return events;
            }
        }
        panic!("exit never reached");
    }

    #[test]
    fn test_empty_campaign_uses_demo() {
        let campaign = Campaign::new(Vec::new(), Loadout::default());
        assert_eq!(campaign.level_count(), 1);
        assert_eq!(campaign.state().level.name, "Demo");
    }

    #[test]
    fn test_exit_advances_and_finishes() {
        let mut campaign = Campaign::new(vec![short_level("a"), short_level("b")], Loadout::default());
        let events = run_to_exit(&mut campaign);
        assert!(events.contains(&GameEvent::ExitReached { next_level: Some(1) }));
        assert_eq!(campaign.current_level(), 1);
        assert_eq!(campaign.state().level.name, "b");
        assert_eq!(campaign.state().body.pos.x, 100.0);

        let events = run_to_exit(&mut campaign);
        assert!(events.contains(&GameEvent::ExitReached { next_level: None }));
        assert_eq!(campaign.status(), CampaignStatus::Finished);
        assert_eq!(campaign.currency, 20);
        assert!(run_right(&mut campaign, 5).is_empty());
    }

    #[test]
    fn test_time_up_reloads_same_level() {
        let mut second = short_level("b");
        second.exit = None;
        second.conditions.time_limit = 0.5;
        let mut campaign = Campaign::new(vec![short_level("a"), second], Loadout::default());
        campaign.start_level(1);

        let events = run_right(&mut campaign, 31);
        assert!(events.contains(&GameEvent::TimeExpired));
        assert_eq!(campaign.current_level(), 1);
        assert_eq!(campaign.state().phase, GamePhase::Playing);
        assert!(campaign.state().clock < 0.1);
    }

    #[test]
    fn test_death_restarts_from_first_level() {
        let mut deadly = short_level("b");
        deadly.exit = None;
        deadly.add_hazard(Hazard::spikes(90.0, 480.0, 60.0, 20.0).with_damage(1000.0));
        let mut campaign = Campaign::new(vec![short_level("a"), deadly], Loadout::default());
        campaign.start_level(1);

        let events = campaign.update(&TickInput::default(), DT);
        assert!(events.contains(&GameEvent::Death));
        assert_eq!(campaign.current_level(), 1);

        for _ in 0..40 {
            campaign.update(&TickInput::default(), DT);
        }
        assert_eq!(campaign.current_level(), 0);
        assert_eq!(campaign.state().phase, GamePhase::Playing);
        assert_eq!(campaign.state().body.hp, campaign.state().body.max_hp);
    }
}
