//! Headless simulation loop wiring the world to the hunting system.

use std::fmt;

use glam::Vec2;
use lantern_core::{Archetype, Command, EnemyId, Event, FsmState};
use lantern_system_hunting::Hunting;
use lantern_world::{self as world, query, LevelError, World};

use crate::level::{LevelFile, ScriptStep};

/// A running level: world, enemy brains and the remaining player script.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    hunting: Hunting,
    script: Vec<ScriptStep>,
    cursor: usize,
    report: Report,
}

/// Summary of what happened during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Report {
    pub(crate) ticks: u64,
    pub(crate) enemy_steps: u64,
    pub(crate) blocked_steps: u64,
    pub(crate) shots: u64,
    pub(crate) flares_thrown: u64,
    pub(crate) flares_burned_out: u64,
    pub(crate) transitions: u64,
    pub(crate) player: Vec2,
    pub(crate) light_radius: f32,
    pub(crate) enemies: Vec<EnemyReport>,
}

/// Final state of one enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EnemyReport {
    pub(crate) id: EnemyId,
    pub(crate) archetype: Archetype,
    pub(crate) state: Option<FsmState>,
    pub(crate) position: Vec2,
}

impl Session {
    pub(crate) fn new(file: LevelFile) -> Result<Self, LevelError> {
        let world = World::new(file.level)?;
        Ok(Self {
            world,
            hunting: Hunting::new(file.hunting),
            script: file.script,
            cursor: 0,
            report: Report::default(),
        })
    }

    /// Simulates `ticks` more ticks and reports the totals so far.
    pub(crate) fn run(&mut self, ticks: u64) -> Report {
        for _ in 0..ticks {
            self.tick();
        }
        self.snapshot()
    }

    fn tick(&mut self) {
        let now = query::tick_index(&self.world);
        let mut events = Vec::new();
        while let Some(step) = self.script.get(self.cursor).filter(|step| step.tick <= now) {
            tracing::info!(tick = now, action = ?step.action, "scripted player input");
            world::apply(&mut self.world, step.action.command(), &mut events);
            self.cursor += 1;
        }

        world::apply(&mut self.world, Command::Tick, &mut events);

        let before = self.states();
        let view = query::sensor_view(&self.world);
        let mut commands = Vec::new();
        self.hunting.handle(
            &events,
            &view,
            query::tile_grid_mut(&mut self.world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        for (&(enemy, old), (_, new)) in before.iter().zip(self.states()) {
            if let (Some(from), Some(to)) = (old, new) {
                if from != to {
                    self.report.transitions += 1;
                    tracing::info!(
                        tick = now + 1,
                        enemy = enemy.get(),
                        from = ?from,
                        to = ?to,
                        "enemy state changed"
                    );
                }
            }
        }

        self.tally(&events);
    }

    fn states(&self) -> Vec<(EnemyId, Option<FsmState>)> {
        query::enemies(&self.world)
            .into_iter()
            .map(|enemy| (enemy.id, self.hunting.state_of(enemy.id)))
            .collect()
    }

    fn tally(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { tick } => self.report.ticks = *tick,
                Event::EnemyMoved { .. } => self.report.enemy_steps += 1,
                Event::MoveBlocked { .. } => self.report.blocked_steps += 1,
                Event::ShotFired { .. } => self.report.shots += 1,
                Event::FlareThrown { .. } => self.report.flares_thrown += 1,
                Event::FlareBurnedOut { .. } => self.report.flares_burned_out += 1,
                Event::PlayerMoveRejected { to } => {
                    tracing::warn!(x = to.x, y = to.y, "scripted player move was blocked");
                }
                Event::PlayerMoved { .. }
                | Event::LightRadiusChanged { .. }
                | Event::FlareStuck { .. } => {}
            }
        }
    }

    fn snapshot(&self) -> Report {
        let player = query::player(&self.world);
        Report {
            player: player.position,
            light_radius: player.light_radius,
            enemies: query::enemies(&self.world)
                .into_iter()
                .map(|enemy| EnemyReport {
                    id: enemy.id,
                    archetype: enemy.archetype,
                    state: self.hunting.state_of(enemy.id),
                    position: enemy.position,
                })
                .collect(),
            ..self.report.clone()
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks simulated: {}", self.ticks)?;
        writeln!(
            f,
            "player at ({:.2}, {:.2}) with light radius {:.2}",
            self.player.x, self.player.y, self.light_radius
        )?;
        writeln!(
            f,
            "enemy steps: {} taken, {} blocked",
            self.enemy_steps, self.blocked_steps
        )?;
        writeln!(f, "shots fired: {}", self.shots)?;
        writeln!(
            f,
            "flares: {} thrown, {} burned out",
            self.flares_thrown, self.flares_burned_out
        )?;
        writeln!(f, "state changes: {}", self.transitions)?;
        for enemy in &self.enemies {
            let state = enemy
                .state
                .map_or_else(|| "unplanned".to_owned(), |state| format!("{state:?}"));
            writeln!(
                f,
                "enemy {} ({:?}) {} at ({:.2}, {:.2})",
                enemy.id.get(),
                enemy.archetype,
                state,
                enemy.position.x,
                enemy.position.y
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{parse, DEMO_LEVEL};

    fn demo() -> Session {
        Session::new(parse(DEMO_LEVEL).expect("demo level is valid")).expect("demo level builds")
    }

    #[test]
    fn runs_are_deterministic() {
        let first = demo().run(500);
        let second = demo().run(500);

        assert_eq!(first, second);
        assert_eq!(first.ticks, 500);
    }

    #[test]
    fn script_is_applied_at_its_tick() {
        let mut session = demo();

        assert_eq!(session.run(30).light_radius, 5.0);
        assert_eq!(session.run(1).light_radius, 2.0);

        let report = session.run(60);
        assert_eq!(report.flares_thrown, 1);
    }

    #[test]
    fn enemies_get_controllers_after_the_first_tick() {
        let mut session = demo();
        let report = session.run(1);

        assert_eq!(report.enemies.len(), 3);
        assert!(report.enemies.iter().all(|enemy| enemy.state.is_some()));
        assert_eq!(report.enemies[2].state, Some(FsmState::Haunting));
    }

    #[test]
    fn report_lists_every_enemy() {
        let rendered = demo().run(10).to_string();

        assert!(rendered.starts_with("ticks simulated: 10\n"));
        assert!(rendered.contains("enemy 0 (Investigator)"));
        assert!(rendered.contains("enemy 2 (Ghost) Haunting"));
    }
}
