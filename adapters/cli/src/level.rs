//! Level files: layout, hunting tuning and a scripted player.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use glam::Vec2;
use lantern_core::Command;
use lantern_system_hunting::HuntingConfig;
use lantern_world::layout::LevelLayout;
use serde::Deserialize;

/// Level used when no file is given on the command line.
pub(crate) const DEMO_LEVEL: &str = r#"
[level]
bounds = [24.0, 16.0]
entity_radius = 0.5

[level.player]
position = [20.5, 3.5]
light_radius = 5.0

[level.light]
min_radius = 1.0
max_radius = 10.0

[[level.walls]]
min = [8.0, 0.0]
max = [9.0, 10.0]

[[level.walls]]
min = [14.0, 6.0]
max = [20.0, 7.0]

[[level.enemies]]
archetype = "investigator"
position = [3.5, 3.5]
speed = 0.15

[[level.enemies]]
archetype = "ranged"
position = [16.5, 12.5]
speed = 0.0

[[level.enemies]]
archetype = "ghost"
position = [2.5, 14.5]
speed = 0.05

[hunting]
decision_interval = 5
sustained_fire_ticks = 2000
seed = 7

[[script]]
tick = 30
do = "set_light"
radius = 2.0

[[script]]
tick = 90
do = "throw_flare"
velocity = [-0.6, 0.4]

[[script]]
tick = 200
do = "move_player"
to = [20.5, 12.5]

[[script]]
tick = 400
do = "set_light"
radius = 8.0
"#;

/// Everything a level file describes.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LevelFile {
    pub(crate) level: LevelLayout,
    #[serde(default)]
    pub(crate) hunting: HuntingConfig,
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

/// Player input issued at a given tick.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct ScriptStep {
    pub(crate) tick: u64,
    #[serde(flatten)]
    pub(crate) action: ScriptAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub(crate) enum ScriptAction {
    MovePlayer { to: Vec2 },
    SetLight { radius: f32 },
    ThrowFlare { velocity: Vec2 },
}

impl ScriptAction {
    pub(crate) fn command(self) -> Command {
        match self {
            Self::MovePlayer { to } => Command::MovePlayer { to },
            Self::SetLight { radius } => Command::SetLightRadius { radius },
            Self::ThrowFlare { velocity } => Command::ThrowFlare { velocity },
        }
    }
}

/// Loads the level at `path`, or the built-in demo level.
pub(crate) fn load(path: Option<&Path>) -> Result<LevelFile> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read level file at {}", path.display()))?;
            parse(&contents).with_context(|| format!("invalid level file {}", path.display()))
        }
        None => parse(DEMO_LEVEL).context("invalid built-in demo level"),
    }
}

/// Parses a level file and orders its script by tick.
pub(crate) fn parse(contents: &str) -> Result<LevelFile> {
    let mut file: LevelFile = toml::from_str(contents).context("failed to parse level toml")?;
    file.script.sort_by_key(|step| step.tick);
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::Archetype;

    #[test]
    fn demo_level_parses() {
        let file = parse(DEMO_LEVEL).expect("demo level is valid");

        assert_eq!(file.level.bounds, Vec2::new(24.0, 16.0));
        assert_eq!(file.level.walls.len(), 2);
        let archetypes: Vec<_> = file.level.enemies.iter().map(|e| e.archetype).collect();
        assert_eq!(
            archetypes,
            vec![Archetype::Investigator, Archetype::Ranged, Archetype::Ghost]
        );
        assert_eq!(file.hunting.seed, 7);
        assert_eq!(file.hunting.ghost_margin, 0.2);
        assert_eq!(
            file.script[1],
            ScriptStep {
                tick: 90,
                action: ScriptAction::ThrowFlare {
                    velocity: Vec2::new(-0.6, 0.4),
                },
            }
        );
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let file = parse(
            r#"
            [level]
            bounds = [4.0, 4.0]
            entity_radius = 0.5
            player = { position = [1.5, 1.5], light_radius = 2.0 }

            [[script]]
            tick = 9
            do = "set_light"
            radius = 3.0

            [[script]]
            tick = 2
            do = "move_player"
            to = [2.5, 2.5]
            "#,
        )
        .expect("minimal level is valid");

        assert!(file.level.enemies.is_empty());
        assert_eq!(file.hunting, HuntingConfig::default());
        assert_eq!(file.level.flares.burn_ticks, 600);
        let ticks: Vec<_> = file.script.iter().map(|step| step.tick).collect();
        assert_eq!(ticks, vec![2, 9]);
    }

    #[test]
    fn unknown_script_actions_are_rejected() {
        let error = parse(
            r#"
            [level]
            bounds = [4.0, 4.0]
            entity_radius = 0.5
            player = { position = [1.5, 1.5], light_radius = 2.0 }

            [[script]]
            tick = 1
            do = "dance"
            "#,
        )
        .expect_err("unknown action");

        assert!(format!("{error:#}").contains("failed to parse level toml"));
    }

    #[test]
    fn missing_files_report_their_path() {
        let error = load(Some(Path::new("/nonexistent/level.toml"))).expect_err("missing file");
        assert!(error.to_string().contains("/nonexistent/level.toml"));
    }
}
