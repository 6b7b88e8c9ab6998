//! Archetype-specific state machines and goal policies.

use glam::Vec2;
use lantern_core::{Action, Archetype, Direction, FlareId, FsmState, PlayerSnapshot, SensorView};
use lantern_world::grid::TileGrid;

use crate::config::HuntingConfig;

/// State of one enemy controller, tagged by archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Behavior {
    Ghost,
    Investigator(Investigator),
    Ranged(Ranged),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Investigator {
    Idle,
    Chase,
    Investigate {
        remembered: Vec2,
        flare: Option<FlareId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Ranged {
    Idle,
    DirectFire { target: Vec2 },
    SustainedFire { target: Vec2, fired_for: u32 },
}

impl Behavior {
    pub(crate) fn new(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Ghost => Self::Ghost,
            Archetype::Investigator => Self::Investigator(Investigator::Idle),
            Archetype::Ranged => Self::Ranged(Ranged::Idle),
        }
    }

    pub(crate) fn archetype(&self) -> Archetype {
        match self {
            Self::Ghost => Archetype::Ghost,
            Self::Investigator(_) => Archetype::Investigator,
            Self::Ranged(_) => Archetype::Ranged,
        }
    }

    pub(crate) fn state(&self) -> FsmState {
        match self {
            Self::Ghost => FsmState::Haunting,
            Self::Investigator(Investigator::Idle) | Self::Ranged(Ranged::Idle) => FsmState::Idle,
            Self::Investigator(Investigator::Chase) => FsmState::Chase,
            Self::Investigator(Investigator::Investigate { .. }) => FsmState::Investigate,
            Self::Ranged(Ranged::DirectFire { .. }) => FsmState::DirectFire,
            Self::Ranged(Ranged::SustainedFire { .. }) => FsmState::SustainedFire,
        }
    }

    /// Last known target position, kept only after direct contact is lost.
    pub(crate) fn remembered(&self) -> Option<Vec2> {
        match *self {
            Self::Investigator(Investigator::Investigate { remembered, .. }) => Some(remembered),
            Self::Ranged(Ranged::SustainedFire { target, .. }) => Some(target),
            _ => None,
        }
    }

    pub(crate) fn fire_target(&self) -> Option<Vec2> {
        match *self {
            Self::Ranged(Ranged::DirectFire { target })
            | Self::Ranged(Ranged::SustainedFire { target, .. }) => Some(target),
            _ => None,
        }
    }

    /// Bookkeeping that happens every tick, between decision cycles too.
    pub(crate) fn observe(&mut self, view: &SensorView, me: Vec2) {
        match self {
            Self::Ranged(Ranged::DirectFire { target }) => {
                let player = view.player();
                if player.illuminates(me) {
                    *target = player.position;
                }
            }
            Self::Ranged(Ranged::SustainedFire { fired_for, .. }) => {
                *fired_for = fired_for.saturating_add(1);
            }
            _ => {}
        }
    }

    pub(crate) fn change_state(
        &mut self,
        view: &SensorView,
        me: Vec2,
        grid: &TileGrid,
        config: &HuntingConfig,
    ) {
        match self {
            Self::Ghost => {}
            Self::Investigator(state) => *state = state.next(view, me, grid, config),
            Self::Ranged(state) => *state = state.next(view, me, config),
        }
    }

    /// Marks the tiles this state wants to reach. Returns whether any goal was marked.
    pub(crate) fn mark_goals(&self, player: &PlayerSnapshot, grid: &mut TileGrid) -> bool {
        let target = match *self {
            Self::Investigator(Investigator::Chase) => player.position,
            Self::Investigator(Investigator::Investigate { remembered, .. }) => remembered,
            _ => return false,
        };
        let cell = grid.world_to_cell(target);
        grid.set_goal(cell);
        grid.has_goal()
    }
}

impl Investigator {
    fn next(self, view: &SensorView, me: Vec2, grid: &TileGrid, config: &HuntingConfig) -> Self {
        let player = view.player();
        let lit = player.illuminates(me);

        match self {
            Self::Idle if lit => Self::Chase,
            Self::Idle => view
                .flares()
                .iter()
                .find(|flare| flare.illuminates(me))
                .map_or(Self::Idle, |flare| Self::Investigate {
                    remembered: flare.position,
                    flare: Some(flare.id),
                }),
            Self::Chase if lit => Self::Chase,
            Self::Chase => Self::Investigate {
                remembered: player.position,
                flare: None,
            },
            Self::Investigate { .. } if lit => Self::Chase,
            Self::Investigate { remembered, flare } => {
                let tracked = flare.and_then(|id| view.flare(id));
                let remembered = match tracked {
                    Some(lit_flare) if !lit_flare.burned_out => lit_flare.position,
                    _ => remembered,
                };
                let distance = grid
                    .world_to_cell(me)
                    .chebyshev_distance(grid.world_to_cell(remembered));
                let reached = distance <= config.investigate_reach_tiles;
                let settled = tracked.map_or(true, |flare| flare.stuck || flare.burned_out);

                if reached && settled {
                    Self::Idle
                } else {
                    Self::Investigate { remembered, flare }
                }
            }
        }
    }
}

impl Ranged {
    fn next(self, view: &SensorView, me: Vec2, config: &HuntingConfig) -> Self {
        let player = view.player();
        if player.illuminates(me) {
            return Self::DirectFire {
                target: player.position,
            };
        }

        match self {
            Self::Idle => Self::Idle,
            Self::DirectFire { target } => Self::SustainedFire {
                target,
                fired_for: 0,
            },
            Self::SustainedFire { fired_for, .. } if fired_for >= config.sustained_fire_ticks => {
                Self::Idle
            }
            sustained @ Self::SustainedFire { .. } => sustained,
        }
    }
}

/// Direction a ghost drifts in, ignoring every obstacle.
///
/// Each axis is corrected only while the player is further than `margin` away
/// along it.
pub(crate) fn ghost_direction(me: Vec2, player: Vec2, margin: f32) -> Action {
    let delta = player - me;
    Direction::from_offset(axis_sign(delta.x, margin), axis_sign(delta.y, margin))
        .map_or(Action::NONE, Action::from)
}

fn axis_sign(delta: f32, margin: f32) -> i32 {
    if delta > margin {
        1
    } else if delta < -margin {
        -1
    } else {
        0
    }
}
