#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Two-level path following: area routes through doors, grid paths inside areas.
//!
//! A [`PathFollower`] resolves which area the mover stands in and which area
//! holds the destination, walks the fewest-hops route between them one door
//! at a time, and asks the world for a grid path for every leg. Grid paths
//! arrive asynchronously as [`Event::PathResolved`]; only the follower's most
//! recent request is honoured.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};
use warren_core::{
    AreaId, Command, Event, MoverId, PathOptions, PathRequestId, Vec2, WallSlotCoord,
};
use warren_world::{query, Area, World};

const MAX_REPAIRS_PER_LEG: u8 = 4;

/// Observable phase of a [`PathFollower`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FollowState {
    /// No destination.
    Idle,
    /// Waiting for the grid path of the current leg.
    Planning,
    /// Walking the grid path of the current leg.
    FollowingLocal,
    /// Stepping straight through a door into the next area.
    DoorTransition,
    /// Reached the destination.
    Arrived,
    /// The remaining path was found blocked.
    Invalidated,
    /// Waiting for a repaired grid path to the current leg's goal.
    Replanning,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Doorway {
    door: WallSlotCoord,
    inside: Vec2,
    outside: Vec2,
}

/// Per-mover path planner and follower.
#[derive(Clone, Debug)]
pub struct PathFollower {
    id: MoverId,
    position: Vec2,
    state: FollowState,
    sequence: u32,
    active_request: Option<PathRequestId>,
    destination: Option<Vec2>,
    route: VecDeque<AreaId>,
    doorway: Option<Doorway>,
    leg_goal: Option<Vec2>,
    waypoints: VecDeque<Vec2>,
    repairs: u8,
}

impl PathFollower {
    /// Creates an idle follower standing at `position`.
    #[must_use]
    pub fn new(id: MoverId, position: Vec2) -> Self {
        Self {
            id,
            position,
            state: FollowState::Idle,
            sequence: 0,
            active_request: None,
            destination: None,
            route: VecDeque::new(),
            doorway: None,
            leg_goal: None,
            waypoints: VecDeque::new(),
            repairs: 0,
        }
    }

    /// Identifier of the mover.
    #[must_use]
    pub fn id(&self) -> MoverId {
        self.id
    }

    /// Current world-space position of the mover.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current phase of the follower.
    #[must_use]
    pub fn state(&self) -> FollowState {
        self.state
    }

    /// Identifier of the request whose answer the follower is waiting for.
    #[must_use]
    pub fn active_request(&self) -> Option<PathRequestId> {
        self.active_request
    }

    /// Starts travelling toward `destination`, replacing any previous plan.
    ///
    /// Returns `false` when the destination lies off the map or no chain of
    /// doors leads from the mover's area to the destination's area. On
    /// success the first leg's path request is pushed onto `out`.
    pub fn path_to(&mut self, world: &World, destination: Vec2, out: &mut Vec<Command>) -> bool {
        if !query::is_position_in_map(world, destination) {
            debug!(mover = self.id.get(), "destination off the map");
            return false;
        }
        let Some(route) = route_between(world, self.position, destination) else {
            debug!(mover = self.id.get(), "no area route to destination");
            return false;
        };

        self.clear_path();
        self.destination = Some(destination);
        self.route = route;
        self.begin_leg(world, out, true)
    }

    /// Reacts to world events: adopts resolved paths and re-checks the
    /// remaining path whenever something solid appears.
    pub fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::PathResolved { request, waypoints } => {
                    self.adopt(*request, waypoints.as_deref());
                }
                Event::SolidPlaced { .. } => self.revalidate(world, out),
                _ => {}
            }
        }
    }

    /// Moves up to `step` world units along the plan.
    ///
    /// Returns `true` exactly once, on the call that reaches the destination.
    pub fn follow_path(&mut self, world: &World, step: f32, out: &mut Vec<Command>) -> bool {
        let mut budget = step.max(0.0);
        loop {
            match self.state {
                FollowState::FollowingLocal => {
                    let Some(target) = self.waypoints.front().copied() else {
                        if self.doorway.is_some() {
                            self.state = FollowState::DoorTransition;
                            continue;
                        }
                        self.arrive();
                        return true;
                    };
                    if !self.advance(target, &mut budget) {
                        return false;
                    }
                    let _ = self.waypoints.pop_front();
                }
                FollowState::DoorTransition => {
                    let Some(doorway) = self.doorway else {
                        self.clear_path();
                        return false;
                    };
                    if !self.advance(doorway.outside, &mut budget) {
                        return false;
                    }
                    trace!(mover = self.id.get(), door = ?doorway.door, "stepped through door");
                    self.doorway = None;
                    let _ = self.route.pop_front();
                    let _ = self.begin_leg(world, out, true);
                    return false;
                }
                _ => return false,
            }
        }
    }

    /// Reports whether the follower is still working toward a destination.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.destination.is_some()
    }

    /// Forgets the destination and ignores any outstanding path result.
    pub fn clear_path(&mut self) {
        self.state = FollowState::Idle;
        self.active_request = None;
        self.destination = None;
        self.route.clear();
        self.doorway = None;
        self.leg_goal = None;
        self.waypoints.clear();
        self.repairs = 0;
    }

    fn begin_leg(&mut self, world: &World, out: &mut Vec<Command>, retry: bool) -> bool {
        let Some(destination) = self.destination else {
            return false;
        };
        self.repairs = 0;

        let Some(next) = self.route.front().copied() else {
            self.doorway = None;
            self.request(destination, FollowState::Planning, out);
            return true;
        };

        let here = query::area_at(world, self.position).map(Area::id);
        if let Some(doorway) = here.and_then(|here| nearest_doorway(world, here, next, self.position))
        {
            self.doorway = Some(doorway);
            self.request(doorway.inside, FollowState::Planning, out);
            return true;
        }

        if retry {
            if let Some(route) = route_between(world, self.position, destination) {
                debug!(mover = self.id.get(), "area route went stale; rerouting");
                self.route = route;
                return self.begin_leg(world, out, false);
            }
        }
        debug!(mover = self.id.get(), "no door leads toward the destination");
        self.clear_path();
        false
    }

    fn request(&mut self, goal: Vec2, state: FollowState, out: &mut Vec<Command>) {
        self.sequence = self.sequence.wrapping_add(1);
        let request = PathRequestId::new(self.id, self.sequence);
        self.active_request = Some(request);
        self.leg_goal = Some(goal);
        self.waypoints.clear();
        self.state = state;
        out.push(Command::RequestPath {
            request,
            start: self.position,
            end: goal,
            options: PathOptions::walkable_optimised(),
        });
    }

    fn adopt(&mut self, request: PathRequestId, waypoints: Option<&[Vec2]>) {
        if self.active_request != Some(request) {
            debug!(
                mover = self.id.get(),
                sequence = request.sequence(),
                "discarding stale path result"
            );
            return;
        }
        self.active_request = None;

        match waypoints {
            Some(waypoints) => {
                self.waypoints = waypoints.iter().copied().collect();
                self.state = FollowState::FollowingLocal;
            }
            None if self.state == FollowState::Replanning => {
                warn!(mover = self.id.get(), "path repair found no route");
                self.clear_path();
            }
            None => {
                debug!(mover = self.id.get(), "leg is unreachable");
                self.clear_path();
            }
        }
    }

    fn revalidate(&mut self, world: &World, out: &mut Vec<Command>) {
        let mut remaining = vec![self.position];
        match (self.state, self.doorway) {
            (FollowState::FollowingLocal, _) => remaining.extend(self.waypoints.iter().copied()),
            (FollowState::DoorTransition, Some(doorway)) => remaining.push(doorway.outside),
            _ => return,
        }
        if query::check_path(world, &remaining) {
            return;
        }

        let blocked_in_doorway = self.state == FollowState::DoorTransition;
        self.state = FollowState::Invalidated;
        if self.repairs >= MAX_REPAIRS_PER_LEG {
            warn!(mover = self.id.get(), "giving up after repeated path repairs");
            self.clear_path();
            return;
        }
        self.repairs += 1;

        if blocked_in_doorway {
            let Some(destination) = self.destination else {
                self.clear_path();
                return;
            };
            debug!(mover = self.id.get(), "doorway blocked; rerouting");
            let repairs = self.repairs;
            if self.path_to(world, destination, out) {
                self.repairs = repairs;
            } else {
                self.clear_path();
            }
            return;
        }

        let Some(goal) = self.leg_goal.or_else(|| self.waypoints.back().copied()) else {
            self.clear_path();
            return;
        };
        debug!(mover = self.id.get(), "path blocked; replanning leg");
        self.request(goal, FollowState::Replanning, out);
    }

    fn advance(&mut self, target: Vec2, budget: &mut f32) -> bool {
        let offset = target - self.position;
        let distance = offset.length();
        if distance <= *budget {
            self.position = target;
            *budget -= distance;
            true
        } else {
            self.position += offset / distance * *budget;
            *budget = 0.0;
            false
        }
    }

    fn arrive(&mut self) {
        trace!(mover = self.id.get(), "arrived");
        self.clear_path();
        self.state = FollowState::Arrived;
    }
}

/// Areas still to be entered on the way from `from` to `to`, excluding the starting area.
fn route_between(world: &World, from: Vec2, to: Vec2) -> Option<VecDeque<AreaId>> {
    let here = query::area_at(world, from)?.id();
    let there = query::area_at(world, to)?.id();
    let mut route: VecDeque<AreaId> = query::area_route(world, here, there)?.into();
    let _ = route.pop_front();
    Some(route)
}

fn nearest_doorway(world: &World, from: AreaId, to: AreaId, position: Vec2) -> Option<Doorway> {
    let area = query::area(world, from)?;
    area.doors_to(to)
        .iter()
        .filter_map(|door| {
            let (before, after) = door.adjacent_tiles();
            let before = before?;
            let (inside, outside) = if query::area_at_tile(world, before) == Some(from) {
                (before, after)
            } else {
                (after, before)
            };
            Some(Doorway {
                door: *door,
                inside: inside.center(),
                outside: outside.center(),
            })
        })
        .min_by(|left, right| {
            let left = left.door.world_position().distance(position);
            let right = right.door.world_position().distance(position);
            left.total_cmp(&right)
        })
}
