//! Resumable job state machines.
//!
//! A [`Project`] is a list of layers; each layer maps a [`JobSignal`] to a
//! [`Component`]. Every worker owns a [`Cursor`] pointing at one node. On
//! each tick [`Project::run`] resumes at the cursor and keeps stepping
//! through layers in the same tick until a component suspends
//! ([`Step::Continue`]) or the next layer has no entry for the emitted
//! signal, which completes the project.
//!
//! Projects hold no per-worker state, so one definition serves any number
//! of workers. Signals declared with [`Project::cyclize`] wrap around from
//! the last layer to layer 0 instead of completing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use hive_types::{ObjectId, ResourceType, TransactionId};

use crate::error::TaskError;
use crate::services::Services;
use crate::signal::JobSignal;
use crate::task::TaskData;

/// Data carried from one node to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepData {
    /// Object the next step acts on.
    pub target: Option<ObjectId>,
    /// Transaction paying for the current fetch or delivery.
    pub transaction: Option<TransactionId>,
    /// Whether the target is harvested.
    pub harvest: bool,
    /// Resource involved.
    pub resource: Option<ResourceType>,
    /// Units involved.
    pub amount: u32,
}

/// A finished step: branch on `signal`, hand `data` to the next node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Branch selector.
    pub signal: JobSignal,
    /// Data for the next node.
    pub data: StepData,
}

/// Outcome of one component call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Still working; call the same node next tick.
    Continue,
    /// Step finished.
    Next(Signal),
}

impl Step {
    /// Finish with a signal and no data.
    pub fn signal(signal: JobSignal) -> Self {
        Self::Next(Signal {
            signal,
            data: StepData::default(),
        })
    }

    /// Finish with a signal and data.
    pub const fn with(signal: JobSignal, data: StepData) -> Self {
        Self::Next(Signal { signal, data })
    }
}

/// What a component sees of the job it runs for.
pub struct JobContext<'a> {
    /// The worker running the step.
    pub worker: ObjectId,
    /// The task's shared payload.
    pub data: &'a mut TaskData,
    /// Data attached to the worker's cursor.
    pub carry: &'a StepData,
}

/// One node of a project graph.
pub type Component = Box<dyn Fn(&mut Services<'_>, &mut JobContext<'_>) -> Step>;

/// Box a closure as a [`Component`].
pub fn component<F>(f: F) -> Component
where
    F: Fn(&mut Services<'_>, &mut JobContext<'_>) -> Step + 'static,
{
    Box::new(f)
}

/// A node that forwards the incoming data under `signal`.
pub fn pass(signal: JobSignal) -> Component {
    component(move |_, ctx| Step::with(signal, ctx.carry.clone()))
}

/// A worker's position in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Current layer.
    pub layer: usize,
    /// Key of the current node within the layer.
    pub signal: JobSignal,
    /// Data attached by the previous node.
    pub data: StepData,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            layer: 0,
            signal: JobSignal::Ok,
            data: StepData::default(),
        }
    }
}

impl Cursor {
    /// Point back at the entry node.
    pub fn refresh(&mut self) {
        *self = Self::default();
    }
}

/// Result of [`Project::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The worker suspended; resume from the cursor next tick.
    Suspended,
    /// No node matched the last signal; the worker is finished.
    Complete(JobSignal),
}

/// A layered graph of components.
#[derive(Default)]
pub struct Project {
    layers: Vec<BTreeMap<JobSignal, Component>>,
    cyclic: BTreeSet<JobSignal>,
}

impl core::fmt::Debug for Project {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let keys: Vec<Vec<JobSignal>> = self
            .layers
            .iter()
            .map(|layer| layer.keys().copied().collect())
            .collect();
        f.debug_struct("Project")
            .field("layers", &keys)
            .field("cyclic", &self.cyclic)
            .finish()
    }
}

impl Project {
    /// An empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer.
    #[must_use]
    pub fn layer(mut self, entries: Vec<(JobSignal, Component)>) -> Self {
        self.layers.push(entries.into_iter().collect());
        self
    }

    /// Let `signal` wrap from the last layer back to layer 0.
    #[must_use]
    pub fn cyclize(mut self, signal: JobSignal) -> Self {
        self.cyclic.insert(signal);
        self
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Check that layer 0 has an `Ok` entry point.
    pub fn validate(&self) -> Result<(), TaskError> {
        let Some(first) = self.layers.first() else {
            return Err(TaskError::InvalidProject("no layers"));
        };
        if !first.contains_key(&JobSignal::Ok) {
            return Err(TaskError::InvalidProject("layer 0 has no Ok entry"));
        }
        Ok(())
    }

    /// Where `signal` emitted at `layer` leads, `None` when the project ends.
    fn follow(&self, layer: usize, signal: JobSignal) -> Option<usize> {
        let next = layer.saturating_add(1);
        if next < self.layers.len() {
            return self
                .layers
                .get(next)
                .filter(|l| l.contains_key(&signal))
                .map(|_| next);
        }
        if self.cyclic.contains(&signal)
            && self.layers.first().is_some_and(|l| l.contains_key(&signal))
        {
            return Some(0);
        }
        None
    }

    /// Resume a worker at its cursor and step until it suspends, completes,
    /// or has run `max_steps` nodes this tick.
    pub fn run(
        &self,
        services: &mut Services<'_>,
        worker: ObjectId,
        data: &mut TaskData,
        cursor: &mut Cursor,
        max_steps: u32,
    ) -> Progress {
        let mut steps = 0_u32;
        loop {
            let Some(node) = self
                .layers
                .get(cursor.layer)
                .and_then(|layer| layer.get(&cursor.signal))
            else {
                let last = cursor.signal;
                cursor.refresh();
                return Progress::Complete(last);
            };

            let step = {
                let mut ctx = JobContext {
                    worker,
                    data: &mut *data,
                    carry: &cursor.data,
                };
                node(services, &mut ctx)
            };
            steps = steps.saturating_add(1);

            match step {
                Step::Continue => return Progress::Suspended,
                Step::Next(Signal { signal, data: next }) => {
                    let Some(layer) = self.follow(cursor.layer, signal) else {
                        cursor.refresh();
                        return Progress::Complete(signal);
                    };
                    cursor.layer = layer;
                    cursor.signal = signal;
                    cursor.data = next;
                }
            }

            if steps >= max_steps {
                return Progress::Suspended;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::settings::TaskSettings;
    use crate::timer::Timer;
    use hive_ledger::{Ledger, LendingPolicy};
    use hive_resources::ResourceManager;
    use hive_world::{RoomState, WorldMap, WorldState};

    fn harness() -> (WorldState, Ledger, ResourceManager, Timer, TaskSettings) {
        let mut map = WorldMap::new();
        assert!(map.add_room(RoomState::new("W1N1")).is_ok());
        (
            WorldState::new(map),
            Ledger::new(LendingPolicy::Unlimited),
            ResourceManager::new(),
            Timer::new(),
            TaskSettings::default(),
        )
    }

    fn counting(counter: &Rc<Cell<u32>>, step: Step) -> Component {
        let counter = Rc::clone(counter);
        component(move |_, _| {
            counter.set(counter.get().saturating_add(1));
            step.clone()
        })
    }

    /// Suspends on the first `waits` calls, then emits `signal`.
    fn waiting(counter: &Rc<Cell<u32>>, waits: u32, signal: JobSignal) -> Component {
        let counter = Rc::clone(counter);
        component(move |_, _| {
            let calls = counter.get().saturating_add(1);
            counter.set(calls);
            if calls > waits {
                Step::signal(signal)
            } else {
                Step::Continue
            }
        })
    }

    #[test]
    fn validate_requires_ok_entry() {
        assert!(Project::new().validate().is_err());
        let bad = Project::new().layer(vec![(JobSignal::Full, pass(JobSignal::Ok))]);
        assert!(bad.validate().is_err());
        let good = Project::new().layer(vec![(JobSignal::Ok, pass(JobSignal::Ok))]);
        assert!(good.validate().is_ok());
    }

    #[test]
    fn resumes_exactly_where_it_suspended() {
        let (mut world, mut ledger, mut resources, mut timer, settings) = harness();
        let mut services = Services {
            world: &mut world,
            ledger: &mut ledger,
            resources: &mut resources,
            timer: &mut timer,
            settings: &settings,
        };
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let project = Project::new()
            .layer(vec![(JobSignal::Ok, counting(&first, Step::signal(JobSignal::Ok)))])
            .layer(vec![(JobSignal::Ok, waiting(&second, 2, JobSignal::Done))]);

        let worker = ObjectId::new();
        let mut data = TaskData::default();
        let mut cursor = Cursor::default();

        assert_eq!(
            project.run(&mut services, worker, &mut data, &mut cursor, 16),
            Progress::Suspended
        );
        assert_eq!((cursor.layer, cursor.signal), (1, JobSignal::Ok));
        assert_eq!(first.get(), 1);

        assert_eq!(
            project.run(&mut services, worker, &mut data, &mut cursor, 16),
            Progress::Suspended
        );
        assert_eq!((cursor.layer, cursor.signal), (1, JobSignal::Ok));
        assert_eq!(first.get(), 1);

        assert_eq!(
            project.run(&mut services, worker, &mut data, &mut cursor, 16),
            Progress::Complete(JobSignal::Done)
        );
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 3);
        assert_eq!(cursor, Cursor::default());
    }

    #[test]
    fn branches_on_signal() {
        let (mut world, mut ledger, mut resources, mut timer, settings) = harness();
        let mut services = Services {
            world: &mut world,
            ledger: &mut ledger,
            resources: &mut resources,
            timer: &mut timer,
            settings: &settings,
        };
        let ok_branch = Rc::new(Cell::new(0));
        let full_branch = Rc::new(Cell::new(0));
        let project = Project::new()
            .layer(vec![(JobSignal::Ok, pass(JobSignal::Full))])
            .layer(vec![
                (JobSignal::Ok, counting(&ok_branch, Step::Continue)),
                (JobSignal::Full, counting(&full_branch, Step::Continue)),
            ]);
        let mut data = TaskData::default();
        let mut cursor = Cursor::default();
        let _ = project.run(&mut services, ObjectId::new(), &mut data, &mut cursor, 16);
        assert_eq!((ok_branch.get(), full_branch.get()), (0, 1));
    }

    #[test]
    fn cyclized_signal_wraps_to_first_layer() {
        let (mut world, mut ledger, mut resources, mut timer, settings) = harness();
        let mut services = Services {
            world: &mut world,
            ledger: &mut ledger,
            resources: &mut resources,
            timer: &mut timer,
            settings: &settings,
        };
        let entry = Rc::new(Cell::new(0));
        let project = Project::new()
            .layer(vec![(JobSignal::Ok, counting(&entry, Step::signal(JobSignal::Ok)))])
            .layer(vec![(JobSignal::Ok, pass(JobSignal::Ok))])
            .cyclize(JobSignal::Ok);
        let mut data = TaskData::default();
        let mut cursor = Cursor::default();

        let progress = project.run(&mut services, ObjectId::new(), &mut data, &mut cursor, 6);
        assert_eq!(progress, Progress::Suspended);
        assert_eq!(entry.get(), 3);
    }

    #[test]
    fn uncyclized_signal_completes() {
        let (mut world, mut ledger, mut resources, mut timer, settings) = harness();
        let mut services = Services {
            world: &mut world,
            ledger: &mut ledger,
            resources: &mut resources,
            timer: &mut timer,
            settings: &settings,
        };
        let project = Project::new()
            .layer(vec![(JobSignal::Ok, pass(JobSignal::Ok))])
            .layer(vec![(JobSignal::Ok, pass(JobSignal::Empty))])
            .cyclize(JobSignal::Ok);
        let mut data = TaskData::default();
        let mut cursor = Cursor::default();
        assert_eq!(
            project.run(&mut services, ObjectId::new(), &mut data, &mut cursor, 16),
            Progress::Complete(JobSignal::Empty)
        );
    }
}
