//! Event types and sinks for observing sampling runs.
//!
//! [`crate::scatter::runner::run_with_events`] reports progress as
//! [`ScatterEvent`]s. A sink declares through [`EventSink::wants`] which kinds it
//! reads; the runner skips the rest.
use crate::allocation::AllocationPlan;
use crate::scatter::runner::SampleConfig;

/// Describes events emitted by sampling runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ScatterEvent {
    /// Emitted when a run starts.
    RunStarted {
        /// The run configuration used.
        config: SampleConfig,
        /// Number of regions in the boundary.
        region_count: usize,
    },

    /// Emitted once per region after its geodesic area was computed.
    AreaComputed {
        /// Region name.
        region: String,
        /// Number of ring vertices.
        vertices: usize,
        /// Unsigned geodesic area in square meters.
        area_m2: f64,
    },

    /// Emitted after the point budget was split across regions.
    AllocationPlanned {
        /// Per-region point counts.
        plan: AllocationPlan,
    },

    /// Emitted after a region's points were generated.
    RegionSampled {
        /// Position of the region in the region set.
        index: usize,
        /// Region name.
        region: String,
        /// Number of accepted points.
        points: usize,
        /// Number of rejected candidates.
        rejected: u64,
    },

    /// Emitted when the whole run succeeded.
    RunFinished {
        /// Total number of points generated.
        points: usize,
        /// Total number of rejected candidates.
        rejected: u64,
    },

    /// Non-fatal warning generated during a run.
    Warning {
        /// Context string (e.g. region name).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`ScatterEvent`], used to filter what a sink receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScatterEventKind {
    RunStarted,
    AreaComputed,
    AllocationPlanned,
    RegionSampled,
    RunFinished,
    Warning,
}

impl ScatterEvent {
    pub fn kind(&self) -> ScatterEventKind {
        match self {
            ScatterEvent::RunStarted { .. } => ScatterEventKind::RunStarted,
            ScatterEvent::AreaComputed { .. } => ScatterEventKind::AreaComputed,
            ScatterEvent::AllocationPlanned { .. } => ScatterEventKind::AllocationPlanned,
            ScatterEvent::RegionSampled { .. } => ScatterEventKind::RegionSampled,
            ScatterEvent::RunFinished { .. } => ScatterEventKind::RunFinished,
            ScatterEvent::Warning { .. } => ScatterEventKind::Warning,
        }
    }
}

/// Receiver for [`ScatterEvent`]s emitted by a run.
pub trait EventSink {
    fn send(&mut self, event: ScatterEvent);

    /// Whether events of `kind` should be built and sent at all.
    ///
    /// The runner checks this before cloning names or plans into an event.
    #[inline]
    fn wants(&self, _kind: ScatterEventKind) -> bool {
        true
    }
}

/// Discards everything; [`crate::scatter::runner::run`] uses it.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: ScatterEvent) {}

    #[inline]
    fn wants(&self, _kind: ScatterEventKind) -> bool {
        false
    }
}

/// Forwards events of the selected kinds to a closure.
///
/// Built with [`FnSink::new`] it receives every event; [`FnSink::only`] narrows
/// it so the runner skips building events nobody reads.
pub struct FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    f: F,
    kinds: Option<Vec<ScatterEventKind>>,
}

impl<F> FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    pub fn new(f: F) -> Self {
        Self { f, kinds: None }
    }

    pub fn only(kinds: &[ScatterEventKind], f: F) -> Self {
        Self {
            f,
            kinds: Some(kinds.to_vec()),
        }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        if self.wants(event.kind()) {
            (self.f)(event);
        }
    }

    fn wants(&self, kind: ScatterEventKind) -> bool {
        self.kinds.as_ref().is_none_or(|k| k.contains(&kind))
    }
}

/// Keeps every event of a run, in emission order.
#[derive(Default)]
pub struct VecSink {
    events: Vec<ScatterEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<ScatterEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[ScatterEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        self.events.push(event);
    }
}
