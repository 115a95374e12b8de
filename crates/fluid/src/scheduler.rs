//! Frame scheduling.
//!
//! The host owns the frame clock ([`FrameHost`]); the engine only asks for
//! the next callback and cancels it. [`FrameScheduler`] is the stopped /
//! running state machine plus the frame-rate ceiling.

use parking_lot::Mutex;

/// Frame callback; receives the host timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send>;

/// Handle for a requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// A per-frame animation clock, like `requestAnimationFrame`.
pub trait FrameHost: Send + Sync {
    /// Schedule `callback` for the next frame.
    fn request_animation_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Cancel a pending callback. Unknown or already-run handles are ignored.
    fn cancel_animation_frame(&self, handle: FrameHandle);
}

struct PendingFrame {
    id: u32,
    callback: FrameCallback,
    cancelled: bool,
}

#[derive(Default)]
struct FrameQueue {
    frames: Vec<PendingFrame>,
    counter: u32,
    /// Ids drained by the tick in progress that have not run yet.
    in_flight: Vec<u32>,
}

/// Frame host driven by explicit [`tick`](ManualFrameHost::tick) calls.
#[derive(Default)]
pub struct ManualFrameHost {
    queue: Mutex<FrameQueue>,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback that was pending when the tick started. Callbacks
    /// requested while ticking wait for the next tick; callbacks cancelled
    /// while ticking are skipped. Returns how many ran.
    pub fn tick(&self, timestamp_ms: f64) -> usize {
        let frames: Vec<PendingFrame> = {
            let mut queue = self.queue.lock();
            let frames: Vec<PendingFrame> = queue.frames.drain(..).filter(|f| !f.cancelled).collect();
            queue.in_flight = frames.iter().map(|f| f.id).collect();
            frames
        };

        let mut count = 0;
        for frame in frames {
            {
                let mut queue = self.queue.lock();
                let Some(pos) = queue.in_flight.iter().position(|&id| id == frame.id) else {
                    continue;
                };
                queue.in_flight.swap_remove(pos);
            }
            (frame.callback)(timestamp_ms);
            count += 1;
        }
        count
    }

    /// Number of live pending callbacks.
    pub fn pending(&self) -> usize {
        self.queue.lock().frames.iter().filter(|f| !f.cancelled).count()
    }
}

impl FrameHost for ManualFrameHost {
    fn request_animation_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut queue = self.queue.lock();
        queue.counter = queue.counter.wrapping_add(1);
        let id = queue.counter;
        queue.frames.push(PendingFrame {
            id,
            callback,
            cancelled: false,
        });
        FrameHandle(id)
    }

    fn cancel_animation_frame(&self, handle: FrameHandle) {
        let mut queue = self.queue.lock();
        queue.in_flight.retain(|&id| id != handle.0);
        if let Some(frame) = queue.frames.iter_mut().find(|f| f.id == handle.0) {
            frame.cancelled = true;
        }
    }
}

/// Delta assumed for the first frame after a start.
pub const NOMINAL_FRAME_MS: f64 = 16.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchedulerState {
    Stopped,
    Running { pending: Option<FrameHandle> },
}

/// Stopped/running state machine with an optional frame-rate ceiling.
///
/// Every start opens a new run, numbered by [`FrameScheduler::start`].
/// Callbacks carry the run they were requested for, so a callback left
/// over from an earlier run can tell it is stale.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    run: u64,
    fps_cap: u32,
    last_accepted: Option<f64>,
}

impl FrameScheduler {
    pub fn new(fps_cap: u32) -> Self {
        Self {
            state: SchedulerState::Stopped,
            run: 0,
            fps_cap,
            last_accepted: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Whether callbacks requested for `run` should still fire.
    pub fn is_current(&self, run: u64) -> bool {
        self.is_running() && self.run == run
    }

    pub fn fps_cap(&self) -> u32 {
        self.fps_cap
    }

    /// 0 removes the ceiling.
    pub fn set_fps_cap(&mut self, fps_cap: u32) {
        self.fps_cap = fps_cap;
    }

    /// Shortest accepted gap between frames in milliseconds.
    pub fn min_interval_ms(&self) -> f64 {
        if self.fps_cap == 0 {
            0.0
        } else {
            1000.0 / self.fps_cap as f64
        }
    }

    /// Enter the running state and return the new run number. The next
    /// callback is always accepted.
    pub fn start(&mut self) -> u64 {
        self.run = self.run.wrapping_add(1);
        self.state = SchedulerState::Running { pending: None };
        self.last_accepted = None;
        self.run
    }

    /// Enter the stopped state, handing back the callback to cancel.
    pub fn stop(&mut self) -> Option<FrameHandle> {
        match std::mem::replace(&mut self.state, SchedulerState::Stopped) {
            SchedulerState::Running { pending } => pending,
            SchedulerState::Stopped => None,
        }
    }

    /// Record the callback requested for the next frame.
    pub fn set_pending(&mut self, handle: FrameHandle) {
        if let SchedulerState::Running { pending } = &mut self.state {
            *pending = Some(handle);
        }
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        match self.state {
            SchedulerState::Running { pending } => pending,
            SchedulerState::Stopped => None,
        }
    }

    /// Decide whether the callback at `timestamp_ms` renders. Returns the
    /// delta since the last accepted frame when it does.
    pub fn admit(&mut self, timestamp_ms: f64) -> Option<f64> {
        let delta = match self.last_accepted {
            Some(last) => {
                let delta = timestamp_ms - last;
                if self.fps_cap > 0 && delta < self.min_interval_ms() {
                    tracing::trace!(delta, cap = self.fps_cap, "frame skipped by fps cap");
                    return None;
                }
                delta
            }
            None => NOMINAL_FRAME_MS,
        };
        self.last_accepted = Some(timestamp_ms);
        Some(delta)
    }
}
