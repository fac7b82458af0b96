//! Display-refresh driven repeating task
//!
//! The browser calls back once per refresh with a timestamp. `FrameLoop` turns those
//! timestamps into frame deltas and owns the start/stop/pause state, so the
//! simulation never sees time pass while paused or after a stop.

/// Longest delta handed to the simulation in one frame (ms)
pub const MAX_FRAME_DT_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
    Paused,
}

/// What the caller should do with this refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// Cancelled: do not update, do not reschedule
    Stopped,
    /// Draw only
    Paused,
    /// Advance the simulation by `dt_ms`, then draw
    Run { dt_ms: f64 },
}

#[derive(Debug, Clone)]
pub struct FrameLoop {
    state: LoopState,
    last_ms: Option<f64>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            last_ms: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == LoopState::Stopped
    }

    /// (Re)start from `now_ms`; the first frame after this has a zero-ish delta
    pub fn start(&mut self, now_ms: f64) {
        self.state = LoopState::Running;
        self.last_ms = Some(now_ms);
    }

    /// Cancel. Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
        self.last_ms = None;
    }

    pub fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::Paused;
        }
    }

    /// Resume without crediting the time spent paused
    pub fn resume(&mut self, now_ms: f64) {
        if self.state == LoopState::Paused {
            self.state = LoopState::Running;
            self.last_ms = Some(now_ms);
        }
    }

    pub fn set_paused(&mut self, paused: bool, now_ms: f64) {
        if paused {
            self.pause();
        } else {
            self.resume(now_ms);
        }
    }

    /// Called once per display refresh
    pub fn frame(&mut self, now_ms: f64) -> Frame {
        match self.state {
            LoopState::Stopped => Frame::Stopped,
            LoopState::Paused => {
                self.last_ms = Some(now_ms);
                Frame::Paused
            }
            LoopState::Running => {
                let last = self.last_ms.replace(now_ms).unwrap_or(now_ms);
                let dt_ms = (now_ms - last).clamp(0.0, MAX_FRAME_DT_MS);
                Frame::Run { dt_ms }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_loop_is_stopped() {
        let mut fl = FrameLoop::new();
        assert_eq!(fl.frame(16.0), Frame::Stopped);
    }

    #[test]
    fn test_running_deltas() {
        let mut fl = FrameLoop::new();
        fl.start(1000.0);
        assert_eq!(fl.frame(1016.0), Frame::Run { dt_ms: 16.0 });
        assert_eq!(fl.frame(1032.0), Frame::Run { dt_ms: 16.0 });
        // Long stalls are clamped
        assert_eq!(fl.frame(5000.0), Frame::Run { dt_ms: MAX_FRAME_DT_MS });
        // Clock going backwards never yields a negative delta
        assert_eq!(fl.frame(4000.0), Frame::Run { dt_ms: 0.0 });
    }

    #[test]
    fn test_pause_does_not_credit_time() {
        let mut fl = FrameLoop::new();
        fl.start(0.0);
        fl.pause();
        assert_eq!(fl.frame(50.0), Frame::Paused);
        assert_eq!(fl.frame(90.0), Frame::Paused);
        fl.resume(90.0);
        assert_eq!(fl.frame(100.0), Frame::Run { dt_ms: 10.0 });
    }

    #[test]
    fn test_stop_cancels_from_any_state() {
        let mut fl = FrameLoop::new();
        fl.start(0.0);
        fl.pause();
        fl.stop();
        assert_eq!(fl.frame(10.0), Frame::Stopped);
        fl.resume(20.0);
        assert_eq!(fl.frame(30.0), Frame::Stopped);
        fl.stop();
        assert!(fl.is_stopped());
    }
}
