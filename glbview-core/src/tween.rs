/// Time-bounded interpolation advanced once per frame.
///
/// Times are milliseconds on whatever monotonic clock the host uses for both
/// input events and frame callbacks.
use nalgebra::Point3;

/// Maps normalized elapsed time in [0, 1] to normalized progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    QuadraticOut,
}

impl Easing {
    pub fn apply(self, k: f64) -> f64 {
        match self {
            Easing::QuadraticOut => k * (2.0 - k),
        }
    }
}

/// Values a tween can drive
pub trait Interpolate: Copy {
    fn lerp(&self, to: &Self, t: f32) -> Self;
}

impl Interpolate for Point3<f32> {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

/// Outcome of sampling a tween at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample<T> {
    /// Start time not reached yet
    Pending,
    Running(T),
    /// Final value; the tween is done after this sample
    Complete(T),
}

#[derive(Debug, Clone)]
pub struct Tween<T> {
    from: T,
    to: T,
    start_ms: f64,
    duration_ms: f64,
    easing: Easing,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(from: T, to: T, duration_ms: f64, easing: Easing, start_ms: f64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration_ms.max(0.0),
            easing,
        }
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn sample(&self, now_ms: f64) -> Sample<T> {
        if now_ms < self.start_ms {
            return Sample::Pending;
        }
        let elapsed = if self.duration_ms == 0.0 {
            1.0
        } else {
            ((now_ms - self.start_ms) / self.duration_ms).min(1.0)
        };
        let value = self.from.lerp(&self.to, self.easing.apply(elapsed) as f32);
        if elapsed >= 1.0 {
            Sample::Complete(self.to)
        } else {
            Sample::Running(value)
        }
    }
}

/// Holds at most one tween for a single subject.
///
/// Starting a new tween replaces the running one, so overlapping interactions
/// never write the same value twice in a frame. `M` is per-tween metadata the
/// owner wants back on every step.
#[derive(Debug, Clone)]
pub struct TransitionSlot<T, M = ()> {
    active: Option<(Tween<T>, M)>,
}

impl<T: Interpolate, M: Copy> TransitionSlot<T, M> {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Install a tween, returning true when it replaced a running one
    pub fn start(&mut self, tween: Tween<T>, meta: M) -> bool {
        self.active.replace((tween, meta)).is_some()
    }

    pub fn target(&self) -> Option<T> {
        self.active.as_ref().map(|(tween, _)| tween.target())
    }

    /// Sample the active tween, clearing the slot once it completes
    pub fn advance(&mut self, now_ms: f64) -> Option<(T, M)> {
        let (tween, meta) = self.active.as_ref()?;
        let meta = *meta;
        match tween.sample(now_ms) {
            Sample::Pending => None,
            Sample::Running(value) => Some((value, meta)),
            Sample::Complete(value) => {
                self.active = None;
                Some((value, meta))
            }
        }
    }
}

impl<T: Interpolate, M: Copy> Default for TransitionSlot<T, M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Interpolate for f32 {
        fn lerp(&self, to: &Self, t: f32) -> Self {
            self + (to - self) * t
        }
    }

    #[test]
    fn test_easing_endpoints() {
        let easing = Easing::QuadraticOut;
        assert!(easing.apply(0.0).abs() < 1e-12);
        assert!((easing.apply(1.0) - 1.0).abs() < 1e-12);
        assert!((easing.apply(0.5) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_tween_sampling() {
        let tween = Tween::new(0.0f32, 10.0, 100.0, Easing::QuadraticOut, 1000.0);
        assert_eq!(tween.sample(999.0), Sample::Pending);
        assert_eq!(tween.sample(1000.0), Sample::Running(0.0));
        assert_eq!(tween.sample(1050.0), Sample::Running(7.5));
        assert_eq!(tween.sample(1100.0), Sample::Complete(10.0));
        assert_eq!(tween.sample(5000.0), Sample::Complete(10.0));
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let tween = Tween::new(1.0f32, 2.0, 0.0, Easing::QuadraticOut, 0.0);
        assert_eq!(tween.sample(0.0), Sample::Complete(2.0));
    }

    #[test]
    fn test_slot_clears_after_completion() {
        let mut slot: TransitionSlot<f32> = TransitionSlot::new();
        assert!(slot.advance(0.0).is_none());

        slot.start(Tween::new(0.0, 1.0, 10.0, Easing::QuadraticOut, 0.0), ());
        assert_eq!(slot.target(), Some(1.0));
        assert_eq!(slot.advance(5.0), Some((0.75, ())));
        assert_eq!(slot.advance(10.0), Some((1.0, ())));
        assert_eq!(slot.target(), None);
        assert!(slot.advance(20.0).is_none());
    }

    #[test]
    fn test_slot_replaces_running_tween() {
        let mut slot = TransitionSlot::new();
        assert!(!slot.start(Tween::new(0.0f32, 1.0, 100.0, Easing::QuadraticOut, 0.0), 1u8));
        assert!(slot.start(Tween::new(0.0f32, -1.0, 100.0, Easing::QuadraticOut, 0.0), 2u8));
        assert_eq!(slot.target(), Some(-1.0));
        assert_eq!(slot.advance(50.0), Some((-0.75, 2)));
    }

    #[test]
    fn test_point_interpolation() {
        let a = Point3::new(0.0f32, 0.0, 5.0);
        let b = Point3::new(0.0f32, 0.0, 5.5);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.z - 5.25).abs() < 1e-6);
    }
}
