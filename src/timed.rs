use std::time::Instant;

/// Records checkpoints so phases of a longer run can be timed separately.
pub struct TimedContext {
    checkpoints: Vec<Instant>
}

impl Default for TimedContext {
    fn default() -> Self { Self::new() }
}

impl TimedContext {
    pub fn new() -> Self {
        Self { checkpoints: vec![Instant::now()] }
    }

    /// Seconds since the previous checkpoint.
    pub fn checkpoint(&mut self) -> f32 {
        let new_checkpoint = Instant::now();
        let last_checkpoint = self.checkpoints.last().copied().unwrap_or(new_checkpoint);
        self.checkpoints.push(new_checkpoint);

        new_checkpoint.duration_since(last_checkpoint).as_secs_f32()
    }

    /// Seconds since the context was created.
    pub fn total(&self) -> f32 {
        self.checkpoints.first().map(|start| start.elapsed().as_secs_f32()).unwrap_or(0.)
    }
}

/// Runs f and returns its result with the elapsed seconds.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, f32) {
    let start = Instant::now();
    let result = f();

    (result, start.elapsed().as_secs_f32())
}
