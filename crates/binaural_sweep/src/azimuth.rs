//! The sweep state machine which moves the source around the listener once per pass through the source.
use crate::config::{ANGLE_STEP, JUMP_STEPS};

/// A control value was out of range.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error, derive_more::IsVariant)]
pub enum ControlError {
    #[error("Sweep start {0} is outside 0..360")]
    StartOutOfRange(i32),

    #[error("Sweep finish {finish} is outside {start}..=360")]
    FinishOutOfRange { start: i32, finish: i32 },

    #[error("Jump level {0} is outside 0..=4")]
    JumpLevelOutOfRange(u8),
}

/// The range of azimuths a sweep covers, in degrees, snapped down to the measurement grid.
///
/// `start` is in `0..360` and `finish` in `start..=360`.  When the two are equal the sweep holds still.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SweepBounds {
    start: i32,
    finish: i32,
}

impl SweepBounds {
    pub fn new(start: i32, finish: i32) -> Result<SweepBounds, ControlError> {
        if !(0..360).contains(&start) {
            return Err(ControlError::StartOutOfRange(start));
        }
        if !(start..=360).contains(&finish) {
            return Err(ControlError::FinishOutOfRange { start, finish });
        }

        Ok(SweepBounds {
            start: start - start % ANGLE_STEP,
            finish: finish - finish % ANGLE_STEP,
        })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn finish(&self) -> i32 {
        self.finish
    }

    pub fn is_fixed(&self) -> bool {
        self.start == self.finish
    }
}

impl Default for SweepBounds {
    fn default() -> Self {
        SweepBounds {
            start: 0,
            finish: 360,
        }
    }
}

/// How many extra steps the azimuth takes at every wraparound, on top of the sweep itself.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct JumpLevel(u8);

impl JumpLevel {
    pub fn new(level: u8) -> Result<JumpLevel, ControlError> {
        if level as usize >= JUMP_STEPS.len() {
            return Err(ControlError::JumpLevelOutOfRange(level));
        }
        Ok(JumpLevel(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// The extra movement in degrees: 0, 5, 15, 25, or 35.
    pub fn degrees(&self) -> i32 {
        JUMP_STEPS[self.0 as usize] * ANGLE_STEP
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, derive_more::IsVariant)]
pub enum WrapMode {
    /// Bounce between the bounds.
    #[default]
    PingPong,

    /// Always move forward, rotating on past the finish and wrapping at 360.
    ///
    /// After the wrap the correction raises the azimuth back to the start, so a full circle reads `355, 0, 5`.
    OnePass,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, derive_more::IsVariant)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    fn sign(&self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Where the source is and where it is heading.
///
/// Between calls to [AzimuthController::on_wraparound] the azimuth is always a multiple of 5 in
/// `bounds.start()..=360`.  It may be past `bounds.finish()` when a jump carries it there.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AzimuthController {
    azimuth: i32,
    direction: Direction,
    bounds: SweepBounds,
    jump: JumpLevel,
    mode: WrapMode,
}

impl Default for AzimuthController {
    fn default() -> Self {
        AzimuthController::new(Default::default(), Default::default(), Default::default())
    }
}

impl AzimuthController {
    pub fn new(bounds: SweepBounds, jump: JumpLevel, mode: WrapMode) -> AzimuthController {
        AzimuthController {
            azimuth: bounds.start(),
            direction: Direction::Forward,
            bounds,
            jump,
            mode,
        }
    }

    pub fn azimuth(&self) -> i32 {
        self.azimuth
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn bounds(&self) -> SweepBounds {
        self.bounds
    }

    pub fn jump(&self) -> JumpLevel {
        self.jump
    }

    pub fn mode(&self) -> WrapMode {
        self.mode
    }

    /// Replace the sweep range, restarting at its start and moving forward.
    pub fn set_bounds(&mut self, bounds: SweepBounds) {
        self.bounds = bounds;
        self.azimuth = bounds.start();
        self.direction = Direction::Forward;
    }

    pub fn set_jump(&mut self, jump: JumpLevel) {
        self.jump = jump;
    }

    /// Takes effect at the next wraparound.
    pub fn set_mode(&mut self, mode: WrapMode) {
        self.mode = mode;
    }

    /// Advance once.  Called when the source has played through and is about to start again.
    ///
    /// Returns the new azimuth.
    pub fn on_wraparound(&mut self) -> i32 {
        if !self.bounds.is_fixed() {
            match self.mode {
                WrapMode::PingPong => self.bounce(),
                WrapMode::OnePass => self.advance_one_pass(),
            }
        }

        // Jumps apply even when the sweep itself is holding still.
        self.azimuth += self.direction.sign() * self.jump.degrees();
        self.correct();
        self.azimuth
    }

    fn bounce(&mut self) {
        match self.direction {
            Direction::Forward => {
                self.azimuth += ANGLE_STEP;
                if self.azimuth > self.bounds.finish() {
                    self.direction = Direction::Reverse;
                    self.azimuth -= 2 * ANGLE_STEP;
                }
            }
            Direction::Reverse => {
                self.azimuth -= ANGLE_STEP;
                if self.azimuth < self.bounds.start() {
                    self.direction = Direction::Forward;
                    self.azimuth += 2 * ANGLE_STEP;
                }
            }
        }
    }

    fn advance_one_pass(&mut self) {
        self.direction = Direction::Forward;
        self.azimuth = (self.azimuth + ANGLE_STEP).rem_euclid(360);
    }

    /// Pull the azimuth back onto `start..=360`.
    fn correct(&mut self) {
        if self.azimuth > 360 {
            self.azimuth -= 360;
        }
        if self.azimuth < self.bounds.start() {
            self.azimuth = self.bounds.start();
        }
    }
}
