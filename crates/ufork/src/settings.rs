//! Runtime configuration (SPEC_FULL.md §3), modeled the way the teacher's
//! own `vm::Settings` is: a plain struct passed into the constructor, no
//! config-file crate, no env-var layering.

use std::time::Duration;

/// Which Cargo feature selected the machine word's raw integer width
/// (spec.md §3). Purely informational — `word::Raw` is the type that
/// actually governs wraparound — but recorded here so `Settings`'s `Debug`
/// output shows which build it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
    /// `i16`, selected by the `word16` feature.
    W16,
    /// `i32`, the default.
    W32,
    /// `i64`, selected by the `word64` feature.
    W64,
}

impl WordWidth {
    /// The width baked into this build by Cargo feature selection.
    #[must_use]
    pub const fn current() -> Self {
        #[cfg(feature = "word16")]
        {
            WordWidth::W16
        }
        #[cfg(feature = "word64")]
        {
            WordWidth::W64
        }
        #[cfg(not(any(feature = "word16", feature = "word64")))]
        {
            WordWidth::W32
        }
    }
}

/// Construction-time configuration for a [`crate::vm::Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// `CELL_MAX` (spec.md §4.1): the heap's fixed capacity.
    pub cell_capacity: usize,
    /// The machine word width this build was compiled with.
    pub word_width: WordWidth,
    /// How many thread terminations to let accumulate before running a GC
    /// cycle. spec.md §4.7 literally triggers one after every termination;
    /// `1` reproduces that exactly, and is the default. Larger values trade
    /// the spec's immediacy for fewer, larger collections.
    pub gc_after_every_n_threads: u32,
    /// The clock interrupt's period (spec.md §4.7 step 1, §6).
    pub clock_tick: Duration,
}

impl Settings {
    /// Default settings: a 64k-cell heap, GC after every thread death (the
    /// literal spec.md behavior), and a one-second clock tick.
    #[must_use]
    pub const fn new(cell_capacity: usize) -> Self {
        Self {
            cell_capacity,
            word_width: WordWidth::current(),
            gc_after_every_n_threads: 1,
            clock_tick: Duration::from_secs(1),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_gc_every_thread() {
        assert_eq!(Settings::default().gc_after_every_n_threads, 1);
    }
}
