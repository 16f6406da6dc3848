// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typewriter text effects.
//!
//! [`Typewriter`] reveals one string a character at a time, optionally
//! deleting and retyping it forever. [`TypewriterSequence`] cycles through a
//! list of strings. Both are driven by [`tick`](Typewriter::tick) with the
//! frame time; every pause between characters is a deadline, and a late frame
//! catches up on all steps that fell due since the previous one.
//!
//! Text is indexed by `char`, so multi-byte text is never split mid-character.

use alloc::string::String;
use alloc::vec::Vec;

use crate::time::{Duration, HostTime};

/// Upper bound on state steps taken by one tick.
const MAX_STEPS_PER_TICK: usize = 256;

/// Source of per-character pacing noise.
pub trait Jitter {
    /// A value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// No noise: every character takes exactly the base speed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn next_unit(&mut self) -> f64 {
        0.0
    }
}

impl<F: FnMut() -> f64> Jitter for F {
    fn next_unit(&mut self) -> f64 {
        self().clamp(0.0, 1.0)
    }
}

/// Small deterministic generator for hosts without a platform RNG.
#[derive(Clone, Copy, Debug)]
pub struct XorShiftJitter(u64);

impl XorShiftJitter {
    /// Seeds the generator; a zero seed is replaced by a fixed constant.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }
}

impl Jitter for XorShiftJitter {
    fn next_unit(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// Pacing and cursor configuration for [`Typewriter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TypewriterOptions {
    /// Base time per typed character.
    pub speed: Duration,
    /// Maximum extra time per typed character.
    pub jitter: Duration,
    /// Wait before the first character.
    pub start_delay: Duration,
    /// Append [`cursor`](Self::cursor) while the text is in motion.
    pub show_cursor: bool,
    /// Cursor glyph.
    pub cursor: char,
    /// Delete and retype forever.
    pub looping: bool,
    /// Hold time on the complete text before deleting.
    pub loop_delay: Duration,
    /// Time per deleted character.
    pub delete_speed: Duration,
    /// Start as soon as text is set.
    pub auto_start: bool,
}

impl TypewriterOptions {
    /// 80ms + up to 50ms per character, `|` cursor, no loop.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            speed: Duration::from_millis_u64(80),
            jitter: Duration::from_millis_u64(50),
            start_delay: Duration::ZERO,
            show_cursor: true,
            cursor: '|',
            looping: false,
            loop_delay: Duration::from_millis_u64(2000),
            delete_speed: Duration::from_millis_u64(40),
            auto_start: true,
        }
    }
}

impl Default for TypewriterOptions {
    fn default() -> Self {
        Self::standard()
    }
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn prefix(text: &str, chars: usize) -> &str {
    let end = text
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte);
    &text[..end]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Type,
    BeginDelete,
    Delete,
    Restart,
}

/// Single-string typewriter.
#[derive(Clone, Debug)]
pub struct Typewriter<J = NoJitter> {
    text: String,
    len: usize,
    index: usize,
    options: TypewriterOptions,
    jitter: J,
    typing: bool,
    deleting: bool,
    complete: bool,
    paused: bool,
    next: Option<(HostTime, Step)>,
}

impl Typewriter<NoJitter> {
    /// A typewriter with fixed pacing.
    #[must_use]
    pub fn new(text: impl Into<String>, options: TypewriterOptions) -> Self {
        Self::with_jitter(text, options, NoJitter)
    }
}

impl<J: Jitter> Typewriter<J> {
    /// A typewriter drawing pacing noise from `jitter`.
    #[must_use]
    pub fn with_jitter(text: impl Into<String>, options: TypewriterOptions, jitter: J) -> Self {
        let text = text.into();
        Self {
            len: char_count(&text),
            text,
            index: 0,
            options,
            jitter,
            typing: false,
            deleting: false,
            complete: false,
            paused: false,
            next: None,
        }
    }

    /// Called when the owning view mounts; starts if `auto_start` is set.
    pub fn mount(&mut self, now: HostTime) {
        if self.options.auto_start {
            self.start(now);
        }
    }

    /// Clears the text and begins typing after the start delay.
    pub fn start(&mut self, now: HostTime) {
        self.index = 0;
        self.typing = true;
        self.complete = false;
        self.deleting = false;
        self.paused = false;
        self.next = Some((now + self.options.start_delay, Step::Type));
    }

    /// Freezes at the current character.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continues after [`pause`](Self::pause).
    ///
    /// If the pending step has not fired yet it simply runs on schedule;
    /// otherwise the interrupted typing or deleting continues immediately.
    pub fn resume(&mut self, now: HostTime) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if self.next.is_some() {
            return;
        }
        if self.typing {
            self.next = Some((now, Step::Type));
        } else if self.deleting {
            self.next = Some((now, Step::Delete));
        }
        self.tick(now);
    }

    /// Stops and clears everything.
    pub fn reset(&mut self) {
        self.index = 0;
        self.typing = false;
        self.complete = false;
        self.deleting = false;
        self.paused = false;
        self.next = None;
    }

    /// Replaces the text, resetting and restarting when `auto_start` is set.
    pub fn set_text(&mut self, text: impl Into<String>, now: HostTime) {
        self.text = text.into();
        self.len = char_count(&self.text);
        self.reset();
        if self.options.auto_start {
            self.start(now);
        }
    }

    /// Runs every step due at `now`. Returns `true` if the display changed.
    pub fn tick(&mut self, now: HostTime) -> bool {
        let before = self.index;
        for _ in 0..MAX_STEPS_PER_TICK {
            match self.next {
                Some((due, step)) if due <= now => {
                    self.next = None;
                    self.step(due, step);
                }
                _ => break,
            }
        }
        self.index != before
    }

    fn step(&mut self, due: HostTime, step: Step) {
        if self.paused {
            if step == Step::BeginDelete {
                self.deleting = true;
            }
            return;
        }
        match step {
            Step::Type if self.index < self.len => {
                self.index += 1;
                let extra = Duration::from_millis(
                    self.options.jitter.as_millis() * self.jitter.next_unit(),
                );
                self.next = Some((due + self.options.speed + extra, Step::Type));
            }
            Step::Type => {
                self.typing = false;
                self.complete = true;
                if self.options.looping {
                    self.next = Some((due + self.options.loop_delay, Step::BeginDelete));
                }
            }
            Step::BeginDelete => {
                self.deleting = true;
                self.step(due, Step::Delete);
            }
            Step::Delete if self.index > 0 => {
                self.index -= 1;
                self.next = Some((due + self.options.delete_speed, Step::Delete));
            }
            Step::Delete => {
                self.deleting = false;
                self.complete = false;
                self.next = Some((due + self.options.start_delay, Step::Restart));
            }
            Step::Restart => self.start(due),
        }
    }

    /// The typed portion of the text.
    #[must_use]
    pub fn display_text(&self) -> &str {
        prefix(&self.text, self.index)
    }

    /// The typed portion followed by the cursor while the text is in motion.
    #[must_use]
    pub fn text_with_cursor(&self) -> String {
        let mut out = String::from(self.display_text());
        if self.options.show_cursor && (self.typing || self.deleting || !self.complete) {
            out.push(self.options.cursor);
        }
        out
    }

    /// Characters are being added.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Characters are being removed.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// The whole text is shown.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// [`pause`](Self::pause) is in effect.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Next deadline, for hosts that sleep between steps.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.next.map(|(due, _)| due)
    }
}

/// Pacing for [`TypewriterSequence`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceOptions {
    /// Time per typed character.
    pub speed: Duration,
    /// Time per deleted character.
    pub delete_speed: Duration,
    /// Hold time on each complete string.
    pub hold: Duration,
    /// Wait before the first character of the next string.
    pub restart_delay: Duration,
    /// Wait before the very first character.
    pub start_delay: Duration,
}

impl SequenceOptions {
    /// 80ms typing, 40ms deleting, 1.5s hold, 300ms between strings.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            speed: Duration::from_millis_u64(80),
            delete_speed: Duration::from_millis_u64(40),
            hold: Duration::from_millis_u64(1500),
            restart_delay: Duration::from_millis_u64(300),
            start_delay: Duration::ZERO,
        }
    }
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Types, holds and deletes each of several strings in turn, forever.
#[derive(Clone, Debug)]
pub struct TypewriterSequence {
    texts: Vec<String>,
    current: usize,
    index: usize,
    options: SequenceOptions,
    typing: bool,
    next: Option<(HostTime, Step)>,
}

impl TypewriterSequence {
    /// A stopped sequence over `texts`.
    #[must_use]
    pub fn new<I, S>(texts: I, options: SequenceOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            current: 0,
            index: 0,
            options,
            typing: false,
            next: None,
        }
    }

    /// Starts typing the current string. Does nothing for an empty list.
    pub fn start(&mut self, now: HostTime) {
        if self.texts.is_empty() {
            return;
        }
        self.index = 0;
        self.typing = true;
        self.next = Some((now + self.options.start_delay, Step::Type));
    }

    /// Stops and rewinds to the first string.
    pub fn reset(&mut self) {
        self.current = 0;
        self.index = 0;
        self.typing = false;
        self.next = None;
    }

    /// Runs every step due at `now`. Returns `true` if the display changed.
    pub fn tick(&mut self, now: HostTime) -> bool {
        let before = (self.current, self.index);
        for _ in 0..MAX_STEPS_PER_TICK {
            match self.next {
                Some((due, step)) if due <= now => {
                    self.next = None;
                    self.step(due, step);
                }
                _ => break,
            }
        }
        (self.current, self.index) != before
    }

    fn step(&mut self, due: HostTime, step: Step) {
        let len = char_count(self.current_text());
        match step {
            Step::Type if self.index < len => {
                self.index += 1;
                self.next = Some((due + self.options.speed, Step::Type));
            }
            Step::Type => {
                self.typing = false;
                self.next = Some((due + self.options.hold, Step::Delete));
            }
            Step::Delete | Step::BeginDelete if self.index > 0 => {
                self.index -= 1;
                self.next = Some((due + self.options.delete_speed, Step::Delete));
            }
            Step::Delete | Step::BeginDelete => {
                self.current = (self.current + 1) % self.texts.len().max(1);
                self.next = Some((due + self.options.restart_delay, Step::Restart));
            }
            Step::Restart => self.start(due),
        }
    }

    /// The string being typed.
    #[must_use]
    pub fn current_text(&self) -> &str {
        self.texts.get(self.current).map_or("", String::as_str)
    }

    /// Index of the string being typed.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The typed portion of the current string.
    #[must_use]
    pub fn display_text(&self) -> &str {
        prefix(self.current_text(), self.index)
    }

    /// Characters are being added.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    fn fixed() -> TypewriterOptions {
        TypewriterOptions {
            jitter: Duration::ZERO,
            ..TypewriterOptions::standard()
        }
    }

    #[test]
    fn types_one_character_per_interval() {
        let mut tw = Typewriter::new("abc", fixed());
        tw.mount(ms(0));
        assert_eq!(tw.text_with_cursor(), "|");

        assert!(tw.tick(ms(0)));
        assert_eq!(tw.display_text(), "a");
        assert!(!tw.tick(ms(79)));
        tw.tick(ms(80));
        assert_eq!(tw.display_text(), "ab");
        tw.tick(ms(160));
        tw.tick(ms(240));
        assert_eq!(tw.display_text(), "abc");
        assert!(tw.is_complete());
        assert!(!tw.is_typing());
        assert_eq!(tw.text_with_cursor(), "abc", "cursor hides when done");
    }

    #[test]
    fn late_frames_catch_up() {
        let mut tw = Typewriter::new("hello", fixed());
        tw.start(ms(0));
        tw.tick(ms(1000));
        assert_eq!(tw.display_text(), "hello");
        assert!(tw.is_complete());
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let mut tw = Typewriter::new("héllo→", fixed());
        tw.start(ms(0));
        tw.tick(ms(80));
        assert_eq!(tw.display_text(), "hé");
        tw.tick(ms(1000));
        assert_eq!(tw.display_text(), "héllo→");
    }

    #[test]
    fn loop_deletes_and_retypes() {
        let mut tw = Typewriter::new(
            "ab",
            TypewriterOptions {
                looping: true,
                ..fixed()
            },
        );
        tw.start(ms(0));
        tw.tick(ms(160));
        assert!(tw.is_complete());
        // Typed "ab" by 80, completion step at 160, delete begins at 2160.
        tw.tick(ms(2160));
        assert!(tw.is_deleting());
        assert_eq!(tw.display_text(), "a");
        tw.tick(ms(2200));
        assert_eq!(tw.display_text(), "");
        tw.tick(ms(2240));
        assert!(tw.is_typing(), "restarted");
        assert_eq!(tw.display_text(), "a");
    }

    #[test]
    fn pause_and_resume() {
        let mut tw = Typewriter::new("abcd", fixed());
        tw.start(ms(0));
        tw.tick(ms(0));
        tw.pause();
        tw.tick(ms(500));
        assert_eq!(tw.display_text(), "a", "paused step does nothing");
        assert!(tw.is_paused());

        tw.resume(ms(600));
        assert_eq!(tw.display_text(), "ab", "resume types immediately");
        tw.tick(ms(680));
        assert_eq!(tw.display_text(), "abc");
    }

    #[test]
    fn resume_before_the_step_fires_keeps_the_schedule() {
        let mut tw = Typewriter::new("abcd", fixed());
        tw.start(ms(0));
        tw.tick(ms(0));
        tw.pause();
        tw.resume(ms(10));
        assert_eq!(tw.display_text(), "a");
        tw.tick(ms(80));
        assert_eq!(tw.display_text(), "ab");
    }

    #[test]
    fn set_text_restarts() {
        let mut tw = Typewriter::new("abc", fixed());
        tw.start(ms(0));
        tw.tick(ms(500));
        tw.set_text("xy", ms(600));
        assert_eq!(tw.display_text(), "");
        tw.tick(ms(600));
        assert_eq!(tw.display_text(), "x");
    }

    #[test]
    fn jitter_stretches_intervals() {
        let mut tw = Typewriter::with_jitter("abc", TypewriterOptions::standard(), || 1.0);
        tw.start(ms(0));
        tw.tick(ms(0));
        tw.tick(ms(129));
        assert_eq!(tw.display_text(), "a");
        tw.tick(ms(130));
        assert_eq!(tw.display_text(), "ab");
    }

    #[test]
    fn xorshift_stays_in_unit_range() {
        let mut j = XorShiftJitter::new(0);
        for _ in 0..1000 {
            let v = j.next_unit();
            assert!((0.0..1.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn sequence_cycles_through_texts() {
        let mut seq = TypewriterSequence::new(["ab", "c"], SequenceOptions::standard());
        seq.start(ms(0));
        seq.tick(ms(80));
        assert_eq!(seq.display_text(), "ab");
        // Completion at 160, hold until 1660, deletes at 1660 and 1700,
        // switch at 1740, restart at 2040, first char of "c" at 2040.
        seq.tick(ms(1700));
        assert_eq!(seq.display_text(), "");
        seq.tick(ms(2039));
        assert_eq!(seq.current_index(), 1);
        assert_eq!(seq.display_text(), "");
        seq.tick(ms(2040));
        assert_eq!(seq.display_text(), "c");
    }

    #[test]
    fn empty_sequence_never_starts() {
        let mut seq = TypewriterSequence::new(Vec::<String>::new(), SequenceOptions::standard());
        seq.start(ms(0));
        assert!(!seq.tick(ms(10_000)));
        assert_eq!(seq.display_text(), "");
    }
}
