//! Logging which is safe to call from [crate::Engine::fill].
//!
//! The `log` crate hands messages to whatever logger the application installed, and that logger is free to allocate,
//! lock, and write to files.  None of that is allowed on the audio thread.  So the `rt_*` macros defined here split on
//! the calling thread:
//!
//! - Anywhere else, they are plain `log` macros.
//! - On the audio thread, the message is formatted into a fixed-capacity inline string and pushed onto a bounded queue.
//!   A background relay thread pops it and re-emits it through `log`.
//!
//! Nothing is lost silently.  Messages too long for the inline buffer are cut and marked as truncated, a full queue
//! is counted and reported with the next message that gets through, and a message which took a long time to reach
//! `log` says how long.  Timestamps are those of the relay, not of the audio thread.
use std::cell::Cell;
use std::fmt::Arguments as FmtArgs;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use arrayvec::ArrayString;
use thingbuf::{recycling::Recycle, ThingBuf};

/// Bytes of formatted text one message may carry.
const MESSAGE_CAPACITY: usize = 512;

/// Messages which may be waiting for the relay at once.
///
/// The renderer logs at most a line per wraparound, so this is generous.
const QUEUE_CAPACITY: usize = 1024;

/// Delivery slower than this is called out in the relayed message.
const SLOW_DELIVERY: Duration = Duration::from_millis(250);

type MessageText = ArrayString<MESSAGE_CAPACITY>;

thread_local! {
    static ON_AUDIO_THREAD: Cell<bool> = const { Cell::new(false) };
}

pub(crate) fn is_audio_thread() -> bool {
    ON_AUDIO_THREAD.get()
}

/// Route this thread's `rt_*` logging through the queue from now on.  Called from [crate::Engine::fill].
#[inline(always)]
pub(crate) fn mark_audio_thread() {
    ON_AUDIO_THREAD.set(true);
}

#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
enum MessageBody {
    /// The format string had no arguments.
    Literal(&'static str),
    Formatted(MessageText),
}

pub(crate) struct QueuedMessage {
    level: log::Level,
    target: &'static str,
    body: MessageBody,
    truncated: bool,
    /// Messages this thread failed to queue since its last successful push.
    dropped_before: u64,
    queued_at: Instant,
}

struct QueuedMessageRecycler;

impl Recycle<QueuedMessage> for QueuedMessageRecycler {
    fn new_element(&self) -> QueuedMessage {
        QueuedMessage {
            level: log::Level::Trace,
            target: module_path!(),
            body: MessageBody::Literal(""),
            truncated: false,
            dropped_before: 0,
            queued_at: Instant::now(),
        }
    }

    fn recycle(&self, _element: &mut QueuedMessage) {
        // Every field is overwritten by the next push.
    }
}

/// A `fmt::Write` over [MessageText] which stops at capacity instead of failing, remembering that it did.
struct TruncatingWriter<'a> {
    text: &'a mut MessageText,
    truncated: bool,
}

impl std::fmt::Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if self.truncated {
            return Ok(());
        }

        if self.text.try_push_str(s).is_ok() {
            return Ok(());
        }

        self.truncated = true;
        // Capacity is in bytes; stop on a character boundary.
        for c in s.chars() {
            if self.text.try_push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn format_message(level: log::Level, args: FmtArgs<'_>, target: &'static str) -> QueuedMessage {
    use std::fmt::Write;

    let mut truncated = false;
    let body = if let Some(s) = args.as_str() {
        MessageBody::Literal(s)
    } else {
        let mut text = MessageText::new();
        let mut writer = TruncatingWriter {
            text: &mut text,
            truncated: false,
        };
        // The writer itself never errors, so an error can only come from a Display impl; keep what we got.
        let _ = writer.write_fmt(args);
        truncated = writer.truncated;
        MessageBody::Formatted(text)
    };

    QueuedMessage {
        level,
        target,
        body,
        truncated,
        dropped_before: 0,
        queued_at: Instant::now(),
    }
}

struct Relay {
    thread: JoinHandle<()>,
    queue: ThingBuf<QueuedMessage, QueuedMessageRecycler>,
}

lazy_static::lazy_static! {
    static ref RELAY: Relay = Relay {
        // The new thread blocks on this lazy_static until we return, so this isn't a recursive initialization.
        thread: std::thread::Builder::new()
            .name("binaural_sweep_log".into())
            .spawn(relay_mainloop)
            .expect("Unable to spawn the logging relay thread"),
        queue: ThingBuf::with_recycle(QUEUE_CAPACITY, QueuedMessageRecycler),
    };
}

/// Called by the macros on the audio thread.
pub(crate) fn enqueue(level: log::Level, args: FmtArgs<'_>, target: &'static str) {
    thread_local! {
        static DROPPED: Cell<u64> = const { Cell::new(0) };
    }

    if level > log::max_level() {
        return;
    }

    let mut msg = format_message(level, args, target);
    msg.dropped_before = DROPPED.get();

    if RELAY.queue.push(msg).is_ok() {
        DROPPED.set(0);
        RELAY.thread.thread().unpark();
    } else {
        DROPPED.set(DROPPED.get() + 1);
    }
}

fn relay_one(msg: QueuedMessage) {
    if msg.dropped_before != 0 {
        log::warn!(
            "The audio thread's log queue overflowed; {} messages were lost",
            msg.dropped_before
        );
    }

    let text = match &msg.body {
        MessageBody::Literal(s) => s,
        MessageBody::Formatted(t) => t.as_str(),
    };

    let mut delay: smallvec::SmallVec<[u8; 64]> = smallvec::SmallVec::new();
    let waited = msg.queued_at.elapsed();
    if waited > SLOW_DELIVERY {
        use std::io::Write;
        // Writing into memory can't fail.
        let _ = write!(delay, ", {:.3}s late", waited.as_secs_f64());
    }
    let delay = std::str::from_utf8(&delay).unwrap_or_default();
    let cut = if msg.truncated { ", truncated" } else { "" };

    log::log!(target: msg.target, msg.level, "{text} (audio thread{delay}{cut})");
}

fn relay_mainloop() {
    loop {
        while let Some(msg) = RELAY.queue.pop() {
            relay_one(msg);
        }
        // A push between the drain and here leaves the unpark token set, so this returns immediately.
        std::thread::park();
    }
}

/// Like `log::log!`, but safe on the audio thread.  The target is always the calling module.
#[allow(clippy::crate_in_macro_def)]
macro_rules! rt_log {
    ($level: expr, $fmt: expr $(, $args: expr)* $(,)?) => {
        let level = $level;
        if crate::logging::is_audio_thread() {
            if level <= log::max_level() {
                crate::logging::enqueue(level, format_args!($fmt, $($args),*), module_path!());
            }
        } else {
            log::log!(level, $fmt, $($args),*);
        }
    }
}

#[allow(unused_macros)]
macro_rules! rt_warn {
    ($($args: tt)+) => {
        rt_log!(log::Level::Warn, $($args)*);
    }
}

macro_rules! rt_info {
    ($($args: tt)+) => {
        rt_log!(log::Level::Info, $($args)*);
    }
}

macro_rules! rt_debug {
    ($($args: tt)+) => {
        rt_log!(log::Level::Debug, $($args)*);
    }
}

/// Spawn the relay thread now, from whoever is constructing an engine, so it is never spawned from the audio thread.
pub(crate) fn ensure_log_ctx() {
    std::hint::black_box(RELAY.queue.capacity());
}
