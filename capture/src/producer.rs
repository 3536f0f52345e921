//! Frame producer: acquisition on a dedicated thread with frame sampling
//! and a swap-able consumer callback.
//!
//! # Delivery policy
//! A counter increments on every successfully read frame; once it exceeds
//! `skip_frames` it resets and the frame is delivered — one delivery per
//! `skip_frames + 1` reads. Failed reads neither advance nor reset the
//! counter. Delivery happens synchronously on the acquisition thread, so a
//! callback that blocks stalls acquisition.
//!
//! # Shutdown order
//! `stop` flips the running flag, waits for the thread to observe it and
//! leave the loop, and only then does the source drop (release). The thread
//! owns the source, so release cannot precede loop exit.

use crate::source::{FrameRead, FrameSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tracker_core::Frame;
use tracing::{debug, info, warn};

/// Consumer callback invoked once per delivered frame.
pub type FrameCallback = Box<dyn FnMut(Frame) + Send>;

/// Sampling configuration.
#[derive(Clone, Copy, Debug)]
pub struct ProducerConfig {
    /// Frames dropped between deliveries
    pub skip_frames: u32,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self { skip_frames: 5 }
    }
}

/// Runs a [`FrameSource`] on its own thread and hands sampled frames to the
/// registered callback. Register the callback before calling [`start`].
///
/// [`start`]: FrameProducer::start
pub struct FrameProducer {
    config: ProducerConfig,
    running: Arc<AtomicBool>,
    callback: Arc<Mutex<Option<FrameCallback>>>,
    handle: Option<JoinHandle<()>>,
}

/// Lock the callback slot, recovering the guard if a consumer panic
/// poisoned it.
fn lock_callback(
    slot: &Mutex<Option<FrameCallback>>,
) -> MutexGuard<'_, Option<FrameCallback>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl FrameProducer {
    pub fn new(config: ProducerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            callback: Arc::new(Mutex::new(None)),
            handle: None,
        }
    }

    /// Replace the consumer callback. `None` silences delivery (a no-op per
    /// frame, never an error). Blocks while a delivery is in flight.
    pub fn set_callback(&self, callback: Option<FrameCallback>) {
        *lock_callback(&self.callback) = callback;
    }

    /// Spawn the acquisition thread over an already-opened source.
    pub fn start<S: FrameSource + 'static>(&mut self, mut source: S) {
        if self.handle.is_some() {
            warn!("producer already started; ignoring");
            return;
        }
        self.running.store(true, Ordering::Release);
        let skip_frames = self.config.skip_frames;
        let running = Arc::clone(&self.running);
        let callback = Arc::clone(&self.callback);

        self.handle = Some(std::thread::spawn(move || {
            let mut counter = 0u32;
            let mut delivered = 0u64;
            while running.load(Ordering::Acquire) {
                match source.read_frame() {
                    FrameRead::Skip => continue,
                    FrameRead::End => {
                        info!(delivered, "frame source exhausted");
                        break;
                    }
                    FrameRead::Frame(mut frame) => {
                        counter += 1;
                        if counter <= skip_frames {
                            continue;
                        }
                        counter = 0;
                        frame.seq = delivered;
                        delivered += 1;
                        // One lock guards both the read of the callback
                        // reference and the delivery through it, so a
                        // concurrent swap can never tear a delivery.
                        let mut guard = lock_callback(&callback);
                        if let Some(cb) = guard.as_mut() {
                            cb(frame);
                        }
                    }
                }
            }
            running.store(false, Ordering::Release);
            debug!("acquisition loop exited");
            // `source` drops here: released strictly after loop exit.
        }));
    }

    /// True between `start` and loop exit — by `stop` or source exhaustion.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Block until the source ends on its own (finite sources).
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Stop acquisition: flip the flag, join the thread, release the source.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
