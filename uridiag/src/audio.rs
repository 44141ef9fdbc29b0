//! Background audio context
//!
//! Runs the adapter's full-duplex stream: one synthesized block per
//! write-ready wake, one analyzed block per read-ready wake, results
//! published into the shared measurement state. A failed or short write
//! terminates the context, because it means the output path is gone; a short
//! read only costs the affected block.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use uridiag_protocol::Device;

use crate::{
    dsp::{
        analyzer::SpectralAnalyzer,
        tone::{synthesize, ToneChannel},
        BLOCK_SAMPLES,
    },
    levels::SharedLevels,
    transport::{AudioDuplex, DiagError, Readiness},
    utils::OwnedJoinHandle,
};

/// Handle to a running audio loop. Dropping it aborts the task; prefer
/// [`AudioHandle::shutdown`], which joins the loop so no audio I/O can
/// outlive the transport teardown that usually follows.
pub struct AudioHandle {
    stop: Arc<AtomicBool>,
    task: OwnedJoinHandle<Result<(), DiagError>>,
}

impl AudioHandle {
    /// Signals the loop and waits for it to exit and close its stream
    pub async fn shutdown(self) -> Result<(), DiagError> {
        self.stop.store(true, Ordering::Relaxed);
        self.task
            .await
            .map_err(|e| DiagError::Internal(anyhow::anyhow!(e)))?
    }
}

/// Starts the background audio context on `stream`
pub fn spawn_audio_loop(
    stream: Box<dyn AudioDuplex>,
    levels: Arc<SharedLevels>,
    device: &'static Device,
) -> AudioHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    let task = tokio::task::spawn_blocking(move || {
        let result = run(stream, levels, device, flag);
        if let Err(e) = &result {
            log::error!("audio loop terminated: {}", e);
        }
        result
    })
    .into();

    AudioHandle { stop, task }
}

fn run(
    mut stream: Box<dyn AudioDuplex>,
    levels: Arc<SharedLevels>,
    device: &'static Device,
    stop: Arc<AtomicBool>,
) -> Result<(), DiagError> {
    let mut left = ToneChannel::new();
    let mut right = ToneChannel::new();
    let mut analyzer = SpectralAnalyzer::new(device.capture_scale);
    let mut block = vec![0i16; BLOCK_SAMPLES];

    // shutdown flag is polled once per readiness wake
    while !stop.load(Ordering::Relaxed) {
        match stream.wait()? {
            Readiness::Writable => {
                let (freq1, freq2) = levels.targets();
                left.set_frequency(freq1);
                right.set_frequency(freq2);
                synthesize(&mut block, &mut left, &mut right, device.playback_scale);

                let written = stream.write_block(&block)?;
                if written < block.len() {
                    return Err(DiagError::ShortWrite {
                        written,
                        expected: block.len(),
                    });
                }
            }
            Readiness::Readable => {
                let read = stream.read_block(&mut block)?;
                if read < block.len() {
                    log::warn!(
                        "short audio read ({}/{} samples), dropping block",
                        read,
                        block.len()
                    );
                    continue;
                }
                let (freq1, freq2) = levels.targets();
                levels.publish(analyzer.analyze(&block, freq1, freq2));
            }
        }
    }
    Ok(())
}
