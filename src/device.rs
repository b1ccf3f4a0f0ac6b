//! Compute device selection
//!
//! A single capability probe run once at load time. An unavailable
//! accelerator is not an error: the probe falls back to the CPU and logs the
//! choice.

use candle_core::Device;
use tracing::{info, warn};

/// Probe for an accelerator, falling back to the CPU
pub fn probe() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("using Metal accelerator");
                return device;
            }
            Err(e) => warn!("Metal unavailable, probing further: {}", e),
        }
    }

    match Device::cuda_if_available(0) {
        Ok(device) => {
            if device.is_cuda() {
                info!("using CUDA accelerator");
            } else {
                info!("no accelerator available, using CPU");
            }
            device
        }
        Err(e) => {
            warn!("CUDA probe failed, using CPU: {}", e);
            Device::Cpu
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_always_yields_a_device() {
        // On machines without an accelerator this must still succeed.
        let device = probe();
        let _ = device.is_cuda();
    }
}
