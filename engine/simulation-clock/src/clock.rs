//! Core ClockDriver implementation

use dut_model::ports::{CLK, RST_N};
use dut_model::{Device, PortDirection};

use crate::config::ClockConfig;
use crate::error::ClockError;
use crate::trace::{SignalSample, WaveformSink};

/// Steps a device through full clock periods and owns the cycle counter.
///
/// The driver owns its device exclusively. Every output the harness observes is read
/// through the driver after at least one [`ClockDriver::advance_cycle`] following the
/// last input change.
pub struct ClockDriver<D: Device> {
    device: D,
    config: ClockConfig,

    cycle: u64,
    out_of_reset: bool,
    halted: bool,

    sink: Option<Box<dyn WaveformSink>>,
}

impl<D: Device> ClockDriver<D> {
    /// Create a driver around `device`. The device stays in whatever state it was built
    /// in until [`ClockDriver::reset`] runs.
    pub fn new(device: D, config: ClockConfig) -> Result<Self, ClockError> {
        config.validate()?;
        tracing::debug!(
            device = device.name(),
            period_ns = config.period_ns,
            "Creating ClockDriver"
        );
        Ok(Self { device, config, cycle: 0, out_of_reset: false, halted: false, sink: None })
    }

    /// Attach a waveform sink, replacing any previous one
    pub fn attach_sink(&mut self, sink: Box<dyn WaveformSink>) {
        if let Some(mut old) = self.sink.replace(sink) {
            let _ = old.finish();
        }
    }

    /// Flush and detach the current waveform sink
    pub fn finish_trace(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.finish() {
                tracing::warn!("Failed to finish waveform trace: {}", e);
            }
        }
    }

    /// Perform one full clock period: low half, high half, then count the cycle
    pub fn advance_cycle(&mut self) -> Result<u64, ClockError> {
        if self.halted {
            return Err(ClockError::Halted);
        }
        let period = self.config.period_ns;
        let base = self.cycle * period;

        self.half_step(0, base)?;
        self.half_step(1, base + period / 2)?;

        self.cycle += 1;
        Ok(self.cycle)
    }

    /// Advance `cycles` idle periods without touching any input
    pub fn idle(&mut self, cycles: u64) -> Result<(), ClockError> {
        for _ in 0..cycles {
            self.advance_cycle()?;
        }
        Ok(())
    }

    fn half_step(&mut self, level: u64, timestamp: u64) -> Result<(), ClockError> {
        self.device.set_input(CLK, level)?;
        if let Err(e) = self.device.evaluate() {
            if e.is_fatal() {
                self.halted = true;
                tracing::error!(
                    device = self.device.name(),
                    cycle = self.cycle,
                    "Device evaluation failed, halting clock: {}",
                    e
                );
            }
            return Err(e.into());
        }
        self.sample(timestamp);
        Ok(())
    }

    fn sample(&mut self, timestamp: u64) {
        let Some(sink) = self.sink.as_mut() else { return };

        let signals: Vec<SignalSample> = self
            .device
            .ports()
            .iter()
            .filter_map(|p| {
                self.device
                    .probe(p.name)
                    .ok()
                    .map(|value| SignalSample { name: p.name, width: p.width, value })
            })
            .collect();

        if let Err(e) = sink.record(timestamp, &signals) {
            tracing::warn!("Waveform sink failed at t={}, detaching: {}", timestamp, e);
            self.sink = None;
        }
    }

    /// Run the synchronous reset protocol.
    ///
    /// Reset is asserted and every other input cleared, held for the configured number of
    /// cycles, then released with one further cycle before stimulus is allowed.
    pub fn reset(&mut self) -> Result<(), ClockError> {
        if self.halted {
            return Err(ClockError::Halted);
        }
        self.out_of_reset = false;

        self.device.set_input(RST_N, 0)?;
        let inputs: Vec<&'static str> = self
            .device
            .ports()
            .iter()
            .filter(|p| p.direction == PortDirection::In && p.name != RST_N)
            .map(|p| p.name)
            .collect();
        for name in inputs {
            self.device.set_input(name, 0)?;
        }

        self.idle(u64::from(self.config.reset_hold_cycles))?;

        self.device.set_input(RST_N, 1)?;
        self.advance_cycle()?;
        self.out_of_reset = true;

        tracing::info!(device = self.device.name(), cycle = self.cycle, "System reset completed");
        Ok(())
    }

    /// Fail with [`ClockError::InReset`] unless the reset protocol has completed
    pub fn require_out_of_reset(&self) -> Result<(), ClockError> {
        if self.halted {
            return Err(ClockError::Halted);
        }
        if !self.out_of_reset {
            return Err(ClockError::InReset);
        }
        Ok(())
    }

    /// Drive an input; it takes effect on the next [`ClockDriver::advance_cycle`]
    pub fn set_input(&mut self, port: &str, value: u64) -> Result<(), ClockError> {
        if self.halted {
            return Err(ClockError::Halted);
        }
        Ok(self.device.set_input(port, value)?)
    }

    /// Read a registered output as of the last evaluation
    pub fn get_output(&self, port: &str) -> Result<u64, ClockError> {
        if self.halted {
            return Err(ClockError::Halted);
        }
        Ok(self.device.get_output(port)?)
    }

    /// Full cycles elapsed since the driver was created
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_out_of_reset(&self) -> bool {
        self.out_of_reset
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Device time in ns at the start of the current cycle
    pub fn sim_time_ns(&self) -> u64 {
        self.config.cycles_to_ns(self.cycle)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(mut self) -> D {
        self.finish_trace();
        self.device
    }
}
