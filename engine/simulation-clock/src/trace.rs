//! Waveform capture
//!
//! Sinks receive one sample per half-period evaluation. They are pure exporters: a failing
//! sink is detached by the clock driver and never influences device stepping.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// State of one port at a sample point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSample {
    pub name: &'static str,
    pub width: u8,
    pub value: u64,
}

/// Receiver of `(timestamp, signal-state)` samples
pub trait WaveformSink: Send {
    fn record(&mut self, timestamp: u64, signals: &[SignalSample]) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Bounded in-memory trace. Clones share the same buffer, so a caller can keep a handle
/// after boxing one copy into the clock driver.
#[derive(Debug, Clone)]
pub struct MemoryTrace {
    capacity: usize,
    samples: Arc<Mutex<VecDeque<(u64, Vec<SignalSample>)>>>,
}

impl MemoryTrace {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), samples: Arc::new(Mutex::new(VecDeque::new())) }
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Timestamps currently held, oldest first
    pub fn timestamps(&self) -> Vec<u64> {
        self.samples.lock().iter().map(|(t, _)| *t).collect()
    }

    /// Value of `signal` at every retained sample
    pub fn values_of(&self, signal: &str) -> Vec<(u64, u64)> {
        self.samples
            .lock()
            .iter()
            .filter_map(|(t, s)| s.iter().find(|x| x.name == signal).map(|x| (*t, x.value)))
            .collect()
    }
}

impl WaveformSink for MemoryTrace {
    fn record(&mut self, timestamp: u64, signals: &[SignalSample]) -> io::Result<()> {
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back((timestamp, signals.to_vec()));
        Ok(())
    }
}

/// Minimal value-change-dump writer
pub struct VcdWriter<W: Write + Send> {
    out: W,
    module: String,
    last: Vec<Option<u64>>,
    header_written: bool,
}

impl<W: Write + Send> VcdWriter<W> {
    pub fn new(out: W, module: impl Into<String>) -> Self {
        Self { out, module: module.into(), last: Vec::new(), header_written: false }
    }

    /// Printable short identifier for the n-th signal
    fn ident(mut index: usize) -> String {
        const FIRST: u8 = b'!';
        const SPAN: usize = (b'~' - b'!' + 1) as usize;
        let mut id = String::new();
        loop {
            id.push((FIRST + (index % SPAN) as u8) as char);
            index /= SPAN;
            if index == 0 {
                break;
            }
        }
        id
    }

    fn write_header(&mut self, signals: &[SignalSample]) -> io::Result<()> {
        writeln!(self.out, "$timescale 1ns $end")?;
        writeln!(self.out, "$scope module {} $end", self.module)?;
        for (i, s) in signals.iter().enumerate() {
            writeln!(self.out, "$var wire {} {} {} $end", s.width, Self::ident(i), s.name)?;
        }
        writeln!(self.out, "$upscope $end")?;
        writeln!(self.out, "$enddefinitions $end")?;
        self.last = vec![None; signals.len()];
        self.header_written = true;
        Ok(())
    }
}

impl<W: Write + Send> WaveformSink for VcdWriter<W> {
    fn record(&mut self, timestamp: u64, signals: &[SignalSample]) -> io::Result<()> {
        if !self.header_written {
            self.write_header(signals)?;
        }
        let mut stamped = false;
        for (i, s) in signals.iter().enumerate() {
            if self.last.get(i).copied().flatten() == Some(s.value) {
                continue;
            }
            if !stamped {
                writeln!(self.out, "#{timestamp}")?;
                stamped = true;
            }
            if s.width == 1 {
                writeln!(self.out, "{}{}", s.value & 1, Self::ident(i))?;
            } else {
                writeln!(self.out, "b{:b} {}", s.value, Self::ident(i))?;
            }
            if let Some(slot) = self.last.get_mut(i) {
                *slot = Some(s.value);
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl<W: Write + Send> Drop for VcdWriter<W> {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(clk: u64, data: u64) -> [SignalSample; 2] {
        [
            SignalSample { name: "clk", width: 1, value: clk },
            SignalSample { name: "data", width: 8, value: data },
        ]
    }

    #[test]
    fn memory_trace_drops_oldest_when_full() {
        let mut trace = MemoryTrace::new(2);
        let handle = trace.clone();
        trace.record(0, &sample(0, 1)).unwrap();
        trace.record(2, &sample(1, 1)).unwrap();
        trace.record(4, &sample(0, 2)).unwrap();
        assert_eq!(handle.timestamps(), vec![2, 4]);
        assert_eq!(handle.values_of("data"), vec![(2, 1), (4, 2)]);
    }

    #[test]
    fn vcd_emits_only_changes() {
        let mut buf = Vec::new();
        {
            let mut vcd = VcdWriter::new(&mut buf, "top");
            vcd.record(0, &sample(0, 5)).unwrap();
            vcd.record(2, &sample(1, 5)).unwrap();
            vcd.record(4, &sample(1, 5)).unwrap();
            vcd.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("$var wire 1 ! clk $end"));
        assert!(text.contains("$var wire 8 \" data $end"));
        assert!(text.contains("#0\n0!\nb101 \"\n"));
        assert!(text.contains("#2\n1!\n"));
        assert!(!text.contains("#4"));
    }

    #[test]
    fn identifiers_stay_unique_past_one_character() {
        let a = VcdWriter::<Vec<u8>>::ident(93);
        let b = VcdWriter::<Vec<u8>>::ident(94);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert_ne!(a, b);
    }
}
