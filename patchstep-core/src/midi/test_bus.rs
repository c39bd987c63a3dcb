//! In-memory bus with a simulated pedal, for tests.
//!
//! The simulated pedal answers patch queries only after editing has been
//! enabled on the current link, and every unplug or re-open invalidates
//! previously opened links, so a test fails loudly if a stale handle is
//! reused or a fresh one is not re-armed.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::transport::{Endpoint, MidiBus, MidiLink, TransportError, TransportResult};
use super::{ENABLE_EDITING, PROGRAM_CHANGE, QUERY_PATCH};

/// Endpoint id the simulated pedal is advertised under.
pub const SIM_PORT: &str = "hw:1,0,0";

/// A recorded interaction with the simulated pedal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimOp {
    Scan { found: bool },
    Open { generation: u64 },
    EnableEditing { generation: u64 },
    Query { generation: u64, answered: bool },
    ProgramChange { generation: u64, patch: u8 },
    /// A frame sent on a link that is no longer valid.
    Rejected { generation: u64 },
}

#[derive(Debug)]
struct SimState {
    name: String,
    present: bool,
    patch: u8,
    generation: u64,
    editing: bool,
    absent_scans: usize,
    silent_queries: usize,
    garbled_queries: usize,
    ops: Vec<SimOp>,
}

/// Shared handle to the simulated bus. Clones observe the same pedal.
#[derive(Debug, Clone)]
pub struct TestBus {
    state: Arc<Mutex<SimState>>,
}

impl TestBus {
    /// A bus with the pedal plugged in and showing `patch`.
    pub fn new(name: &str, patch: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                name: name.to_string(),
                present: true,
                patch,
                generation: 0,
                editing: false,
                absent_scans: 0,
                silent_queries: 0,
                garbled_queries: 0,
                ops: Vec::new(),
            })),
        }
    }

    /// A bus with the pedal unplugged.
    pub fn absent(name: &str, patch: u8) -> Self {
        let bus = Self::new(name, patch);
        bus.set_present(false);
        bus
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    /// Plug or unplug the pedal. Unplugging kills every open link.
    pub fn set_present(&self, present: bool) {
        let mut s = self.lock();
        if s.present && !present {
            s.generation += 1;
            s.editing = false;
        }
        s.present = present;
        s.absent_scans = 0;
    }

    /// Unplug now; the pedal shows up again after `scans` empty endpoint scans.
    pub fn reappear_after_scans(&self, scans: usize) {
        self.set_present(false);
        let mut s = self.lock();
        s.absent_scans = scans;
        if scans == 0 {
            s.present = true;
        }
    }

    /// The next `n` patch queries get no reply.
    pub fn drop_replies(&self, n: usize) {
        self.lock().silent_queries = n;
    }

    /// The next `n` patch queries get a reply without a program change.
    pub fn garble_replies(&self, n: usize) {
        self.lock().garbled_queries = n;
    }

    /// Change the patch behind the controller's back.
    pub fn set_patch(&self, patch: u8) {
        self.lock().patch = patch;
    }

    pub fn patch(&self) -> u8 {
        self.lock().patch
    }

    pub fn is_present(&self) -> bool {
        self.lock().present
    }

    pub fn editing_enabled(&self) -> bool {
        self.lock().editing
    }

    pub fn ops(&self) -> Vec<SimOp> {
        self.lock().ops.clone()
    }

    /// Patches written, in order.
    pub fn program_changes(&self) -> Vec<u8> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                SimOp::ProgramChange { patch, .. } => Some(*patch),
                _ => None,
            })
            .collect()
    }

    pub fn count<F: Fn(&SimOp) -> bool>(&self, f: F) -> usize {
        self.lock().ops.iter().filter(|op| f(op)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|op| matches!(op, SimOp::Open { .. }))
    }

    pub fn scans(&self) -> usize {
        self.count(|op| matches!(op, SimOp::Scan { .. }))
    }
}

impl MidiBus for TestBus {
    type Link = TestLink;

    fn endpoints(&mut self) -> TransportResult<Vec<Endpoint>> {
        let mut s = self.lock();
        let mut found = s.present;
        if !s.present && s.absent_scans > 0 {
            s.absent_scans -= 1;
            if s.absent_scans == 0 {
                s.present = true;
            }
            found = false;
        }
        s.ops.push(SimOp::Scan { found });

        let mut endpoints = vec![Endpoint::new("hw:0,0,0", "Midi Through Port-0")];
        if found {
            endpoints.push(Endpoint::new(SIM_PORT, s.name.clone()));
        }
        Ok(endpoints)
    }

    fn open(&mut self, endpoint: &Endpoint) -> TransportResult<TestLink> {
        let mut s = self.lock();
        if !s.present || endpoint.id != SIM_PORT {
            return Err(TransportError(format!("cannot open {}", endpoint.id)));
        }
        s.generation += 1;
        s.editing = false;
        let generation = s.generation;
        s.ops.push(SimOp::Open { generation });
        Ok(TestLink {
            generation,
            state: Arc::clone(&self.state),
        })
    }
}

/// A link to the simulated pedal, valid until the next unplug or re-open.
#[derive(Debug)]
pub struct TestLink {
    generation: u64,
    state: Arc<Mutex<SimState>>,
}

impl TestLink {
    fn live_state(&self) -> TransportResult<MutexGuard<'_, SimState>> {
        let mut s = self.state.lock().unwrap();
        if !s.present || s.generation != self.generation {
            s.ops.push(SimOp::Rejected {
                generation: self.generation,
            });
            return Err(TransportError("device unplugged".to_string()));
        }
        Ok(s)
    }
}

impl MidiLink for TestLink {
    fn send(&mut self, frame: &[u8]) -> TransportResult {
        let generation = self.generation;
        let mut s = self.live_state()?;
        if frame == ENABLE_EDITING {
            s.editing = true;
            s.ops.push(SimOp::EnableEditing { generation });
        } else if let [PROGRAM_CHANGE, patch] = frame {
            s.patch = *patch;
            s.ops.push(SimOp::ProgramChange {
                generation,
                patch: *patch,
            });
        }
        Ok(())
    }

    fn request(&mut self, frame: &[u8], _timeout: Duration) -> TransportResult<Vec<u8>> {
        let generation = self.generation;
        let mut s = self.live_state()?;
        if frame != QUERY_PATCH {
            return Ok(Vec::new());
        }

        if s.silent_queries > 0 || !s.editing {
            s.silent_queries = s.silent_queries.saturating_sub(1);
            s.ops.push(SimOp::Query {
                generation,
                answered: false,
            });
            return Ok(Vec::new());
        }

        if s.garbled_queries > 0 {
            s.garbled_queries -= 1;
            s.ops.push(SimOp::Query {
                generation,
                answered: false,
            });
            return Ok(vec![0xF0, 0x52, 0x00, 0x58, 0x28, 0xF7]);
        }

        s.ops.push(SimOp::Query {
            generation,
            answered: true,
        });
        Ok(vec![0xF0, 0x52, 0x00, 0x58, 0x28, 0xF7, PROGRAM_CHANGE, s.patch])
    }
}
