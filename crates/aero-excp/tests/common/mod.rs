// Shared test helpers (integration tests compile as separate crates, so put
// common code in a submodule to avoid it becoming its own test target).
#![allow(dead_code)]

use aero_excp::exit::cpu_loop_exit;
use aero_excp::{GuestMemory, LoopExit, NestedIntercept, ResetCause, ResetControl, SvmExitCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Intercept {
        exit_code: SvmExitCode,
        info: u64,
        resume_addr: Option<u64>,
    },
    VmExit {
        exit_code: SvmExitCode,
        info: u64,
    },
    Reset(ResetCause),
    Read(u64),
}

/// Identity-mapped guest memory plus recording SVM/reset collaborators.
///
/// Reads past the end of `mem` fault (`None`).
#[derive(Debug, Clone)]
pub struct TestHost {
    mem: Vec<u8>,
    /// Models a broken memory backend that unwinds out of a read instead of
    /// reporting the fault.
    pub unwind_on_read: bool,
    /// Exit codes the emulated outer hypervisor intercepts.
    pub intercepts: Vec<SvmExitCode>,
    pub events: Vec<HostEvent>,
}

impl TestHost {
    pub fn new(size: usize) -> Self {
        Self {
            mem: vec![0; size],
            unwind_on_read: false,
            intercepts: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn intercepting(mut self, exit_code: SvmExitCode) -> Self {
        self.intercepts.push(exit_code);
        self
    }

    pub fn write_u16(&mut self, addr: u64, val: u16) {
        let a = addr as usize;
        self.mem[a..a + 2].copy_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, addr: u64, val: u32) {
        let a = addr as usize;
        self.mem[a..a + 4].copy_from_slice(&val.to_le_bytes());
    }

    pub fn reads(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Read(addr) => Some(*addr),
                _ => None,
            })
            .collect()
    }

    /// Everything except memory reads, in call order.
    pub fn calls(&self) -> Vec<HostEvent> {
        self.events
            .iter()
            .copied()
            .filter(|e| !matches!(e, HostEvent::Read(_)))
            .collect()
    }
}

impl GuestMemory for TestHost {
    fn read_u32_kernel(&mut self, addr: u64) -> Option<u32> {
        self.events.push(HostEvent::Read(addr));
        if self.unwind_on_read {
            cpu_loop_exit(LoopExit::Fault { resume_addr: None });
        }
        let a = usize::try_from(addr).ok()?;
        let bytes: [u8; 4] = self.mem.get(a..a.checked_add(4)?)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

impl NestedIntercept for TestHost {
    fn check_intercept(&mut self, exit_code: SvmExitCode, info: u64, resume_addr: Option<u64>) {
        self.events.push(HostEvent::Intercept {
            exit_code,
            info,
            resume_addr,
        });
        if self.intercepts.contains(&exit_code) {
            self.vmexit(exit_code, info, resume_addr);
        }
    }

    fn vmexit(&mut self, exit_code: SvmExitCode, info: u64, resume_addr: Option<u64>) -> ! {
        self.events.push(HostEvent::VmExit { exit_code, info });
        cpu_loop_exit(LoopExit::NestedVmExit {
            exit_code,
            info,
            resume_addr,
        })
    }
}

impl ResetControl for TestHost {
    fn request_machine_reset(&mut self, cause: ResetCause) {
        self.events.push(HostEvent::Reset(cause));
    }
}

pub fn write_idt_gate32(host: &mut TestHost, base: u64, vector: u8, selector: u16, offset: u32) {
    let addr = base + (vector as u64) * 8;
    host.write_u16(addr, (offset & 0xFFFF) as u16);
    host.write_u16(addr + 2, selector);
    // Present, DPL0, 32-bit interrupt gate.
    host.write_u16(addr + 4, 0x8E00);
    host.write_u16(addr + 6, (offset >> 16) as u16);
}

pub fn write_idt_gate64(host: &mut TestHost, base: u64, vector: u8, selector: u16, offset: u64) {
    let addr = base + (vector as u64) * 16;
    host.write_u16(addr, (offset & 0xFFFF) as u16);
    host.write_u16(addr + 2, selector);
    host.write_u16(addr + 4, 0x8E00);
    host.write_u16(addr + 6, ((offset >> 16) & 0xFFFF) as u16);
    host.write_u32(addr + 8, (offset >> 32) as u32);
    host.write_u32(addr + 12, 0);
}
