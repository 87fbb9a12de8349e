//! One-shot non-local jump used by the scheduler's shutdown path.
//!
//! A checkpoint captures the callee-saved machine state; a later
//! restore abandons the current stack and makes the checkpoint call
//! site return a second time. Platform code by nature: each supported
//! architecture needs its own register save/restore, the RISC-V one
//! lives here. Neither entry point touches the interrupt-enable state,
//! that is the caller's job.

/// Saved machine context: return address, stack pointer and the twelve
/// callee-saved registers s0..s11, in that order.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct JumpContext {
    regs: [u32; JUMP_CONTEXT_WORDS],
}

/// ra + sp + s0..s11.
pub const JUMP_CONTEXT_WORDS: usize = 14;

impl JumpContext {
    pub const fn new() -> Self {
        Self {
            regs: [0; JUMP_CONTEXT_WORDS],
        }
    }
}

impl Default for JumpContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "riscv32")]
mod riscv32 {
    use super::JumpContext;
    use core::arch::naked_asm;

    /// Capture the current machine state into `ctx`.
    ///
    /// Returns 0 on this, the forward, path. A later [`restore`] of the
    /// same context makes this call return again with a nonzero value.
    ///
    /// # Safety
    /// `ctx` must be valid for writes. The saved context is only
    /// meaningful while the frame that called `checkpoint` is still
    /// live.
    #[unsafe(naked)]
    pub unsafe extern "C" fn checkpoint(ctx: *mut JumpContext) -> u32 {
        naked_asm!(
            "sw ra, 0(a0)",
            "sw sp, 4(a0)",
            "sw s0, 8(a0)",
            "sw s1, 12(a0)",
            "sw s2, 16(a0)",
            "sw s3, 20(a0)",
            "sw s4, 24(a0)",
            "sw s5, 28(a0)",
            "sw s6, 32(a0)",
            "sw s7, 36(a0)",
            "sw s8, 40(a0)",
            "sw s9, 44(a0)",
            "sw s10, 48(a0)",
            "sw s11, 52(a0)",
            "li a0, 0",
            "ret",
        )
    }

    /// Reinstate the state saved in `ctx` and diverge into the
    /// checkpoint's call site, which observes `val` as the checkpoint's
    /// return value. A `val` of 0 is coerced to 1 so the second return
    /// can never be mistaken for the forward path.
    ///
    /// # Safety
    /// `ctx` must hold a context captured by [`checkpoint`] whose stack
    /// frame is still live, and must be consumed at most once. The
    /// caller must have interrupts in a known state before jumping.
    #[unsafe(naked)]
    pub unsafe extern "C" fn restore(ctx: *const JumpContext, val: u32) -> ! {
        naked_asm!(
            "bnez a1, 2f",
            "li a1, 1",
            "2:",
            "lw ra, 0(a0)",
            "lw sp, 4(a0)",
            "lw s0, 8(a0)",
            "lw s1, 12(a0)",
            "lw s2, 16(a0)",
            "lw s3, 20(a0)",
            "lw s4, 24(a0)",
            "lw s5, 28(a0)",
            "lw s6, 32(a0)",
            "lw s7, 36(a0)",
            "lw s8, 40(a0)",
            "lw s9, 44(a0)",
            "lw s10, 48(a0)",
            "lw s11, 52(a0)",
            "mv a0, a1",
            "ret",
        )
    }
}

#[cfg(target_arch = "riscv32")]
pub use riscv32::{checkpoint, restore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_layout_matches_the_asm_offsets() {
        // The store/load offsets above hard-code 14 consecutive words.
        assert_eq!(core::mem::size_of::<JumpContext>(), 56);
        assert_eq!(core::mem::align_of::<JumpContext>(), 4);
    }

    // Runs only when the suite is executed on a riscv32 target.
    #[cfg(target_arch = "riscv32")]
    #[test]
    fn restore_returns_one_for_zero() {
        let mut ctx = JumpContext::new();
        let ret = unsafe { checkpoint(&mut ctx) };
        if ret == 0 {
            unsafe { restore(&ctx, 0) };
        }
        // Second return: 0 was coerced to 1.
        assert_eq!(ret, 1);
    }
}
