//! # Hypervisor Window Context Registers
//!
//! Register map of one control (HVWC) block. Every register is 64 bits
//! wide and addressed by its byte offset from the start of the window's
//! block; see [`ControlRegister::offset`].
//!
//! A freshly allocated window must not inherit anything from a previous
//! tenant of the same ID, so [`reset_sequence`] yields a value for every
//! documented register: the partition and process IDs from the caller's
//! [`WindowContext`], the architectural default for `XLATE_LPCR`, and zero
//! for everything else. The writes are plain state sets.

use crate::WindowContext;
use bitfield_struct::bitfield;

/// Registers of a control block, in the order they are initialized.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[repr(u16)]
pub enum ControlRegister {
    /// Logical partition ID owning the window.
    Lpid = 0x010,
    /// Process ID owning the window.
    Pid = 0x018,
    XlateMsr = 0x020,
    /// Address translation mode, see [`XlateLpcr`].
    XlateLpcr = 0x028,
    XlateCtl = 0x030,
    Amr = 0x040,
    Seidr = 0x048,
    FaultTxWin = 0x050,
    OsuIntrSrcRa = 0x060,
    HvIntrSrcRa = 0x070,
    Pswid = 0x078,
    LfifoBar = 0x0a0,
    LdataStampCtl = 0x0a8,
    LdmaCacheCtl = 0x0b0,
    LrfifoPush = 0x0b8,
    CurrMsgCount = 0x0c0,
    LnotifyAfterCount = 0x0c8,
    LrxWcred = 0x0e0,
    TxWcred = 0x0f0,
    LfifoSize = 0x100,
    WinCtl = 0x108,
    WinStatus = 0x110,
    WinCtxCachingCtl = 0x118,
    TxRsvdBufCount = 0x120,
    LrfifoWinPtr = 0x128,
    LnotifyCtl = 0x138,
    LnotifyPid = 0x140,
    LnotifyLpid = 0x148,
    LnotifyTid = 0x150,
    NxUtilAdder = 0x180,
    LnotifyScope = 0x158,
    NxUtil = 0x1b0,
    NxUtilSe = 0x1b8,
    LrxWcredAdder = 0x190,
    TxWcredAdder = 0x1a0,
}

impl ControlRegister {
    /// Every documented register, in initialization order.
    pub const ALL: [Self; 35] = [
        Self::Lpid,
        Self::Pid,
        Self::XlateMsr,
        Self::XlateLpcr,
        Self::XlateCtl,
        Self::Amr,
        Self::Seidr,
        Self::FaultTxWin,
        Self::OsuIntrSrcRa,
        Self::HvIntrSrcRa,
        Self::Pswid,
        Self::LfifoBar,
        Self::LdataStampCtl,
        Self::LdmaCacheCtl,
        Self::LrfifoPush,
        Self::CurrMsgCount,
        Self::LnotifyAfterCount,
        Self::LrxWcred,
        Self::TxWcred,
        Self::LfifoSize,
        Self::WinCtl,
        Self::WinStatus,
        Self::WinCtxCachingCtl,
        Self::TxRsvdBufCount,
        Self::LrfifoWinPtr,
        Self::LnotifyCtl,
        Self::LnotifyPid,
        Self::LnotifyLpid,
        Self::LnotifyTid,
        Self::NxUtilAdder,
        Self::LnotifyScope,
        Self::NxUtil,
        Self::NxUtilSe,
        Self::LrxWcredAdder,
        Self::TxWcredAdder,
    ];

    /// Byte offset within the window's control block.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u64 {
        self as u64
    }

    /// Value this register takes when a window is handed to `ctx`.
    #[must_use]
    pub const fn reset_value(self, ctx: &WindowContext) -> u64 {
        match self {
            Self::Lpid => ctx.lpid as u64,
            Self::Pid => ctx.pid as u64,
            Self::XlateLpcr => XlateLpcr::new().into_bits(),
            _ => 0,
        }
    }
}

/// `(register, value)` pairs that fully initialize a control block for `ctx`.
pub fn reset_sequence(ctx: &WindowContext) -> impl Iterator<Item = (ControlRegister, u64)> + '_ {
    ControlRegister::ALL
        .into_iter()
        .map(move |reg| (reg, reg.reset_value(ctx)))
}

/// Translation page size selected in [`XlateLpcr`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum XlatePageSize {
    Size4K = 0b000,
    Size64K = 0b101,
    /// Any encoding not defined by the hardware.
    Reserved = 0b111,
}

impl XlatePageSize {
    #[inline]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b111 {
            0b000 => Self::Size4K,
            0b101 => Self::Size64K,
            _ => Self::Reserved,
        }
    }
}

/// `XLATE_LPCR`: translation mode the switchboard uses for this window.
///
/// Only the top six bits are defined; the rest are reserved and kept 0.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct XlateLpcr {
    /// Bits 0–57 — Reserved (must be 0).
    #[bits(58, default = 0)]
    _reserved_0_57: u64,

    /// Bit 58 — SC.
    pub sc: bool,

    /// Bit 59 — TC.
    pub tc: bool,

    /// Bit 60 — ISL.
    pub isl: bool,

    /// Bits 61–63 — translation page size.
    #[bits(3, default = XlatePageSize::Size4K)]
    pub page_size: XlatePageSize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn offsets_are_unique_aligned_and_inside_the_block() {
        for (i, a) in ControlRegister::ALL.iter().enumerate() {
            assert!(a.offset().is_multiple_of(8));
            assert!(a.offset() + 8 <= crate::HVWC_STRIDE);
            for b in &ControlRegister::ALL[i + 1..] {
                assert_ne!(a.offset(), b.offset(), "{a:?} and {b:?} overlap");
            }
        }
    }

    #[test]
    fn reset_sequence_sets_identity_and_zeroes_the_rest() {
        let ctx = WindowContext::new(7, 4242);
        let seq: Vec<_> = reset_sequence(&ctx).collect();
        assert_eq!(seq.len(), ControlRegister::ALL.len());
        assert_eq!(seq[0], (ControlRegister::Lpid, 7));
        assert_eq!(seq[1], (ControlRegister::Pid, 4242));
        assert!(seq[2..].iter().all(|&(_, v)| v == 0));
    }

    #[test]
    fn xlate_lpcr_bit_positions() {
        assert_eq!(XlateLpcr::new().into_bits(), 0);
        assert_eq!(XlateLpcr::new().with_sc(true).into_bits(), 0x0400_0000_0000_0000);
        assert_eq!(XlateLpcr::new().with_tc(true).into_bits(), 0x0800_0000_0000_0000);
        assert_eq!(XlateLpcr::new().with_isl(true).into_bits(), 0x1000_0000_0000_0000);
        assert_eq!(
            XlateLpcr::new()
                .with_page_size(XlatePageSize::Size64K)
                .into_bits(),
            0xa000_0000_0000_0000
        );
        assert_eq!(
            XlateLpcr::from_bits(0xe000_0000_0000_0000).page_size(),
            XlatePageSize::Reserved
        );
    }
}
