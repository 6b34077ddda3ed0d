// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Arithmetic co-processor.
//!
//! Operands go to `OPT0..OPT4`, the instruction code and `START` to `CR`.
//! Once `SR.FS` is set the results sit in `RES0..RES2` and the condition
//! flags in `FR` (scalar) or `SIMDFR` (per lane).

use crate::config::CONFIG;
use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK2};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{
    register_bitfields, register_structs, LocalRegisterCopy, ReadOnly, ReadWrite,
};
use hk32_utilities::{trace, ErrorCode, StaticRef};

register_structs! {
    pub CoaluRegisters {
        /// Control register
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Status register, interrupt flags are write 1 to clear
        (0x04 => pub sr: ReadWrite<u32, SR::Register>),
        /// Scalar flag register
        (0x08 => pub fr: ReadOnly<u32, FR::Register>),
        /// SIMD flag register
        (0x0C => pub simdfr: ReadOnly<u32, SIMDFR::Register>),
        /// Operand registers
        (0x10 => pub opt: [ReadWrite<u32>; 5]),
        /// Result registers
        (0x24 => pub res: [ReadWrite<u32>; 3]),
        (0x30 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Division overflow interrupt enable
        DIVOFIE OFFSET(28) NUMBITS(1) [],
        /// Division by zero interrupt enable
        DZIE OFFSET(27) NUMBITS(1) [],
        /// Illegal operation interrupt enable
        IOIE OFFSET(26) NUMBITS(1) [],
        /// Saturation interrupt enable
        QFIE OFFSET(25) NUMBITS(1) [],
        /// Overflow interrupt enable
        OFIE OFFSET(24) NUMBITS(1) [],
        /// Floating point rounding mode
        RMODE OFFSET(20) NUMBITS(2) [
            Nearest = 0b00,
            PlusInfinity = 0b01,
            MinusInfinity = 0b10,
            Zero = 0b11
        ],
        START OFFSET(17) NUMBITS(1) [],
        /// Fast start disable
        FSDIS OFFSET(16) NUMBITS(1) [],
        /// Result link
        LK OFFSET(15) NUMBITS(1) [],
        /// Two wait cycles on operand access, needed above 60 MHz HCLK
        FAMW OFFSET(14) NUMBITS(1) [],
        /// Instruction code
        ISA_OPT OFFSET(0) NUMBITS(10) []
    ],
    pub SR [
        DIVOF OFFSET(20) NUMBITS(1) [],
        DZ OFFSET(19) NUMBITS(1) [],
        IO OFFSET(18) NUMBITS(1) [],
        QF OFFSET(17) NUMBITS(1) [],
        OF OFFSET(16) NUMBITS(1) [],
        /// Operation finished
        FS OFFSET(0) NUMBITS(1) []
    ],
    pub FR [
        /// Floating point overflow
        FV OFFSET(19) NUMBITS(1) [],
        /// Floating point zero
        FZ OFFSET(17) NUMBITS(1) [],
        /// Floating point negative
        FN OFFSET(16) NUMBITS(1) [],
        /// Saturation
        Q OFFSET(4) NUMBITS(1) [],
        /// Overflow
        V OFFSET(3) NUMBITS(1) [],
        /// Negative
        N OFFSET(0) NUMBITS(1) []
    ],
    pub SIMDFR [
        /// Greater or equal, one bit per lane
        G OFFSET(16) NUMBITS(4) [],
        /// Saturation
        Q OFFSET(12) NUMBITS(4) [],
        /// Overflow
        V OFFSET(8) NUMBITS(4) [],
        /// Zero
        Z OFFSET(4) NUMBITS(4) [],
        /// Negative
        N OFFSET(0) NUMBITS(4) []
    ]
];

pub const COALU_BASE: StaticRef<CoaluRegisters> =
    unsafe { StaticRef::new(memory_map::COALU_BASE as *const CoaluRegisters) };

const OP_SQRT: u32 = 0x040;
const OP_LSQRT: u32 = 0x041;
const OP_SLDIV: u32 = 0x080;
const OP_ULDIV: u32 = 0x081;
const OP_QADD: u32 = 0x141;
const OP_QSUB: u32 = 0x142;
const OP_QDADD: u32 = 0x143;
const OP_QDSUB: u32 = 0x144;
const OP_SSAT16: u32 = 0x181;
const OP_USAT16: u32 = 0x182;
const OP_SMMAAA: u32 = 0x20E;
const OP_QSMMAAA: u32 = 0x24E;
const OP_VSQRTF32: u32 = 0x284;
const OP_VLSQRTF32: u32 = 0x285;
const OP_VCVTRS32F32: u32 = 0x289;
const OP_VCVTF32S32: u32 = 0x28A;
const OP_VCVTRS64F32: u32 = 0x295;
const OP_VCVTF32S64: u32 = 0x296;

/// HCLK above which operand access needs two wait cycles.
const FAMW_THRESHOLD_HZ: u32 = 60_000_000;

/// Packed 8/16-bit lane operations, named after the matching Cortex-M4
/// DSP instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimdOp {
    Sadd16 = 0x0C0,
    Sadd8 = 0x0C1,
    Ssub16 = 0x0C2,
    Ssub8 = 0x0C3,
    Sasx = 0x0C4,
    Ssax = 0x0C5,
    Uadd16 = 0x0C6,
    Uadd8 = 0x0C7,
    Usub16 = 0x0C8,
    Usub8 = 0x0C9,
    Uasx = 0x0CA,
    Usax = 0x0CB,
    Qadd16 = 0x100,
    Qadd8 = 0x101,
    Qsub16 = 0x102,
    Qsub8 = 0x103,
    Qasx = 0x104,
    Qsax = 0x105,
    Uqadd16 = 0x106,
    Uqadd8 = 0x107,
    Uqsub16 = 0x108,
    Uqsub8 = 0x109,
    Uqasx = 0x10A,
    Uqsax = 0x10B,
    Shadd16 = 0x1C0,
    Shadd8 = 0x1C1,
    Shsub16 = 0x1C2,
    Shsub8 = 0x1C3,
    Shasx = 0x1C4,
    Shsax = 0x1C5,
    Uhadd16 = 0x1C6,
    Uhadd8 = 0x1C7,
    Uhsub16 = 0x1C8,
    Uhsub8 = 0x1C9,
    Uhasx = 0x1CA,
    Uhsax = 0x1CB,
}

/// Multiply-accumulate into a 64-bit accumulator. The `Q` variants
/// saturate the accumulator instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LongMacOp {
    Smlalbb = 0x200,
    Smlalbt = 0x201,
    Smlaltb = 0x202,
    Smlaltt = 0x203,
    Smlald = 0x205,
    Smlaldx = 0x206,
    Smlsld = 0x207,
    Smlsldx = 0x208,
    Umaal = 0x20D,
    Qsmlalbb = 0x240,
    Qsmlalbt = 0x241,
    Qsmlaltb = 0x242,
    Qsmlaltt = 0x243,
    Qsmlald = 0x245,
    Qsmlaldx = 0x246,
    Qsmlsld = 0x247,
    Qsmlsldx = 0x248,
    Qumaal = 0x24D,
}

/// Multiply-accumulate on 32-bit words, `Smm*` keep the top half of the
/// product and the `r` forms round it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MacOp {
    Smlaw = 0x204,
    Smmla = 0x209,
    Smmlar = 0x20A,
    Smmls = 0x20B,
    Smmlsr = 0x20C,
    Qsmlaw = 0x244,
    Qsmmla = 0x249,
    Qsmmlar = 0x24A,
    Qsmmls = 0x24B,
    Qsmmlsr = 0x24C,
}

/// Single precision operations on two operands, rounded per `CR.RMODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatOp {
    Add = 0x280,
    Sub = 0x281,
    Mul = 0x282,
    Div = 0x283,
    /// `-(x * y)`
    NegMul = 0x294,
}

/// Fused single precision operations, `z` is the accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatMacOp {
    /// `z + x * y`
    MulAdd = 0x28F,
    /// `z - x * y`
    MulSub = 0x290,
    /// `-z - x * y`
    NegMulAdd = 0x292,
    /// `-z + x * y`
    NegMulSub = 0x293,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Nearest,
    PlusInfinity,
    MinusInfinity,
    Zero,
}

/// Quotient and remainder of a 64 by 32 bit division.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Division<Q, R> {
    pub quotient: Q,
    pub remainder: R,
    /// The quotient did not fit the result registers.
    pub overflow: bool,
}

/// Per-lane flags of a SIMD operation, bit n for lane n.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneFlags {
    pub greater_equal: u8,
    pub saturated: u8,
    pub overflow: u8,
    pub zero: u8,
    pub negative: u8,
}

impl From<LocalRegisterCopy<u32, SIMDFR::Register>> for LaneFlags {
    fn from(reg: LocalRegisterCopy<u32, SIMDFR::Register>) -> LaneFlags {
        LaneFlags {
            greater_equal: reg.read(SIMDFR::G) as u8,
            saturated: reg.read(SIMDFR::Q) as u8,
            overflow: reg.read(SIMDFR::V) as u8,
            zero: reg.read(SIMDFR::Z) as u8,
            negative: reg.read(SIMDFR::N) as u8,
        }
    }
}

pub struct Coalu<'a> {
    registers: StaticRef<CoaluRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Coalu<'a> {
    pub const fn new(rcc: &'a Rcc) -> Coalu<'a> {
        Coalu {
            registers: COALU_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::COALU), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<CoaluRegisters>, rcc: &'a Rcc) -> Coalu<'a> {
        Coalu {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::COALU), rcc),
        }
    }

    /// Enable the clock and pick the wait cycles for the current HCLK.
    pub fn enable(&self, rounding: Rounding) {
        self.clock.enable();
        let fast_bus = self.clock.get_frequency() > FAMW_THRESHOLD_HZ;
        self.registers
            .cr
            .modify(CR::FAMW.val(fast_bus as u32) + CR::LK::CLEAR);
        self.set_rounding(rounding);
    }

    /// Rounding applied by the floating point operations.
    pub fn set_rounding(&self, rounding: Rounding) {
        let rmode = match rounding {
            Rounding::Nearest => CR::RMODE::Nearest,
            Rounding::PlusInfinity => CR::RMODE::PlusInfinity,
            Rounding::MinusInfinity => CR::RMODE::MinusInfinity,
            Rounding::Zero => CR::RMODE::Zero,
        };
        self.registers.cr.modify(rmode);
    }

    pub fn disable(&self) {
        self.clock.disable();
    }

    pub fn enable_interrupts(
        &self,
        division: bool,
        illegal: bool,
        saturation: bool,
        overflow: bool,
    ) {
        self.registers.cr.modify(
            CR::DIVOFIE.val(division as u32)
                + CR::DZIE.val(division as u32)
                + CR::IOIE.val(illegal as u32)
                + CR::QFIE.val(saturation as u32)
                + CR::OFIE.val(overflow as u32),
        );
    }

    /// Run one instruction. Returns the status flags raised by it, which are
    /// cleared again.
    fn run(
        &self,
        op: u32,
        operands: &[u32],
    ) -> Result<LocalRegisterCopy<u32, SR::Register>, ErrorCode> {
        for (reg, &value) in self.registers.opt.iter().zip(operands) {
            reg.set(value);
        }
        self.registers
            .cr
            .modify(CR::ISA_OPT.val(op) + CR::START::SET);
        wait_until(CONFIG.flag_timeout, || self.registers.sr.is_set(SR::FS))?;
        let status = self.registers.sr.extract();
        self.registers.sr.set(status.get());
        if status.is_set(SR::IO) {
            trace!("coalu: illegal operation {:#x}", op);
            return Err(ErrorCode::FAIL);
        }
        if status.is_set(SR::DZ) {
            return Err(ErrorCode::INVAL);
        }
        Ok(status)
    }

    pub fn sqrt(&self, x: u32) -> Result<u32, ErrorCode> {
        self.run(OP_SQRT, &[x])?;
        Ok(self.registers.res[0].get())
    }

    pub fn sqrt64(&self, x: u64) -> Result<u32, ErrorCode> {
        self.run(OP_LSQRT, &[x as u32, (x >> 32) as u32])?;
        Ok(self.registers.res[0].get())
    }

    /// `RES0` low word, `RES1` high word.
    fn result64(&self) -> u64 {
        u64::from(self.registers.res[0].get()) | u64::from(self.registers.res[1].get()) << 32
    }

    /// Signed 64 by 32 bit division. A zero divisor is rejected with `INVAL`
    /// before the co-processor is started.
    pub fn div_signed(
        &self,
        dividend: i64,
        divisor: i32,
    ) -> Result<Division<i64, i32>, ErrorCode> {
        if divisor == 0 {
            return Err(ErrorCode::INVAL);
        }
        let status = self.run(
            OP_SLDIV,
            &[dividend as u32, (dividend >> 32) as u32, divisor as u32],
        )?;
        Ok(Division {
            quotient: self.result64() as i64,
            remainder: self.registers.res[2].get() as i32,
            overflow: status.is_set(SR::DIVOF),
        })
    }

    pub fn div_unsigned(
        &self,
        dividend: u64,
        divisor: u32,
    ) -> Result<Division<u64, u32>, ErrorCode> {
        if divisor == 0 {
            return Err(ErrorCode::INVAL);
        }
        let status = self.run(OP_ULDIV, &[dividend as u32, (dividend >> 32) as u32, divisor])?;
        Ok(Division {
            quotient: self.result64(),
            remainder: self.registers.res[2].get(),
            overflow: status.is_set(SR::DIVOF),
        })
    }

    /// Lane-wise `op` on `x` and `y`.
    pub fn simd(&self, op: SimdOp, x: u32, y: u32) -> Result<(u32, LaneFlags), ErrorCode> {
        self.run(op as u32, &[x, y])?;
        Ok((
            self.registers.res[0].get(),
            self.registers.simdfr.extract().into(),
        ))
    }

    /// Saturating add, the flag is set when the result was clamped.
    pub fn saturating_add(&self, x: i32, y: i32) -> Result<(i32, bool), ErrorCode> {
        let status = self.run(OP_QADD, &[x as u32, y as u32])?;
        Ok((self.registers.res[0].get() as i32, status.is_set(SR::QF)))
    }

    pub fn saturating_sub(&self, x: i32, y: i32) -> Result<(i32, bool), ErrorCode> {
        let status = self.run(OP_QSUB, &[x as u32, y as u32])?;
        Ok((self.registers.res[0].get() as i32, status.is_set(SR::QF)))
    }

    /// `x + 2 * y` with saturation, the flag is set when either step clamped.
    pub fn saturating_double_add(&self, x: i32, y: i32) -> Result<(i32, bool), ErrorCode> {
        let status = self.run(OP_QDADD, &[x as u32, y as u32])?;
        Ok((self.registers.res[0].get() as i32, status.is_set(SR::QF)))
    }

    /// `x - 2 * y` with saturation.
    pub fn saturating_double_sub(&self, x: i32, y: i32) -> Result<(i32, bool), ErrorCode> {
        let status = self.run(OP_QDSUB, &[x as u32, y as u32])?;
        Ok((self.registers.res[0].get() as i32, status.is_set(SR::QF)))
    }

    /// Clamp both signed halfwords of `x` to `bits` wide, 1..=16.
    pub fn signed_saturate16(&self, x: u32, bits: u8) -> Result<(u32, bool), ErrorCode> {
        if !(1..=16).contains(&bits) {
            return Err(ErrorCode::INVAL);
        }
        let status = self.run(OP_SSAT16, &[x, u32::from(bits)])?;
        Ok((self.registers.res[0].get(), status.is_set(SR::QF)))
    }

    /// Clamp both signed halfwords of `x` to unsigned `bits` wide, 0..=15.
    pub fn unsigned_saturate16(&self, x: u32, bits: u8) -> Result<(u32, bool), ErrorCode> {
        if bits > 15 {
            return Err(ErrorCode::INVAL);
        }
        let status = self.run(OP_USAT16, &[x, u32::from(bits)])?;
        Ok((self.registers.res[0].get(), status.is_set(SR::QF)))
    }

    /// `op` on the halfwords or words of `x` and `y`, added to `acc`. The
    /// flag reports saturation of the `Q` forms.
    pub fn multiply_accumulate_long(
        &self,
        op: LongMacOp,
        x: u32,
        y: u32,
        acc: i64,
    ) -> Result<(i64, bool), ErrorCode> {
        let status = self.run(op as u32, &[x, y, acc as u32, (acc >> 32) as u32])?;
        Ok((self.result64() as i64, status.is_set(SR::QF)))
    }

    pub fn multiply_accumulate(
        &self,
        op: MacOp,
        x: i32,
        y: i32,
        acc: i32,
    ) -> Result<(i32, bool), ErrorCode> {
        let status = self.run(op as u32, &[x as u32, y as u32, acc as u32])?;
        Ok((self.registers.res[0].get() as i32, status.is_set(SR::QF)))
    }

    /// `acc + x[0] * y[0] + x[1] * y[1]`, saturating when asked to.
    pub fn dual_multiply_accumulate(
        &self,
        x: [i32; 2],
        y: [i32; 2],
        acc: i32,
        saturate: bool,
    ) -> Result<(i32, bool), ErrorCode> {
        let op = if saturate { OP_QSMMAAA } else { OP_SMMAAA };
        let operands = [x[0], x[1], y[0], y[1], acc].map(|v| v as u32);
        let status = self.run(op, &operands)?;
        Ok((self.registers.res[0].get() as i32, status.is_set(SR::QF)))
    }

    fn float_result(&self) -> f32 {
        f32::from_bits(self.registers.res[0].get())
    }

    pub fn float(&self, op: FloatOp, x: f32, y: f32) -> Result<f32, ErrorCode> {
        self.run(op as u32, &[x.to_bits(), y.to_bits()])?;
        Ok(self.float_result())
    }

    pub fn float_multiply_accumulate(
        &self,
        op: FloatMacOp,
        x: f32,
        y: f32,
        z: f32,
    ) -> Result<f32, ErrorCode> {
        self.run(op as u32, &[x.to_bits(), y.to_bits(), z.to_bits()])?;
        Ok(self.float_result())
    }

    /// Square root of a negative input is an illegal operation, `FAIL`.
    pub fn float_sqrt(&self, x: f32) -> Result<f32, ErrorCode> {
        self.run(OP_VSQRTF32, &[x.to_bits()])?;
        Ok(self.float_result())
    }

    /// Square root through the long form of the instruction.
    pub fn float_sqrt_long(&self, x: f32) -> Result<f32, ErrorCode> {
        self.run(OP_VLSQRTF32, &[x.to_bits()])?;
        Ok(self.float_result())
    }

    /// Convert to an integer with the given rounding, which stays selected.
    pub fn f32_to_i32(&self, x: f32, rounding: Rounding) -> Result<i32, ErrorCode> {
        self.set_rounding(rounding);
        self.run(OP_VCVTRS32F32, &[x.to_bits()])?;
        Ok(self.registers.res[0].get() as i32)
    }

    pub fn f32_to_i64(&self, x: f32, rounding: Rounding) -> Result<i64, ErrorCode> {
        self.set_rounding(rounding);
        self.run(OP_VCVTRS64F32, &[x.to_bits()])?;
        Ok(self.result64() as i64)
    }

    pub fn i32_to_f32(&self, x: i32) -> Result<f32, ErrorCode> {
        self.run(OP_VCVTF32S32, &[x as u32])?;
        Ok(self.float_result())
    }

    pub fn i64_to_f32(&self, x: i64) -> Result<f32, ErrorCode> {
        self.run(OP_VCVTF32S64, &[x as u32, (x >> 32) as u32])?;
        Ok(self.float_result())
    }

    /// Overflow, zero and negative flags of the last floating point result.
    pub fn float_flags(&self) -> (bool, bool, bool) {
        let fr = self.registers.fr.extract();
        (fr.is_set(FR::FV), fr.is_set(FR::FZ), fr.is_set(FR::FN))
    }

    /// Overflow flag of the last scalar operation.
    pub fn overflowed(&self) -> bool {
        self.registers.fr.is_set(FR::V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(CoaluRegisters, opt), 0x10);
        assert_eq!(core::mem::offset_of!(CoaluRegisters, res), 0x24);
        assert_eq!(CR::START::SET.value, 0x0002_0000);
        assert_eq!(CR::RMODE::Zero.value, 0x0030_0000);
        assert_eq!(SR::DIVOF::SET.value, 0x0010_0000);
    }

    #[test]
    fn unsigned_division() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(0x8000_0000);
        regs.res[1].set(0x1);
        regs.res[2].set(7);
        let result = coalu.div_unsigned(0x0000_0003_0000_0007, 2);
        assert_eq!(
            result,
            Ok(Division {
                quotient: 0x1_8000_0000,
                remainder: 7,
                overflow: false,
            })
        );
        assert_eq!(regs.opt[0].get(), 7);
        assert_eq!(regs.opt[1].get(), 3);
        assert_eq!(regs.opt[2].get(), 2);
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_ULDIV);
        assert!(regs.cr.is_set(CR::START));
    }

    #[test]
    fn divide_by_zero() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        assert_eq!(coalu.div_signed(10, 0), Err(ErrorCode::INVAL));
        assert_eq!(regs.cr.get(), 0);

        // Flag raised by the hardware is mapped the same way.
        regs.sr.write(SR::FS::SET + SR::DZ::SET);
        assert_eq!(coalu.div_unsigned(10, 1), Err(ErrorCode::INVAL));
    }

    #[test]
    fn overflow_and_saturation_flags() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET + SR::DIVOF::SET);
        let result = coalu.div_signed(i64::MIN, -1);
        assert_eq!(result.map(|d| d.overflow), Ok(true));
        assert_eq!(regs.opt[2].get(), 0xFFFF_FFFF);

        regs.sr.write(SR::FS::SET + SR::QF::SET);
        regs.res[0].set(i32::MAX as u32);
        assert_eq!(coalu.saturating_add(i32::MAX, 1), Ok((i32::MAX, true)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_QADD);
    }

    #[test]
    fn simd_lanes() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(0x0003_0005);
        let (value, flags) = coalu
            .simd(SimdOp::Uadd16, 0x0001_0002, 0x0002_0003)
            .unwrap();
        assert_eq!(value, 0x0003_0005);
        assert_eq!(flags.overflow, 0);
        assert_eq!(regs.cr.read(CR::ISA_OPT), 0x0C6);

        regs.sr.set(0);
        assert_eq!(coalu.sqrt(16), Err(ErrorCode::BUSY));
    }

    #[test]
    fn doubling_saturation() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET + SR::QF::SET);
        regs.res[0].set(i32::MIN as u32);
        assert_eq!(coalu.saturating_double_sub(-1, i32::MAX), Ok((i32::MIN, true)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_QDSUB);
        assert_eq!(regs.opt[0].get(), 0xFFFF_FFFF);
        assert_eq!(regs.opt[1].get(), i32::MAX as u32);
    }

    #[test]
    fn halfword_saturation_width() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        assert_eq!(coalu.signed_saturate16(0x7FFF_8000, 0), Err(ErrorCode::INVAL));
        assert_eq!(coalu.signed_saturate16(0x7FFF_8000, 17), Err(ErrorCode::INVAL));
        assert_eq!(coalu.unsigned_saturate16(0x7FFF_8000, 16), Err(ErrorCode::INVAL));
        assert_eq!(regs.cr.get(), 0);

        regs.sr.write(SR::FS::SET + SR::QF::SET);
        regs.res[0].set(0x007F_FF80);
        assert_eq!(coalu.signed_saturate16(0x7FFF_8000, 8), Ok((0x007F_FF80, true)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_SSAT16);
        assert_eq!(regs.opt[1].get(), 8);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(0x00FF_0000);
        assert_eq!(coalu.unsigned_saturate16(0x7FFF_8000, 8), Ok((0x00FF_0000, false)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_USAT16);
    }

    #[test]
    fn long_accumulator_spans_two_operands() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(0xFFFF_FFFE);
        regs.res[1].set(0xFFFF_FFFF);
        let result =
            coalu.multiply_accumulate_long(LongMacOp::Qsmlaltt, 0x0001_0000, 0xFFFF_0000, -1);
        assert_eq!(result, Ok((-2, false)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), 0x243);
        assert_eq!(regs.opt[2].get(), 0xFFFF_FFFF);
        assert_eq!(regs.opt[3].get(), 0xFFFF_FFFF);

        regs.sr.write(SR::FS::SET + SR::QF::SET);
        regs.res[0].set(i32::MAX as u32);
        assert_eq!(coalu.multiply_accumulate(MacOp::Qsmmlar, 3, 4, 5), Ok((i32::MAX, true)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), 0x24A);
        assert_eq!(regs.opt[2].get(), 5);
    }

    #[test]
    fn dual_multiply_uses_every_operand() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(21);
        assert_eq!(coalu.dual_multiply_accumulate([1, 2], [3, 4], 10, false), Ok((21, false)));
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_SMMAAA);
        let operands: [u32; 5] = core::array::from_fn(|i| regs.opt[i].get());
        assert_eq!(operands, [1, 2, 3, 4, 10]);

        coalu.dual_multiply_accumulate([1, 2], [3, 4], 10, true).unwrap();
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_QSMMAAA);
    }

    #[test]
    fn float_operations_move_raw_bits() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(2.5f32.to_bits());
        assert_eq!(coalu.float(FloatOp::Add, 1.0, 1.5), Ok(2.5));
        assert_eq!(regs.opt[0].get(), 0x3F80_0000);
        assert_eq!(regs.cr.read(CR::ISA_OPT), 0x280);

        assert_eq!(
            coalu.float_multiply_accumulate(FloatMacOp::NegMulSub, 2.0, 2.0, 1.5),
            Ok(2.5)
        );
        assert_eq!(regs.opt[2].get(), 1.5f32.to_bits());
        assert_eq!(regs.cr.read(CR::ISA_OPT), 0x293);

        assert_eq!(coalu.i64_to_f32(-2), Ok(2.5));
        assert_eq!(regs.opt[1].get(), 0xFFFF_FFFF);

        regs.sr.write(SR::FS::SET + SR::IO::SET);
        assert_eq!(coalu.float_sqrt(-1.0), Err(ErrorCode::FAIL));
    }

    #[test]
    fn conversion_selects_rounding() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        regs.sr.write(SR::FS::SET);
        regs.res[0].set(-3i32 as u32);
        assert_eq!(coalu.f32_to_i32(-2.5, Rounding::MinusInfinity), Ok(-3));
        assert!(regs.cr.matches_all(CR::RMODE::MinusInfinity));
        assert_eq!(regs.cr.read(CR::ISA_OPT), OP_VCVTRS32F32);

        regs.res[1].set(0xFFFF_FFFF);
        assert_eq!(coalu.f32_to_i64(-2.5, Rounding::Zero), Ok(-3));
        assert!(regs.cr.matches_all(CR::RMODE::Zero));
    }

    #[test]
    fn wait_cycles_follow_hclk() {
        let regs: StaticRef<CoaluRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let coalu = Coalu::with_registers(regs, &rcc);

        // Reset clock tree runs at 8 MHz.
        coalu.enable(Rounding::Zero);
        assert!(!regs.cr.is_set(CR::FAMW));
        assert!(regs.cr.matches_all(CR::RMODE::Zero));
    }
}
