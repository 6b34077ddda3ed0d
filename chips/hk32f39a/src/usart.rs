// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Universal synchronous/asynchronous receiver transmitter.

use crate::config::CONFIG;
use crate::gpio::{self, Speed};
use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, PCLK1, PCLK2, PCLK2EXT};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::{debug, ErrorCode, StaticRef};

register_structs! {
    pub UsartRegisters {
        /// Status register
        (0x00 => pub sr: ReadWrite<u32, SR::Register>),
        /// Data register
        (0x04 => pub dr: ReadWrite<u32, DR::Register>),
        /// Baud rate register
        (0x08 => pub brr: ReadWrite<u32, BRR::Register>),
        /// Control register 1
        (0x0C => pub cr1: ReadWrite<u32, CR1::Register>),
        /// Control register 2
        (0x10 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// Control register 3
        (0x14 => pub cr3: ReadWrite<u32, CR3::Register>),
        /// Guard time and prescaler register
        (0x18 => pub gtpr: ReadWrite<u32, GTPR::Register>),
        (0x1C => @END),
    }
}

register_bitfields![u32,
    pub SR [
        /// CTS flag
        CTS OFFSET(9) NUMBITS(1) [],
        /// LIN break detection flag
        LBD OFFSET(8) NUMBITS(1) [],
        /// Transmit data register empty
        TXE OFFSET(7) NUMBITS(1) [],
        /// Transmission complete
        TC OFFSET(6) NUMBITS(1) [],
        /// Read data register not empty
        RXNE OFFSET(5) NUMBITS(1) [],
        /// IDLE line detected
        IDLE OFFSET(4) NUMBITS(1) [],
        /// Overrun error
        ORE OFFSET(3) NUMBITS(1) [],
        /// Noise error flag
        NE OFFSET(2) NUMBITS(1) [],
        /// Framing error
        FE OFFSET(1) NUMBITS(1) [],
        /// Parity error
        PE OFFSET(0) NUMBITS(1) []
    ],
    pub DR [
        DR OFFSET(0) NUMBITS(9) []
    ],
    pub BRR [
        DIV_Mantissa OFFSET(4) NUMBITS(12) [],
        DIV_Fraction OFFSET(0) NUMBITS(4) []
    ],
    pub CR1 [
        /// USART enable
        UE OFFSET(13) NUMBITS(1) [],
        /// Word length, set for 9 bits
        M OFFSET(12) NUMBITS(1) [],
        /// Wakeup method
        WAKE OFFSET(11) NUMBITS(1) [],
        /// Parity control enable
        PCE OFFSET(10) NUMBITS(1) [],
        /// Parity selection, set for odd
        PS OFFSET(9) NUMBITS(1) [],
        PEIE OFFSET(8) NUMBITS(1) [],
        TXEIE OFFSET(7) NUMBITS(1) [],
        TCIE OFFSET(6) NUMBITS(1) [],
        RXNEIE OFFSET(5) NUMBITS(1) [],
        IDLEIE OFFSET(4) NUMBITS(1) [],
        /// Transmitter enable
        TE OFFSET(3) NUMBITS(1) [],
        /// Receiver enable
        RE OFFSET(2) NUMBITS(1) [],
        /// Receiver wakeup
        RWU OFFSET(1) NUMBITS(1) [],
        /// Send break
        SBK OFFSET(0) NUMBITS(1) []
    ],
    pub CR2 [
        LINEN OFFSET(14) NUMBITS(1) [],
        STOP OFFSET(12) NUMBITS(2) [
            One = 0b00,
            Half = 0b01,
            Two = 0b10,
            OneAndHalf = 0b11
        ],
        CLKEN OFFSET(11) NUMBITS(1) [],
        CPOL OFFSET(10) NUMBITS(1) [],
        CPHA OFFSET(9) NUMBITS(1) [],
        LBCL OFFSET(8) NUMBITS(1) [],
        LBDIE OFFSET(6) NUMBITS(1) [],
        LBDL OFFSET(5) NUMBITS(1) [],
        /// Address of the USART node
        ADD OFFSET(0) NUMBITS(4) []
    ],
    pub CR3 [
        CTSIE OFFSET(10) NUMBITS(1) [],
        CTSE OFFSET(9) NUMBITS(1) [],
        RTSE OFFSET(8) NUMBITS(1) [],
        DMAT OFFSET(7) NUMBITS(1) [],
        DMAR OFFSET(6) NUMBITS(1) [],
        SCEN OFFSET(5) NUMBITS(1) [],
        NACK OFFSET(4) NUMBITS(1) [],
        HDSEL OFFSET(3) NUMBITS(1) [],
        IRLP OFFSET(2) NUMBITS(1) [],
        IREN OFFSET(1) NUMBITS(1) [],
        /// Error interrupt enable
        EIE OFFSET(0) NUMBITS(1) []
    ],
    pub GTPR [
        /// Guard time value
        GT OFFSET(8) NUMBITS(8) [],
        /// Prescaler value
        PSC OFFSET(0) NUMBITS(8) []
    ]
];

pub const USART1_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(memory_map::USART1_BASE as *const UsartRegisters) };
pub const USART2_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(memory_map::USART2_BASE as *const UsartRegisters) };
pub const USART3_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(memory_map::USART3_BASE as *const UsartRegisters) };
pub const UART4_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(memory_map::UART4_BASE as *const UsartRegisters) };
pub const UART5_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(memory_map::UART5_BASE as *const UsartRegisters) };
pub const USART6_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(memory_map::USART6_BASE as *const UsartRegisters) };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    One,
    Half,
    Two,
    OneAndHalf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Data bits per character, not counting the parity bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Seven = 7,
    Eight = 8,
    Nine = 9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parameters {
    pub baud_rate: u32,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub width: Width,
    pub hw_flow_control: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsartInterrupt {
    RxNotEmpty,
    Idle,
    TxEmpty,
    TxComplete,
    Parity,
    /// Framing, noise and overrun errors
    Error,
}

/// What an interrupt reported, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsartEvent {
    /// Received character, parity bit removed
    Received(u16),
    Overrun,
    Idle,
    TxEmpty,
    TxComplete,
}

/// `BRR` value for a baud rate, rounded like the vendor driver does.
pub fn brr_value(pclk_hz: u32, baud_rate: u32) -> u32 {
    let integer_divider = (25 * u64::from(pclk_hz)) / (4 * u64::from(baud_rate));
    let mantissa = (integer_divider / 100) as u32;
    let fractional = integer_divider as u32 - 100 * mantissa;
    (mantissa << 4) | (((fractional * 16 + 50) / 100) & 0x0F)
}

pub struct Usart<'a> {
    registers: StaticRef<UsartRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Usart<'a> {
    const fn new(
        registers: StaticRef<UsartRegisters>,
        clock: PeripheralClockType,
        rcc: &'a Rcc,
    ) -> Self {
        Self {
            registers,
            clock: PeripheralClock::new(clock, rcc),
        }
    }

    pub const fn new_usart1(rcc: &'a Rcc) -> Self {
        Self::new(USART1_BASE, PeripheralClockType::APB2(PCLK2::USART1), rcc)
    }

    pub const fn new_usart2(rcc: &'a Rcc) -> Self {
        Self::new(USART2_BASE, PeripheralClockType::APB1(PCLK1::USART2), rcc)
    }

    pub const fn new_usart3(rcc: &'a Rcc) -> Self {
        Self::new(USART3_BASE, PeripheralClockType::APB1(PCLK1::USART3), rcc)
    }

    pub const fn new_uart4(rcc: &'a Rcc) -> Self {
        Self::new(UART4_BASE, PeripheralClockType::APB1(PCLK1::UART4), rcc)
    }

    pub const fn new_uart5(rcc: &'a Rcc) -> Self {
        Self::new(UART5_BASE, PeripheralClockType::APB1(PCLK1::UART5), rcc)
    }

    pub const fn new_usart6(rcc: &'a Rcc) -> Self {
        Self::new(USART6_BASE, PeripheralClockType::APB2EXT(PCLK2EXT::USART6), rcc)
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<UsartRegisters>, rcc: &'a Rcc) -> Self {
        Self::new(registers, PeripheralClockType::APB2(PCLK2::USART1), rcc)
    }

    pub fn is_enabled_clock(&self) -> bool {
        self.clock.is_enabled()
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    /// TX as alternate push-pull at 50 MHz, RX as floating input.
    pub fn configure_pins(&self, tx: &gpio::Pin, rx: &gpio::Pin) {
        tx.configure(gpio::Mode::AlternatePushPull(Speed::Mhz50));
        rx.configure(gpio::Mode::InputFloating);
    }

    /// Reset the block, then program frame format and baud rate and enable
    /// transmitter and receiver. The parity bit counts towards the 8 or
    /// 9 bit word, other combinations are rejected.
    pub fn configure(&self, params: Parameters) -> Result<(), ErrorCode> {
        if params.baud_rate == 0 {
            return Err(ErrorCode::INVAL);
        }
        let parity_bits = match params.parity {
            Parity::None => 0,
            Parity::Odd | Parity::Even => 1,
        };
        let word_length = match params.width as u32 + parity_bits {
            8 => CR1::M::CLEAR,
            9 => CR1::M::SET,
            _ => return Err(ErrorCode::INVAL),
        };
        let parity = match params.parity {
            Parity::None => CR1::PCE::CLEAR + CR1::PS::CLEAR,
            Parity::Odd => CR1::PCE::SET + CR1::PS::SET,
            Parity::Even => CR1::PCE::SET + CR1::PS::CLEAR,
        };
        let stop = match params.stop_bits {
            StopBits::One => CR2::STOP::One,
            StopBits::Half => CR2::STOP::Half,
            StopBits::Two => CR2::STOP::Two,
            StopBits::OneAndHalf => CR2::STOP::OneAndHalf,
        };

        self.clock.enable();
        self.clock.reset();
        self.registers.cr2.modify(stop);
        self.registers
            .cr1
            .write(word_length + parity + CR1::TE::SET + CR1::RE::SET);
        self.registers.cr3.modify(
            CR3::RTSE.val(params.hw_flow_control as u32)
                + CR3::CTSE.val(params.hw_flow_control as u32),
        );
        self.set_baud_rate(params.baud_rate);
        self.enable();
        debug!("usart: configured at {} baud", params.baud_rate);
        Ok(())
    }

    fn set_baud_rate(&self, baud_rate: u32) {
        let pclk = self.clock.get_frequency();
        self.registers.brr.set(brr_value(pclk, baud_rate));
    }

    pub fn enable(&self) {
        self.registers.cr1.modify(CR1::UE::SET);
    }

    pub fn disable(&self) {
        self.registers.cr1.modify(CR1::UE::CLEAR);
    }

    pub fn enable_interrupt(&self, interrupt: UsartInterrupt) {
        self.set_interrupt(interrupt, true);
    }

    pub fn disable_interrupt(&self, interrupt: UsartInterrupt) {
        self.set_interrupt(interrupt, false);
    }

    fn set_interrupt(&self, interrupt: UsartInterrupt, enable: bool) {
        let value = enable as u32;
        match interrupt {
            UsartInterrupt::RxNotEmpty => self.registers.cr1.modify(CR1::RXNEIE.val(value)),
            UsartInterrupt::Idle => self.registers.cr1.modify(CR1::IDLEIE.val(value)),
            UsartInterrupt::TxEmpty => self.registers.cr1.modify(CR1::TXEIE.val(value)),
            UsartInterrupt::TxComplete => self.registers.cr1.modify(CR1::TCIE.val(value)),
            UsartInterrupt::Parity => self.registers.cr1.modify(CR1::PEIE.val(value)),
            UsartInterrupt::Error => self.registers.cr3.modify(CR3::EIE.val(value)),
        }
    }

    pub fn tx_ready(&self) -> bool {
        self.registers.sr.is_set(SR::TXE)
    }

    /// Queue one byte once the data register is free.
    pub fn send_byte(&self, byte: u8) -> Result<(), ErrorCode> {
        self.send_word(byte.into())
    }

    /// Queue one character of up to 9 data bits. Bits beyond the configured
    /// width are rejected with `SIZE`.
    pub fn send_word(&self, word: u16) -> Result<(), ErrorCode> {
        if word & !self.data_mask() != 0 {
            return Err(ErrorCode::SIZE);
        }
        wait_until(CONFIG.flag_timeout, || self.tx_ready())?;
        self.registers.dr.write(DR::DR.val(word.into()));
        Ok(())
    }

    /// Data bits of the configured frame, the parity bit takes the top bit
    /// of the word.
    fn data_mask(&self) -> u16 {
        let cr1 = self.registers.cr1.extract();
        let bits = 8 + cr1.read(CR1::M) - cr1.read(CR1::PCE);
        (1 << bits) - 1
    }

    fn read_data(&self) -> u16 {
        self.registers.dr.read(DR::DR) as u16 & self.data_mask()
    }

    /// Send a buffer, waiting for each character to leave the shift
    /// register before writing the next one.
    pub fn transmit_sync(&self, bytes: &[u8]) -> Result<(), ErrorCode> {
        for &byte in bytes {
            wait_until(CONFIG.flag_timeout, || self.registers.sr.is_set(SR::TC))?;
            self.registers.dr.write(DR::DR.val(byte.into()));
        }
        Ok(())
    }

    /// Take a received 7 or 8 bit character. A 9 bit character does not
    /// fit, it stays in the data register and yields `SIZE`.
    pub fn receive_byte(&self) -> Result<Option<u8>, ErrorCode> {
        if self.data_mask() > 0xFF {
            return Err(ErrorCode::SIZE);
        }
        Ok(self.receive_word().map(|word| word as u8))
    }

    pub fn receive_word(&self) -> Option<u16> {
        if self.registers.sr.is_set(SR::RXNE) {
            Some(self.read_data())
        } else {
            None
        }
    }

    /// Service the USART interrupt and report the most urgent event.
    pub fn handle_interrupt(&self) -> Option<UsartEvent> {
        let sr = self.registers.sr.extract();
        let cr1 = self.registers.cr1.extract();
        if sr.is_set(SR::RXNE) && cr1.is_set(CR1::RXNEIE) {
            return Some(UsartEvent::Received(self.read_data()));
        }
        if sr.is_set(SR::ORE) {
            // SR then DR read clears the overrun flag.
            let _ = self.registers.dr.get();
            return Some(UsartEvent::Overrun);
        }
        if sr.is_set(SR::IDLE) && cr1.is_set(CR1::IDLEIE) {
            let _ = self.registers.dr.get();
            return Some(UsartEvent::Idle);
        }
        if sr.is_set(SR::TXE) && cr1.is_set(CR1::TXEIE) {
            return Some(UsartEvent::TxEmpty);
        }
        if sr.is_set(SR::TC) && cr1.is_set(CR1::TCIE) {
            self.registers.sr.modify(SR::TC::CLEAR);
            return Some(UsartEvent::TxComplete);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;
    use crate::rcc::RccRegisters;

    fn usart_and_rcc() -> (StaticRef<UsartRegisters>, StaticRef<RccRegisters>) {
        (fake_registers(), fake_registers())
    }

    fn params(parity: Parity, width: Width) -> Parameters {
        Parameters {
            baud_rate: 115_200,
            stop_bits: StopBits::One,
            parity,
            width,
            hw_flow_control: false,
        }
    }

    #[test]
    fn register_layout() {
        assert_eq!(core::mem::offset_of!(UsartRegisters, brr), 0x08);
        assert_eq!(core::mem::offset_of!(UsartRegisters, gtpr), 0x18);
        assert_eq!(CR1::UE::SET.value, 0x2000);
        assert_eq!(SR::TXE::SET.value, 0x80);
    }

    #[test]
    fn baud_rate_divider() {
        assert_eq!(brr_value(72_000_000, 115_200), 0x271);
        assert_eq!(brr_value(8_000_000, 115_200), 0x45);
        assert_eq!(brr_value(36_000_000, 9_600), 0xEA6);
    }

    #[test]
    fn word_length_accounts_for_parity() {
        let (regs, rcc_regs) = usart_and_rcc();
        let rcc = Rcc::with_registers(rcc_regs);
        let usart = Usart::with_registers(regs, &rcc);

        assert_eq!(usart.configure(params(Parity::Even, Width::Eight)), Ok(()));
        assert!(regs.cr1.is_set(CR1::M));
        assert!(regs.cr1.is_set(CR1::PCE));
        assert!(!regs.cr1.is_set(CR1::PS));
        assert!(regs.cr1.is_set(CR1::UE));
        // 8 MHz HSI8M after reset
        assert_eq!(regs.brr.get(), 0x45);
        assert!(usart.is_enabled_clock());

        assert_eq!(usart.configure(params(Parity::Odd, Width::Seven)), Ok(()));
        assert!(!regs.cr1.is_set(CR1::M));
        assert!(regs.cr1.is_set(CR1::PS));

        assert_eq!(
            usart.configure(params(Parity::Odd, Width::Nine)),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(
            usart.configure(params(Parity::None, Width::Seven)),
            Err(ErrorCode::INVAL)
        );
    }

    #[test]
    fn send_waits_for_empty_data_register() {
        let (regs, rcc_regs) = usart_and_rcc();
        let rcc = Rcc::with_registers(rcc_regs);
        let usart = Usart::with_registers(regs, &rcc);

        assert_eq!(usart.send_byte(b'a'), Err(ErrorCode::BUSY));
        regs.sr.write(SR::TXE::SET + SR::TC::SET);
        assert_eq!(usart.send_byte(b'a'), Ok(()));
        assert_eq!(regs.dr.get(), u32::from(b'a'));
        assert_eq!(usart.transmit_sync(b"ok"), Ok(()));
        assert_eq!(regs.dr.get(), u32::from(b'k'));
    }

    #[test]
    fn nine_data_bits_travel_as_words() {
        let (regs, rcc_regs) = usart_and_rcc();
        let rcc = Rcc::with_registers(rcc_regs);
        let usart = Usart::with_registers(regs, &rcc);

        assert_eq!(usart.configure(params(Parity::None, Width::Nine)), Ok(()));
        assert!(regs.cr1.is_set(CR1::M));
        assert!(!regs.cr1.is_set(CR1::PCE));

        regs.sr.write(SR::RXNE::SET + SR::TXE::SET);
        regs.dr.set(0x1A5);
        assert_eq!(usart.receive_byte(), Err(ErrorCode::SIZE));
        assert_eq!(usart.receive_word(), Some(0x1A5));
        usart.enable_interrupt(UsartInterrupt::RxNotEmpty);
        assert_eq!(usart.handle_interrupt(), Some(UsartEvent::Received(0x1A5)));

        assert_eq!(usart.send_word(0x1FF), Ok(()));
        assert_eq!(regs.dr.get(), 0x1FF);
        assert_eq!(usart.send_word(0x200), Err(ErrorCode::SIZE));
    }

    #[test]
    fn parity_bit_is_stripped() {
        let (regs, rcc_regs) = usart_and_rcc();
        let rcc = Rcc::with_registers(rcc_regs);
        let usart = Usart::with_registers(regs, &rcc);

        // 7 data bits plus parity
        assert_eq!(usart.configure(params(Parity::Even, Width::Seven)), Ok(()));
        regs.sr.write(SR::RXNE::SET + SR::TXE::SET);
        regs.dr.set(0xC1);
        assert_eq!(usart.receive_byte(), Ok(Some(0x41)));
        assert_eq!(usart.send_byte(0x80), Err(ErrorCode::SIZE));

        // 8 data bits plus parity
        assert_eq!(usart.configure(params(Parity::Odd, Width::Eight)), Ok(()));
        regs.dr.set(0x1C1);
        assert_eq!(usart.receive_byte(), Ok(Some(0xC1)));
    }

    #[test]
    fn interrupt_events() {
        let (regs, rcc_regs) = usart_and_rcc();
        let rcc = Rcc::with_registers(rcc_regs);
        let usart = Usart::with_registers(regs, &rcc);

        regs.sr.write(SR::RXNE::SET);
        regs.dr.set(0x42);
        assert_eq!(usart.handle_interrupt(), None);
        assert_eq!(usart.receive_byte(), Ok(Some(0x42)));

        usart.enable_interrupt(UsartInterrupt::RxNotEmpty);
        assert_eq!(usart.handle_interrupt(), Some(UsartEvent::Received(0x42)));

        regs.sr.write(SR::TC::SET);
        usart.enable_interrupt(UsartInterrupt::TxComplete);
        assert_eq!(usart.handle_interrupt(), Some(UsartEvent::TxComplete));
        assert!(!regs.sr.is_set(SR::TC));

        usart.enable_interrupt(UsartInterrupt::Error);
        assert!(regs.cr3.is_set(CR3::EIE));
    }
}
