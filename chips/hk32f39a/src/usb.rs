// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! USB full-speed device.
//!
//! Endpoint buffers live in a 512 byte packet memory area (PMA) that the
//! CPU sees as 16-bit halfwords on a 32-bit stride, so PMA offset `n` is at
//! `USB_PMAADDR + 2 * n`. The buffer descriptor table, located at
//! `BTABLE` inside the PMA, holds four halfwords per endpoint:
//! `ADDRn_TX`, `COUNTn_TX`, `ADDRn_RX`, `COUNTn_RX`.

use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, PCLK1};
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::{debug, ErrorCode, StaticRef};

pub const NUM_ENDPOINTS: usize = 8;
pub const PMA_SIZE: usize = 512;

register_structs! {
    pub UsbRegisters {
        /// Endpoint registers
        (0x00 => pub epr: [ReadWrite<u32, EPR::Register>; NUM_ENDPOINTS]),
        (0x20 => _reserved0),
        /// Control register
        (0x40 => pub cntr: ReadWrite<u32, CNTR::Register>),
        /// Interrupt status register
        (0x44 => pub istr: ReadWrite<u32, ISTR::Register>),
        /// Frame number register
        (0x48 => pub fnr: ReadWrite<u32, FNR::Register>),
        /// Device address register
        (0x4C => pub daddr: ReadWrite<u32, DADDR::Register>),
        /// Buffer table address
        (0x50 => pub btable: ReadWrite<u32, BTABLE::Register>),
        (0x54 => @END),
    }
}

register_structs! {
    pub PmaRegisters {
        /// One PMA halfword in the low half of each word
        (0x000 => pub words: [ReadWrite<u32>; PMA_SIZE / 2]),
        (0x400 => @END),
    }
}

register_bitfields![u32,
    pub EPR [
        /// Correct transfer for reception, write 0 to clear
        CTR_RX OFFSET(15) NUMBITS(1) [],
        /// Toggle on write 1
        DTOG_RX OFFSET(14) NUMBITS(1) [],
        /// Toggle on write 1
        STAT_RX OFFSET(12) NUMBITS(2) [],
        SETUP OFFSET(11) NUMBITS(1) [],
        EP_TYPE OFFSET(9) NUMBITS(2) [
            Bulk = 0b00,
            Control = 0b01,
            Isochronous = 0b10,
            Interrupt = 0b11
        ],
        EP_KIND OFFSET(8) NUMBITS(1) [],
        /// Correct transfer for transmission, write 0 to clear
        CTR_TX OFFSET(7) NUMBITS(1) [],
        /// Toggle on write 1
        DTOG_TX OFFSET(6) NUMBITS(1) [],
        /// Toggle on write 1
        STAT_TX OFFSET(4) NUMBITS(2) [],
        /// Endpoint address
        EA OFFSET(0) NUMBITS(4) []
    ],
    pub CNTR [
        CTRM OFFSET(15) NUMBITS(1) [],
        PMAOVRM OFFSET(14) NUMBITS(1) [],
        ERRM OFFSET(13) NUMBITS(1) [],
        WKUPM OFFSET(12) NUMBITS(1) [],
        SUSPM OFFSET(11) NUMBITS(1) [],
        RESETM OFFSET(10) NUMBITS(1) [],
        SOFM OFFSET(9) NUMBITS(1) [],
        ESOFM OFFSET(8) NUMBITS(1) [],
        /// Resume request
        RESUME OFFSET(4) NUMBITS(1) [],
        /// Force suspend
        FSUSP OFFSET(3) NUMBITS(1) [],
        LP_MODE OFFSET(2) NUMBITS(1) [],
        /// Power down
        PDWN OFFSET(1) NUMBITS(1) [],
        /// Force reset
        FRES OFFSET(0) NUMBITS(1) []
    ],
    pub ISTR [
        CTR OFFSET(15) NUMBITS(1) [],
        PMAOVR OFFSET(14) NUMBITS(1) [],
        ERR OFFSET(13) NUMBITS(1) [],
        WKUP OFFSET(12) NUMBITS(1) [],
        SUSP OFFSET(11) NUMBITS(1) [],
        RESET OFFSET(10) NUMBITS(1) [],
        SOF OFFSET(9) NUMBITS(1) [],
        ESOF OFFSET(8) NUMBITS(1) [],
        /// Set for an OUT/SETUP transfer
        DIR OFFSET(4) NUMBITS(1) [],
        EP_ID OFFSET(0) NUMBITS(4) []
    ],
    pub FNR [
        RXDP OFFSET(15) NUMBITS(1) [],
        RXDM OFFSET(14) NUMBITS(1) [],
        /// Locked to the host SOF
        LCK OFFSET(13) NUMBITS(1) [],
        /// Lost SOF count
        LSOF OFFSET(11) NUMBITS(2) [],
        FN OFFSET(0) NUMBITS(11) []
    ],
    pub DADDR [
        /// Function enable
        EF OFFSET(7) NUMBITS(1) [],
        ADD OFFSET(0) NUMBITS(7) []
    ],
    pub BTABLE [
        /// Table offset in the PMA, 8 byte aligned
        BTABLE OFFSET(3) NUMBITS(13) []
    ]
];

pub const USB_BASE: StaticRef<UsbRegisters> =
    unsafe { StaticRef::new(memory_map::USB_BASE as *const UsbRegisters) };

pub const USB_PMA: StaticRef<PmaRegisters> =
    unsafe { StaticRef::new(memory_map::USB_PMAADDR as *const PmaRegisters) };

/// `COUNTn_RX` bit selecting 32 byte blocks.
const BL_SIZE: u16 = 1 << 15;
const NUM_BLOCK_SHIFT: u16 = 10;
const COUNT_MASK: u16 = 0x03FF;

/// Bits of `EPR` that a write leaves untouched when written as 1 (`CTR_*`)
/// or as 0 (toggles).
const EPR_INVARIANT: u32 = (1 << 15) | (1 << 7);
/// Read/write bits of `EPR`.
const EPR_RW: u32 = 0x070F;

/// Encode an RX buffer size into `COUNTn_RX`. Sizes up to 62 bytes count
/// 2-byte blocks, larger ones 32-byte blocks. The size is rounded up to
/// the next block.
pub fn rx_count_encoding(size: usize) -> Result<u16, ErrorCode> {
    if size == 0 || size > PMA_SIZE {
        return Err(ErrorCode::SIZE);
    }
    let size = size as u16;
    if size > 62 {
        let mut blocks = size >> 5;
        if size & 0x1F == 0 {
            blocks -= 1;
        }
        Ok(BL_SIZE | (blocks << NUM_BLOCK_SHIFT))
    } else {
        let blocks = (size + 1) >> 1;
        Ok(blocks << NUM_BLOCK_SHIFT)
    }
}

/// Buffer size in bytes described by a `COUNTn_RX` value.
pub fn rx_buffer_size(count_rx: u16) -> usize {
    let blocks = usize::from((count_rx >> NUM_BLOCK_SHIFT) & 0x1F);
    if count_rx & BL_SIZE != 0 {
        (blocks + 1) * 32
    } else {
        blocks * 2
    }
}

fn pma_index(offset: u16) -> usize {
    (usize::from(offset) % PMA_SIZE) / 2
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointType {
    Bulk,
    Control,
    Isochronous,
    Interrupt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointStatus {
    Disabled = 0b00,
    Stall = 0b01,
    Nak = 0b10,
    Valid = 0b11,
}

/// Offsets of an endpoint's buffers inside the PMA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointBuffers {
    pub tx_offset: u16,
    pub rx_offset: u16,
    pub rx_size: usize,
}

pub struct Usb<'a> {
    registers: StaticRef<UsbRegisters>,
    pma: StaticRef<PmaRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Usb<'a> {
    pub const fn new(rcc: &'a Rcc) -> Usb<'a> {
        Usb {
            registers: USB_BASE,
            pma: USB_PMA,
            clock: PeripheralClock::new(PeripheralClockType::APB1(PCLK1::USB), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(
        registers: StaticRef<UsbRegisters>,
        pma: StaticRef<PmaRegisters>,
        rcc: &'a Rcc,
    ) -> Usb<'a> {
        Usb {
            registers,
            pma,
            clock: PeripheralClock::new(PeripheralClockType::APB1(PCLK1::USB), rcc),
        }
    }

    /* PMA access */

    /// Offsets wrap at the end of the PMA.
    pub fn pma_read_u16(&self, offset: u16) -> u16 {
        self.pma.words[pma_index(offset)].get() as u16
    }

    pub fn pma_write_u16(&self, offset: u16, value: u16) {
        self.pma.words[pma_index(offset)].set(value.into());
    }

    /// Copy `data` into the PMA at the even `offset`.
    pub fn pma_write(&self, offset: u16, data: &[u8]) -> Result<(), ErrorCode> {
        if offset % 2 != 0 || usize::from(offset) + data.len() > PMA_SIZE {
            return Err(ErrorCode::INVAL);
        }
        for (i, pair) in data.chunks(2).enumerate() {
            let low = pair[0];
            let high = pair.get(1).copied().unwrap_or(0);
            self.pma_write_u16(offset + 2 * i as u16, u16::from_le_bytes([low, high]));
        }
        Ok(())
    }

    pub fn pma_read(&self, offset: u16, buffer: &mut [u8]) -> Result<(), ErrorCode> {
        if offset % 2 != 0 || usize::from(offset) + buffer.len() > PMA_SIZE {
            return Err(ErrorCode::INVAL);
        }
        for (i, pair) in buffer.chunks_mut(2).enumerate() {
            let bytes = self.pma_read_u16(offset + 2 * i as u16).to_le_bytes();
            pair.copy_from_slice(&bytes[..pair.len()]);
        }
        Ok(())
    }

    /* Buffer descriptor table */

    fn descriptor(&self, endpoint: usize) -> Result<u16, ErrorCode> {
        if endpoint >= NUM_ENDPOINTS {
            return Err(ErrorCode::INVAL);
        }
        Ok((self.registers.btable.get() as u16 & !0x7) + 8 * endpoint as u16)
    }

    pub fn set_tx_address(&self, endpoint: usize, offset: u16) -> Result<(), ErrorCode> {
        self.pma_write_u16(self.descriptor(endpoint)?, offset & !1);
        Ok(())
    }

    pub fn tx_address(&self, endpoint: usize) -> Result<u16, ErrorCode> {
        Ok(self.pma_read_u16(self.descriptor(endpoint)?))
    }

    pub fn set_tx_count(&self, endpoint: usize, count: u16) -> Result<(), ErrorCode> {
        self.pma_write_u16(self.descriptor(endpoint)? + 2, count & COUNT_MASK);
        Ok(())
    }

    pub fn set_rx_address(&self, endpoint: usize, offset: u16) -> Result<(), ErrorCode> {
        self.pma_write_u16(self.descriptor(endpoint)? + 4, offset & !1);
        Ok(())
    }

    pub fn rx_address(&self, endpoint: usize) -> Result<u16, ErrorCode> {
        Ok(self.pma_read_u16(self.descriptor(endpoint)? + 4))
    }

    pub fn set_rx_buffer_size(&self, endpoint: usize, size: usize) -> Result<(), ErrorCode> {
        let descriptor = self.descriptor(endpoint)?;
        let encoded = rx_count_encoding(size)?;
        self.pma_write_u16(descriptor + 6, encoded);
        Ok(())
    }

    /// Bytes received in the last OUT or SETUP transaction.
    pub fn rx_count(&self, endpoint: usize) -> Result<u16, ErrorCode> {
        Ok(self.pma_read_u16(self.descriptor(endpoint)? + 6) & COUNT_MASK)
    }

    /* Device */

    /// Power up the transceiver and leave the core in reset until the
    /// caller releases it with [`Usb::release_reset`].
    pub fn enable(&self) {
        self.clock.enable();
        self.registers.cntr.write(CNTR::FRES::SET);
    }

    pub fn release_reset(&self) {
        self.registers.cntr.modify(CNTR::FRES::CLEAR);
        self.registers.istr.set(0);
        self.registers.btable.set(0);
    }

    pub fn disable(&self) {
        self.registers.cntr.write(CNTR::FRES::SET + CNTR::PDWN::SET);
        self.clock.disable();
    }

    pub fn set_address(&self, address: u8) {
        self.registers
            .daddr
            .write(DADDR::EF::SET + DADDR::ADD.val(u32::from(address & 0x7F)));
        debug!("usb: address {}", address);
    }

    pub fn enable_interrupts(&self, mask: u32) {
        self.registers.cntr.set(self.registers.cntr.get() | (mask & 0xFF00));
    }

    pub fn interrupt_status(&self) -> u32 {
        self.registers.istr.get()
    }

    /// Clear the `ISTR` flags in `mask`. Flags are cleared by writing 0
    /// and untouched by writing 1.
    pub fn clear_interrupts(&self, mask: u32) {
        self.registers.istr.set(!mask & 0xFF00);
    }

    pub fn frame_number(&self) -> u16 {
        self.registers.fnr.read(FNR::FN) as u16
    }

    /* Endpoints */

    fn endpoint(&self, endpoint: usize) -> Result<&ReadWrite<u32, EPR::Register>, ErrorCode> {
        self.registers.epr.get(endpoint).ok_or(ErrorCode::INVAL)
    }

    /// Write `EPR` with the toggle bits set so that `STAT_*`/`DTOG_*` end
    /// up at the requested `value`, without disturbing the `CTR_*` flags.
    fn write_epr(&self, endpoint: usize, toggle_mask: u32, value: u32) -> Result<(), ErrorCode> {
        let epr = self.endpoint(endpoint)?;
        let current = epr.get();
        let toggles = (current ^ value) & toggle_mask;
        epr.set((current & EPR_RW) | EPR_INVARIANT | toggles);
        Ok(())
    }

    pub fn configure_endpoint(
        &self,
        endpoint: usize,
        kind: EndpointType,
        buffers: EndpointBuffers,
    ) -> Result<(), ErrorCode> {
        let epr = self.endpoint(endpoint)?;
        self.set_tx_address(endpoint, buffers.tx_offset)?;
        self.set_tx_count(endpoint, 0)?;
        self.set_rx_address(endpoint, buffers.rx_offset)?;
        self.set_rx_buffer_size(endpoint, buffers.rx_size)?;
        let ep_type = match kind {
            EndpointType::Bulk => EPR::EP_TYPE::Bulk,
            EndpointType::Control => EPR::EP_TYPE::Control,
            EndpointType::Isochronous => EPR::EP_TYPE::Isochronous,
            EndpointType::Interrupt => EPR::EP_TYPE::Interrupt,
        };
        let rw = (ep_type + EPR::EA.val(endpoint as u32)).value;
        epr.set(EPR_INVARIANT | rw);
        Ok(())
    }

    pub fn set_tx_status(&self, endpoint: usize, status: EndpointStatus) -> Result<(), ErrorCode> {
        self.write_epr(
            endpoint,
            EPR::STAT_TX.val(0b11).value,
            EPR::STAT_TX.val(status as u32).value,
        )
    }

    pub fn set_rx_status(&self, endpoint: usize, status: EndpointStatus) -> Result<(), ErrorCode> {
        self.write_epr(
            endpoint,
            EPR::STAT_RX.val(0b11).value,
            EPR::STAT_RX.val(status as u32).value,
        )
    }

    pub fn clear_ctr_rx(&self, endpoint: usize) -> Result<(), ErrorCode> {
        let epr = self.endpoint(endpoint)?;
        epr.set((epr.get() & EPR_RW) | (1 << 7));
        Ok(())
    }

    pub fn clear_ctr_tx(&self, endpoint: usize) -> Result<(), ErrorCode> {
        let epr = self.endpoint(endpoint)?;
        epr.set((epr.get() & EPR_RW) | (1 << 15));
        Ok(())
    }

    /// Copy `data` into the endpoint's TX buffer and hand it to the host.
    pub fn write_packet(&self, endpoint: usize, data: &[u8]) -> Result<(), ErrorCode> {
        self.pma_write(self.tx_address(endpoint)?, data)?;
        self.set_tx_count(endpoint, data.len() as u16)?;
        self.set_tx_status(endpoint, EndpointStatus::Valid)
    }

    /// Copy the last received packet out and return its length.
    pub fn read_packet(&self, endpoint: usize, buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        let count = usize::from(self.rx_count(endpoint)?);
        if count > buffer.len() {
            return Err(ErrorCode::SIZE);
        }
        self.pma_read(self.rx_address(endpoint)?, &mut buffer[..count])?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    fn usb(rcc: &Rcc) -> (StaticRef<UsbRegisters>, StaticRef<PmaRegisters>, Usb<'_>) {
        let regs: StaticRef<UsbRegisters> = fake_registers();
        let pma: StaticRef<PmaRegisters> = fake_registers();
        (regs, pma, Usb::with_registers(regs, pma, rcc))
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(UsbRegisters, cntr), 0x40);
        assert_eq!(core::mem::offset_of!(UsbRegisters, btable), 0x50);
        assert_eq!(core::mem::size_of::<PmaRegisters>(), 2 * PMA_SIZE);
    }

    #[test]
    fn rx_count_blocks() {
        assert_eq!(rx_count_encoding(8), Ok(4 << 10));
        assert_eq!(rx_count_encoding(7), Ok(4 << 10));
        assert_eq!(rx_count_encoding(62), Ok(31 << 10));
        assert_eq!(rx_count_encoding(64), Ok(0x8000 | (1 << 10)));
        assert_eq!(rx_count_encoding(65), Ok(0x8000 | (2 << 10)));
        assert_eq!(rx_count_encoding(0), Err(ErrorCode::SIZE));
        assert_eq!(rx_count_encoding(513), Err(ErrorCode::SIZE));

        assert_eq!(rx_buffer_size(0x8000 | (1 << 10)), 64);
        assert_eq!(rx_buffer_size(4 << 10), 8);
    }

    #[test]
    fn pma_uses_double_stride() {
        let rcc = Rcc::with_registers(fake_registers());
        let (_, pma, usb) = usb(&rcc);

        assert_eq!(usb.pma_write(0x40, &[1, 2, 3]), Ok(()));
        assert_eq!(pma.words[0x20].get(), 0x0201);
        assert_eq!(pma.words[0x21].get(), 0x0003);

        let mut buf = [0u8; 3];
        assert_eq!(usb.pma_read(0x40, &mut buf), Ok(()));
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(usb.pma_write(0x41, &[1]), Err(ErrorCode::INVAL));
        assert_eq!(usb.pma_write(510, &[1, 2, 3]), Err(ErrorCode::INVAL));
    }

    #[test]
    fn endpoint_descriptors() {
        let rcc = Rcc::with_registers(fake_registers());
        let (regs, pma, usb) = usb(&rcc);
        let buffers = EndpointBuffers {
            tx_offset: 0x80,
            rx_offset: 0x40,
            rx_size: 64,
        };

        assert_eq!(usb.configure_endpoint(1, EndpointType::Bulk, buffers), Ok(()));
        // Descriptor 1 starts at PMA offset 8.
        assert_eq!(pma.words[4].get(), 0x80);
        assert_eq!(pma.words[6].get(), 0x40);
        assert_eq!(pma.words[7].get(), 0x8400);
        assert_eq!(regs.epr[1].read(EPR::EA), 1);
        assert!(regs.epr[1].matches_all(EPR::EP_TYPE::Bulk));

        pma.words[7].set(0x8400 | 5);
        let mut buf = [0u8; 8];
        assert_eq!(usb.read_packet(1, &mut buf), Ok(5));
        assert_eq!(usb.read_packet(1, &mut buf[..2]), Err(ErrorCode::SIZE));
    }

    #[test]
    fn status_bits_toggle() {
        let rcc = Rcc::with_registers(fake_registers());
        let (regs, _, usb) = usb(&rcc);

        regs.epr[0].write(EPR::STAT_TX.val(0b10) + EPR::EP_TYPE::Control);
        assert_eq!(usb.set_tx_status(0, EndpointStatus::Valid), Ok(()));
        // NAK -> VALID toggles only the low STAT_TX bit.
        assert_eq!(regs.epr[0].read(EPR::STAT_TX), 0b01);
        assert!(regs.epr[0].is_set(EPR::CTR_RX));
        assert!(regs.epr[0].is_set(EPR::CTR_TX));
        assert!(regs.epr[0].matches_all(EPR::EP_TYPE::Control));
    }

    #[test]
    fn endpoint_out_of_range() {
        let rcc = Rcc::with_registers(fake_registers());
        let (regs, pma, usb) = usb(&rcc);

        assert_eq!(usb.write_packet(NUM_ENDPOINTS, &[1, 2]), Err(ErrorCode::INVAL));
        assert_eq!(usb.read_packet(8, &mut [0; 4]), Err(ErrorCode::INVAL));
        assert_eq!(usb.set_tx_status(8, EndpointStatus::Valid), Err(ErrorCode::INVAL));
        assert_eq!(usb.set_rx_status(9, EndpointStatus::Nak), Err(ErrorCode::INVAL));
        assert_eq!(usb.clear_ctr_rx(8), Err(ErrorCode::INVAL));
        assert_eq!(usb.clear_ctr_tx(usize::MAX), Err(ErrorCode::INVAL));
        assert_eq!(usb.tx_address(8), Err(ErrorCode::INVAL));
        assert_eq!(usb.set_rx_buffer_size(8, 64), Err(ErrorCode::INVAL));
        assert!(pma.words.iter().all(|word| word.get() == 0));
        assert!(regs.epr.iter().all(|epr| epr.get() == 0));

        assert_eq!(usb.write_packet(7, &[1, 2]), Ok(()));
        assert_eq!(usb.clear_ctr_tx(7), Ok(()));
    }

    #[test]
    fn interrupt_flags_clear_on_zero() {
        let rcc = Rcc::with_registers(fake_registers());
        let (regs, _, usb) = usb(&rcc);

        usb.clear_interrupts(ISTR::RESET::SET.value);
        assert_eq!(regs.istr.get(), 0xFB00);
        usb.set_address(0x85);
        assert_eq!(regs.daddr.get(), 0x85);
    }
}
