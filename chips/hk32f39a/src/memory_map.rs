// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! HK32F39A memory map.
//!
//! Every peripheral module builds its `StaticRef` instances from the
//! constants in here, so the whole address map can be audited in one place.

/// Main flash, 512 KiB.
pub const FLASH_BASE: usize = 0x0800_0000;
pub const FLASH_END: usize = 0x0807_FFFF;
pub const FLASH_SIZE: usize = FLASH_END - FLASH_BASE + 1;

/// Second information block.
pub const INFO_BLOCK0_BASE: usize = 0x1FFF_0000;
/// First information block.
pub const INFO_BLOCK1_BASE: usize = 0x1FFF_B000;
/// System memory holding the boot loader.
pub const SYSTEM_MEMORY_BASE: usize = 0x1FFF_F000;
/// Option bytes.
pub const OB_BASE: usize = 0x1FFF_F800;
/// Factory programmed unique device ID, 96 bits.
pub const UID_BASE: usize = 0x1FFF_F7E8;
/// Flash size in KiB, 16 bits.
pub const FLASHSIZE_BASE: usize = 0x1FFF_F7E0;

pub const SRAM_BASE: usize = 0x2000_0000;
pub const SRAM_SIZE: usize = 96 * 1024;
pub const SRAM_BB_BASE: usize = 0x2200_0000;

pub const PERIPH_BASE: usize = 0x4000_0000;
pub const PERIPH_BB_BASE: usize = 0x4200_0000;

pub const APB1PERIPH_BASE: usize = PERIPH_BASE;
pub const APB2PERIPH_BASE: usize = PERIPH_BASE + 0x0001_0000;
pub const AHBPERIPH_BASE: usize = PERIPH_BASE + 0x0001_8000;
pub const AHB2PERIPH_BASE: usize = 0x5000_0000;

// APB1
pub const TIM2_BASE: usize = APB1PERIPH_BASE + 0x0000;
pub const TIM3_BASE: usize = APB1PERIPH_BASE + 0x0400;
pub const TIM4_BASE: usize = APB1PERIPH_BASE + 0x0800;
pub const TIM5_BASE: usize = APB1PERIPH_BASE + 0x0C00;
pub const TIM6_BASE: usize = APB1PERIPH_BASE + 0x1000;
pub const TIM7_BASE: usize = APB1PERIPH_BASE + 0x1400;
pub const RTC_BASE: usize = APB1PERIPH_BASE + 0x2800;
pub const WWDG_BASE: usize = APB1PERIPH_BASE + 0x2C00;
pub const IWDG_BASE: usize = APB1PERIPH_BASE + 0x3000;
pub const SPI2_BASE: usize = APB1PERIPH_BASE + 0x3800;
pub const SPI3_BASE: usize = APB1PERIPH_BASE + 0x3C00;
pub const USART2_BASE: usize = APB1PERIPH_BASE + 0x4400;
pub const USART3_BASE: usize = APB1PERIPH_BASE + 0x4800;
pub const UART4_BASE: usize = APB1PERIPH_BASE + 0x4C00;
pub const UART5_BASE: usize = APB1PERIPH_BASE + 0x5000;
pub const I2C1_BASE: usize = APB1PERIPH_BASE + 0x5400;
pub const I2C2_BASE: usize = APB1PERIPH_BASE + 0x5800;
pub const USB_BASE: usize = APB1PERIPH_BASE + 0x5C00;
/// USB/CAN shared packet memory.
pub const USB_PMAADDR: usize = APB1PERIPH_BASE + 0x6000;
pub const CAN1_BASE: usize = APB1PERIPH_BASE + 0x6400;
pub const CAN2_BASE: usize = APB1PERIPH_BASE + 0x6800;
pub const BKP_BASE: usize = APB1PERIPH_BASE + 0x6C00;
pub const PWR_BASE: usize = APB1PERIPH_BASE + 0x7000;
pub const DAC_BASE: usize = APB1PERIPH_BASE + 0x7400;

// APB2
pub const AFIO_BASE: usize = APB2PERIPH_BASE + 0x0000;
pub const EXTI_BASE: usize = APB2PERIPH_BASE + 0x0400;
pub const GPIOA_BASE: usize = APB2PERIPH_BASE + 0x0800;
pub const GPIOB_BASE: usize = APB2PERIPH_BASE + 0x0C00;
pub const GPIOC_BASE: usize = APB2PERIPH_BASE + 0x1000;
pub const GPIOD_BASE: usize = APB2PERIPH_BASE + 0x1400;
pub const GPIOE_BASE: usize = APB2PERIPH_BASE + 0x1800;
pub const GPIOF_BASE: usize = APB2PERIPH_BASE + 0x1C00;
pub const GPIOG_BASE: usize = APB2PERIPH_BASE + 0x2000;
pub const ADC1_BASE: usize = APB2PERIPH_BASE + 0x2400;
pub const ADC2_BASE: usize = APB2PERIPH_BASE + 0x2800;
pub const TIM1_BASE: usize = APB2PERIPH_BASE + 0x2C00;
pub const SPI1_BASE: usize = APB2PERIPH_BASE + 0x3000;
pub const TIM8_BASE: usize = APB2PERIPH_BASE + 0x3400;
pub const USART1_BASE: usize = APB2PERIPH_BASE + 0x3800;
pub const ADC3_BASE: usize = APB2PERIPH_BASE + 0x3C00;
pub const SAI_BASE: usize = APB2PERIPH_BASE + 0x5800;
pub const SAI_BLOCK_A_BASE: usize = SAI_BASE + 0x004;
pub const SAI_BLOCK_B_BASE: usize = SAI_BASE + 0x024;
pub const USART6_BASE: usize = APB2PERIPH_BASE + 0x6000;
pub const VC_BASE: usize = APB2PERIPH_BASE + 0x6400;

// AHB
pub const SDIO_BASE: usize = AHBPERIPH_BASE + 0x0000;
pub const DMA1_BASE: usize = AHBPERIPH_BASE + 0x8000;
pub const DMA2_BASE: usize = AHBPERIPH_BASE + 0x8400;
pub const RCC_BASE: usize = AHBPERIPH_BASE + 0x9000;
pub const FLASH_R_BASE: usize = AHBPERIPH_BASE + 0xA000;
pub const CRC_BASE: usize = AHBPERIPH_BASE + 0xB000;

// AHB2
pub const DCMI_BASE: usize = AHB2PERIPH_BASE + 0x0005_0000;
pub const AES_BASE: usize = AHB2PERIPH_BASE + 0x0006_0000;
pub const HASH_BASE: usize = AHB2PERIPH_BASE + 0x0006_0400;
pub const RNG_BASE: usize = AHB2PERIPH_BASE + 0x0006_0800;
pub const COALU_BASE: usize = AHB2PERIPH_BASE + 0x0006_0C00;

// External memory interfaces
pub const FSMC_BANK1_1: usize = 0x6000_0000;
pub const FSMC_BANK1_2: usize = 0x6400_0000;
pub const FSMC_BANK1_3: usize = 0x6800_0000;
pub const FSMC_BANK1_4: usize = 0x6C00_0000;
pub const FSMC_BANK2: usize = 0x7000_0000;
pub const FSMC_BANK3: usize = 0x8000_0000;
pub const QSPI_MEM_BASE: usize = 0x9000_0000;
pub const FSMC_R_BASE: usize = 0xA000_0000;
pub const QSPI_R_BASE: usize = 0xA000_1000;

pub const DBGMCU_BASE: usize = 0xE004_2000;

/// Bit-band alias of a bit in the peripheral region.
pub const fn bitband_periph(addr: usize, bit: u32) -> usize {
    PERIPH_BB_BASE + (addr - PERIPH_BASE) * 32 + (bit as usize) * 4
}

/// Bit-band alias of a bit in SRAM.
pub const fn bitband_sram(addr: usize, bit: u32) -> usize {
    SRAM_BB_BASE + (addr - SRAM_BASE) * 32 + (bit as usize) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_layout() {
        assert_eq!(GPIOA_BASE, 0x4001_0800);
        assert_eq!(USART1_BASE, 0x4001_3800);
        assert_eq!(RCC_BASE, 0x4002_1000);
        assert_eq!(FLASH_R_BASE, 0x4002_2000);
        assert_eq!(DMA2_BASE, 0x4002_0400);
        assert_eq!(PWR_BASE, 0x4000_7000);
        assert_eq!(FLASH_SIZE, 512 * 1024);
    }

    #[test]
    fn bitband_aliases() {
        // RCC_CR.HSION
        assert_eq!(bitband_periph(RCC_BASE, 0), 0x4242_0000);
        // PWR_CR.DBP
        assert_eq!(bitband_periph(PWR_BASE, 8), 0x420E_0020);
        assert_eq!(bitband_sram(0x2000_0004, 3), 0x2200_008C);
    }
}
