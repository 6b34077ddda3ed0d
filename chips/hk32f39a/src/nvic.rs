// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Named constants for NVIC ids

#![allow(non_upper_case_globals)]

pub const WWDG: u32 = 0;
pub const PVD: u32 = 1;
pub const TAMPER: u32 = 2;
pub const RTC: u32 = 3;
pub const FLASH: u32 = 4;
pub const RCC: u32 = 5;
pub const EXTI0: u32 = 6;
pub const EXTI1: u32 = 7;
pub const EXTI2: u32 = 8;
pub const EXTI3: u32 = 9;
pub const EXTI4: u32 = 10;
pub const DMA1_Channel1: u32 = 11;
pub const DMA1_Channel2: u32 = 12;
pub const DMA1_Channel3: u32 = 13;
pub const DMA1_Channel4: u32 = 14;
pub const DMA1_Channel5: u32 = 15;
pub const DMA1_Channel6: u32 = 16;
pub const DMA1_Channel7: u32 = 17;
pub const ADC1_2: u32 = 18;
pub const USB_HP_CAN1_TX: u32 = 19;
pub const USB_LP_CAN1_RX0: u32 = 20;
pub const CAN1_RX1: u32 = 21;
pub const CAN1_SCE: u32 = 22;
pub const EXTI9_5: u32 = 23;
pub const TIM1_BRK: u32 = 24;
pub const TIM1_UP: u32 = 25;
pub const TIM1_TRG_COM: u32 = 26;
pub const TIM1_CC: u32 = 27;
pub const TIM2: u32 = 28;
pub const TIM3: u32 = 29;
pub const TIM4: u32 = 30;
pub const I2C1_EV: u32 = 31;
pub const I2C1_ER: u32 = 32;
pub const I2C2_EV: u32 = 33;
pub const I2C2_ER: u32 = 34;
pub const SPI1: u32 = 35;
pub const SPI2: u32 = 36;
pub const USART1: u32 = 37;
pub const USART2: u32 = 38;
pub const USART3: u32 = 39;
pub const EXTI15_10: u32 = 40;
pub const RTC_Alarm: u32 = 41;
pub const USBWakeUp: u32 = 42;
pub const TIM8_BRK: u32 = 43;
pub const TIM8_UP: u32 = 44;
pub const TIM8_TRG_COM: u32 = 45;
pub const TIM8_CC: u32 = 46;
pub const ADC3: u32 = 47;
pub const FSMC: u32 = 48;
pub const SDIO: u32 = 49;
pub const TIM5: u32 = 50;
pub const SPI3: u32 = 51;
pub const UART4: u32 = 52;
pub const UART5: u32 = 53;
pub const TIM6: u32 = 54;
pub const TIM7: u32 = 55;
pub const DMA2_Channel1: u32 = 56;
pub const DMA2_Channel2: u32 = 57;
pub const DMA2_Channel3: u32 = 58;
pub const DMA2_Channel4_5: u32 = 59;
// HK32F39A additions
pub const USART6: u32 = 60;
pub const QSPI: u32 = 61;
pub const SAI: u32 = 62;
pub const DCMI: u32 = 63;
pub const AES: u32 = 64;
pub const HASH: u32 = 65;
pub const RNG: u32 = 66;
pub const CAN2_TX: u32 = 67;
pub const CAN2_RX0: u32 = 68;
pub const CAN2_RX1: u32 = 69;
pub const CAN2_SCE: u32 = 70;
pub const COALU: u32 = 71;
pub const VC: u32 = 72;
pub const DMA2_Channel5: u32 = 73;

/// Number of external interrupt lines.
pub const IRQ_COUNT: usize = 74;

/// Line that serves a given EXTI input. EXTI5..9 and EXTI10..15 share one
/// line each; inputs past 15 are routed to PVD, RTC alarm and USB wake-up.
pub const fn exti_line_irq(line: u8) -> Option<u32> {
    match line {
        0 => Some(EXTI0),
        1 => Some(EXTI1),
        2 => Some(EXTI2),
        3 => Some(EXTI3),
        4 => Some(EXTI4),
        5..=9 => Some(EXTI9_5),
        10..=15 => Some(EXTI15_10),
        16 => Some(PVD),
        17 => Some(RTC_Alarm),
        18 => Some(USBWakeUp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_matches_f103_high_density() {
        assert_eq!(USART1, 37);
        assert_eq!(EXTI15_10, 40);
        assert_eq!(DMA2_Channel4_5, 59);
        assert_eq!(USART6 as usize, 60);
        assert_eq!(DMA2_Channel5 as usize, IRQ_COUNT - 1);
    }

    #[test]
    fn exti_lines_share_vectors() {
        assert_eq!(exti_line_irq(7), Some(EXTI9_5));
        assert_eq!(exti_line_irq(15), Some(EXTI15_10));
        assert_eq!(exti_line_irq(17), Some(RTC_Alarm));
        assert_eq!(exti_line_irq(19), None);
    }
}
