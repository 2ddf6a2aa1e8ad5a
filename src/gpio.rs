use embassy_time::Instant;
use embedded_hal::digital::InputPin;

use crate::ButtonIo;

/// 一个直接由GPIO输入引脚驱动的平台实现。
///
/// 它是最简单的 [`ButtonIo`]：时钟来自 `embassy-time`，
/// 原始电平来自一个 `InputPin`。
///
/// 引脚的上拉/下拉在构造引脚时已经确定，`configure_pin`
/// 保持默认的空实现；单引脚实现也不使用 `pin_id`。
pub struct GpioIo<P: InputPin> {
    pin: P,
}

impl<P: InputPin> GpioIo<P> {
    /// 创建一个新的GPIO平台实现。
    ///
    /// # 参数
    /// * `pin`: 一个实现了 `InputPin` 的GPIO引脚。
    ///   读取失败时电平按低处理。
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// 取回底层引脚。
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> ButtonIo for GpioIo<P> {
    fn now_ms(&mut self) -> u32 {
        Instant::now().as_millis() as u32
    }

    fn read_signal(&mut self, _pin_id: u8) -> bool {
        self.pin.is_high().unwrap_or_default()
    }
}
