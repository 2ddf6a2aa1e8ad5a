#![no_std]

pub mod config;
pub mod gpio;
pub mod poll;

pub use config::*;
use bitflags::bitflags;

use crate::config::{Acceleration, ButtonConfig, PinMode, TimeAnchor};

/// 一个trait，抽象了轮询按钮所需的平台能力：毫秒时钟与原始电平读取。
pub trait ButtonIo {
    /// 单调不减的毫秒计数器。允许回绕，内部所有比较都用回绕安全的减法。
    fn now_ms(&mut self) -> u32;
    /// 读取指定引脚的当前原始逻辑电平。
    fn read_signal(&mut self, pin_id: u8) -> bool;
    /// 应用引脚模式。仅在（重新）设置 id/mode 时调用一次，`update()` 中不会调用。
    fn configure_pin(&mut self, _pin_id: u8, _mode: PinMode) {}
}

/// 状态机在每次启用状态下的 `update()` 中恰好调用一个的观察者回调。
/// 默认实现全部为空操作，按需覆盖。
pub trait ButtonHandler {
    fn on_push(&mut self, _rapid_count: u32) {}
    fn on_hold(&mut self, _cycle_count: u32) {}
    fn on_release(&mut self) {}
    fn on_delay(&mut self) {}
    fn on_idle(&mut self) {}
}

/// 不处理任何事件的占位回调，适合只轮询 `state()` 的调用方。
pub struct NopHandler;

impl ButtonHandler for NopHandler {}

bitflags! {
    /// 按钮的可观测状态，位标志。
    ///
    /// `RAPID` 只会与 `PUSH` 组合出现；空标志位表示禁用。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ButtonState: u8 {
        const IDLE = 1 << 0;
        const PUSH = 1 << 1;
        const HOLD = 1 << 2;
        const RELEASE = 1 << 3;
        const DELAY = 1 << 4;
        const RAPID = 1 << 5;
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        ButtonState::IDLE
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ButtonState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ButtonState({=u8:b})", self.bits());
    }
}

pub struct PushButton<D: ButtonIo, H: ButtonHandler> {
    io: D,
    handler: H,
    config: ButtonConfig,
    pin_id: u8,
    pin_mode: PinMode,
    inverted: bool,
    enabled: bool,
    pushed: bool,
    push_timestamp: u32,
    release_timestamp: u32,
    hold_timestamp: u32,
    cycle_count: u32,
    rapid_count: u32,
    acceleration_offset: u32,
    stored_repeat_delay: u32,
    state: ButtonState,
}

impl<D: ButtonIo, H: ButtonHandler> PushButton<D, H> {
    /// 创建一个处于完全复位、禁用状态的按钮。
    pub fn new(io: D, handler: H) -> Self {
        Self {
            io,
            handler,
            config: ButtonConfig::default(),
            pin_id: 0,
            pin_mode: PinMode::Input,
            inverted: false,
            enabled: false,
            pushed: false,
            push_timestamp: 0,
            release_timestamp: 0,
            hold_timestamp: 0,
            cycle_count: 0,
            rapid_count: 0,
            acceleration_offset: 0,
            stored_repeat_delay: 0,
            state: ButtonState::IDLE,
        }
    }

    /// 创建并立即绑定引脚，等价于 `new` 之后调用 [`configure`](Self::configure)。
    pub fn with_pin(io: D, handler: H, pin_id: u8, mode: PinMode) -> Self {
        let mut button = Self::new(io, handler);
        button.configure(pin_id, mode);
        button
    }

    /// 绑定引脚并启用状态机。
    ///
    /// 在协作者上应用引脚模式，按模式推导电平反转，并复位全部运行时字段。
    pub fn configure(&mut self, pin_id: u8, mode: PinMode) {
        self.reset();
        self.pin_id = pin_id;
        self.pin_mode = mode;
        self.inverted = mode.inverted();
        self.io.configure_pin(pin_id, mode);
        self.enabled = true;
    }

    /// 推进状态机一步。由调用方以自身的轮询节奏反复调用。
    ///
    /// 返回本次计算得到的状态；启用时每次调用恰好触发一个回调，
    /// 禁用时不做任何事。
    pub fn update(&mut self) -> ButtonState {
        if !self.enabled {
            return self.state;
        }

        let now = self.io.now_ms();

        // 消抖窗口内不信任任何电平变化，按下与释放的抖动都在这里吸收。
        if self.in_debounce_window(now) {
            if self.pushed {
                self.state = ButtonState::DELAY;
                self.handler.on_delay();
            } else {
                self.state = ButtonState::IDLE;
                self.handler.on_idle();
            }
            return self.state;
        }

        let active = self.io.read_signal(self.pin_id) ^ self.inverted;

        if !self.pushed && !active {
            self.state = ButtonState::IDLE;
            self.handler.on_idle();
        } else if !self.pushed {
            // 新的按下。连击前置条件用更新前的时间戳判定：
            // 上一次释放发生在连发窗口打开之前。
            let released_fast =
                self.release_timestamp.wrapping_sub(self.push_timestamp) < self.config.repeat_delay;

            self.pushed = true;
            self.cycle_count += 1;
            self.push_timestamp = now;
            self.hold_timestamp = now;
            self.stored_repeat_delay = self.config.repeat_delay;
            self.state = ButtonState::PUSH;

            // 本次按下还要落在从上一次释放起算的连发窗口内才算连击。
            if released_fast
                && now.wrapping_sub(self.release_timestamp) < self.config.repeat_delay
            {
                self.rapid_count += 1;
                self.state |= ButtonState::RAPID;
            } else {
                self.rapid_count = 0;
            }

            self.handler.on_push(self.rapid_count);
        } else if !active {
            // 释放。连发计时与加速效果一并归还。
            self.pushed = false;
            self.cycle_count = 0;
            self.release_timestamp = now;
            self.acceleration_offset = 0;
            if let Some(Acceleration::Step { .. }) = self.config.acceleration {
                self.config.repeat_delay = self.stored_repeat_delay;
            }
            self.state = ButtonState::RELEASE;
            self.handler.on_release();
        } else if !self.in_repeat_window(now) {
            // 连发窗口已过，产生一次保持节拍。
            self.hold_timestamp = now;
            self.cycle_count += 1;
            self.state = ButtonState::HOLD;
            self.advance_acceleration();
            self.handler.on_hold(self.cycle_count);
        } else {
            self.state = ButtonState::DELAY;
            self.handler.on_delay();
        }

        self.state
    }

    // 仅在保持节拍上调用，此时 cycle_count 已自增。
    fn advance_acceleration(&mut self) {
        match self.config.acceleration {
            Some(Acceleration::Offset { value, threshold }) => {
                let headroom = self.config.repeat_delay.saturating_sub(threshold);
                match self.config.anchor {
                    // 本地锚点下窗口恒定，节拍间隔由累计偏移决定，
                    // 总偏移封顶在 repeat_delay - threshold。
                    TimeAnchor::Local => {
                        self.acceleration_offset =
                            self.acceleration_offset.saturating_add(value).min(headroom);
                    }
                    // 全局锚点下窗口按节拍数线性增长，节拍间隔由单步增量决定，
                    // 单步增量封顶在 repeat_delay - threshold。
                    TimeAnchor::Global => {
                        let step = value.saturating_mul(self.cycle_count).min(headroom);
                        self.acceleration_offset = self.acceleration_offset.saturating_add(step);
                    }
                }
            }
            Some(Acceleration::Step {
                delta,
                threshold,
                period,
            }) => {
                if self.cycle_count % period.saturating_add(1) == 0 {
                    if self.config.repeat_delay >= threshold.saturating_add(delta) {
                        self.config.repeat_delay -= delta;
                    } else {
                        self.config.repeat_delay = threshold;
                    }
                }
            }
            None => {}
        }
    }

    fn in_debounce_window(&self, now: u32) -> bool {
        // 最近一次确认的边沿：按下期间是 push，否则是 release。
        let last_edge = if self.pushed {
            self.push_timestamp
        } else {
            self.release_timestamp
        };
        now.wrapping_sub(last_edge) < self.config.debounce_delay
    }

    fn in_repeat_window(&self, now: u32) -> bool {
        let (anchor, window) = match self.config.anchor {
            TimeAnchor::Global => (
                self.push_timestamp,
                self.config.repeat_delay.saturating_mul(self.cycle_count),
            ),
            TimeAnchor::Local => (self.hold_timestamp, self.config.repeat_delay),
        };
        now.wrapping_sub(anchor).saturating_add(self.acceleration_offset) < window
    }

    /// 最近一次确认边沿之后是否仍处于消抖窗口内。
    pub fn is_debounce_delay(&mut self) -> bool {
        let now = self.io.now_ms();
        self.in_debounce_window(now)
    }

    /// 按住期间是否仍在等待下一次保持节拍。
    pub fn is_repeat_delay(&mut self) -> bool {
        let now = self.io.now_ms();
        self.in_repeat_window(now)
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// 停用状态机。状态被置为空标志位，时间戳与计数保持不变，
    /// 重新 `enable` 后从中断处继续。
    pub fn disable(&mut self) {
        self.enabled = false;
        self.state = ButtonState::empty();
    }

    /// 恢复全部运行时字段与可调参数到默认值（消抖 50ms，其余清零），
    /// 并停用状态机。
    pub fn reset(&mut self) {
        self.config = ButtonConfig::default();
        self.pin_id = 0;
        self.pin_mode = PinMode::Input;
        self.inverted = false;
        self.enabled = false;
        self.pushed = false;
        self.push_timestamp = 0;
        self.release_timestamp = 0;
        self.hold_timestamp = 0;
        self.cycle_count = 0;
        self.rapid_count = 0;
        self.acceleration_offset = 0;
        self.stored_repeat_delay = 0;
        self.state = ButtonState::IDLE;
    }

    /// 最近一次 `update()` 计算得到的状态。
    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 消抖后的按下状态。
    pub fn is_pushed(&self) -> bool {
        self.pushed
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// 覆盖由引脚模式推导出的电平反转。
    pub fn invert(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn id(&self) -> u8 {
        self.pin_id
    }

    /// 更换引脚，并在协作者上重新应用当前模式。
    pub fn set_id(&mut self, pin_id: u8) {
        self.pin_id = pin_id;
        self.io.configure_pin(self.pin_id, self.pin_mode);
    }

    pub fn mode(&self) -> PinMode {
        self.pin_mode
    }

    /// 更换引脚模式，重新推导电平反转并重新应用到协作者。
    pub fn set_mode(&mut self, mode: PinMode) {
        self.pin_mode = mode;
        self.inverted = mode.inverted();
        self.io.configure_pin(self.pin_id, self.pin_mode);
    }

    pub fn debounce_delay(&self) -> u32 {
        self.config.debounce_delay
    }

    pub fn set_debounce_delay(&mut self, delay_ms: u32) {
        self.config.debounce_delay = delay_ms;
    }

    pub fn repeat_delay(&self) -> u32 {
        self.config.repeat_delay
    }

    pub fn set_repeat_delay(&mut self, delay_ms: u32) {
        self.config.repeat_delay = delay_ms;
    }

    pub fn anchor(&self) -> TimeAnchor {
        self.config.anchor
    }

    pub fn set_anchor(&mut self, anchor: TimeAnchor) {
        self.config.anchor = anchor;
    }

    pub fn acceleration(&self) -> Option<Acceleration> {
        self.config.acceleration
    }

    pub fn set_acceleration(&mut self, acceleration: Option<Acceleration>) {
        self.config.acceleration = acceleration;
    }

    pub fn is_accelerated(&self) -> bool {
        self.config.acceleration.is_some()
    }

    pub fn push_time(&self) -> u32 {
        self.push_timestamp
    }

    pub fn release_time(&self) -> u32 {
        self.release_timestamp
    }

    pub fn hold_time(&self) -> u32 {
        self.hold_timestamp
    }

    /// 当前按压周期内的节拍数（按下算一次，每次保持节拍再加一），释放时清零。
    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// 连击计数。`1` 代表双击，`2` 代表三连击，依此类推。
    pub fn rapid_count(&self) -> u32 {
        self.rapid_count
    }

    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ButtonConfig) {
        self.config = config;
    }

    /// 获取底层平台驱动的不可变引用
    pub fn io(&self) -> &D {
        &self.io
    }

    /// 获取底层平台驱动的可变引用
    pub fn io_mut(&mut self) -> &mut D {
        &mut self.io
    }

    /// 获取事件回调的不可变引用
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// 获取事件回调的可变引用
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
