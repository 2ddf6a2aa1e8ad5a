/// 定义按钮轮询逻辑的通用配置参数。
///
/// 这个结构体允许用户精细调整各种时间相关的行为，
/// 例如消抖窗口、连发间隔、计时锚点以及连发加速。
/// 所有时长与 `ButtonIo::now_ms` 同单位，均为毫秒。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// 消抖窗口时长。
    ///
    /// 在确认一次按下或释放边沿之后，此时间段内的任何电平变化都将被忽略，
    /// 以防止物理按键的机械抖动产生误报。设为 0 则完全不过滤。
    pub debounce_delay: u32,

    /// 按住期间两次保持节拍之间的基础间隔。
    ///
    /// 同时也是连击判定窗口：一次释放与下一次按下都落在此窗口内
    /// 才会被计为连击。设为 0 则每次轮询都产生保持节拍。
    pub repeat_delay: u32,

    /// 保持节拍的计时锚点。
    pub anchor: TimeAnchor,

    /// 连发加速策略，`None` 表示匀速连发。
    pub acceleration: Option<Acceleration>,
}

impl Default for ButtonConfig {
    /// 提供与 `reset()` 一致的默认配置。
    ///
    /// - 消抖: 50ms
    /// - 连发间隔: 0（不限速）
    /// - 锚点: 全局
    /// - 加速: 关闭
    fn default() -> Self {
        Self {
            debounce_delay: 50,
            repeat_delay: 0,
            anchor: TimeAnchor::Global,
            acceleration: None,
        }
    }
}

/// 引脚的输入模式。
///
/// 上拉输入意味着按下时引脚被拉到低电平，
/// 状态机会据此自动反转原始电平。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// 悬空或下拉输入，高电平视为按下。
    #[default]
    Input,
    /// 上拉输入，低电平视为按下。
    InputPullup,
}

impl PinMode {
    /// 该模式下原始电平是否需要反转。
    pub fn inverted(self) -> bool {
        matches!(self, PinMode::InputPullup)
    }
}

/// 保持节拍的计时锚点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeAnchor {
    /// 从最初按下的时刻起按节拍数线性推算，
    /// 第 n 次节拍的目标时刻为 `push + repeat_delay * n`。
    #[default]
    Global,
    /// 每次保持节拍重新锚定，节拍间隔恒为 `repeat_delay`。
    Local,
}

/// 连发加速策略。按住越久连发越快，有效间隔不低于 `threshold`。
///
/// 两种策略对外保证一致：有效节拍间隔不会低于阈值，
/// 释放后下一次按压恢复加速前的时序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Acceleration {
    /// 偏移式：每次保持节拍累加一个瞬态偏移量，
    /// 提前下一次节拍的到期时刻；释放时偏移清零。
    Offset {
        /// 每次节拍增加的偏移步长（全局锚点下按节拍数缩放）。
        value: u32,
        /// 有效节拍间隔的下限。
        threshold: u32,
    },
    /// 步进式：每 `period + 1` 次保持节拍将 `repeat_delay` 本身
    /// 减少 `delta`，直到阈值；释放时恢复按下时刻记录的原值。
    Step {
        /// 每次缩减的步长。
        delta: u32,
        /// `repeat_delay` 的下限。
        threshold: u32,
        /// 两次缩减之间间隔的节拍数。
        period: u32,
    },
}
