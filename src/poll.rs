use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};

use crate::{ButtonHandler, ButtonIo, PushButton};

/// 按钮的边沿语义事件。
///
/// 每次轮询都会出现的 IDLE/DELAY 状态过于嘈杂，不会进入通道。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Push { rapid_count: u32 },
    Hold { cycle_count: u32 },
    Release,
}

/// 把边沿事件发布到 `embassy-sync` 通道的回调实现。
///
/// 通道满时事件被丢弃，轮询循环不会因此阻塞。
pub struct EventSink<'a, M: RawMutex, const N: usize> {
    sender: Sender<'a, M, ButtonEvent, N>,
}

impl<'a, M: RawMutex, const N: usize> EventSink<'a, M, N> {
    pub fn new(sender: Sender<'a, M, ButtonEvent, N>) -> Self {
        Self { sender }
    }
}

impl<M: RawMutex, const N: usize> ButtonHandler for EventSink<'_, M, N> {
    fn on_push(&mut self, rapid_count: u32) {
        let _ = self.sender.try_send(ButtonEvent::Push { rapid_count });
    }

    fn on_hold(&mut self, cycle_count: u32) {
        let _ = self.sender.try_send(ButtonEvent::Hold { cycle_count });
    }

    fn on_release(&mut self) {
        let _ = self.sender.try_send(ButtonEvent::Release);
    }
}

/// 【后台驱动器】拥有状态机，以固定节奏驱动 `update()`。
pub struct ButtonPoller<D: ButtonIo, H: ButtonHandler> {
    button: PushButton<D, H>,
    interval: Duration,
}

impl<D: ButtonIo, H: ButtonHandler> ButtonPoller<D, H> {
    /// 创建一个新的轮询驱动器。
    ///
    /// `interval` 是两次 `update()` 之间的休眠时长，
    /// 应当明显小于消抖窗口与连发间隔。
    pub fn new(button: PushButton<D, H>, interval: Duration) -> Self {
        Self { button, interval }
    }

    /// 获取状态机的不可变引用
    pub fn button(&self) -> &PushButton<D, H> {
        &self.button
    }

    /// 获取状态机的可变引用
    pub fn button_mut(&mut self) -> &mut PushButton<D, H> {
        &mut self.button
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.button.update();
            Timer::after(self.interval).await;
        }
    }
}
