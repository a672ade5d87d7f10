//! The widget: one task, one loop, owning every piece of state.


use std::{future::Future, ops::ControlFlow, pin::pin, time::Duration};

use anyhow::Result;
use tokio::{
    select,
    sync::mpsc,
    time::{interval, sleep, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    blink::Blinker,
    drag::{DragController, Point, Size},
    input::InputEvent,
    output::Presenter,
    position::PositionStore,
    scheduler::{AutoSkipScheduler, SchedulerEvent},
    service::PlaybackService,
    sync::{PollSynchronizer, PollTrigger},
    utils::one_shot,
};

const HINT: &str = "Double-click to toggle auto-skip!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetConfig {
    pub poll_interval: Duration,
    pub skip_interval: Duration,
    /// Delay between an acknowledged skip and the early status refresh
    pub refresh_after_skip: Duration,
    pub viewport: Size,
    pub widget: Size,
    /// When to show the auto-skip hint after startup
    pub hint_delay: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            skip_interval: Duration::from_secs(30),
            refresh_after_skip: Duration::from_secs(1),
            viewport: Size::new(1920, 1080),
            widget: Size::new(320, 96),
            hint_delay: Duration::from_secs(3),
        }
    }
}

pub struct Widget<S, P, R> {
    config: WidgetConfig,
    service: S,
    presenter: R,
    drag: DragController<P>,
    sync: PollSynchronizer,
    auto_skip: AutoSkipScheduler,
    blinker: Blinker,
}

impl<S, P, R> Widget<S, P, R>
where
    S: PlaybackService,
    P: PositionStore,
    R: Presenter,
{
    /// Restore the saved position and show it. Must be called inside the runtime.
    pub fn new(config: WidgetConfig, service: S, store: P, mut presenter: R) -> Self {
        let drag = DragController::restore(store, config.viewport, config.widget);
        presenter.moved(drag.offset());
        Self {
            config,
            service,
            presenter,
            drag,
            sync: PollSynchronizer::new(),
            auto_skip: AutoSkipScheduler::new(config.skip_interval, config.refresh_after_skip),
            blinker: Blinker::new(),
        }
    }

    #[cfg(test)]
    pub fn with_blinker(mut self, blinker: Blinker) -> Self {
        self.blinker = blinker;
        self
    }

    /// Run until `shutdown` resolves or a quit event arrives.
    ///
    /// The input channel closing only stops input handling.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<InputEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let mut shutdown = pin!(shutdown);
        let mut poll_timer = interval(self.config.poll_interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut hint = Some(Box::pin(sleep(self.config.hint_delay)));
        let mut inputs_open = true;

        info!(config = ?self.config, "Widget started");
        loop {
            select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = poll_timer.tick() => {
                    self.sync.begin(&self.service, PollTrigger::Tick);
                }
                result = self.sync.completion() => {
                    for transition in self.sync.apply(result) {
                        self.presenter.transition(transition, self.sync.state());
                    }
                }
                event = self.auto_skip.next_event() => self.handle_scheduler(event),
                closed = self.blinker.next() => self.presenter.eyes_closed(closed),
                () = one_shot(&mut hint) => self.presenter.notify(HINT),
                event = inputs.recv(), if inputs_open => {
                    let Some(event) = event else {
                        debug!("Input closed, no more gestures");
                        inputs_open = false;
                        continue;
                    };
                    if self.handle_input(event).is_break() {
                        info!("Quit requested");
                        break;
                    }
                }
            }
        }
        self.teardown();
        Ok(())
    }

    fn handle_scheduler(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Fire => {
                let track_id = self.sync.cache().track_id();
                if self.auto_skip.on_fire(&self.service, track_id) {
                    self.presenter.skip_pulse();
                }
            }
            SchedulerEvent::SkipDone(result) => self.auto_skip.on_skip_result(result),
            SchedulerEvent::RefreshDue => {
                if !self.sync.begin(&self.service, PollTrigger::Forced) {
                    debug!("Early refresh dropped, a fetch is already running");
                }
            }
        }
    }

    fn handle_input(&mut self, event: InputEvent) -> ControlFlow<()> {
        match event {
            InputEvent::PointerDown(point) => self.press(point),
            InputEvent::TouchStart { touches } => {
                if let Some(&point) = touches.first() {
                    self.press(point);
                }
            }
            InputEvent::PointerMove(point) => self.follow(point),
            InputEvent::TouchMove { touches } => {
                if let Some(&point) = touches.first() {
                    self.follow(point);
                }
            }
            InputEvent::PointerUp | InputEvent::TouchEnd => {
                if self.drag.pointer_up() {
                    self.presenter.dragging(false);
                }
            }
            InputEvent::DoubleClick(point) => {
                if self.drag.hit(point) {
                    let transition = self.auto_skip.toggle();
                    debug!(config = ?self.auto_skip.config(), "Auto-skip toggled");
                    self.presenter.transition(transition, self.sync.state());
                }
            }
            InputEvent::Resize(size) => {
                if let Some(offset) = self.drag.resize_viewport(size) {
                    self.presenter.moved(offset);
                }
            }
            InputEvent::WidgetSize(size) => {
                if let Some(offset) = self.drag.resize_widget(size) {
                    self.presenter.moved(offset);
                }
            }
            InputEvent::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn press(&mut self, point: Point) {
        if self.drag.pointer_down(point) {
            self.presenter.dragging(true);
        }
    }

    fn follow(&mut self, point: Point) {
        if let Some(offset) = self.drag.pointer_move(point) {
            self.presenter.moved(offset);
        }
    }

    /// Nothing outstanding may reach the cache or the presenter after this.
    fn teardown(&mut self) {
        self.sync.cancel();
        self.auto_skip.shutdown();
        debug!("Widget stopped");
    }
}
