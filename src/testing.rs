//! Scripted stand-ins for the playback service and the host surface.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use anyhow::Result;

use futures::future::{FutureExt as _, LocalBoxFuture};
use reqwest::StatusCode;

use crate::{
    cache::PlaybackState,
    error::ServiceError,
    output::{Presenter, Transition},
    position::{PositionStore, WidgetPosition},
    service::{CurrentSong, PlaybackService, Track},
};

/// One scripted answer to `GET /current-song`.
#[derive(Debug, Clone)]
pub enum Reply {
    Nothing,
    Track(&'static str, bool),
    Unauthorized,
    /// Stands in for a transport failure, which is classified the same way
    Unreachable,
}

impl Reply {
    fn into_result(self) -> Result<CurrentSong, ServiceError> {
        match self {
            Self::Nothing => Ok(CurrentSong::NothingPlaying),
            Self::Track(id, is_playing) => Ok(CurrentSong::Playing(Track {
                id: id.to_owned(),
                name: format!("Song {id}"),
                artists: vec!["Artist".to_owned()],
                is_playing,
            })),
            Self::Unauthorized => Err(ServiceError::Unauthorized),
            Self::Unreachable => Err(ServiceError::Status(StatusCode::BAD_GATEWAY)),
        }
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub fetches: usize,
    pub fetches_in_flight: usize,
    pub max_fetches_in_flight: usize,
    pub skips: usize,
}

#[derive(Debug)]
struct Script {
    replies: VecDeque<Reply>,
    /// Repeated once `replies` runs dry
    last: Reply,
    latency: Duration,
    skip_ok: bool,
    counters: Counters,
}

/// A [`PlaybackService`] that answers from a script after a fixed latency.
#[derive(Debug, Clone)]
pub struct FakeService {
    script: Rc<RefCell<Script>>,
}

impl FakeService {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        let replies: VecDeque<_> = replies.into_iter().collect();
        let last = replies.back().cloned().unwrap_or(Reply::Nothing);
        Self {
            script: Rc::new(RefCell::new(Script {
                replies,
                last,
                latency: Duration::from_millis(50),
                skip_ok: true,
                counters: Counters::default(),
            })),
        }
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.script.borrow_mut().latency = latency;
        self
    }

    pub fn failing_skips(self) -> Self {
        self.script.borrow_mut().skip_ok = false;
        self
    }

    /// Replace the remaining script.
    pub fn answer(&self, replies: impl IntoIterator<Item = Reply>) {
        let mut script = self.script.borrow_mut();
        script.replies = replies.into_iter().collect();
        if let Some(last) = script.replies.back().cloned() {
            script.last = last;
        }
    }

    pub fn counters(&self) -> std::cell::Ref<'_, Counters> {
        std::cell::Ref::map(self.script.borrow(), |s| &s.counters)
    }
}

impl PlaybackService for FakeService {
    fn current_song(&self) -> LocalBoxFuture<'static, Result<CurrentSong, ServiceError>> {
        let script = Rc::clone(&self.script);
        async move {
            let (latency, reply) = {
                let mut guard = script.borrow_mut();
                let s = &mut *guard;
                let reply = match s.replies.pop_front() {
                    Some(r) => r,
                    None => s.last.clone(),
                };
                let c = &mut s.counters;
                c.fetches += 1;
                c.fetches_in_flight += 1;
                c.max_fetches_in_flight = c.max_fetches_in_flight.max(c.fetches_in_flight);
                (s.latency, reply)
            };
            tokio::time::sleep(latency).await;
            script.borrow_mut().counters.fetches_in_flight -= 1;
            reply.into_result()
        }
        .boxed_local()
    }

    fn skip_next(&self) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let (latency, ok) = {
            let mut s = self.script.borrow_mut();
            s.counters.skips += 1;
            (s.latency, s.skip_ok)
        };
        async move {
            tokio::time::sleep(latency).await;
            if ok {
                Ok(())
            } else {
                Err(ServiceError::Status(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
        .boxed_local()
    }

    fn login_url(&self) -> String {
        "http://fake/login".to_owned()
    }
}

/// Everything a [`RecordingPresenter`] was told.
#[derive(Debug, Default)]
pub struct Recorded {
    pub transitions: Vec<(Transition, PlaybackState)>,
    pub offsets: Vec<WidgetPosition>,
    pub dragging: Vec<bool>,
    pub blinks: usize,
    pub pulses: usize,
    pub notifications: Vec<String>,
}

impl Recorded {
    pub fn names(&self) -> Vec<&'static str> {
        self.transitions.iter().map(|(t, _)| t.name()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    pub recorded: Rc<RefCell<Recorded>>,
}

impl Presenter for RecordingPresenter {
    fn transition(&mut self, transition: Transition, state: &PlaybackState) {
        self.recorded
            .borrow_mut()
            .transitions
            .push((transition, state.clone()));
    }

    fn moved(&mut self, offset: WidgetPosition) {
        self.recorded.borrow_mut().offsets.push(offset);
    }

    fn dragging(&mut self, active: bool) {
        self.recorded.borrow_mut().dragging.push(active);
    }

    fn eyes_closed(&mut self, closed: bool) {
        if closed {
            self.recorded.borrow_mut().blinks += 1;
        }
    }

    fn skip_pulse(&mut self) {
        self.recorded.borrow_mut().pulses += 1;
    }

    fn notify(&mut self, message: &str) {
        self.recorded
            .borrow_mut()
            .notifications
            .push(message.to_owned());
    }
}

/// Keeps the position in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    saved: Option<WidgetPosition>,
}

impl MemoryPositionStore {
    #[must_use]
    pub const fn with(position: WidgetPosition) -> Self {
        Self {
            saved: Some(position),
        }
    }
}

impl PositionStore for MemoryPositionStore {
    fn load(&self) -> Result<Option<WidgetPosition>> {
        Ok(self.saved)
    }

    fn save(&mut self, position: WidgetPosition) -> Result<()> {
        self.saved = Some(position);
        Ok(())
    }
}
