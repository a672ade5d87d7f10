//! What the host surface gets to see.

use serde::Serialize;
use std::io::{self, Write};

use crate::{cache::PlaybackState, position::WidgetPosition};

/// Song names longer than this scroll
const SCROLL_THRESHOLD: usize = 25;

/// A named change in observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ConnectionLost,
    NeedsLogin,
    NoTrack,
    TrackChanged,
    StateRefreshed,
    AutoSkipEnabled,
    AutoSkipDisabled,
}

impl Transition {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConnectionLost => "connection-lost",
            Self::NeedsLogin => "needs-login",
            Self::NoTrack => "no-track",
            Self::TrackChanged => "track-changed",
            Self::StateRefreshed => "state-refreshed",
            Self::AutoSkipEnabled => "auto-skip-enabled",
            Self::AutoSkipDisabled => "auto-skip-disabled",
        }
    }
}

/// Consumer of everything the widget core decides.
pub trait Presenter {
    fn transition(&mut self, transition: Transition, state: &PlaybackState);
    fn moved(&mut self, offset: WidgetPosition);
    fn dragging(&mut self, active: bool);
    fn eyes_closed(&mut self, closed: bool);
    /// Transient scale effect after a skip, layered over the position.
    fn skip_pulse(&mut self);
    /// A self-expiring toast.
    fn notify(&mut self, message: &str);
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum Eyes {
    #[default]
    Open,
    Closed,
    Dancing,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Offset {
    x: i32,
    y: i32,
}

/// One line of output. The first four fields follow Waybar's custom module format.
#[derive(Serialize, Debug, Default)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    class: Vec<String>,
    offset: Offset,
    eyes: Eyes,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect: Option<&'static str>,
}

impl Frame {
    /// Format the frame as JSON and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format<T: Write>(&self, mut f: &mut T) -> io::Result<()> {
        serde_json::to_writer(&mut f, self)?;
        f.write_all(b"\n")?;
        f.flush()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Status {
    Playing,
    Paused,
    #[default]
    NoSong,
}

/// Everything needed to redraw the widget.
#[derive(Debug, Default)]
struct View {
    text: Option<String>,
    tooltip: Option<String>,
    last: Option<Transition>,
    status: Status,
    scroll: bool,
    error: bool,
    login: bool,
    dragging: bool,
    eyes_closed: bool,
    offset: WidgetPosition,
    // Cleared after every frame
    song_changed: bool,
    notification: Option<String>,
    effect: Option<&'static str>,
}

/// Writes one JSON [`Frame`] per visible change.
pub struct FramePresenter<W> {
    out: W,
    login_url: String,
    view: View,
}

impl<W: Write> FramePresenter<W> {
    pub fn new(out: W, login_url: String) -> Self {
        Self {
            out,
            login_url,
            view: View::default(),
        }
    }

    #[cfg(test)]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    fn frame(&mut self) -> Frame {
        let login_url = &self.login_url;
        let view = &mut self.view;
        let mut class = vec![match view.status {
            Status::Playing => "playing",
            Status::Paused => "paused",
            Status::NoSong => "no-song",
        }];
        for (on, name) in [
            (view.error, "error"),
            (view.login, "login"),
            (view.dragging, "dragging"),
            (view.scroll, "scroll-text"),
            (view.song_changed, "song-changed"),
        ] {
            if on {
                class.push(name);
            }
        }
        let eyes = if view.eyes_closed {
            Eyes::Closed
        } else if view.status == Status::Playing {
            Eyes::Dancing
        } else {
            Eyes::Open
        };
        let frame = Frame {
            text: view.text.as_deref().map(html_escape::encode_text).map(String::from),
            alt: view.last.map(|t| t.name().to_owned()),
            tooltip: view
                .tooltip
                .as_deref()
                .map(html_escape::encode_text)
                .map(String::from),
            class: class.into_iter().map(String::from).collect(),
            offset: Offset {
                x: view.offset.offset_x,
                y: view.offset.offset_y,
            },
            eyes,
            login_url: view.login.then(|| login_url.clone()),
            notification: view
                .notification
                .take()
                .as_deref()
                .map(html_escape::encode_text)
                .map(String::from),
            effect: view.effect.take(),
        };
        view.song_changed = false;
        frame
    }

    fn emit(&mut self) {
        let frame = self.frame();
        if let Err(e) = frame.format(&mut self.out) {
            tracing::warn!(?e, "Failed to write frame");
        }
    }

    fn show_message(&mut self, text: &str, tooltip: Option<&str>) {
        self.view.text = Some(text.to_owned());
        self.view.tooltip = tooltip.map(str::to_owned);
        self.view.status = Status::NoSong;
        self.view.scroll = text.chars().count() > SCROLL_THRESHOLD;
    }
}

impl<W: Write> Presenter for FramePresenter<W> {
    fn transition(&mut self, transition: Transition, state: &PlaybackState) {
        self.view.last = Some(transition);
        match transition {
            Transition::ConnectionLost => {
                self.show_message("Connection error", Some("Check your connection"));
                self.view.error = true;
            }
            Transition::NeedsLogin => {
                self.show_message("Please log in to your player", None);
                self.view.login = true;
                self.view.error = false;
            }
            Transition::NoTrack => {
                self.show_message("No song playing", None);
                self.view.error = false;
                self.view.login = false;
            }
            // Drawn together with the state refresh that follows
            Transition::TrackChanged => {
                self.view.song_changed = true;
                return;
            }
            Transition::StateRefreshed => {
                let artists = state.artists();
                self.view.text = Some(format!("{} - {artists}", state.track_name));
                self.view.tooltip = Some(format!("{}\n{artists}", state.track_name));
                self.view.status = if state.is_playing {
                    Status::Playing
                } else {
                    Status::Paused
                };
                self.view.scroll = [state.track_name.as_str(), artists.as_str()]
                    .iter()
                    .any(|line| line.chars().count() > SCROLL_THRESHOLD);
                self.view.error = false;
                self.view.login = false;
            }
            Transition::AutoSkipEnabled => {
                self.view.notification = Some("Auto-skip enabled!".to_owned());
            }
            Transition::AutoSkipDisabled => {
                self.view.notification = Some("Auto-skip disabled".to_owned());
            }
        }
        self.emit();
    }

    fn moved(&mut self, offset: WidgetPosition) {
        self.view.offset = offset;
        self.emit();
    }

    fn dragging(&mut self, active: bool) {
        self.view.dragging = active;
        self.emit();
    }

    fn eyes_closed(&mut self, closed: bool) {
        self.view.eyes_closed = closed;
        self.emit();
    }

    fn skip_pulse(&mut self) {
        self.view.effect = Some("skip-pulse");
        self.emit();
    }

    fn notify(&mut self, message: &str) {
        self.view.notification = Some(message.to_owned());
        self.emit();
    }
}

#[cfg(test)]
pub mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn presenter() -> FramePresenter<Vec<u8>> {
        FramePresenter::new(Vec::new(), "http://127.0.0.1:8888/login".to_owned())
    }

    fn lines(presenter: &FramePresenter<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(presenter.writer().clone())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn playing(name: &str) -> PlaybackState {
        PlaybackState {
            track_id: Some("A".to_owned()),
            track_name: name.to_owned(),
            artist_names: vec!["X".to_owned(), "Y".to_owned()],
            is_playing: true,
            ..PlaybackState::default()
        }
    }

    #[test]
    fn test_format() {
        let frame = Frame {
            text: Some("text".to_owned()),
            alt: Some("alt".to_owned()),
            tooltip: Some("tooltip".to_owned()),
            class: vec!["class".to_owned()],
            offset: Offset { x: 1, y: 2 },
            eyes: Eyes::Open,
            login_url: None,
            notification: None,
            effect: Some("skip-pulse"),
        };
        let mut buf = Vec::new();
        frame.format(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"text\":\"text\",\"alt\":\"alt\",\"tooltip\":\"tooltip\",\"class\":[\"class\"],\"offset\":{\"x\":1,\"y\":2},\"eyes\":\"open\",\"effect\":\"skip-pulse\"}\n"
        );
    }

    #[test]
    fn song_change_is_one_frame() {
        let mut p = presenter();
        let state = playing("Song");
        p.transition(Transition::TrackChanged, &state);
        p.transition(Transition::StateRefreshed, &state);
        p.transition(Transition::StateRefreshed, &state);
        let frames = lines(&p);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["text"], "Song - X, Y");
        assert_eq!(frames[0]["class"], json!(["playing", "song-changed"]));
        assert_eq!(frames[0]["eyes"], "dancing");
        assert_eq!(frames[1]["class"], json!(["playing"]));
    }

    #[test]
    fn login_url_only_while_required() {
        let mut p = presenter();
        p.transition(Transition::NeedsLogin, &PlaybackState::default());
        p.transition(Transition::StateRefreshed, &playing("Song"));
        let frames = lines(&p);
        assert_eq!(frames[0]["login_url"], "http://127.0.0.1:8888/login");
        assert_eq!(frames[0]["alt"], "needs-login");
        assert!(frames[1].get("login_url").is_none());
    }

    #[test]
    fn text_is_escaped_and_long_names_scroll() {
        let mut p = presenter();
        p.transition(
            Transition::StateRefreshed,
            &playing("<b>A rather long song title indeed</b>"),
        );
        let frames = lines(&p);
        assert!(frames[0]["text"].as_str().unwrap().starts_with("&lt;b&gt;"));
        assert_eq!(frames[0]["class"], json!(["playing", "scroll-text"]));
    }

    #[test]
    fn long_artist_line_scrolls_too() {
        let mut p = presenter();
        let mut state = playing("Song");
        state.artist_names = vec![
            "Somebody Famous".to_owned(),
            "Their Frequent Collaborator".to_owned(),
        ];
        p.transition(Transition::StateRefreshed, &state);
        p.transition(Transition::StateRefreshed, &playing("Song"));
        let frames = lines(&p);
        assert_eq!(frames[0]["class"], json!(["playing", "scroll-text"]));
        assert_eq!(frames[1]["class"], json!(["playing"]));
    }

    #[test]
    fn one_shots_do_not_stick() {
        let mut p = presenter();
        p.skip_pulse();
        p.notify("hello");
        p.moved(WidgetPosition::new(10, 20));
        let frames = lines(&p);
        assert_eq!(frames[0]["effect"], "skip-pulse");
        assert!(frames[1].get("effect").is_none());
        assert_eq!(frames[1]["notification"], "hello");
        assert!(frames[2].get("notification").is_none());
        assert_eq!(frames[2]["offset"], json!({"x": 10, "y": 20}));
    }

    #[test]
    fn blink_closes_dancing_eyes() {
        let mut p = presenter();
        p.transition(Transition::StateRefreshed, &playing("Song"));
        p.eyes_closed(true);
        p.eyes_closed(false);
        let frames = lines(&p);
        assert_eq!(frames[1]["eyes"], "closed");
        assert_eq!(frames[2]["eyes"], "dancing");
    }
}
