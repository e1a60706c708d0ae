//! Chart widget lifecycle.
//!
//! One live widget at most, bound to a [`Viewport`]. The widget is rebuilt
//! from scratch whenever the price series identity changes and is torn down
//! before any rebuild and when the host goes away. While live it holds
//! exactly one resize subscription on the viewport.
//!
//! ```text
//!            data change (non-empty, host attached)
//!   Absent ─────────────────────────────────────────► Live ──┐ resize
//!     ▲                                                │ ◄────┘
//!     └──────── data change / detach / drop ───────────┘
//! ```

use market_core::{PriceBar, PriceSeries};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartTheme {
    pub background: Rgb,
    pub text: Rgb,
    pub grid: Rgb,
    pub border: Rgb,
    pub up: Rgb,
    pub down: Rgb,
}

impl ChartTheme {
    pub fn dark() -> Self {
        Self {
            background: Rgb::from_hex(0x111827),
            text: Rgb::from_hex(0x9ca3af),
            grid: Rgb::from_hex(0x1f2937),
            border: Rgb::from_hex(0x374151),
            up: Rgb::from_hex(0x10b981),
            down: Rgb::from_hex(0xef4444),
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::dark()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u16,
    pub height: u16,
    pub theme: ChartTheme,
}

/// The charting library behind the dashboard.
///
/// `dispose` consumes the widget, so nothing can be issued against a
/// disposed instance.
pub trait ChartEngine {
    type Widget;

    fn create(&mut self, options: &ChartOptions) -> Self::Widget;

    /// Bulk load; replaces whatever the widget showed.
    fn set_data(&mut self, widget: &mut Self::Widget, bars: &[PriceBar]);

    /// Fit the visible time range to the loaded data.
    fn fit_content(&mut self, widget: &mut Self::Widget);

    fn resize(&mut self, widget: &mut Self::Widget, width: u16);

    fn dispose(&mut self, widget: Self::Widget);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Host surface for the chart: a width and a resize-listener registry.
#[derive(Debug, Default)]
pub struct Viewport {
    width: u16,
    listeners: BTreeSet<ListenerId>,
    next_listener: u64,
}

impl Viewport {
    pub fn new(width: u16) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn subscribe(&mut self) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id);
        id
    }

    /// Idempotent; returns whether the listener was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Records a new width and returns the listeners to notify. Nobody is
    /// notified when the width did not change.
    pub fn set_width(&mut self, width: u16) -> Vec<ListenerId> {
        if width == self.width {
            return Vec::new();
        }
        self.width = width;
        self.listeners.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Absent → Live
    Created { revision: u64 },
    /// Live → Absent → Live
    Replaced { revision: u64 },
    /// Live → Absent
    Cleared,
}

struct LiveChart<W> {
    widget: W,
    listener: ListenerId,
    revision: u64,
}

pub struct ChartLifecycle<E: ChartEngine> {
    engine: E,
    height: u16,
    theme: ChartTheme,
    host: Option<Viewport>,
    live: Option<LiveChart<E::Widget>>,
    /// Last series handed to `sync`; identity is its revision.
    series: PriceSeries,
}

impl<E: ChartEngine> ChartLifecycle<E> {
    pub fn new(engine: E, height: u16) -> Self {
        Self {
            engine,
            height,
            theme: ChartTheme::dark(),
            host: None,
            live: None,
            series: PriceSeries::empty(),
        }
    }

    pub fn with_theme(mut self, theme: ChartTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.host.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn live_widget(&self) -> Option<&E::Widget> {
        self.live.as_ref().map(|live| &live.widget)
    }

    pub fn live_revision(&self) -> Option<u64> {
        self.live.as_ref().map(|live| live.revision)
    }

    /// Binds the chart to a host. Any previous host is released first. If
    /// the current series has data the widget is created right away.
    pub fn attach(&mut self, viewport: Viewport) -> Transition {
        let had_live = self.teardown();
        self.host = Some(viewport);
        self.build(had_live)
    }

    /// Tears down the widget and hands the host back.
    pub fn detach(&mut self) -> Option<Viewport> {
        self.teardown();
        self.host.take()
    }

    /// Reacts to the store's price series. Only an identity change does
    /// anything; re-syncing the same series is a no-op.
    pub fn sync(&mut self, series: &PriceSeries) -> Transition {
        if *series == self.series {
            return Transition::Unchanged;
        }
        self.series = series.clone();
        let had_live = self.teardown();
        self.build(had_live)
    }

    /// Forwards a host width change. The live widget is resized in place
    /// when its listener is among those notified.
    pub fn handle_viewport_resize(&mut self, width: u16) -> bool {
        let Some(host) = self.host.as_mut() else {
            return false;
        };
        let notified = host.set_width(width);
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if !notified.contains(&live.listener) {
            return false;
        }
        self.engine.resize(&mut live.widget, width);
        true
    }

    /// Live → Absent. Unsubscribes before disposing; returns whether a
    /// widget was live.
    pub fn teardown(&mut self) -> bool {
        let Some(live) = self.live.take() else {
            return false;
        };
        if let Some(host) = self.host.as_mut() {
            host.unsubscribe(live.listener);
        }
        self.engine.dispose(live.widget);
        tracing::debug!("Chart for series {} disposed", live.revision);
        true
    }

    fn build(&mut self, had_live: bool) -> Transition {
        let fallback = if had_live {
            Transition::Cleared
        } else {
            Transition::Unchanged
        };
        if self.series.is_empty() {
            return fallback;
        }
        let Some(host) = self.host.as_mut() else {
            return fallback;
        };

        let options = ChartOptions {
            width: host.width(),
            height: self.height,
            theme: self.theme.clone(),
        };
        let mut widget = self.engine.create(&options);
        self.engine.set_data(&mut widget, self.series.bars());
        self.engine.fit_content(&mut widget);
        let listener = host.subscribe();

        let revision = self.series.revision();
        tracing::debug!(
            "Chart for series {} created ({} bars, {}x{})",
            revision,
            self.series.len(),
            options.width,
            options.height
        );
        self.live = Some(LiveChart {
            widget,
            listener,
            revision,
        });

        if had_live {
            Transition::Replaced { revision }
        } else {
            Transition::Created { revision }
        }
    }
}

impl<E: ChartEngine> Drop for ChartLifecycle<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
