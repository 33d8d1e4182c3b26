//! Theme state with an explicit publish/subscribe hook.
//!
//! Styling consumers subscribe to the bus; theme changes restyle the
//! dashboard but never touch chart data. The bucket palette is fixed
//! across themes: expired is always red, closed on time green, nearing
//! deadline yellow, in progress blue.

use ratatui::style::Color;
use tokio::sync::watch;

use stats_common::SlaBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub kind: ThemeKind,
    pub text: Color,
    pub dimmed: Color,
    pub accent: Color,
    pub border: Color,
    /// Grey for the donut no-data state and skeleton charts.
    pub empty: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            kind: ThemeKind::Dark,
            text: Color::White,
            dimmed: Color::DarkGray,
            accent: Color::Cyan,
            border: Color::Gray,
            empty: Color::DarkGray,
        }
    }

    pub fn light() -> Self {
        Self {
            kind: ThemeKind::Light,
            text: Color::Black,
            dimmed: Color::Gray,
            accent: Color::Blue,
            border: Color::DarkGray,
            empty: Color::Gray,
        }
    }

    /// Fixed category-to-color mapping, identical in both themes.
    pub fn bucket_color(bucket: SlaBucket) -> Color {
        match bucket {
            SlaBucket::Expired => Color::Red,
            SlaBucket::ClosedOnTime => Color::Green,
            SlaBucket::Waiting => Color::Yellow,
            SlaBucket::InProgress => Color::Blue,
        }
    }

    /// Region series colors for the trend chart, cycled by index.
    pub fn series_color(index: usize) -> Color {
        const PALETTE: [Color; 8] = [
            Color::Cyan,
            Color::Magenta,
            Color::Green,
            Color::Yellow,
            Color::Blue,
            Color::Red,
            Color::LightCyan,
            Color::LightMagenta,
        ];
        PALETTE[index % PALETTE.len()]
    }
}

/// Publishes theme changes to any subscriber.
pub struct ThemeBus {
    tx: watch::Sender<Theme>,
}

impl ThemeBus {
    pub fn new(initial: Theme) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    pub fn toggle(&self) {
        let next = match self.tx.borrow().kind {
            ThemeKind::Dark => Theme::light(),
            ThemeKind::Light => Theme::dark(),
        };
        // Subscribers may come and go; a send with no receivers is fine.
        let _ = self.tx.send(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_kind_and_notifies_subscribers() {
        let bus = ThemeBus::new(Theme::dark());
        let mut rx = bus.subscribe();
        bus.toggle();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().kind, ThemeKind::Light);
        bus.toggle();
        assert_eq!(bus.current().kind, ThemeKind::Dark);
    }

    #[test]
    fn bucket_palette_is_fixed() {
        assert_eq!(Theme::bucket_color(SlaBucket::Expired), Color::Red);
        assert_eq!(Theme::bucket_color(SlaBucket::ClosedOnTime), Color::Green);
        assert_eq!(Theme::bucket_color(SlaBucket::Waiting), Color::Yellow);
        assert_eq!(Theme::bucket_color(SlaBucket::InProgress), Color::Blue);
    }
}
