use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money;
use crate::models::TransactionType;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const BRAND_STYLE: Style = Style::new()
    .fg(Color::White)
    .bg(Color::Rgb(227, 30, 36))
    .add_modifier(Modifier::BOLD);

pub const STATUS_STYLE: Style = Style::new().fg(Color::Yellow);

pub const CURSOR: &str = "\u{2588}";

/// Colored amount (green for income, red for expense). The value shown is
/// always the absolute amount; color conveys the direction.
pub fn money_span(amount: f64, kind: TransactionType) -> Span<'static> {
    let style = match kind {
        TransactionType::Income => AMOUNT_POS_STYLE,
        TransactionType::Expense => AMOUNT_NEG_STYLE,
    };
    Span::styled(money(amount.abs()), style)
}

/// Colored signed amount, e.g. a balance.
pub fn balance_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// A box of at most `width` x `height` centered in `area`.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Masked echo for password inputs.
pub fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

pub enum ScreenAction {
    Continue,
    Quit,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ScreenAction;
}

/// Run an interactive ratatui screen. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_screen(screen: &mut dyn Screen) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| screen.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match screen.handle_key(key.code) {
                    ScreenAction::Quit => break Ok(()),
                    ScreenAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_span_uses_absolute_value() {
        let span = money_span(-250.0, TransactionType::Expense);
        assert_eq!(span.content, "\u{20b9}250.00");
        assert_eq!(span.style, AMOUNT_NEG_STYLE);
        assert_eq!(money_span(10.0, TransactionType::Income).style, AMOUNT_POS_STYLE);
    }

    #[test]
    fn test_balance_span_sign() {
        assert_eq!(balance_span(-5.0).style, AMOUNT_NEG_STYLE);
        assert_eq!(balance_span(0.0).style, AMOUNT_POS_STYLE);
    }

    #[test]
    fn test_wrap_text() {
        let (wrapped, lines) = wrap_text("alpha beta gamma", 6);
        assert_eq!(lines, 3);
        assert!(wrapped.starts_with("alpha"));
        assert_eq!(wrap_text("x", 0), ("x".to_string(), 1));
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 40, 10);
        let r = centered_rect(area, 20, 4);
        assert_eq!((r.x, r.y, r.width, r.height), (10, 3, 20, 4));
        let big = centered_rect(area, 100, 100);
        assert_eq!((big.width, big.height), (40, 10));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }
}
