//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use super::app::{App, InputMode};
use crate::output::{human_bytes, rating_label};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(outer_chunks[1]);

    draw_tabs(frame, app, outer_chunks[0]);
    draw_items_pane(frame, app, pane_chunks[0]);
    draw_detail_pane(frame, app, pane_chunks[1]);

    match app.input_mode {
        InputMode::Normal => draw_status_bar(frame, app, outer_chunks[2]),
        InputMode::Prompt => draw_prompt(frame, app, outer_chunks[2]),
    }

    if app.show_help {
        draw_help_overlay(frame);
    }

    if let Some(error) = &app.error {
        draw_error_modal(frame, error);
    }
}

/// Draw the category tabs (top)
fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = app
        .tabs
        .iter()
        .map(|(kind, count)| Line::from(format!(" {} ({}) ", capitalize(kind), count)))
        .collect();

    let order = if app.sorted { " by rating " } else { " manual order " };
    let block = Block::default()
        .title(" shelf ")
        .title_bottom(Line::from(order).right_aligned())
        .borders(Borders::ALL);

    let tabs = Tabs::new(titles)
        .block(block)
        .select(app.tab_index)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        );

    frame.render_widget(tabs, area);
}

/// Draw the item list (left)
fn draw_items_pane(frame: &mut Frame, app: &App, area: Rect) {
    let max_len = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| {
            let name = truncate_chars(&item.name, max_len);
            let mut meta = rating_label(item);
            if !item.year.is_empty() {
                meta = format!("{}  ·  {}", item.year, meta);
            }
            if item.has_image() {
                meta.push_str("  ·  🖼");
            }

            ListItem::new(vec![
                Line::from(Span::raw(name)),
                Line::from(Span::styled(
                    meta,
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ])
        })
        .collect();

    let title = format!(" Items ({}) ", app.items.len());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    if !app.items.is_empty() {
        state.select(Some(app.item_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the detail pane (right)
fn draw_detail_pane(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Detail ").borders(Borders::ALL);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let content = if let Some(item) = app.current_item() {
        let year = if item.year.is_empty() {
            "-"
        } else {
            item.year.as_str()
        };
        let image = match &item.image {
            Some(data) if !data.is_empty() => format!("embedded ({})", human_bytes(data.len() as u64)),
            _ => "-".to_string(),
        };

        vec![
            Line::from(vec![Span::styled("Name: ", bold), Span::raw(&item.name)]),
            Line::from(""),
            Line::from(vec![Span::styled("Year: ", bold), Span::raw(year)]),
            Line::from(""),
            Line::from(vec![Span::styled("Rating: ", bold), Span::raw(rating_label(item))]),
            Line::from(Span::styled(
                rating_bar(item.display_rating()),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(vec![Span::styled("Image: ", bold), Span::raw(image)]),
            Line::from(""),
            Line::from(Span::styled(
                format!("id {}", item.id),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                "Nothing here yet. Press a to add an item.",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = match &app.status_message {
        Some(msg) => msg.clone(),
        None => "a:add  e:rename  y:year  +/-:rating  J/K:move  s:sort  d:del  ?:help  q:quit"
            .to_string(),
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Draw the prompt line at the bottom
fn draw_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = format!(
        "{}: ",
        app.prompt_kind.map(|k| k.label()).unwrap_or_default()
    );

    let line = Line::from(vec![
        Span::styled(prefix.clone(), Style::default().fg(Color::Yellow)),
        Span::raw(app.input.as_str()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + prefix.chars().count() as u16 + app.cursor as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

/// Centered popup area of at most `width` x `height`
fn popup_area(frame: &Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = popup_area(frame, 46, 21);
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  g/G         First / last item"),
        Line::from("  h/l, Tab    Switch category"),
        Line::from(""),
        Line::from("Items:"),
        Line::from("  a           Add item"),
        Line::from("  e           Rename item"),
        Line::from("  y           Set year"),
        Line::from("  +/-         Raise / lower rating"),
        Line::from("  J/K         Move item down / up"),
        Line::from("  d           Delete item"),
        Line::from(""),
        Line::from("  s           Toggle sort by rating"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Draw an error modal
fn draw_error_modal(frame: &mut Frame, error: &str) {
    let area = popup_area(frame, 60, 7);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(error.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// "★★★★★☆☆☆☆☆" for a 1..=10 rating
fn rating_bar(rating: i64) -> String {
    let filled = rating.clamp(0, 10) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(10 - filled))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_chars(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bar() {
        assert_eq!(rating_bar(3), "★★★☆☆☆☆☆☆☆");
        assert_eq!(rating_bar(42).chars().count(), 10);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("movies"), "Movies");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("Dune", 10), "Dune");
        assert_eq!(truncate_chars("Die Hard with a Vengeance", 8), "Die Har…");
    }
}
