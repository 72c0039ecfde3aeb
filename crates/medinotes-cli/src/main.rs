mod app;
mod io;
mod view;

use anyhow::Result;
use app::{Action, App, MENU_LABEL};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use medinotes_config::Config;
use medinotes_engine::editing::{Document, DragState, Mark, MarkSet, render_html};
use medinotes_engine::layout::MenuPlacement;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::cell::RefCell;
use std::rc::Rc;
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};
use view::{HANDLE_WIDTH, LineKind, ScreenLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Edit,
    Check,
    Html,
}

fn init_logging() {
    let log_path = Config::config_dir().join("medinotes.log");
    let file = log_path
        .parent()
        .map(fs::create_dir_all)
        .and_then(|_| fs::File::create(&log_path).ok());

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match file {
        Some(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // stderr would draw over the alternate screen
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let (mode, file_arg) = match args.as_slice() {
        [_, flag, file] if flag == "--check" => (Mode::Check, file),
        [_, flag, file] if flag == "--html" => (Mode::Html, file),
        [_, file] if !file.starts_with('-') => (Mode::Edit, file),
        _ => {
            eprintln!("Usage: {} [--check | --html] <notebook.json>", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Config path: {}", Config::config_path().display());
            process::exit(1);
        }
    };
    let path = config.resolve_document(&PathBuf::from(file_arg));

    if mode != Mode::Edit {
        match io::read_document(&path) {
            Ok(doc) if mode == Mode::Html => println!("{}", render_html(&doc)),
            Ok(doc) => println!(
                "{}: ok, {} blocks, {} positions",
                path.display(),
                doc.content().len(),
                doc.size()
            ),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
        return Ok(());
    }

    init_logging();
    log::info!("medinotes starting up with {}", path.display());

    let (doc, status) = match io::read_document(&path) {
        Ok(doc) => (doc, format!("Opened {}", path.display())),
        Err(io::LoadError::NotFound(_)) => {
            (Document::empty(), format!("New file {}", path.display()))
        }
        Err(e) => {
            // Never guess at a broken document
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let scroll_cache = Rc::new(RefCell::new(Default::default()));
    let mut app = App::new(path, doc, &config, scroll_cache);
    app.status = status;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        println!("{err:?}");
    }
    if app.is_dirty() {
        println!("Unsaved changes in {} were discarded", app.path.display());
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key) == Action::Quit {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => {
                let area = content_area(terminal.get_frame().area());
                app.handle_mouse(mouse, (area.x, area.y));
            }
            _ => {}
        }
    }
}

/// Where the document is drawn, inside the border
fn content_area(area: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)].as_ref())
        .split(area);
    Block::default().borders(Borders::ALL).inner(chunks[0])
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)].as_ref())
        .split(f.area());
    let area = content_area(f.area());
    app.resize(area.width, area.height);

    // Document panel
    let offset = app.viewport.offset() as usize;
    let selection = app.editor.selection();
    let visible: Vec<Line> = app
        .screen
        .lines
        .iter()
        .skip(offset)
        .take(area.height as usize)
        .map(|line| render_line(line, selection.from()..selection.to()))
        .collect();

    let title = format!(
        "{}{}",
        app.path.display(),
        if app.is_dirty() { " [+]" } else { "" }
    );
    f.render_widget(
        Paragraph::new(visible).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );

    // Drop indicator
    if let DragState::Dragging(session) = app.editor.drag_state()
        && let Some(target) = session.drop_target
    {
        let row = target.indicator.y - offset as f32;
        if row >= 0.0 && row < f32::from(area.height) {
            let indicator = Rect::new(area.x, area.y + row as u16, area.width, 1);
            f.render_widget(
                Paragraph::new("━".repeat(area.width as usize))
                    .style(Style::default().fg(Color::Cyan)),
                indicator,
            );
        }
    }

    // Floating formatting menu
    if let MenuPlacement::Shown { top, left, .. } = app.menu_placement()
        && top >= 0.0
    {
        let width = MENU_LABEL.chars().count() as u16;
        let menu = Rect::new(area.x + left.max(0.0) as u16, area.y + top as u16, width, 1)
            .intersection(area);
        f.render_widget(Clear, menu);
        f.render_widget(
            Paragraph::new(MENU_LABEL).style(Style::default().bg(Color::White).fg(Color::Black)),
            menu,
        );
    }

    // Dialog
    if let Some(title) = app.dialog_title() {
        let input = app.editor.dialog().input().unwrap_or_default().to_string();
        let popup = centered(area, 50, 3);
        f.render_widget(Clear, popup);
        f.render_widget(
            Paragraph::new(input).block(Block::default().borders(Borders::ALL).title(title)),
            popup,
        );
    } else if let Some((x, y)) = app.screen.cursor_cell(selection.head) {
        let row = y - offset as f32;
        if row >= 0.0 && row < f32::from(area.height) {
            f.set_cursor_position((area.x + x as u16, area.y + row as u16));
        }
    }

    // Status and help
    let help = Line::from(vec![
        Span::raw("^S save | ^Z/^Y undo/redo | ^B/M-i/^U/^D marks | ^K link | ^G image | "),
        Span::raw("M-h block type | ^T task | ^N new block | drag ⠿ to move | ^Q quit"),
    ]);
    f.render_widget(
        Paragraph::new(vec![Line::from(app.status.clone()), help]),
        chunks[1],
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_line(line: &ScreenLine, selected: std::ops::Range<usize>) -> Line<'static> {
    let block_style = match line.kind {
        LineKind::Heading(_) => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        LineKind::Code => Style::default().fg(Color::Green),
        LineKind::Rule | LineKind::Image => Style::default().fg(Color::DarkGray),
        LineKind::Text => Style::default(),
    };

    let handle_end = line
        .prefix
        .char_indices()
        .nth(HANDLE_WIDTH)
        .map_or(line.prefix.len(), |(index, _)| index);
    let (handle, prefix) = line.prefix.split_at(handle_end);
    let mut spans = vec![
        Span::styled(handle.to_string(), Style::default().fg(Color::DarkGray)),
        Span::styled(prefix.to_string(), Style::default().fg(Color::Blue)),
    ];

    let mut current: Option<(Style, String)> = None;
    for cell in &line.cells {
        let mut style = mark_style(block_style, &cell.marks);
        if selected.start < selected.end && selected.contains(&cell.pos) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        match current.as_mut() {
            Some((current_style, text)) if *current_style == style => text.push(cell.ch),
            _ => {
                if let Some((style, text)) = current.take() {
                    spans.push(Span::styled(text, style));
                }
                current = Some((style, cell.ch.to_string()));
            }
        }
    }
    if let Some((style, text)) = current {
        spans.push(Span::styled(text, style));
    }
    if !line.label.is_empty() {
        spans.push(Span::styled(line.label.clone(), block_style));
    }
    Line::from(spans)
}

fn mark_style(base: Style, marks: &MarkSet) -> Style {
    marks.iter().fold(base, |style, mark| match mark {
        Mark::Bold => style.add_modifier(Modifier::BOLD),
        Mark::Italic => style.add_modifier(Modifier::ITALIC),
        Mark::Underline => style.add_modifier(Modifier::UNDERLINED),
        Mark::Strike => style.add_modifier(Modifier::CROSSED_OUT),
        Mark::Code => style.fg(Color::Yellow),
        Mark::Subscript | Mark::Superscript => style.add_modifier(Modifier::DIM),
        Mark::TextColor(color) => style.fg(hex_color(color).unwrap_or(Color::Reset)),
        Mark::Highlight(color) => style.bg(hex_color(color).unwrap_or(Color::Yellow)),
        Mark::Link { .. } => style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    })
}

/// `#rgb` or `#rrggbb` to a terminal colour
fn hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Color::Rgb(digits.next()??, digits.next()??, digits.next()??))
        }
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}
