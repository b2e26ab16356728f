mod app;
mod ui;

pub use app::{App, EPISODE_COLUMNS, Pane};

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::controller::{Controller, ControllerSettings};
use crate::notify::ToastQueue;
use crate::player::CommandPlayer;

pub type TuiController = Controller<CatalogClient, ToastQueue, CommandPlayer>;

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub async fn run(config: Config) -> io::Result<()> {
    let catalog = CatalogClient::new(&config.catalog, &config.retry).map_err(io::Error::other)?;
    let mut controller = Controller::new(
        catalog,
        ToastQueue::default(),
        CommandPlayer::new(&config.player),
        ControllerSettings::from(&config),
    );

    // Set up panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let result = run_app(&mut terminal, &mut app, &mut controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    controller: &mut TuiController,
) -> io::Result<()> {
    loop {
        // Apply debounced queries and finished catalog calls
        controller.pump();
        controller.notifier_mut().expire(Instant::now());
        app.clamp_to(controller.session());
        app.tick();

        terminal.draw(|f| ui::draw(f, app, controller))?;

        // Handle input with timeout
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            handle_key(app, controller, key);
        }

        if app.should_quit {
            info!("quitting");
            break;
        }

        // Let spawned catalog and debounce tasks make progress
        tokio::task::yield_now().await;
    }

    Ok(())
}

fn handle_key(app: &mut App, controller: &mut TuiController, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('t') if ctrl => {
            let category = controller.toggle_category();
            app.selected_show = 0;
            app.selected_episode = 0;
            info!(category = category.as_str(), "category toggled");
            return;
        }
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return;
        }
        _ => {}
    }

    match app.focus {
        Pane::Search => match key.code {
            KeyCode::Esc if app.search_input.is_empty() => {
                app.should_quit = true;
            }
            KeyCode::Esc => {
                app.search_input.clear();
                controller.input(String::new());
            }
            KeyCode::Enter | KeyCode::Down if !controller.session().shows().is_empty() => {
                app.focus = Pane::Shows;
            }
            KeyCode::Char(c) if !ctrl => {
                app.search_input.push(c);
                controller.input(app.search_input.clone());
            }
            KeyCode::Backspace => {
                if app.search_input.pop().is_some() {
                    controller.input(app.search_input.clone());
                }
            }
            _ => {}
        },

        Pane::Shows => match key.code {
            KeyCode::Char('q') => {
                app.should_quit = true;
            }
            KeyCode::Esc | KeyCode::Char('/') => {
                app.focus = Pane::Search;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.select_previous_show();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.select_next_show(controller.session().shows().len());
            }
            KeyCode::Enter => {
                controller.select_show(app.selected_show);
                app.selected_episode = 0;
                app.focus = Pane::Episodes;
            }
            _ => {}
        },

        Pane::Episodes => {
            let visible = controller.session().visible_episodes().len();
            let columns = EPISODE_COLUMNS as isize;
            match key.code {
                KeyCode::Char('q') => {
                    app.should_quit = true;
                }
                KeyCode::Esc => {
                    app.focus = Pane::Shows;
                }
                KeyCode::Left | KeyCode::Char('h') => app.move_episode(-1, visible),
                KeyCode::Right | KeyCode::Char('l') => app.move_episode(1, visible),
                KeyCode::Up | KeyCode::Char('k') => app.move_episode(-columns, visible),
                KeyCode::Down | KeyCode::Char('j') => app.move_episode(columns, visible),
                KeyCode::Char(']') | KeyCode::PageDown => {
                    if controller.next_page() {
                        app.selected_episode = 0;
                    }
                }
                KeyCode::Char('[') | KeyCode::PageUp => {
                    if controller.previous_page() {
                        app.selected_episode = 0;
                    }
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let page = c.to_digit(10).unwrap_or(1) as usize;
                    if controller.set_page(page) {
                        app.selected_episode = 0;
                    }
                }
                KeyCode::Enter => {
                    controller.select_episode(app.selected_episode);
                }
                _ => {}
            }
        }
    }
}
