use std::io;
use std::sync::mpsc;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table};

use calcetto_terminal::model::{MatchStatus, Team};
use calcetto_terminal::rank::{metric_value, Metric};
use calcetto_terminal::season_stats::FormEntry;
use calcetto_terminal::state::{
    apply_delta, AppState, Delta, PlayerView, ProviderCommand, Screen,
};
use calcetto_terminal::store_feed::spawn_store_provider;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Leaderboard,
            KeyCode::Char('2') => self.state.screen = Screen::Players,
            KeyCode::Char('3') => self.state.screen = Screen::Matches,
            KeyCode::Char('4') => self.state.screen = Screen::Audit,
            KeyCode::Char('s') => self.state.cycle_metric(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_refresh(&mut self) {
        if self.cmd_tx.send(ProviderCommand::Refresh).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.push_log("[INFO] Refresh request sent");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_store_provider(tx, cmd_rx);

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| draw(f, &app.state))?;

        if event::poll(Duration::from_millis(120))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(6),
        ])
        .split(f.size());

    draw_header(f, state, chunks[0]);
    match state.screen {
        Screen::Leaderboard => draw_leaderboard(f, state, chunks[1]),
        Screen::Players => draw_players(f, state, chunks[1]),
        Screen::Matches => draw_matches(f, state, chunks[1]),
        Screen::Audit => draw_audit(f, state, chunks[1]),
    }
    draw_console(f, state, chunks[2]);

    if state.help_overlay {
        draw_help(f);
    }
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let status = if state.loading {
        "caricamento...".to_string()
    } else {
        let updated = state
            .snapshot_at
            .map(|at| format!(" | agg. {}", DateTime::<Local>::from(at).format("%H:%M")))
            .unwrap_or_default();
        format!(
            "{} giocatori | {} partite giocate | {} segnalazioni{updated}",
            state.players.len(),
            state.total_matches,
            state.audit.len()
        )
    };
    let title = Line::from(vec![
        Span::styled(
            " CALCETTO ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" [1] Classifiche  [2] Giocatori  [3] Partite  [4] Audit  [?] Aiuto  "),
        Span::styled(status, Style::default().fg(Color::DarkGray)),
    ]);
    let header = Paragraph::new(title).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_leaderboard(f: &mut Frame, state: &AppState, area: Rect) {
    let metric = state.metric();
    let secondary = metric.tie_break();

    let header_cells: Vec<Cell> = {
        let mut cells = vec![
            Cell::from("#"),
            Cell::from("Giocatore"),
            Cell::from(metric.label()),
        ];
        if let Some(key) = secondary {
            cells.push(Cell::from(key.label()));
        }
        cells
    };

    let rows: Vec<Row> = state
        .leaderboard_order()
        .into_iter()
        .filter_map(|player_id| {
            let view = state.view_for(player_id)?;
            let row = state.rows.iter().find(|r| r.player_id == player_id)?;
            let rank = state.rank_of(metric, player_id).unwrap_or(0);
            let mut cells = vec![
                Cell::from(format!("{rank}")),
                Cell::from(view.player.name.clone()),
                Cell::from(format_metric(metric_value(row, metric), metric)),
            ];
            if let Some(key) = secondary {
                cells.push(Cell::from(format_metric(metric_value(row, key), key)));
            }
            Some(Row::new(cells))
        })
        .collect();

    let widths = if secondary.is_some() {
        vec![
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(12),
        ]
    } else {
        vec![
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(12),
        ]
    };

    let table = Table::new(rows, widths)
        .header(Row::new(header_cells).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Classifica: {} [s] cambia metrica ", metric.label())),
        );
    f.render_widget(table, area);
}

fn draw_players(f: &mut Frame, state: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(30)])
        .split(area);

    let items: Vec<ListItem> = state
        .views
        .iter()
        .enumerate()
        .map(|(idx, view)| {
            let style = if idx == state.selected_player {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(view.player.name.clone()).style(style)
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Rosa [j/k] "),
    );
    f.render_widget(list, chunks[0]);

    if let Some(view) = state.views.get(state.selected_player) {
        draw_player_card(f, state, view, chunks[1]);
    }
}

fn draw_player_card(f: &mut Frame, state: &AppState, view: &PlayerView, area: Rect) {
    let id = view.player.id;
    let rank = |metric: Metric| -> String {
        state
            .rank_of(metric, id)
            .map(|r| format!("({r}°)"))
            .unwrap_or_default()
    };

    let form: String = view
        .form
        .iter()
        .map(|entry| match entry {
            FormEntry::Win => 'W',
            FormEntry::Draw => 'D',
            FormEntry::Loss => 'L',
            FormEntry::Absent => '·',
        })
        .collect();

    let s = &view.stats;
    let r = &view.ratios;
    let mut lines = vec![
        Line::from(Span::styled(
            view.player.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Forma (recenti prima): {form}")),
        Line::from(""),
        Line::from(format!(
            "Presenze {} {}   Punti {} {}   % Presenza {:.0}% {}",
            s.matches,
            rank(Metric::Matches),
            r.points,
            rank(Metric::Points),
            r.presence_pct,
            rank(Metric::PresencePct),
        )),
        Line::from(format!(
            "Gol {} {}   Assist {} {}   G+A {} {}",
            s.goals,
            rank(Metric::Goals),
            s.assists,
            rank(Metric::Assists),
            s.ga(),
            rank(Metric::GoalAssists),
        )),
        Line::from(format!(
            "Rateo Gol {:.2} {}   Rateo Assist {:.2} {}   Rateo G+A {:.2} {}",
            r.goal_ratio,
            rank(Metric::GoalRatio),
            r.assist_ratio,
            rank(Metric::AssistRatio),
            r.ga_ratio,
            rank(Metric::GaRatio),
        )),
        Line::from(format!(
            "V {} {}   N {} {}   P {} {}   Win {:.0}%",
            s.wins,
            rank(Metric::Wins),
            s.draws,
            rank(Metric::Draws),
            s.losses,
            rank(Metric::Losses),
            r.win_pct,
        )),
        Line::from(format!(
            "MVP {} {}   Candidature {} {}   MVP Rate {:.0}%",
            s.mvps,
            rank(Metric::Mvps),
            s.candidates,
            rank(Metric::Candidates),
            r.mvp_pct,
        )),
        Line::from(format!(
            "Turni Porta {} {}   Subiti {} {}   Rateo Subiti {:.2} {}",
            s.gk_turns,
            rank(Metric::GkTurns),
            s.gk_conceded,
            rank(Metric::GkConceded),
            r.conceded_ratio,
            rank(Metric::ConcededRatio),
        )),
        Line::from(format!(
            "Clean Sheet {} {}   Mini CS {} {}",
            s.clean_sheets,
            rank(Metric::CleanSheets),
            s.mini_clean_sheets,
            rank(Metric::MiniCleanSheets),
        )),
        Line::from(""),
    ];

    let h = &view.highlights;
    if h.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nessun highlight ancora.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Highlights",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )));
        let mut push = |label: &str, text: Option<String>| {
            if let Some(text) = text {
                lines.push(Line::from(format!("  {label}: {text}")));
            }
        };
        push(
            "Record gol",
            h.goals
                .as_ref()
                .map(|rec| format!("{} gol il {}", rec.value, rec.date.format("%d/%m/%Y"))),
        );
        push(
            "Record assist",
            h.assists
                .as_ref()
                .map(|rec| format!("{} assist il {}", rec.value, rec.date.format("%d/%m/%Y"))),
        );
        push(
            "Miglior G+A",
            h.goal_assists
                .as_ref()
                .map(|rec| format!("{} il {}", rec.value, rec.date.format("%d/%m/%Y"))),
        );
        push(
            "MVP",
            h.mvp
                .as_ref()
                .map(|rec| format!("partita del {}", rec.date.format("%d/%m/%Y"))),
        );
        push(
            "Mini CS record",
            h.mini_clean_sheet
                .as_ref()
                .map(|rec| format!("{} turni senza gol", rec.value)),
        );
        push(
            "The Wall",
            h.wall.as_ref().map(|rec| {
                format!(
                    "{} subiti su {} turni il {}",
                    rec.stat.gk_conceded,
                    rec.stat.gk_turns,
                    rec.date.format("%d/%m/%Y")
                )
            }),
        );
    }

    let card = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Scheda Giocatore "),
    );
    f.render_widget(card, area);
}

fn draw_matches(f: &mut Frame, state: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(30)])
        .split(area);

    let items: Vec<ListItem> = state
        .matches
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, m)| {
            let score = if m.status == MatchStatus::Scheduled {
                "VS".to_string()
            } else {
                format!("{} - {}", m.team_a_score, m.team_b_score)
            };
            let flag = if state.audit.iter().any(|a| a.match_id == m.id) {
                " !"
            } else {
                ""
            };
            let text = format!("{}  {}{}", m.date.format("%d/%m/%Y"), score, flag);
            let style = if idx == state.selected_match {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if m.status == MatchStatus::Scheduled {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(text).style(style)
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Partite [j/k] "),
    );
    f.render_widget(list, chunks[0]);

    if let Some(m) = state.current_match() {
        let title = if m.status == MatchStatus::Scheduled {
            " Anteprima ".to_string()
        } else {
            format!(" Risultato {} - {} ", m.team_a_score, m.team_b_score)
        };
        let rows: Vec<Row> = m
            .stats
            .iter()
            .map(|line| {
                let name = line
                    .player_name
                    .clone()
                    .or_else(|| {
                        state
                            .view_for(line.player_id)
                            .map(|v| v.player.name.clone())
                    })
                    .unwrap_or_else(|| format!("#{}", line.player_id));
                let mvp = if line.is_mvp { " ★" } else { "" };
                let team = match line.team {
                    Team::A => "A",
                    Team::B => "B",
                };
                Row::new(vec![
                    Cell::from(team),
                    Cell::from(format!("{name}{mvp}")),
                    Cell::from(dash_if_zero(line.goals)),
                    Cell::from(dash_if_zero(line.assists)),
                    Cell::from(dash_if_zero(line.gk_turns)),
                    Cell::from(if line.gk_turns > 0 {
                        line.gk_conceded.to_string()
                    } else {
                        "-".to_string()
                    }),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Min(14),
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(4),
            ],
        )
        .header(
            Row::new(vec!["Sq", "Giocatore", "Gol", "Ast", "TP", "Sub"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(table, chunks[1]);
    }
}

fn draw_audit(f: &mut Frame, state: &AppState, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    if state.audit.is_empty() {
        lines.push(Line::from(Span::styled(
            "Tutte le partite quadrano.",
            Style::default().fg(Color::Green),
        )));
    } else {
        for entry in &state.audit {
            let date = state
                .matches
                .iter()
                .find(|m| m.id == entry.match_id)
                .map(|m| m.date.format("%d/%m/%Y").to_string())
                .unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!("Partita {} del {date}", entry.match_id),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            for issue in &entry.issues {
                lines.push(Line::from(format!("  - {issue}")));
            }
        }
    }
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Audit Dati (consultivo, non blocca nulla) "),
    );
    f.render_widget(widget, area);
}

fn draw_console(f: &mut Frame, state: &AppState, area: Rect) {
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(4)
        .rev()
        .map(|line| Line::from(line.clone()))
        .collect();
    let console = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Console [r] aggiorna "),
    );
    f.render_widget(console, area);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(50, 40, f.size());
    let text = vec![
        Line::from("1-4  cambia schermata"),
        Line::from("s    cambia metrica classifica"),
        Line::from("j/k  selezione su/giù"),
        Line::from("r    aggiorna dallo store"),
        Line::from("?    chiudi aiuto"),
        Line::from("q    esci"),
    ];
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Aiuto "));
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn dash_if_zero(value: u32) -> String {
    if value > 0 {
        value.to_string()
    } else {
        "-".to_string()
    }
}

fn format_metric(value: f64, metric: Metric) -> String {
    match metric {
        Metric::GoalRatio
        | Metric::AssistRatio
        | Metric::GaRatio
        | Metric::ConcededRatio
        | Metric::GkRate => format!("{value:.2}"),
        Metric::PresencePct | Metric::WinPct | Metric::MvpPct => format!("{value:.0}%"),
        _ => format!("{value:.0}"),
    }
}
