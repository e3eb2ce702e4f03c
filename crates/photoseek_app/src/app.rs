use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use client_logging::client_info;
use photoseek_client::ClientHandle;
use photoseek_core::{update, AppState, AppViewModel, Msg, ResultCardView};

use crate::config::AppConfig;
use crate::effects::{map_event, EffectRunner};
use crate::ui;

/// How long a transient notice stays on screen.
const NOTICE_DISMISS_AFTER: Duration = Duration::from_secs(4);

enum LoopEvent {
    Core(Msg),
    Input(String),
    Quit,
}

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let signed_in = config.bearer_token.is_some();
    let (client, client_events) = ClientHandle::new(config.api_settings())?;
    let runner = EffectRunner::new(client);

    let (tx, rx) = mpsc::channel::<LoopEvent>();

    // Pump IO events into the main loop.
    let pump_tx = tx.clone();
    thread::spawn(move || {
        for event in client_events.iter() {
            if pump_tx.send(LoopEvent::Core(map_event(event))).is_err() {
                break;
            }
        }
    });

    // Read user commands line by line.
    let input_tx = tx.clone();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = input_tx.send(LoopEvent::Quit);
                    break;
                }
                Ok(_) => {
                    let _ = input_tx.send(LoopEvent::Input(line.trim().to_string()));
                }
            }
        }
    });

    ui::print_help();
    let mut state = AppState::new();
    if signed_in {
        dispatch(&mut state, Msg::SignedIn, &runner, &tx);
    }

    while let Ok(event) = rx.recv() {
        match event {
            LoopEvent::Core(msg) => dispatch(&mut state, msg, &runner, &tx),
            LoopEvent::Input(line) => {
                if line == "/quit" {
                    break;
                }
                for msg in input_msgs(&line, &state.view()) {
                    dispatch(&mut state, msg, &runner, &tx);
                }
            }
            LoopEvent::Quit => break,
        }
    }

    client_info!("photoseek shutting down");
    Ok(())
}

fn dispatch(state: &mut AppState, msg: Msg, runner: &EffectRunner, tx: &mpsc::Sender<LoopEvent>) {
    let notice_before = state.view().notice.map(|banner| banner.seq);
    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;
    runner.run(effects);

    let view = state.view();
    if let Some(banner) = &view.notice {
        if notice_before != Some(banner.seq) {
            schedule_notice_dismiss(tx.clone(), banner.seq);
        }
    }
    if state.consume_dirty() {
        ui::render(&view);
    }
}

fn schedule_notice_dismiss(tx: mpsc::Sender<LoopEvent>, seq: u64) {
    thread::spawn(move || {
        thread::sleep(NOTICE_DISMISS_AFTER);
        let _ = tx.send(LoopEvent::Core(Msg::NoticeDismissed { seq }));
    });
}

fn input_msgs(line: &str, view: &AppViewModel) -> Vec<Msg> {
    if line.is_empty() {
        return Vec::new();
    }
    if let Some(rest) = line.strip_prefix("/save ") {
        return match result_at(view, rest) {
            Some(card) => vec![Msg::SaveRequested {
                result: card.result.clone(),
            }],
            None => {
                println!("No such result: {rest}");
                Vec::new()
            }
        };
    }
    if let Some(rest) = line.strip_prefix("/remove ") {
        return match rest.trim().parse::<u64>() {
            Ok(resource_id) => vec![Msg::RemoveRequested { resource_id }],
            Err(_) => {
                println!("Expected a saved photo id, got: {rest}");
                Vec::new()
            }
        };
    }
    if let Some(rest) = line.strip_prefix("/flag ") {
        return match result_at(view, rest) {
            Some(card) => vec![Msg::FlagSubmitted {
                source_url: card.result.source_url.clone(),
                provider: card.result.provider.clone(),
            }],
            None => {
                println!("No such result: {rest}");
                Vec::new()
            }
        };
    }
    match line {
        "/saved" => vec![Msg::SavedRefreshRequested],
        "/logout" => vec![Msg::SignedOut],
        "/help" => {
            ui::print_help();
            Vec::new()
        }
        _ if line.starts_with('/') => {
            println!("Unknown command: {line}");
            Vec::new()
        }
        _ => vec![Msg::QueryEdited(line.to_string()), Msg::SearchSubmitted],
    }
}

fn result_at<'a>(view: &'a AppViewModel, raw: &str) -> Option<&'a ResultCardView> {
    let index = raw.trim().parse::<usize>().ok()?;
    view.results.get(index.checked_sub(1)?)
}
