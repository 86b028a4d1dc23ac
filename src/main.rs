//! Interactive translator.
//!
//! Plain lines replace the input pane. Lines starting with `:` are commands;
//! `:help` lists them.
//!
//! Optional environment variables:
//! - TRANSLATE_API_URL (defaults to the public MyMemory endpoint)
//! - TRANSLATE_TIMEOUT_SECS (defaults to 15)
//! - AUTO_TRANSLATE_DEBOUNCE_MS (defaults to 600)
//! - MAX_INPUT_CHARS (defaults to 5000)
//! - PREFERENCES_FILE (defaults to data/preferences.json)
//! - SPEECH_COMMAND (defaults to espeak-ng)

use anyhow::Result;
use lingo_pane::clipboard::SystemClipboard;
use lingo_pane::config::Config;
use lingo_pane::i18n::{Language, LanguageRegistry};
use lingo_pane::preferences::JsonFileStore;
use lingo_pane::session::{Pane, Session, SessionEvent};
use lingo_pane::speech::CommandSynthesizer;
use lingo_pane::translation::Translator;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "\
Commands:
  <text>              replace the input text
  :translate          translate now
  :swap               swap languages and text
  :from <code>        set the source language
  :to <code>          set the target language
  :auto               toggle auto-translate
  :theme              toggle light/dark theme
  :speak [from|to]    read a pane aloud (default: to)
  :stop               stop speaking
  :copy [from|to]     copy a pane (default: to)
  :clear [from|to]    clear a pane (default: from)
  :voices             reload the voice list
  :langs [from|to]    list languages
  :show               show both panes
  :stats              translation statistics
  :quit               exit";

enum Command<'a> {
    Input(&'a str),
    Translate,
    Swap,
    From(&'a str),
    To(&'a str),
    Auto,
    Theme,
    Speak(Pane),
    Stop,
    Copy(Pane),
    Clear(Pane),
    Voices,
    Langs(Pane),
    Show,
    Stats,
    Help,
    Quit,
    Unknown(&'a str),
}

fn pane_arg(arg: &str, default: Pane) -> Option<Pane> {
    if arg.is_empty() {
        Some(default)
    } else {
        Pane::parse(arg)
    }
}

fn parse_command(line: &str) -> Command<'_> {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Input(line);
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "translate" | "t" => Command::Translate,
        "swap" => Command::Swap,
        "from" => Command::From(arg),
        "to" => Command::To(arg),
        "auto" => Command::Auto,
        "theme" => Command::Theme,
        "speak" => pane_arg(arg, Pane::Target)
            .map(Command::Speak)
            .unwrap_or(Command::Unknown(line)),
        "stop" => Command::Stop,
        "copy" => pane_arg(arg, Pane::Target)
            .map(Command::Copy)
            .unwrap_or(Command::Unknown(line)),
        "clear" => pane_arg(arg, Pane::Source)
            .map(Command::Clear)
            .unwrap_or(Command::Unknown(line)),
        "voices" => Command::Voices,
        "langs" => pane_arg(arg, Pane::Source)
            .map(Command::Langs)
            .unwrap_or(Command::Unknown(line)),
        "show" => Command::Show,
        "stats" => Command::Stats,
        "help" | "h" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => Command::Unknown(line),
    }
}

fn show(session: &Session) {
    let view = session.view();
    let direction = |pane| if session.is_right_to_left(pane) { " [rtl]" } else { "" };

    println!(
        "[{}{}] {}  ({})",
        view.prefs.source.name(),
        direction(Pane::Source),
        view.input,
        session.char_count()
    );
    println!(
        "[{}{}] {}",
        view.prefs.target.name(),
        direction(Pane::Target),
        view.output
    );
    if !view.status.is_empty() {
        println!("  {}", view.status);
    }
}

fn list_languages(pane: Pane) {
    let registry = LanguageRegistry::get();
    for code in Session::language_choices(pane) {
        if let Some(config) = registry.get_by_code(code) {
            println!("  {}", config.label());
        }
    }
}

fn set_language(session: &mut Session, pane: Pane, code: &str) {
    match Language::from_code(code) {
        Ok(language) => {
            match pane {
                Pane::Source => session.set_source(language),
                Pane::Target => session.set_target(language),
            }
            let side = if pane == Pane::Source { "From" } else { "To" };
            println!("{} set to {}", side, language.name());
        }
        Err(e) => println!("{}", e),
    }
}

/// Returns false when the session should end.
async fn handle_line(session: &mut Session, line: &str) -> bool {
    match parse_command(line) {
        Command::Input(text) => {
            session.set_input(text);
            println!("  {}", session.char_count());
        }
        Command::Translate => session.translate_now().await,
        Command::Swap => {
            session.swap().await;
            show(session);
        }
        Command::From(code) => set_language(session, Pane::Source, code),
        Command::To(code) => set_language(session, Pane::Target, code),
        Command::Auto => {
            let enabled = !session.preferences().auto_translate;
            println!("Auto-translate {}", if enabled { "on" } else { "off" });
            session.set_auto_translate(enabled).await;
        }
        Command::Theme => println!("Theme: {}", session.toggle_theme().as_str()),
        Command::Speak(pane) => {
            if let Err(e) = session.speak(pane) {
                println!("{}", e.notice());
            }
        }
        Command::Stop => session.stop_speaking(),
        Command::Copy(pane) => match session.copy(pane) {
            Ok(()) => println!("Copied to clipboard"),
            Err(e) => println!("{}", e.notice()),
        },
        Command::Clear(pane) => session.clear(pane),
        Command::Voices => println!("{} voices available", session.refresh_voices()),
        Command::Langs(pane) => list_languages(pane),
        Command::Show => show(session),
        Command::Stats => match serde_json::to_string_pretty(&session.metrics()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("Could not format statistics: {}", e),
        },
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
        Command::Unknown(line) => println!("Unknown command '{}'. Type :help", line),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they don't interleave with the panes
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingo_pane=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let translator = Arc::new(Translator::from_config(&config)?);
    let store = Arc::new(JsonFileStore::open(&config.preferences_file));
    info!("Preferences stored at {}", store.path().display());

    let (mut session, mut events) = Session::new(
        translator,
        store,
        Box::new(CommandSynthesizer::new(config.speech_command.clone())),
        Box::new(SystemClipboard::new()),
        config.debounce_window,
        config.max_input_chars,
    );

    println!("{}", HELP);
    show(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&mut session, &line).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(event) = events.recv() => {
                match event {
                    SessionEvent::Output { text, status } => {
                        println!("=> {}", text);
                        println!("  {}", status);
                    }
                    SessionEvent::Notice(message) => println!("{}", message),
                }
            }
        }
    }

    session.stop_speaking();
    info!("Session closed");
    Ok(())
}
