use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;

use ccstate_detector::interactive_detector::{detect_idle_prompt, detect_interactive, InteractionMatch};
use ccstate_detector::screen_buffer::ScreenBuffer;
use ccstate_detector::screen_text::ScreenText;
use ccstate_detector::state_classifier::StateClassifier;
use ccstate_detector::state_detector::create_state_detector;
use ccstate_shared::logging::set_log_level;
use ccstate_shared::{log_cli, ClaudeState, Config, PromptMode};

/// --stream 時の読み込み単位
const STREAM_CHUNK_SIZE: usize = 4096;

/// 判定結果の出力形式
#[derive(Debug, Serialize)]
struct Report {
    state: ClaudeState,
    detail: String,
    mode: PromptMode,
    idle_prompt: bool,
    interaction: Option<InteractionMatch>,
}

impl Report {
    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        println!("{} {}", self.state.icon(), self.state);
        if !self.detail.is_empty() {
            println!("   detail: {}", self.detail);
        }
        println!("   mode:   {}", self.mode);
        if let Some(interaction) = &self.interaction {
            println!("   prompt: {}", interaction.interaction_type);
            for choice in &interaction.choices {
                println!("     - {choice}");
            }
        }
        Ok(())
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("ccstate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classify Claude Code screen text into idle/inputting/interactive/processing/completed")
        .arg(
            Arg::new("raw")
                .long("raw")
                .help("Render ANSI escape sequences before classifying (implied by --stream)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stream")
                .long("stream")
                .help("Feed input incrementally and print every state change")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .help("Screen rows used for rendering (only with --raw or --stream)")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .help("Screen columns used for rendering (only with --raw or --stream)")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file path (default: auto-detect)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .help("Log level (error, warn, info, debug, trace)")
                .value_name("LEVEL"),
        )
        .arg(
            Arg::new("input")
                .help("Input file ('-' or omitted reads stdin)")
                .value_name("INPUT"),
        )
}

fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = load_config(&matches)?;

    let json = matches.get_flag("json");
    let input = matches.get_one::<String>("input").map(String::as_str);

    if matches.get_flag("stream") {
        return run_stream(&config, input, json);
    }

    let data = read_input(input)?;
    let screen = screen_from_input(&data, matches.get_flag("raw"), &config);
    log_cli!(debug, "Classifying {} lines", screen.lines().len());

    let classifier = StateClassifier::from_config(&config)?;
    let report = build_report(&classifier, &screen, &config);
    report.print(json)
}

/// 設定ファイル → 環境変数 → コマンドライン引数の順に適用
fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(PathBuf::from(path))?,
        None => match Config::load_auto()? {
            Some((config, _path)) => config,
            None => Config::default(),
        },
    };

    config.apply_env_overrides();
    apply_cli_overrides(&mut config, matches);

    config.validate().context("Invalid configuration")?;
    set_log_level(config.effective_log_level());

    log_cli!(
        debug,
        "🔧 ccstate starting (screen {}x{}, level {})",
        config.screen.rows,
        config.screen.cols,
        config.effective_log_level()
    );

    Ok(config)
}

/// コマンドライン引数による上書き（指定のあるものだけ）
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) {
    if matches.get_flag("verbose") {
        config.logging.verbose = true;
    }
    if let Some(level) = matches.get_one::<String>("log_level") {
        config.logging.level = level.clone();
    }
    if let Some(&rows) = matches.get_one::<usize>("rows") {
        config.screen.rows = rows;
    }
    if let Some(&cols) = matches.get_one::<usize>("cols") {
        config.screen.cols = cols;
    }
}

fn read_input(input: Option<&str>) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    match input {
        None | Some("-") => {
            io::stdin()
                .read_to_end(&mut data)
                .context("Failed to read stdin")?;
        }
        Some(path) => {
            data = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
        }
    }
    Ok(data)
}

/// --raw なら端末描画を通し、そうでなければ描画済みテキストとして読む
fn screen_from_input(data: &[u8], raw: bool, config: &Config) -> ScreenText {
    let text = String::from_utf8_lossy(data);
    if raw {
        let mut buffer = ScreenBuffer::new(config.screen.rows, config.screen.cols);
        buffer.render(&text)
    } else {
        ScreenText::parse(&text)
    }
}

fn build_report(classifier: &StateClassifier, screen: &ScreenText, config: &Config) -> Report {
    let text = screen.text();
    let verdict = classifier.classify(&text);
    let interaction = if verdict.state == ClaudeState::Interactive {
        detect_interactive(screen.last_content_lines(config.detection.pattern_match_last_n_lines))
    } else {
        None
    };

    Report {
        state: verdict.state,
        detail: verdict.detail,
        mode: classifier.classify_mode(&text),
        idle_prompt: detect_idle_prompt(&text),
        interaction,
    }
}

/// 入力を少しずつ検出器へ流し、状態変化のたびに出力する
fn run_stream(config: &Config, input: Option<&str>, json: bool) -> Result<()> {
    let mut reader: Box<dyn Read> = match input {
        None | Some("-") => Box::new(io::stdin()),
        Some(path) => Box::new(
            std::fs::File::open(path).with_context(|| format!("Failed to open {path}"))?,
        ),
    };

    let mut detector = create_state_detector(config)?;
    let mut buf = [0u8; STREAM_CHUNK_SIZE];
    let mut changes = 0usize;

    loop {
        let n = reader.read(&mut buf).context("Failed to read input")?;
        if n == 0 {
            break;
        }
        if let Some(state) = detector.process_bytes(&buf[..n]) {
            changes += 1;
            let verdict = detector.current_verdict();
            if json {
                println!("{}", serde_json::to_string(verdict)?);
            } else {
                println!("{} {} {}", state.icon(), state, verdict.detail);
            }
        }
    }

    if config.logging.verbose {
        detector.debug_buffer();
    }

    // 一度も変化しなかった場合は最終状態を出す
    if changes == 0 {
        let screen = detector.screen_text();
        let text = screen.text();
        let verdict = detector.current_verdict().clone();
        let report = Report {
            state: verdict.state,
            detail: verdict.detail,
            mode: detector.current_mode(),
            idle_prompt: detect_idle_prompt(&text),
            interaction: detector.current_interaction().cloned(),
        };
        report.print(json)?;
    }

    log_cli!(debug, "👋 {changes} state change(s)");
    Ok(())
}
