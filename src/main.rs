//! Application entry point for voice-ledger.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (defaults on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Seed the category store and build the suggestion provider.
//! 5. Either analyze text from the command line / stdin, or (with the
//!    `voice` feature) listen for the hold-to-talk key until Ctrl-C.
//!
//! ```text
//! voice-ledger "Coffee 35; Lunch 68"          # print drafts
//! echo "Taxi 80" | voice-ledger --commit      # print drafts, save, dump ledger
//! voice-ledger --listen --locale zh-HK        # hold F9 and speak
//! ```

use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context};
use voice_ledger::{
    capture::{AlwaysGranted, CaptureSession, Unconfigured},
    config::{AppConfig, SpeechLanguage},
    drafts::Draft,
    pipeline::{new_shared_view, PipelineController, PipelineParts},
    store::{CategoryStore, MemoryCategoryStore, MemoryLedger},
    suggest::{ApiInterpreter, InterpreterProvider, SegmentingProvider, SuggestionProvider},
    taxonomy::{color_hex_for, Category, TaxonomyRegistry},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

const USAGE: &str = "\
usage: voice-ledger [--commit] [--locale CODE] [TEXT...]
       voice-ledger --listen [--commit] [--locale CODE]

  TEXT        transactions to analyze; read from stdin when omitted
  --commit    save every resolved draft to the ledger
  --listen    hold the configured key and speak (needs --features voice)
  --locale    speech locale, e.g. en-US, zh-HK";

#[derive(Debug, Default)]
struct CliArgs {
    commit: bool,
    listen: bool,
    locale: Option<String>,
    text: Vec<String>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Option<Self>> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "--commit" => parsed.commit = true,
                "--listen" => parsed.listen = true,
                "--locale" => {
                    let code = args.next().context("--locale needs a value")?;
                    if SpeechLanguage::from_code(&code).is_none() {
                        log::warn!("locale {code} is not in the supported list");
                    }
                    parsed.locale = Some(code);
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{USAGE}"),
                _ => parsed.text.push(arg),
            }
        }
        Ok(Some(parsed))
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn seed_categories() -> MemoryCategoryStore {
    let seeds = [
        ("Food", "🍜"),
        ("Transport", "🚕"),
        ("Shopping", "🛍️"),
        ("Bills", "💡"),
        ("Entertainment", "🎬"),
        ("Health", "💊"),
        ("Salary", "💰"),
    ];
    MemoryCategoryStore::with_categories(
        seeds
            .into_iter()
            .map(|(name, emoji)| Category::new(name, emoji, color_hex_for(name))),
    )
}

fn build_provider(config: &AppConfig) -> Arc<dyn SuggestionProvider> {
    let interpreter = ApiInterpreter::from_config(&config.interpreter);
    if !interpreter.is_enabled() {
        log::warn!("text interpretation is disabled in settings");
    }
    Arc::new(SegmentingProvider::new(InterpreterProvider::new(
        interpreter,
        &config.ledger.currency_code,
    )))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_drafts(drafts: &[Draft], taxonomy: &TaxonomyRegistry, currency_code: &str) {
    if drafts.is_empty() {
        println!("No drafts.");
        return;
    }
    for (index, draft) in drafts.iter().enumerate() {
        let category = draft
            .category_id
            .and_then(|id| taxonomy.display_name(&id))
            .unwrap_or_else(|| "(choose a category)".into());
        println!(
            "{:>3}. {:<18} {:<7} {:>10.2} {}  {}  {}",
            index + 1,
            category,
            draft.kind.title(),
            draft.amount,
            currency_code,
            draft.date.format("%Y-%m-%d"),
            draft.short_description,
        );
    }
}

// ---------------------------------------------------------------------------
// Text mode
// ---------------------------------------------------------------------------

async fn run_text(config: AppConfig, args: CliArgs) -> anyhow::Result<()> {
    let text = if args.text.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        input
    } else {
        args.text.join(" ")
    };

    let categories = Arc::new(seed_categories());
    let ledger = Arc::new(MemoryLedger::new());
    let session = CaptureSession::new(
        Arc::new(Unconfigured),
        Arc::new(Unconfigured),
        Arc::new(AlwaysGranted),
        args.locale.clone().unwrap_or_else(|| config.speech.locale.clone()),
    );

    let mut controller = PipelineController::new(
        new_shared_view(),
        PipelineParts {
            session,
            provider: build_provider(&config),
            categories: categories.clone(),
            ledger: ledger.clone(),
        },
        &config,
    );

    controller.submit_text(&text).await?;

    let mut taxonomy = TaxonomyRegistry::from_categories(categories.list_all()?);
    for category in controller.reconciler().unpersisted_categories() {
        taxonomy.insert(category.clone());
    }
    print_drafts(controller.drafts(), &taxonomy, &config.ledger.currency_code);

    if args.commit {
        let report = controller.commit_all()?;
        println!(
            "\nSaved {}, skipped {} without a category, {} failed.",
            report.committed, report.skipped, report.failed
        );
        println!("{}", serde_json::to_string_pretty(&ledger.entries())?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Voice mode
// ---------------------------------------------------------------------------

#[cfg(all(feature = "cpal", feature = "whisper", feature = "hotkey"))]
async fn run_voice(config: AppConfig, args: CliArgs) -> anyhow::Result<()> {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use voice_ledger::capture::{CpalCapture, WhisperRecognizer};
    use voice_ledger::config::AppPaths;
    use voice_ledger::hotkey::{parse_key, HoldListener};
    use voice_ledger::pipeline::{PipelineCommand, PipelineState};

    let model_path = config.speech.model_path(&AppPaths::new());
    let recognizer = WhisperRecognizer::load(
        &model_path,
        config.speech.use_gpu,
        config.capture.max_recording_secs,
    )?;
    log::info!("Whisper model loaded: {}", model_path.display());

    let categories = Arc::new(seed_categories());
    let ledger = Arc::new(MemoryLedger::new());
    let session = CaptureSession::new(
        Arc::new(CpalCapture::new()),
        Arc::new(recognizer),
        Arc::new(AlwaysGranted),
        args.locale.clone().unwrap_or_else(|| config.speech.locale.clone()),
    );

    let view = new_shared_view();
    let controller = PipelineController::new(
        Arc::clone(&view),
        PipelineParts {
            session,
            provider: build_provider(&config),
            categories: categories.clone(),
            ledger: ledger.clone(),
        },
        &config,
    );

    let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(64);
    let key = parse_key(&config.capture.hold_key).unwrap_or_else(|| {
        log::warn!("unknown hold key {:?}; using F9", config.capture.hold_key);
        rdev::Key::F9
    });
    let _listener = HoldListener::start(key, command_tx.clone())?;
    let pipeline = tokio::spawn(controller.run(command_rx));

    println!(
        "Hold {} and speak. Move the pointer more than {:.0}px away before releasing to cancel. Ctrl-C quits.",
        config.capture.hold_key, config.capture.cancel_radius
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(150));
    let mut last_phase = PipelineState::Idle;
    let mut last_transcript = String::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let snapshot = view
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone();

                if snapshot.phase == PipelineState::Listening && snapshot.transcript != last_transcript {
                    let marker = if snapshot.pending_cancel { " (release to cancel)" } else { "" };
                    println!("… {}{marker}", snapshot.transcript);
                }
                last_transcript = snapshot.transcript.clone();

                if snapshot.phase == last_phase {
                    continue;
                }
                last_phase = snapshot.phase;
                println!("[{}]", snapshot.phase.label());

                match snapshot.phase {
                    PipelineState::Reviewing => {
                        let mut taxonomy = TaxonomyRegistry::from_categories(categories.list_all()?);
                        for category in &snapshot.pending_categories {
                            taxonomy.insert(category.clone());
                        }
                        print_drafts(&snapshot.drafts, &taxonomy, &config.ledger.currency_code);
                        if args.commit {
                            command_tx.send(PipelineCommand::CommitAll).await?;
                        }
                    }
                    PipelineState::Idle => {
                        if let Some(report) = snapshot.last_commit {
                            println!("Saved {} ({} entries in ledger).", report.committed, ledger.entries().len());
                        }
                    }
                    PipelineState::Error => {
                        if let Some(message) = snapshot.error_message {
                            println!("{message}");
                        }
                        command_tx.send(PipelineCommand::AcknowledgeError).await?;
                    }
                    PipelineState::Listening | PipelineState::Analyzing => {}
                }
            }
        }
    }

    pipeline.abort();
    log::info!("voice-ledger shutting down");
    Ok(())
}

#[cfg(not(all(feature = "cpal", feature = "whisper", feature = "hotkey")))]
async fn run_voice(_config: AppConfig, _args: CliArgs) -> anyhow::Result<()> {
    bail!("voice capture is not compiled in; rebuild with `--features voice`")
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = CliArgs::parse(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4-5. Run
    rt.block_on(async move {
        if args.listen {
            run_voice(config, args).await
        } else {
            run_text(config, args).await
        }
    })
}
