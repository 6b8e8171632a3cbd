use anyhow::{bail, Context, Result};
use gigvoice::gigs::{FileStorage, Gig, GigForm};
use gigvoice::integration::{
    AppConfig, OrchestratorBuilder, OrchestratorCommand, OrchestratorEvent, OrchestratorHandle,
    TypedInput,
};
use gigvoice::speech::{ChannelRecognition, ConsoleSynthesis};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Voice Commands: \"services dikhao\" | \"plumber book karo\" | \"post gig\" | \"gigs show karo\" | \"delete\"
Console: :form name|mobile|service|wage|time  :del <id>  :list  :voice  :quit";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gigvoice=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!("Starting gigvoice");

    let config = AppConfig::load_default().context("Failed to load configuration")?;
    let data_dir = config.storage.resolved_data_dir();
    info!("Storing gigs in {}", data_dir.display());

    let (orchestrator, handle) = OrchestratorBuilder::new()
        .with_config(config)
        .with_storage(FileStorage::new(data_dir))
        .with_recognition(ChannelRecognition::new())
        .with_synthesis(ConsoleSynthesis)
        .build()?;
    let worker = orchestrator.start()?;

    println!("🎯 GigWorker Voice App");
    println!("{}", HELP);
    handle.send_command(OrchestratorCommand::ToggleVoice)?;

    let mut listings: Vec<Gig> = Vec::new();
    let mut input = TypedInput::new();
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        drain_events(&handle, &mut input, &mut listings);

        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            (":quit", _) => break,
            (":list", _) => print_listings(&listings)?,
            (":voice", _) => handle.send_command(OrchestratorCommand::ToggleVoice)?,
            (":del", id) => match id.parse::<u64>() {
                Ok(id) => handle.send_command(OrchestratorCommand::DeleteGig(id))?,
                Err(_) => eprintln!("Usage: :del <id>"),
            },
            (":form", fields) => match parse_form(fields) {
                Ok(form) => handle.send_command(OrchestratorCommand::SubmitForm(form))?,
                Err(e) => eprintln!("{}", e),
            },
            _ => input.submit(&handle, line).context("Orchestrator stopped")?,
        }
    }

    handle.shutdown(worker)?;
    Ok(())
}

fn drain_events(handle: &OrchestratorHandle, input: &mut TypedInput, listings: &mut Vec<Gig>) {
    while let Some(event) = handle.try_recv_event() {
        input.observe(&event);
        match event {
            OrchestratorEvent::Listings(gigs) => *listings = gigs,
            OrchestratorEvent::VoiceMode(on) => {
                println!("{}", if on { "🎙️ LIVE Listening..." } else { "🎤 Voice off" })
            }
            OrchestratorEvent::FormVisible(true) => {
                println!("📝 Post New Gig: :form name|mobile|service|wage|time")
            }
            OrchestratorEvent::FormRejected(reason) => eprintln!("{}", reason),
            _ => {}
        }
    }
}

fn print_listings(gigs: &[Gig]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "📋 All Gigs ({})", gigs.len())?;
    if gigs.is_empty() {
        writeln!(out, "No gigs yet. Voice bolo: \"plumber book karo\"!")?;
    }
    for gig in gigs.iter().take(10) {
        writeln!(out, "  [{}] {} - {}", gig.id, gig.work_title, gig.summary())?;
    }
    Ok(())
}

fn parse_form(fields: &str) -> Result<GigForm> {
    let parts: Vec<&str> = fields.split('|').map(str::trim).collect();
    let [name, mobile, work_title, wage, time] = parts.as_slice() else {
        bail!("Usage: :form name|mobile|service|wage|time");
    };
    Ok(GigForm {
        name: name.to_string(),
        mobile: mobile.to_string(),
        work_title: work_title.to_string(),
        wage: wage.to_string(),
        time: time.to_string(),
    })
}
