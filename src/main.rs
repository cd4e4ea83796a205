use anyhow::Result;
use solace::client::RetryPolicy;
use solace::config::ServiceConfig;
use solace::context::ServiceContext;
use solace::messages::IntensityStage;
use solace::session::{
    ChatEvent, ChatHandle, ChatPipeline, ConversationController, SessionArchive, UserIdentity,
};
use solace::store::{namespaces, UserProfile};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Solace wellness companion");

    let config = ServiceConfig::from_env();
    let ctx = ServiceContext::new(config)?;

    let profile = load_or_create_profile(&ctx)?;
    let identity = UserIdentity::new(profile.display_name.clone(), profile.handle.clone());

    let controller = ConversationController::new(identity.clone());
    println!("{}", controller.transcript().opening().content);
    println!("Select your distress stage: 1 Manageable, 2 Moderate, 3 Heavy");

    let archive = SessionArchive::load(Arc::clone(&ctx.store));
    let (pipeline, handle) = ChatPipeline::new(
        controller,
        archive,
        Arc::clone(&ctx.model),
        RetryPolicy::chat(),
    );
    let worker = pipeline.start();

    let mut triaged = false;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" => break,
            "/save" => {
                if let Err(e) = handle.archive() {
                    println!("! {}", e.user_message());
                    continue;
                }
                if matches!(drain_until_settled(&handle)?, ChatEvent::Archived { .. }) {
                    triaged = false;
                    println!("Select your distress stage: 1 Manageable, 2 Moderate, 3 Heavy");
                }
            }
            #[cfg(feature = "audio-io")]
            "/voice" => run_voice_session(&ctx, &identity)?,
            _ if !triaged => {
                let stage = match input {
                    "1" => IntensityStage::Stage1,
                    "2" => IntensityStage::Stage2,
                    "3" => IntensityStage::Stage3,
                    _ => {
                        println!("Please answer 1, 2 or 3 first.");
                        continue;
                    }
                };
                if let Err(e) = handle.triage(stage) {
                    println!("! {}", e.user_message());
                    continue;
                }
                if matches!(
                    drain_until_settled(&handle)?,
                    ChatEvent::TurnComplete { .. } | ChatEvent::TurnFailed { .. }
                ) {
                    triaged = true;
                }
            }
            text => {
                if let Err(e) = handle.submit(text) {
                    println!("! {}", e.user_message());
                    continue;
                }
                drain_until_settled(&handle)?;
            }
        }
    }

    let _ = handle.shutdown();
    let _ = worker.join();
    Ok(())
}

fn load_or_create_profile(ctx: &ServiceContext) -> Result<UserProfile> {
    if let Some(profile) = ctx.store.read::<UserProfile>(namespaces::PROFILE)? {
        return Ok(profile);
    }

    print!("What should I call you? ");
    io::stdout().flush()?;
    let mut name = String::new();
    io::stdin().read_line(&mut name)?;
    let name = name.trim();
    let name = if name.is_empty() { "there" } else { name };

    let handle = name.to_lowercase().replace(char::is_whitespace, "_");
    let profile = UserProfile::new(name, handle, "");
    ctx.store.write(namespaces::PROFILE, &profile)?;
    Ok(profile)
}

/// Print events until the in-flight command settles, returning the
/// settling event
fn drain_until_settled(handle: &ChatHandle) -> Result<ChatEvent> {
    loop {
        match handle.recv_event()? {
            ChatEvent::TurnStarted { .. } => {
                println!("…");
            }
            ChatEvent::SessionDeleted { .. } => {}
            ChatEvent::Shutdown => {
                anyhow::bail!("chat pipeline shut down unexpectedly");
            }
            event => {
                match &event {
                    ChatEvent::TurnComplete { message } => println!("{}", message.content),
                    ChatEvent::TurnFailed { message, error } => {
                        println!("{}", message.content);
                        println!("! {}", error);
                    }
                    ChatEvent::Rejected { reason } => println!("! {}", reason),
                    ChatEvent::Archived { session } => println!("Archived: {}", session.summary),
                    ChatEvent::ArchiveFailed { error } => println!("! {}", error),
                    _ => {}
                }
                return Ok(event);
            }
        }
    }
}

#[cfg(feature = "audio-io")]
fn run_voice_session(ctx: &ServiceContext, identity: &UserIdentity) -> Result<()> {
    use solace::live::{LiveEvent, LiveSession};
    use solace::session::build_system_instruction;

    let instruction = build_system_instruction(identity, None);
    let mut session = match LiveSession::start(&ctx.config, &instruction) {
        Ok(session) => session,
        Err(e) => {
            println!("! {}", e.user_message());
            return Ok(());
        }
    };

    println!("Voice session active. Press Enter to stop.");
    let mut discard = String::new();
    io::stdin().read_line(&mut discard)?;

    while let Some(event) = session.try_recv_event() {
        if let LiveEvent::Notice { message } = event {
            println!("! {}", message);
        }
    }
    session.stop();
    println!("Voice session ended.");
    Ok(())
}
