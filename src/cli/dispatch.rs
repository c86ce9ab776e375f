use super::commands::{Cli, Commands, DecisionArg, ProbeCommands};
use anyhow::{Context, Result, bail};
use boltconsent::backend::MemoryBackend;
use boltconsent::config::EngineConfig;
use boltconsent::consent::signals::consent_update_event;
use boltconsent::consent::{ConsentDecision, ConsentSignalState};
use boltconsent::engine::{Collaborators, ConsentEngine};
use boltconsent::interception::DenyList;
use boltconsent::observability::create_observer;
use boltconsent::page::cookies::cookie_write_name;
use boltconsent::page::document::Region;
use boltconsent::page::{CookieJar, Element, Page};
use boltconsent::ui::{DocumentBanner, style};
use std::fmt::Write as _;
use std::sync::Arc;

const DEMO_TAG_SCRIPT: &str = "https://www.googletagmanager.com/gtm.js?id=GTM-DEMO";
const LATE_SCRIPT: &str = "https://connect.facebook.net/en_US/fbevents.js";

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Probe { probe_command } => {
            println!("{}", probe(&config, &probe_command));
            Ok(())
        }
        Commands::Signals { decision } => {
            println!("{}", render_signals(&decision)?);
            Ok(())
        }
        Commands::Simulate {
            hostname,
            decision,
            offline,
        } => {
            let engine = simulate(config, &hostname, decision, offline).await?;
            println!("{}", render_posture(&engine));
            Ok(())
        }
    }
}

fn probe(config: &EngineConfig, command: &ProbeCommands) -> String {
    let deny_list = DenyList::with_extra(&config.deny_list.scripts, &config.deny_list.cookies);
    match command {
        ProbeCommands::Script { url } => {
            format!("{}  {url}", style::verdict(deny_list.matches_script(url)))
        }
        ProbeCommands::Cookie { write } => format!(
            "{}  {}",
            style::verdict(deny_list.matches_cookie_write(write)),
            cookie_write_name(write)
        ),
    }
}

fn render_signals(raw: &str) -> Result<String> {
    let decision: ConsentDecision = serde_json::from_str(raw)
        .context("decision must be a JSON object mapping category keys to booleans")?;
    let signals = ConsentSignalState::from_decision(Some(&decision));
    let event = consent_update_event(&signals, Some(&decision));

    let mut out = String::new();
    let _ = writeln!(out, "{}", style::header("Consent signals"));
    for (channel, value) in signals.channels() {
        let _ = writeln!(out, "  {:<26}{}", style::cyan(channel), style::signal(value));
    }
    let _ = write!(
        out,
        "  {:<26}{}",
        style::cyan("status"),
        event["consent_status"].as_str().unwrap_or_default()
    );
    Ok(out)
}

/// A page with a tag-manager snippet and a few tracking cookies already in
/// place, as a typical storefront would have before the engine runs.
fn demo_page(hostname: &str) -> Arc<Page> {
    let page = Page::builder(hostname)
        .cookies(Arc::new(CookieJar::with_cookies(&[
            ("_ga", "GA1.1.100.200"),
            ("_fbp", "fb.1.100.200"),
            ("session", "demo"),
        ])))
        .build();
    page.document().append(
        Region::Head,
        Element::new("script").with_attribute("src", DEMO_TAG_SCRIPT),
    );
    page
}

async fn simulate(
    mut config: EngineConfig,
    hostname: &str,
    decision: DecisionArg,
    offline: bool,
) -> Result<Arc<ConsentEngine>> {
    let page = demo_page(hostname);
    let collaborators = if offline {
        config.script_id.get_or_insert_with(|| "offline".into());
        config.api_key.get_or_insert_with(|| "offline".into());
        Collaborators {
            backend: Arc::new(MemoryBackend::new()),
            presenter: Arc::new(DocumentBanner::new(Arc::clone(&page))),
            observer: create_observer(&config.observability),
        }
    } else {
        Collaborators::for_page(&page, &config)
    };

    let Some(engine) = ConsentEngine::initialize(Arc::clone(&page), config, collaborators)
        .await?
        .engine()
    else {
        bail!("consent engine already initialized on this page");
    };

    match decision {
        DecisionArg::Accept => {
            engine.accept_all().await?;
        }
        DecisionArg::Reject => {
            engine.reject_all().await?;
        }
        DecisionArg::None => {}
    }

    // A tracker injected after the decision, as a late third-party tag would be.
    let mut late = page.create_element("script");
    late.set_attribute("src", LATE_SCRIPT);
    page.document().append(Region::Body, late);
    page.tick();

    Ok(engine)
}

fn render_posture(engine: &ConsentEngine) -> String {
    let page = engine.page();
    let layer = engine.interception();
    let tags = layer.discovered_tags();

    let mut out = String::new();
    let _ = writeln!(out, "{}", style::header("Page posture"));
    let _ = writeln!(out, "  {:<14}{}", style::cyan("phase"), engine.phase());
    let _ = writeln!(
        out,
        "  {:<14}{}",
        style::cyan("tracking"),
        style::verdict(layer.is_active())
    );
    let _ = writeln!(
        out,
        "  {:<14}{}",
        style::cyan("container"),
        engine
            .config()
            .gtm_id
            .as_deref()
            .or(tags.container_id.as_deref())
            .unwrap_or("(none)")
    );
    let _ = writeln!(out, "  {:<14}{}", style::cyan("cookies"), page.read_cookies());
    let _ = writeln!(out, "{}", style::header("Scripts"));
    let scripts = page.document().scripts();
    if scripts.is_empty() {
        let _ = writeln!(out, "  {}", style::dim("(none)"));
    }
    for script in scripts {
        let _ = writeln!(out, "  {}", script.src().unwrap_or("(inline)"));
    }
    let _ = writeln!(out, "{}", style::header("Signals"));
    for (channel, value) in engine.signal_state().channels() {
        let _ = writeln!(out, "  {:<26}{}", style::cyan(channel), style::signal(value));
    }
    out.trim_end().to_string()
}
