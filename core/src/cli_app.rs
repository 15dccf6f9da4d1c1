use crate::avatar::{AvatarResolver, DirectoryAvatars, NoAvatars};
use crate::config::Config;
use crate::dispatch::DispatchController;
use crate::event::{ChatMessage, EventKind, NotificationEvent, Presence, Sender};
use crate::service::{NotificationTransport, Outcome, ScriptedReply, ScriptedTransport};
use colored::*;
use std::path::Path;

/// Options that describe the event to send
#[derive(Debug, Default)]
struct EventArgs {
    name: Option<String>,
    nick: Option<String>,
    status: String,
    status_msg: String,
    subject: String,
    body: String,
    file: Option<String>,
    avatar: Option<String>,
    dry_run: Option<ScriptedReply>,
}

/// Entry point for the `fdnotify` binary.
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let (config, args) = Config::from_args(&args)?;
    let bin = args
        .first()
        .map(|s| s.as_str())
        .unwrap_or("fdnotify")
        .to_string();

    if args.len() < 2 {
        print_usage(&bin);
        return Ok(());
    }

    match args[1].as_str() {
        "kinds" => {
            list_kinds(&config);
            return Ok(());
        }
        "probe" => {
            let controller = DispatchController::session(&config);
            let endpoint = config.endpoint.to_string();
            match controller.client().check().await {
                Ok(caps) => {
                    println!("{} {} is running", "✓".green(), endpoint.cyan());
                    if let Some(caps) = caps {
                        println!("  capabilities: {}", caps.join(", ").dimmed());
                    }
                }
                Err(e) => println!("{} {} is not answering: {}", "✗".red(), endpoint.cyan(), e),
            }
            return Ok(());
        }
        _ => {}
    }

    let kind = match args[1].parse::<EventKind>() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e.red());
            print_usage(&bin);
            return Ok(());
        }
    };
    let Some(address) = args.get(2) else {
        eprintln!("{}", format!("Usage: {} {} <address> [options]", bin, kind).yellow());
        return Ok(());
    };

    let opts = parse_event_args(&args[3..])?;
    let event = build_event(kind, address, &opts);
    let avatars = avatar_resolver(&config)?;

    let outcome = match opts.dry_run {
        Some(reply) => {
            let controller = DispatchController::new(&config, ScriptedTransport::always(reply));
            dispatch(&controller, &config, &event, &opts, avatars.as_ref()).await?
        }
        None => {
            let controller = DispatchController::session(&config);
            dispatch(&controller, &config, &event, &opts, avatars.as_ref()).await?
        }
    };

    match outcome {
        None => println!("{} {} notifications are muted", "•".dimmed(), kind),
        Some(Outcome::Delivered { id }) => {
            println!("{} Delivered as notification {}", "✓".green(), id.to_string().cyan())
        }
        Some(Outcome::Rejected { reason }) => {
            println!("{} Rejected, shown locally: {}", "✗".yellow(), reason)
        }
        Some(Outcome::Unreachable { reason }) => {
            println!("{} Service unreachable, shown locally: {}", "✗".yellow(), reason)
        }
    }
    Ok(())
}

async fn dispatch<T: NotificationTransport>(
    controller: &DispatchController<T>,
    config: &Config,
    event: &NotificationEvent,
    opts: &EventArgs,
    avatars: &dyn AvatarResolver,
) -> anyhow::Result<Option<Outcome>> {
    let fallback = config.fallback.sink(&config.app_name);
    // An explicit --avatar bypasses lookup but not muting
    if let Some(path) = &opts.avatar {
        if controller.is_muted(event.kind()) {
            return Ok(None);
        }
        let icon = image::open(Path::new(path))?;
        return Ok(Some(controller.popup(event, Some(&icon), fallback.as_ref()).await));
    }
    Ok(controller.notify(event, avatars, fallback.as_ref()).await)
}

fn avatar_resolver(config: &Config) -> anyhow::Result<Box<dyn AvatarResolver>> {
    let Some(dir) = &config.avatar_dir else {
        return Ok(Box::new(NoAvatars));
    };
    let avatars = DirectoryAvatars::new(dir);
    let avatars = match &config.default_avatar {
        Some(logo) => avatars.with_default_logo_file(logo)?,
        None => avatars,
    };
    Ok(Box::new(avatars))
}

fn parse_event_args(args: &[String]) -> anyhow::Result<EventArgs> {
    let mut opts = EventArgs::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let takes_value = !matches!(flag, "--dry-run" | "--dry-run-offline");
        let value = if takes_value {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("{} requires an argument", flag))?
        } else {
            String::new()
        };
        match flag {
            "--name" => opts.name = Some(value),
            "--nick" => opts.nick = Some(value),
            "--status" => opts.status = value,
            "--status-msg" => opts.status_msg = value,
            "--subject" => opts.subject = value,
            "--body" => opts.body = value,
            "--file" => opts.file = Some(value),
            "--avatar" => opts.avatar = Some(value),
            "--dry-run" => opts.dry_run = Some(ScriptedReply::Reply),
            "--dry-run-offline" => opts.dry_run = Some(ScriptedReply::NoService),
            other => anyhow::bail!("unknown option '{}'", other),
        }
        i += if takes_value { 2 } else { 1 };
    }
    Ok(opts)
}

fn build_event(kind: EventKind, address: &str, opts: &EventArgs) -> NotificationEvent {
    let mut from = Sender::new(address);
    from.roster_name = opts.name.clone();
    from.nick = opts.nick.clone();

    let presence = Presence {
        status_text: opts.status.clone(),
        status_message: opts.status_msg.clone(),
    };
    let message = ChatMessage {
        subject: opts.subject.clone(),
        body: opts.body.clone(),
    };

    match kind {
        EventKind::PresenceOnline => NotificationEvent::PresenceOnline { from, presence },
        EventKind::PresenceOffline => NotificationEvent::PresenceOffline { from, presence },
        EventKind::PresenceChange => NotificationEvent::PresenceChange { from, presence },
        EventKind::Message => NotificationEvent::Message { from, message },
        EventKind::Chat => NotificationEvent::Chat { from, message },
        EventKind::Headline => NotificationEvent::Headline { from, message },
        EventKind::File => NotificationEvent::File {
            from,
            file_name: opts.file.clone(),
        },
    }
}

fn list_kinds(config: &Config) {
    let defaults = EventKind::default_enabled();
    for kind in EventKind::ALL {
        let mark = if config.muted.contains(&kind) {
            "muted".red()
        } else if defaults.contains(&kind) {
            "on".green()
        } else {
            "optional".dimmed()
        };
        println!("  {:<10} {:<30} {}", kind.as_str().cyan(), kind.label(), mark);
    }
}

fn print_usage(bin: &str) {
    println!("{}", "fdnotify".bright_cyan().bold());
    println!();
    println!("{}", "Usage:".bright_white().bold());
    println!("  {} <kind> <address> [options]", bin.cyan());
    println!("  {} probe", bin.cyan());
    println!("  {} kinds", bin.cyan());
    println!();
    println!("{}", "Kinds:".bright_white().bold());
    println!("  online offline status message chat headline file");
    println!();
    println!("{}", "Options:".bright_white().bold());
    println!("  {} <name>       Roster name of the contact", "--name".cyan());
    println!("  {} <nick>       Nickname carried by the event", "--nick".cyan());
    println!("  {} <text>     Status text (presence kinds)", "--status".cyan());
    println!("  {} <text> Status message (presence kinds)", "--status-msg".cyan());
    println!("  {} <text>    Message subject", "--subject".cyan());
    println!("  {} <text>       Message body", "--body".cyan());
    println!("  {} <path>     Avatar image to attach", "--avatar".cyan());
    println!("  {}          Use an in-memory service that accepts", "--dry-run".cyan());
    println!("  {}  Use an in-memory service that is down", "--dry-run-offline".cyan());
    println!();
    println!("{}", "Config:".bright_white().bold());
    println!("  --config <file> --app-name <name> --timeout-ms <ms> --avatar-dir <dir>");
    println!("  --default-avatar <file> --mute <kind> --silent-fallback");
}
