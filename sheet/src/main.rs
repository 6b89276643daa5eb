//! Character sheet command line tool.
//!
//! Prepares saved actors and runs non-interactive rests against their save files:
//!
//! ```bash
//! cargo run -p sheet -- prepare saves/Roland.json
//! cargo run -p sheet -- rest --long saves/Roland.json
//! cargo run -p sheet -- list saves
//! ```

use std::path::PathBuf;

use dnd_sheet::persist::list_saves;
use dnd_sheet::{
    Actor, JsonFileStore, LongRestOptions, RandomRoller, RestResult, RulesConfig,
    SheetEngine, ShortRestOptions, Skill, Workflow,
};
use tracing::{info, warn};

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    command: Option<String>,
    target: Option<PathBuf>,
    config: Option<PathBuf>,
    long_rest: bool,
    auto_hd: bool,
    new_day: Option<bool>,
    json: bool,
}

fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(path) = args.get(i + 1) {
                    parsed.config = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            "--long" => parsed.long_rest = true,
            "--short" => parsed.long_rest = false,
            "--auto-hd" => parsed.auto_hd = true,
            "--new-day" => parsed.new_day = Some(true),
            "--no-new-day" => parsed.new_day = Some(false),
            "--json" => parsed.json = true,
            arg if parsed.command.is_none() => parsed.command = Some(arg.to_string()),
            arg if parsed.target.is_none() => parsed.target = Some(PathBuf::from(arg)),
            _ => {}
        }
        i += 1;
    }

    parsed
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }
    let args = parse_args(&args);

    let config = match &args.config {
        Some(path) => RulesConfig::load_json(path).await?,
        None => RulesConfig::default(),
    };
    let engine = SheetEngine::new(config);

    let (Some(command), Some(target)) = (args.command.as_deref(), args.target.clone()) else {
        print_help();
        std::process::exit(2);
    };

    match command {
        "prepare" => {
            let store = JsonFileStore::new(target);
            let mut actor = store.load().await?;
            let preparation = engine.prepare(&mut actor);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&actor)?);
            } else {
                print_actor(&actor);
            }
            for warning in &preparation.warnings {
                warn!(actor = %actor.name, ?warning, "armor class warning");
            }
        }
        "rest" => {
            let store = JsonFileStore::new(target);
            let mut actor = store.load().await?;
            engine.prepare(&mut actor);

            let workflow = Workflow::new(&engine, &store);
            let result = if args.long_rest {
                let mut options = LongRestOptions::default();
                if let Some(new_day) = args.new_day {
                    options.new_day = new_day;
                }
                workflow.long_rest(&mut actor, options, None).await?
            } else {
                let options = ShortRestOptions {
                    auto_hd: args.auto_hd,
                    ..Default::default()
                };
                let mut roller = RandomRoller::new();
                workflow
                    .short_rest(&mut actor, options, None, &mut roller)
                    .await?
            };
            match result {
                Some(result) => {
                    info!(
                        actor = %actor.name,
                        long_rest = result.long_rest,
                        dhp = result.dhp,
                        dhd = result.dhd,
                        "rest saved"
                    );
                    print_rest(&actor, &result);
                }
                None => println!("Rest cancelled."),
            }
        }
        "list" => {
            for save in list_saves(&target).await? {
                println!(
                    "{:<24} {:<10} level {:<3} {}",
                    save.metadata.name,
                    save.metadata.kind,
                    save.metadata.level,
                    save.path.display()
                );
            }
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_actor(actor: &Actor) {
    let attributes = &actor.attributes;
    println!("{} (level {})", actor.name, actor.level());
    println!(
        "HP {}/{}  AC {}  Initiative {:+}  Proficiency {:+}  Hit Dice {}",
        attributes.hp.value,
        attributes.hp.max,
        attributes.ac.value,
        attributes.init.total,
        attributes.prof,
        attributes.hd
    );
    println!("Spell DC {}", attributes.spelldc);

    println!();
    for (ability, block) in &actor.abilities {
        println!(
            "{}  {:>2} ({:+})  save {:+}",
            ability.abbreviation(),
            block.value,
            block.modifier,
            block.save
        );
    }

    if !actor.skills.is_empty() {
        println!();
        for skill in Skill::all() {
            if let Some(block) = actor.skills.get(&skill) {
                println!(
                    "{:<16} {:+}  passive {}  {}",
                    skill.name(),
                    block.total,
                    block.passive,
                    block.proficient.name()
                );
            }
        }
    }

    let encumbrance = &attributes.encumbrance;
    println!();
    println!(
        "Carrying {}/{} ({:.0}%){}",
        encumbrance.value,
        encumbrance.max,
        encumbrance.pct,
        if encumbrance.encumbered { " encumbered" } else { "" }
    );

    let slots: Vec<String> = actor
        .spells
        .slots
        .iter()
        .filter(|(_, block)| block.max > 0)
        .map(|(level, block)| format!("{}: {}/{}", level.level(), block.value, block.max))
        .collect();
    if !slots.is_empty() {
        println!("Spell slots  {}", slots.join("  "));
    }
    let pact = &actor.spells.pact;
    if pact.max > 0 {
        println!("Pact slots   {}/{} (level {})", pact.value, pact.max, pact.level);
    }
}

fn print_rest(actor: &Actor, result: &RestResult) {
    let kind = if result.long_rest { "long" } else { "short" };
    println!(
        "{} finished a {kind} rest{}.",
        actor.name,
        if result.new_day { " (new day)" } else { "" }
    );
    println!("Hit points regained: {}", result.dhp);
    println!("Hit dice: {:+}", result.dhd);
    println!(
        "HP {}/{}  Hit Dice {}",
        actor.attributes.hp.value, actor.attributes.hp.max, actor.attributes.hd
    );
}

fn print_help() {
    println!("sheet - D&D 5e character sheet tool");
    println!();
    println!("USAGE:");
    println!("    sheet prepare <file> [--json]");
    println!("    sheet rest (--short [--auto-hd] | --long [--new-day|--no-new-day]) <file>");
    println!("    sheet list <dir>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Rules configuration (JSON)");
    println!("    -h, --help         Print help");
    println!();
    println!("Set RUST_LOG to control log output (default: info).");
}
