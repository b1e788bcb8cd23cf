use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use colored::Colorize;

use dd_runtime::{ActionOutcome, DedScript, Engine, INVENTORY_CHANNEL};

use crate::store::SaveStore;
use crate::terminal::{LinkKind, TerminalPresentation};

type PlayEngine = Engine<TerminalPresentation, DedScript>;

pub fn run(story: &Path, save: Option<&Path>) -> Result<(), String> {
    // Compile once up front so problems render as proper diagnostics.
    let (source, format, _) = super::compile_story(story)?;

    let save_path = save
        .map(Path::to_path_buf)
        .unwrap_or_else(|| story.with_extension("save.json"));
    let presentation = TerminalPresentation::new(SaveStore::new(save_path));

    let mut engine =
        Engine::new(source, format, presentation, DedScript).map_err(|e| e.to_string())?;

    // The inventory display: re-query and re-print on every change event.
    let inventory_dirty = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&inventory_dirty);
    engine
        .events_mut()
        .subscribe(INVENTORY_CHANNEL, "terminal", move |_| {
            *flag.borrow_mut() = true;
        });

    println!("  {}", engine.title().bold());
    println!("  Type a link number to follow it, 'help' for commands.");

    engine.start().map_err(|e| e.to_string())?;
    inventory_dirty.replace(false);

    let stdin = io::stdin();
    let mut reader = stdin.lock();

    loop {
        if inventory_dirty.replace(false) {
            show_inventory(&engine);
        }

        let Some(input) = prompt(&mut reader, "> ")? else {
            break; // EOF
        };
        if input.is_empty() {
            continue;
        }

        match dispatch(&mut engine, &mut reader, &input) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", e.yellow()),
        }
    }

    Ok(())
}

/// Print `text`, read one line, and trim it. `None` on EOF.
fn prompt(reader: &mut impl BufRead, text: &str) -> Result<Option<String>, String> {
    print!("{text}");
    io::stdout().flush().map_err(|e| e.to_string())?;

    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(line.trim().to_string())),
        Err(e) => Err(e.to_string()),
    }
}

/// Handle one player input. `Ok(false)` ends the session.
fn dispatch(
    engine: &mut PlayEngine,
    reader: &mut impl BufRead,
    input: &str,
) -> Result<bool, String> {
    if let Ok(number) = input.parse::<usize>() {
        follow_link(engine, reader, number)?;
        return Ok(true);
    }

    match input.to_lowercase().as_str() {
        "help" | "h" => help(),
        "look" | "l" => {
            let current = engine.current_page_id().to_string();
            engine.turn_to(&current, true).map_err(|e| e.to_string())?;
        }
        "inventory" | "i" => show_inventory(engine),
        "undo" | "u" => {
            if !engine.undo() {
                println!("Nothing to undo.");
            }
        }
        "save" => {
            engine.save().map_err(|e| e.to_string())?;
            println!("Saved.");
        }
        "restore" => {
            if !engine.restore().map_err(|e| e.to_string())? {
                println!("No saved game.");
            }
        }
        "restart" | "reset" => engine.reset().map_err(|e| e.to_string())?,
        "quit" | "q" => return Ok(false),
        other => println!("Unknown command '{other}'; 'help' lists commands."),
    }
    Ok(true)
}

fn help() {
    println!("  <number>       follow the numbered link");
    println!("  look, l        show the current page again");
    println!("  inventory, i   list what you are carrying");
    println!("  undo, u        take back the last step");
    println!("  save           save the game");
    println!("  restore        return to the saved game");
    println!("  restart        start the story over");
    println!("  quit, q        leave");
}

fn follow_link(
    engine: &mut PlayEngine,
    reader: &mut impl BufRead,
    number: usize,
) -> Result<(), String> {
    let link = match engine.presentation().link(number) {
        Some(link) => link.clone(),
        None => return Err(format!("there is no link [{number}]")),
    };
    if !engine.presentation().is_enabled(&link) {
        return Err("that link no longer responds".into());
    }

    match link.kind {
        LinkKind::Turn => engine.turn_to(&link.target, false).map_err(|e| e.to_string()),
        LinkKind::Show => engine.show_paragraph(&link.target).map_err(|e| e.to_string()),
        LinkKind::Interact => interact(engine, reader, &link.target),
    }
}

/// Show the object's action menu and perform the chosen action, prompting
/// for a combination partner when the action needs one.
fn interact(
    engine: &mut PlayEngine,
    reader: &mut impl BufRead,
    object_id: &str,
) -> Result<(), String> {
    let actions = engine.active_actions(object_id).map_err(|e| e.to_string())?;
    if actions.is_empty() {
        println!("Nothing to be done with that right now.");
        return Ok(());
    }

    println!("  {}:", display_name(engine, object_id).bold());
    for (i, action) in actions.iter().enumerate() {
        println!("    {}. {}", i + 1, action.id);
    }

    let Some(choice) = prompt(reader, "  action> ")? else {
        return Ok(());
    };
    if choice.is_empty() || choice.eq_ignore_ascii_case("cancel") {
        return Ok(());
    }

    let action = match choice.parse::<usize>() {
        Ok(n) if (1..=actions.len()).contains(&n) => &actions[n - 1],
        _ => actions
            .iter()
            .find(|a| a.id.eq_ignore_ascii_case(&choice))
            .ok_or_else(|| format!("no action '{choice}'"))?,
    };
    let action_id = action.id.clone();

    let outcome = engine
        .perform_action(object_id, &action_id)
        .map_err(|e| e.to_string())?;
    if outcome == ActionOutcome::AwaitingPartner {
        resolve_partner(engine, reader)?;
    }
    Ok(())
}

/// Prompt for the second target of a pending combination action.
fn resolve_partner(engine: &mut PlayEngine, reader: &mut impl BufRead) -> Result<(), String> {
    let candidates = engine.combination_candidates();
    if candidates.is_empty() {
        engine.cancel_combination().map_err(|e| e.to_string())?;
        println!("There is nothing here to combine that with.");
        return Ok(());
    }

    println!("  Use it with:");
    for (i, id) in candidates.iter().enumerate() {
        println!("    {}. {}", i + 1, display_name(engine, id));
    }

    let choice = match prompt(reader, "  with> ")? {
        Some(choice) if !choice.is_empty() && !choice.eq_ignore_ascii_case("cancel") => choice,
        _ => {
            engine.cancel_combination().map_err(|e| e.to_string())?;
            return Ok(());
        }
    };

    let partner = match choice.parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => candidates[n - 1].clone(),
        _ => match candidates.iter().find(|c| c.eq_ignore_ascii_case(&choice)) {
            Some(c) => c.clone(),
            None => {
                engine.cancel_combination().map_err(|e| e.to_string())?;
                return Err(format!("'{choice}' is not among the candidates"));
            }
        },
    };

    engine.resolve_combination(&partner).map_err(|e| e.to_string())
}

/// An object's inventory name, falling back to its id.
fn display_name(engine: &PlayEngine, id: &str) -> String {
    engine
        .object(id)
        .and_then(|o| o.inventory_name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn show_inventory(engine: &PlayEngine) {
    if engine.inventory().is_empty() {
        println!("{}", "  You are carrying nothing.".dimmed());
        return;
    }
    let names: Vec<String> = engine
        .inventory()
        .iter()
        .map(|id| display_name(engine, id))
        .collect();
    println!("  {} {}", "Carrying:".bold(), names.join(", "));
}
