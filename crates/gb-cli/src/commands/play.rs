use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use gb_core::PlayerId;
use gb_dsl::CompileOptions;
use gb_engine::{Effect, Render};
use gb_runtime::{EngineConfig, Game, HelpBook, JsonFileStorage, RuntimeError};

const HELP: &str = "\
  <number> or <label>  pick a choice
  :save                save the game
  :load <slot>         load a save slot
  :saves               list save slots
  :inv                 show inventory
  :stats               show attributes
  :use <item>          use an item
  :book                open the help book
  :back                leave the help book
  :new                 start over
  :quit                exit";

/// Settings of an interactive session.
pub struct PlayArgs<'a> {
    pub player: &'a str,
    pub saves: &'a Path,
    pub assets: Option<PathBuf>,
    pub seed: Option<u64>,
    pub help_book: Option<&'a Path>,
}

pub fn run(script: &Path, options: &CompileOptions, args: PlayArgs<'_>) -> Result<(), String> {
    let result = super::compile_script(script, options)?;

    let mut config = EngineConfig::default().with_use_prefix(options.use_prefix.as_str());
    if let Some(root) = args.assets {
        config = config.with_asset_root(root);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let help = match args.help_book {
        Some(path) => {
            let book = super::compile_script(path, options)?;
            let help = HelpBook::new(book.table, config.clone())
                .map_err(|e| format!("failed to open help book: {e}"))?;
            Some(help)
        }
        None => None,
    };

    let game = Game::new(result.table, config, JsonFileStorage::new(args.saves))
        .map_err(|e| format!("failed to start game: {e}"))?;
    let player = PlayerId::from(args.player);

    println!("  Type ':help' for commands, ':quit' to exit.\n");
    print_render(&game.start_session(&player));

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let reading = help.as_ref().filter(|help| help.is_open(&player));
        let step = match reading {
            Some(help) => handle_help(&game, help, &player, input),
            None => handle(&game, help.as_ref(), &player, input),
        };
        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Quit) => break,
            Err(e) => println!("{}\n", e.to_string().yellow()),
        }
    }

    Ok(())
}

enum Step {
    Continue,
    Quit,
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (input, ""),
    }
}

fn handle(
    game: &Game,
    help: Option<&HelpBook>,
    player: &PlayerId,
    input: &str,
) -> Result<Step, RuntimeError> {
    let (command, arg) = split_command(input);

    match command {
        ":quit" | ":q" => return Ok(Step::Quit),
        ":help" => println!("{HELP}\n"),
        ":new" => print_render(&game.start_session(player)),
        ":save" => {
            let slot = game.request_save(player)?;
            println!("  Saved as '{}'.\n", slot.bold());
        }
        ":load" if arg.is_empty() => println!("{}\n", "usage: :load <slot>".yellow()),
        ":load" => {
            let render = game.request_load(player, arg)?;
            println!("  Loaded '{}'.\n", arg.bold());
            print_render(&render);
        }
        ":saves" => print_saves(&game.list_saves(player)?),
        ":inv" => print_inventory(game, player),
        ":stats" => print_attributes(game, player),
        ":use" if arg.is_empty() => println!("{}\n", "usage: :use <item>".yellow()),
        ":use" => print_render(&game.use_item(player, arg)?),
        ":book" => match help {
            Some(help) => print_page(&help.open(player)),
            None => println!("{}\n", "no help book loaded (see --help-book)".yellow()),
        },
        ":back" => println!("{}\n", "not reading the help book".yellow()),
        _ => {
            let choices = game.current(player).choices;
            let label = choice_by_number(&choices, input).unwrap_or_else(|| input.to_string());
            print_render(&game.submit_choice(player, &label)?);
        }
    }
    Ok(Step::Continue)
}

/// Input while the help book is open: its choices, `:back` and `:book`.
fn handle_help(
    game: &Game,
    help: &HelpBook,
    player: &PlayerId,
    input: &str,
) -> Result<Step, RuntimeError> {
    let (command, _) = split_command(input);

    match command {
        ":quit" | ":q" => return Ok(Step::Quit),
        ":help" => println!("{HELP}\n"),
        ":book" => print_page(&help.open(player)),
        ":back" => {
            help.close(player);
            println!("  {}\n", "Back to the game.".dimmed());
            print_render(&game.current(player));
        }
        _ if command.starts_with(':') => {
            println!("{}\n", "leave the help book with ':back' first".yellow());
        }
        _ => {
            let choices = help.current(player)?.choices;
            let label = choice_by_number(&choices, input).unwrap_or_else(|| input.to_string());
            print_page(&help.choose(player, &label)?);
        }
    }
    Ok(Step::Continue)
}

/// A 1-based choice number resolved to its label.
fn choice_by_number(choices: &[String], input: &str) -> Option<String> {
    let n: usize = input.parse().ok()?;
    n.checked_sub(1).and_then(|i| choices.get(i).cloned())
}

fn print_render(render: &Render) {
    print_effects(render);
    if render.is_ending() {
        println!("  {}\n", "The End.".bold());
        return;
    }
    print_choices(render);
    println!();
}

/// A help-book page never ends the game; `:back` is always offered.
fn print_page(render: &Render) {
    print_effects(render);
    print_choices(render);
    println!("  {}\n", ":back) return to the game".dimmed());
}

fn print_effects(render: &Render) {
    for effect in &render.effects {
        match effect {
            Effect::Text(text) => println!("{text}\n"),
            Effect::Asset(path) => println!("  {}\n", format!("[image: {path}]").dimmed()),
            Effect::Notice(notice) => println!("  {}\n", notice.to_string().yellow()),
        }
    }
}

fn print_choices(render: &Render) {
    for (i, label) in render.choices.iter().enumerate() {
        println!("  {}) {label}", i + 1);
    }
}

fn print_saves(slots: &[String]) {
    if slots.is_empty() {
        println!("  No saves.\n");
        return;
    }
    for slot in slots {
        println!("  {slot}");
    }
    println!();
}

fn print_inventory(game: &Game, player: &PlayerId) {
    let view = game.view_inventory(player);
    if view.items.is_empty() {
        println!("  Your pack is empty.");
    } else {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Item", "Usable"]);
        for item in &view.items {
            table.add_row(vec![item.name.as_str(), if item.usable { "yes" } else { "" }]);
        }
        println!("{table}");
    }
    println!("  Gold: {}", view.currency);
    if !view.use_choices.is_empty() {
        println!("  Now available: {}", view.use_choices.join(", "));
    }
    println!();
}

fn print_attributes(game: &Game, player: &PlayerId) {
    let view = game.view_attributes(player);
    if view.attributes.is_empty() {
        println!("  No attributes yet.");
    } else {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Attribute", "Value"]);
        for (_, attribute) in &view.attributes {
            table.add_row(vec![attribute.name.clone(), attribute.value.to_string()]);
        }
        println!("{table}");
    }
    println!("  Gold: {}\n", view.currency);
}
