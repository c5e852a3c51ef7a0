//! End-to-end scenarios: compile a script, then play it through the runtime.

use std::sync::Arc;
use std::thread;

use gb_core::PlayerId;
use gb_dsl::{CompileOptions, compile_source};
use gb_engine::Notice;
use gb_runtime::{EngineConfig, Game, JsonFileStorage, MemoryStorage, SlotStorage};

fn game_with(script: &str, config: EngineConfig, storage: impl SlotStorage + 'static) -> Game {
    let result = compile_source(script, &CompileOptions::default());
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    Game::new(result.table, config, storage).unwrap()
}

fn game(script: &str) -> Game {
    game_with(script, EngineConfig::default().with_seed(7), MemoryStorage::new())
}

const CAVE: &str = "\
:start
strength=10;Strength
pln You feel strong ({strength}).
btn cave, Enter the cave
End
:cave
pln It is dark here.
btn return, Go back
End
";

#[test]
fn choice_moves_player_and_keeps_attributes() {
    let game = game(CAVE);
    let player = PlayerId::from("hero");

    let render = game.start_session(&player);
    assert_eq!(render.texts().collect::<Vec<_>>(), vec!["You feel strong (10)."]);
    assert_eq!(render.choices, vec!["Enter the cave"]);

    let render = game.submit_choice(&player, "Enter the cave").unwrap();
    assert_eq!(render.chapter.as_str(), "cave");
    let attributes = game.view_attributes(&player);
    assert_eq!(attributes.value("strength"), Some(10));
    assert_eq!(attributes.attributes[0].1.name, "Strength");
}

#[test]
fn stale_choices_are_rejected() {
    let game = game(CAVE);
    let player = PlayerId::from("hero");
    game.start_session(&player);
    game.submit_choice(&player, "Enter the cave").unwrap();

    let err = game.submit_choice(&player, "Enter the cave").unwrap_err();
    assert!(err.is_rejected_choice());
    assert_eq!(game.current(&player).chapter.as_str(), "cave");
}

#[test]
fn return_goes_back_one_chapter() {
    let game = game(CAVE);
    let player = PlayerId::from("hero");
    game.start_session(&player);
    game.submit_choice(&player, "Enter the cave").unwrap();
    let render = game.submit_choice(&player, "Go back").unwrap();
    assert_eq!(render.chapter.as_str(), "start");
}

#[test]
fn return_with_empty_history_is_rejected() {
    let game = game(":cave\npln Dark.\nbtn return, Go back\nEnd\n");
    let player = PlayerId::from("hero");
    game.start_session(&player);

    let err = game.submit_choice(&player, "Go back").unwrap_err();
    assert!(err.is_rejected_choice());
    let render = game.current(&player);
    assert_eq!(render.chapter.as_str(), "cave");
    assert_eq!(render.choices, vec!["Go back"]);
}

#[test]
fn goto_return_with_empty_history_is_a_notice() {
    let game = game(":start\npln Stuck.\ngoto return\npln Still here.\nEnd\n");
    let render = game.start_session(&PlayerId::from("p"));
    assert_eq!(render.chapter.as_str(), "start");
    assert!(render.notices().any(|n| *n == Notice::NothingToReturnTo));
    assert_eq!(
        render.texts().collect::<Vec<_>>(),
        vec!["Stuck.", "Still here."]
    );
}

#[test]
fn history_keeps_most_recent_chapters() {
    let mut script = String::new();
    for n in 0..12 {
        script.push_str(&format!(":c{n}\nbtn c{}, Next\nEnd\n", n + 1));
    }
    script.push_str(":c12\npln The end.\nEnd\n");
    let game = game_with(
        &script,
        EngineConfig::default().with_history_limit(10),
        MemoryStorage::new(),
    );
    let player = PlayerId::from("walker");
    game.start_session(&player);

    for _ in 0..11 {
        game.submit_choice(&player, "Next").unwrap();
    }
    let (handle, _) = game.store().get(&player);
    let state = handle.lock();
    let visited: Vec<_> = state.session.history.iter().map(|c| c.as_str().to_string()).collect();
    let expected: Vec<_> = (1..=10).map(|n| format!("c{n}")).collect();
    assert_eq!(state.session.chapter.as_str(), "c11");
    assert_eq!(visited, expected);
    drop(state);

    game.submit_choice(&player, "Next").unwrap();
    let state = handle.lock();
    assert_eq!(state.session.history.iter().next().unwrap().as_str(), "c2");
    assert_eq!(state.session.history.peek().unwrap().as_str(), "c11");
}

#[test]
fn unset_attributes_are_neutral() {
    let game = game(
        ":start\nif luck > 0 then pln Lucky. else pln Unlucky.\nscore=luck + 5\npln Score {score}.\nEnd\n",
    );
    let render = game.start_session(&PlayerId::from("p"));
    assert_eq!(
        render.texts().collect::<Vec<_>>(),
        vec!["Unlucky.", "Score 5."]
    );
    assert_eq!(render.notices().count(), 0);
}

#[test]
fn dice_stay_in_range_and_are_reproducible() {
    let script = ":start\nroll=rnd6\npln {roll}\nbtn start, Again\nEnd\n";
    let rolls = |seed: u64| {
        let game = game_with(script, EngineConfig::default().with_seed(seed), MemoryStorage::new());
        let player = PlayerId::from("dice");
        game.start_session(&player);
        (0..50)
            .map(|_| {
                game.submit_choice(&player, "Again").unwrap();
                game.view_attributes(&player).value("roll").unwrap()
            })
            .collect::<Vec<_>>()
    };
    let first = rolls(3);
    assert!(first.iter().all(|roll| (1..=6).contains(roll)));
    assert_eq!(first, rolls(3));
}

const LAMP: &str = "\
:start
inv+ Lamp
inv+ 12 золотых монет
btn hall, Onward
End
:hall
if lamp then pln The hall is lit. else pln It is too dark.
End
:use_lamp
pln The lamp glows.
btn return, Put it away
End
";

#[test]
fn usable_items_offer_their_chapter() {
    let game = game(LAMP);
    let player = PlayerId::from("p");
    game.start_session(&player);

    let inventory = game.view_inventory(&player);
    assert!(inventory.is_usable("lamp"));
    assert_eq!(inventory.currency, 12);
    assert_eq!(inventory.use_choices, vec!["Use lamp"]);

    let render = game.submit_choice(&player, "Use lamp").unwrap();
    assert_eq!(render.chapter.as_str(), "use_lamp");
    assert_eq!(render.texts().collect::<Vec<_>>(), vec!["The lamp glows."]);

    let render = game.submit_choice(&player, "Put it away").unwrap();
    assert_eq!(render.chapter.as_str(), "start");
}

#[test]
fn use_item_navigates_directly() {
    let game = game(LAMP);
    let player = PlayerId::from("p");
    game.start_session(&player);
    assert_eq!(game.use_item(&player, "LAMP").unwrap().chapter.as_str(), "use_lamp");
    assert!(game.use_item(&player, "sword").is_err());
}

#[test]
fn conditions_see_inventory() {
    let game = game(LAMP);
    let player = PlayerId::from("p");
    game.start_session(&player);
    let render = game.submit_choice(&player, "Onward").unwrap();
    assert_eq!(render.texts().collect::<Vec<_>>(), vec!["The hall is lit."]);
}

#[test]
fn save_then_load_restores_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let game = game_with(
        LAMP,
        EngineConfig::default().with_seed(1),
        JsonFileStorage::new(dir.path()),
    );
    let player = PlayerId::from("saver");
    game.start_session(&player);

    let slot = game.request_save(&player).unwrap();
    let (handle, _) = game.store().get(&player);
    let saved = handle.lock().session.clone();

    game.submit_choice(&player, "Onward").unwrap();
    assert_ne!(handle.lock().session.chapter, saved.chapter);

    let render = game.request_load(&player, &slot).unwrap();
    assert_eq!(render.chapter.as_str(), "start");
    assert!(render.effects.is_empty());
    assert_eq!(render.choices, vec!["Onward"]);
    assert_eq!(handle.lock().session, saved);

    assert_eq!(game.list_saves(&player).unwrap(), vec![slot]);
}

#[test]
fn saves_survive_a_new_game_instance() {
    let dir = tempfile::tempdir().unwrap();
    let player = PlayerId::from("saver");
    let slot = {
        let game = game_with(CAVE, EngineConfig::default(), JsonFileStorage::new(dir.path()));
        game.start_session(&player);
        game.submit_choice(&player, "Enter the cave").unwrap();
        game.request_save(&player).unwrap()
    };

    let game = game_with(CAVE, EngineConfig::default(), JsonFileStorage::new(dir.path()));
    let render = game.request_load(&player, &slot).unwrap();
    assert_eq!(render.chapter.as_str(), "cave");
    assert_eq!(game.view_attributes(&player).value("strength"), Some(10));
    assert_eq!(game.submit_choice(&player, "Go back").unwrap().chapter.as_str(), "start");
}

#[test]
fn save_slots_are_capped() {
    let game = game_with(
        CAVE,
        EngineConfig::default().with_save_limit(3),
        MemoryStorage::new(),
    );
    let player = PlayerId::from("p");
    game.start_session(&player);
    let mut last = String::new();
    for _ in 0..5 {
        last = game.request_save(&player).unwrap();
        game.request_load(&player, &last).unwrap();
    }
    let saves = game.list_saves(&player).unwrap();
    assert_eq!(saves.len(), 3);
    assert_eq!(saves.last(), Some(&last));
}

#[test]
fn players_do_not_share_state() {
    let game = game(CAVE);
    let (a, b) = (PlayerId::from("a"), PlayerId::from("b"));
    game.start_session(&a);
    game.start_session(&b);
    game.submit_choice(&a, "Enter the cave").unwrap();
    assert_eq!(game.current(&a).chapter.as_str(), "cave");
    assert_eq!(game.current(&b).chapter.as_str(), "start");
}

#[test]
fn concurrent_events_for_one_player_are_serialized() {
    let game = Arc::new(game(
        ":start\nbtn shop, Shop\nEnd\n:shop\ngold +1\nbtn shop, Again\nEnd\n",
    ));
    let player = PlayerId::from("shopper");
    game.start_session(&player);
    game.submit_choice(&player, "Shop").unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let game = Arc::clone(&game);
            let player = player.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    game.submit_choice(&player, "Again").unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(game.view_inventory(&player).currency, 101);
}

#[test]
fn concurrent_players_run_independently() {
    let game = Arc::new(game(CAVE));
    let workers: Vec<_> = (0..8)
        .map(|n| {
            let game = Arc::clone(&game);
            thread::spawn(move || {
                let player = PlayerId::from(format!("p{n}"));
                game.start_session(&player);
                for _ in 0..10 {
                    game.submit_choice(&player, "Enter the cave").unwrap();
                    game.submit_choice(&player, "Go back").unwrap();
                }
                game.current(&player).chapter
            })
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap().as_str(), "start");
    }
    assert_eq!(game.store().len(), 8);
}
