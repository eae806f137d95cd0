//! Battle scenarios run against the demo content on a paused clock.

use crust::{
    item_groups, AnimationRegistry, Battle, BattleEvent, BattleEventKind, BattleEventRunner,
    BattleResolution, BattleState, Combatant, Content, CrustResult, HeadlessPresenter, PizzaRecord, PlayerState,
    PlayerStore, Status, StatusKind, Submission, Team, TurnCycle, TurnOutcome,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn player_pizza(content: &Content, id: &str, record: PizzaRecord) -> CrustResult<Combatant> {
    let def = content.pizza(&record.pizza_id)?;
    Ok(Combatant::from_player(id, &record, def))
}

fn enemy_pizza(content: &Content, key: &str, hp: i32) -> CrustResult<Combatant> {
    let mut combatant = player_pizza(content, key, PizzaRecord::fresh("s002"))?;
    combatant.id = format!("e_{}", key);
    combatant.team = Team::Enemy;
    combatant.hp = hp;
    combatant.is_player_controlled = false;
    Ok(combatant)
}

fn attack(action: &str, target: &str) -> Submission {
    Submission::Attack {
        action: action.to_string(),
        target: target.to_string(),
        instance_id: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_basic_attack_exchange() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    let hero = PizzaRecord {
        hp: 30,
        ..PizzaRecord::fresh("s001")
    };
    state.add_combatant(player_pizza(&content, "p1", hero)?);
    state.add_combatant(enemy_pizza(&content, "a", 20)?);

    let submission = attack("damage1", "e_a");
    for kind in content.action("damage1")?.success.clone() {
        let event = BattleEvent::from_template(kind, "p1", &submission);
        runner.interpret(&event, &mut state).await?;
    }

    assert_eq!(state.combatant("e_a")?.hp, 9);
    assert_eq!(state.combatant("p1")?.hp, 30);
    assert_eq!(presenter.messages(), vec!["Slice Samurai uses Fling!".to_string()]);
    assert!(presenter.transcript().contains(&"animation: spin".to_string()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_protected_target_takes_no_damage() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    state.add_combatant(player_pizza(&content, "p1", PizzaRecord::fresh("s001"))?);
    let mut shielded = enemy_pizza(&content, "a", 40)?;
    shielded.status = Some(Status::new(StatusKind::Protected, 1));
    state.add_combatant(shielded);

    let event = BattleEvent::from_template(BattleEventKind::damage(10), "p1", &attack("damage1", "e_a"));
    runner.interpret(&event, &mut state).await?;
    assert_eq!(state.combatant("e_a")?.hp, 40);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_item_consumed_once() -> CrustResult<()> {
    let content = Content::demo();
    // Root -> Items -> Parmesan.
    let presenter = HeadlessPresenter::new().with_choices([1, 0]);
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    let hurt = PizzaRecord {
        hp: 20,
        ..PizzaRecord::fresh("v001")
    };
    state.add_combatant(player_pizza(&content, "p1", hurt)?);
    state.add_combatant(enemy_pizza(&content, "a", 50)?);
    for n in 1..=2 {
        state.items.push(crust::BattleItem {
            action_id: "item_recoverHp".to_string(),
            instance_id: format!("item{}", n),
            team: Team::Player,
        });
    }

    let mut cycle = TurnCycle::new("Beth");
    let mut rng = StdRng::seed_from_u64(7);
    let outcome = cycle.turn(&runner, &mut state, &mut rng).await?;

    assert_eq!(outcome, TurnOutcome::Continue);
    assert_eq!(state.combatant("p1")?.hp, 30);
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.used_instance_ids.len(), 1);
    let used = state.used_instance_ids.iter().next().cloned().unwrap_or_default();
    assert!(state.items.iter().all(|item| item.instance_id != used));

    let caster = state.combatant("p1")?.clone();
    let groups = item_groups(&state, &caster);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].quantity, 1);
    assert_ne!(groups[0].instance_id, used);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_saucy_heals_then_expires() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    let saucy = PizzaRecord {
        hp: 30,
        status: Some(Status::new(StatusKind::Saucy, 1)),
        ..PizzaRecord::fresh("v001")
    };
    state.add_combatant(player_pizza(&content, "p1", saucy)?);
    state.add_combatant(enemy_pizza(&content, "a", 50)?);

    let mut cycle = TurnCycle::new("Beth");
    let mut rng = StdRng::seed_from_u64(1);
    cycle.turn(&runner, &mut state, &mut rng).await?;

    let p1 = state.combatant("p1")?;
    assert_eq!(p1.hp, 35);
    assert_eq!(p1.status, None);
    assert_eq!(state.combatant("e_a")?.hp, 39);

    let messages = presenter.messages();
    assert!(messages.contains(&"Feelin' saucy!".to_string()));
    let expiries = messages
        .iter()
        .filter(|m| m.as_str() == "Call Me Kale is no longer saucy!")
        .count();
    assert_eq!(expiries, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_status_lasts_three_turns() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    let shielded = PizzaRecord {
        status: Some(Status::new(StatusKind::Protected, 3)),
        ..PizzaRecord::fresh("v001")
    };
    state.add_combatant(player_pizza(&content, "p1", shielded)?);
    state.add_combatant(enemy_pizza(&content, "a", 200)?);

    let mut cycle = TurnCycle::new("Beth");
    let mut rng = StdRng::seed_from_u64(3);
    for expected in [2, 1] {
        cycle.turn(&runner, &mut state, &mut rng).await?;
        assert_eq!(state.combatant("p1")?.status.map(|s| s.expires_in), Some(expected));
    }
    cycle.turn(&runner, &mut state, &mut rng).await?;
    assert_eq!(state.combatant("p1")?.status, None);
    assert!(presenter
        .messages()
        .contains(&"Call Me Kale's shield is about to fade!".to_string()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_enemy_knockout_gives_xp_and_levels_up() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let player = PlayerStore::new(PlayerState::starter());
    let mut notices = player.subscribe();

    let battle = Battle::new(&content, &presenter, &animations, &player, "beth", None, 42)?;
    assert_eq!(battle.enemy_name(), "Beth");
    let did_win = battle.run().await?;
    assert!(did_win);

    let messages = presenter.messages();
    assert_eq!(messages.first().map(String::as_str), Some("Beth wants to throw down!"));
    assert!(messages.contains(&"Gained 20 XP!".to_string()));
    assert_eq!(messages.last().map(String::as_str), Some("Winner!"));
    assert!(presenter.transcript().contains(&"battle: won".to_string()));

    let p1 = player.read(|state| state.pizzas.get("p1").cloned());
    let Some(p1) = p1 else {
        panic!("p1 missing after write-back");
    };
    assert_eq!(p1.level, 2);
    assert_eq!(p1.xp, 10);
    assert_eq!(p1.max_hp, 60);
    assert_eq!(p1.hp, 30);
    assert_eq!(notices.try_recv().ok(), Some(crust::Notice::PlayerStateUpdated));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lost_battle_leaves_roster_untouched() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();

    let mut weak = PlayerState::starter();
    weak.lineup.truncate(1);
    if let Some(p1) = weak.pizzas.get_mut("p1") {
        p1.hp = 1;
    }
    let player = PlayerStore::new(weak.clone());

    let battle = Battle::new(&content, &presenter, &animations, &player, "erio", Some("kitchen".to_string()), 9)?;
    let did_win = battle.run().await?;

    assert!(!did_win);
    assert_eq!(player.snapshot(), weak);
    let transcript = presenter.transcript();
    assert!(transcript.contains(&"battle: vs Erio in kitchen".to_string()));
    assert!(transcript.contains(&"battle: lost".to_string()));
    assert!(presenter.messages().contains(&"Slice Samurai is ruined!".to_string()));
    Ok(())
}

#[test]
fn test_battle_needs_both_teams() {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let mut empty = PlayerState::starter();
    empty.lineup.clear();
    let player = PlayerStore::new(empty);

    let result = Battle::new(&content, &presenter, &animations, &player, "beth", None, 0);
    assert!(matches!(result, Err(crust::CrustError::InvalidState(_))));
}

#[tokio::test(start_paused = true)]
async fn test_swap_ends_turn_without_acting() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    // Root -> Swap -> first candidate.
    presenter.push_choice(2);
    presenter.push_choice(0);
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    let saucy = PizzaRecord {
        hp: 30,
        status: Some(Status::new(StatusKind::Saucy, 1)),
        ..PizzaRecord::fresh("s001")
    };
    state.add_combatant(player_pizza(&content, "p1", saucy)?);
    state.add_combatant(player_pizza(&content, "p2", PizzaRecord::fresh("v001"))?);
    state.add_combatant(enemy_pizza(&content, "a", 40)?);

    let mut cycle = TurnCycle::new("Beth");
    let mut rng = StdRng::seed_from_u64(5);
    let outcome = cycle.turn(&runner, &mut state, &mut rng).await?;

    assert_eq!(outcome, TurnOutcome::Continue);
    assert_eq!(state.active.get(Team::Player), Some("p2"));
    let p1 = state.combatant("p1")?;
    assert_eq!(p1.status, Some(Status::new(StatusKind::Saucy, 1)));
    assert_eq!(p1.hp, 30);
    assert_eq!(state.combatant("e_a")?.hp, 40);
    assert_eq!(presenter.messages(), vec!["Go get 'em, Call Me Kale!".to_string()]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_fainted_enemy_is_replaced() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);

    let mut state = BattleState::new();
    state.add_combatant(player_pizza(&content, "p1", PizzaRecord::fresh("s001"))?);
    state.add_combatant(enemy_pizza(&content, "a", 1)?);
    state.add_combatant(enemy_pizza(&content, "b", 50)?);

    let mut cycle = TurnCycle::new("Erio");
    let mut rng = StdRng::seed_from_u64(11);
    let outcome = cycle.turn(&runner, &mut state, &mut rng).await?;

    assert_eq!(outcome, TurnOutcome::Continue);
    assert_eq!(state.active.get(Team::Enemy), Some("e_b"));
    assert_eq!(state.combatant("e_b")?.hp, 50);
    let messages = presenter.messages();
    assert!(messages.contains(&"Bacon Brigade is ruined!".to_string()));
    assert_eq!(messages.last().map(String::as_str), Some("Bacon Brigade appears!"));

    let Some(view) = presenter.last_battle() else {
        panic!("no battle view was presented");
    };
    assert_eq!(view.enemy_team.alive_count(), 1);
    assert!(view.enemy_team.icons.iter().any(|icon| icon.id == "e_b" && icon.active));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_submission_menu_without_combatants_resolves() -> CrustResult<()> {
    let content = Content::demo();
    let presenter = HeadlessPresenter::new();
    let animations = AnimationRegistry::builtin();
    let runner = BattleEventRunner::new(&content, &presenter, &animations);
    let mut state = BattleState::new();

    let bare = BattleEvent::new(BattleEventKind::SubmissionMenu);
    assert_eq!(
        runner.interpret(&bare, &mut state).await?,
        BattleResolution::Submission(None)
    );

    let no_enemy = BattleEvent::new(BattleEventKind::SubmissionMenu).with_caster("p1");
    assert_eq!(
        runner.interpret(&no_enemy, &mut state).await?,
        BattleResolution::Submission(None)
    );
    assert!(presenter.transcript().is_empty());
    Ok(())
}
