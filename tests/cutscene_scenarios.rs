//! Overworld cutscene scenarios driven through the public controller.

use crust::config::FRAME;
use crust::content::demo::DEFEATED_BETH;
use crust::{
    Content, CrustResult, Direction, EventResolution, HeadlessPresenter, Key, Overworld,
    OverworldEvent, OverworldOptions, PlayerState, Position, Progress, Speed, TextLine, HERO_ID,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

fn overworld(options: OverworldOptions) -> CrustResult<(Overworld, Arc<HeadlessPresenter>)> {
    overworld_with(HeadlessPresenter::new(), options)
}

fn overworld_with(
    presenter: HeadlessPresenter,
    options: OverworldOptions,
) -> CrustResult<(Overworld, Arc<HeadlessPresenter>)> {
    let presenter = Arc::new(presenter);
    let world = Overworld::new(Arc::new(Content::demo()), presenter.clone(), options)?;
    Ok((world, presenter))
}

fn say(text: &str) -> OverworldEvent {
    OverworldEvent::message(vec![TextLine::new(text, Speed::Fast)])
}

fn weak_player() -> PlayerState {
    let mut player = PlayerState::starter();
    player.lineup.truncate(1);
    if let Some(p1) = player.pizzas.get_mut("p1") {
        p1.hp = 1;
    }
    player
}

#[tokio::test(start_paused = true)]
async fn test_lost_battle_skips_remaining_events() -> CrustResult<()> {
    let (world, presenter) = overworld(OverworldOptions::new("DemoRoom").with_player(weak_player()))?;
    world.start_map("DemoRoom", None)?;

    world
        .start_cutscene(vec![
            say("Before"),
            OverworldEvent::Battle {
                enemy_id: "erio".to_string(),
                arena: None,
            },
            say("After"),
        ])
        .await?;

    let messages = presenter.messages();
    assert_eq!(messages.first().map(String::as_str), Some("Before"));
    assert!(!messages.contains(&"After".to_string()));
    assert!(presenter.transcript().contains(&"battle: lost".to_string()));
    assert!(!world.is_cutscene_playing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_won_battle_continues_cutscene() -> CrustResult<()> {
    let (world, presenter) = overworld(OverworldOptions::new("DemoRoom"))?;
    world.start_map("DemoRoom", None)?;

    let result = world
        .interpret(OverworldEvent::Battle {
            enemy_id: "beth".to_string(),
            arena: None,
        })
        .await?;
    assert_eq!(result, EventResolution::WonBattle);

    world
        .start_cutscene(vec![
            OverworldEvent::AddStoryFlag {
                flag: DEFEATED_BETH.to_string(),
            },
            say("Done"),
        ])
        .await?;
    assert!(world.player().has_flag(DEFEATED_BETH));
    assert_eq!(presenter.messages().last().map(String::as_str), Some("Done"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_hero_bumps_into_wall() -> CrustResult<()> {
    let (world, _presenter) = overworld(OverworldOptions::new("DemoRoom"))?;
    world.start_map("DemoRoom", Some((Position::from_grid(6, 6), Direction::Down)))?;

    let start = Instant::now();
    world.interpret(OverworldEvent::walk(HERO_ID, Direction::Right)).await?;

    assert!(start.elapsed() < FRAME);
    let hero = world.actor(HERO_ID)?;
    assert_eq!(hero.position, Position::from_grid(6, 6));
    assert_eq!(hero.direction, Direction::Right);
    assert!(!hero.is_moving());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_stands_resolve_independently() -> CrustResult<()> {
    let (world, _presenter) = overworld(OverworldOptions::new("DemoRoom"))?;
    world.start_map("DemoRoom", None)?;
    world.with_map(|map| map.is_cutscene_playing = true)?;

    let start = Instant::now();
    let short = world.interpret(OverworldEvent::stand(Some("npcA"), Direction::Up, 100));
    let long = world.interpret(OverworldEvent::stand(Some("npcB"), Direction::Left, 300));
    let (short_done, long_done) = tokio::join!(
        async {
            short.await?;
            CrustResult::Ok(start.elapsed())
        },
        async {
            long.await?;
            CrustResult::Ok(start.elapsed())
        },
    );

    let (short_done, long_done) = (short_done?, long_done?);
    assert!(short_done >= Duration::from_millis(100) && short_done < Duration::from_millis(110));
    assert!(long_done >= Duration::from_millis(300) && long_done < Duration::from_millis(310));
    assert_eq!(world.actor("npcB")?.direction, Direction::Left);
    assert!(!world.actor("npcA")?.is_standing);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_scripted_walk_waits_for_arrival() -> CrustResult<()> {
    let (world, _presenter) = overworld(OverworldOptions::new("DemoRoom"))?;
    world.init()?;

    let start = Instant::now();
    world
        .start_cutscene(vec![OverworldEvent::walk("npcB", Direction::Left)])
        .await?;

    assert!(start.elapsed() >= FRAME * 14);
    let npc = world.actor("npcB")?;
    assert_eq!(npc.position, Position::from_grid(7, 5));
    assert!(!npc.is_moving());
    world.shutdown();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_one_actor_wins_a_contested_tile() -> CrustResult<()> {
    let options = OverworldOptions::new("DemoRoom").with_hero(Position::from_grid(6, 5), Direction::Down);
    let (world, _presenter) = overworld(options)?;
    world.init()?;

    let npc_walk = world.interpret(OverworldEvent::walk("npcB", Direction::Left));
    let hero_walk = world.interpret(OverworldEvent::walk(HERO_ID, Direction::Right));
    let (npc, hero) = tokio::join!(npc_walk, hero_walk);
    npc?;
    hero?;

    assert_eq!(world.actor("npcB")?.position, Position::from_grid(7, 5));
    let hero = world.actor(HERO_ID)?;
    assert_eq!(hero.position, Position::from_grid(6, 5));
    assert_eq!(hero.direction, Direction::Right);
    assert!(world.with_map(|map| map.is_space_taken(Position::from_grid(6, 5), Direction::Right))?);
    world.shutdown();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_footstep_changes_map() -> CrustResult<()> {
    let options = OverworldOptions::new("DemoRoom").with_hero(Position::from_grid(5, 9), Direction::Down);
    let (world, presenter) = overworld(options)?;
    world.init()?;

    world.press_key(Key::ArrowDown);
    sleep(FRAME * 4).await;
    world.release_key(Key::ArrowDown);
    sleep(FRAME * 40).await;

    assert_eq!(world.map_id(), Some("Kitchen".to_string()));
    assert_eq!(world.actor(HERO_ID)?.position, Position::from_grid(5, 5));
    let transcript = presenter.transcript();
    assert!(transcript.contains(&"fade out".to_string()));
    assert!(transcript.contains(&"fade in".to_string()));
    assert!(!world.is_cutscene_playing());
    world.shutdown();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_talking_to_npc_starts_battle() -> CrustResult<()> {
    let options = OverworldOptions::new("DemoRoom").with_hero(Position::from_grid(7, 8), Direction::Down);
    let (world, presenter) = overworld(options)?;
    world.init()?;

    world.press_key(Key::Enter);
    world.release_key(Key::Enter);
    sleep(Duration::from_secs(30)).await;

    assert!(world.player().has_flag(DEFEATED_BETH));
    let messages = presenter.messages();
    assert_eq!(messages.first().map(String::as_str), Some("I'm going to crush you!"));
    assert_eq!(
        messages.last().map(String::as_str),
        Some("You crushed me like weak pepper.")
    );
    let hud = presenter.hud();
    assert_eq!(hud.map(|hud| hud.scoreboards[0].level), Some(2));

    // Second conversation picks the next eligible script.
    world.press_key(Key::Enter);
    world.release_key(Key::Enter);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(
        presenter.messages().last().map(String::as_str),
        Some("What do you want now? I'm busy!")
    );
    world.shutdown();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_escape_opens_pause_menu_and_saves() -> CrustResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("save.json");
    let options = OverworldOptions::new("DemoRoom").with_save_file(&path, false);
    let (world, presenter) = overworld_with(HeadlessPresenter::new().with_choices([1]), options)?;
    world.init()?;

    world.press_key(Key::Escape);
    world.release_key(Key::Escape);
    sleep(FRAME * 5).await;

    assert!(presenter
        .transcript()
        .contains(&"menu: Paused -> Save".to_string()));
    assert!(!world.is_cutscene_playing());
    let progress = Progress::load(&path)?;
    assert_eq!(progress.map_id, "DemoRoom");
    assert_eq!(progress.hero_position(), Position::from_grid(5, 6));
    world.shutdown();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cutscene_keeps_control_across_map_change() -> CrustResult<()> {
    let (world, _presenter) = overworld(OverworldOptions::new("DemoRoom"))?;
    world.init()?;

    world.spawn_cutscene(vec![
        OverworldEvent::ChangeMap {
            map: "Kitchen".to_string(),
            x: Some(5),
            y: Some(5),
            direction: Some(Direction::Down),
        },
        OverworldEvent::stand(Some(HERO_ID), Direction::Down, 3000),
    ]);
    sleep(FRAME * 2).await;
    assert_eq!(world.map_id(), Some("Kitchen".to_string()));

    world.press_key(Key::ArrowRight);
    sleep(Duration::from_secs(1)).await;

    assert!(world.is_cutscene_playing());
    let hero = world.actor(HERO_ID)?;
    assert_eq!(hero.position, Position::from_grid(5, 5));
    assert!(!hero.is_moving());

    world.release_key(Key::ArrowRight);
    sleep(Duration::from_secs(3)).await;
    assert!(!world.is_cutscene_playing());
    assert_eq!(world.actor(HERO_ID)?.position, Position::from_grid(5, 5));
    world.shutdown();
    Ok(())
}
