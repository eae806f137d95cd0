//! Built-in demo content: four pizzas, six actions, two enemies and two maps.

use super::{
    ActionDef, ActorConfig, Content, CutsceneSpace, EnemyDef, EnemyPizza, MapConfig, PizzaDef,
    PizzaType, TargetType,
};
use crate::battle::{BattleEventKind, StatusKind};
use crate::game::{Direction, Speed, TalkScript, TextLine};
use crate::overworld::OverworldEvent;
use std::collections::BTreeMap;

/// Story flag set after talking to Erio.
pub const TALKED_TO_ERIO: &str = "TALKED_TO_ERIO";
/// Story flag set after beating Beth.
pub const DEFEATED_BETH: &str = "DEFEATED_BETH";
/// Story flag set once the kitchen pizza stone is used.
pub const USED_PIZZA_STONE: &str = "USED_PIZZA_STONE";

impl Content {
    /// The demo registry used by the binary and the scenario tests.
    pub fn demo() -> Self {
        Self {
            pizzas: demo_pizzas(),
            actions: demo_actions(),
            enemies: demo_enemies(),
            maps: [demo_room(), kitchen()]
                .into_iter()
                .map(|map| (map.id.clone(), map))
                .collect(),
        }
    }
}

fn pizza(name: &str, description: &str, pizza_type: PizzaType, key: &str, actions: &[&str]) -> PizzaDef {
    let icon = match pizza_type {
        PizzaType::Veggie => "veggie",
        PizzaType::Fungi => "fungi",
        PizzaType::Chill => "chill",
        PizzaType::Normal | PizzaType::Spicy => "spicy",
    };
    PizzaDef {
        name: name.to_string(),
        description: description.to_string(),
        pizza_type,
        src: format!("images/characters/pizzas/{}.png", key),
        icon: format!("images/icons/{}.png", icon),
        actions: actions.iter().map(|a| a.to_string()).collect(),
    }
}

fn demo_pizzas() -> BTreeMap<String, PizzaDef> {
    let mut pizzas = BTreeMap::new();
    pizzas.insert(
        "s001".to_string(),
        pizza(
            "Slice Samurai",
            "A pizza with hard crust, ready to fight!",
            PizzaType::Normal,
            "s001",
            &["damage1", "clumsyStatus", "saucyStatus", "protect1"],
        ),
    );
    pizzas.insert(
        "s002".to_string(),
        pizza(
            "Bacon Brigade",
            "A pizza with smokey bacon and a spicy kick!",
            PizzaType::Spicy,
            "s002",
            &["damage1", "clumsyStatus", "saucyStatus"],
        ),
    );
    pizzas.insert(
        "v001".to_string(),
        pizza(
            "Call Me Kale",
            "A healthy pizza with kale and spinach!",
            PizzaType::Veggie,
            "v001",
            &["damage1"],
        ),
    );
    pizzas.insert(
        "f001".to_string(),
        pizza(
            "Portobello Express",
            "A pizza with portobello mushrooms!",
            PizzaType::Fungi,
            "f001",
            &["damage1"],
        ),
    );
    pizzas
}

fn action(name: &str, description: &str, icon: &str, target_type: TargetType, success: Vec<BattleEventKind>) -> ActionDef {
    ActionDef {
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        target_type,
        success,
    }
}

fn demo_actions() -> BTreeMap<String, ActionDef> {
    let uses = || BattleEventKind::text("{CASTER} uses {ACTION}!");
    let mut actions = BTreeMap::new();

    actions.insert(
        "damage1".to_string(),
        action(
            "Fling",
            "Fling yourself at your opponent",
            "🍕",
            TargetType::Enemy,
            vec![uses(), BattleEventKind::animation("spin"), BattleEventKind::damage(10)],
        ),
    );
    actions.insert(
        "saucyStatus".to_string(),
        action(
            "Tomato Squeeze",
            "Squeeze tomato sauce for an HP boost",
            "🍅",
            TargetType::Friendly,
            vec![uses(), BattleEventKind::set_status(StatusKind::Saucy, 3)],
        ),
    );
    actions.insert(
        "clumsyStatus".to_string(),
        action(
            "Olive Oil",
            "Spray olive oil to make your opponent slip",
            "🫒",
            TargetType::Enemy,
            vec![
                uses(),
                BattleEventKind::Animation {
                    animation: Some("glob".to_string()),
                    color: Some("var(--clr-olive-oil)".to_string()),
                },
                BattleEventKind::animation("slip"),
                BattleEventKind::set_status(StatusKind::Clumsy, 3),
                BattleEventKind::text("{TARGET} is slipping all around!"),
            ],
        ),
    );
    actions.insert(
        "protect1".to_string(),
        action(
            "Pizza Shield",
            "Protect yourself from damage",
            "🛡️",
            TargetType::Friendly,
            vec![
                uses(),
                BattleEventKind::animation("shield"),
                BattleEventKind::set_status(StatusKind::Protected, 1),
            ],
        ),
    );
    actions.insert(
        "item_recoverStatus".to_string(),
        action(
            "Heating Lamp",
            "Feeling fresh and warm",
            "",
            TargetType::Friendly,
            vec![
                BattleEventKind::text("{CASTER} used a {ACTION}!"),
                BattleEventKind::clear_status(),
                BattleEventKind::Message {
                    text_lines: vec![
                        TextLine::new("{TARGET} is feeling", Speed::Fast),
                        TextLine::new("fresh!", Speed::Fast).with_class("blue"),
                    ],
                },
            ],
        ),
    );
    actions.insert(
        "item_recoverHp".to_string(),
        action(
            "Parmesan",
            "Recover some HP",
            "",
            TargetType::Friendly,
            vec![
                BattleEventKind::text("{CASTER} sprinkled some {ACTION}!"),
                BattleEventKind::recover(10),
                BattleEventKind::Message {
                    text_lines: vec![
                        TextLine::new("{TARGET} recovered", Speed::Fast),
                        TextLine::new("10 HP!", Speed::Fast).with_class("green"),
                    ],
                },
            ],
        ),
    );
    actions
}

fn demo_enemies() -> BTreeMap<String, EnemyDef> {
    let mut enemies = BTreeMap::new();
    enemies.insert(
        "erio".to_string(),
        EnemyDef {
            name: "Erio".to_string(),
            src: "images/characters/people/erio.png".to_string(),
            pizzas: [
                ("a", EnemyPizza { pizza_id: "s001".to_string(), hp: None, max_hp: 50, level: 1 }),
                ("b", EnemyPizza { pizza_id: "s002".to_string(), hp: None, max_hp: 50, level: 1 }),
            ]
            .into_iter()
            .map(|(key, pizza)| (key.to_string(), pizza))
            .collect(),
        },
    );
    enemies.insert(
        "beth".to_string(),
        EnemyDef {
            name: "Beth".to_string(),
            src: "images/characters/people/npc1.png".to_string(),
            pizzas: [(
                "a".to_string(),
                EnemyPizza { pizza_id: "s001".to_string(), hp: Some(1), max_hp: 50, level: 1 },
            )]
            .into_iter()
            .collect(),
        },
    );
    enemies
}

fn say(who: &str, text: &str, speed: Speed) -> OverworldEvent {
    OverworldEvent::Message {
        text_lines: vec![TextLine::new(text, speed)],
        face_hero: Some(who.to_string()),
    }
}

fn demo_room() -> MapConfig {
    let npc_a = ActorConfig::person("npcA", 7, 9)
        .with_behavior(vec![
            OverworldEvent::stand(None, Direction::Left, 800),
            OverworldEvent::stand(None, Direction::Up, 800),
            OverworldEvent::stand(None, Direction::Right, 1200),
            OverworldEvent::stand(None, Direction::Up, 300),
        ])
        .with_talking(vec![
            TalkScript::new(vec![say("npcA", "Isn't Erio the coolest?", Speed::Fast)])
                .requiring(TALKED_TO_ERIO),
            TalkScript::new(vec![say("npcA", "What do you want now? I'm busy!", Speed::Fast)])
                .requiring(DEFEATED_BETH),
            TalkScript::new(vec![
                say("npcA", "I'm going to crush you!", Speed::Normal),
                OverworldEvent::Battle {
                    enemy_id: "beth".to_string(),
                    arena: None,
                },
                OverworldEvent::AddStoryFlag {
                    flag: DEFEATED_BETH.to_string(),
                },
                say("npcA", "You crushed me like weak pepper.", Speed::Fast),
            ]),
        ]);

    let npc_b = ActorConfig::person("npcB", 8, 5).with_talking(vec![TalkScript::new(vec![
        say("npcB", "Bahaha!", Speed::SuperFast),
        OverworldEvent::AddStoryFlag {
            flag: TALKED_TO_ERIO.to_string(),
        },
    ])]);

    let guard_scene = TalkScript::new(vec![
        OverworldEvent::walk("npcB", Direction::Left),
        OverworldEvent::stand(Some("npcB"), Direction::Up, 500),
        OverworldEvent::Message {
            text_lines: vec![TextLine::new("You can't be in there!", Speed::Fast).with_class("red")],
            face_hero: None,
        },
        OverworldEvent::walk("npcB", Direction::Right),
        OverworldEvent::stand(Some("npcB"), Direction::Down, 100),
        OverworldEvent::walk("hero", Direction::Down),
        OverworldEvent::walk("hero", Direction::Left),
    ]);

    MapConfig {
        id: "DemoRoom".to_string(),
        actors: vec![ActorConfig::hero(5, 6), npc_a, npc_b],
        walls: vec![[7, 6], [8, 6], [7, 7], [8, 7]],
        cutscene_spaces: vec![
            CutsceneSpace {
                x: 7,
                y: 4,
                scripts: vec![guard_scene],
            },
            CutsceneSpace {
                x: 5,
                y: 10,
                scripts: vec![TalkScript::new(vec![OverworldEvent::ChangeMap {
                    map: "Kitchen".to_string(),
                    x: None,
                    y: None,
                    direction: None,
                }])],
            },
        ],
    }
}

fn kitchen() -> MapConfig {
    let npc_b = ActorConfig::person("npcB", 10, 8).with_talking(vec![TalkScript::new(vec![say(
        "npcB",
        "You made it!",
        Speed::Normal,
    )])]);

    MapConfig {
        id: "Kitchen".to_string(),
        actors: vec![
            ActorConfig::hero(5, 5),
            npc_b,
            ActorConfig::pizza_stone("pizzaStone", 2, 7, USED_PIZZA_STONE, &["v001", "f001"]),
        ],
        walls: Vec::new(),
        cutscene_spaces: vec![CutsceneSpace {
            x: 5,
            y: 10,
            scripts: vec![TalkScript::new(vec![OverworldEvent::ChangeMap {
                map: "DemoRoom".to_string(),
                x: Some(5),
                y: Some(9),
                direction: Some(Direction::Up),
            }])],
        }],
    }
}
