//! Frame ordering, waves, game over and restart

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::GameState;
use crate::arena::ArenaBounds;
use crate::combat::{AreaPulse, CombatPlugin, Health, PlayerDied, PulseHitTracker};
use crate::config::GameConfig;
use crate::enemies::{Enemy, EnemyPlugin, spawn_enemy, spawn_wave};
use crate::player::{Player, PlayerIntent, PlayerPlugin, read_keyboard_intent, drive_autopilot};
use crate::progression::{PlayerStats, Progression, ProgressionPlugin};

/// Phases of a frame, run strictly in declaration order
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Input,
    Movement,
    EnemyAi,
    Weapon,
    PulseHits,
    Progression,
    Contact,
    Cleanup,
    Waves,
    Hud,
}

/// Every phase that advances the simulation. Only runs while playing.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameplaySet;

/// Shared random source for spawning and wandering
#[derive(Resource)]
pub struct GameRng(pub StdRng);

impl GameRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_os_rng()),
        }
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverEvent {
    pub level: u32,
    pub wave: u32,
}

pub struct GamePlugin {
    pub config: GameConfig,
}

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;

        app.init_state::<GameState>()
            .insert_resource(config.clone())
            .insert_resource(config.arena)
            .insert_resource(GameRng::new(config.seed))
            .insert_resource(PlayerStats::new(config.player.max_health))
            .insert_resource(Progression::new(&config.progression))
            .add_event::<GameOverEvent>()
            .configure_sets(
                Update,
                (
                    FrameSet::Input,
                    FrameSet::Movement,
                    FrameSet::EnemyAi,
                    FrameSet::Weapon,
                    FrameSet::PulseHits,
                    FrameSet::Progression,
                    FrameSet::Contact,
                    FrameSet::Cleanup,
                    FrameSet::Waves,
                    FrameSet::Hud,
                )
                    .chain(),
            )
            .configure_sets(
                Update,
                (
                    FrameSet::Movement,
                    FrameSet::EnemyAi,
                    FrameSet::Weapon,
                    FrameSet::PulseHits,
                    FrameSet::Progression,
                    FrameSet::Contact,
                    FrameSet::Cleanup,
                    FrameSet::Waves,
                )
                    .in_set(GameplaySet),
            )
            .configure_sets(Update, GameplaySet.run_if(in_state(GameState::Playing)))
            .add_plugins((PlayerPlugin, EnemyPlugin, CombatPlugin, ProgressionPlugin))
            .add_systems(Startup, start_run)
            .add_systems(
                Update,
                (
                    handle_game_state_input,
                    restart_run.run_if(in_state(GameState::GameOver)),
                )
                    .chain()
                    .after(read_keyboard_intent)
                    .after(drive_autopilot)
                    .in_set(FrameSet::Input),
            )
            .add_systems(
                Update,
                enter_game_over
                    .after(crate::combat::process_contact_damage)
                    .in_set(FrameSet::Contact),
            )
            .add_systems(Update, advance_wave.in_set(FrameSet::Waves));
    }
}

/// Spawn the enemies for `wave` around `player_position`
fn spawn_wave_entities(
    commands: &mut Commands,
    wave: u32,
    player_position: Vec3,
    bounds: &ArenaBounds,
    rng: &mut GameRng,
    config: &GameConfig,
) {
    let count = config.spawn.wave_size(wave);
    for spawn in spawn_wave(count, player_position, wave, bounds, &mut rng.0, config) {
        spawn_enemy(commands, &spawn);
    }
    info!("Wave {} started with {} enemies", wave, count);
}

fn start_run(
    mut commands: Commands,
    bounds: Res<ArenaBounds>,
    config: Res<GameConfig>,
    mut rng: ResMut<GameRng>,
    progression: Res<Progression>,
) {
    spawn_wave_entities(
        &mut commands,
        progression.wave,
        config.player.start_position(),
        &bounds,
        &mut rng,
        &config,
    );
}

fn handle_game_state_input(
    mut intent: ResMut<PlayerIntent>,
    current_state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !std::mem::take(&mut intent.toggle_pause) {
        return;
    }

    match current_state.get() {
        GameState::Playing => {
            info!("Paused");
            next_state.set(GameState::Paused);
        }
        GameState::Paused => {
            info!("Resumed");
            next_state.set(GameState::Playing);
        }
        GameState::GameOver => {}
    }
}

/// Reset the whole run in one step: nothing from the old run survives into
/// the first frame of the new one
#[allow(clippy::too_many_arguments)]
fn restart_run(
    mut commands: Commands,
    mut intent: ResMut<PlayerIntent>,
    enemy_query: Query<Entity, With<Enemy>>,
    mut player_query: Query<(&mut Transform, &mut AreaPulse), With<Player>>,
    mut stats: ResMut<PlayerStats>,
    mut progression: ResMut<Progression>,
    mut tracker: ResMut<PulseHitTracker>,
    bounds: Res<ArenaBounds>,
    config: Res<GameConfig>,
    mut rng: ResMut<GameRng>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !std::mem::take(&mut intent.restart) {
        return;
    }

    for entity in &enemy_query {
        commands.entity(entity).despawn();
    }

    *stats = PlayerStats::new(config.player.max_health);
    *progression = Progression::new(&config.progression);
    tracker.clear();

    let start = config.player.start_position();
    if let Ok((mut transform, mut pulse)) = player_query.single_mut() {
        transform.translation = start;
        *pulse = AreaPulse::new(&config.weapon);
    }

    info!("Restarting run");
    spawn_wave_entities(
        &mut commands,
        progression.wave,
        start,
        &bounds,
        &mut rng,
        &config,
    );
    next_state.set(GameState::Playing);
}

fn enter_game_over(
    mut died_events: EventReader<PlayerDied>,
    stats: Res<PlayerStats>,
    progression: Res<Progression>,
    mut next_state: ResMut<NextState<GameState>>,
    mut game_over_events: EventWriter<GameOverEvent>,
) {
    if died_events.read().last().is_none() {
        return;
    }

    info!(
        "Game over at level {} on wave {} ({} kills)",
        stats.level, progression.wave, progression.kills
    );
    next_state.set(GameState::GameOver);
    game_over_events.write(GameOverEvent {
        level: stats.level,
        wave: progression.wave,
    });
}

/// Start the next wave once every enemy is dead. Corpses still in their
/// dying window do not hold the wave back.
#[allow(clippy::too_many_arguments)]
fn advance_wave(
    mut commands: Commands,
    enemy_query: Query<&Health, With<Enemy>>,
    player_query: Query<&Transform, With<Player>>,
    stats: Res<PlayerStats>,
    mut progression: ResMut<Progression>,
    bounds: Res<ArenaBounds>,
    config: Res<GameConfig>,
    mut rng: ResMut<GameRng>,
) {
    if stats.is_dead() || enemy_query.iter().any(Health::is_alive) {
        return;
    }
    let Ok(player_transform) = player_query.single() else {
        return;
    };

    progression.wave += 1;
    spawn_wave_entities(
        &mut commands,
        progression.wave,
        player_transform.translation,
        &bounds,
        &mut rng,
        &config,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;

    use super::*;
    use crate::combat::Dying;
    use crate::enemies::EnemyKind;
    use crate::hud::{HudPlugin, HudSink};
    use crate::progression::StatIncreases;

    #[derive(Default)]
    struct HudCounts {
        stat_updates: AtomicU32,
        level_ups: AtomicU32,
        game_overs: AtomicU32,
        flashes: AtomicU32,
    }

    #[derive(Clone, Default)]
    struct RecordingHud(Arc<HudCounts>);

    impl HudSink for RecordingHud {
        fn update_stats(&self, _: &PlayerStats, _: u32, _: u32, _: u32) {
            self.0.stat_updates.fetch_add(1, Ordering::SeqCst);
        }

        fn show_level_up(&self, _: u32, _: &StatIncreases) {
            self.0.level_ups.fetch_add(1, Ordering::SeqCst);
        }

        fn show_game_over(&self, _: u32, _: u32) {
            self.0.game_overs.fetch_add(1, Ordering::SeqCst);
        }

        fn flash_damage(&self) {
            self.0.flashes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Enemies that never move, so tests place them by hand
    fn still_config() -> GameConfig {
        let mut config = GameConfig {
            seed: Some(7),
            ..Default::default()
        };
        config.enemies.swarmer.speed = 0.0;
        config.enemies.brute.speed = 0.0;
        config
    }

    /// Headless app at 60 Hz. The first update runs startup with zero delta.
    fn test_app(config: GameConfig) -> (App, Arc<HudCounts>) {
        let hud = RecordingHud::default();
        let counts = hud.0.clone();

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
                1.0 / 60.0,
            )))
            .add_plugins((GamePlugin { config }, HudPlugin::new(hud)));
        app.update();
        (app, counts)
    }

    fn enemies(app: &mut App) -> Vec<Entity> {
        let mut query = app.world_mut().query_filtered::<Entity, With<Enemy>>();
        query.iter(app.world()).collect()
    }

    fn place(app: &mut App, entity: Entity, position: Vec3) {
        if let Some(mut transform) = app.world_mut().entity_mut(entity).get_mut::<Transform>() {
            transform.translation = position;
        }
    }

    /// Put the first enemy on top of the player and the rest out of reach
    fn pin_one_enemy_on_player(app: &mut App) {
        let start = app.world().resource::<GameConfig>().player.start_position();
        for (index, entity) in enemies(app).into_iter().enumerate() {
            let position = if index == 0 {
                start
            } else {
                Vec3::new(15.0, start.y, 15.0)
            };
            place(app, entity, position);
        }
    }

    fn state(app: &App) -> GameState {
        *app.world().resource::<State<GameState>>().get()
    }

    // ==== Wave Tests ====

    #[test]
    fn test_first_wave_spawned_on_startup() {
        let (mut app, counts) = test_app(still_config());

        assert_eq!(enemies(&mut app).len(), 4);
        assert_eq!(app.world().resource::<Progression>().wave, 1);
        assert_eq!(state(&app), GameState::Playing);
        assert!(counts.stat_updates.load(Ordering::SeqCst) >= 1);
    }

    // ==== Contact Damage Tests ====

    #[test]
    fn test_one_second_of_contact_costs_dps() {
        let (mut app, counts) = test_app(still_config());
        pin_one_enemy_on_player(&mut app);

        for _ in 0..60 {
            app.update();
        }

        let stats = app.world().resource::<PlayerStats>();
        assert!((stats.current_health - 75.0).abs() < 0.01);
        assert_eq!(state(&app), GameState::Playing);
        // Continuous contact is a single flash
        assert_eq!(counts.flashes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_game_over_fires_exactly_once() {
        let mut config = still_config();
        config.player.max_health = 10.0;
        let (mut app, counts) = test_app(config);
        pin_one_enemy_on_player(&mut app);

        // 10 health at 25 DPS lasts 0.4 s
        for _ in 0..120 {
            app.update();
        }

        assert_eq!(state(&app), GameState::GameOver);
        assert_eq!(app.world().resource::<PlayerStats>().current_health, 0.0);
        assert_eq!(counts.game_overs.load(Ordering::SeqCst), 1);
        // No new wave starts for a dead player
        assert_eq!(app.world().resource::<Progression>().wave, 1);
    }

    #[test]
    fn test_paused_game_takes_no_damage() {
        let (mut app, _) = test_app(still_config());
        app.world_mut().resource_mut::<PlayerIntent>().toggle_pause = true;
        app.update();
        app.update();
        assert_eq!(state(&app), GameState::Paused);

        pin_one_enemy_on_player(&mut app);
        for _ in 0..30 {
            app.update();
        }
        assert_eq!(app.world().resource::<PlayerStats>().current_health, 100.0);

        app.world_mut().resource_mut::<PlayerIntent>().toggle_pause = true;
        app.update();
        app.update();
        assert_eq!(state(&app), GameState::Playing);
        assert!(app.world().resource::<PlayerStats>().current_health < 100.0);
    }

    // ==== Progression Tests ====

    #[test]
    fn test_clearing_first_wave_levels_up_and_starts_next() {
        let (mut app, counts) = test_app(still_config());
        let start = app.world().resource::<GameConfig>().player.start_position();

        // Inside the pulse radius, outside contact range
        let offsets = [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(-3.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(0.0, 0.0, -3.0),
        ];
        for (entity, offset) in enemies(&mut app).into_iter().zip(offsets) {
            place(&mut app, entity, start + offset);
        }
        app.world_mut().resource_mut::<PlayerIntent>().attack = true;

        // Swarmers fall to the first pulse, brutes to the second
        for _ in 0..90 {
            app.update();
        }

        // The third pulse is not due yet and wave 2 outlives the second ring
        let progression = app.world().resource::<Progression>();
        assert_eq!(progression.kills, 4);
        assert_eq!(progression.wave, 2);
        assert_eq!(progression.current_xp, 0);
        assert_eq!(app.world().resource::<PlayerStats>().level, 2);
        assert_eq!(counts.level_ups.load(Ordering::SeqCst), 1);
    }

    // ==== Corpse Tests ====

    #[test]
    fn test_killed_enemy_shrinks_then_despawns() {
        let (mut app, _) = test_app(still_config());
        let start = app.world().resource::<GameConfig>().player.start_position();
        let death_frames = (app.world().resource::<GameConfig>().combat.death_duration * 60.0)
            .round() as u32;

        let mut query = app.world_mut().query::<(Entity, &EnemyKind)>();
        let all: Vec<(Entity, EnemyKind)> = query.iter(app.world()).map(|(e, k)| (e, *k)).collect();
        let victim = all
            .iter()
            .find(|(_, kind)| *kind == EnemyKind::Swarmer)
            .map(|(entity, _)| *entity)
            .expect("wave 1 has a swarmer");
        for (entity, _) in &all {
            let position = if *entity == victim {
                start + Vec3::new(3.0, 0.0, 0.0)
            } else {
                Vec3::new(15.0, start.y, 15.0)
            };
            place(&mut app, *entity, position);
        }
        app.world_mut().resource_mut::<PlayerIntent>().attack = true;

        let mut killed_at = None;
        for frame in 1..=30 {
            app.update();
            if app.world().get::<Dying>(victim).is_some() {
                killed_at = Some(frame);
                break;
            }
        }
        let killed_at = killed_at.expect("first pulse kills the swarmer");
        assert!(app.world().get::<Health>(victim).is_some_and(Health::is_dead));

        // Drop the corpse on the player: it must not deal contact damage
        place(&mut app, victim, start);

        let mut despawned_at = None;
        for frame in killed_at + 1..=killed_at + 60 {
            app.update();
            match app.world().get::<Transform>(victim) {
                Some(transform) => {
                    assert!(app.world().get::<Dying>(victim).is_some());
                    assert!(transform.scale.x < 1.0);
                }
                None => {
                    despawned_at = Some(frame);
                    break;
                }
            }
        }
        let despawned_at = despawned_at.expect("corpse is removed");
        let window = despawned_at - killed_at;
        assert!(window + 2 >= death_frames && window <= death_frames + 2);

        assert_eq!(app.world().resource::<PlayerStats>().current_health, 100.0);
        assert_eq!(app.world().resource::<Progression>().kills, 1);
    }

    // ==== Restart Tests ====

    #[test]
    fn test_restart_resets_the_run() {
        let mut config = still_config();
        config.player.max_health = 10.0;
        let (mut app, _) = test_app(config);
        pin_one_enemy_on_player(&mut app);
        for _ in 0..60 {
            app.update();
        }
        assert_eq!(state(&app), GameState::GameOver);

        app.world_mut().resource_mut::<PlayerIntent>().restart = true;
        app.update();
        app.update();

        assert_eq!(state(&app), GameState::Playing);
        let stats = app.world().resource::<PlayerStats>();
        assert_eq!(stats.current_health, 10.0);
        assert_eq!(stats.level, 1);
        let progression = app.world().resource::<Progression>();
        assert_eq!(progression.wave, 1);
        assert_eq!(progression.kills, 0);
        assert_eq!(enemies(&mut app).len(), 4);
        assert!(!app.world().resource::<PlayerIntent>().restart);
    }
}
