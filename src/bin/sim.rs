//! Scripted player for color-sort sessions.
//!
//! Plays a full session against the in-process service, or against a
//! remote backend with `--url`, and prints the result.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use color_sort::session::timer;
use color_sort::{
    grid_columns, ColorId, Difficulty, EngineConfig, GameMode, GameRng, GameService,
    HttpGameService, LocalGameService, PlayerContext, RoundAdvance, SessionController,
    SessionEvent, SessionSettings, SubmitOutcome, TileId, VisionFilter,
};

/// Submission attempts before giving up on a round.
const MAX_SUBMIT_ATTEMPTS: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "color-sort-sim")]
#[command(about = "Play a color-sort session with a scripted player")]
struct Cli {
    /// Game mode: sequence or memory
    #[arg(long, default_value = "sequence")]
    mode: GameMode,
    /// Blocks per round (6, 9, 12, 16 or 25)
    #[arg(long, default_value_t = 6)]
    blocks: u32,
    /// Rounds per session
    #[arg(long, default_value_t = 5)]
    rounds: u32,
    /// Color-vision filter applied to rendered colors
    #[arg(long, default_value = "none")]
    filter: VisionFilter,
    /// Name recorded on the leaderboard
    #[arg(long, default_value = "Guest")]
    player: String,
    /// RNG seed for the session and the scripted player
    #[arg(long)]
    seed: Option<u64>,
    /// Chance of a deliberate mistake per move, 0.0 to 1.0
    #[arg(long, default_value_t = 0.0)]
    error_rate: f64,
    /// Game service URL; omit to play offline
    #[arg(long)]
    url: Option<String>,
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Plays perfectly except for occasional deliberate slips.
struct Bot {
    rng: GameRng,
    error_rate: f64,
}

impl Bot {
    fn slips(&mut self) -> bool {
        self.rng.gen_bool(self.error_rate)
    }

    fn play_sequence<S>(&mut self, controller: &mut SessionController<S>) -> Result<()> {
        let mut order = controller
            .current_round()
            .context("no round in progress")?
            .identifiers
            .clone();
        order.sort_unstable();
        let Some(&lightest) = order.last() else {
            return Ok(());
        };

        for id in order {
            if id != lightest && self.slips() {
                controller.handle_event(SessionEvent::Click(lightest));
            }
            controller.handle_event(SessionEvent::Click(id));
        }
        Ok(())
    }

    async fn play_memory<S>(&mut self, controller: &mut SessionController<S>) -> Result<()> {
        let keys = controller
            .current_round()
            .context("no round in progress")?
            .identifiers
            .clone();
        let mut pairs: BTreeMap<ColorId, Vec<TileId>> = BTreeMap::new();
        for (index, key) in keys.iter().enumerate() {
            pairs.entry(*key).or_default().push(TileId(index as u32));
        }

        for (key, tiles) in &pairs {
            let [first, second] = tiles.as_slice() else {
                bail!("key {key} is not on exactly two tiles");
            };

            if self.slips() {
                if let Some(decoy) = unmatched_other(controller, *key, &keys) {
                    controller.handle_event(SessionEvent::Flip(*first));
                    let outcome = controller.handle_event(SessionEvent::Flip(decoy));
                    if let Some(revert) = outcome.pending_revert() {
                        let revert = timer::after_reveal(revert).await;
                        controller.handle_event(SessionEvent::RevealElapsed(revert));
                    }
                }
            }

            controller.handle_event(SessionEvent::Flip(*first));
            controller.handle_event(SessionEvent::Flip(*second));
        }
        Ok(())
    }
}

fn unmatched_other<S>(
    controller: &SessionController<S>,
    key: ColorId,
    keys: &[ColorId],
) -> Option<TileId> {
    let game = controller.active_round()?.as_memory()?;
    keys.iter()
        .zip(game.tiles())
        .find(|(other, tile)| **other != key && !tile.is_matched)
        .map(|(_, tile)| tile.id)
}

async fn submit<S: GameService>(controller: &mut SessionController<S>) -> Result<RoundAdvance> {
    let mut result = match controller.on_round_complete().await {
        Ok(SubmitOutcome::Submitted { next, .. }) => Ok(next),
        Ok(SubmitOutcome::Dropped) => bail!("round was not complete"),
        Err(err) => Err(err),
    };

    let mut attempt = 1;
    loop {
        match result {
            Ok(next) => {
                if let Some(summary) = controller.history().last() {
                    println!(
                        "  round {}: {} points in {:.1}s",
                        summary.round_number,
                        summary.points(),
                        summary.time_used_seconds
                    );
                }
                return Ok(next);
            }
            Err(err) if err.is_retryable() && attempt < MAX_SUBMIT_ATTEMPTS => {
                warn!(attempt, state = ?controller.state(), error = %err, "retrying round transition");
                attempt += 1;
                // Resubmits only if the round was not accepted.
                result = controller.resume().await;
            }
            Err(err) => return Err(err).context("submitting round"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default().apply_env(),
    };
    if let Some(url) = &cli.url {
        config = config.with_service_url(url.clone());
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    let seed = config.seed.unwrap_or_else(|| GameRng::from_entropy().seed());
    let config = config.with_seed(seed);
    config.validate()?;

    if !Difficulty::PRESETS.contains(&Difficulty(cli.blocks)) {
        warn!(blocks = cli.blocks, "block count is not a standard difficulty");
    }
    let settings = SessionSettings::new(Difficulty(cli.blocks), cli.mode)
        .with_filter(cli.filter)
        .with_rounds(cli.rounds);

    let local = cli
        .url
        .is_none()
        .then(|| Arc::new(LocalGameService::new(GameRng::new(seed).for_context("service"))));
    let service: Arc<dyn GameService> = match &local {
        Some(local) => Arc::clone(local) as Arc<dyn GameService>,
        None => Arc::new(HttpGameService::from_config(&config)?),
    };
    info!(seed, url = ?cli.url, "starting simulation");

    let mut bot = Bot {
        rng: GameRng::new(seed).for_context("bot"),
        error_rate: cli.error_rate.clamp(0.0, 1.0),
    };
    let mut controller =
        SessionController::start(service, PlayerContext::new(cli.player), settings, config)
            .await
            .context("starting session")?;

    println!(
        "{} session, {} blocks in {} columns, {} rounds, filter {}",
        settings.mode,
        cli.blocks,
        grid_columns(settings.mode, cli.blocks as usize),
        settings.total_rounds,
        settings.vision_filter
    );

    let mut advance = controller.request_next_round().await?;
    let summary = loop {
        match advance {
            RoundAdvance::Started { .. } => {
                match settings.mode {
                    GameMode::Sequence => bot.play_sequence(&mut controller)?,
                    GameMode::Memory => bot.play_memory(&mut controller).await?,
                }
                advance = submit(&mut controller).await?;
            }
            RoundAdvance::Finished(summary) => break summary,
            RoundAdvance::Ignored => bail!("session stalled in {:?}", controller.state()),
        }
    };

    println!("total score: {}", summary.total_score);
    if !summary.recorded {
        println!("(score was not recorded)");
    }
    if let Some(local) = local {
        println!("leaderboard:");
        for entry in local.top_scores(10).await {
            println!("  {:>2}. {:<16} {}", entry.rank, entry.username, entry.score);
        }
    }
    Ok(())
}
