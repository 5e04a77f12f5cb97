//! Lane Runner entry point
//!
//! Command-line front end over the library: play campaign and user levels,
//! edit levels, and manage settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use glam::IVec2;

use lane_runner::audio::{AudioManager, SoundCue};
use lane_runner::consts::SIM_DT;
use lane_runner::fx::FxSystem;
use lane_runner::level::{Campaign, GridPos, LevelStore, Progress};
use lane_runner::sim::{Board, Element, ElementKind, pair_tint};
use lane_runner::{LevelEditor, PlayResult, PlaySession, PrefabKey, Settings};

#[derive(Parser, Debug)]
#[command(name = "lane-runner", about = "Grid lane-routing ball puzzle", version)]
struct Cli {
    /// Where settings, progress and user levels live
    #[arg(long, env = "LANE_RUNNER_HOME", default_value = ".lane-runner")]
    data_dir: PathBuf,

    /// Folder holding the bundled LevelN.json campaign
    #[arg(long, default_value = "levels")]
    campaign_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Saved user levels
    Levels {
        #[command(subcommand)]
        action: Option<LevelsAction>,
    },
    /// Play a level file or saved level name
    Run {
        level: String,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Turn the piece at x,y once before launching (repeatable)
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        rotate: Vec<GridPos>,
    },
    /// Bundled campaign
    Campaign {
        #[command(subcommand)]
        action: CampaignAction,
    },
    /// Edit a level (created if it doesn't exist)
    Edit {
        level: String,
        #[command(subcommand)]
        action: EditAction,
    },
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum LevelsAction {
    /// List saved levels, newest first (the default)
    List,
    /// Delete a saved level by name or path
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum CampaignAction {
    List,
    /// Play level N (1-based)
    Play {
        number: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        rotate: Vec<GridPos>,
    },
    /// Forget campaign progress
    Reset,
}

#[derive(Subcommand, Debug)]
enum EditAction {
    Show,
    /// Place an element; a teleporter needs two --at positions
    Place {
        key: String,
        #[arg(long, value_name = "X,Y", required = true, allow_hyphen_values = true)]
        at: Vec<GridPos>,
        #[arg(long, default_value_t = 0)]
        rot: u8,
    },
    Delete {
        #[arg(allow_hyphen_values = true)]
        at: GridPos,
    },
    Rotate {
        #[arg(allow_hyphen_values = true)]
        at: GridPos,
    },
    /// Validate and playtest the level
    Test,
    SaveAs {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("Data dir {}", cli.data_dir.display());

    match cli.command {
        Command::Levels { action } => match action.unwrap_or(LevelsAction::List) {
            LevelsAction::List => list_levels(&cli.data_dir),
            LevelsAction::Delete { name } => {
                let path = LevelStore::new(&cli.data_dir)
                    .remove(&name)
                    .with_context(|| format!("failed to delete level '{name}'"))?;
                click(&cli.data_dir);
                println!("Deleted {}", path.display());
                Ok(())
            }
        },
        Command::Run {
            level,
            seed,
            rotate,
        } => {
            let path = LevelStore::new(&cli.data_dir).resolve(&level)?;
            let mut session = PlaySession::from_file(&path, seed)
                .with_context(|| format!("failed to open level {}", path.display()))?;
            play(&mut session, &cli.data_dir, &rotate)?;
            Ok(())
        }
        Command::Campaign { action } => campaign(&cli.data_dir, &cli.campaign_dir, action),
        Command::Edit { level, action } => edit(&cli.data_dir, &level, action),
        Command::Settings { action } => settings(&cli.data_dir, action),
    }
}

fn list_levels(data_dir: &Path) -> Result<()> {
    let store = LevelStore::new(data_dir);
    let levels = store.list().context("failed to list levels")?;
    if levels.is_empty() {
        println!("No saved levels in {}", store.root()?.display());
        return Ok(());
    }
    for info in levels {
        println!("{:<32} {:>7} B  {}", info.name, info.size_bytes, info.path.display());
    }
    Ok(())
}

fn campaign(data_dir: &Path, campaign_dir: &Path, action: CampaignAction) -> Result<()> {
    let campaign = Campaign::scan(campaign_dir)
        .with_context(|| format!("failed to read campaign in {}", campaign_dir.display()))?;

    match action {
        CampaignAction::List => {
            let progress = Progress::load(data_dir);
            if campaign.is_empty() {
                println!("No campaign levels in {}", campaign_dir.display());
            }
            for index in 0..campaign.len() {
                let name = campaign.name(index).unwrap_or_default();
                let status = if progress.is_locked(index) {
                    "locked"
                } else if (index as i64) <= i64::from(progress.play_progress) {
                    "done"
                } else {
                    "open"
                };
                println!("{:>3}. {name:<24} {status}", index + 1);
            }
            Ok(())
        }
        CampaignAction::Play {
            number,
            seed,
            rotate,
        } => {
            let Some(index) = number.checked_sub(1) else {
                bail!("campaign levels are numbered from 1");
            };
            let progress = Progress::load(data_dir);
            let session = PlaySession::from_campaign_unlocked(&campaign, &progress, index, seed)
                .with_context(|| format!("cannot play campaign level {number}"))?;
            let mut session = session.with_progress(data_dir);
            let result = play(&mut session, data_dir, &rotate)?;
            if let Some(next) = result.next_level {
                println!("Next level unlocked: {}", next + 1);
            } else if result.campaign_complete {
                println!("Campaign complete!");
            }
            Ok(())
        }
        CampaignAction::Reset => {
            let mut progress = Progress::load(data_dir);
            progress.reset();
            progress.save(data_dir)?;
            click(data_dir);
            println!("Campaign progress reset");
            Ok(())
        }
    }
}

/// Confirmation click for a completed command
fn click(data_dir: &Path) {
    let settings = Settings::load(data_dir);
    AudioManager::from_settings(&settings, 0).play_sfx(SoundCue::UiClick, 1.0);
}

/// Apply the player's rotations, run the ball, and report the outcome
fn play(session: &mut PlaySession, data_dir: &Path, rotate: &[GridPos]) -> Result<PlayResult> {
    let settings = Settings::load(data_dir);
    for &cell in rotate {
        if !session.rotate(cell.into())? {
            log::warn!("Nothing to rotate at {cell}");
        }
    }
    print!("{}", render_board(session.board()));

    let mut audio = AudioManager::from_settings(&settings, 0);
    audio.play_music(Some("level"), true);
    let mut fx = FxSystem::default();
    let result = session.run_with(&settings, |events| {
        for event in events {
            audio.handle_event(event);
            fx.handle_event(event);
        }
        audio.update(SIM_DT);
        fx.update(SIM_DT);
    })?;

    println!("{}", result.outcome.message());
    Ok(result)
}

fn edit(data_dir: &Path, level: &str, action: EditAction) -> Result<()> {
    let store = LevelStore::new(data_dir);
    let mut editor = LevelEditor::open_or_create(store, level)
        .with_context(|| format!("failed to open level '{level}'"))?;

    match action {
        EditAction::Show => {
            let board = editor.board();
            println!("{} ({} elements)", board.name, board.elements.len());
            print!("{}", render_board(board));
            return Ok(());
        }
        EditAction::Place { key, at, rot } => {
            let Some(key) = PrefabKey::parse(&key) else {
                let known: Vec<_> = PrefabKey::ALL.iter().map(PrefabKey::as_str).collect();
                bail!("unknown element '{key}' (expected one of {})", known.join(", "));
            };
            if key == PrefabKey::Teleporter && at.len() != 2 {
                bail!("a teleporter pair needs exactly two --at positions");
            }
            for cell in at {
                if editor.tool().is_none() {
                    editor.select(key);
                }
                editor.place(cell.into(), rot)?;
                println!("Placed {key} at {cell}");
            }
        }
        EditAction::Delete { at } => {
            let removed = editor.delete(at.into())?;
            println!("Removed {removed} element(s)");
        }
        EditAction::Rotate { at } => {
            if !editor.rotate(at.into())? {
                bail!("nothing rotatable at {at}");
            }
        }
        EditAction::Test => {
            let settings = Settings::load(data_dir);
            let state = editor.playtest(&settings)?;
            let outcome = lane_runner::sim::run_to_end(state, SIM_DT);
            editor.stop_playtest();
            if let Some(outcome) = outcome {
                println!("{}", outcome.message());
            }
            return Ok(());
        }
        EditAction::SaveAs { name } => {
            let path = editor.save_as(&name)?;
            click(data_dir);
            println!("Saved as {}", path.display());
            return Ok(());
        }
    }

    let path = editor.save()?;
    click(data_dir);
    println!("Saved {}", path.display());
    Ok(())
}

fn settings(data_dir: &Path, action: SettingsAction) -> Result<()> {
    let mut settings = Settings::load(data_dir);
    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set { key, value } => {
            settings.set(&key, &value)?;
            settings
                .save(data_dir)
                .with_context(|| format!("failed to save settings in {}", data_dir.display()))?;
            click(data_dir);
            println!("{key} updated");
        }
    }
    Ok(())
}

/// Text picture of a board, top row first
fn render_board(board: &Board) -> String {
    let Some(first) = board.elements.first() else {
        return "(empty)\n".to_string();
    };
    let (min, max) = board
        .elements
        .iter()
        .fold((first.cell, first.cell), |(lo, hi), e| (lo.min(e.cell), hi.max(e.cell)));

    let mut out = String::new();
    for y in (min.y..=max.y).rev() {
        out.push_str(&format!("{y:>4} "));
        for x in min.x..=max.x {
            match board.element_at(IVec2::new(x, y)) {
                Some(e) => {
                    out.push(glyph(e));
                    out.push(modifier(e));
                }
                None => out.push_str(". "),
            }
        }
        out.push('\n');
    }
    out.push_str(&format!("     x {}..{}\n", min.x, max.x));

    for e in board.elements.iter().filter(|e| e.kind == ElementKind::Teleporter) {
        let [r, g, b] = e.pair_id.as_deref().map(pair_tint).unwrap_or([255, 255, 255]);
        let link = match e.paired.and_then(|p| board.get(p)) {
            Some(partner) => format!("-> {}", GridPos::from(partner.cell)),
            None => "unpaired".to_string(),
        };
        out.push_str(&format!(
            "     T at {} #{r:02x}{g:02x}{b:02x} {link}\n",
            GridPos::from(e.cell)
        ));
    }
    out
}

fn glyph(e: &Element) -> char {
    match e.kind {
        ElementKind::BallSpawn => 'S',
        ElementKind::EndPoint => 'E',
        ElementKind::Star => '*',
        ElementKind::Teleporter => 'T',
        ElementKind::Arrow => ['>', '^', '<', 'v'][usize::from(e.rotation & 3)],
        ElementKind::Line => ['\\', '/'][usize::from(e.rotation & 1)],
        // Solid corner: bottom-left, bottom-right, top-right, top-left
        ElementKind::Triangle => ['◣', '◢', '◥', '◤'][usize::from(e.rotation & 3)],
    }
}

fn modifier(e: &Element) -> char {
    if e.breakable.is_some() {
        '!'
    } else if e.activable.is_some() {
        '?'
    } else {
        ' '
    }
}
