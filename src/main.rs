//! Blue Spheres command-line driver
//!
//! Headless front end for the core: stage-code conversion, stage
//! inspection and a command-free simulation run. Rendering clients link
//! the library directly.

use std::process;

use anyhow::{Context, Result, bail};

use blue_spheres::consts::SUB_STEPS;
use blue_spheres::stage::{SectionTable, Stage, StageCode, generate};
use blue_spheres::{GameEvent, GameLogic, GameState, ObjectKind};

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const ENCODE_USAGE: &str = "blue-spheres encode <stage-number>";
const DECODE_USAGE: &str = "blue-spheres decode <code>";
const SHOW_USAGE: &str = "blue-spheres show <sections.json> <code>";
const SIMULATE_USAGE: &str = "blue-spheres simulate <sections.json> <code> [max-seconds]";
const PLAY_USAGE: &str = "blue-spheres play <stage.json> [max-seconds]";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("encode") => {
            let number: u32 = args
                .next()
                .context(ENCODE_USAGE)?
                .parse()
                .context("stage number must be a positive integer")?;
            encode(number)
        }
        Some("decode") => {
            let code = args.next().context(DECODE_USAGE)?;
            decode(&code)
        }
        Some("show") => {
            let sections = args.next().context(SHOW_USAGE)?;
            let code = args.next().context(SHOW_USAGE)?;
            let stage = build_stage(&sections, &code)?;
            show(&stage);
            Ok(())
        }
        Some("simulate") => {
            let sections = args.next().context(SIMULATE_USAGE)?;
            let code = args.next().context(SIMULATE_USAGE)?;
            let max_seconds: f32 = match args.next() {
                Some(s) => s.parse().context("max-seconds must be a number")?,
                None => 120.0,
            };
            let stage = build_stage(&sections, &code)?;
            simulate(stage, max_seconds)
        }
        Some("play") => {
            let path = args.next().context(PLAY_USAGE)?;
            let max_seconds: f32 = match args.next() {
                Some(s) => s.parse().context("max-seconds must be a number")?,
                None => 120.0,
            };
            let stage = Stage::load(&path).with_context(|| format!("Failed to load {path}"))?;
            simulate(stage, max_seconds)
        }
        _ => bail!(
            "Blue Spheres bonus stage core\n\nUsage:\n  {ENCODE_USAGE}\n  {DECODE_USAGE}\n  {SHOW_USAGE}\n  {SIMULATE_USAGE}\n  {PLAY_USAGE}"
        ),
    }
}

fn encode(number: u32) -> Result<()> {
    use blue_spheres::stage::code::MAX_STAGE_NUMBER;
    if !(1..=MAX_STAGE_NUMBER).contains(&number) {
        bail!("stage number must be in [1, {MAX_STAGE_NUMBER}]");
    }
    println!("{}", StageCode::for_stage(number));
    Ok(())
}

fn decode(code: &str) -> Result<()> {
    let code: StageCode = code.parse().context("malformed stage code")?;
    let number = code.stage_number().context("invalid stage code")?;
    println!("{number}");
    Ok(())
}

fn build_stage(sections_path: &str, code: &str) -> Result<Stage> {
    let table = SectionTable::load(sections_path)
        .with_context(|| format!("Failed to load {sections_path}"))?;
    let code: StageCode = code.parse().context("malformed stage code")?;
    generate(&table, code).context("invalid stage code")
}

fn show(stage: &Stage) {
    println!("{} ({} rings)", stage.name, stage.max_rings);
    // Row y=0 is the bottom of the stage
    for y in (0..stage.side()).rev() {
        let mut line = String::with_capacity(stage.side() as usize);
        for x in 0..stage.side() {
            line.push(match stage.value_at(glam::IVec2::new(x, y)) {
                ObjectKind::None => '.',
                ObjectKind::RedSphere => 'R',
                ObjectKind::BlueSphere => 'B',
                ObjectKind::YellowSphere => 'Y',
                ObjectKind::Bumper => '*',
                ObjectKind::Ring => 'o',
            });
        }
        println!("{line}");
    }
}

/// Run a command-free session at the standard tick rate and report
/// every event until the game ends or the time limit runs out
fn simulate(stage: Stage, max_seconds: f32) -> Result<()> {
    let dt = 1.0 / (60.0 * SUB_STEPS as f32);
    let max_ticks = (max_seconds / dt) as u64;
    let mut logic = GameLogic::new(stage);

    for tick in 0..max_ticks {
        logic.advance(dt);
        for event in logic.take_events() {
            let t = tick as f32 * dt;
            match event {
                GameEvent::StateChanged { old, new } => {
                    println!("[{t:8.3}s] state {old:?} -> {new:?}");
                }
                GameEvent::Action(action) => {
                    println!("[{t:8.3}s] {action:?}");
                }
            }
        }
        if logic.state() == GameState::GameOver {
            let pos = logic.position();
            println!(
                "[{:8.3}s] final position ({:.2}, {:.2}), {} rings left",
                tick as f32 * dt,
                pos.x,
                pos.y,
                logic.stage().remaining_rings
            );
            return Ok(());
        }
    }
    println!("time limit of {max_seconds}s exhausted in {:?}", logic.state());
    Ok(())
}
